use super::config::AnimationConfig;
use super::registry::{Agent, MotionState};

pub const IDLE_FRAME: u8 = 0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Per-agent animation sub-state. `last_frame_ms` is the frame-change
/// timer, kept so the walk cycle advances at a fixed rate regardless of how
/// often frames are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationState {
    pub current_frame: u8,
    pub last_frame_ms: f64,
    pub facing: Facing,
}

#[derive(Debug, Clone)]
pub struct SpriteAnimator {
    config: AnimationConfig,
}

impl SpriteAnimator {
    pub fn new(config: AnimationConfig) -> Self {
        Self { config }
    }

    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / f64::from(self.config.fps.max(f32::EPSILON))
    }

    pub fn update(&self, agents: &mut [Agent], now_ms: f64) {
        for agent in agents {
            self.animate(agent, now_ms);
        }
    }

    pub fn animate(&self, agent: &mut Agent, now_ms: f64) {
        let sample = MotionSample::of(agent);
        let state = &mut agent.animation;

        if sample.speed > self.config.moving_threshold {
            let walk_frames = self.config.walk_frames.max(1);
            if state.current_frame == IDLE_FRAME {
                state.current_frame = 1;
                state.last_frame_ms = now_ms;
            } else if now_ms - state.last_frame_ms > self.frame_interval_ms() {
                state.current_frame = state.current_frame % walk_frames + 1;
                state.last_frame_ms = now_ms;
            }
        } else {
            state.current_frame = IDLE_FRAME;
        }

        if sample.horizontal > 0.0 {
            state.facing = Facing::Right;
        } else if sample.horizontal < 0.0 {
            state.facing = Facing::Left;
        }
    }
}

struct MotionSample {
    speed: f32,
    horizontal: f32,
}

impl MotionSample {
    fn of(agent: &Agent) -> Self {
        let own_speed = agent.velocity.length();
        match agent.motion {
            MotionState::Pushed { velocity, .. } => Self {
                speed: own_speed.max(velocity.length()),
                horizontal: if agent.velocity.x != 0.0 {
                    agent.velocity.x
                } else {
                    velocity.x
                },
            },
            MotionState::Idle | MotionState::Moving => Self {
                speed: own_speed,
                horizontal: agent.velocity.x,
            },
        }
    }
}

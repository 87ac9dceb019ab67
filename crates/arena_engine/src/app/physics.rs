use rand::RngCore;

use super::config::PhysicsConfig;
use super::geometry::{collision_normal, Bounds, Vec2};
use super::random;
use super::registry::{Agent, EntityRegistry, MotionState, TrailPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    /// Two moving agents exchanged their normal velocity components.
    Bounce,
    /// A moving agent knocked a resting or pushed agent away.
    Knockback,
    /// A pushed agent ran into a non-moving one.
    PushedContact,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    /// Midpoint of the two centres before separation was applied.
    pub point: Vec2,
    pub kind: CollisionKind,
}

#[derive(Debug, Clone)]
pub struct PhysicsStepper {
    config: PhysicsConfig,
}

impl PhysicsStepper {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Advances every agent by one frame. `events` is cleared and refilled
    /// with one entry per resolved contact.
    pub fn step(
        &self,
        registry: &mut EntityRegistry,
        now_ms: f64,
        rng: &mut dyn RngCore,
        events: &mut Vec<CollisionEvent>,
    ) {
        events.clear();
        let bounds = registry.bounds();
        let agents = registry.agents_mut();

        for agent in agents.iter_mut() {
            self.integrate(agent, bounds, now_ms);
        }

        for left in 0..agents.len() {
            for right in left + 1..agents.len() {
                let (a, b) = pair_mut(agents, left, right);
                if let Some(event) = self.resolve_pair(a, b, now_ms) {
                    events.push(event);
                }
            }
        }

        for agent in agents.iter_mut() {
            if agent.is_active() {
                self.steer(agent, rng);
            }
            agent.position = bounds.clamp_circle(agent.position, agent.radius);
        }
    }

    fn integrate(&self, agent: &mut Agent, bounds: Bounds, now_ms: f64) {
        let config = &self.config;
        match agent.motion {
            MotionState::Moving => {
                agent.trail.push_capped(
                    TrailPoint {
                        position: agent.position,
                        alpha: config.trail_max_alpha,
                    },
                    config.active_trail_len,
                );
                agent.trail.ramp_alpha(config.trail_max_alpha);
                agent.position += agent.velocity;
                bounds.reflect_circle(&mut agent.position, &mut agent.velocity, agent.radius);
            }
            MotionState::Pushed {
                until_ms,
                mut velocity,
            } if until_ms > now_ms => {
                agent.position += velocity;
                bounds.reflect_circle(&mut agent.position, &mut velocity, agent.radius);
                agent.trail.push_capped(
                    TrailPoint {
                        position: agent.position,
                        alpha: config.pushed_trail_alpha,
                    },
                    config.pushed_trail_len,
                );
                velocity *= config.push_damping;
                agent.motion = MotionState::Pushed { until_ms, velocity };
            }
            MotionState::Idle | MotionState::Pushed { .. } => {
                agent.trail.clear();
                agent.motion = MotionState::Idle;
            }
        }
    }

    /// Resolves one unordered pair. `normal` points from `a` toward `b`.
    fn resolve_pair(&self, a: &mut Agent, b: &mut Agent, now_ms: f64) -> Option<CollisionEvent> {
        let distance = a.position.distance(b.position);
        let min_distance = a.radius + b.radius;
        if distance >= min_distance {
            return None;
        }

        let overlap = min_distance - distance;
        let normal = collision_normal(a.position, b.position);
        let point = a.position.midpoint(b.position);

        let kind = match (a.motion, b.motion) {
            (MotionState::Moving, MotionState::Moving) => {
                let a_normal = a.velocity.dot(normal);
                let b_normal = b.velocity.dot(normal);
                if b_normal - a_normal < 0.0 {
                    a.velocity += normal * (b_normal - a_normal);
                    b.velocity += normal * (a_normal - b_normal);
                } else {
                    // Not closing in; reflect instead of swapping.
                    a.velocity -= normal * (2.0 * a_normal);
                    b.velocity -= normal * (2.0 * b_normal);
                }
                separate_evenly(a, b, normal, overlap);
                CollisionKind::Bounce
            }
            (MotionState::Moving, _) => {
                self.knock(a, b, normal, overlap, now_ms);
                CollisionKind::Knockback
            }
            (_, MotionState::Moving) => {
                self.knock(b, a, -normal, overlap, now_ms);
                CollisionKind::Knockback
            }
            (MotionState::Pushed { .. }, MotionState::Pushed { .. }) => {
                self.rebound_push(a);
                self.rebound_push(b);
                separate_evenly(a, b, normal, overlap);
                CollisionKind::PushedContact
            }
            (MotionState::Pushed { .. }, MotionState::Idle) => {
                self.rebound_push(a);
                a.position -= normal * overlap;
                CollisionKind::PushedContact
            }
            (MotionState::Idle, MotionState::Pushed { .. }) => {
                self.rebound_push(b);
                b.position += normal * overlap;
                CollisionKind::PushedContact
            }
            (MotionState::Idle, MotionState::Idle) => return None,
        };

        Some(CollisionEvent { point, kind })
    }

    /// `normal` points from the mover toward the struck agent.
    fn knock(
        &self,
        mover: &mut Agent,
        struck: &mut Agent,
        normal: Vec2,
        overlap: f32,
        now_ms: f64,
    ) {
        struck.motion = MotionState::Pushed {
            until_ms: now_ms + self.config.push_duration_ms,
            velocity: normal * self.config.push_speed,
        };
        mover.velocity *= self.config.pusher_rebound;
        mover.position -= normal * overlap;
    }

    fn rebound_push(&self, agent: &mut Agent) {
        if let MotionState::Pushed { until_ms, velocity } = agent.motion {
            agent.motion = MotionState::Pushed {
                until_ms,
                velocity: velocity * self.config.pushed_rebound,
            };
        }
    }

    fn steer(&self, agent: &mut Agent, rng: &mut dyn RngCore) {
        let config = &self.config;
        if random::chance(rng, config.jitter_probability) {
            agent.velocity += Vec2::new(
                random::uniform(rng, -config.jitter_magnitude, config.jitter_magnitude),
                random::uniform(rng, -config.jitter_magnitude, config.jitter_magnitude),
            );
        }
        if agent.velocity.length() > config.max_speed {
            agent.velocity = agent.velocity.with_length(config.max_speed);
        }
    }
}

fn separate_evenly(a: &mut Agent, b: &mut Agent, normal: Vec2, overlap: f32) {
    let half = normal * (overlap * 0.5);
    a.position -= half;
    b.position += half;
}

/// Disjoint mutable borrows of two agents, `left < right`.
fn pair_mut(agents: &mut [Agent], left: usize, right: usize) -> (&mut Agent, &mut Agent) {
    let (head, tail) = agents.split_at_mut(right);
    (&mut head[left], &mut tail[0])
}

use rand::RngCore;
use tracing::debug;

use super::animation::SpriteAnimator;
use super::config::{ConfigError, SimConfig};
use super::geometry::{Bounds, Vec2};
use super::particles::{Particle, ParticleSystem};
use super::physics::{CollisionEvent, PhysicsStepper};
use super::registry::{Agent, AgentDescriptor, AgentId, EntityRegistry, Plant};

/// Wall-clock stamp of one frame. `dt_ms` only drives the shared animation
/// clock; motion advances once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    pub now_ms: f64,
    pub dt_ms: f64,
}

impl FrameTime {
    pub fn new(now_ms: f64, dt_ms: f64) -> Self {
        Self { now_ms, dt_ms }
    }
}

pub struct Simulation {
    config: SimConfig,
    registry: EntityRegistry,
    physics: PhysicsStepper,
    particles: ParticleSystem,
    animator: SpriteAnimator,
    rng: Box<dyn RngCore>,
    events: Vec<CollisionEvent>,
    animation_clock_s: f64,
    frame_count: u64,
}

impl Simulation {
    pub fn new(config: SimConfig, mut rng: Box<dyn RngCore>) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut registry =
            EntityRegistry::new(config.layout.clone(), config.physics.activation_speed);
        registry.resize(
            config.layout.initial_width,
            config.layout.initial_height,
            rng.as_mut(),
        );

        Ok(Self {
            registry,
            physics: PhysicsStepper::new(config.physics.clone()),
            particles: ParticleSystem::new(config.particles.clone()),
            animator: SpriteAnimator::new(config.animation.clone()),
            config,
            rng,
            events: Vec::new(),
            animation_clock_s: 0.0,
            frame_count: 0,
        })
    }

    pub fn update(&mut self, time: FrameTime) {
        self.physics.step(
            &mut self.registry,
            time.now_ms,
            self.rng.as_mut(),
            &mut self.events,
        );

        self.particles.update(time.now_ms);
        for event in &self.events {
            self.particles
                .spawn_burst(event.point, time.now_ms, self.rng.as_mut());
        }
        if !self.events.is_empty() {
            debug!(
                collisions = self.events.len(),
                particles = self.particles.len(),
                "collision_bursts_spawned"
            );
        }

        self.animator
            .update(self.registry.agents_mut(), time.now_ms);
        self.animation_clock_s += time.dt_ms.max(0.0) / 1000.0;
        self.frame_count += 1;
    }

    pub fn add_agent(&mut self, descriptor: AgentDescriptor) -> bool {
        self.registry.add_agent(descriptor, self.rng.as_mut())
    }

    pub fn remove_agent(&mut self, id: &AgentId) -> bool {
        self.registry.remove_agent(id)
    }

    pub fn clear_agents(&mut self) -> usize {
        self.registry.clear_agents()
    }

    pub fn set_active(&mut self, id: &AgentId, active: bool) -> bool {
        self.registry.set_active(id, active, self.rng.as_mut())
    }

    pub fn set_executing(&mut self, id: &AgentId, executing: bool) -> bool {
        self.registry.set_executing(id, executing)
    }

    pub fn set_promoted(&mut self, id: &AgentId, promoted: bool) -> bool {
        self.registry.set_promoted(id, promoted)
    }

    pub fn set_execution_count(&mut self, id: &AgentId, count: u32) -> bool {
        self.registry.set_execution_count(id, count)
    }

    pub fn place_agent(&mut self, id: &AgentId, position: Vec2) -> bool {
        self.registry.place_agent(id, position)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.registry.resize(width, height, self.rng.as_mut())
    }

    pub fn hit_test(&self, point: Vec2) -> Option<&Agent> {
        self.registry.hit_test(point)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn agents(&self) -> &[Agent] {
        self.registry.agents()
    }

    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.registry.agent(id)
    }

    pub fn plants(&self) -> &[Plant] {
        self.registry.plants()
    }

    pub fn particles(&self) -> &[Particle] {
        self.particles.particles()
    }

    pub fn bounds(&self) -> Bounds {
        self.registry.bounds()
    }

    pub fn animation_clock_s(&self) -> f64 {
        self.animation_clock_s
    }

    pub fn last_collision_events(&self) -> &[CollisionEvent] {
        &self.events
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("agents", &self.registry.len())
            .field("particles", &self.particles.len())
            .field("bounds", &self.registry.bounds())
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}

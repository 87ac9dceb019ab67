mod animation;
mod config;
mod geometry;
mod loop_runner;
mod metrics;
mod particles;
mod physics;
mod random;
mod registry;
mod rendering;
mod simulation;
#[cfg(test)]
mod tests;

pub use animation::{AnimationState, Facing, SpriteAnimator, IDLE_FRAME};
pub use config::{
    AnimationConfig, ConfigError, LayoutConfig, ParticleConfig, PhysicsConfig, SimConfig,
};
pub use geometry::{clamp_axis, collision_normal, Bounds, Vec2};
pub use loop_runner::{
    run_app, AppError, ArenaHost, FrameHandle, FrameScheduler, LoopConfig, SimulationLoop,
};
pub use metrics::LoopMetricsSnapshot;
pub use particles::{Particle, ParticleSystem, HEART_PALETTE};
pub use physics::{CollisionEvent, CollisionKind, PhysicsStepper};
pub use registry::{
    Agent, AgentBadges, AgentDescriptor, AgentId, EntityRegistry, MotionState, Plant, PlantKind,
    Trail, TrailPoint, AGENT_PALETTE, DEFAULT_GLYPH, NEUTRAL_COLOR,
};
pub use rendering::{
    load_sprite_sheet, with_alpha, DrawSurface, FramePresenter, PixelSurface, Rgba,
    SceneRenderer, Shape, SourceRect, SpriteCatalog, SpriteImage, SpriteLoadError, SpriteSheet,
    SHEET_FRAME_COUNT,
};
pub use simulation::{FrameTime, Simulation};

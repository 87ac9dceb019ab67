use std::collections::VecDeque;
use std::f32::consts::TAU;
use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::animation::AnimationState;
use super::config::LayoutConfig;
use super::geometry::{Bounds, Vec2};
use super::random;
use super::rendering::Rgba;

pub const DEFAULT_GLYPH: &str = "🤖";
pub const NEUTRAL_COLOR: Rgba = [178, 190, 195, 255];
pub const AGENT_PALETTE: [Rgba; 10] = [
    [0xFF, 0x6B, 0x6B, 0xFF],
    [0x4E, 0xCD, 0xC4, 0xFF],
    [0x45, 0xB7, 0xD1, 0xFF],
    [0x96, 0xCE, 0xB4, 0xFF],
    [0xFF, 0xEA, 0xA7, 0xFF],
    [0xDF, 0xE6, 0xE9, 0xFF],
    [0x74, 0xB9, 0xFF, 0xFF],
    [0xFD, 0x79, 0xA8, 0xFF],
    [0xFD, 0xCB, 0x6E, 0xFF],
    [0x6C, 0x5C, 0xE7, 0xFF],
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AgentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What an outside caller supplies to place a new agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentDescriptor {
    pub id: String,
    pub name: Option<String>,
    pub glyph: Option<String>,
    pub color_seed: Option<u64>,
    pub sprite_key: Option<String>,
}

impl AgentDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_glyph(mut self, glyph: impl Into<String>) -> Self {
        self.glyph = Some(glyph.into());
        self
    }

    pub fn with_color_seed(mut self, seed: u64) -> Self {
        self.color_seed = Some(seed);
        self
    }

    pub fn with_sprite_key(mut self, key: impl Into<String>) -> Self {
        self.sprite_key = Some(key.into());
        self
    }
}

/// Motion mode of an agent. Only `Moving` integrates `Agent::velocity`; a
/// pushed agent travels on its own decaying push velocity until `until_ms`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum MotionState {
    #[default]
    Idle,
    Moving,
    Pushed { until_ms: f64, velocity: Vec2 },
}

impl MotionState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Moving)
    }

    pub fn push_velocity(&self) -> Option<Vec2> {
        match self {
            Self::Pushed { velocity, .. } => Some(*velocity),
            Self::Idle | Self::Moving => None,
        }
    }

    pub fn pushed_until_ms(&self) -> Option<f64> {
        match self {
            Self::Pushed { until_ms, .. } => Some(*until_ms),
            Self::Idle | Self::Moving => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub position: Vec2,
    pub alpha: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trail {
    points: VecDeque<TrailPoint>,
}

impl Trail {
    /// Appends a point, dropping the oldest ones past `cap`.
    pub fn push_capped(&mut self, point: TrailPoint, cap: usize) {
        self.points.push_back(point);
        while self.points.len() > cap {
            self.points.pop_front();
        }
    }

    /// Oldest point fades most: `alpha_i = (i + 1) / len * max_alpha`.
    pub fn ramp_alpha(&mut self, max_alpha: f32) {
        let len = self.points.len() as f32;
        for (index, point) in self.points.iter_mut().enumerate() {
            point.alpha = (index as f32 + 1.0) / len * max_alpha;
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentBadges {
    pub executing: bool,
    pub promoted: bool,
    pub execution_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub glyph: String,
    pub sprite_key: Option<String>,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub color: Rgba,
    pub motion: MotionState,
    pub trail: Trail,
    pub animation: AnimationState,
    pub badges: AgentBadges,
}

impl Agent {
    pub fn from_descriptor(descriptor: AgentDescriptor, position: Vec2, radius: f32) -> Self {
        let glyph = descriptor
            .glyph
            .filter(|glyph| !glyph.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GLYPH.to_string());
        let color = descriptor
            .color_seed
            .map(|seed| AGENT_PALETTE[(seed % AGENT_PALETTE.len() as u64) as usize])
            .unwrap_or(NEUTRAL_COLOR);
        let name = descriptor
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| descriptor.id.clone());

        Self {
            id: AgentId::new(descriptor.id),
            name,
            glyph,
            sprite_key: descriptor.sprite_key,
            position,
            velocity: Vec2::ZERO,
            radius,
            color,
            motion: MotionState::Idle,
            trail: Trail::default(),
            animation: AnimationState::default(),
            badges: AgentBadges::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.motion.is_active()
    }

    /// Drops velocity, trail and any knockback, leaving the agent idle.
    pub(crate) fn settle(&mut self) {
        self.velocity = Vec2::ZERO;
        self.trail.clear();
        self.motion = MotionState::Idle;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantKind {
    Grass,
    Bush,
    Flower,
    Sprout,
}

impl PlantKind {
    pub const ALL: [PlantKind; 4] = [Self::Grass, Self::Bush, Self::Flower, Self::Sprout];

    fn size_range(self) -> (f32, f32) {
        match self {
            Self::Grass => (10.0, 16.0),
            Self::Bush => (16.0, 26.0),
            Self::Flower => (10.0, 14.0),
            Self::Sprout => (6.0, 10.0),
        }
    }

    fn palette(self) -> &'static [Rgba] {
        match self {
            Self::Grass => &[[88, 160, 72, 255], [108, 178, 84, 255], [74, 140, 64, 255]],
            Self::Bush => &[[52, 120, 60, 255], [66, 138, 70, 255]],
            Self::Flower => &[
                [240, 120, 160, 255],
                [250, 210, 90, 255],
                [170, 130, 230, 255],
                [245, 245, 245, 255],
            ],
            Self::Sprout => &[[140, 200, 96, 255], [120, 186, 90, 255]],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plant {
    pub kind: PlantKind,
    pub position: Vec2,
    pub size: f32,
    pub color: Rgba,
    pub phase_offset: f32,
    pub sway_speed: f32,
    pub sway_amount: f32,
}

impl Plant {
    fn random(bounds: Bounds, rng: &mut dyn RngCore) -> Self {
        let kind = random::pick(rng, &PlantKind::ALL)
            .copied()
            .unwrap_or(PlantKind::Grass);
        let (size_min, size_max) = kind.size_range();
        let size = random::uniform(rng, size_min, size_max);
        let color = random::pick(rng, kind.palette())
            .copied()
            .unwrap_or(NEUTRAL_COLOR);
        let position = Vec2::new(
            random::uniform(rng, size, bounds.width - size),
            random::uniform(rng, size, bounds.height - size),
        );

        Self {
            kind,
            position,
            size,
            color,
            phase_offset: random::uniform(rng, 0.0, TAU),
            sway_speed: random::uniform(rng, 0.8, 1.6),
            sway_amount: random::uniform(rng, 1.0, 3.0),
        }
    }

    /// Horizontal displacement of the plant body at `clock_s`.
    pub fn sway_offset(&self, clock_s: f32) -> f32 {
        (clock_s * self.sway_speed + self.phase_offset).sin() * self.sway_amount
    }
}

/// Owns the live agents and the plant decorations.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    agents: Vec<Agent>,
    plants: Vec<Plant>,
    bounds: Bounds,
    layout: LayoutConfig,
    activation_speed: f32,
}

impl EntityRegistry {
    pub fn new(layout: LayoutConfig, activation_speed: f32) -> Self {
        Self {
            agents: Vec::new(),
            plants: Vec::new(),
            bounds: Bounds::new(layout.initial_width as f32, layout.initial_height as f32),
            layout,
            activation_speed,
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| &agent.id == id)
    }

    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn add_agent(&mut self, descriptor: AgentDescriptor, rng: &mut dyn RngCore) -> bool {
        if self.agents.iter().any(|agent| agent.id.as_str() == descriptor.id) {
            warn!(agent_id = %descriptor.id, "agent_duplicate_rejected");
            return false;
        }

        let position = self.find_open_position(rng);
        let agent = Agent::from_descriptor(descriptor, position, self.layout.agent_radius);
        info!(
            agent_id = %agent.id,
            name = %agent.name,
            x = agent.position.x,
            y = agent.position.y,
            "agent_added"
        );
        self.agents.push(agent);
        true
    }

    pub fn remove_agent(&mut self, id: &AgentId) -> bool {
        let Some(index) = self.agents.iter().position(|agent| &agent.id == id) else {
            warn!(agent_id = %id, operation = "remove_agent", "agent_not_found");
            return false;
        };
        self.agents.remove(index);
        info!(agent_id = %id, "agent_removed");
        true
    }

    pub fn clear_agents(&mut self) -> usize {
        let removed = self.agents.len();
        self.agents.clear();
        info!(removed, "agents_cleared");
        removed
    }

    pub fn set_active(&mut self, id: &AgentId, active: bool, rng: &mut dyn RngCore) -> bool {
        let speed = self.activation_speed;
        let Some(agent) = self.find_mut(id, "set_active") else {
            return false;
        };

        match (active, agent.motion) {
            (true, MotionState::Moving) | (false, MotionState::Idle) => {}
            (true, _) => {
                agent.motion = MotionState::Moving;
                agent.velocity = Vec2::new(
                    random::uniform(rng, -speed, speed),
                    random::uniform(rng, -speed, speed),
                );
                agent.trail.clear();
                debug!(agent_id = %id, vx = agent.velocity.x, vy = agent.velocity.y, "agent_activated");
            }
            (false, _) => {
                agent.settle();
                debug!(agent_id = %id, "agent_deactivated");
            }
        }
        true
    }

    pub fn set_executing(&mut self, id: &AgentId, executing: bool) -> bool {
        self.update_badges(id, "set_executing", |badges| badges.executing = executing)
    }

    pub fn set_promoted(&mut self, id: &AgentId, promoted: bool) -> bool {
        self.update_badges(id, "set_promoted", |badges| badges.promoted = promoted)
    }

    pub fn set_execution_count(&mut self, id: &AgentId, count: u32) -> bool {
        self.update_badges(id, "set_execution_count", |badges| {
            badges.execution_count = count
        })
    }

    /// Moves an agent to `position`, clamped into the bounds. Motion state is
    /// kept; the trail is dropped so no streak is drawn across the jump.
    pub fn place_agent(&mut self, id: &AgentId, position: Vec2) -> bool {
        let bounds = self.bounds;
        let Some(agent) = self.find_mut(id, "place_agent") else {
            return false;
        };
        agent.position = bounds.clamp_circle(position, agent.radius);
        agent.trail.clear();
        true
    }

    /// Adopts new surface dimensions. A zero dimension is ignored; otherwise
    /// the plant set is regenerated and every agent is pulled back inside.
    pub fn resize(&mut self, width: u32, height: u32, rng: &mut dyn RngCore) -> bool {
        if width == 0 || height == 0 {
            debug!(width, height, "surface_resize_ignored");
            return false;
        }

        self.bounds = Bounds::new(width as f32, height as f32);
        let count = random::count_between(
            rng,
            self.layout.plant_count_min,
            self.layout.plant_count_max,
        );
        self.plants = (0..count)
            .map(|_| Plant::random(self.bounds, rng))
            .collect();

        let bounds = self.bounds;
        for agent in &mut self.agents {
            agent.position = bounds.clamp_circle(agent.position, agent.radius);
        }

        info!(width, height, plants = count, "surface_resized");
        true
    }

    /// Nearest agent whose centre lies within `radius + hit_tolerance` of
    /// `point`.
    pub fn hit_test(&self, point: Vec2) -> Option<&Agent> {
        let tolerance = self.layout.hit_tolerance;
        self.agents
            .iter()
            .map(|agent| (agent, agent.position.distance(point)))
            .filter(|(agent, distance)| *distance < agent.radius + tolerance)
            .min_by(|(_, left), (_, right)| left.total_cmp(right))
            .map(|(agent, _)| agent)
    }

    fn find_open_position(&self, rng: &mut dyn RngCore) -> Vec2 {
        let radius = self.layout.agent_radius;
        let padding = radius + self.layout.placement_margin;
        let min_spacing = radius * 2.0 + self.layout.placement_spacing;
        let mut candidate = Vec2::new(self.bounds.width * 0.5, self.bounds.height * 0.5);

        for _ in 0..self.layout.placement_attempts.max(1) {
            candidate = Vec2::new(
                random::uniform(rng, padding, self.bounds.width - padding),
                random::uniform(rng, padding, self.bounds.height - padding),
            );
            let clear = self
                .agents
                .iter()
                .all(|agent| agent.position.distance(candidate) >= min_spacing);
            if clear {
                return self.bounds.clamp_circle(candidate, radius);
            }
        }

        debug!(
            attempts = self.layout.placement_attempts,
            "agent_placement_fallback"
        );
        self.bounds.clamp_circle(candidate, radius)
    }

    fn find_mut(&mut self, id: &AgentId, operation: &'static str) -> Option<&mut Agent> {
        let found = self.agents.iter_mut().find(|agent| &agent.id == id);
        if found.is_none() {
            warn!(agent_id = %id, operation, "agent_not_found");
        }
        found
    }

    fn update_badges(
        &mut self,
        id: &AgentId,
        operation: &'static str,
        apply: impl FnOnce(&mut AgentBadges),
    ) -> bool {
        match self.find_mut(id, operation) {
            Some(agent) => {
                apply(&mut agent.badges);
                true
            }
            None => false,
        }
    }
}

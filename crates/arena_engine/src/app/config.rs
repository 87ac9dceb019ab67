use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be finite and greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be finite and not negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must lie within [0, 1], got {value}")]
    NotAProbability { field: &'static str, value: f64 },
    #[error("{field} range is inverted: min {min} > max {max}")]
    InvertedRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
}

/// Tunables for the whole simulation. Every section falls back to the
/// values the widget shipped with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub physics: PhysicsConfig,
    pub particles: ParticleConfig,
    pub animation: AnimationConfig,
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsConfig {
    pub max_speed: f32,
    /// Each velocity axis of a freshly activated agent is drawn from
    /// `[-activation_speed, activation_speed)`.
    pub activation_speed: f32,
    pub jitter_probability: f64,
    pub jitter_magnitude: f32,
    pub push_speed: f32,
    pub push_duration_ms: f64,
    pub pusher_rebound: f32,
    pub pushed_rebound: f32,
    pub push_damping: f32,
    pub active_trail_len: usize,
    pub pushed_trail_len: usize,
    pub trail_max_alpha: f32,
    pub pushed_trail_alpha: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            max_speed: 3.75,
            activation_speed: 1.125,
            jitter_probability: 0.02,
            jitter_magnitude: 0.225,
            push_speed: 3.0,
            push_duration_ms: 1000.0,
            pusher_rebound: -0.8,
            pushed_rebound: -0.6,
            push_damping: 0.98,
            active_trail_len: 15,
            pushed_trail_len: 8,
            trail_max_alpha: 0.4,
            pushed_trail_alpha: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParticleConfig {
    pub burst_min: usize,
    pub burst_max: usize,
    pub spawn_jitter: f32,
    pub cone_half_angle_deg: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub initial_scale: f32,
    pub peak_scale: f32,
    pub gravity: f32,
    pub max_rotation_speed: f32,
    pub lifetime_min_ms: f64,
    pub lifetime_max_ms: f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            burst_min: 3,
            burst_max: 5,
            spawn_jitter: 10.0,
            cone_half_angle_deg: 30.0,
            speed_min: 1.5,
            speed_max: 3.0,
            initial_scale: 0.1,
            peak_scale: 1.5,
            gravity: 0.02,
            max_rotation_speed: 0.05,
            lifetime_min_ms: 1500.0,
            lifetime_max_ms: 2000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationConfig {
    pub fps: f32,
    pub walk_frames: u8,
    pub moving_threshold: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fps: 8.0,
            walk_frames: 4,
            moving_threshold: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub initial_width: u32,
    pub initial_height: u32,
    pub agent_radius: f32,
    pub placement_attempts: u32,
    pub placement_margin: f32,
    pub placement_spacing: f32,
    pub hit_tolerance: f32,
    pub plant_count_min: usize,
    pub plant_count_max: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            initial_width: 800,
            initial_height: 600,
            agent_radius: 12.0,
            placement_attempts: 50,
            placement_margin: 5.0,
            placement_spacing: 10.0,
            hit_tolerance: 4.0,
            plant_count_min: 15,
            plant_count_max: 25,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let physics = &self.physics;
        positive("physics.max_speed", physics.max_speed as f64)?;
        non_negative("physics.activation_speed", physics.activation_speed as f64)?;
        probability("physics.jitter_probability", physics.jitter_probability)?;
        non_negative("physics.jitter_magnitude", physics.jitter_magnitude as f64)?;
        non_negative("physics.push_speed", physics.push_speed as f64)?;
        positive("physics.push_duration_ms", physics.push_duration_ms)?;
        probability("physics.push_damping", physics.push_damping as f64)?;
        probability("physics.trail_max_alpha", physics.trail_max_alpha as f64)?;
        probability("physics.pushed_trail_alpha", physics.pushed_trail_alpha as f64)?;

        let particles = &self.particles;
        ordered(
            "particles.burst",
            particles.burst_min as f64,
            particles.burst_max as f64,
        )?;
        ordered(
            "particles.speed",
            particles.speed_min as f64,
            particles.speed_max as f64,
        )?;
        positive("particles.lifetime_min_ms", particles.lifetime_min_ms)?;
        ordered(
            "particles.lifetime_ms",
            particles.lifetime_min_ms,
            particles.lifetime_max_ms,
        )?;
        positive("particles.peak_scale", particles.peak_scale as f64)?;
        non_negative("particles.spawn_jitter", particles.spawn_jitter as f64)?;

        positive("animation.fps", self.animation.fps as f64)?;
        positive("animation.walk_frames", self.animation.walk_frames as f64)?;

        let layout = &self.layout;
        positive("layout.initial_width", layout.initial_width as f64)?;
        positive("layout.initial_height", layout.initial_height as f64)?;
        positive("layout.agent_radius", layout.agent_radius as f64)?;
        non_negative("layout.hit_tolerance", layout.hit_tolerance as f64)?;
        ordered(
            "layout.plant_count",
            layout.plant_count_min as f64,
            layout.plant_count_max as f64,
        )?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::NotAProbability { field, value })
    }
}

fn ordered(field: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { field, min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config: SimConfig =
            serde_json::from_str(r#"{ "physics": { "max_speed": 5.0 } }"#).expect("parse");
        assert_eq!(config.physics.max_speed, 5.0);
        assert_eq!(config.physics.push_speed, 3.0);
        assert_eq!(config.particles, ParticleConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<SimConfig>(r#"{ "physics": { "warp": 1 } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn inverted_burst_range_is_reported() {
        let mut config = SimConfig::default();
        config.particles.burst_min = 6;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange {
                field: "particles.burst",
                ..
            })
        ));
    }

    #[test]
    fn out_of_range_probability_is_reported() {
        let mut config = SimConfig::default();
        config.physics.jitter_probability = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotAProbability { .. })
        ));
    }

    #[test]
    fn zero_initial_surface_is_reported() {
        let mut config = SimConfig::default();
        config.layout.initial_height = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "layout.initial_height",
                ..
            })
        ));
    }
}

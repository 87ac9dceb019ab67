use std::f32::consts::{FRAC_PI_2, TAU};

use rand::RngCore;

use super::config::ParticleConfig;
use super::geometry::Vec2;
use super::random;
use super::rendering::Rgba;

pub const HEART_PALETTE: [Rgba; 6] = [
    [255, 105, 180, 255],
    [255, 20, 147, 255],
    [255, 182, 193, 255],
    [255, 110, 140, 255],
    [255, 140, 170, 255],
    [240, 80, 120, 255],
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub alpha: f32,
    pub scale: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub created_at_ms: f64,
    pub lifetime_ms: f64,
    pub color: Rgba,
}

impl Particle {
    pub fn age_ms(&self, now_ms: f64) -> f64 {
        now_ms - self.created_at_ms
    }

    pub fn is_expired(&self, now_ms: f64) -> bool {
        self.age_ms(now_ms) >= self.lifetime_ms
    }
}

/// Heart bursts spawned at collision points. Particles grow during the first
/// half of their life, then fade out at full size.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    config: ParticleConfig,
    particles: Vec<Particle>,
}

impl ParticleSystem {
    pub fn new(config: ParticleConfig) -> Self {
        Self {
            config,
            particles: Vec::new(),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn spawn_burst(&mut self, origin: Vec2, now_ms: f64, rng: &mut dyn RngCore) -> usize {
        let config = &self.config;
        let count = random::count_between(rng, config.burst_min, config.burst_max);
        let cone = config.cone_half_angle_deg.to_radians();

        for _ in 0..count {
            let jitter = Vec2::new(
                random::uniform(rng, -config.spawn_jitter, config.spawn_jitter),
                random::uniform(rng, -config.spawn_jitter, config.spawn_jitter),
            );
            let angle = -FRAC_PI_2 + random::uniform(rng, -cone, cone);
            let speed = random::uniform(rng, config.speed_min, config.speed_max);
            let color = random::pick(rng, &HEART_PALETTE)
                .copied()
                .unwrap_or(HEART_PALETTE[0]);

            self.particles.push(Particle {
                position: origin + jitter,
                velocity: Vec2::from_angle(angle) * speed,
                alpha: 1.0,
                scale: config.initial_scale,
                rotation: random::uniform(rng, 0.0, TAU),
                rotation_speed: random::uniform(
                    rng,
                    -config.max_rotation_speed,
                    config.max_rotation_speed,
                ),
                created_at_ms: now_ms,
                lifetime_ms: random::uniform_f64(
                    rng,
                    config.lifetime_min_ms,
                    config.lifetime_max_ms,
                ),
                color,
            });
        }
        count
    }

    pub fn update(&mut self, now_ms: f64) {
        let config = &self.config;
        for particle in &mut self.particles {
            particle.position += particle.velocity;
            particle.velocity.y += config.gravity;
            particle.rotation += particle.rotation_speed;

            let progress = (particle.age_ms(now_ms) / particle.lifetime_ms) as f32;
            if progress < 0.5 {
                let growth = (progress / 0.5).max(0.0);
                particle.scale =
                    config.initial_scale + (config.peak_scale - config.initial_scale) * growth;
                particle.alpha = 1.0;
            } else {
                particle.scale = config.peak_scale;
                particle.alpha = (1.0 - (progress - 0.5) / 0.5).clamp(0.0, 1.0);
            }
        }
        self.particles.retain(|particle| !particle.is_expired(now_ms));
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    fn burst(seed: u64) -> ParticleSystem {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut system = ParticleSystem::new(ParticleConfig::default());
        system.spawn_burst(Vec2::new(100.0, 100.0), 0.0, &mut rng);
        system
    }

    #[test]
    fn burst_spawns_three_to_five_near_origin() {
        for seed in 0..20 {
            let system = burst(seed);
            assert!((3..=5).contains(&system.len()));
            for particle in system.particles() {
                assert!((particle.position.x - 100.0).abs() <= 10.0);
                assert!((particle.position.y - 100.0).abs() <= 10.0);
                assert_eq!(particle.scale, 0.1);
                assert_eq!(particle.alpha, 1.0);
                assert!(particle.velocity.y < 0.0);
                assert!((1500.0..=2000.0).contains(&particle.lifetime_ms));
            }
        }
    }

    #[test]
    fn scale_grows_then_alpha_fades() {
        let mut rng = SmallRng::seed_from_u64(9);
        let config = ParticleConfig {
            burst_min: 1,
            burst_max: 1,
            ..ParticleConfig::default()
        };
        let mut system = ParticleSystem::new(config);
        system.spawn_burst(Vec2::new(100.0, 100.0), 0.0, &mut rng);
        let mut previous_scale = 0.0;
        let mut previous_alpha = 1.0;
        let mut now = 0.0;

        while !system.is_empty() {
            now += 16.0;
            system.update(now);
            let Some(particle) = system.particles().first().copied() else {
                break;
            };
            let half_life = particle.lifetime_ms * 0.5;
            if now < half_life {
                assert!(particle.scale >= previous_scale);
                assert_eq!(particle.alpha, 1.0);
            } else {
                assert_eq!(particle.scale, 1.5);
                assert!(particle.alpha <= previous_alpha);
            }
            previous_scale = particle.scale;
            previous_alpha = particle.alpha;
        }
        assert!(now <= 2016.0);
    }

    #[test]
    fn particle_retires_exactly_at_lifetime() {
        let mut system = burst(4);
        let lifetime = system
            .particles()
            .iter()
            .map(|particle| particle.lifetime_ms)
            .fold(f64::INFINITY, f64::min);

        system.update(lifetime - 0.5);
        assert!(system
            .particles()
            .iter()
            .all(|particle| particle.age_ms(lifetime - 0.5) < particle.lifetime_ms));
        let before = system.len();

        system.update(lifetime);
        assert!(system.len() < before);
    }

    #[test]
    fn gravity_bends_trajectory_downward() {
        let mut system = burst(12);
        let initial = system.particles()[0].velocity.y;
        system.update(16.0);
        system.update(32.0);
        assert!((system.particles()[0].velocity.y - (initial + 0.04)).abs() < 1e-5);
    }
}

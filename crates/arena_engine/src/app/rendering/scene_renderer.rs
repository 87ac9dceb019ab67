use std::f32::consts::TAU;

use crate::app::animation::Facing;
use crate::app::geometry::Vec2;
use crate::app::particles::Particle;
use crate::app::registry::{Agent, Plant, PlantKind};
use crate::app::simulation::Simulation;

use super::sprites::SpriteCatalog;
use super::surface::{with_alpha, DrawSurface, Rgba, Shape};

const BACKGROUND_COLOR: Rgba = [44, 58, 46, 255];
const PLANT_SHADOW_COLOR: Rgba = [0, 0, 0, 48];
const FLOWER_STEM_COLOR: Rgba = [76, 140, 64, 255];
const FLOWER_CENTER_COLOR: Rgba = [255, 214, 90, 255];
const AGENT_OUTLINE_COLOR: Rgba = [24, 28, 32, 200];
const GLYPH_COLOR: Rgba = [255, 255, 255, 255];
const EXECUTING_COLOR: Rgba = [0, 230, 118, 255];
const PROMOTED_COLOR: Rgba = [255, 215, 0, 255];
const BADGE_COLOR: Rgba = [231, 76, 60, 255];
const HEART_HIGHLIGHT_COLOR: Rgba = [255, 255, 255, 255];

const TRAIL_THICKNESS_PX: f32 = 3.0;
const EXECUTING_PULSE_HZ: f64 = 0.75;
const ORBIT_DOT_COUNT: usize = 3;
const ORBIT_RADIANS_PER_S: f64 = 2.5;
const SPRITE_HEIGHT_PER_RADIUS: f32 = 2.6;
const BADGE_CAP: u32 = 99;
const HEART_PIXEL_PX: f32 = 2.0;

/// 7x6 pixel heart, one row per string.
const HEART_ROWS: [&str; 6] = [
    ".##.##.", //
    "#######", //
    "#######", //
    ".#####.", //
    "..###..", //
    "...#...", //
];
const HEART_HIGHLIGHT: (usize, usize) = (1, 1);

/// Draws a `Simulation` onto any `DrawSurface`. Holds only the sprite cache;
/// the simulation is never mutated.
#[derive(Debug, Default)]
pub struct SceneRenderer {
    sprites: SpriteCatalog,
}

impl SceneRenderer {
    pub fn new(sprites: SpriteCatalog) -> Self {
        Self { sprites }
    }

    pub fn sprites_mut(&mut self) -> &mut SpriteCatalog {
        &mut self.sprites
    }

    pub fn render(&mut self, sim: &Simulation, surface: &mut dyn DrawSurface) {
        let clock_s = sim.animation_clock_s();

        surface.clear(BACKGROUND_COLOR);
        let (width, height) = surface.size();
        surface.fill(
            &Shape::Rect {
                origin: Vec2::ZERO,
                size: Vec2::new(width as f32, height as f32),
            },
            BACKGROUND_COLOR,
        );

        for plant in sim.plants() {
            draw_plant(surface, plant, clock_s as f32);
        }
        for agent in sim.agents() {
            draw_trail(surface, agent);
        }
        for agent in sim.agents() {
            self.draw_agent(surface, agent, clock_s);
        }
        for particle in sim.particles() {
            draw_heart(surface, particle);
        }
    }

    fn draw_agent(&mut self, surface: &mut dyn DrawSurface, agent: &Agent, clock_s: f64) {
        if agent.badges.executing {
            draw_executing_ring(surface, agent, clock_s);
        }

        let sheet = agent
            .sprite_key
            .as_deref()
            .and_then(|key| self.sprites.resolve(key));
        match sheet {
            Some(sheet) => {
                let (frame_width, frame_height) = sheet.frame_size();
                let height = agent.radius * SPRITE_HEIGHT_PER_RADIUS;
                let width = height * frame_width as f32 / frame_height as f32;
                surface.draw_image_region(
                    sheet.image(),
                    sheet.frame_rect(agent.animation.current_frame),
                    agent.position,
                    Vec2::new(width, height),
                    agent.animation.facing == Facing::Left,
                );
            }
            None => {
                surface.fill(
                    &Shape::Circle {
                        center: agent.position,
                        radius: agent.radius,
                    },
                    agent.color,
                );
                surface.stroke_circle(agent.position, agent.radius, 1.5, AGENT_OUTLINE_COLOR);
                surface.draw_text(&agent.glyph, agent.position, agent.radius, GLYPH_COLOR);
            }
        }

        if agent.badges.promoted {
            surface.stroke_circle(agent.position, agent.radius + 2.0, 2.0, PROMOTED_COLOR);
            surface.fill(&crown(agent.position, agent.radius), PROMOTED_COLOR);
        }
        if agent.badges.execution_count > 0 {
            draw_count_badge(surface, agent);
        }
    }
}

fn draw_plant(surface: &mut dyn DrawSurface, plant: &Plant, clock_s: f32) {
    let base = plant.position;
    let size = plant.size;
    surface.fill(
        &Shape::Ellipse {
            center: Vec2::new(base.x, base.y + size * 0.1),
            radii: Vec2::new(size * 0.6, size * 0.2),
        },
        PLANT_SHADOW_COLOR,
    );

    let sway = plant.sway_offset(clock_s);
    let top = Vec2::new(base.x + sway, base.y - size);
    match plant.kind {
        PlantKind::Grass => {
            for blade in [-1.0_f32, 0.0, 1.0] {
                let root = Vec2::new(base.x + blade * size * 0.2, base.y);
                let tip = Vec2::new(top.x + blade * size * 0.3, top.y + blade.abs() * size * 0.25);
                surface.stroke_line(root, tip, 2.0, plant.color);
            }
        }
        PlantKind::Bush => {
            let lobe = size * 0.35;
            let middle = Vec2::new(base.x + sway * 0.5, base.y - size * 0.4);
            for offset in [-lobe, 0.0, lobe] {
                surface.fill(
                    &Shape::Circle {
                        center: Vec2::new(middle.x + offset, middle.y - (lobe - offset.abs()) * 0.5),
                        radius: lobe * 1.1,
                    },
                    plant.color,
                );
            }
        }
        PlantKind::Flower => {
            surface.stroke_line(base, top, 1.5, FLOWER_STEM_COLOR);
            let petal = size * 0.22;
            for index in 0..5 {
                let direction = Vec2::from_angle(index as f32 * TAU / 5.0);
                surface.fill(
                    &Shape::Circle {
                        center: top + direction * petal,
                        radius: petal,
                    },
                    plant.color,
                );
            }
            surface.fill(
                &Shape::Circle {
                    center: top,
                    radius: petal * 0.8,
                },
                FLOWER_CENTER_COLOR,
            );
        }
        PlantKind::Sprout => {
            surface.stroke_line(base, top, 1.5, plant.color);
            for side in [-1.0_f32, 1.0] {
                surface.fill(
                    &Shape::Ellipse {
                        center: Vec2::new(top.x + side * size * 0.3, top.y + size * 0.15),
                        radii: Vec2::new(size * 0.3, size * 0.15),
                    },
                    plant.color,
                );
            }
        }
    }
}

fn draw_trail(surface: &mut dyn DrawSurface, agent: &Agent) {
    for (older, newer) in agent.trail.iter().zip(agent.trail.iter().skip(1)) {
        surface.stroke_line(
            older.position,
            newer.position,
            TRAIL_THICKNESS_PX,
            with_alpha(agent.color, newer.alpha),
        );
    }
}

fn draw_executing_ring(surface: &mut dyn DrawSurface, agent: &Agent, clock_s: f64) {
    let pulse = (0.5 + 0.5 * (clock_s * EXECUTING_PULSE_HZ * std::f64::consts::TAU).sin()) as f32;
    surface.stroke_circle(
        agent.position,
        agent.radius + 4.0 + pulse * 3.0,
        2.0,
        with_alpha(EXECUTING_COLOR, 0.35 + 0.45 * pulse),
    );

    let base_angle = (clock_s * ORBIT_RADIANS_PER_S) as f32;
    for index in 0..ORBIT_DOT_COUNT {
        let angle = base_angle + index as f32 * TAU / ORBIT_DOT_COUNT as f32;
        surface.fill(
            &Shape::Circle {
                center: agent.position + Vec2::from_angle(angle) * (agent.radius + 8.0),
                radius: 2.0,
            },
            EXECUTING_COLOR,
        );
    }
}

fn crown(center: Vec2, radius: f32) -> Shape {
    let base_y = center.y - radius - 2.0;
    let half = radius * 0.55;
    Shape::Polygon(vec![
        Vec2::new(center.x - half, base_y),
        Vec2::new(center.x + half, base_y),
        Vec2::new(center.x + half, base_y - 6.0),
        Vec2::new(center.x + half * 0.5, base_y - 3.0),
        Vec2::new(center.x, base_y - 8.0),
        Vec2::new(center.x - half * 0.5, base_y - 3.0),
        Vec2::new(center.x - half, base_y - 6.0),
    ])
}

pub(crate) fn badge_label(count: u32) -> String {
    if count > BADGE_CAP {
        format!("{BADGE_CAP}+")
    } else {
        count.to_string()
    }
}

fn draw_count_badge(surface: &mut dyn DrawSurface, agent: &Agent) {
    let label = badge_label(agent.badges.execution_count);
    let center = agent.position + Vec2::new(agent.radius * 0.8, -agent.radius * 0.8);
    let radius = 4.0 + label.len() as f32 * 2.0;
    surface.fill(&Shape::Circle { center, radius }, BADGE_COLOR);
    surface.draw_text(&label, center, 5.0, GLYPH_COLOR);
}

fn draw_heart(surface: &mut dyn DrawSurface, particle: &Particle) {
    let cell = HEART_PIXEL_PX * particle.scale;
    let half = cell * 0.5;
    let color = with_alpha(particle.color, particle.alpha);
    let rows = HEART_ROWS.len() as f32;

    let mut draw_cell = |column: usize, row: usize, color: Rgba| {
        let local = Vec2::new(
            (column as f32 - 3.0) * cell,
            (row as f32 - (rows - 1.0) * 0.5) * cell,
        );
        let corners = [
            Vec2::new(-half, -half),
            Vec2::new(half, -half),
            Vec2::new(half, half),
            Vec2::new(-half, half),
        ]
        .map(|corner| particle.position + (local + corner).rotated(particle.rotation));
        surface.fill(&Shape::Polygon(corners.to_vec()), color);
    };

    for (row, pattern) in HEART_ROWS.iter().enumerate() {
        for (column, mark) in pattern.bytes().enumerate() {
            if mark == b'#' {
                draw_cell(column, row, color);
            }
        }
    }
    let (column, row) = HEART_HIGHLIGHT;
    draw_cell(
        column,
        row,
        with_alpha(HEART_HIGHLIGHT_COLOR, particle.alpha * 0.8),
    );
}

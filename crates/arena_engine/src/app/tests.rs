use std::fs;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use super::*;
use crate::{sprite_sheet_path, AppPaths, SpriteKeyError};

fn seeded_simulation(seed: u64) -> Simulation {
    Simulation::new(SimConfig::default(), Box::new(SmallRng::seed_from_u64(seed)))
        .expect("default config is valid")
}

fn populate(sim: &mut Simulation, count: usize) -> Vec<AgentId> {
    (0..count)
        .map(|index| {
            let id = AgentId::new(format!("agent-{index}"));
            assert!(sim.add_agent(AgentDescriptor::new(id.as_str())));
            id
        })
        .collect()
}

fn run_frames(sim: &mut Simulation, start_ms: f64, frames: usize) -> f64 {
    let mut now_ms = start_ms;
    for _ in 0..frames {
        now_ms += 16.0;
        sim.update(FrameTime::new(now_ms, 16.0));
    }
    now_ms
}

fn assert_inside(sim: &Simulation) {
    let bounds = sim.bounds();
    for agent in sim.agents() {
        assert!(
            bounds.contains_circle(agent.position, agent.radius),
            "{} escaped to {:?}",
            agent.id,
            agent.position
        );
    }
}

#[test]
fn busy_arena_keeps_agents_inside_and_under_speed_cap() {
    let mut sim = seeded_simulation(11);
    let ids = populate(&mut sim, 12);
    for id in ids.iter().step_by(2) {
        assert!(sim.set_active(id, true));
    }

    let max_speed = sim.config().physics.max_speed;
    let mut now_ms = 0.0;
    for _ in 0..600 {
        now_ms = run_frames(&mut sim, now_ms, 1);
        assert_inside(&sim);
        for agent in sim.agents().iter().filter(|agent| agent.is_active()) {
            assert!(agent.velocity.x.abs() <= max_speed + 1e-4);
            assert!(agent.velocity.y.abs() <= max_speed + 1e-4);
        }
    }
    assert_eq!(sim.frame_count(), 600);
}

#[test]
fn shrinking_surface_pulls_agents_in_and_regrows_plants() {
    let mut sim = seeded_simulation(12);
    let ids = populate(&mut sim, 3);
    assert!(sim.place_agent(&ids[0], Vec2::new(790.0, 590.0)));

    assert!(sim.resize(300, 200));
    assert_eq!(sim.bounds(), Bounds::new(300.0, 200.0));
    assert_inside(&sim);
    assert!((15..=25).contains(&sim.plants().len()));
    for plant in sim.plants() {
        assert!(plant.position.x >= 0.0 && plant.position.x <= 300.0);
        assert!(plant.position.y >= 0.0 && plant.position.y <= 200.0);
    }

    assert!(!sim.resize(0, 200));
    assert_eq!(sim.bounds(), Bounds::new(300.0, 200.0));
}

#[test]
fn hit_test_prefers_the_nearest_agent() {
    let mut sim = seeded_simulation(13);
    let ids = populate(&mut sim, 2);
    sim.place_agent(&ids[0], Vec2::new(100.0, 100.0));
    sim.place_agent(&ids[1], Vec2::new(120.0, 100.0));

    let hit = sim.hit_test(Vec2::new(112.0, 100.0)).expect("hit");
    assert_eq!(hit.id, ids[1]);
    assert!(sim.hit_test(Vec2::new(400.0, 400.0)).is_none());
}

#[test]
fn roster_operations_report_unknown_and_duplicate_ids() {
    let mut sim = seeded_simulation(14);
    assert!(sim.add_agent(AgentDescriptor::new("scout")));
    assert!(!sim.add_agent(AgentDescriptor::new("scout").with_glyph("S")));

    let scout = sim.agent(&AgentId::from("scout")).expect("scout");
    assert_eq!(scout.glyph, DEFAULT_GLYPH);
    assert_eq!(scout.name, "scout");

    let ghost = AgentId::from("ghost");
    assert!(!sim.set_active(&ghost, true));
    assert!(!sim.set_executing(&ghost, true));
    assert!(!sim.place_agent(&ghost, Vec2::ZERO));
    assert!(!sim.remove_agent(&ghost));

    assert_eq!(sim.clear_agents(), 1);
    assert!(sim.agents().is_empty());
}

#[test]
fn hearts_fade_out_after_their_lifetime() {
    let mut sim = seeded_simulation(15);
    let ids = populate(&mut sim, 2);
    sim.set_active(&ids[0], true);
    sim.place_agent(&ids[0], Vec2::new(200.0, 200.0));
    sim.place_agent(&ids[1], Vec2::new(210.0, 200.0));
    sim.update(FrameTime::new(1000.0, 16.0));
    assert!(!sim.particles().is_empty());

    sim.clear_agents();
    sim.update(FrameTime::new(3001.0, 16.0));
    assert!(sim.particles().is_empty());
    assert!(sim.last_collision_events().is_empty());
}

#[test]
fn deactivating_everyone_brings_the_arena_to_rest() {
    let mut sim = seeded_simulation(16);
    let ids = populate(&mut sim, 6);
    for id in &ids {
        sim.set_active(id, true);
    }
    let now_ms = run_frames(&mut sim, 0.0, 120);

    for id in &ids {
        assert!(sim.set_active(id, false));
    }
    run_frames(&mut sim, now_ms, 2);

    for agent in sim.agents() {
        assert_eq!(agent.motion, MotionState::Idle);
        assert!(agent.trail.is_empty());
        assert_eq!(agent.animation.current_frame, IDLE_FRAME);
    }
}

#[test]
fn rendering_a_live_arena_draws_every_layer() {
    struct CountingSurface {
        fills: usize,
        texts: usize,
    }

    impl DrawSurface for CountingSurface {
        fn size(&self) -> (u32, u32) {
            (800, 600)
        }
        fn clear(&mut self, _color: Rgba) {}
        fn fill(&mut self, _shape: &Shape, _color: Rgba) {
            self.fills += 1;
        }
        fn stroke_circle(&mut self, _center: Vec2, _radius: f32, _thickness: f32, _color: Rgba) {}
        fn stroke_line(&mut self, _from: Vec2, _to: Vec2, _thickness: f32, _color: Rgba) {}
        fn draw_image_region(
            &mut self,
            _image: &SpriteImage,
            _source: SourceRect,
            _center: Vec2,
            _size: Vec2,
            _flip_x: bool,
        ) {
        }
        fn draw_text(&mut self, _text: &str, _center: Vec2, _size_px: f32, _color: Rgba) {
            self.texts += 1;
        }
    }

    let mut sim = seeded_simulation(17);
    let ids = populate(&mut sim, 4);
    sim.set_active(&ids[0], true);
    run_frames(&mut sim, 0.0, 10);

    let mut renderer = SceneRenderer::default();
    let mut surface = CountingSurface { fills: 0, texts: 0 };
    renderer.render(&sim, &mut surface);

    assert!(surface.fills > sim.plants().len());
    assert!(surface.texts >= ids.len());
}

fn write_strip(path: &std::path::Path, frame_width: u32, height: u32) {
    let mut strip = image::RgbaImage::new(frame_width * SHEET_FRAME_COUNT, height);
    for (x, _, pixel) in strip.enumerate_pixels_mut() {
        let frame = (x / frame_width) as u8;
        *pixel = image::Rgba([frame * 40, 0, 255 - frame * 40, 255]);
    }
    strip.save(path).expect("write png");
}

#[test]
fn sprite_sheet_round_trips_through_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("walker.png");
    write_strip(&path, 6, 4);

    let sheet = load_sprite_sheet(&path).expect("sheet loads");
    assert_eq!(sheet.frame_size(), (6, 4));
    let third = sheet.frame_rect(2);
    assert_eq!(sheet.image().pixel(third.x, 0), Some([80, 0, 175, 255]));

    let broken = dir.path().join("broken.png");
    fs::write(&broken, b"not a png").expect("write junk");
    assert!(matches!(
        load_sprite_sheet(&broken),
        Err(SpriteLoadError::Decode { .. })
    ));
}

#[test]
fn renderer_draws_sprites_from_the_asset_tree() {
    struct ImageCounter {
        images: Vec<(SourceRect, bool)>,
        texts: usize,
    }

    impl DrawSurface for ImageCounter {
        fn size(&self) -> (u32, u32) {
            (800, 600)
        }
        fn clear(&mut self, _color: Rgba) {}
        fn fill(&mut self, _shape: &Shape, _color: Rgba) {}
        fn stroke_circle(&mut self, _center: Vec2, _radius: f32, _thickness: f32, _color: Rgba) {}
        fn stroke_line(&mut self, _from: Vec2, _to: Vec2, _thickness: f32, _color: Rgba) {}
        fn draw_image_region(
            &mut self,
            _image: &SpriteImage,
            source: SourceRect,
            _center: Vec2,
            _size: Vec2,
            flip_x: bool,
        ) {
            self.images.push((source, flip_x));
        }
        fn draw_text(&mut self, _text: &str, _center: Vec2, _size_px: f32, _color: Rgba) {
            self.texts += 1;
        }
    }

    let root = tempfile::tempdir().expect("tempdir");
    let paths = AppPaths::from_root(root.path().to_path_buf());
    fs::create_dir_all(&paths.sprite_dir).expect("sprite dir");
    write_strip(&paths.sprite_dir.join("walker.png"), 8, 8);

    let mut sim = seeded_simulation(18);
    sim.add_agent(AgentDescriptor::new("walker").with_sprite_key("walker"));
    sim.add_agent(AgentDescriptor::new("ghost").with_sprite_key("missing"));

    let mut renderer = SceneRenderer::new(SpriteCatalog::new(&paths.sprite_dir));
    let mut surface = ImageCounter {
        images: Vec::new(),
        texts: 0,
    };
    renderer.render(&sim, &mut surface);

    assert_eq!(surface.images.len(), 1);
    assert_eq!(surface.images[0].0.x, 0);
    assert!(!surface.images[0].1);
    assert!(surface.texts >= 1);
}

#[test]
fn sprite_keys_cannot_escape_the_sprite_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(matches!(
        sprite_sheet_path(dir.path(), "../secrets"),
        Err(SpriteKeyError::ParentTraversal)
    ));
    let nested = sprite_sheet_path(dir.path(), "crew/pilot").expect("valid key");
    assert_eq!(nested, dir.path().join("crew").join("pilot.png"));
}

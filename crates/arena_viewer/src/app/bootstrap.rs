use std::env;
use std::path::PathBuf;

use arena_engine::{
    resolve_app_paths, ArenaHost, LoopConfig, SceneRenderer, Simulation, SpriteCatalog,
};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::config::{load_viewer_config, ViewerConfigError};
use super::demo::DemoHost;

const CONFIG_ENV_VAR: &str = "ARENA_CONFIG";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) simulation: Simulation,
    pub(crate) renderer: SceneRenderer,
    pub(crate) host: Box<dyn ArenaHost>,
}

pub(crate) fn build_app() -> Result<AppWiring, ViewerConfigError> {
    init_tracing();
    info!("=== Agent Arena Startup ===");

    let config_path = env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
    let viewer_config = load_viewer_config(config_path.as_deref())?;
    info!(
        config = ?config_path,
        agents = viewer_config.roster.len(),
        seed = ?viewer_config.seed,
        "viewer_config_loaded"
    );

    let mut sim_rng = seeded_rng(viewer_config.seed);
    let demo_rng = SmallRng::seed_from_u64(sim_rng.next_u64());
    let simulation = Simulation::new(viewer_config.simulation.clone(), Box::new(sim_rng))?;

    let sprites = match resolve_app_paths() {
        Ok(paths) => {
            info!(sprite_dir = %paths.sprite_dir.display(), "asset_root_resolved");
            SpriteCatalog::new(paths.sprite_dir)
        }
        Err(error) => {
            warn!(error = %error, "asset_root_unavailable");
            SpriteCatalog::empty()
        }
    };

    let host = DemoHost::new(viewer_config.demo.clone(), viewer_config.roster.clone(), demo_rng);
    Ok(AppWiring {
        config: viewer_config.window.to_loop_config(),
        simulation,
        renderer: SceneRenderer::new(sprites),
        host: Box::new(host),
    })
}

fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

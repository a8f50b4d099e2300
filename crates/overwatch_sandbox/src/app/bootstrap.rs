use std::path::PathBuf;

use overwatch::{ConfigError, OverwatchConfig, SandboxCapacities, CONFIG_ENV_VAR};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const TICKS_ENV_VAR: &str = "OVERWATCH_SANDBOX_TICKS";
const DEFAULT_TICKS: u32 = 1_200;

pub(crate) struct AppWiring {
    pub(crate) config: OverwatchConfig,
    pub(crate) capacities: SandboxCapacities,
    pub(crate) ticks: u32,
}

pub(crate) fn build_app() -> Result<AppWiring, ConfigError> {
    init_tracing();
    info!("=== Overwatch Sandbox Startup ===");

    let config = load_config()?;
    let ticks = ticks_from_env();
    info!(
        building = config.enable.building,
        vehicle = config.enable.vehicle,
        animal = config.enable.animal,
        ticks,
        "sandbox_configured"
    );

    Ok(AppWiring {
        config,
        capacities: SandboxCapacities::default(),
        ticks,
    })
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

fn load_config() -> Result<OverwatchConfig, ConfigError> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(raw) => {
            let path = PathBuf::from(raw);
            info!(path = %path.display(), "loading_config");
            OverwatchConfig::load(&path)
        }
        None => Ok(OverwatchConfig::all_enabled()),
    }
}

fn ticks_from_env() -> u32 {
    match std::env::var(TICKS_ENV_VAR) {
        Ok(raw) => parse_ticks(&raw).unwrap_or_else(|| {
            warn!(value = %raw, default = DEFAULT_TICKS, "invalid_tick_count");
            DEFAULT_TICKS
        }),
        Err(_) => DEFAULT_TICKS,
    }
}

fn parse_ticks(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|ticks| *ticks > 0)
}

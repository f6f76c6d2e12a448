use ::config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::{error, info};
use waypath_navigation::{AgentConfig, BuildConfig};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Which build path turns the demo terrain into a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainSource {
    /// Sample the height function at every cell center.
    Heightfield,
    /// Triangulate the height function and rasterize the mesh.
    Mesh,
}

/// Scenario parameters for the headless demo.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub source: TerrainSource,
    /// Side length of the square terrain, centered on the origin.
    pub extent: f32,
    /// Amplitude of the rolling hills.
    pub hill_height: f32,
    /// Distance between neighbouring hill crests.
    pub hill_wavelength: f32,
    pub agents: usize,
    /// Simulation steps per second.
    pub frame_rate: f32,
    /// Frame budget per round; agents still moving afterwards are reported stuck.
    pub max_frames: u32,
    /// Pace frames against the wall clock instead of running flat out.
    pub realtime: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            source: TerrainSource::Heightfield,
            extent: 40.0,
            hill_height: 1.0,
            hill_wavelength: 16.0,
            agents: 4,
            frame_rate: 60.0,
            max_frames: 3600,
            realtime: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub build: BuildConfig,
    pub agent: AgentConfig,
    pub demo: DemoConfig,
}

impl Settings {
    /// Validates every section, so bad values are reported before any work starts.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.build.validate()?;
        self.agent.validate()?;
        let demo = &self.demo;
        anyhow::ensure!(demo.extent > 0.0 && demo.extent.is_finite(), "demo.extent must be positive");
        anyhow::ensure!(demo.hill_wavelength > 0.0, "demo.hill_wavelength must be positive");
        anyhow::ensure!(demo.hill_height.is_finite(), "demo.hill_height must be finite");
        anyhow::ensure!(demo.agents > 0, "demo.agents must be at least 1");
        anyhow::ensure!(demo.frame_rate > 0.0 && demo.frame_rate.is_finite(), "demo.frame_rate must be positive");
        Ok(())
    }
}

/// Loads settings from an optional TOML file, then `WAYPATH__SECTION__KEY`
/// environment overrides.
pub fn load_settings(path: &str) -> Result<Settings, ConfigError> {
    info!("Attempting to load configuration from {}", path);

    let settings = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix("WAYPATH")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|config| config.try_deserialize::<Settings>());

    match settings {
        Ok(settings) => {
            info!(?settings, "Successfully loaded configuration");
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

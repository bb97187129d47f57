use crate::models::{ChallengeConfig, EngineSettings};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use ::config::{Config, Environment, File, FileFormat};
use std::fs;

/// Prefix for environment variables that override settings,
/// e.g. `CODEXP_LEVELS__LEVEL_COUNT=50`.
pub const ENV_PREFIX: &str = "CODEXP";

/// Configuration manager for loading and saving YAML configuration files.
///
/// Manages two configuration files in the data directory:
/// - Settings (`CodeXP Settings.yaml`): level curve, notification toggles
/// - Challenges (`CodeXP Challenges.yaml`): static challenges and progressive tracks
#[derive(Debug, Clone)]
pub struct ConfigManager {
    data_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
    challenges_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified data directory.
    ///
    /// # Arguments
    /// * `data_dir` - Directory containing configuration files (e.g., "CodeXP Data")
    pub fn new<P: AsRef<Utf8Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();

        // Create data directory if it doesn't exist
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)
                .with_context(|| format!("Failed to create data directory: {}", data_dir))?;
        }

        Ok(Self {
            settings_path: data_dir.join("CodeXP Settings.yaml"),
            challenges_path: data_dir.join("CodeXP Challenges.yaml"),
            data_dir,
        })
    }

    /// Load engine settings.
    ///
    /// Values come from the settings file (optional) and are then overridden by
    /// `CODEXP_*` environment variables. Sections missing from both fall back to
    /// defaults.
    pub fn load_settings(&self) -> Result<EngineSettings> {
        self.load_settings_with_env(Environment::with_prefix(ENV_PREFIX))
    }

    /// Load engine settings with an explicit environment source.
    pub fn load_settings_with_env(&self, environment: Environment) -> Result<EngineSettings> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let settings = Config::builder()
            .add_source(
                File::from(self.settings_path.as_std_path())
                    .format(FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                environment
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?
            .try_deserialize::<EngineSettings>()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        Ok(settings)
    }

    /// Save engine settings.
    pub fn save_settings(&self, settings: &EngineSettings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Load the challenge catalog configuration.
    ///
    /// # Returns
    /// The loaded ChallengeConfig, or the built-in tracks if the file doesn't exist
    pub fn load_challenge_config(&self) -> Result<ChallengeConfig> {
        if !self.challenges_path.exists() {
            tracing::warn!(
                "Challenge file not found at {}, using built-in challenges",
                self.challenges_path
            );
            return Ok(ChallengeConfig::default());
        }

        let file_contents = fs::read_to_string(&self.challenges_path).with_context(|| {
            format!("Failed to read challenges: {}", self.challenges_path)
        })?;

        let config: ChallengeConfig = serde_yaml_ng::from_str(&file_contents).with_context(|| {
            format!("Failed to parse challenges: {}", self.challenges_path)
        })?;

        tracing::info!(
            "Loaded {} challenges and {} tracks from {}",
            config.challenges.len(),
            config.tracks.len(),
            self.challenges_path
        );
        Ok(config)
    }

    /// Save the challenge catalog configuration.
    pub fn save_challenge_config(&self, config: &ChallengeConfig) -> Result<()> {
        let yaml_string = serde_yaml_ng::to_string(config)
            .context("Failed to serialize challenges to YAML")?;

        fs::write(&self.challenges_path, yaml_string).with_context(|| {
            format!("Failed to write challenges: {}", self.challenges_path)
        })?;

        tracing::info!("Saved challenges to {}", self.challenges_path);
        Ok(())
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }

    pub fn challenges_path(&self) -> &Utf8Path {
        &self.challenges_path
    }
}

//! Configuration management with validation and defaults
//!
//! Every section carries serde defaults, so a TOML file only needs to name the values it changes.

use crate::errors::{ConfigError, ParlorResult};
use serde::{Deserialize, Serialize};
use std::{env, path::Path, time::Duration};

/// Top-level configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "RawConfig")]
pub struct ParlorConfig {
    pub chat: ChatConfig,
    pub trivia: GameConfig,
    pub scramble: GameConfig,
    pub economy: EconomyConfig,
    pub storage: StorageConfig,
    pub monitoring: MonitoringConfig,
}

impl Default for ParlorConfig {
    fn default() -> Self {
        Self {
            chat: ChatConfig::default(),
            trivia: GameConfig::trivia(),
            scramble: GameConfig::scramble(),
            economy: EconomyConfig::default(),
            storage: StorageConfig::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

/// On-disk shape: game sections are partial and fill in from their own kind's defaults
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawConfig {
    chat: ChatConfig,
    trivia: GameOverrides,
    scramble: GameOverrides,
    economy: EconomyConfig,
    storage: StorageConfig,
    monitoring: MonitoringConfig,
}

impl From<RawConfig> for ParlorConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            chat: raw.chat,
            trivia: raw.trivia.apply(GameConfig::trivia()),
            scramble: raw.scramble.apply(GameConfig::scramble()),
            economy: raw.economy,
            storage: raw.storage,
            monitoring: raw.monitoring,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct GameOverrides {
    cooldown_secs: Option<u64>,
    hint_after_secs: Option<u64>,
    timeout_secs: Option<u64>,
    tick_millis: Option<u64>,
    grace_secs: Option<u64>,
    max_guess_len: Option<usize>,
    correct_threshold: Option<f64>,
    close_threshold: Option<f64>,
    reward_points: Option<u64>,
    bonus_points: Option<u64>,
    bonus_threshold: Option<f64>,
}

impl GameOverrides {
    fn apply(self, base: GameConfig) -> GameConfig {
        GameConfig {
            cooldown_secs: self.cooldown_secs.unwrap_or(base.cooldown_secs),
            hint_after_secs: self.hint_after_secs.unwrap_or(base.hint_after_secs),
            timeout_secs: self.timeout_secs.unwrap_or(base.timeout_secs),
            tick_millis: self.tick_millis.unwrap_or(base.tick_millis),
            grace_secs: self.grace_secs.unwrap_or(base.grace_secs),
            max_guess_len: self.max_guess_len.unwrap_or(base.max_guess_len),
            correct_threshold: self.correct_threshold.unwrap_or(base.correct_threshold),
            close_threshold: self.close_threshold.unwrap_or(base.close_threshold),
            reward_points: self.reward_points.unwrap_or(base.reward_points),
            bonus_points: self.bonus_points.unwrap_or(base.bonus_points),
            bonus_threshold: self.bonus_threshold.unwrap_or(base.bonus_threshold),
        }
    }
}

/// Chat-facing settings used by the console front end
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub room: String,
    pub prefix: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            room: "lobby".to_string(),
            prefix: "#".to_string(),
        }
    }
}

/// Timing, matching and reward settings for one game kind
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameConfig {
    /// Silent anti-spam window measured from the previous start
    pub cooldown_secs: u64,
    pub hint_after_secs: u64,
    pub timeout_secs: u64,
    pub tick_millis: u64,
    /// "Already running" is only announced once a round is older than this
    pub grace_secs: u64,
    /// Guesses longer than this (in characters) are ignored
    pub max_guess_len: usize,
    pub correct_threshold: f64,
    pub close_threshold: f64,
    pub reward_points: u64,
    pub bonus_points: u64,
    /// Similarity at or above which `bonus_points` replaces `reward_points`
    pub bonus_threshold: f64,
}

impl GameConfig {
    /// Free-text trivia: longer, noisier answers get the higher bar
    pub fn trivia() -> Self {
        Self {
            cooldown_secs: 10,
            hint_after_secs: 20,
            timeout_secs: 30,
            tick_millis: 1000,
            grace_secs: 5,
            max_guess_len: 250,
            correct_threshold: 0.90,
            close_threshold: 0.75,
            reward_points: 8,
            bonus_points: 10,
            bonus_threshold: 0.92,
        }
    }

    /// Single-word scrambles
    pub fn scramble() -> Self {
        Self {
            timeout_secs: 40,
            correct_threshold: 0.85,
            close_threshold: 0.70,
            reward_points: 6,
            bonus_points: 8,
            bonus_threshold: 0.95,
            ..Self::trivia()
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn hint_after(&self) -> Duration {
        Duration::from_secs(self.hint_after_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }

    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(invalid(section, "timeout_secs", "must be > 0"));
        }
        if self.tick_millis == 0 {
            return Err(invalid(section, "tick_millis", "must be > 0"));
        }
        if self.hint_after_secs >= self.timeout_secs {
            return Err(invalid(
                section,
                "hint_after_secs",
                "hint must come before the timeout",
            ));
        }
        let hint_window_millis = (self.timeout_secs - self.hint_after_secs).saturating_mul(1000);
        if self.tick_millis >= hint_window_millis {
            return Err(invalid(
                section,
                "tick_millis",
                "must be shorter than the gap between hint and timeout",
            ));
        }
        for (field, value) in [
            ("correct_threshold", self.correct_threshold),
            ("close_threshold", self.close_threshold),
            ("bonus_threshold", self.bonus_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(section, field, "must be within [0, 1]"));
            }
        }
        if self.close_threshold > self.correct_threshold {
            return Err(invalid(
                section,
                "close_threshold",
                "must not exceed correct_threshold",
            ));
        }
        if self.max_guess_len == 0 {
            return Err(invalid(section, "max_guess_len", "must be > 0"));
        }
        Ok(())
    }
}

/// Points economy settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub win_probability: f64,
    /// Global roulette anti-spam window
    pub gamble_cooldown_secs: u64,
    pub daily_bonus: u64,
    pub daily_cooldown_secs: u64,
    pub leaderboard_size: usize,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            win_probability: 0.5,
            gamble_cooldown_secs: 5,
            daily_bonus: 50,
            daily_cooldown_secs: 86_400,
            leaderboard_size: 5,
        }
    }
}

impl EconomyConfig {
    pub fn gamble_cooldown(&self) -> Duration {
        Duration::from_secs(self.gamble_cooldown_secs)
    }

    pub fn daily_cooldown(&self) -> Duration {
        Duration::from_secs(self.daily_cooldown_secs)
    }
}

/// Locations of the flat files the bot reads and writes
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub accounts_path: String,
    pub trivia_path: String,
    pub scramble_path: String,
    pub autosave_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            accounts_path: "data/user_data.json".to_string(),
            trivia_path: "data/trivia_questions.json".to_string(),
            scramble_path: "data/scramble_words.json".to_string(),
            autosave_secs: 300,
        }
    }
}

impl StorageConfig {
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: LogLevel,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl ParlorConfig {
    /// Short timings for tests and local experiments
    pub fn fast() -> Self {
        let quick = |base: GameConfig| GameConfig {
            cooldown_secs: 1,
            hint_after_secs: 2,
            timeout_secs: 4,
            tick_millis: 100,
            grace_secs: 1,
            ..base
        };
        Self {
            trivia: quick(GameConfig::trivia()),
            scramble: quick(GameConfig::scramble()),
            economy: EconomyConfig {
                gamble_cooldown_secs: 0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Validate configuration for logical consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.trivia.validate("trivia")?;
        self.scramble.validate("scramble")?;

        if !(0.0..=1.0).contains(&self.economy.win_probability) {
            return Err(invalid("economy", "win_probability", "must be within [0, 1]"));
        }
        if self.economy.leaderboard_size == 0 {
            return Err(invalid("economy", "leaderboard_size", "must be > 0"));
        }
        if self.storage.accounts_path.is_empty() {
            return Err(invalid("storage", "accounts_path", "must not be empty"));
        }
        if self.storage.autosave_secs == 0 {
            return Err(invalid("storage", "autosave_secs", "must be > 0"));
        }
        if self.chat.prefix.is_empty() {
            return Err(invalid("chat", "prefix", "must not be empty"));
        }

        Ok(())
    }
}

fn invalid(section: &str, field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: format!("{}.{}", section, field),
        reason: reason.to_string(),
    }
}

/// Configuration loader with environment variable support
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables, then validate
    pub fn load(&self) -> ParlorResult<ParlorConfig> {
        let mut config = match self.config_path {
            Some(ref path) => Self::load_from_file(path)?,
            None => ParlorConfig::default(),
        };

        Self::apply_overrides(&mut config, |key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    fn load_from_file(path: &str) -> Result<ParlorConfig, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to parse TOML: {}", e)))
    }

    /// Apply `PARLOR_*` overrides read through `lookup`
    fn apply_overrides<F>(config: &mut ParlorConfig, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(room) = lookup("PARLOR_ROOM") {
            config.chat.room = room;
        }
        if let Some(prefix) = lookup("PARLOR_PREFIX") {
            config.chat.prefix = prefix;
        }
        if let Some(path) = lookup("PARLOR_ACCOUNTS_PATH") {
            config.storage.accounts_path = path;
        }
        if let Some(raw) = lookup("PARLOR_WIN_PROBABILITY") {
            config.economy.win_probability =
                raw.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "PARLOR_WIN_PROBABILITY".to_string(),
                    reason: format!("'{}' is not a number", raw),
                })?;
        }

        Ok(())
    }
}

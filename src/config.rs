//! Application-level configuration loading: scoring timings, input, narration, recording and
//! history settings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::services::narration::Locale;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "RALLY_SCORE_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// `match` section.
    pub scoring: ScoringSettings,
    /// Clicker input handling.
    pub input: InputSettings,
    /// Speech parameters for announcements.
    pub narration: NarrationSettings,
    /// Match video capture.
    pub recording: RecordingSettings,
    /// Completed-set storage.
    pub history: HistorySettings,
}

#[derive(Debug, Clone, PartialEq)]
/// Timings and defaults of the match flow.
pub struct ScoringSettings {
    /// Pause between the end of a set and the start of the next one.
    pub set_transition_delay: Duration,
    /// Time the final point stays on screen before the summary is shown.
    pub match_end_display_delay: Duration,
    /// Restore the opening serve state at the start of every set.
    pub reset_serve_each_set: bool,
    /// Points needed to win a set when the start request omits it.
    pub default_win_score: u32,
    /// Best-of count used when the start request omits it. Always odd.
    pub default_total_sets: u32,
}

#[derive(Debug, Clone, PartialEq)]
/// Clicker input handling.
pub struct InputSettings {
    /// Window in which a second tap for the same side undoes the first one.
    pub double_tap_delay: Duration,
}

#[derive(Debug, Clone, PartialEq)]
/// Speech parameters forwarded to the display.
pub struct NarrationSettings {
    /// Language announcements are rendered in.
    pub locale: Locale,
    /// Speech rate, 1.0 being the engine's normal speed.
    pub rate: f32,
    /// Voice pitch, 1.0 being the engine default.
    pub pitch: f32,
}

#[derive(Debug, Clone, PartialEq)]
/// Match video capture.
pub struct RecordingSettings {
    /// When false, matches are never recorded.
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
/// Where completed sets are stored.
pub struct HistorySettings {
    /// JSON file holding the match history.
    pub path: PathBuf,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document. Missing sections and keys keep their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(rename = "match")]
    scoring: RawScoring,
    input: RawInput,
    narration: RawNarration,
    recording: RawRecording,
    history: RawHistory,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawScoring {
    set_transition_delay_ms: u64,
    match_end_display_delay_ms: u64,
    reset_serve_each_set: bool,
    default_win_score: u32,
    default_total_sets: u32,
}

impl Default for RawScoring {
    fn default() -> Self {
        Self {
            set_transition_delay_ms: 2000,
            match_end_display_delay_ms: 3000,
            reset_serve_each_set: false,
            default_win_score: 11,
            default_total_sets: 3,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawInput {
    double_tap_delay_ms: u64,
}

impl Default for RawInput {
    fn default() -> Self {
        Self {
            double_tap_delay_ms: 300,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawNarration {
    locale: Locale,
    rate: f32,
    pitch: f32,
}

impl Default for RawNarration {
    fn default() -> Self {
        Self {
            locale: Locale::Korean,
            rate: 0.8,
            pitch: 1.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawRecording {
    enabled: bool,
}

impl Default for RawRecording {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawHistory {
    path: PathBuf,
}

impl Default for RawHistory {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/history.json"),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let RawConfig {
            scoring,
            input,
            narration,
            recording,
            history,
        } = value;

        Self {
            scoring: ScoringSettings {
                set_transition_delay: Duration::from_millis(scoring.set_transition_delay_ms),
                match_end_display_delay: Duration::from_millis(scoring.match_end_display_delay_ms),
                reset_serve_each_set: scoring.reset_serve_each_set,
                default_win_score: checked_win_score(scoring.default_win_score),
                default_total_sets: checked_total_sets(scoring.default_total_sets),
            },
            input: InputSettings {
                double_tap_delay: Duration::from_millis(input.double_tap_delay_ms),
            },
            narration: NarrationSettings {
                locale: narration.locale,
                rate: narration.rate,
                pitch: narration.pitch,
            },
            recording: RecordingSettings {
                enabled: recording.enabled,
            },
            history: HistorySettings { path: history.path },
        }
    }
}

/// A zero win score would end every set before the first point.
fn checked_win_score(value: u32) -> u32 {
    if value == 0 {
        let fallback = RawScoring::default().default_win_score;
        warn!(fallback, "match.default_win_score must be positive; using the default");
        return fallback;
    }
    value
}

/// Best-of series need an odd number of sets so a match always has a winner.
fn checked_total_sets(value: u32) -> u32 {
    if value == 0 || value % 2 == 0 {
        let fallback = RawScoring::default().default_total_sets;
        warn!(
            value,
            fallback, "match.default_total_sets must be odd; using the default"
        );
        return fallback;
    }
    value
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_scoreboard_timings() {
        let config = AppConfig::default();
        assert_eq!(config.scoring.set_transition_delay, Duration::from_millis(2000));
        assert_eq!(config.scoring.match_end_display_delay, Duration::from_millis(3000));
        assert!(!config.scoring.reset_serve_each_set);
        assert_eq!(config.input.double_tap_delay, Duration::from_millis(300));
        assert_eq!(config.narration.locale, Locale::Korean);
        assert!(config.recording.enabled);
        assert_eq!(config.history.path, PathBuf::from("data/history.json"));
    }

    #[test]
    fn partial_documents_keep_remaining_defaults() {
        let config = AppConfig::from_json(
            r#"{"match": {"reset_serve_each_set": true}, "narration": {"locale": "en"}}"#,
        )
        .unwrap();
        assert!(config.scoring.reset_serve_each_set);
        assert_eq!(config.scoring.default_win_score, 11);
        assert_eq!(config.narration.locale, Locale::English);
        assert_eq!(config.narration.rate, 0.8);
    }

    #[test]
    fn invalid_match_defaults_fall_back() {
        let config = AppConfig::from_json(
            r#"{"match": {"default_total_sets": 4, "default_win_score": 0}}"#,
        )
        .unwrap();
        assert_eq!(config.scoring.default_total_sets, 3);
        assert_eq!(config.scoring.default_win_score, 11);

        let config = AppConfig::from_json(r#"{"match": {"default_total_sets": 5}}"#).unwrap();
        assert_eq!(config.scoring.default_total_sets, 5);
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(AppConfig::from_json(r#"{"match": {"default_win_score": "eleven"}}"#).is_err());
    }
}

use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_INCLUDE_MANIFEST: &str = "https://lygia.xyz/glsl.json";
pub const DEFAULT_GIST_API: &str = "https://api.github.com/";
pub const DEFAULT_SHARE_BASE: &str = "https://shaderdeck.app/";

/// Longest accepted value for any configured delay, and for the total asset
/// wait.
pub const MAX_DURATION: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeckConfig {
    pub version: u32,
    #[serde(default)]
    pub editor: EditorSettings,
    #[serde(default)]
    pub gist: GistSettings,
    #[serde(default)]
    pub assets: AssetSettings,
    #[serde(default)]
    pub view: ViewSettings,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            version: 1,
            editor: EditorSettings::default(),
            gist: GistSettings::default(),
            assets: AssetSettings::default(),
            view: ViewSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EditorSettings {
    #[serde(
        default = "default_debounce",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub debounce: Duration,
    #[serde(default = "default_include_manifest")]
    pub include_manifest: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            debounce: default_debounce(),
            include_manifest: default_include_manifest(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GistSettings {
    #[serde(default = "default_gist_api")]
    pub api_base: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_share_base")]
    pub share_base: String,
}

impl Default for GistSettings {
    fn default() -> Self {
        Self {
            api_base: default_gist_api(),
            description: default_description(),
            share_base: default_share_base(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetSettings {
    #[serde(
        default = "default_poll_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub poll_interval: Duration,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewSettings {
    #[serde(
        default = "default_resync_delay",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub resync_delay: Duration,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            resync_delay: default_resync_delay(),
        }
    }
}

fn default_debounce() -> Duration {
    Duration::from_millis(300)
}

fn default_include_manifest() -> String {
    DEFAULT_INCLUDE_MANIFEST.to_string()
}

fn default_gist_api() -> String {
    DEFAULT_GIST_API.to_string()
}

fn default_description() -> String {
    "shaderdeck project".to_string()
}

fn default_share_base() -> String {
    DEFAULT_SHARE_BASE.to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_max_attempts() -> u32 {
    20
}

fn default_resync_delay() -> Duration {
    Duration::from_millis(100)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl DeckConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: DeckConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Upper bound on how long an asset write waits for the execution module.
    pub fn asset_wait_ceiling(&self) -> Duration {
        self.assets
            .poll_interval
            .saturating_mul(self.assets.max_attempts)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.editor.debounce.is_zero() {
            return Err(ConfigError::Invalid(
                "editor.debounce must be greater than zero".into(),
            ));
        }

        if self.assets.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "assets.poll_interval must be greater than zero".into(),
            ));
        }

        if self.assets.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "assets.max_attempts must be at least 1".into(),
            ));
        }

        for (field, value) in [
            ("editor.debounce", self.editor.debounce),
            ("assets.poll_interval", self.assets.poll_interval),
            ("view.resync_delay", self.view.resync_delay),
        ] {
            if value > MAX_DURATION {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be at most {}",
                    humantime::format_duration(MAX_DURATION)
                )));
            }
        }

        if self.asset_wait_ceiling() > MAX_DURATION {
            return Err(ConfigError::Invalid(format!(
                "assets.poll_interval * assets.max_attempts must be at most {}",
                humantime::format_duration(MAX_DURATION)
            )));
        }

        for (field, value) in [
            ("editor.include_manifest", &self.editor.include_manifest),
            ("gist.api_base", &self.gist.api_base),
            ("gist.share_base", &self.gist.share_base),
        ] {
            Url::parse(value).map_err(|err| {
                ConfigError::Invalid(format!("{field} '{value}' is not a valid url: {err}"))
            })?;
        }

        Ok(())
    }
}

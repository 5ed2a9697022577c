//! Runtime settings, loaded once at startup and handed to each component.
//!
//! Sources, later ones winning: built-in defaults, an optional `collector.toml`
//! (or the file given on the command line), `AQ_<SECTION>__<KEY>` environment
//! variables, and finally `OPENAQ_API_KEY` for the OpenAQ credential.

use crate::error::CollectorError;
use crate::types::parameter::Parameter;
use config::{Config, ConfigError, Environment, File};
use secrecy::Secret;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_KEY_VAR: &str = "OPENAQ_API_KEY";
const DEFAULT_CONFIG_FILE: &str = "collector";

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub openaq: OpenAqSettings,
    pub epa: EpaSettings,
    pub collection: CollectionSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct OpenAqSettings {
    pub base_url: String,
    pub api_key: Option<Secret<String>>,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct EpaSettings {
    pub base_url: String,
    pub email: String,
    pub key: Secret<String>,
    pub state_code: String,
    pub parameter_codes: Vec<String>,
    pub lookback_days: u32,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct CollectionSettings {
    pub output_dir: PathBuf,
    pub page_delay_ms: u64,
    pub max_pages: u32,
    pub lookback_days: u32,
    pub country: String,
    pub cities: Vec<String>,
    pub locations_per_city: u32,
    /// Pollutants requested per location, in column order.
    pub parameters: Vec<Parameter>,
}

impl OpenAqSettings {
    /// The OpenAQ key. Its absence is fatal for every OpenAQ command.
    pub fn require_api_key(&self) -> Result<&Secret<String>, CollectorError> {
        self.api_key
            .as_ref()
            .ok_or(CollectorError::MissingApiKey(API_KEY_VAR))
    }
}

impl CollectionSettings {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl Settings {
    /// Loads settings from the optional file, the environment and `OPENAQ_API_KEY`.
    pub fn load(config_file: Option<&Path>) -> Result<Settings, CollectorError> {
        let api_key = std::env::var(API_KEY_VAR).ok().filter(|k| !k.trim().is_empty());
        Self::build(config_file, api_key).map_err(CollectorError::from)
    }

    pub fn build(
        config_file: Option<&Path>,
        api_key: Option<String>,
    ) -> Result<Settings, ConfigError> {
        let file = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let builder = Config::builder()
            .set_default("openaq.base_url", "https://api.openaq.org/v3")?
            .set_default("epa.base_url", "https://aqs.epa.gov/data/api/dailyData/byState")?
            .set_default("epa.email", "test@example.com")?
            .set_default("epa.key", "test")?
            .set_default("epa.state_code", "36")?
            .set_default(
                "epa.parameter_codes",
                vec!["42101", "42401", "42602", "44201", "88101"],
            )?
            .set_default("epa.lookback_days", 30)?
            .set_default("collection.output_dir", "data/raw")?
            .set_default("collection.page_delay_ms", 200)?
            .set_default("collection.max_pages", 10)?
            .set_default("collection.lookback_days", 30)?
            .set_default("collection.country", "US")?
            .set_default(
                "collection.cities",
                vec!["Los Angeles", "New York", "Chicago"],
            )?
            .set_default("collection.locations_per_city", 3)?
            .set_default(
                "collection.parameters",
                Parameter::ALL.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
            )?
            .add_source(file)
            .add_source(
                Environment::with_prefix("AQ")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        let builder = match api_key {
            Some(key) => builder.set_override("openaq.api_key", key)?,
            None => builder,
        };

        builder.build()?.try_deserialize()
    }
}

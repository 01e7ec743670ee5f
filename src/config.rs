use std::{collections::HashMap, path::PathBuf};

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::appservices::RepositorySpec;

pub struct GeckoViewLocalConfig {
    pub properties_file: Option<PathBuf>,
    pub appservices: RepositorySpec,
}

impl GeckoViewLocalConfig {
    pub fn load() -> anyhow::Result<Self> {
        let raw_config = RawConfig::load(None)?;
        let defaults = RepositorySpec::default();

        Ok(Self {
            properties_file: raw_config.properties.file,
            appservices: RepositorySpec {
                name: raw_config.appservices.name.unwrap_or(defaults.name),
                url: raw_config.appservices.url.unwrap_or(defaults.url),
            },
        })
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    properties: PropertiesConfig,
    #[serde(default)]
    appservices: AppservicesConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct PropertiesConfig {
    file: Option<PathBuf>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct AppservicesConfig {
    name: Option<String>,
    url: Option<String>,
}

impl RawConfig {
    fn load(env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                Environment::with_prefix("GECKOVIEW_LOCAL")
                    .separator("_")
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}

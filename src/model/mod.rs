use thiserror::Error;

pub mod configuration;
pub mod coordinate;
pub mod project;
pub mod repository;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error reading project toml: {0}")]
    IO(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Missing TOML key `{0}` while parsing")]
    MissingKey(String),
    #[error("Invalid dependency notation `{0}`, expected `group:module[:version][@classifier]`")]
    InvalidCoordinate(String),
    #[error("Unknown repository `{0}`")]
    UnknownRepository(String),
    #[error("Configuration `{0}` extends from unknown configuration `{1}`")]
    UnknownConfiguration(String, String),
}

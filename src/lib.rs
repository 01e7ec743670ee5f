pub mod appservices;
pub mod cli;
pub mod config;
pub mod environment;
pub mod model;
pub mod properties;
pub mod substitution;

mod api;

pub use api::{Applied, GeckoViewLocal, GeckoViewLocalBuilder};

use std::{env, error::Error, path::PathBuf};

use crate::{
    appservices::RepositorySpec,
    environment::{EnvironmentProbe, MachProbe},
    properties, GeckoViewLocal,
};

#[derive(Default)]
pub struct GeckoViewLocalBuilder {
    // The properties file is relative to `root`
    root: Option<PathBuf>,
    properties_file_name: Option<PathBuf>,
    appservices: Option<RepositorySpec>,
    probe: Option<Box<dyn EnvironmentProbe>>,
}

impl GeckoViewLocalBuilder {
    /// Project root directory.
    ///
    /// Defaults to the current directory.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Name of the local properties file.
    ///
    /// Defaults to `local.properties`.
    pub fn properties_file_name(mut self, path: impl Into<PathBuf>) -> Self {
        self.properties_file_name = Some(path.into());
        self
    }

    /// Repository injected at the head of the project's repositories.
    ///
    /// Defaults to the `appservices` bintray repository.
    pub fn appservices(mut self, spec: RepositorySpec) -> Self {
        self.appservices = Some(spec);
        self
    }

    /// How the local build environment is queried.
    ///
    /// Defaults to running `mach environment`.
    pub fn probe(mut self, probe: impl EnvironmentProbe + 'static) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    pub fn try_build(self) -> Result<GeckoViewLocal, Box<dyn Error>> {
        let Self {
            root,
            properties_file_name,
            appservices,
            probe,
        } = self;
        let root = match root {
            Some(root) => root,
            None => env::current_dir()?,
        };

        let properties_file_name =
            properties_file_name.unwrap_or_else(|| PathBuf::from(properties::DEFAULT_FILE_NAME));

        Ok(GeckoViewLocal {
            root,
            properties_file_name,
            appservices: appservices.unwrap_or_default(),
            probe: probe.unwrap_or_else(|| Box::new(MachProbe)),
        })
    }
}

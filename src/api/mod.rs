use std::{error::Error, path::PathBuf};

use log::info;

use crate::{
    appservices::{inject_appservices, RepositorySpec},
    environment::{
        probe_environment, EnvironmentProbe, LocalGeckoViewSettings, ResolvedEnvironment,
    },
    model::project::Project,
    properties::LocalProperties,
    substitution::{
        local_repository, normalize_classifiers, register_local_substitution, NormalizationReport,
    },
};

mod builder;

pub use builder::GeckoViewLocalBuilder;

pub struct GeckoViewLocal {
    root: PathBuf,
    properties_file_name: PathBuf,
    appservices: RepositorySpec,
    probe: Box<dyn EnvironmentProbe>,
}

/// State left by [`GeckoViewLocal::apply`] until the project is fully configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub properties: LocalProperties,
    pub appservices_injected: bool,
    pub environment: Option<ResolvedEnvironment>,
}

impl Applied {
    /// Runs the deferred phase, once every configuration has its final
    /// dependencies. Does nothing when no local GeckoView is configured.
    pub fn after_evaluate(
        &self,
        project: &mut Project,
    ) -> Result<Option<NormalizationReport>, Box<dyn Error>> {
        if self.environment.is_none() {
            return Ok(None);
        }
        let report = normalize_classifiers(&mut project.configurations)?;
        info!(
            "Forced {} of {} GeckoView dependencies to the @aar classifier",
            report.rewritten, report.matched
        );
        Ok(Some(report))
    }
}

impl GeckoViewLocal {
    pub fn builder() -> GeckoViewLocalBuilder {
        GeckoViewLocalBuilder::default()
    }

    pub fn properties_path(&self) -> PathBuf {
        self.root.join(&self.properties_file_name)
    }

    pub fn load_properties(&self) -> LocalProperties {
        LocalProperties::load(&self.properties_path())
    }

    /// Loads the local settings and, when a local GeckoView is configured,
    /// probes and validates its build environment.
    pub fn environment(
        &self,
        properties: &LocalProperties,
    ) -> Result<Option<ResolvedEnvironment>, Box<dyn Error>> {
        let Some(settings) = LocalGeckoViewSettings::from_properties(properties)? else {
            return Ok(None);
        };
        let environment = probe_environment(&settings, self.probe.as_ref())?;
        info!("To update the local GeckoView, run `{}`", environment.update_hint());
        Ok(Some(environment))
    }

    /// Eager part of the extension: injects the application-services
    /// repository, and when a local GeckoView is configured adds its
    /// repository and registers the substitution rules.
    ///
    /// [`Applied::after_evaluate`] must run once the project is configured.
    pub fn apply(&self, project: &mut Project) -> Result<Applied, Box<dyn Error>> {
        let properties = self.load_properties();
        let appservices_injected = inject_appservices(project, &self.appservices);

        let environment = self.environment(&properties)?;
        if let Some(environment) = &environment {
            project.repositories.push_or_keep(local_repository(environment));
            register_local_substitution(&mut project.configurations, &environment.cpu_arch);
        }

        Ok(Applied {
            properties,
            appservices_injected,
            environment,
        })
    }
}

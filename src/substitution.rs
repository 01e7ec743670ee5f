//! Redirects GeckoView nightly dependencies to a locally built GeckoView.
//!
//! Two phases with different timing:
//!
//! * [`register_local_substitution`] only registers rules, which the host
//!   evaluates lazily when a configuration is resolved. It can run as soon as
//!   the configurations exist.
//! * [`normalize_classifiers`] rewrites declared dependencies and therefore has
//!   to run once every configuration has its final dependency list.

use std::{collections::HashSet, time::Duration};

use log::{debug, info};
use thiserror::Error;

use crate::{
    environment::ResolvedEnvironment,
    model::{
        configuration::{ConfigurationContainer, DependencySubstitution, ModuleMatcher},
        coordinate::Coordinate,
        repository::{IvyPatternLayout, Repository},
    },
};

pub const GECKOVIEW_GROUP: &str = "org.mozilla.geckoview";
pub const NIGHTLY_MODULE_PREFIX: &str = "geckoview-nightly";
pub const AAR_CLASSIFIER: &str = "aar";
pub const LOCAL_REPOSITORY_NAME: &str = "localGeckoView";
const DYNAMIC_VERSION: &str = "+";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubstitutionError {
    #[error(
        "Local GeckoView substitution requested but no GeckoView dependencies detected. \
         Something has gone wrong, or you need to remove local-geckoview.* from local.properties."
    )]
    NothingToSubstitute,
}

/// Outcome of [`normalize_classifiers`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Nightly dependencies found, counted once per declaring configuration.
    pub matched: usize,
    /// Dependencies that were replaced by their `@aar` form.
    pub rewritten: usize,
}

pub fn nightly_matcher() -> ModuleMatcher {
    ModuleMatcher::new(GECKOVIEW_GROUP, NIGHTLY_MODULE_PREFIX)
}

pub fn local_module_name(arch: &str) -> String {
    format!("geckoview-default-{}", arch)
}

/// Substituting a dependency loses the default `@aar` classifier of Android
/// dependencies, so every nightly dependency declared by a resolvable
/// configuration, or by any configuration it extends from, is replaced by
/// the same dependency with an explicit `@aar`.
///
/// Fails when no nightly dependency is declared anywhere: a local GeckoView
/// was requested but there is nothing to substitute.
pub fn normalize_classifiers(
    configurations: &mut ConfigurationContainer,
) -> Result<NormalizationReport, SubstitutionError> {
    let matcher = nightly_matcher();
    let mut report = NormalizationReport::default();
    let mut normalized = HashSet::new();

    for root in configurations.resolvable_ids() {
        for id in configurations.hierarchy(root) {
            if !normalized.insert(id) {
                continue;
            }

            let matching = configurations
                .get(id)
                .dependencies
                .iter()
                .filter(|dependency| matcher.matches(dependency))
                .cloned()
                .collect::<Vec<_>>();
            report.matched += matching.len();

            for dependency in matching {
                if dependency.has_classifier(AAR_CLASSIFIER) {
                    continue;
                }
                let configuration = configurations.get_mut(id);
                let removed = configuration.dependencies.remove(&dependency);
                let added = configuration
                    .dependencies
                    .add(dependency.with_classifier(AAR_CLASSIFIER));
                if removed || added {
                    report.rewritten += 1;
                }
                debug!(
                    "Forced geckoview dependency to have @aar classifier in {} (inherited from {})",
                    configurations.get(id),
                    configurations.get(root)
                );
            }
        }
    }

    if report.matched == 0 {
        return Err(SubstitutionError::NothingToSubstitute);
    }
    Ok(report)
}

/// Registers, on every resolvable configuration, the rule replacing requested
/// nightly modules with `geckoview-default-<arch>` at a dynamic version.
/// Resolvable configurations added afterwards get the rule as well. Once the
/// rule fires, dynamic versions of that configuration are never cached so a
/// rebuilt local artifact is always picked up. Returns the number of
/// configurations the rule was registered on so far.
pub fn register_local_substitution(
    configurations: &mut ConfigurationContainer,
    arch: &str,
) -> usize {
    let substitution = DependencySubstitution {
        matcher: nightly_matcher(),
        target: Coordinate::new(GECKOVIEW_GROUP, local_module_name(arch), Some(DYNAMIC_VERSION)),
        label: "local GeckoView".to_string(),
        cache_dynamic_versions_for: Some(Duration::ZERO),
    };

    let registered = configurations.register_on_resolvable(substitution);
    for id in &registered {
        debug!(
            "Registered local GeckoView substitution {} in {}",
            local_module_name(arch),
            configurations.get(*id)
        );
    }
    registered.len()
}

/// The Ivy repository serving the GeckoView published into the local object directory.
pub fn local_repository(environment: &ResolvedEnvironment) -> Repository {
    let url = environment.local_maven_repository();
    info!(
        "Will substitute GeckoView with local GeckoView from {}",
        url.display()
    );
    Repository::Ivy {
        name: LOCAL_REPOSITORY_NAME.to_string(),
        url: format!("file://{}", url.display()),
        layout: IvyPatternLayout::geckoview(),
    }
}

/// One requested dependency and the module resolution selected for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub requested: Coordinate,
    pub selected: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfiguration {
    pub name: String,
    pub selections: Vec<Selection>,
}

/// Resolves every dependency a resolvable configuration sees, directly or
/// through extends-from, against its resolution strategy.
pub fn resolve_all(configurations: &mut ConfigurationContainer) -> Vec<ResolvedConfiguration> {
    let mut resolved = Vec::new();
    for root in configurations.resolvable_ids() {
        let mut requested = Vec::new();
        for id in configurations.hierarchy(root) {
            for dependency in configurations.get(id).dependencies.iter() {
                if !requested.contains(dependency) {
                    requested.push(dependency.clone());
                }
            }
        }

        let selections = requested
            .into_iter()
            .map(|requested| {
                let selected = configurations.resolve(root, &requested);
                Selection {
                    requested,
                    selected,
                }
            })
            .collect();
        resolved.push(ResolvedConfiguration {
            name: configurations.get(root).name.clone(),
            selections,
        });
    }
    resolved
}

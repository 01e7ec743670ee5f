use log::{debug, info};

use crate::model::{project::Project, repository::Repository};

pub const DEFAULT_NAME: &str = "appservices";
pub const DEFAULT_URL: &str = "https://dl.bintray.com/ncalexander/application-services";

/// The Maven repository serving application-services artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySpec {
    pub name: String,
    pub url: String,
}

impl Default for RepositorySpec {
    fn default() -> Self {
        RepositorySpec {
            name: DEFAULT_NAME.to_string(),
            url: DEFAULT_URL.to_string(),
        }
    }
}

/// Puts the application-services repository at the head of the project's
/// repositories. A Maven repository that already has the same url, or the
/// same name, is kept as is. Returns whether a repository was injected.
pub fn inject_appservices(project: &mut Project, spec: &RepositorySpec) -> bool {
    if let Some(existing) = project.repositories.find_maven(&spec.name, &spec.url) {
        debug!(
            "Not injecting '{}' into project '{}': found {}",
            spec.name, project.name, existing
        );
        return false;
    }

    info!(
        "Injecting repository for project '{}': '{}' Maven repository with url '{}'",
        project.name, spec.name, spec.url
    );
    project
        .repositories
        .insert_or_keep(0, Repository::maven(&spec.name, &spec.url));

    debug!("Repository list for project '{}' after injection:", project.name);
    for repository in project.repositories.iter() {
        debug!("- {}", repository.name());
    }
    true
}

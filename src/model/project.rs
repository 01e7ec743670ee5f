use std::path::{Path, PathBuf};

use log::{debug, error};
use serde::Deserialize;
use toml::{Table, Value};

use super::{
    configuration::ConfigurationContainer,
    coordinate::Coordinate,
    repository::{Repository, RepositoryList},
    ParseError,
};

/// In-process model of a build project: the part of the host's build graph the
/// extension reads and mutates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub root_dir: PathBuf,
    pub repositories: RepositoryList,
    pub configurations: ConfigurationContainer,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRepository {
    WellKnown(String),
    Maven { name: String, url: String },
}

#[derive(Deserialize)]
struct RawConfiguration {
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    extends_from: Vec<String>,
    #[serde(default = "default_resolvable")]
    resolvable: bool,
}

fn default_resolvable() -> bool {
    true
}

impl Project {
    pub fn new(name: impl Into<String>, root_dir: impl Into<PathBuf>) -> Self {
        Project {
            name: name.into(),
            root_dir: root_dir.into(),
            repositories: RepositoryList::default(),
            configurations: ConfigurationContainer::default(),
        }
    }

    /// Loads a project file; the project root is the directory containing it.
    pub fn from_file(path: &Path) -> Result<Project, ParseError> {
        debug!("Attempting to read project from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        let root_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let project = Project::from_toml_str(&contents, root_dir);
        if let Err(err) = &project {
            error!("Could not build a valid project from {} due to err {err}", path.display())
        }
        project
    }

    pub fn from_toml_str(data: &str, root_dir: impl Into<PathBuf>) -> Result<Project, ParseError> {
        let mut table = toml::from_str::<Table>(data)?;

        let name = table
            .remove("name")
            .ok_or_else(|| ParseError::MissingKey("name".to_string()))
            .and_then(|v| v.try_into::<String>().map_err(|e| e.into()))?;

        let mut project = Project::new(name, root_dir);

        let repositories = table
            .remove("repositories")
            .map(|v| v.try_into::<Vec<RawRepository>>())
            .map_or(Ok(None), |v| v.map(Some))?
            .unwrap_or_default();
        for repository in repositories {
            project.repositories.push(match repository {
                RawRepository::WellKnown(shorthand) => Repository::well_known(&shorthand)
                    .ok_or(ParseError::UnknownRepository(shorthand))?,
                RawRepository::Maven { name, url } => Repository::maven(name, url),
            });
        }

        let configurations = match table.remove("configurations") {
            Some(Value::Table(configurations)) => configurations,
            Some(other) => other.try_into::<Table>()?,
            None => Table::new(),
        };
        project.add_configurations(configurations)?;

        Ok(project)
    }

    fn add_configurations(&mut self, configurations: Table) -> Result<(), ParseError> {
        let parsed = configurations
            .into_iter()
            .map(|(name, value)| value.try_into::<RawConfiguration>().map(|raw| (name, raw)))
            .collect::<Result<Vec<_>, _>>()?;

        // Extends-from may point forward, so every configuration exists before wiring.
        let ids = parsed
            .iter()
            .map(|(name, raw)| self.configurations.add(name.clone(), raw.resolvable))
            .collect::<Vec<_>>();

        for (id, (name, raw)) in ids.into_iter().zip(parsed) {
            for parent in &raw.extends_from {
                let parent_id = self.configurations.find(parent).ok_or_else(|| {
                    ParseError::UnknownConfiguration(name.clone(), parent.clone())
                })?;
                self.configurations.extend(id, parent_id);
            }
            for notation in &raw.dependencies {
                let dependency = Coordinate::parse(notation)?;
                self.configurations.get_mut(id).dependencies.add(dependency);
            }
        }

        Ok(())
    }
}

use std::{error::Error, path::Path};

use log::{debug, info};
use serde::Serialize;

use crate::{
    model::project::Project,
    substitution::{resolve_all, ResolvedConfiguration},
    GeckoViewLocal,
};

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Report {
    project: String,
    repositories: Vec<RepositoryReport>,
    configurations: Vec<ConfigurationReport>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct RepositoryReport {
    name: String,
    url: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct ConfigurationReport {
    name: String,
    resolvable: bool,
    dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    resolved: Vec<String>,
}

/// Handler to apply command
/// 1 - Loads the project file
/// 2 - Applies the extension and runs the deferred phase
/// 3 - Resolves every resolvable configuration
/// 4 - Writes the report
pub fn do_apply(
    plugin: &GeckoViewLocal,
    project_path: &Path,
    output_path: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let mut project = Project::from_file(project_path)?;

    let applied = plugin.apply(&mut project)?;
    applied.after_evaluate(&mut project)?;

    let resolved = resolve_all(&mut project.configurations);
    debug!("Resolved configurations: {:?}", resolved);

    let report = toml::to_string_pretty(&build_report(&project, &resolved))?;
    match output_path {
        Some(output_path) => {
            std::fs::write(output_path, report)?;
            info!("Wrote report to {}", output_path.display());
        }
        None => print!("{}", report),
    }
    Ok(())
}

/// Handler to environment command
pub fn do_environment(plugin: &GeckoViewLocal) -> Result<(), Box<dyn Error>> {
    let properties = plugin.load_properties();
    match plugin.environment(&properties)? {
        Some(environment) => {
            println!("topsrcdir: {}", environment.topsrcdir.display());
            println!("topobjdir: {}", environment.topobjdir.display());
            println!("ANDROID_CPU_ARCH: {}", environment.cpu_arch);
            println!(
                "local repository: {}",
                environment.local_maven_repository().display()
            );
            println!("update with: {}", environment.update_hint());
        }
        None => info!(
            "No local GeckoView configured in {}",
            plugin.properties_path().display()
        ),
    }
    Ok(())
}

/// Handler to properties command
pub fn do_properties(plugin: &GeckoViewLocal) -> Result<(), Box<dyn Error>> {
    for (key, value) in plugin.load_properties().iter() {
        println!("{}={}", key, value);
    }
    Ok(())
}

fn build_report(project: &Project, resolved: &[ResolvedConfiguration]) -> Report {
    let repositories = project
        .repositories
        .iter()
        .map(|repository| RepositoryReport {
            name: repository.name().to_string(),
            url: repository.url().to_string(),
        })
        .collect();

    let configurations = project
        .configurations
        .ids()
        .map(|id| {
            let configuration = project.configurations.get(id);
            let resolved = resolved
                .iter()
                .find(|r| r.name == configuration.name)
                .map(|r| {
                    r.selections
                        .iter()
                        .map(|selection| {
                            if selection.requested == selection.selected {
                                selection.selected.to_string()
                            } else {
                                format!("{} -> {}", selection.requested, selection.selected)
                            }
                        })
                        .collect()
                })
                .unwrap_or_default();
            ConfigurationReport {
                name: configuration.name.clone(),
                resolvable: configuration.can_be_resolved,
                dependencies: configuration
                    .dependencies
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
                resolved,
            }
        })
        .collect();

    Report {
        project: project.name.clone(),
        repositories,
        configurations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::environment::{EnvironmentProbe, ProbeError};

    struct StaticProbe;

    impl EnvironmentProbe for StaticProbe {
        fn run(&self, topsrcdir: &Path, _working_directory: &Path) -> Result<String, ProbeError> {
            Ok(format!(
                r#"{{"topsrcdir": "{}", "topobjdir": "/obj", "substs": {{"MOZ_BUILD_APP": "mobile/android", "ANDROID_CPU_ARCH": "arm64-v8a"}}}}"#,
                topsrcdir.display()
            ))
        }
    }

    const PROJECT: &str = r#"
name = "app"
repositories = ["google", "jcenter"]

[configurations.implementation]
dependencies = [
    "org.mozilla.geckoview:geckoview-nightly-armeabi-v7a:+",
    "androidx.core:core:1.0.0",
]
resolvable = false

[configurations.debugRuntimeClasspath]
extends_from = ["implementation"]
"#;

    #[test]
    fn apply_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("project.toml"), PROJECT).unwrap();
        std::fs::write(
            dir.path().join("local.properties"),
            "local-geckoview.topsrcdir=/src\n",
        )
        .unwrap();
        let plugin = GeckoViewLocal::builder()
            .root(dir.path())
            .probe(StaticProbe)
            .try_build()
            .unwrap();

        let output = dir.path().join("report.toml");
        do_apply(&plugin, &dir.path().join("project.toml"), Some(&output)).unwrap();

        let report: toml::Table =
            toml::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        let repositories = report["repositories"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            repositories,
            vec!["appservices", "Google", "BintrayJCenter", "localGeckoView"]
        );

        let configurations = report["configurations"].as_array().unwrap();
        assert_eq!(configurations.len(), 2);
        assert_eq!(
            configurations[0]["dependencies"]
                .as_array()
                .unwrap()
                .iter()
                .map(|d| d.as_str().unwrap())
                .collect::<Vec<_>>(),
            vec![
                "androidx.core:core:1.0.0",
                "org.mozilla.geckoview:geckoview-nightly-armeabi-v7a:+@aar",
            ]
        );
        assert!(configurations[0].get("resolved").is_none());
        assert_eq!(
            configurations[1]["resolved"]
                .as_array()
                .unwrap()
                .iter()
                .map(|d| d.as_str().unwrap())
                .collect::<Vec<_>>(),
            vec![
                "androidx.core:core:1.0.0",
                "org.mozilla.geckoview:geckoview-nightly-armeabi-v7a:+@aar -> org.mozilla.geckoview:geckoview-default-arm64-v8a:+",
            ]
        );
    }

    #[test]
    fn apply_fails_when_nothing_to_substitute() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("project.toml"),
            "name = \"app\"\n[configurations.runtimeClasspath]\ndependencies = [\"androidx.core:core:1.0.0\"]\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("local.properties"),
            "local-geckoview.topsrcdir=/src\n",
        )
        .unwrap();
        let plugin = GeckoViewLocal::builder()
            .root(dir.path())
            .probe(StaticProbe)
            .try_build()
            .unwrap();

        let output = dir.path().join("report.toml");
        let error = do_apply(&plugin, &dir.path().join("project.toml"), Some(&output)).unwrap_err();
        assert!(error.to_string().starts_with("Local GeckoView substitution requested"));
        assert!(!output.exists());
    }

    #[test]
    fn report_without_local_geckoview() {
        let mut project = Project::from_toml_str(PROJECT, "/work/app").unwrap();
        let resolved = resolve_all(&mut project.configurations);
        let report = build_report(&project, &resolved);
        assert_eq!(report.project, "app");
        assert_eq!(
            report.configurations[1],
            ConfigurationReport {
                name: "debugRuntimeClasspath".to_string(),
                resolvable: true,
                dependencies: vec![],
                resolved: vec![
                    "org.mozilla.geckoview:geckoview-nightly-armeabi-v7a:+".to_string(),
                    "androidx.core:core:1.0.0".to_string(),
                ],
            }
        );
    }
}

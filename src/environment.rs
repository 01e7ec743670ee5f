//! Probing the local mozilla-central build environment with `mach environment`.

use std::{
    path::{Path, PathBuf},
    process::Command,
    string::FromUtf8Error,
};

use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use crate::properties::LocalProperties;

pub const TOPSRCDIR_KEY: &str = "local-geckoview.topsrcdir";
pub const TOPOBJDIR_KEY: &str = "local-geckoview.topobjdir";

const SUPPORTED_BUILD_APP: &str = "mobile/android";
const MACH_ARGS: [&str; 4] = ["environment", "--format", "json", "--verbose"];
const PUBLISH_TASK: &str = "geckoview:publishWithGeckoBinariesDebugPublicationToMavenRepository";

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Could not run {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("{command} exited with status {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },
    #[error("Output of {command} is not valid UTF-8: {source}")]
    Utf8 {
        command: String,
        source: FromUtf8Error,
    },
}

#[derive(Error, Debug)]
pub enum EnvironmentError {
    #[error("{0} must be absolute")]
    NotAbsolute(&'static str),
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error("Could not parse mach environment output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Specified topsrcdir ('{configured}') is not mozconfig topsrcdir ('{reported}')")]
    TopsrcdirMismatch { configured: String, reported: String },
    #[error("Building with Gradle is only supported for Fennec, i.e., MOZ_BUILD_APP == 'mobile/android' (found {0:?})")]
    UnsupportedBuildApp(Option<String>),
    #[error("mach environment did not report `{0}`")]
    MissingField(&'static str),
}

/// Runs the environment report of a source tree and returns its standard output.
pub trait EnvironmentProbe {
    fn run(&self, topsrcdir: &Path, working_directory: &Path) -> Result<String, ProbeError>;
}

/// Invokes `<topsrcdir>/mach environment --format json --verbose`.
///
/// Blocks until `mach` exits. Run in an object directory, `mach` picks the
/// mozconfig matching that directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct MachProbe;

impl EnvironmentProbe for MachProbe {
    fn run(&self, topsrcdir: &Path, working_directory: &Path) -> Result<String, ProbeError> {
        let mach = topsrcdir.join("mach");
        let command = format!("{} {}", mach.display(), MACH_ARGS.join(" "));
        debug!("Running {} in {}", command, working_directory.display());

        let output = Command::new(&mach)
            .args(MACH_ARGS)
            .current_dir(working_directory)
            .output()
            .map_err(|source| ProbeError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                command,
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|source| ProbeError::Utf8 { command, source })
    }
}

/// The subset of the `mach environment` report this tool relies on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MozconfigEnvironment {
    pub topsrcdir: String,
    #[serde(default)]
    pub topobjdir: Option<String>,
    pub substs: Substs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Substs {
    #[serde(rename = "MOZ_BUILD_APP", default)]
    pub moz_build_app: Option<String>,
    #[serde(rename = "ANDROID_CPU_ARCH", default)]
    pub android_cpu_arch: Option<String>,
    #[serde(rename = "COMPILE_ENVIRONMENT", default)]
    pub compile_environment: Option<serde_json::Value>,
}

impl MozconfigEnvironment {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// `local-geckoview.*` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalGeckoViewSettings {
    pub topsrcdir: PathBuf,
    pub topobjdir: Option<PathBuf>,
}

impl LocalGeckoViewSettings {
    /// `Ok(None)` when no local GeckoView is configured.
    pub fn from_properties(
        properties: &LocalProperties,
    ) -> Result<Option<LocalGeckoViewSettings>, EnvironmentError> {
        let Some(topsrcdir) = properties.get(TOPSRCDIR_KEY) else {
            info!(
                "Not substituting local GeckoView: set {} in local.properties to consume a local GeckoView.",
                TOPSRCDIR_KEY
            );
            return Ok(None);
        };

        let topsrcdir = PathBuf::from(topsrcdir);
        if !topsrcdir.is_absolute() {
            return Err(EnvironmentError::NotAbsolute(TOPSRCDIR_KEY));
        }

        let topobjdir = properties.get(TOPOBJDIR_KEY).map(PathBuf::from);
        if topobjdir.as_ref().is_some_and(|dir| !dir.is_absolute()) {
            return Err(EnvironmentError::NotAbsolute(TOPOBJDIR_KEY));
        }

        Ok(Some(LocalGeckoViewSettings {
            topsrcdir,
            topobjdir,
        }))
    }

    pub fn working_directory(&self) -> &Path {
        self.topobjdir.as_deref().unwrap_or(&self.topsrcdir)
    }
}

/// A validated local build environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEnvironment {
    pub topsrcdir: PathBuf,
    pub topobjdir: PathBuf,
    pub cpu_arch: String,
    pub compile_environment: bool,
}

impl ResolvedEnvironment {
    /// Where `mach gradle` publishes the local GeckoView.
    pub fn local_maven_repository(&self) -> PathBuf {
        self.topobjdir.join("gradle/build/mobile/android/geckoview/maven")
    }

    /// The command that refreshes the local GeckoView artifacts.
    pub fn update_hint(&self) -> String {
        if self.compile_environment {
            format!(
                "./mach build binaries && ./mach gradle {} in {}",
                PUBLISH_TASK,
                self.topsrcdir.display()
            )
        } else {
            format!("./mach gradle {} in {}", PUBLISH_TASK, self.topsrcdir.display())
        }
    }
}

/// Runs the probe for `settings` and validates what it reports.
pub fn probe_environment(
    settings: &LocalGeckoViewSettings,
    probe: &dyn EnvironmentProbe,
) -> Result<ResolvedEnvironment, EnvironmentError> {
    let output = probe.run(&settings.topsrcdir, settings.working_directory())?;
    let mozconfig = MozconfigEnvironment::from_json(&output)?;
    debug!("mach environment reported {:?}", mozconfig);

    if Path::new(&mozconfig.topsrcdir) != settings.topsrcdir {
        return Err(EnvironmentError::TopsrcdirMismatch {
            configured: settings.topsrcdir.display().to_string(),
            reported: mozconfig.topsrcdir,
        });
    }

    if mozconfig.substs.moz_build_app.as_deref() != Some(SUPPORTED_BUILD_APP) {
        return Err(EnvironmentError::UnsupportedBuildApp(
            mozconfig.substs.moz_build_app,
        ));
    }

    let topobjdir = match (&settings.topobjdir, &mozconfig.topobjdir) {
        (Some(topobjdir), _) => topobjdir.clone(),
        (None, Some(reported)) => {
            info!(
                "Found topobjdir {} from topsrcdir {}",
                reported,
                settings.topsrcdir.display()
            );
            PathBuf::from(reported)
        }
        (None, None) => return Err(EnvironmentError::MissingField("topobjdir")),
    };

    let cpu_arch = mozconfig
        .substs
        .android_cpu_arch
        .ok_or(EnvironmentError::MissingField("substs.ANDROID_CPU_ARCH"))?;

    let compile_environment = mozconfig
        .substs
        .compile_environment
        .as_ref()
        .is_some_and(serde_json::Value::is_string);

    Ok(ResolvedEnvironment {
        topsrcdir: settings.topsrcdir.clone(),
        topobjdir,
        cpu_arch,
        compile_environment,
    })
}

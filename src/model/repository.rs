use std::fmt::{Display, Formatter};

use super::coordinate::Coordinate;

const GOOGLE_URL: &str = "https://dl.google.com/dl/android/maven2/";
const JCENTER_URL: &str = "https://jcenter.bintray.com/";
const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repository {
    Maven {
        name: String,
        url: String,
    },
    Ivy {
        name: String,
        url: String,
        layout: IvyPatternLayout,
    },
}

impl Repository {
    pub fn maven(name: impl Into<String>, url: impl Into<String>) -> Self {
        Repository::Maven {
            name: name.into(),
            url: url.into(),
        }
    }

    pub fn google() -> Self {
        Self::maven("Google", GOOGLE_URL)
    }

    pub fn jcenter() -> Self {
        Self::maven("BintrayJCenter", JCENTER_URL)
    }

    pub fn maven_central() -> Self {
        Self::maven("MavenRepo", MAVEN_CENTRAL_URL)
    }

    /// Resolves the shorthand names accepted in project files.
    pub fn well_known(shorthand: &str) -> Option<Self> {
        match shorthand {
            "google" => Some(Self::google()),
            "jcenter" => Some(Self::jcenter()),
            "mavenCentral" => Some(Self::maven_central()),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Repository::Maven { name, .. } | Repository::Ivy { name, .. } => name,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Repository::Maven { url, .. } | Repository::Ivy { url, .. } => url,
        }
    }
}

impl Display for Repository {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Repository::Maven { name, url } => write!(f, "'{}' Maven repository ({})", name, url),
            Repository::Ivy { name, url, .. } => write!(f, "'{}' Ivy repository ({})", name, url),
        }
    }
}

/// Ordered repository list of a project; earlier repositories are consulted first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryList {
    repositories: Vec<Repository>,
}

impl RepositoryList {
    pub fn push(&mut self, repository: Repository) {
        self.repositories.push(repository);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Repository> {
        self.repositories.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.repositories.iter().map(Repository::name).collect()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// First Maven repository with either the given name or the given url.
    pub fn find_maven(&self, name: &str, url: &str) -> Option<&Repository> {
        self.repositories.iter().find(|repository| {
            matches!(repository, Repository::Maven { .. })
                && (repository.url() == url || repository.name() == name)
        })
    }

    /// First repository of any kind with either the given name or the given url.
    pub fn find(&self, name: &str, url: &str) -> Option<&Repository> {
        self.repositories
            .iter()
            .find(|repository| repository.url() == url || repository.name() == name)
    }

    /// Appends `repository` unless a repository of any kind with the same name
    /// or url is already present. Returns whether it was appended.
    pub fn push_or_keep(&mut self, repository: Repository) -> bool {
        if self.find(repository.name(), repository.url()).is_some() {
            return false;
        }
        self.repositories.push(repository);
        true
    }

    /// Inserts `repository` at `position` unless a Maven repository with the
    /// same name or url is already present. Returns whether it was inserted.
    pub fn insert_or_keep(&mut self, position: usize, repository: Repository) -> bool {
        if self
            .find_maven(repository.name(), repository.url())
            .is_some()
        {
            return false;
        }
        let position = position.min(self.repositories.len());
        self.repositories.insert(position, repository);
        true
    }
}

impl FromIterator<Repository> for RepositoryList {
    fn from_iter<T: IntoIterator<Item = Repository>>(iter: T) -> Self {
        RepositoryList {
            repositories: iter.into_iter().collect(),
        }
    }
}

/// Ivy pattern layout. Tokens are `[organisation]`, `[module]`, `[revision]`,
/// `[classifier]` and `[ext]`; parenthesized groups are dropped when a token
/// inside them has no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IvyPatternLayout {
    pub artifact: String,
    pub ivy: String,
}

impl IvyPatternLayout {
    /// Layout of the GeckoView publication inside a local object directory.
    ///
    /// The group is hard-coded in the path: `[organisation]` would expand to
    /// `org.mozilla.geckoview` instead of `org/mozilla/geckoview`. The ivy pattern
    /// only has to point at a file that does not exist, otherwise the artifact is
    /// read as an ivy descriptor.
    pub fn geckoview() -> Self {
        IvyPatternLayout {
            artifact: "org/mozilla/geckoview/[module]/[revision]/[module]-[revision](-[classifier])(.[ext])"
                .to_string(),
            ivy: "ivy-files/[organisation]/[module]/[revision]/ivy.xml".to_string(),
        }
    }

    /// Relative path of the artifact for `coordinate`, with extension `ext`.
    pub fn artifact_path(&self, coordinate: &Coordinate, ext: Option<&str>) -> String {
        expand_pattern(&self.artifact, coordinate, ext)
    }

    pub fn ivy_path(&self, coordinate: &Coordinate) -> String {
        expand_pattern(&self.ivy, coordinate, None)
    }
}

fn token_value<'a>(
    token: &str,
    coordinate: &'a Coordinate,
    ext: Option<&'a str>,
) -> Option<&'a str> {
    match token {
        "organisation" | "organization" => Some(coordinate.group.as_str()),
        "module" | "artifact" => Some(coordinate.module.as_str()),
        "revision" => coordinate.version.as_deref(),
        "classifier" => coordinate.classifier.as_deref(),
        "ext" | "type" => ext,
        _ => None,
    }
}

/// Expands the tokens in `pattern`, returning `None` when a token has no value.
fn expand_tokens(pattern: &str, coordinate: &Coordinate, ext: Option<&str>) -> Option<String> {
    let mut out = String::new();
    let mut rest = pattern;
    while let Some(start) = rest.find('[') {
        out.push_str(&rest[..start]);
        let end = rest[start..].find(']').map(|end| start + end)?;
        out.push_str(token_value(&rest[start + 1..end], coordinate, ext)?);
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    Some(out)
}

fn expand_pattern(pattern: &str, coordinate: &Coordinate, ext: Option<&str>) -> String {
    let mut out = String::new();
    let mut rest = pattern;
    while let Some(start) = rest.find('(') {
        out.push_str(&expand_tokens(&rest[..start], coordinate, ext).unwrap_or_default());
        let Some(end) = rest[start..].find(')').map(|end| start + end) else {
            rest = &rest[start..];
            break;
        };
        if let Some(group) = expand_tokens(&rest[start + 1..end], coordinate, ext) {
            out.push_str(&group);
        }
        rest = &rest[end + 1..];
    }
    out.push_str(&expand_tokens(rest, coordinate, ext).unwrap_or_default());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn well_known_names() {
        let list: RepositoryList = ["google", "jcenter", "mavenCentral"]
            .into_iter()
            .filter_map(Repository::well_known)
            .collect();
        assert_eq!(list.names(), vec!["Google", "BintrayJCenter", "MavenRepo"]);
        assert_eq!(Repository::well_known("ivy"), None);
    }

    #[test]
    fn insert_or_keep_inserts_at_position() {
        let mut list: RepositoryList = [Repository::jcenter(), Repository::maven_central()]
            .into_iter()
            .collect();
        assert!(list.insert_or_keep(1, Repository::maven("custom", "https://example.com")));
        assert_eq!(list.names(), vec!["BintrayJCenter", "custom", "MavenRepo"]);
    }

    #[test]
    fn insert_or_keep_matches_by_name_or_url() {
        let mut list: RepositoryList = [Repository::maven("custom", "https://example.com")]
            .into_iter()
            .collect();
        assert!(!list.insert_or_keep(0, Repository::maven("custom", "https://other.com")));
        assert!(!list.insert_or_keep(0, Repository::maven("other", "https://example.com")));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn insert_or_keep_ignores_ivy_repositories() {
        let mut list: RepositoryList = [Repository::Ivy {
            name: "custom".to_string(),
            url: "https://example.com".to_string(),
            layout: IvyPatternLayout::geckoview(),
        }]
        .into_iter()
        .collect();
        assert!(list.insert_or_keep(0, Repository::maven("custom", "https://example.com")));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn push_or_keep_matches_any_repository_kind() {
        let ivy = Repository::Ivy {
            name: "local".to_string(),
            url: "file:///obj/maven".to_string(),
            layout: IvyPatternLayout::geckoview(),
        };
        let mut list: RepositoryList = [Repository::google()].into_iter().collect();
        assert!(list.push_or_keep(ivy.clone()));
        assert!(!list.push_or_keep(ivy));
        assert!(!list.push_or_keep(Repository::maven("other", "file:///obj/maven")));
        assert_eq!(list.names(), vec!["Google", "local"]);
    }

    #[test]
    fn geckoview_artifact_path() {
        let layout = IvyPatternLayout::geckoview();
        let coordinate =
            Coordinate::parse("org.mozilla.geckoview:geckoview-default-x86:68.0.20190601")
                .unwrap();
        assert_eq!(
            layout.artifact_path(&coordinate, Some("aar")),
            "org/mozilla/geckoview/geckoview-default-x86/68.0.20190601/geckoview-default-x86-68.0.20190601.aar"
        );
        assert_eq!(
            layout.artifact_path(&coordinate.with_classifier("sources"), Some("jar")),
            "org/mozilla/geckoview/geckoview-default-x86/68.0.20190601/geckoview-default-x86-68.0.20190601-sources.jar"
        );
        assert_eq!(
            layout.ivy_path(&coordinate),
            "ivy-files/org.mozilla.geckoview/geckoview-default-x86/68.0.20190601/ivy.xml"
        );
    }

    #[test]
    fn optional_groups_without_values_are_dropped() {
        let layout = IvyPatternLayout::geckoview();
        let coordinate =
            Coordinate::parse("org.mozilla.geckoview:geckoview-default-x86:1.0").unwrap();
        assert_eq!(
            layout.artifact_path(&coordinate, None),
            "org/mozilla/geckoview/geckoview-default-x86/1.0/geckoview-default-x86-1.0"
        );
    }
}

use std::{
    collections::{HashSet, VecDeque},
    fmt::{Display, Formatter},
    time::Duration,
};

use log::{info, trace};

use super::coordinate::Coordinate;

/// Identity of a configuration inside its [`ConfigurationContainer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct ConfigurationId(usize);

/// Dependencies directly declared on one configuration.
///
/// Behaves like a set: an equal coordinate is never stored twice, but the
/// declaration order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    dependencies: Vec<Coordinate>,
}

impl DependencySet {
    pub fn add(&mut self, dependency: Coordinate) -> bool {
        if self.dependencies.contains(&dependency) {
            false
        } else {
            self.dependencies.push(dependency);
            true
        }
    }

    pub fn remove(&mut self, dependency: &Coordinate) -> bool {
        let before = self.dependencies.len();
        self.dependencies.retain(|d| d != dependency);
        before != self.dependencies.len()
    }

    pub fn contains(&self, dependency: &Coordinate) -> bool {
        self.dependencies.contains(dependency)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coordinate> {
        self.dependencies.iter()
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

impl FromIterator<Coordinate> for DependencySet {
    fn from_iter<T: IntoIterator<Item = Coordinate>>(iter: T) -> Self {
        let mut set = DependencySet::default();
        for dependency in iter {
            set.add(dependency);
        }
        set
    }
}

/// Matches requested modules by exact group and module name prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMatcher {
    pub group: String,
    pub module_prefix: String,
}

impl ModuleMatcher {
    pub fn new(group: impl Into<String>, module_prefix: impl Into<String>) -> Self {
        ModuleMatcher {
            group: group.into(),
            module_prefix: module_prefix.into(),
        }
    }

    pub fn matches(&self, coordinate: &Coordinate) -> bool {
        coordinate.group == self.group && coordinate.module.starts_with(&self.module_prefix)
    }
}

/// A rule evaluated lazily, whenever a configuration resolves a requested module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySubstitution {
    pub matcher: ModuleMatcher,
    pub target: Coordinate,
    /// What the target is, for the resolution log line.
    pub label: String,
    /// Dynamic version cache duration to apply once the rule fires.
    pub cache_dynamic_versions_for: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionStrategy {
    substitutions: Vec<DependencySubstitution>,
    dynamic_version_cache: Option<Duration>,
}

impl ResolutionStrategy {
    pub fn register(&mut self, substitution: DependencySubstitution) {
        if !self.substitutions.contains(&substitution) {
            self.substitutions.push(substitution);
        }
    }

    pub fn substitutions(&self) -> &[DependencySubstitution] {
        &self.substitutions
    }

    pub fn cache_dynamic_versions_for(&mut self, duration: Duration) {
        self.dynamic_version_cache = Some(duration);
    }

    /// `None` means the host default applies.
    pub fn dynamic_version_cache(&self) -> Option<Duration> {
        self.dynamic_version_cache
    }

    /// Runs the registered rules against a requested module. The first matching rule wins.
    pub fn substitute(&mut self, requested: &Coordinate) -> Option<&DependencySubstitution> {
        let index = self
            .substitutions
            .iter()
            .position(|s| s.matcher.matches(requested))?;
        if let Some(duration) = self.substitutions[index].cache_dynamic_versions_for {
            self.cache_dynamic_versions_for(duration);
        }
        Some(&self.substitutions[index])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub name: String,
    pub can_be_resolved: bool,
    pub dependencies: DependencySet,
    pub resolution_strategy: ResolutionStrategy,
    extends_from: Vec<ConfigurationId>,
}

impl Configuration {
    pub fn extends_from(&self) -> &[ConfigurationId] {
        &self.extends_from
    }
}

impl Display for Configuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration '{}'", self.name)
    }
}

/// All configurations of a project. Configurations are addressed by identity,
/// and the extends-from relation may contain cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationContainer {
    configurations: Vec<Configuration>,
    /// Rules every resolvable configuration gets, including ones added later.
    resolvable_rules: Vec<DependencySubstitution>,
}

impl ConfigurationContainer {
    pub fn add(&mut self, name: impl Into<String>, can_be_resolved: bool) -> ConfigurationId {
        let id = ConfigurationId(self.configurations.len());
        let mut resolution_strategy = ResolutionStrategy::default();
        if can_be_resolved {
            for rule in &self.resolvable_rules {
                resolution_strategy.register(rule.clone());
            }
        }
        self.configurations.push(Configuration {
            name: name.into(),
            can_be_resolved,
            dependencies: DependencySet::default(),
            resolution_strategy,
            extends_from: Vec::new(),
        });
        id
    }

    /// Registers `substitution` on every resolvable configuration, present and
    /// future. Returns the configurations it was registered on now.
    pub fn register_on_resolvable(
        &mut self,
        substitution: DependencySubstitution,
    ) -> Vec<ConfigurationId> {
        let resolvable = self.resolvable_ids();
        for id in &resolvable {
            self.configurations[id.0]
                .resolution_strategy
                .register(substitution.clone());
        }
        if !self.resolvable_rules.contains(&substitution) {
            self.resolvable_rules.push(substitution);
        }
        resolvable
    }

    /// Records that `child` inherits the dependencies of `parent`.
    pub fn extend(&mut self, child: ConfigurationId, parent: ConfigurationId) {
        let extends_from = &mut self.configurations[child.0].extends_from;
        if !extends_from.contains(&parent) {
            extends_from.push(parent);
        }
    }

    pub fn get(&self, id: ConfigurationId) -> &Configuration {
        &self.configurations[id.0]
    }

    pub fn get_mut(&mut self, id: ConfigurationId) -> &mut Configuration {
        &mut self.configurations[id.0]
    }

    pub fn find(&self, name: &str) -> Option<ConfigurationId> {
        self.configurations
            .iter()
            .position(|c| c.name == name)
            .map(ConfigurationId)
    }

    pub fn ids(&self) -> impl Iterator<Item = ConfigurationId> {
        (0..self.configurations.len()).map(ConfigurationId)
    }

    pub fn resolvable_ids(&self) -> Vec<ConfigurationId> {
        self.ids()
            .filter(|id| self.get(*id).can_be_resolved)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    /// `root` followed by every configuration it transitively extends from,
    /// breadth first, each exactly once.
    pub fn hierarchy(&self, root: ConfigurationId) -> Vec<ConfigurationId> {
        let mut seen = HashSet::new();
        let mut next = VecDeque::from([root]);
        let mut ordered = Vec::new();

        while let Some(current) = next.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            trace!("Visiting {} from {}", self.get(current), self.get(root));
            next.extend(self.get(current).extends_from.iter().copied());
            ordered.push(current);
        }

        ordered
    }

    /// Resolves one requested module through the strategy of `id`, returning
    /// the selected module.
    pub fn resolve(&mut self, id: ConfigurationId, requested: &Coordinate) -> Coordinate {
        let configuration = &mut self.configurations[id.0];
        let name = &configuration.name;
        match configuration.resolution_strategy.substitute(requested) {
            Some(substitution) => {
                info!(
                    "Substituting {} with {} {} in configuration '{}'",
                    requested.module_id(),
                    substitution.label,
                    substitution.target.module_id(),
                    name
                );
                substitution.target.clone()
            }
            None => requested.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn coordinate(notation: &str) -> Coordinate {
        Coordinate::parse(notation).unwrap()
    }

    #[test]
    fn dependency_set_has_set_semantics() {
        let mut set = DependencySet::default();
        assert!(set.add(coordinate("g:a:1")));
        assert!(!set.add(coordinate("g:a:1")));
        assert!(set.add(coordinate("g:a:1@aar")));
        assert_eq!(set.len(), 2);
        assert!(set.remove(&coordinate("g:a:1")));
        assert!(!set.remove(&coordinate("g:a:1")));
        assert_eq!(
            set.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["g:a:1@aar"]
        );
    }

    #[test]
    fn hierarchy_of_linear_chain() {
        let mut container = ConfigurationContainer::default();
        let api = container.add("api", false);
        let implementation = container.add("implementation", false);
        let classpath = container.add("debugCompileClasspath", true);
        container.extend(implementation, api);
        container.extend(classpath, implementation);

        assert_eq!(
            container.hierarchy(classpath),
            vec![classpath, implementation, api]
        );
        assert_eq!(container.hierarchy(api), vec![api]);
    }

    #[test]
    fn hierarchy_terminates_on_cycles() {
        let mut container = ConfigurationContainer::default();
        let a = container.add("a", true);
        let b = container.add("b", false);
        let c = container.add("c", false);
        container.extend(a, b);
        container.extend(b, c);
        container.extend(c, a);
        container.extend(c, b);

        let hierarchy = container.hierarchy(a);
        assert_eq!(hierarchy, vec![a, b, c]);
    }

    #[test]
    fn hierarchy_visits_diamond_once() {
        let mut container = ConfigurationContainer::default();
        let root = container.add("root", true);
        let left = container.add("left", false);
        let right = container.add("right", false);
        let base = container.add("base", false);
        container.extend(root, left);
        container.extend(root, right);
        container.extend(left, base);
        container.extend(right, base);

        assert_eq!(container.hierarchy(root), vec![root, left, right, base]);
    }

    #[test]
    fn self_extension_is_visited_once() {
        let mut container = ConfigurationContainer::default();
        let a = container.add("a", true);
        container.extend(a, a);
        assert_eq!(container.hierarchy(a), vec![a]);
    }

    #[test]
    fn resolution_strategy_applies_first_matching_rule() {
        let mut strategy = ResolutionStrategy::default();
        strategy.register(DependencySubstitution {
            matcher: ModuleMatcher::new("g", "lib-"),
            target: coordinate("g:replacement:+"),
            label: "replacement".to_string(),
            cache_dynamic_versions_for: Some(Duration::ZERO),
        });

        assert_eq!(strategy.dynamic_version_cache(), None);
        assert_eq!(strategy.substitute(&coordinate("g:other:1")), None);
        assert_eq!(strategy.dynamic_version_cache(), None);
        assert_eq!(
            strategy
                .substitute(&coordinate("g:lib-x:1"))
                .map(|s| s.target.clone()),
            Some(coordinate("g:replacement:+"))
        );
        assert_eq!(strategy.dynamic_version_cache(), Some(Duration::ZERO));
    }

    #[test]
    fn registering_same_rule_twice_keeps_one() {
        let mut strategy = ResolutionStrategy::default();
        let rule = DependencySubstitution {
            matcher: ModuleMatcher::new("g", "m"),
            target: coordinate("g:t:+"),
            label: "t".to_string(),
            cache_dynamic_versions_for: None,
        };
        strategy.register(rule.clone());
        strategy.register(rule);
        assert_eq!(strategy.substitutions().len(), 1);
    }

    #[test]
    fn resolvable_rules_reach_later_configurations() {
        let mut container = ConfigurationContainer::default();
        let implementation = container.add("implementation", false);
        let early = container.add("debugRuntimeClasspath", true);
        let rule = DependencySubstitution {
            matcher: ModuleMatcher::new("g", "lib-"),
            target: coordinate("g:replacement:+"),
            label: "replacement".to_string(),
            cache_dynamic_versions_for: None,
        };
        assert_eq!(container.register_on_resolvable(rule.clone()), vec![early]);
        assert_eq!(container.register_on_resolvable(rule), vec![early]);

        let late = container.add("releaseRuntimeClasspath", true);
        let declaring = container.add("releaseImplementation", false);
        container.extend(late, implementation);

        assert_eq!(container.get(early).resolution_strategy.substitutions().len(), 1);
        assert_eq!(container.get(late).resolution_strategy.substitutions().len(), 1);
        assert!(container
            .get(declaring)
            .resolution_strategy
            .substitutions()
            .is_empty());
        assert_eq!(
            container.resolve(late, &coordinate("g:lib-x:1@aar")),
            coordinate("g:replacement:+")
        );
    }

    #[test]
    fn find_configuration_by_name() {
        let mut container = ConfigurationContainer::default();
        let id = container.add("implementation", false);
        assert_eq!(container.find("implementation"), Some(id));
        assert_eq!(container.find("api"), None);
        assert_eq!(container.get(id).to_string(), "configuration 'implementation'");
    }
}

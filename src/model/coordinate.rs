use std::{
    fmt::{Display, Formatter},
    str::FromStr,
    sync::OnceLock,
};

use regex_lite::Regex;

use crate::model::ParseError;

/// A requested package, in the host's `group:module:version@classifier` notation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Coordinate {
    pub group: String,
    pub module: String,
    pub version: Option<String>,
    pub classifier: Option<String>,
}

fn notation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<group>[^:@\s]+):(?P<module>[^:@\s]+)(?::(?P<version>[^:@\s]+))?(?:@(?P<classifier>[^:@\s]+))?$",
        )
        .expect("coordinate notation regex is valid")
    })
}

impl Coordinate {
    pub fn new(
        group: impl Into<String>,
        module: impl Into<String>,
        version: Option<&str>,
    ) -> Self {
        Coordinate {
            group: group.into(),
            module: module.into(),
            version: version.map(str::to_string),
            classifier: None,
        }
    }

    pub fn parse(notation: &str) -> Result<Coordinate, ParseError> {
        let captures = notation_regex()
            .captures(notation.trim())
            .ok_or_else(|| ParseError::InvalidCoordinate(notation.to_string()))?;
        let text = |name: &str| captures.name(name).map(|m| m.as_str().to_string());

        Ok(Coordinate {
            group: text("group").unwrap_or_default(),
            module: text("module").unwrap_or_default(),
            version: text("version"),
            classifier: text("classifier"),
        })
    }

    /// The same coordinate with `classifier` forced.
    pub fn with_classifier(&self, classifier: impl Into<String>) -> Coordinate {
        Coordinate {
            classifier: Some(classifier.into()),
            ..self.clone()
        }
    }

    pub fn has_classifier(&self, classifier: &str) -> bool {
        self.classifier.as_deref() == Some(classifier)
    }

    /// `group:module`, without version or classifier.
    pub fn module_id(&self) -> String {
        format!("{}:{}", self.group, self.module)
    }
}

impl FromStr for Coordinate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Coordinate::parse(s)
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.group, self.module)?;
        if let Some(version) = &self.version {
            write!(f, ":{}", version)?;
        }
        if let Some(classifier) = &self.classifier {
            write!(f, "@{}", classifier)?;
        }
        Ok(())
    }
}

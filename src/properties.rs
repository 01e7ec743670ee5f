//! Loader for the optional `local.properties` file at the project root.

use std::{collections::BTreeMap, path::Path};

use log::{info, warn};

pub const DEFAULT_FILE_NAME: &str = "local.properties";

/// Key/value settings read from a Java-style properties file.
///
/// An absent or unreadable file yields an empty mapping; values are not
/// validated here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalProperties {
    entries: BTreeMap<String, String>,
}

impl LocalProperties {
    pub fn load(path: &Path) -> LocalProperties {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                info!("Loaded local properties: {}", path.display());
                Self::parse(&contents)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("No local properties loaded; did not find: {}", path.display());
                Self::default()
            }
            Err(err) => {
                warn!("No local properties loaded; could not read {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> LocalProperties {
        let mut entries = BTreeMap::new();
        for line in logical_lines(contents) {
            let (key, value) = split_entry(&line);
            entries.insert(unescape(key), unescape(value));
        }
        LocalProperties { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Natural lines joined over trailing-backslash continuations, with
/// comments and blank lines dropped.
fn logical_lines(contents: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<String> = None;

    for raw in contents.lines() {
        let trimmed = raw.trim_start();
        let line = match current.take() {
            Some(mut pending) => {
                pending.push_str(trimmed);
                pending
            }
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                trimmed.to_string()
            }
        };

        if ends_with_continuation(&line) {
            let mut line = line;
            line.pop();
            current = Some(line);
        } else {
            lines.push(line);
        }
    }
    if let Some(pending) = current {
        lines.push(pending);
    }
    lines
}

/// An odd number of trailing backslashes continues the line.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Splits at the first unescaped `=`, `:` or whitespace.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..index], line[index + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[index..].trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return (&line[..index], rest.trim_start());
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn absent_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let properties = LocalProperties::load(&dir.path().join(DEFAULT_FILE_NAME));
        assert!(properties.is_empty());
    }

    #[test]
    fn directory_instead_of_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let properties = LocalProperties::load(dir.path());
        assert!(properties.is_empty());
    }

    #[test]
    fn present_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_FILE_NAME), "foo=bar").unwrap();
        let properties = LocalProperties::load(&dir.path().join(DEFAULT_FILE_NAME));
        assert_eq!(properties.len(), 1);
        assert_eq!(properties.get("foo"), Some("bar"));
    }

    #[test]
    fn separators_and_comments() {
        let properties = LocalProperties::parse(
            "# comment\n\
             ! another comment\n\
             \n\
             a=1\n\
             b : 2\n\
             c 3\n\
             \x20\x20d = spaced value \n\
             empty=\n\
             bare\n",
        );
        assert_eq!(
            properties.iter().collect::<Vec<_>>(),
            vec![
                ("a", "1"),
                ("b", "2"),
                ("bare", ""),
                ("c", "3"),
                ("d", "spaced value "),
                ("empty", ""),
            ]
        );
    }

    #[test]
    fn local_geckoview_keys() {
        let properties = LocalProperties::parse(
            "sdk.dir=/opt/android-sdk\n\
             local-geckoview.topsrcdir=/home/user/mozilla-central\n\
             local-geckoview.topobjdir=/home/user/mozilla-central/objdir-android\n",
        );
        assert_eq!(
            properties.get("local-geckoview.topsrcdir"),
            Some("/home/user/mozilla-central")
        );
        assert_eq!(
            properties.get("local-geckoview.topobjdir"),
            Some("/home/user/mozilla-central/objdir-android")
        );
        assert_eq!(properties.get("missing"), None);
    }

    #[test]
    fn line_continuation() {
        let properties = LocalProperties::parse("fruits=apple, \\\n    banana, \\\n    pear\n");
        assert_eq!(properties.get("fruits"), Some("apple, banana, pear"));
    }

    #[test]
    fn escaped_backslash_does_not_continue() {
        let properties = LocalProperties::parse("path=C:\\\\\nnext=1\n");
        assert_eq!(properties.get("path"), Some("C:\\"));
        assert_eq!(properties.get("next"), Some("1"));
    }

    #[test]
    fn escapes() {
        let properties =
            LocalProperties::parse("key\\=with\\:separators=tab\\there\nunicode=\\u00e9t\\u00e9\n");
        assert_eq!(properties.get("key=with:separators"), Some("tab\there"));
        assert_eq!(properties.get("unicode"), Some("été"));
    }

    #[test]
    fn later_duplicates_win() {
        let properties = LocalProperties::parse("a=1\na=2\n");
        assert_eq!(properties.get("a"), Some("2"));
    }
}

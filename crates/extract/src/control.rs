//! Debian control stanzas (deb822).

use crate::error::{ErrorKind, Result};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// One control stanza: ordered, case-sensitive, duplicate-free fields.
///
/// Multi-line values keep their continuation lines verbatim (including the
/// leading space), separated by `\n`, so that rendering the stanza gives back
/// the text it was parsed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Control {
    fields: Vec<(String, String)>,
}

impl Control {
    pub fn parse(text: &str) -> Result<Self> {
        let mut fields: Vec<(String, String)> = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                // Only the first stanza of a control file is meaningful.
                if fields.is_empty() {
                    continue;
                }
                break;
            }
            if line.starts_with('#') {
                continue;
            }
            if line.starts_with([' ', '\t']) {
                let Some((_, value)) = fields.last_mut() else {
                    exn::bail!(ErrorKind::Malformed(format!("continuation line before any field: {line:?}")));
                };
                value.push('\n');
                value.push_str(line);
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                exn::bail!(ErrorKind::Malformed(format!("expected 'Key: value', found {line:?}")));
            };
            let key = key.trim_end();
            if key.is_empty() || key.contains(char::is_whitespace) {
                exn::bail!(ErrorKind::Malformed(format!("invalid field name {key:?}")));
            }
            if fields.iter().any(|(k, _)| k == key) {
                exn::bail!(ErrorKind::Malformed(format!("duplicate field {key:?}")));
            }
            fields.push((key.to_string(), value.trim().to_string()));
        }
        Ok(Self { fields })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn require(&self, key: &'static str) -> Result<&str> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => exn::bail!(ErrorKind::MissingField(key)),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The source package name, without any `(version)` suffix; falls back
    /// to the binary package name.
    pub fn source_name(&self) -> Option<&str> {
        match self.get("Source") {
            Some(source) => source.split('(').next().map(str::trim_end),
            None => self.get("Package"),
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.get("Description")
    }
}

impl Display for Control {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (key, value) in &self.fields {
            if value.is_empty() || value.starts_with('\n') {
                writeln!(f, "{key}:{value}")?;
            } else {
                writeln!(f, "{key}: {value}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const HELLO: &str = "Package: hello\n\
        Source: hello-src (2.10-1)\n\
        Version: 2.10-2\n\
        Architecture: amd64\n\
        Description: example package\n \
        with a long description\n \
        .\n \
        over several lines\n";

    #[test]
    fn parse_keeps_order_and_continuations() {
        let control = Control::parse(HELLO).unwrap();
        let keys: Vec<_> = control.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, ["Package", "Source", "Version", "Architecture", "Description"]);
        assert_eq!(
            control.description(),
            Some("example package\n with a long description\n .\n over several lines")
        );
    }

    #[test]
    fn render_reproduces_input() {
        let control = Control::parse(HELLO).unwrap();
        assert_eq!(control.to_string(), HELLO);
    }

    #[rstest]
    #[case("Package: hello\nSource: hello-src (2.10-1)\n", "hello-src")]
    #[case("Package: hello\nSource: hello-src\n", "hello-src")]
    #[case("Package: hello\n", "hello")]
    fn source_name(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(Control::parse(text).unwrap().source_name(), Some(expected));
    }

    #[test]
    fn keys_are_case_sensitive() {
        let control = Control::parse("Package: a\npackage: b\n").unwrap();
        assert_eq!(control.get("Package"), Some("a"));
        assert_eq!(control.get("package"), Some("b"));
    }

    #[rstest]
    #[case("Package: a\nPackage: b\n")]
    #[case(" leading continuation\n")]
    #[case("no colon here\n")]
    fn parse_rejects_malformed(#[case] text: &str) {
        let err = Control::parse(text).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Malformed(_)));
    }

    #[test]
    fn require_reports_missing_field() {
        let control = Control::parse("Package: hello\n").unwrap();
        let err = control.require("Version").unwrap_err();
        assert_eq!(*err, ErrorKind::MissingField("Version"));
    }

    #[test]
    fn stops_at_first_blank_line() {
        let control = Control::parse("\nPackage: a\n\nPackage: b\n").unwrap();
        assert_eq!(control.get("Package"), Some("a"));
    }
}

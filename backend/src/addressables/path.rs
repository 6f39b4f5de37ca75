//! Addressable label paths
//!
//! Every addressable is named by a dotted path of the form
//! `type[label].parameter`, optionally followed by an index in braces:
//!
//! ```text
//! process[recruitment].r0
//! selectivity[fishing_sel].v{12}
//! ```

use crate::addressables::AddressableError;
use std::fmt;

/// Parsed addressable label
///
/// # Example
/// ```
/// use stock_model_core_rs::AddressablePath;
///
/// let path = AddressablePath::parse("selectivity[fishing].v{12}").unwrap();
/// assert_eq!(path.object_type(), "selectivity");
/// assert_eq!(path.label(), "fishing");
/// assert_eq!(path.parameter(), "v");
/// assert_eq!(path.index(), Some("12"));
/// assert_eq!(path.to_string(), "selectivity[fishing].v{12}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressablePath {
    object_type: String,
    label: String,
    parameter: String,
    index: Option<String>,
}

impl AddressablePath {
    pub fn new(object_type: &str, label: &str, parameter: &str) -> Self {
        Self {
            object_type: object_type.to_string(),
            label: label.to_string(),
            parameter: parameter.to_string(),
            index: None,
        }
    }

    /// Same path with an element index attached
    pub fn indexed(mut self, index: impl ToString) -> Self {
        self.index = Some(index.to_string());
        self
    }

    /// Parse a textual label
    pub fn parse(text: &str) -> Result<Self, AddressableError> {
        let malformed = |reason: &str| AddressableError::MalformedLabel {
            label: text.to_string(),
            reason: reason.to_string(),
        };

        let open = text.find('[').ok_or_else(|| malformed("missing '['"))?;
        let close = text.find("].").ok_or_else(|| malformed("missing '].'"))?;
        if close < open {
            return Err(malformed("']' before '['"));
        }

        let object_type = &text[..open];
        let label = &text[open + 1..close];
        let mut parameter = &text[close + 2..];
        let mut index = None;

        if let Some(brace) = parameter.find('{') {
            let inner = parameter[brace + 1..]
                .strip_suffix('}')
                .ok_or_else(|| malformed("unterminated '{'"))?;
            if inner.is_empty() {
                return Err(malformed("empty index"));
            }
            index = Some(inner.to_string());
            parameter = &parameter[..brace];
        }

        for (part, name) in [(object_type, "type"), (label, "label"), (parameter, "parameter")] {
            if part.is_empty() {
                return Err(malformed(&format!("empty {}", name)));
            }
            if !part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            {
                return Err(malformed(&format!("invalid character in {}", name)));
            }
        }

        Ok(Self {
            object_type: object_type.to_string(),
            label: label.to_string(),
            parameter: parameter.to_string(),
            index,
        })
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }
}

impl fmt::Display for AddressablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}].{}", self.object_type, self.label, self.parameter)?;
        if let Some(index) = &self.index {
            write!(f, "{{{}}}", index)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_path() {
        let path = AddressablePath::parse("process[recruitment].r0").unwrap();
        assert_eq!(path, AddressablePath::new("process", "recruitment", "r0"));
        assert_eq!(path.index(), None);
    }

    #[test]
    fn test_builder_matches_parse() {
        let built = AddressablePath::new("selectivity", "fishing", "v").indexed(15);
        let parsed = AddressablePath::parse(&built.to_string()).unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn test_malformed_paths_rejected() {
        for text in [
            "r0",
            "process.r0",
            "[recruitment].r0",
            "process[].r0",
            "process[recruitment].",
            "process[recruitment].ycs{1990",
            "process[recruitment].ycs{}",
            "process[rec ruit].r0",
        ] {
            let err = AddressablePath::parse(text).unwrap_err();
            assert!(
                matches!(err, AddressableError::MalformedLabel { .. }),
                "{} should be malformed",
                text
            );
        }
    }
}

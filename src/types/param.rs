use std::fmt;

use regex::Regex;

/// A condition's stored parameter, exactly as persisted with the popup.
///
/// Only the handler that declares the condition knows how to read it; the
/// engine treats it as opaque until [`RuleHandler::prepare`](crate::RuleHandler::prepare)
/// turns it into a [`Prepared`] value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Param {
    /// No parameter was saved (flag-style conditions).
    #[default]
    None,
    /// A 64-bit signed integer.
    Int(i64),
    /// A UTF-8 string, e.g. a pattern or a newline separated list.
    Str(String),
    /// A list of strings.
    List(Vec<String>),
}

impl Param {
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Param::None)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Param::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Read the parameter as an integer. Numeric strings are accepted because
    /// form input is usually saved as text.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Param::Int(v) => Some(*v),
            Param::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Read the parameter as a list of trimmed, non-empty entries.
    ///
    /// A single string is split on line breaks, which is how list parameters
    /// entered in a textarea are stored.
    #[must_use]
    pub fn to_list(&self) -> Vec<String> {
        let items: Box<dyn Iterator<Item = &str>> = match self {
            Param::None | Param::Int(_) => return Vec::new(),
            Param::Str(s) => Box::new(s.lines()),
            Param::List(items) => Box::new(items.iter().map(String::as_str)),
        };
        items
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Str(v.to_owned())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Str(v)
    }
}

impl From<Vec<String>> for Param {
    fn from(v: Vec<String>) -> Self {
        Param::List(v)
    }
}

impl From<Vec<&str>> for Param {
    fn from(v: Vec<&str>) -> Self {
        Param::List(v.into_iter().map(str::to_owned).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Param {
    fn from(v: [&str; N]) -> Self {
        Param::List(v.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::None => write!(f, "none"),
            Param::Int(v) => write!(f, "{v}"),
            Param::Str(v) => write!(f, "\"{v}\""),
            Param::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "\"{item}\"")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A parameter validated and converted once, when a popup's rules are
/// compiled, into the form its handler evaluates against each request.
#[derive(Debug, Clone)]
pub enum Prepared {
    /// The condition takes no parameter.
    Flag,
    /// An upper bound, e.g. "shown less than N times".
    Threshold(u32),
    /// A single compiled pattern.
    Pattern(Regex),
    /// Any-of compiled patterns.
    Patterns(Vec<Regex>),
    /// Any-of plain substrings, already lower-cased.
    Needles(Vec<String>),
    /// Upper-cased ISO 3166 alpha-2 country codes.
    Countries(Vec<String>),
    /// The untouched parameter, for handlers that read it directly.
    Raw(Param),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_i64() {
        assert_eq!(Param::from(42_i64), Param::Int(42));
    }

    #[test]
    fn from_str() {
        assert_eq!(Param::from("hello"), Param::Str("hello".to_owned()));
    }

    #[test]
    fn from_array() {
        assert_eq!(
            Param::from(["a", "b"]),
            Param::List(vec!["a".to_owned(), "b".to_owned()])
        );
    }

    #[test]
    fn default_is_none() {
        assert!(Param::default().is_none());
        assert!(!Param::Int(0).is_none());
    }

    #[test]
    fn as_int_accepts_numeric_strings() {
        assert_eq!(Param::Int(7).as_int(), Some(7));
        assert_eq!(Param::from(" 12 ").as_int(), Some(12));
        assert_eq!(Param::from("twelve").as_int(), None);
        assert_eq!(Param::None.as_int(), None);
    }

    #[test]
    fn to_list_splits_lines_and_drops_blanks() {
        let p = Param::from("example.com\n\n  shop.example.com  \r\n");
        assert_eq!(p.to_list(), vec!["example.com", "shop.example.com"]);
    }

    #[test]
    fn to_list_trims_list_entries() {
        let p = Param::from(vec![" a ", "", "b"]);
        assert_eq!(p.to_list(), vec!["a", "b"]);
        assert!(Param::Int(3).to_list().is_empty());
    }

    #[test]
    fn display() {
        assert_eq!(Param::None.to_string(), "none");
        assert_eq!(Param::Int(3).to_string(), "3");
        assert_eq!(Param::from("x").to_string(), "\"x\"");
        assert_eq!(Param::from(["a", "b"]).to_string(), "[\"a\", \"b\"]");
    }
}

use std::fmt;

use super::param::Param;

/// Identifier of a popup entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopupId(pub u64);

impl From<u64> for PopupId {
    fn from(v: u64) -> Self {
        PopupId(v)
    }
}

impl fmt::Display for PopupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the outcomes of a popup's attached conditions are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MatchMode {
    /// Every resolvable condition must hold.
    #[default]
    All,
    /// At least one resolvable condition must hold.
    Any,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::All => write!(f, "all"),
            MatchMode::Any => write!(f, "any"),
        }
    }
}

/// The conditions an administrator attached to one popup, in saved order,
/// each with its opaque parameter.
///
/// Condition ids are unique within a config: attaching an id twice replaces
/// the earlier parameter in place.
///
/// # Example
///
/// ```
/// use popover::PopupRuleConfig;
///
/// let config = PopupRuleConfig::new()
///     .condition("login")
///     .with("count", 3_i64);
/// assert_eq!(config.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "StoredConfig")
)]
pub struct PopupRuleConfig {
    conditions: Vec<(String, Param)>,
    mode: MatchMode,
}

/// Wire shape of a stored config. Loading goes through
/// [`PopupRuleConfig::push`] so a repeated id keeps one slot.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct StoredConfig {
    conditions: Vec<(String, Param)>,
    #[serde(default)]
    mode: MatchMode,
}

#[cfg(feature = "serde")]
impl From<StoredConfig> for PopupRuleConfig {
    fn from(stored: StoredConfig) -> Self {
        let mut config = PopupRuleConfig::new().with_mode(stored.mode);
        for (id, param) in stored.conditions {
            config.push(&id, param);
        }
        config
    }
}

impl PopupRuleConfig {
    /// Create an empty config combining conditions with [`MatchMode::All`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty config combining conditions with [`MatchMode::Any`].
    #[must_use]
    pub fn any() -> Self {
        Self {
            conditions: Vec::new(),
            mode: MatchMode::Any,
        }
    }

    /// Attach a condition that takes no parameter.
    #[must_use]
    pub fn condition(self, id: &str) -> Self {
        self.with(id, Param::None)
    }

    /// Attach a condition with its parameter.
    #[must_use]
    pub fn with(mut self, id: &str, param: impl Into<Param>) -> Self {
        self.push(id, param.into());
        self
    }

    /// Attach a condition (mutable reference version).
    pub fn push(&mut self, id: &str, param: Param) {
        match self.conditions.iter_mut().find(|(existing, _)| existing == id) {
            Some(slot) => slot.1 = param,
            None => self.conditions.push((id.to_owned(), param)),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    #[must_use]
    pub fn conditions(&self) -> &[(String, Param)] {
        &self.conditions
    }

    /// The saved parameter of an attached condition.
    #[must_use]
    pub fn param(&self, id: &str) -> Option<&Param> {
        self.conditions
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, p)| p)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_saved_order() {
        let config = PopupRuleConfig::new()
            .condition("no_login")
            .with("referrer", ["google"])
            .with("count", 2_i64);
        let ids: Vec<&str> = config.conditions().iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["no_login", "referrer", "count"]);
        assert_eq!(config.mode(), MatchMode::All);
    }

    #[test]
    fn reattaching_replaces_in_place() {
        let config = PopupRuleConfig::new()
            .with("count", 2_i64)
            .condition("login")
            .with("count", 5_i64);
        assert_eq!(config.len(), 2);
        assert_eq!(config.conditions()[0].0, "count");
        assert_eq!(config.param("count"), Some(&Param::Int(5)));
    }

    #[test]
    fn any_mode() {
        let config = PopupRuleConfig::any().condition("login");
        assert_eq!(config.mode(), MatchMode::Any);
        assert_eq!(config.with_mode(MatchMode::All).mode(), MatchMode::All);
    }

    #[test]
    fn empty_config() {
        let config = PopupRuleConfig::new();
        assert!(config.is_empty());
        assert_eq!(config.param("login"), None);
    }

    #[cfg(feature = "binary-cache")]
    #[test]
    fn deserializing_collapses_repeated_ids() {
        #[derive(serde::Serialize)]
        struct Saved {
            conditions: Vec<(String, Param)>,
            mode: MatchMode,
        }

        let saved = Saved {
            conditions: vec![
                ("count".to_owned(), Param::Int(2)),
                ("login".to_owned(), Param::None),
                ("count".to_owned(), Param::Int(5)),
            ],
            mode: MatchMode::Any,
        };
        let bytes = bincode::serde::encode_to_vec(&saved, bincode::config::standard()).unwrap();
        let (config, _): (PopupRuleConfig, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard()).unwrap();

        assert_eq!(config.len(), 2);
        assert_eq!(config.conditions()[0].0, "count");
        assert_eq!(config.param("count"), Some(&Param::Int(5)));
        assert_eq!(config.mode(), MatchMode::Any);

        let again = bincode::serde::encode_to_vec(&config, bincode::config::standard()).unwrap();
        let (round, _): (PopupRuleConfig, usize) =
            bincode::serde::decode_from_slice(&again, bincode::config::standard()).unwrap();
        assert_eq!(round, config);
    }

    #[test]
    fn popup_id_display() {
        assert_eq!(PopupId(42).to_string(), "42");
        assert_eq!(PopupId::from(7_u64), PopupId(7));
    }
}

/// Immutable description of one selectable condition.
///
/// The `id` is persisted with every popup that uses the condition and must
/// never change once released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDefinition {
    pub id: String,
    pub label: String,
    pub description: String,
    /// The condition that is this one's complement (e.g. `login` and
    /// `no_login`). Advisory only: the engine lets both be attached.
    pub exclusive_with: Option<String>,
    /// Display order among sibling conditions; lower sorts first.
    pub sort_weight: i32,
}

impl RuleDefinition {
    #[must_use]
    pub fn new(id: &str, label: &str, description: &str) -> Self {
        Self {
            id: id.to_owned(),
            label: label.to_owned(),
            description: description.to_owned(),
            exclusive_with: None,
            sort_weight: 0,
        }
    }

    #[must_use]
    pub fn exclusive_with(mut self, id: &str) -> Self {
        self.exclusive_with = Some(id.to_owned());
        self
    }

    #[must_use]
    pub fn weight(mut self, sort_weight: i32) -> Self {
        self.sort_weight = sort_weight;
        self
    }
}

/// One row of the condition catalog exported to admin screens: a definition
/// plus the type key of the handler that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionListing {
    pub type_key: String,
    pub definition: RuleDefinition,
}

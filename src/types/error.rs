use thiserror::Error;

use super::config::PopupId;

/// Failures raised while preparing or evaluating a single condition.
///
/// None of these ever reach a visitor: the engine turns each of them into a
/// failed condition (or an absorbed fallback) at the narrowest scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("condition '{condition}' is not declared by handler '{handler}'")]
    UnknownCondition { handler: String, condition: String },

    #[error("invalid parameter for condition '{condition}': {reason}")]
    InvalidParameter { condition: String, reason: String },

    #[error("comment store unavailable: {reason}")]
    CommentStoreUnavailable { reason: String },
}

impl RuleError {
    pub(crate) fn invalid(condition: &str, reason: impl Into<String>) -> Self {
        RuleError::InvalidParameter {
            condition: condition.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Failures building an in-memory popup catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("duplicate popup id {id}")]
    DuplicatePopup { id: PopupId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_condition_message() {
        let err = RuleError::UnknownCondition {
            handler: "class-popup-rule-user.php".into(),
            condition: "nonexistent".into(),
        };
        assert_eq!(
            err.to_string(),
            "condition 'nonexistent' is not declared by handler 'class-popup-rule-user.php'"
        );
    }

    #[test]
    fn invalid_parameter_message() {
        let err = RuleError::invalid("referrer_match", "unclosed group");
        assert_eq!(
            err.to_string(),
            "invalid parameter for condition 'referrer_match': unclosed group"
        );
    }

    #[test]
    fn comment_store_message() {
        let err = RuleError::CommentStoreUnavailable {
            reason: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "comment store unavailable: connection refused"
        );
    }

    #[test]
    fn duplicate_popup_message() {
        let err = CatalogError::DuplicatePopup { id: PopupId(12) };
        assert_eq!(err.to_string(), "duplicate popup id 12");
    }
}

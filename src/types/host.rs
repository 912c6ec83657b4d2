//! Contracts the engine consumes from the host application.

use std::borrow::Cow;

use super::config::{PopupId, PopupRuleConfig};
use super::error::RuleError;

/// Persisted comment records, used to decide whether a logged-in visitor has
/// ever commented.
pub trait CommentStore: Send + Sync {
    /// Count the comments attributed to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::CommentStoreUnavailable`] when the store cannot be
    /// queried.
    fn count_comments_by_user(&self, user_id: u64) -> Result<u64, RuleError>;
}

/// Probe for the optional "pro tier" capability of the host environment.
///
/// Hosts without that capability register no probe at all, which also keeps
/// the `no_prosite` condition out of the registry.
pub trait ProTierProbe: Send + Sync {
    fn is_pro_tier_site(&self) -> bool;
}

impl<F> ProTierProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_pro_tier_site(&self) -> bool {
        self()
    }
}

/// Source of candidate popups.
pub trait PopupSource {
    /// Ids of the active popups, in the order they are defined by the admin.
    fn active_popups(&self) -> Vec<PopupId>;

    /// The rule configuration saved with a popup, or `None` if there is no
    /// such popup.
    fn popup(&self, id: PopupId) -> Option<Cow<'_, PopupRuleConfig>>;
}

//! The single global popover of older installations.
//!
//! Legacy settings stored a set of checkbox keys, an optional referrer
//! pattern, and a view limit. Any checked box is enough to show the popover,
//! but only while the visitor has seen it fewer than the limit.
//!
//! The view limit always applies, as in the classic settings screen. The
//! drag-and-drop screen also stores `count` (and the `order` of its boxes)
//! among the checkbox keys; both are accepted and carry no extra check.

use std::fmt;

use tracing::debug;

use crate::rules::{popup, referrer, user};
use crate::{Engine, MatchMode, PopupId, PopupRuleConfig, RequestContext};

/// One legacy checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyCheck {
    /// The site is not a pro-tier site.
    NotSupporter,
    /// The visitor is logged in.
    LoggedIn,
    /// The visitor is not logged in.
    NotLoggedIn,
    /// The visitor has never commented.
    NeverCommented,
    /// The visitor came from a search engine.
    SearchEngine,
    /// The visitor did not come from another page on the site.
    NotInternal,
    /// The referrer matches the configured pattern.
    Referrer,
}

impl LegacyCheck {
    pub const ALL: [LegacyCheck; 7] = [
        LegacyCheck::NotSupporter,
        LegacyCheck::LoggedIn,
        LegacyCheck::NotLoggedIn,
        LegacyCheck::NeverCommented,
        LegacyCheck::SearchEngine,
        LegacyCheck::NotInternal,
        LegacyCheck::Referrer,
    ];

    /// Parse a stored checkbox key.
    ///
    /// The keys read oddly (`loggedin` means *not* logged in) but are kept
    /// as stored.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "notsupporter" | "supporter" => Some(Self::NotSupporter),
            "isloggedin" => Some(Self::LoggedIn),
            "loggedin" => Some(Self::NotLoggedIn),
            "commented" => Some(Self::NeverCommented),
            "searchengine" => Some(Self::SearchEngine),
            "internal" => Some(Self::NotInternal),
            "referrer" => Some(Self::Referrer),
            _ => None,
        }
    }

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::NotSupporter => "notsupporter",
            Self::LoggedIn => "isloggedin",
            Self::NotLoggedIn => "loggedin",
            Self::NeverCommented => "commented",
            Self::SearchEngine => "searchengine",
            Self::NotInternal => "internal",
            Self::Referrer => "referrer",
        }
    }

    /// The condition id this checkbox maps to.
    #[must_use]
    pub fn condition(self) -> &'static str {
        match self {
            Self::NotSupporter => user::NO_PROSITE,
            Self::LoggedIn => user::LOGIN,
            Self::NotLoggedIn => user::NO_LOGIN,
            Self::NeverCommented => user::NO_COMMENT,
            Self::SearchEngine => referrer::SEARCHENGINE,
            Self::NotInternal => referrer::NO_INTERNAL,
            Self::Referrer => referrer::REFERRER_MATCH,
        }
    }
}

impl fmt::Display for LegacyCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Keys stored next to the checkboxes that are not checks themselves.
const LAYOUT_KEYS: [&str; 2] = ["count", "order"];

/// Legacy popover display rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRules {
    checks: Vec<LegacyCheck>,
    referrer_pattern: Option<String>,
    max_views: u32,
}

impl Default for LegacyRules {
    fn default() -> Self {
        Self {
            checks: Vec::new(),
            referrer_pattern: None,
            max_views: popup::DEFAULT_MAX_VIEWS,
        }
    }
}

impl LegacyRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored checkbox keys. Unrecognised keys are ignored.
    #[must_use]
    pub fn from_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        keys.into_iter()
            .fold(Self::new(), |rules, key| match LegacyCheck::from_key(key) {
                Some(check) => rules.check(check),
                None if LAYOUT_KEYS.contains(&key) => rules,
                None => {
                    debug!(key, "ignoring unknown legacy check");
                    rules
                }
            })
    }

    #[must_use]
    pub fn check(mut self, check: LegacyCheck) -> Self {
        if !self.checks.contains(&check) {
            self.checks.push(check);
        }
        self
    }

    #[must_use]
    pub fn referrer_pattern(mut self, pattern: &str) -> Self {
        self.referrer_pattern = Some(pattern.to_owned());
        self
    }

    #[must_use]
    pub fn max_views(mut self, max_views: u32) -> Self {
        self.max_views = max_views;
        self
    }

    #[must_use]
    pub fn checks(&self) -> &[LegacyCheck] {
        &self.checks
    }

    #[must_use]
    pub fn view_limit(&self) -> u32 {
        self.max_views
    }

    /// The checked boxes as an any-of popup configuration.
    ///
    /// The view limit is not part of it; it gates the whole popover.
    #[must_use]
    pub fn to_config(&self) -> PopupRuleConfig {
        self.checks
            .iter()
            .fold(PopupRuleConfig::any(), |config, &check| match check {
                LegacyCheck::Referrer => config.with(
                    check.condition(),
                    self.referrer_pattern.clone().unwrap_or_default(),
                ),
                other => config.condition(other.condition()),
            })
    }

    /// Decide whether the legacy popover, stored as `popup`, is shown.
    #[must_use]
    pub fn should_show(&self, engine: &Engine, popup: PopupId, ctx: &RequestContext) -> bool {
        if ctx.forced_popup() == Some(popup) {
            return true;
        }
        let views = ctx.view_count(popup);
        if views >= self.max_views {
            debug!(%popup, views, limit = self.max_views, "legacy popover seen too often");
            return false;
        }
        engine.should_show(popup, &self.to_config(), ctx)
    }
}

impl fmt::Display for LegacyRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LegacyRules(")?;
        for (i, check) in self.checks.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{check}")?;
        }
        write!(f, "; views < {}, match {})", self.max_views, MatchMode::Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Param, RuleRegistry};

    const LEGACY: PopupId = PopupId(0);

    fn engine() -> Engine {
        Engine::new(RuleRegistry::with_core_rules(None))
    }

    #[test]
    fn keys_round_trip() {
        for check in LegacyCheck::ALL {
            assert_eq!(LegacyCheck::from_key(check.key()), Some(check));
        }
        assert_eq!(LegacyCheck::from_key("supporter"), Some(LegacyCheck::NotSupporter));
        assert_eq!(LegacyCheck::from_key("nonsense"), None);
    }

    #[test]
    fn from_keys_skips_unknown_and_duplicates() {
        let rules = LegacyRules::from_keys(["loggedin", "bogus", "loggedin", "internal"]);
        assert_eq!(
            rules.checks(),
            [LegacyCheck::NotLoggedIn, LegacyCheck::NotInternal]
        );
        assert_eq!(rules.view_limit(), 3);
    }

    #[test]
    fn drag_and_drop_keys_are_accepted() {
        let rules = LegacyRules::from_keys(["order", "count", "searchengine"]).max_views(2);
        assert_eq!(rules.checks(), [LegacyCheck::SearchEngine]);
        assert_eq!(LegacyCheck::from_key("count"), None);

        let searcher = RequestContext::builder()
            .referrer("https://www.bing.com/search?q=x")
            .view_count(LEGACY, 1)
            .build();
        assert!(rules.should_show(&engine(), LEGACY, &searcher));
        let tired = RequestContext::builder()
            .referrer("https://www.bing.com/search?q=x")
            .view_count(LEGACY, 2)
            .build();
        assert!(!rules.should_show(&engine(), LEGACY, &tired));
    }

    #[test]
    fn config_is_any_of_modern_conditions() {
        let config = LegacyRules::new()
            .check(LegacyCheck::LoggedIn)
            .check(LegacyCheck::Referrer)
            .referrer_pattern("google")
            .to_config();
        assert_eq!(config.mode(), MatchMode::Any);
        assert_eq!(config.param("login"), Some(&Param::None));
        assert_eq!(config.param("referrer_match"), Some(&Param::from("google")));
    }

    #[test]
    fn any_checked_box_is_enough() {
        let rules = LegacyRules::from_keys(["isloggedin", "searchengine"]);
        let member = RequestContext::builder().logged_in(true).build();
        let searcher = RequestContext::builder()
            .referrer("https://www.google.com/search?q=x")
            .build();
        let neither = RequestContext::builder().referrer("https://a.org/").build();
        assert!(rules.should_show(&engine(), LEGACY, &member));
        assert!(rules.should_show(&engine(), LEGACY, &searcher));
        assert!(!rules.should_show(&engine(), LEGACY, &neither));
    }

    #[test]
    fn view_limit_gates_everything() {
        let rules = LegacyRules::from_keys(["isloggedin"]).max_views(2);
        let seen_once = RequestContext::builder()
            .logged_in(true)
            .view_count(LEGACY, 1)
            .build();
        let seen_twice = RequestContext::builder()
            .logged_in(true)
            .view_count(LEGACY, 2)
            .build();
        assert!(rules.should_show(&engine(), LEGACY, &seen_once));
        assert!(!rules.should_show(&engine(), LEGACY, &seen_twice));
    }

    #[test]
    fn nothing_checked_shows_until_limit() {
        let rules = LegacyRules::new();
        let fresh = RequestContext::default();
        let tired = RequestContext::builder().view_count(LEGACY, 3).build();
        assert!(rules.should_show(&engine(), LEGACY, &fresh));
        assert!(!rules.should_show(&engine(), LEGACY, &tired));
    }

    #[test]
    fn forced_overrides_limit() {
        let rules = LegacyRules::new().max_views(0);
        let ctx = RequestContext::builder().forced_popup(LEGACY).build();
        assert!(rules.should_show(&engine(), LEGACY, &ctx));
    }

    #[test]
    fn display() {
        let rules = LegacyRules::from_keys(["loggedin", "commented"]);
        assert_eq!(
            rules.to_string(),
            "LegacyRules(loggedin | commented; views < 3, match any)"
        );
    }
}

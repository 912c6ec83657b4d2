
/// Site-level settings used to turn raw request facts into a
/// [`RequestContext`](crate::RequestContext).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Settings {
    /// Suffix of the cookie set after a visitor comments
    /// (`comment_author_<hash>`).
    pub cookie_hash: String,
    /// The site's home URL. Referrers on the same host count as internal.
    pub site_url: Option<String>,
    /// Whether the plugin operates on the network (multisite global) level.
    pub use_global: bool,
    /// Prefix of the per-popup view counter cookie.
    pub view_cookie_prefix: String,
    /// Prefixes of the per-popup "never show again" cookies.
    pub dismiss_cookie_prefixes: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cookie_hash: String::new(),
            site_url: None,
            use_global: false,
            view_cookie_prefix: "po_c-".to_owned(),
            dismiss_cookie_prefixes: vec!["po_h-".to_owned(), "popover_never_view_".to_owned()],
        }
    }
}

impl Settings {
    #[must_use]
    pub fn new(cookie_hash: &str) -> Self {
        Self {
            cookie_hash: cookie_hash.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_site_url(mut self, url: &str) -> Self {
        self.site_url = Some(url.to_owned());
        self
    }

    #[must_use]
    pub fn with_global(mut self, use_global: bool) -> Self {
        self.use_global = use_global;
        self
    }

    /// Name of the cookie that marks a visitor who has commented.
    #[must_use]
    pub fn comment_cookie_name(&self) -> String {
        format!("comment_author_{}", self.cookie_hash)
    }

    /// Whether a caller on the network admin level (or not) is on the level
    /// the plugin is configured for.
    #[must_use]
    pub fn correct_level(&self, is_network_admin: bool) -> bool {
        self.use_global == is_network_admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cookie_names() {
        let settings = Settings::new("abc123");
        assert_eq!(settings.comment_cookie_name(), "comment_author_abc123");
        assert_eq!(settings.view_cookie_prefix, "po_c-");
        assert_eq!(
            settings.dismiss_cookie_prefixes,
            ["po_h-", "popover_never_view_"]
        );
    }

    #[test]
    fn correct_level_follows_global_flag() {
        let site = Settings::default();
        assert!(site.correct_level(false));
        assert!(!site.correct_level(true));

        let network = Settings::default().with_global(true);
        assert!(network.correct_level(true));
        assert!(!network.correct_level(false));
    }

    #[test]
    fn site_url_builder() {
        let settings = Settings::default().with_site_url("https://example.com");
        assert_eq!(settings.site_url.as_deref(), Some("https://example.com"));
    }
}

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use tracing::warn;

use super::config::PopupId;
use super::host::CommentStore;
use super::settings::Settings;

/// Raw facts about the current request, as supplied by the host.
#[derive(Clone, Default)]
pub struct RequestFacts {
    pub logged_in: bool,
    pub user_id: Option<u64>,
    pub referrer: Option<String>,
    pub requested_url: Option<String>,
    /// Cookie name to value.
    pub cookies: HashMap<String, String>,
    /// ISO 3166 alpha-2 code from the geo lookup, if it succeeded.
    pub country: Option<String>,
    /// The `po_id` request parameter: a popup forced for preview or testing.
    pub forced_popup: Option<PopupId>,
    /// The `preview` request parameter.
    pub preview: bool,
    pub comment_store: Option<Arc<dyn CommentStore>>,
}

impl fmt::Debug for RequestFacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestFacts")
            .field("logged_in", &self.logged_in)
            .field("user_id", &self.user_id)
            .field("referrer", &self.referrer)
            .field("requested_url", &self.requested_url)
            .field("cookies", &self.cookies.len())
            .field("country", &self.country)
            .field("forced_popup", &self.forced_popup)
            .field("preview", &self.preview)
            .finish_non_exhaustive()
    }
}

/// Read-only snapshot of the visitor and request that conditions are
/// evaluated against.
///
/// Build one per request and drop it afterwards. The comment count is
/// resolved lazily and memoized here, so the context is deliberately not
/// `Sync`.
#[derive(Clone, Default)]
pub struct RequestContext {
    logged_in: bool,
    user_id: Option<u64>,
    has_comment_cookie: bool,
    referrer: Option<String>,
    requested_url: Option<String>,
    country: Option<String>,
    site_host: Option<String>,
    view_counts: HashMap<PopupId, u32>,
    dismissed: HashSet<PopupId>,
    forced_popup: Option<PopupId>,
    preview: bool,
    comment_store: Option<Arc<dyn CommentStore>>,
    comment_count: OnceCell<u64>,
}

impl RequestContext {
    /// Start building a context by hand.
    #[must_use]
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// Derive a context from raw request facts.
    ///
    /// Cookies supply the "has commented" flag, per-popup view counts, and
    /// per-popup dismissal markers; `settings` names those cookies and the
    /// site's own host.
    #[must_use]
    pub fn from_facts(facts: RequestFacts, settings: &Settings) -> Self {
        let has_comment_cookie = facts
            .cookies
            .contains_key(&settings.comment_cookie_name());

        let mut view_counts = HashMap::new();
        let mut dismissed = HashSet::new();
        for (name, value) in &facts.cookies {
            if let Some(id) = popup_suffix(name, &settings.view_cookie_prefix) {
                view_counts.insert(id, value.trim().parse().unwrap_or(0));
            }
            let hidden = settings
                .dismiss_cookie_prefixes
                .iter()
                .find_map(|prefix| popup_suffix(name, prefix));
            if let Some(id) = hidden {
                dismissed.insert(id);
            }
        }

        Self {
            logged_in: facts.logged_in,
            user_id: facts.user_id,
            has_comment_cookie,
            referrer: non_empty(facts.referrer),
            requested_url: non_empty(facts.requested_url),
            country: non_empty(facts.country).map(|c| c.to_ascii_uppercase()),
            site_host: settings
                .site_url
                .as_deref()
                .and_then(crate::rules::host_of),
            view_counts,
            dismissed,
            forced_popup: facts.forced_popup,
            preview: facts.preview,
            comment_store: facts.comment_store,
            comment_count: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    #[must_use]
    pub fn user_id(&self) -> Option<u64> {
        self.user_id
    }

    #[must_use]
    pub fn has_comment_cookie(&self) -> bool {
        self.has_comment_cookie
    }

    #[must_use]
    pub fn referrer(&self) -> Option<&str> {
        self.referrer.as_deref()
    }

    #[must_use]
    pub fn requested_url(&self) -> Option<&str> {
        self.requested_url.as_deref()
    }

    /// Upper-cased country code of the visitor, if known.
    #[must_use]
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Lower-cased host of the site itself, if configured.
    #[must_use]
    pub fn site_host(&self) -> Option<&str> {
        self.site_host.as_deref()
    }

    /// How often the visitor has already seen `popup`.
    #[must_use]
    pub fn view_count(&self, popup: PopupId) -> u32 {
        self.view_counts.get(&popup).copied().unwrap_or(0)
    }

    /// Whether the visitor asked never to see `popup` again.
    #[must_use]
    pub fn is_dismissed(&self, popup: PopupId) -> bool {
        self.dismissed.contains(&popup)
    }

    #[must_use]
    pub fn forced_popup(&self) -> Option<PopupId> {
        self.forced_popup
    }

    #[must_use]
    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// Number of comments the visitor is known to have left.
    ///
    /// The comment cookie counts as one comment without touching storage.
    /// Otherwise logged-in visitors are looked up in the comment store, and
    /// everyone else counts as zero. Resolved at most once per context; a
    /// failing store is logged and counts as zero.
    #[must_use]
    pub fn comment_count(&self) -> u64 {
        *self.comment_count.get_or_init(|| self.resolve_comment_count())
    }

    fn resolve_comment_count(&self) -> u64 {
        if self.has_comment_cookie {
            return 1;
        }
        if !self.logged_in {
            return 0;
        }
        let (Some(store), Some(user_id)) = (&self.comment_store, self.user_id) else {
            return 0;
        };
        match store.count_comments_by_user(user_id) {
            Ok(count) => count,
            Err(err) => {
                warn!(user_id, error = %err, "comment lookup failed, assuming no comments");
                0
            }
        }
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("logged_in", &self.logged_in)
            .field("user_id", &self.user_id)
            .field("has_comment_cookie", &self.has_comment_cookie)
            .field("referrer", &self.referrer)
            .field("requested_url", &self.requested_url)
            .field("country", &self.country)
            .field("site_host", &self.site_host)
            .field("view_counts", &self.view_counts)
            .field("dismissed", &self.dismissed)
            .field("forced_popup", &self.forced_popup)
            .field("preview", &self.preview)
            .field("comment_count", &self.comment_count.get())
            .finish_non_exhaustive()
    }
}

/// Fluent builder for [`RequestContext`].
#[derive(Default)]
#[must_use]
pub struct RequestContextBuilder {
    ctx: RequestContext,
}

impl RequestContextBuilder {
    pub fn logged_in(mut self, logged_in: bool) -> Self {
        self.ctx.logged_in = logged_in;
        self
    }

    pub fn user_id(mut self, user_id: u64) -> Self {
        self.ctx.user_id = Some(user_id);
        self
    }

    pub fn comment_cookie(mut self, present: bool) -> Self {
        self.ctx.has_comment_cookie = present;
        self
    }

    pub fn referrer(mut self, referrer: &str) -> Self {
        self.ctx.referrer = non_empty(Some(referrer.to_owned()));
        self
    }

    pub fn requested_url(mut self, url: &str) -> Self {
        self.ctx.requested_url = non_empty(Some(url.to_owned()));
        self
    }

    pub fn country(mut self, code: &str) -> Self {
        self.ctx.country = non_empty(Some(code.to_owned()));
        self
    }

    pub fn site_url(mut self, url: &str) -> Self {
        self.ctx.site_host = crate::rules::host_of(url);
        self
    }

    pub fn view_count(mut self, popup: PopupId, count: u32) -> Self {
        self.ctx.view_counts.insert(popup, count);
        self
    }

    pub fn dismissed(mut self, popup: PopupId) -> Self {
        self.ctx.dismissed.insert(popup);
        self
    }

    pub fn forced_popup(mut self, popup: PopupId) -> Self {
        self.ctx.forced_popup = Some(popup);
        self
    }

    pub fn preview(mut self, preview: bool) -> Self {
        self.ctx.preview = preview;
        self
    }

    pub fn comment_store(mut self, store: Arc<dyn CommentStore>) -> Self {
        self.ctx.comment_store = Some(store);
        self
    }

    #[must_use]
    pub fn build(mut self) -> RequestContext {
        if let Some(country) = self.ctx.country.as_mut() {
            country.make_ascii_uppercase();
        }
        self.ctx
    }
}

fn popup_suffix(name: &str, prefix: &str) -> Option<PopupId> {
    name.strip_prefix(prefix)?.parse().ok().map(PopupId)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

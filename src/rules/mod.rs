//! Built-in rule handler families.
//!
//! Each family's type key is persisted with every popup that uses its
//! conditions. Renaming a key or a condition id disables those conditions
//! on existing popups.

pub mod geo;
pub mod popup;
pub mod referrer;
pub mod url;
pub mod user;

use std::sync::Arc;

pub use geo::GeoRules;
pub use popup::PopupRules;
pub use referrer::ReferrerRules;
pub use url::UrlRules;
pub use user::UserRules;

use crate::{ProTierProbe, RuleHandler};

/// The built-in families in their registration order.
pub(crate) fn core_handlers(
    pro_tier: Option<Arc<dyn ProTierProbe>>,
) -> Vec<Arc<dyn RuleHandler>> {
    vec![
        Arc::new(UrlRules::new()),
        Arc::new(GeoRules::new()),
        Arc::new(PopupRules::new()),
        Arc::new(ReferrerRules::new()),
        Arc::new(UserRules::new(pro_tier)),
    ]
}

/// Lower-cased host of a URL, tolerating missing schemes, credentials and
/// ports.
pub(crate) fn host_of(url: &str) -> Option<String> {
    let rest = strip_scheme(url.trim());
    let rest = rest.trim_start_matches('/');
    let authority = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let authority = authority.rsplit('@').next().unwrap_or_default();
    let host = match authority.strip_prefix('[') {
        // IPv6 literal
        Some(v6) => v6.split(']').next().unwrap_or_default(),
        None => authority.split(':').next().unwrap_or_default(),
    };
    (!host.is_empty()).then(|| host.to_ascii_lowercase())
}

/// The URL without its `scheme://` prefix.
pub(crate) fn strip_scheme(url: &str) -> &str {
    match url.find("://") {
        Some(idx) if url[..idx].chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) => {
            &url[idx + 3..]
        }
        _ => url,
    }
}

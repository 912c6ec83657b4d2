use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use super::config::{PopupId, PopupRuleConfig};
use super::context::RequestContext;
use super::definition::ConditionListing;
use super::evaluation_report::{EvaluationReport, Reason};
use super::host::PopupSource;
use super::registry::RuleRegistry;
use super::rule::CompiledRules;

/// Decides whether a popup is shown for a request.
///
/// Holds its [`RuleRegistry`] behind `Arc`, so an engine is cheap to clone
/// and safe to share between threads. Each request supplies its own
/// [`RequestContext`].
///
/// # Example
///
/// ```
/// use popover::{Engine, PopupId, PopupRuleConfig, RequestContext, RuleRegistry};
///
/// let engine = Engine::new(RuleRegistry::with_core_rules(None));
/// let config = PopupRuleConfig::new().condition("no_login");
///
/// let guest = RequestContext::builder().logged_in(false).build();
/// assert!(engine.should_show(PopupId(1), &config, &guest));
///
/// let member = RequestContext::builder().logged_in(true).build();
/// assert!(!engine.should_show(PopupId(1), &config, &member));
/// ```
#[derive(Clone)]
pub struct Engine {
    registry: Arc<RuleRegistry>,
}

impl Engine {
    #[must_use]
    pub fn new(registry: RuleRegistry) -> Self {
        Self::from_shared(Arc::new(registry))
    }

    #[must_use]
    pub fn from_shared(registry: Arc<RuleRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Every condition the admin UI may offer, in registration order then
    /// sort weight.
    #[must_use]
    pub fn conditions(&self) -> Vec<ConditionListing> {
        self.registry.conditions()
    }

    /// Resolve a popup's configuration against the registry and validate its
    /// parameters once.
    #[must_use]
    pub fn compile(&self, config: &PopupRuleConfig) -> CompiledRules {
        crate::compile::compile(&self.registry, config)
    }

    /// Decide whether `popup`, configured by `config`, is shown for `ctx`.
    ///
    /// A forced popup is always shown, even one the visitor dismissed. A
    /// popup the visitor dismissed is otherwise never shown unless the
    /// request is a preview. Otherwise the attached
    /// conditions decide; with none attached the popup is shown.
    #[must_use]
    pub fn should_show(
        &self,
        popup: PopupId,
        config: &PopupRuleConfig,
        ctx: &RequestContext,
    ) -> bool {
        if let Some(decision) = pre_rules(popup, ctx) {
            return decision;
        }
        if config.is_empty() {
            debug!(%popup, "no rules attached, showing");
            return true;
        }
        let show = crate::evaluate::evaluate(&self.compile(config), ctx, popup);
        debug!(%popup, show, "rules evaluated");
        show
    }

    /// [`should_show`](Self::should_show) for rules compiled earlier with
    /// [`compile`](Self::compile).
    #[must_use]
    pub fn should_show_compiled(
        &self,
        popup: PopupId,
        rules: &CompiledRules,
        ctx: &RequestContext,
    ) -> bool {
        if let Some(decision) = pre_rules(popup, ctx) {
            return decision;
        }
        crate::evaluate::evaluate(rules, ctx, popup)
    }

    /// Look `popup` up in `source` and decide whether it is shown. Unknown
    /// popups are never shown.
    #[must_use]
    pub fn should_show_popup<S: PopupSource + ?Sized>(
        &self,
        source: &S,
        popup: PopupId,
        ctx: &RequestContext,
    ) -> bool {
        match source.popup(popup) {
            Some(config) => self.should_show(popup, &config, ctx),
            None => {
                debug!(%popup, "popup not found, hiding");
                false
            }
        }
    }

    /// The popups to display for this request, in the source's order.
    ///
    /// A forced popup replaces the active list entirely.
    #[must_use]
    pub fn select<S: PopupSource + ?Sized>(&self, source: &S, ctx: &RequestContext) -> Vec<PopupId> {
        let candidates = match ctx.forced_popup() {
            Some(forced) => vec![forced],
            None => source.active_popups(),
        };
        candidates
            .into_iter()
            .filter(|&id| self.should_show_popup(source, id, ctx))
            .collect()
    }

    /// Evaluate with diagnostics: the decision, its reason, and the outcome
    /// of each attached condition.
    pub fn evaluate_detailed(
        &self,
        popup: PopupId,
        config: &PopupRuleConfig,
        ctx: &RequestContext,
    ) -> EvaluationReport {
        let start = Instant::now();
        let (show, reason, outcomes) = if ctx.forced_popup() == Some(popup) {
            (true, Reason::Forced, Vec::new())
        } else if ctx.is_dismissed(popup) && !ctx.is_preview() {
            (false, Reason::Dismissed, Vec::new())
        } else {
            match crate::evaluate::evaluate_detailed(&self.compile(config), ctx, popup) {
                (Some(show), outcomes) => (show, Reason::Rules, outcomes),
                (None, outcomes) => (true, Reason::Unrestricted, outcomes),
            }
        };
        EvaluationReport::new(popup, show, reason, outcomes, start.elapsed())
    }
}

/// Request-level overrides that settle the decision before any rule runs.
fn pre_rules(popup: PopupId, ctx: &RequestContext) -> Option<bool> {
    if ctx.forced_popup() == Some(popup) {
        debug!(%popup, "popup forced by request, skipping rules");
        return Some(true);
    }
    if ctx.is_dismissed(popup) && !ctx.is_preview() {
        debug!(%popup, "popup dismissed by visitor");
        return Some(false);
    }
    None
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .finish()
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Engine({} handlers, {} conditions)",
            self.registry.len(),
            self.registry.conditions().len(),
        )
    }
}

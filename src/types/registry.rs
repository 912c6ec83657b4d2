use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use super::definition::ConditionListing;
use super::handler::RuleHandler;
use super::host::ProTierProbe;

/// Catalog of registered rule handlers, keyed by type key.
///
/// Registration order is preserved for enumeration. A secondary index maps
/// every declared condition id to its handler; when two handlers declare the
/// same id, the most recent registration wins, even when it replaced an
/// earlier handler in place.
///
/// Populate it at startup, then hand it to an [`Engine`](crate::Engine);
/// it is read-only from then on.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    handlers: Vec<Arc<dyn RuleHandler>>,
    // Registration sequence per slot, parallel to `handlers`.
    sequence: Vec<u64>,
    next_sequence: u64,
    by_condition: HashMap<String, usize>,
}

impl RuleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in handler families.
    ///
    /// `pro_tier` is the host's pro-tier probe; pass `None` when the host has
    /// no such capability and `no_prosite` will not be offered.
    #[must_use]
    pub fn with_core_rules(pro_tier: Option<Arc<dyn ProTierProbe>>) -> Self {
        let mut registry = Self::new();
        for handler in crate::rules::core_handlers(pro_tier) {
            registry.register(handler);
        }
        registry
    }

    /// Register a handler (builder version of [`register`](Self::register)).
    #[must_use]
    pub fn with(mut self, handler: impl RuleHandler + 'static) -> Self {
        self.register(Arc::new(handler));
        self
    }

    /// Register a handler. A handler with an already registered type key
    /// replaces the earlier one at its original position.
    pub fn register(&mut self, handler: Arc<dyn RuleHandler>) {
        let key = handler.type_key().to_owned();
        let seq = self.next_sequence;
        self.next_sequence += 1;
        let idx = match self.handlers.iter().position(|h| h.type_key() == key) {
            Some(idx) => {
                self.handlers[idx] = handler;
                self.sequence[idx] = seq;
                idx
            }
            None => {
                self.handlers.push(handler);
                self.sequence.push(seq);
                self.handlers.len() - 1
            }
        };
        self.reindex(idx);
    }

    fn reindex(&mut self, registered: usize) {
        self.by_condition.clear();
        for (idx, handler) in self.handlers.iter().enumerate() {
            for def in handler.definitions() {
                let Some(&prev) = self.by_condition.get(&def.id) else {
                    self.by_condition.insert(def.id.clone(), idx);
                    continue;
                };
                if prev == idx {
                    continue;
                }
                let (winner, shadowed) = if self.sequence[idx] > self.sequence[prev] {
                    (idx, prev)
                } else {
                    (prev, idx)
                };
                self.by_condition.insert(def.id.clone(), winner);
                if winner == registered || shadowed == registered {
                    warn!(
                        condition = %def.id,
                        shadowed = self.handlers[shadowed].type_key(),
                        winner = self.handlers[winner].type_key(),
                        "condition id declared by more than one rule handler"
                    );
                }
            }
        }
    }

    /// All handlers, in registration order.
    #[must_use]
    pub fn all_handlers(&self) -> &[Arc<dyn RuleHandler>] {
        &self.handlers
    }

    /// Look up a handler by its type key.
    #[must_use]
    pub fn handler(&self, type_key: &str) -> Option<&Arc<dyn RuleHandler>> {
        self.handlers.iter().find(|h| h.type_key() == type_key)
    }

    /// The handler that declares `condition`, if any.
    #[must_use]
    pub fn find_handler_for(&self, condition: &str) -> Option<&Arc<dyn RuleHandler>> {
        self.by_condition
            .get(condition)
            .map(|&idx| &self.handlers[idx])
    }

    /// Every condition across all handlers: registration order first, then
    /// sort weight within a handler (declaration order breaks ties).
    #[must_use]
    pub fn conditions(&self) -> Vec<ConditionListing> {
        let mut out = Vec::new();
        for handler in &self.handlers {
            let mut defs: Vec<_> = handler.definitions().iter().collect();
            defs.sort_by_key(|d| d.sort_weight);
            out.extend(defs.into_iter().map(|d| ConditionListing {
                type_key: handler.type_key().to_owned(),
                definition: d.clone(),
            }));
        }
        out
    }

    /// The number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field(
                "handlers",
                &self.handlers.iter().map(|h| h.type_key()).collect::<Vec<_>>(),
            )
            .field("conditions", &self.by_condition.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PopupId, Prepared, RequestContext, RuleDefinition, RuleError};

    struct Fixed {
        key: &'static str,
        answer: bool,
        definitions: Vec<RuleDefinition>,
    }

    impl Fixed {
        fn new(key: &'static str, answer: bool, ids: &[(&str, i32)]) -> Self {
            Self {
                key,
                answer,
                definitions: ids
                    .iter()
                    .map(|(id, w)| RuleDefinition::new(id, id, "").weight(*w))
                    .collect(),
            }
        }
    }

    impl RuleHandler for Fixed {
        fn type_key(&self) -> &str {
            self.key
        }

        fn definitions(&self) -> &[RuleDefinition] {
            &self.definitions
        }

        fn evaluate(
            &self,
            _condition: &str,
            _param: &Prepared,
            _ctx: &RequestContext,
            _popup: PopupId,
        ) -> Result<bool, RuleError> {
            Ok(self.answer)
        }
    }

    #[test]
    fn register_and_find() {
        let reg = RuleRegistry::new().with(Fixed::new("a", true, &[("x", 0), ("y", 0)]));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.find_handler_for("y").unwrap().type_key(), "a");
        assert!(reg.find_handler_for("z").is_none());
        assert!(reg.handler("a").is_some());
    }

    #[test]
    fn same_key_replaces_in_place() {
        let reg = RuleRegistry::new()
            .with(Fixed::new("a", true, &[("x", 0)]))
            .with(Fixed::new("b", true, &[("y", 0)]))
            .with(Fixed::new("a", false, &[("z", 0)]));
        let keys: Vec<&str> = reg.all_handlers().iter().map(|h| h.type_key()).collect();
        assert_eq!(keys, ["a", "b"]);
        assert!(reg.find_handler_for("x").is_none());
        assert_eq!(reg.find_handler_for("z").unwrap().type_key(), "a");
    }

    #[test]
    fn later_handler_shadows_colliding_id() {
        let reg = RuleRegistry::new()
            .with(Fixed::new("first", true, &[("dup", 0)]))
            .with(Fixed::new("second", false, &[("dup", 0)]));
        assert_eq!(reg.find_handler_for("dup").unwrap().type_key(), "second");
    }

    #[test]
    fn replaced_handler_reclaims_colliding_id() {
        let reg = RuleRegistry::new()
            .with(Fixed::new("a", false, &[("dup", 0)]))
            .with(Fixed::new("b", false, &[("dup", 0)]))
            .with(Fixed::new("a", true, &[("dup", 0)]));
        let keys: Vec<&str> = reg.all_handlers().iter().map(|h| h.type_key()).collect();
        assert_eq!(keys, ["a", "b"]);
        let winner = reg.find_handler_for("dup").unwrap();
        assert_eq!(winner.type_key(), "a");
        let shown = winner
            .evaluate("dup", &Prepared::Flag, &RequestContext::default(), PopupId(1))
            .unwrap();
        assert!(shown);

        let reg = reg.with(Fixed::new("b", false, &[("dup", 0)]));
        assert_eq!(reg.find_handler_for("dup").unwrap().type_key(), "b");
    }

    #[test]
    fn conditions_ordered_by_registration_then_weight() {
        let reg = RuleRegistry::new()
            .with(Fixed::new("a", true, &[("heavy", 20), ("light", 1), ("light2", 1)]))
            .with(Fixed::new("b", true, &[("zero", 0)]));
        let listed: Vec<(String, String)> = reg
            .conditions()
            .into_iter()
            .map(|c| (c.type_key, c.definition.id))
            .collect();
        assert_eq!(
            listed,
            [
                ("a".to_owned(), "light".to_owned()),
                ("a".to_owned(), "light2".to_owned()),
                ("a".to_owned(), "heavy".to_owned()),
                ("b".to_owned(), "zero".to_owned()),
            ]
        );
    }

    #[test]
    fn empty_registry() {
        let reg = RuleRegistry::new();
        assert!(reg.is_empty());
        assert!(reg.conditions().is_empty());
        assert!(format!("{reg:?}").contains("RuleRegistry"));
    }
}

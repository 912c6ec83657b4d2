use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use popover::{
    CommentStore, Engine, PopupId, PopupRuleConfig, RequestContext, RuleError, RuleRegistry,
};

const POPUP: PopupId = PopupId(3);

struct CountingStore {
    calls: AtomicUsize,
}

impl CommentStore for CountingStore {
    fn count_comments_by_user(&self, user_id: u64) -> Result<u64, RuleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Even user ids have commented.
        Ok(u64::from(user_id % 2 == 0))
    }
}

#[test]
fn evaluate_across_threads() {
    let engine = Engine::new(RuleRegistry::with_core_rules(None));
    let config = Arc::new(
        PopupRuleConfig::new()
            .condition("login")
            .condition("no_comment")
            .with("count", 2_i64),
    );

    let cases = [
        // (logged_in, user_id, views, expected)
        (true, 1, 0, true),
        (true, 2, 0, false),
        (false, 3, 0, false),
        (true, 5, 2, false),
        (true, 7, 1, true),
    ];

    let store = Arc::new(CountingStore {
        calls: AtomicUsize::new(0),
    });

    let handles: Vec<_> = cases
        .into_iter()
        .map(|(logged_in, user_id, views, expected)| {
            let engine = engine.clone();
            let config = Arc::clone(&config);
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let ctx = RequestContext::builder()
                    .logged_in(logged_in)
                    .user_id(user_id)
                    .view_count(POPUP, views)
                    .comment_store(store)
                    .build();
                (engine.should_show(POPUP, &config, &ctx), expected)
            })
        })
        .collect();

    for handle in handles {
        let (got, expected) = handle.join().unwrap();
        assert_eq!(got, expected);
    }
}

#[test]
fn compiled_rules_shared_between_threads() {
    let engine = Engine::new(RuleRegistry::with_core_rules(None));
    let rules = Arc::new(engine.compile(
        &PopupRuleConfig::new()
            .with("referrer_match", "google\\.")
            .condition("no_internal"),
    ));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            let rules = Arc::clone(&rules);
            thread::spawn(move || {
                let referrer = if i % 2 == 0 {
                    "https://www.google.com/search?q=x"
                } else {
                    "https://example.com/previous"
                };
                let ctx = RequestContext::builder()
                    .referrer(referrer)
                    .site_url("https://example.com")
                    .build();
                (i, engine.should_show_compiled(POPUP, &rules, &ctx))
            })
        })
        .collect();

    for handle in handles {
        let (i, show) = handle.join().unwrap();
        assert_eq!(show, i % 2 == 0, "thread {i}");
    }
}

#[test]
fn comment_lookups_are_per_request() {
    let engine = Engine::new(RuleRegistry::with_core_rules(None));
    let config = Arc::new(PopupRuleConfig::new().condition("comment"));
    let store = Arc::new(CountingStore {
        calls: AtomicUsize::new(0),
    });

    let handles: Vec<_> = (0..6_u64)
        .map(|user_id| {
            let engine = engine.clone();
            let config = Arc::clone(&config);
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let ctx = RequestContext::builder()
                    .logged_in(true)
                    .user_id(user_id)
                    .comment_store(store)
                    .build();
                // Both members of the pair share one lookup.
                let comment = engine.should_show(POPUP, &config, &ctx);
                let never = engine.should_show(
                    POPUP,
                    &PopupRuleConfig::new().condition("no_comment"),
                    &ctx,
                );
                assert_ne!(comment, never);
                (user_id, comment)
            })
        })
        .collect();

    for handle in handles {
        let (user_id, comment) = handle.join().unwrap();
        assert_eq!(comment, user_id % 2 == 0);
    }
    assert_eq!(store.calls.load(Ordering::SeqCst), 6);
}

use std::collections::HashMap;

use popover::{
    Engine, PopupId, PopupRuleConfig, RequestContext, RequestFacts, RuleRegistry, Settings,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("popover=debug")
        .init();

    let engine = Engine::new(RuleRegistry::with_core_rules(None));
    println!("{engine}");

    // Show to guests arriving from Google, at most twice.
    let welcome = PopupId(12);
    let config = PopupRuleConfig::new()
        .condition("no_login")
        .with("referrer_match", "google\\.")
        .with("count", 2_i64);

    let settings = Settings::new("5f4dcc3b").with_site_url("https://example.com");
    let facts = RequestFacts {
        referrer: Some("https://www.google.com/search?q=boots".into()),
        requested_url: Some("https://example.com/shop/boots".into()),
        cookies: HashMap::from([("po_c-12".to_owned(), "1".to_owned())]),
        ..RequestFacts::default()
    };
    let ctx = RequestContext::from_facts(facts, &settings);

    let report = engine.evaluate_detailed(welcome, &config, &ctx);
    println!("{report}");

    let seen_twice = RequestContext::builder()
        .referrer("https://www.google.com/")
        .view_count(welcome, 2)
        .build();
    println!(
        "after two views: {}",
        engine.evaluate_detailed(welcome, &config, &seen_twice)
    );
}

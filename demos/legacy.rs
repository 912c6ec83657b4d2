use popover::legacy::LegacyRules;
use popover::{Engine, PopupId, RequestContext, RuleRegistry};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("popover=debug")
        .init();

    // Stored settings of the old single popover.
    let rules = LegacyRules::from_keys(["loggedin", "searchengine", "referrer"])
        .referrer_pattern("newsletter")
        .max_views(3);
    println!("{rules}");

    let engine = Engine::new(RuleRegistry::with_core_rules(None));
    let legacy = PopupId(0);

    let visitors = [
        ("guest", RequestContext::builder().logged_in(false).build()),
        (
            "member from newsletter",
            RequestContext::builder()
                .logged_in(true)
                .referrer("https://mail.example.net/newsletter/42")
                .build(),
        ),
        (
            "member, direct",
            RequestContext::builder().logged_in(true).build(),
        ),
        (
            "guest, seen three times",
            RequestContext::builder()
                .logged_in(false)
                .view_count(legacy, 3)
                .build(),
        ),
    ];

    for (label, ctx) in &visitors {
        println!("{label}: {}", rules.should_show(&engine, legacy, ctx));
    }
}

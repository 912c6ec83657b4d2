use popover::{Catalog, Engine, PopupSource, RequestContext, RuleRegistry};

const CATALOG: &str = r#"
# Welcome offer for guests from search engines.
popup 12 {
    no_login
    searchengine
    count 3
}

# Members-only survey, never on checkout pages.
popup 13 {
    login
    no_url ["example.com/checkout/.*"]
}

# Anyone arriving from social media or outside the site.
popup 14 any {
    referrer ["twitter.com", "facebook.com"]
    no_internal
}
"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("popover=debug")
        .init();

    let catalog = match Catalog::from_dsl(CATALOG) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    println!("{catalog}");

    let engine = Engine::new(RuleRegistry::with_core_rules(None));

    let requests = [
        (
            "guest from search",
            RequestContext::builder()
                .referrer("https://www.bing.com/search?q=popover")
                .requested_url("https://example.com/")
                .site_url("https://example.com")
                .build(),
        ),
        (
            "member at checkout",
            RequestContext::builder()
                .logged_in(true)
                .referrer("https://example.com/cart")
                .requested_url("https://example.com/checkout/pay")
                .site_url("https://example.com")
                .build(),
        ),
    ];

    for (label, ctx) in &requests {
        println!("{label}: {:?}", engine.select(&catalog, ctx));
        for id in catalog.active_popups() {
            if let Some(config) = catalog.get(id) {
                println!("  {}", engine.evaluate_detailed(id, config, ctx));
            }
        }
    }
}

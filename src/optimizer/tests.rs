use super::*;
use crate::fetch::NoFetch;

fn optimizer(options: Options) -> Optimizer {
    Optimizer::with_fetcher(options, NoFetch).unwrap()
}

fn page(head: &str, body: &str) -> String {
    format!("<!DOCTYPE html><html><head>{head}</head><body>{body}</body></html>")
}

#[test]
fn test_not_a_document() {
    let opt = optimizer(Options::default());
    assert!(matches!(opt.optimize("<p>fragment</p>"), Err(OptimizeError::NotADocument)));
}

#[test]
fn test_image_lazyload_with_fallback() {
    let opt = optimizer(Options::default());
    let out = opt
        .optimize(&page("<title>t</title>", r#"<img src="a.jpg" alt="x">"#))
        .unwrap();

    assert!(out.starts_with("<!DOCTYPE html>"));
    assert!(out.contains(r#"data-src="a.jpg""#));
    assert!(out.contains(r#"loading="lazy""#));
    assert!(out.contains("defer-loading defer-has-fallback"));
    assert!(out.contains(r#"<noscript><img src="a.jpg" alt="x"></noscript>"#));
}

#[test]
fn test_loader_and_document_markers() {
    let opt = optimizer(Options::default());
    let out = opt.optimize(&page("<title>t</title>", "<p>x</p>")).unwrap();

    assert!(out.contains(r#"<html class="no-deferjs defer-fading">"#));
    assert!(out.contains(r#"<script id="defer-js">"#));
    assert!(out.contains(r#"<script id="defer-script">"#));
    assert!(out.contains(r#"<style id="defer-css">"#));
    // metas stay above the loader
    let charset = out.find(r#"<meta charset="utf-8">"#).unwrap();
    assert!(charset < out.find("defer-js").unwrap());
    assert!(out.contains(r#"name="viewport""#));
}

#[test]
fn test_dns_prefetch_dedup() {
    let opt = optimizer(Options::default());
    let head = concat!(
        r#"<title>t</title>"#,
        r#"<link rel="dns-prefetch" href="https://a.test">"#,
        r#"<link rel="dns-prefetch" href="https://a.test">"#,
        r#"<link rel="dns-prefetch" href="https://b.test">"#,
    );
    let out = opt.optimize(&page(head, "")).unwrap();

    assert_eq!(out.matches(r#"<link rel="dns-prefetch" href="https://a.test">"#).count(), 1);
    assert_eq!(out.matches(r#"<link rel="dns-prefetch" href="https://b.test">"#).count(), 1);
    // hints sit right before the title
    assert!(out.contains(r#"<link rel="dns-prefetch" href="https://b.test"><title>t</title>"#));
}

#[test]
fn test_amp_document_restores_options() {
    let opt = optimizer(Options::default());
    let amp = "<html amp><head><title>t</title></head><body><img src=\"a.jpg\"></body></html>";
    let out = opt.optimize(amp).unwrap();

    assert!(!out.contains("data-src"));
    assert!(!out.contains("defer-js"));
    assert!(!out.contains("no-deferjs"));
    assert!(opt.options().enable_lazyloading);

    let out = opt.optimize(&page("<title>t</title>", r#"<img src="a.jpg">"#)).unwrap();
    assert!(out.contains(r#"data-src="a.jpg""#));
}

#[test]
fn test_idempotent() {
    let opt = optimizer(Options::default());
    let input = page(
        concat!(
            "<title>t</title>",
            "<link rel=\"stylesheet\" href=\"https://cdn.example.net/site.css\">",
        ),
        concat!(
            "<p>Hello <a href=\"https://example.org/\" target=\"_blank\">there</a></p>",
            "<img src=\"a.jpg\" width=\"10\" height=\"20\">",
            "<div style=\"background:url(bg.png)\">x</div>",
        ),
    );
    let once = opt.optimize_for_host(&input, "example.com").unwrap();
    let twice = opt.optimize_for_host(&once, "example.com").unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_idempotent_with_deferred_sheets_scripts_and_metas() {
    let opt = optimizer(Options::default());
    let input = page(
        concat!(
            "<title>t</title>",
            "<meta name=\"description\" content=\"d\">",
            "<link rel=\"stylesheet\" href=\"/site.css\">",
            "<link rel=\"stylesheet\" href=\"https://www.youtube.com/s/player.css\">",
            "<link rel=\"stylesheet\" href=\"https://platform.twitter.com/css/widgets.css\">",
            "<script>function greet() { alert(1) }</script>",
            "<meta charset=\"utf-8\">",
        ),
        concat!(
            "<button onclick=\"greet()\">x</button>",
            "<script async src=\"https://www.googletagmanager.com/gtag/js?id=G-1\"></script>",
        ),
    );
    let once = opt.optimize_for_host(&input, "example.com").unwrap();
    let twice = opt.optimize_for_host(&once, "example.com").unwrap();
    assert_eq!(once, twice);

    // each deferred sheet keeps its fallback right behind it
    assert!(once.contains(concat!(
        r#"class="defer-has-fallback"><noscript><link rel="stylesheet" "#,
        r#"href="https://www.youtube.com/s/player.css"></noscript>"#,
    )));
    assert!(once.contains(concat!(
        r#"class="defer-has-fallback"><noscript><link rel="stylesheet" "#,
        r#"href="https://platform.twitter.com/css/widgets.css"></noscript>"#,
    )));
}

#[test]
fn test_inline_script_globals_survive() {
    let opt = optimizer(Options::default());
    let body = concat!(
        "<button onclick=\"greet()\">x</button>",
        "<script>function greet() { alert(1) }\nvar counter = 0;</script>",
    );
    let out = opt.optimize(&page("<title>t</title>", body)).unwrap();

    assert!(out.contains(r#"<script type="deferjs">function greet(){alert(1)}"#));
    assert!(out.contains("counter"));
}

#[test]
fn test_loader_unavailable_leaves_document_untouched() {
    let opt = optimizer(Options {
        deferjs_src: "https://cdn.test/missing.js".into(),
        ..Options::default()
    });
    let mut doc = parse_document(&page("<title>t</title>", r#"<img src="a.jpg">"#)).unwrap();
    let before = doc.serialize();

    assert!(matches!(
        opt.optimize_document(&mut doc, ""),
        Err(OptimizeError::LoaderUnavailable(_))
    ));
    assert_eq!(doc.serialize(), before);
    assert!(!doc.optimized);
}

#[test]
fn test_optimize_document_only_once() {
    let opt = optimizer(Options::default());
    let mut doc = parse_document(&page("<title>t</title>", r#"<img src="a.jpg">"#)).unwrap();
    opt.optimize_document(&mut doc, "").unwrap();
    let once = doc.serialize();
    opt.optimize_document(&mut doc, "").unwrap();
    assert!(doc.optimized);
    assert_eq!(doc.serialize(), once);
}

#[test]
fn test_ignore_attribute_and_selector() {
    let opt = optimizer(Options {
        ignore_lazyload_css_selectors: vec![".hero img".into()],
        ..Options::default()
    });
    let body = concat!(
        r#"<div data-ignore><img src="a.jpg"></div>"#,
        r#"<div class="hero"><img src="b.jpg"></div>"#,
        r#"<img src="c.jpg">"#,
    );
    let out = opt.optimize(&page("<title>t</title>", body)).unwrap();

    assert!(out.contains(r#"<div data-ignore><img src="a.jpg"></div>"#));
    assert!(out.contains(r#"<img src="b.jpg" data-nolazy>"#));
    assert!(out.contains(r#"data-src="c.jpg""#));
}

#[test]
fn test_ignore_selector_with_pseudo_class() {
    let opt = optimizer(Options {
        ignore_lazyload_css_selectors: vec!["img:not(.keep-lazy)".into()],
        ..Options::default()
    });
    let body = r#"<img src="a.jpg"><img class="keep-lazy" src="b.jpg">"#;
    let out = opt.optimize(&page("<title>t</title>", body)).unwrap();

    assert!(out.contains(r#"<img src="a.jpg" data-nolazy>"#));
    assert!(out.contains(r#"data-src="b.jpg""#));
    assert!(!out.contains(r#"data-src="a.jpg""#));
}

#[test]
fn test_picture_children_opt_out() {
    let opt = optimizer(Options {
        ignore_lazyload_css_selectors: vec![".hero picture".into()],
        ..Options::default()
    });
    let body = concat!(
        r#"<div class="hero"><picture><source srcset="a.webp"><img src="a.jpg"></picture></div>"#,
        r#"<picture><source srcset="b.webp"><img data-nolazy src="b.jpg"></picture>"#,
    );
    let out = opt.optimize(&page("<title>t</title>", body)).unwrap();

    // a no-lazy picture holds back its image
    assert!(out.contains(
        r#"<picture data-nolazy><source srcset="a.webp"><img src="a.jpg"></picture>"#
    ));
    assert!(!out.contains(r#"data-src="a.jpg""#));
    // a no-lazy image inside a lazy picture stays eager
    assert!(out.contains(
        r#"<source data-srcset="b.webp"><img data-nolazy src="b.jpg"></picture>"#
    ));
    assert!(!out.contains(r#"data-src="b.jpg""#));
}

#[test]
fn test_scripts_deferred_and_moved() {
    let opt = optimizer(Options::default());
    let head = concat!(
        "<title>t</title>",
        "<script>console.log( 1 );</script>",
        "<script type=\"application/ld+json\">{ \"a\": 1 }</script>",
    );
    let out = opt.optimize(&page(head, "<p>x</p>")).unwrap();

    assert!(out.contains(r#"<p>x</p><script type="deferjs">console.log(1)</script></body>"#));
    // data blocks stay where they are and are never deferred
    assert!(out.contains(r#"<script type="application/ld+json">{"a":1}</script></head>"#));
}

#[test]
fn test_third_party_stylesheet() {
    let opt = optimizer(Options::default());
    let head = concat!(
        "<title>t</title>",
        "<link rel=\"stylesheet\" href=\"https://www.youtube.com/s/player.css\">",
        "<link rel=\"stylesheet\" href=\"/site.css\">",
    );
    let out = opt.optimize_for_host(&page(head, ""), "example.com").unwrap();

    assert!(out.contains(concat!(
        r#"<link rel="stylesheet" href="https://www.youtube.com/s/player.css" data-media="all" media="print" "#,
        r#"onload="this.media=this.getAttribute('data-media')||'all'" class="defer-has-fallback">"#,
    )));
    assert!(out.contains(
        r#"<noscript><link rel="stylesheet" href="https://www.youtube.com/s/player.css"></noscript>"#
    ));
    assert!(out.contains(r#"<link rel="stylesheet" href="/site.css">"#));
    assert!(out.contains(r#"<link rel="preload" href="/site.css" as="style">"#));
}

#[test]
fn test_minification() {
    let opt = optimizer(Options::default());
    let head = "<title> t </title>\n<style>\n  body { color: #ff0000; }\n</style>\n<style> </style>";
    let out = opt
        .optimize(&page(head, "\n  <p>a  <b>b</b>\n c</p>\n  <pre> x  y </pre>\n"))
        .unwrap();

    assert!(out.contains("<style>body{color:red}</style>"));
    assert_eq!(out.matches("<style>").count(), 1);
    assert!(out.contains("<p>a <b>b</b> c</p><pre> x  y </pre>"));
    assert!(out.contains("<title>t</title>"));
}

#[test]
fn test_disabled_minification_keeps_whitespace() {
    let opt = optimizer(Options {
        minify_output_html: false,
        ..Options::default()
    });
    let out = opt
        .optimize(&page("<title>t</title>", "\n  <p>a  b</p>\n"))
        .unwrap();
    assert!(out.contains("\n  <p>a  b</p>\n"));
}

#[test]
fn test_splash_screen() {
    let opt = optimizer(Options {
        custom_splash_screen: "<div>loading</div>".into(),
        ..Options::default()
    });
    let out = opt.optimize(&page("<title>t</title>", "<p>x</p>")).unwrap();
    assert!(out.contains(r#"<body><div class="defer-splash"><div>loading</div></div><p>x</p>"#));
}

#[test]
fn test_custom_loader_unavailable() {
    let opt = optimizer(Options {
        deferjs_src: "https://cdn.test/missing.js".into(),
        ..Options::default()
    });
    assert!(matches!(
        opt.optimize(&page("", "")),
        Err(OptimizeError::LoaderUnavailable(_))
    ));
}

use newsletter_finder::classifier::{Classifier, Scope};
use newsletter_finder::page::{InMemoryPage, Page, PageSource};
use proptest::prelude::*;

use test_data::*;

fn page(html: &str) -> Page {
    Page::parse("https://example.com/page", html).unwrap()
}

fn classify(html: &str) -> bool {
    Classifier::new().unwrap().classify(&page(html))
}

#[test]
fn test_newsletter_box_scenario() {
    let classifier = Classifier::new().unwrap();
    let detection = classifier.detect(&page(NEWSLETTER_BOX)).unwrap();

    assert_eq!(detection.scope, Scope::Document);
    assert_eq!(detection.element, "div.newsletter-box");
    assert!(detection.signals.has_email_input);
    assert!(detection.signals.has_keyword);
}

#[test]
fn test_bare_login_form_is_negative() {
    assert!(!classify(LOGIN_FORM));
}

#[test]
fn test_search_form_is_negative() {
    assert!(!classify(SEARCH_FORM));
}

#[test]
fn test_keywords_without_email_input_are_negative() {
    assert!(!classify(KEYWORDS_WITHOUT_INPUT));
}

#[test]
fn test_plain_article_is_negative() {
    assert!(!classify(PLAIN_ARTICLE));
}

#[test]
fn test_platform_data_attribute_alone_is_enough() {
    let detection = Classifier::new().unwrap().detect(&page(PLATFORM_EMBED)).unwrap();
    assert!(detection.signals.is_platform_like);
    assert!(!detection.signals.has_keyword);
    assert!(!detection.signals.has_subscribe_button);
}

#[test]
fn test_platform_link_in_head() {
    let detection = Classifier::new().unwrap().detect(&page(PLATFORM_LINK)).unwrap();
    assert!(detection.signals.is_platform_like);
    assert!(!detection.signals.has_keyword);
}

#[test]
fn test_privacy_and_terms_count_as_platform() {
    let detection = Classifier::new().unwrap().detect(&page(PRIVACY_AND_TERMS)).unwrap();
    assert_eq!(detection.element, "aside");
    assert!(detection.signals.is_platform_like);
    assert!(!detection.signals.has_keyword);
}

#[test]
fn test_subscribe_button_value_alone_is_enough() {
    let detection = Classifier::new().unwrap().detect(&page(SUBSCRIBE_BUTTON_ONLY)).unwrap();
    assert!(detection.signals.has_subscribe_button);
    assert!(!detection.signals.has_keyword);
    assert!(!detection.signals.is_platform_like);
}

#[test]
fn test_russian_form() {
    let detection = Classifier::new().unwrap().detect(&page(RUSSIAN_FORM)).unwrap();
    assert_eq!(detection.element, "form.footer-form");
    assert!(detection.signals.has_keyword);
    assert!(detection.signals.has_subscribe_button);
}

#[test]
fn test_signal_beyond_five_levels_is_ignored() {
    assert!(!classify(SIGNAL_TOO_FAR));
}

#[test]
fn test_first_candidate_in_document_order_wins() {
    let html = r#"<html><body>
        <form class="first"><input type="email"><button>Subscribe</button></form>
        <div class="newsletter"><input type="email"><p>Newsletter</p></div>
    </body></html>"#;

    let detection = Classifier::new().unwrap().detect(&page(html)).unwrap();
    assert_eq!(detection.element, "form.first");
}

#[test]
fn test_isolated_subtree_is_scanned_when_main_tree_misses() {
    let live = InMemoryPage::new("https://widgets.example.com/", SHADOW_HOST);
    assert!(!Classifier::new().unwrap().classify(&live.snapshot().unwrap()));

    live.attach_shadow_root("widget-host", SHADOW_SIGNUP_FRAGMENT);
    let snapshot = live.snapshot().unwrap();
    let detection = Classifier::new().unwrap().detect(&snapshot).unwrap();

    let host = snapshot.element_by_id("widget-host").unwrap();
    assert_eq!(detection.scope, Scope::Shadow { host });
    assert_eq!(detection.element, "form.capture");
}

#[test]
fn test_nested_isolated_subtrees_are_not_searched() {
    let live = InMemoryPage::new("https://widgets.example.com/", SHADOW_HOST);
    live.attach_shadow_root("widget-host", SHADOW_OUTER_FRAGMENT);
    // "inner-host" only exists inside the outer isolated root
    live.attach_shadow_root("inner-host", SHADOW_SIGNUP_FRAGMENT);

    let snapshot = live.snapshot().unwrap();
    assert_eq!(snapshot.shadow_root_count(), 1);
    assert!(!Classifier::new().unwrap().classify(&snapshot));
}

#[test]
fn test_main_tree_match_reported_before_isolated_subtree() {
    let mut snapshot = page(&NEWSLETTER_BOX.replace("<main>", r#"<main><div id="w"></div>"#));
    let host = snapshot.element_by_id("w").unwrap();
    snapshot.attach_shadow_root(host, SHADOW_SIGNUP_FRAGMENT).unwrap();

    let detection = Classifier::new().unwrap().detect(&snapshot).unwrap();
    assert_eq!(detection.scope, Scope::Document);
}

#[test]
fn test_long_page_with_form_at_the_end() {
    assert!(classify(&page_with_sections(200)));
}

fn neutral_words() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            "account", "profile", "weather", "garden", "photo", "recipe", "travel", "music",
            "settings", "archive", "river", "lamp",
        ]),
        0..12,
    )
    .prop_map(|words| words.join(" "))
}

fn newsletter_words() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            "subscribe", "newsletter", "sign up", "join", "get updates", "email",
            "privacy policy", "terms of use", "подписка", "рассылка", "substack",
        ]),
        0..30,
    )
    .prop_map(|words| words.join(" "))
}

proptest! {
    #[test]
    fn prop_email_input_with_subscribe_control_is_positive(
        before in neutral_words(),
        after in neutral_words(),
        depth in 0usize..6,
    ) {
        let form = format!(
            "<form>{}<input type=\"email\"><button>Subscribe</button>{}</form>",
            before, after
        );
        let wrapped = (0..depth).fold(form, |inner, _| format!("<div>{}</div>", inner));
        let html = format!("<html><head><title>T</title></head><body>{}</body></html>", wrapped);

        prop_assert!(classify(&html));
    }

    #[test]
    fn prop_email_input_without_context_is_negative(
        label in neutral_words(),
        title in neutral_words(),
        class in prop::sample::select(vec!["box", "panel", "card", "login"]),
    ) {
        let html = format!(
            "<html><head><title>{}</title></head><body><form class=\"{}\"><label>{}</label><input type=\"email\"><button>Continue</button></form></body></html>",
            title, class, label
        );

        prop_assert!(!classify(&html));
    }

    #[test]
    fn prop_no_email_input_is_negative(text in newsletter_words()) {
        let html = format!(
            "<html><head><title>{}</title></head><body><section class=\"newsletter\"><p>{}</p><input type=\"text\" name=\"q\"><button>Subscribe</button></section></body></html>",
            text, text
        );

        prop_assert!(!classify(&html));
    }
}

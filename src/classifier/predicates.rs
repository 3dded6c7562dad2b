//! `select` predicates for the structural part of the scan.

use select::node::Node;
use select::predicate::Predicate;

use super::Patterns;

/// Broad query for elements that may hold a subscription form: forms, email
/// inputs, capture-styled divs, landmarks and overlays.
pub struct Candidate<'a>(pub &'a Patterns);

impl Predicate for Candidate<'_> {
    fn matches(&self, node: &Node) -> bool {
        match node.name() {
            Some("form") | Some("section") | Some("aside") => true,
            Some("input") if is_email_input(self.0, node, false) => true,
            Some("div") if class_matches(node, |class| self.0.capture_class.is_match(class)) => true,
            Some(_) => class_matches(node, |class| self.0.overlay_class.is_match(class)),
            None => false,
        }
    }
}

/// An input that takes an email address: `type=email`, or an email token in
/// the placeholder (and the name, when `match_name` is set).
pub struct EmailInput<'a> {
    pub patterns: &'a Patterns,
    pub match_name: bool,
}

impl Predicate for EmailInput<'_> {
    fn matches(&self, node: &Node) -> bool {
        node.name() == Some("input") && is_email_input(self.patterns, node, self.match_name)
    }
}

/// Anything a user can click to submit: buttons, `role=button`, submit
/// inputs and links.
pub struct ButtonLike;

impl Predicate for ButtonLike {
    fn matches(&self, node: &Node) -> bool {
        match node.name() {
            Some("button") | Some("a") => true,
            Some("input") => node
                .attr("type")
                .map_or(false, |kind| kind.eq_ignore_ascii_case("submit")),
            Some(_) => node.attr("role") == Some("button"),
            None => false,
        }
    }
}

pub fn is_type_email(node: &Node) -> bool {
    node.name() == Some("input")
        && node
            .attr("type")
            .map_or(false, |kind| kind.eq_ignore_ascii_case("email"))
}

fn is_email_input(patterns: &Patterns, node: &Node, match_name: bool) -> bool {
    if is_type_email(node) {
        return true;
    }

    let placeholder = node
        .attr("placeholder")
        .map_or(false, |value| patterns.email_token.is_match(value));

    placeholder
        || (match_name
            && node
                .attr("name")
                .map_or(false, |value| value.to_lowercase().contains("email")))
}

fn class_matches(node: &Node, test: impl Fn(&str) -> bool) -> bool {
    node.attr("class").map_or(false, test)
}

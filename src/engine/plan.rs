//! Step plans: the comparison form flow as data.
//!
//! The built-in plan covers the usual quote form (consent, postcode, address,
//! energy details, submit, results). A site with a different form is driven by
//! a JSON template instead: an array of steps in which `{placeholder}` tokens
//! are replaced with request values before parsing.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

use super::step::{ActionSpec, StepSpec};
use crate::extract::ExtractionProfile;
use crate::runner::ScrapeRequest;
use crate::session::LocatorStrategy;
use crate::session::locator::{css_string, lowered_text_expr, xpath_literal};
use crate::tariff::FuelType;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to read plan template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse plan template: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("plan template uses unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),

    #[error("plan has no steps")]
    Empty,
}

/// Names accepted inside `{...}` in a plan template
pub const PLACEHOLDERS: &[&str] = &[
    "postcode",
    "address_index",
    "fuel",
    "supplier",
    "payment",
    "ev",
    "email",
];

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([a-z_]+)\}").expect("BUG: hardcoded placeholder regex is invalid")
});

fn placeholder_value(name: &str, request: &ScrapeRequest) -> Option<String> {
    let value = match name {
        "postcode" => request.postcode.clone(),
        "address_index" => request.address_index.to_string(),
        "fuel" => request.fuel_type.form_value().to_string(),
        "supplier" => request.current_supplier.clone().unwrap_or_default(),
        "payment" => request.payment_method.form_value().to_string(),
        "ev" => request.ev_status.form_value().to_string(),
        "email" => request.email.clone().unwrap_or_default(),
        _ => return None,
    };
    Some(value)
}

/// Substitute placeholders and parse a JSON plan template
pub fn render_plan(template: &str, request: &ScrapeRequest) -> Result<Vec<StepSpec>, PlanError> {
    if let Some(unknown) = PLACEHOLDER_RE
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .find(|name| !PLACEHOLDERS.contains(&name.as_str()))
    {
        return Err(PlanError::UnknownPlaceholder(unknown.as_str().to_string()));
    }

    let rendered = PLACEHOLDER_RE.replace_all(template, |caps: &regex::Captures<'_>| {
        let value = placeholder_value(&caps[1], request).unwrap_or_default();
        // Placeholders sit inside JSON strings: escape, then drop the quotes
        let quoted = serde_json::Value::String(value).to_string();
        quoted[1..quoted.len() - 1].to_string()
    });

    let steps: Vec<StepSpec> = serde_json::from_str(&rendered)?;
    if steps.is_empty() {
        return Err(PlanError::Empty);
    }
    Ok(steps)
}

/// Read and render a plan template from disk
pub async fn load_plan(path: &Path, request: &ScrapeRequest) -> Result<Vec<StepSpec>, PlanError> {
    let template = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PlanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    render_plan(&template, request)
}

fn css_value_eq(tag: &str, attribute: &str, value: &str) -> LocatorStrategy {
    LocatorStrategy::css(format!("{tag}[{attribute}={}]", css_string(value)))
}

/// A button or link whose text contains every one of `words`, in any case
fn clickable_with_words(words: &[&str]) -> LocatorStrategy {
    let text = lowered_text_expr();
    let tests = words
        .iter()
        .map(|word| format!("contains({text}, {})", xpath_literal(word)))
        .collect::<Vec<_>>()
        .join(" and ");
    LocatorStrategy::xpath(format!("//*[self::button or self::a][{tests}]"))
}

/// The built-in comparison flow for `request`.
///
/// Only the postcode, submit and results steps are required; the rest fill
/// in details a form may or may not ask for.
#[must_use]
pub fn comparison_plan(request: &ScrapeRequest, profile: &ExtractionProfile) -> Vec<StepSpec> {
    let mut steps = Vec::with_capacity(10);

    steps.push(
        StepSpec::new("consent_and_start")
            .required(false)
            .action(
                ActionSpec::click(vec![
                    LocatorStrategy::id("onetrust-accept-btn-handler"),
                    LocatorStrategy::tag_text("button", "accept"),
                    LocatorStrategy::attribute(Some("button"), "class", "accept"),
                    LocatorStrategy::id("onetrust-reject-all-handler"),
                    LocatorStrategy::tag_text("button", "reject"),
                    LocatorStrategy::tag_text("button", "dismiss"),
                ])
                .optional()
                .max_wait_ms(5_000),
            )
            .action(
                ActionSpec::click(vec![
                    LocatorStrategy::tag_text("button", "start a quote"),
                    LocatorStrategy::tag_text("a", "start a quote"),
                    LocatorStrategy::attribute(Some("button"), "class", "start-quote"),
                    LocatorStrategy::attribute(Some("a"), "class", "start-quote"),
                    clickable_with_words(&["start", "quote"]),
                ])
                .optional()
                .max_wait_ms(10_000),
            )
            .post_step_delay(Duration::from_secs(3)),
    );

    let postcode_targets = vec![
        LocatorStrategy::id("postcode"),
        LocatorStrategy::name("postcode"),
        LocatorStrategy::css("input[placeholder*='postcode' i]"),
        LocatorStrategy::xpath("//input[contains(@name, 'postcode') or contains(@id, 'postcode')]"),
    ];
    steps.push(
        StepSpec::new("postcode")
            .action(ActionSpec::type_text(
                postcode_targets.clone(),
                request.postcode.clone(),
            ))
            .action(ActionSpec::press_key(postcode_targets, "Enter"))
            .post_step_delay(Duration::from_secs(3)),
    );

    steps.push(
        StepSpec::new("address")
            .required(false)
            .action(ActionSpec::select_index(
                vec![
                    LocatorStrategy::id("address"),
                    LocatorStrategy::name("address"),
                    LocatorStrategy::css("select[id*='address']"),
                ],
                request.address_index,
            ))
            .action(
                ActionSpec::click(vec![
                    LocatorStrategy::tag_text("button", "continue"),
                    LocatorStrategy::tag_text("button", "next"),
                ])
                .optional()
                .max_wait_ms(5_000),
            )
            .post_step_delay(Duration::from_secs(3)),
    );

    let fuel = request.fuel_type.form_value();
    let fuel_fragment = match request.fuel_type {
        FuelType::Electricity => "electric",
        _ => fuel,
    };
    steps.push(
        StepSpec::new("fuel_type").required(false).action(ActionSpec::click(vec![
            LocatorStrategy::id(format!("fuel-{fuel}")),
            css_value_eq("input", "value", fuel),
            LocatorStrategy::xpath(format!(
                "//input[@type='radio' and contains(@id, {})]",
                xpath_literal(fuel_fragment)
            )),
        ])),
    );

    if let Some(supplier) = request.current_supplier.as_deref().filter(|s| !s.is_empty()) {
        steps.push(
            StepSpec::new("current_supplier")
                .required(false)
                .action(ActionSpec::select_text(
                    vec![
                        LocatorStrategy::id("current-supplier"),
                        LocatorStrategy::name("current-supplier"),
                        LocatorStrategy::css("select[id*='supplier']"),
                    ],
                    supplier,
                )),
        );
    }

    let payment = request.payment_method.form_value();
    steps.push(
        StepSpec::new("payment_method").required(false).action(ActionSpec::click(vec![
            LocatorStrategy::id(format!("payment-{payment}")),
            LocatorStrategy::attribute(Some("input"), "value", payment),
            LocatorStrategy::xpath(format!(
                "//input[contains(@id, 'payment') and contains(@value, {})]",
                xpath_literal(payment)
            )),
        ])),
    );

    let ev = request.ev_status.form_value();
    steps.push(
        StepSpec::new("ev_status").required(false).action(ActionSpec::click(vec![
            LocatorStrategy::id(format!("has-ev-{ev}")),
            LocatorStrategy::css(format!("input[name='ev'][value={}]", css_string(ev))),
            LocatorStrategy::xpath(format!(
                "//input[contains(@name, 'ev') and @value={}]",
                xpath_literal(ev)
            )),
        ])),
    );

    if let Some(email) = request.email.as_deref().filter(|e| !e.is_empty()) {
        steps.push(StepSpec::new("email").required(false).action(ActionSpec::type_text(
            vec![
                LocatorStrategy::id("email"),
                LocatorStrategy::name("email"),
                LocatorStrategy::css("input[type='email']"),
            ],
            email,
        )));
    }

    steps.push(
        StepSpec::new("submit").action(ActionSpec::click(vec![
            LocatorStrategy::css("button[type='submit']"),
            LocatorStrategy::tag_text("button", "compare"),
            LocatorStrategy::tag_text("button", "get quotes"),
            LocatorStrategy::tag_text("button", "continue"),
            LocatorStrategy::tag_text("button", "submit"),
            LocatorStrategy::id("submit-btn"),
        ])),
    );

    steps.push(
        StepSpec::new("await_results").action(
            ActionSpec::await_visible(
                profile
                    .card
                    .iter()
                    .map(|selector| LocatorStrategy::css(selector.clone()))
                    .collect(),
            )
            .max_wait_ms(60_000),
        ),
    );

    steps
}

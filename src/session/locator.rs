//! Locator strategies and their lowering to CSS or XPath queries.
//!
//! An ordered `Vec<LocatorStrategy>` is a priority cascade: the resolver tries
//! each in turn and the first visible match wins.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One way of finding a form control
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum LocatorStrategy {
    /// Exact `id` attribute
    Id { value: String },
    /// Exact `name` attribute
    Name { value: String },
    /// Case-insensitive substring of the element's whitespace-normalised text.
    ///
    /// Without a tag the innermost element containing the text is matched, so
    /// `html` and `body` never win over the visible label.
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
        text: String,
    },
    /// Attribute whose value contains a substring, e.g. `class*="accept"`
    Attribute {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
        name: String,
        contains: String,
    },
    Css { selector: String },
    #[serde(rename = "xpath")]
    XPath { expr: String },
}

/// A strategy lowered to something a browser can evaluate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Css(String),
    XPath(String),
}

impl LocatorStrategy {
    pub fn id(value: impl Into<String>) -> Self {
        Self::Id {
            value: value.into(),
        }
    }

    pub fn name(value: impl Into<String>) -> Self {
        Self::Name {
            value: value.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            tag: None,
            text: text.into(),
        }
    }

    pub fn tag_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            tag: Some(tag.into()),
            text: text.into(),
        }
    }

    pub fn attribute(
        tag: Option<&str>,
        name: impl Into<String>,
        contains: impl Into<String>,
    ) -> Self {
        Self::Attribute {
            tag: tag.map(str::to_string),
            name: name.into(),
            contains: contains.into(),
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            selector: selector.into(),
        }
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath { expr: expr.into() }
    }

    /// Lower to a CSS selector or XPath expression with all values escaped
    #[must_use]
    pub fn to_query(&self) -> Query {
        match self {
            Self::Id { value } => Query::Css(format!("[id={}]", css_string(value))),
            Self::Name { value } => Query::Css(format!("[name={}]", css_string(value))),
            Self::Attribute {
                tag,
                name,
                contains,
            } => Query::Css(format!(
                "{}[{}*={}]",
                tag.as_deref().unwrap_or(""),
                name,
                css_string(contains)
            )),
            Self::Css { selector } => Query::Css(selector.clone()),
            Self::XPath { expr } => Query::XPath(expr.clone()),
            Self::Text { tag, text } => {
                let needle = xpath_literal(&text.to_lowercase());
                let matches = format!("contains({}, {needle})", lowered_text_expr());
                match tag {
                    Some(tag) => Query::XPath(format!("//{tag}[{matches}]")),
                    None => Query::XPath(format!(
                        "//*[{matches}][not(*[{matches}])]"
                    )),
                }
            }
        }
    }
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id { value } => write!(f, "id={value}"),
            Self::Name { value } => write!(f, "name={value}"),
            Self::Text { tag: Some(tag), text } => write!(f, "{tag} text~'{text}'"),
            Self::Text { tag: None, text } => write!(f, "text~'{text}'"),
            Self::Attribute {
                tag,
                name,
                contains,
            } => write!(f, "{}[{name}*='{contains}']", tag.as_deref().unwrap_or("")),
            Self::Css { selector } => write!(f, "css={selector}"),
            Self::XPath { expr } => write!(f, "xpath={expr}"),
        }
    }
}

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";

/// XPath 1.0 has no `lower-case()`; `translate()` covers ASCII
pub(crate) fn lowered_text_expr() -> String {
    format!("translate(normalize-space(string(.)), '{UPPER}', '{LOWER}')")
}

/// Quote a string as a CSS attribute value
#[must_use]
pub fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\A "),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Quote a string as an XPath 1.0 literal.
///
/// XPath literals cannot escape quotes, so a value holding both kinds is
/// split into `concat()` pieces.
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

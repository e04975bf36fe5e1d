//! Property Formatting
//!
//! Property name hyphenation, value text, and selector helpers.

use crate::declarations::Value;

/// Properties that take bare numbers
const UNITLESS: &[&str] = &[
    "animation-iteration-count",
    "border-image-outset",
    "border-image-slice",
    "border-image-width",
    "box-flex",
    "box-flex-group",
    "box-ordinal-group",
    "column-count",
    "columns",
    "counter-increment",
    "counter-reset",
    "flex",
    "flex-grow",
    "flex-positive",
    "flex-shrink",
    "flex-negative",
    "flex-order",
    "font-weight",
    "grid-area",
    "grid-column",
    "grid-column-end",
    "grid-column-span",
    "grid-column-start",
    "grid-row",
    "grid-row-end",
    "grid-row-span",
    "grid-row-start",
    "line-clamp",
    "line-height",
    "opacity",
    "order",
    "orphans",
    "tab-size",
    "widows",
    "z-index",
    "zoom",
    // SVG
    "fill-opacity",
    "flood-opacity",
    "stop-opacity",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-miterlimit",
    "stroke-opacity",
    "stroke-width",
];

const VENDOR_PREFIXES: &[&str] = &["-webkit-", "-ms-", "-moz-", "-o-"];

/// Characters escaped when an id is used inside a selector
const ESCAPED: &str = " !#$%&()*+,./;<=>?@[]^`{|}~\"'\\";

/// `backgroundColor` -> `background-color`, `msTransform` -> `-ms-transform`
pub fn hyphenate(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    if out.starts_with("ms-") {
        out.insert(0, '-');
    }
    out
}

/// Whether numbers for `name` are written without `px`
pub fn is_unitless(name: &str) -> bool {
    let base = VENDOR_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name);
    UNITLESS.contains(&base)
}

/// Number text as a script engine would print it
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        // Shortest digits in exponent form, with an explicit `+`
        let text = format!("{:e}", n);
        match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => text,
        }
    } else {
        n.to_string()
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.clone(),
        Value::List(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
    }
}

/// Render one `name:value` pair
pub(crate) fn style_to_string(name: &str, value: &Value) -> String {
    match value {
        Value::Number(n) if *n != 0.0 && !is_unitless(name) => {
            format!("{}:{}px", name, format_number(*n))
        }
        _ => format!("{}:{}", name, value_text(value)),
    }
}

/// Join sorted properties into canonical declaration text.
///
/// Lists expand into one declaration per truthy item, in list order.
pub(crate) fn stringify_properties(properties: &[(String, &Value)]) -> String {
    let mut parts = Vec::with_capacity(properties.len());
    for (name, value) in properties {
        match value {
            Value::List(items) => parts.extend(
                items
                    .iter()
                    .filter(|item| item.is_truthy())
                    .map(|item| style_to_string(name, item)),
            ),
            _ => parts.push(style_to_string(name, value)),
        }
    }
    parts.join(";")
}

/// Resolve `selector` against `parent`: every `&` becomes the parent,
/// otherwise the selector is a descendant of it.
pub fn interpolate(selector: &str, parent: &str) -> String {
    if selector.contains('&') {
        selector.replace('&', parent)
    } else {
        format!("{} {}", parent, selector)
    }
}

/// Escape an identifier for use in a selector
pub fn escape(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for c in id.chars() {
        if ESCAPED.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

//! Extraction of `{{...}}` references from node configurations.
//!
//! The template syntax is a contract shared with the backend executor: a
//! reference is the literal `{{` + path + `}}`, matched by `\{\{([^}]+)\}\}`.
//! A path may be a dotted chain (`nodes.<id>.<field>`, `var.<name>`,
//! `input.<name>`) or a bare key.

use crate::flow::InputVariable;
use indexmap::IndexSet;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref TEMPLATE_RE: Regex = Regex::new(r"\{\{([^}]+)\}\}").expect("template pattern");
}

/// The first `{{...}}` reference in a single expression string, trimmed,
/// full path preserved.
pub fn expression_key(expression: &str) -> Option<String> {
    TEMPLATE_RE
        .captures(expression)
        .map(|captures| captures[1].trim().to_string())
}

/// Walks an arbitrary JSON value and collects every referenced name, reduced
/// to its last dot-segment (`{{input.userId}}` yields `userId`). Results are
/// deduplicated in first-seen order. Non-string scalars are ignored.
pub fn extract_references(value: &Value) -> Vec<String> {
    let mut seen = IndexSet::new();
    walk(value, &mut |path| {
        let name = path.rsplit('.').next().unwrap_or(path).trim();
        if !name.is_empty() {
            seen.insert(name.to_string());
        }
    });
    seen.into_iter().collect()
}

/// Same walk as [`extract_references`], but keeps the full dotted paths.
/// Internal catalog lookups must not truncate.
pub fn extract_reference_paths(value: &Value) -> Vec<String> {
    let mut seen = IndexSet::new();
    walk(value, &mut |path| {
        seen.insert(path.to_string());
    });
    seen.into_iter().collect()
}

fn walk(value: &Value, visit: &mut impl FnMut(&str)) {
    match value {
        Value::String(text) => {
            for captures in TEMPLATE_RE.captures_iter(text) {
                visit(captures[1].trim());
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, visit);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                walk(item, visit);
            }
        }
        // Numbers, booleans and null cannot hold references.
        _ => {}
    }
}

/// Filters the Start node's declared inputs down to the ones a node
/// configuration actually references. Drives the debug-execution input form.
pub fn required_inputs<'a>(
    config: &Value,
    start_inputs: &'a [InputVariable],
) -> Vec<&'a InputVariable> {
    let referenced = extract_references(config);
    start_inputs
        .iter()
        .filter(|input| referenced.iter().any(|name| *name == input.name))
        .collect()
}

//! `${key}` placeholder rendering.

use std::collections::BTreeMap;

pub fn placeholder(key: &str) -> String {
    format!("${{{}}}", key)
}

/// Replace every `${key}` occurrence for each key in `variables`.
/// Tokens without a matching key are left as they are.
pub fn render_map(template: &str, variables: &BTreeMap<String, String>) -> String {
    let mut result = template.to_string();

    for (key, value) in variables {
        result = result.replace(&placeholder(key), value);
    }

    result
}

//! Package.json `exports` evaluation.
//!
//! Conditions are matched in the order the package author wrote them: the
//! first key that is in the active condition set wins, as Node does. This
//! relies on `serde_json`'s `preserve_order` feature.
//!
//! Supported shapes:
//! - `exports: "./index.js"`
//! - `exports: { ".": ..., "./sub": ..., "./features/*": ... }`
//! - `exports: { "require": ..., "default": ... }` (root conditions)
//! - nested condition objects and fallback arrays

use serde_json::{Map, Value};

/// Conditions active for a CommonJS `require`.
pub const REQUIRE_CONDITIONS: &[&str] = &["require", "node", "default"];

/// Resolve the root (`"."`) export.
///
/// Returns the target (starting with `./`) or `None` when `exports` is
/// absent or has no matching entry.
#[must_use]
pub fn exports_root(pkg_json: &Value, conditions: &[&str]) -> Option<String> {
    let exports = pkg_json.get("exports")?;

    match exports {
        Value::Object(obj) if has_subpath_keys(obj) => {
            obj.get(".").and_then(|t| match_target(t, conditions))
        }
        other => match_target(other, conditions),
    }
}

/// Resolve a subpath export. `subpath` must be in `./feature` form.
///
/// Exact keys beat pattern keys; among patterns the longest prefix wins.
#[must_use]
pub fn exports_subpath(pkg_json: &Value, subpath: &str, conditions: &[&str]) -> Option<String> {
    if !subpath.starts_with("./") {
        return None;
    }

    let obj = pkg_json.get("exports")?.as_object()?;
    if !has_subpath_keys(obj) {
        return None;
    }

    if let Some(target) = obj.get(subpath) {
        return match_target(target, conditions);
    }

    let mut best: Option<(&str, &Value, &str)> = None;
    for (key, value) in obj {
        let Some(star) = key.find('*') else {
            continue;
        };
        if key[star + 1..].contains('*') {
            continue;
        }
        let Some(matched) = match_pattern(key, star, subpath) else {
            continue;
        };
        let better = best.map_or(true, |(current, _, _)| key.len() > current.len());
        if better {
            best = Some((key.as_str(), value, matched));
        }
    }

    let (_, target, matched) = best?;
    let target = match_target(target, conditions)?;
    substitute_star(&target, matched)
}

/// Whether the exports object uses subpath keys rather than root conditions.
fn has_subpath_keys(obj: &Map<String, Value>) -> bool {
    obj.keys().any(|k| k.starts_with('.'))
}

/// Match a single-`*` pattern key against a subpath, returning the `*` value.
fn match_pattern<'a>(key: &str, star: usize, subpath: &'a str) -> Option<&'a str> {
    let prefix = &key[..star];
    let suffix = &key[star + 1..];

    if !subpath.starts_with(prefix) || !subpath.ends_with(suffix) {
        return None;
    }
    if subpath.len() < prefix.len() + suffix.len() {
        return None;
    }

    let matched = &subpath[prefix.len()..subpath.len() - suffix.len()];
    (!matched.is_empty()).then_some(matched)
}

fn substitute_star(target: &str, matched: &str) -> Option<String> {
    let result = target.replace('*', matched);
    if result.split('/').any(|segment| segment == "..") {
        return None;
    }
    validate_target(&result)
}

/// Evaluate a target: string, fallback array or conditions object.
fn match_target(target: &Value, conditions: &[&str]) -> Option<String> {
    match target {
        Value::String(s) => validate_target(s),
        Value::Array(items) => items.iter().find_map(|item| match_target(item, conditions)),
        Value::Object(obj) => obj
            .iter()
            .filter(|(key, _)| conditions.contains(&key.as_str()))
            .find_map(|(_, value)| match_target(value, conditions)),
        _ => None,
    }
}

/// Export targets must be package-relative (`./...`).
fn validate_target(path: &str) -> Option<String> {
    path.starts_with("./").then(|| path.to_string())
}

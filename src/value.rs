//! The runtime value model (§3) and path navigation (§4.3).
//!
//! A [`MetaValue`] is what a [`crate::provider::Provider`] returns from a
//! lookup. `Null` and an empty `List` are distinct at that boundary (a
//! provider can tell "no such field" from "field present but empty"), but
//! both count as "no value" once truthiness/defaulting (§4.6) takes over.

use crate::config::LocaleNames;
use crate::datetime::Instant;
use std::path::Path;

/// A provider's raw answer to a `(name, subfield)` lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    /// The field is not defined for this file.
    Null,
    /// An ordered, possibly empty, list of strings. A scalar is modeled
    /// as a one-element list.
    List(Vec<String>),
    /// A point in time, not yet flattened to strings. Must pass through
    /// [`MetaValue::resolve_path`] before it reaches a filter, a
    /// find/replace pair or the output (§3 invariant).
    DateTime(Instant),
}

impl MetaValue {
    /// Convenience constructor for a single scalar string.
    pub fn scalar(s: impl Into<String>) -> Self {
        MetaValue::List(vec![s.into()])
    }

    /// Applies a `.attr` path chain, resolving `DateTime` to `List` via
    /// the fixed attribute table (§4.3) and re-applying filesystem-path
    /// leaves (`name`, `stem`, `suffix`, `parent`) on `List` values.
    ///
    /// `strftime` is handled by the caller (it needs the default branch,
    /// which isn't available here), so a bare `.strftime` leaf with no
    /// following attribute is left as a `DateTime` pass-through; the
    /// renderer special-cases it before calling this function for the
    /// remaining path elements.
    pub fn resolve_path(self, path: &[String], locale: &LocaleNames) -> PathResolution {
        let mut current = self;
        for (i, attr) in path.iter().enumerate() {
            match current {
                MetaValue::DateTime(instant) => {
                    if attr == "strftime" {
                        return PathResolution::Strftime {
                            instant,
                            remaining: path[i + 1..].to_vec(),
                        };
                    }
                    match crate::datetime::resolve_attr(instant, attr, locale) {
                        Some(s) => current = MetaValue::scalar(s),
                        None => return PathResolution::Error(attr.clone()),
                    }
                }
                MetaValue::List(items) => {
                    let resolved: Option<Vec<String>> = items
                        .iter()
                        .map(|s| resolve_path_leaf(s, attr))
                        .collect();
                    match resolved {
                        Some(items) => current = MetaValue::List(items),
                        None => return PathResolution::Error(attr.clone()),
                    }
                }
                MetaValue::Null => {
                    // Path navigation on an absent value stays absent;
                    // there is nothing to be wrong about.
                    current = MetaValue::Null;
                }
            }
        }
        PathResolution::Value(current)
    }

    /// Flattens `self` to a `Vec<String>`, treating `Null` as the empty
    /// list and resolving any un-pathed `DateTime` via its `date` leaf
    /// (the only sensible default string form for a bare datetime field).
    pub fn into_list(self) -> Vec<String> {
        match self {
            MetaValue::Null => Vec::new(),
            MetaValue::List(items) => items,
            MetaValue::DateTime(instant) => {
                // The `date` leaf never consults locale-dependent names, so
                // a bare datetime field (no `.attr` chain) can fall back to
                // the default locale regardless of what the caller uses
                // elsewhere.
                vec![crate::datetime::resolve_attr(instant, "date", &LocaleNames::default())
                    .unwrap_or_default()]
            }
        }
    }

    /// Truthiness without an explicit conditional (§4.6 point 2): `true`
    /// iff the list is non-empty and not all-empty-strings.
    pub fn is_truthy(&self) -> bool {
        match self {
            MetaValue::Null => false,
            MetaValue::DateTime(_) => true,
            MetaValue::List(items) => items.iter().any(|s| !s.is_empty()),
        }
    }
}

/// The result of applying one more `.attr` step.
pub enum PathResolution {
    Value(MetaValue),
    /// `strftime` was reached; the renderer must supply the format
    /// template (the field's default branch) and finish the chain.
    Strftime {
        instant: Instant,
        remaining: Vec<String>,
    },
    /// The leaf is not in the attribute table for this value's type.
    Error(String),
}

/// Filesystem-path leaves shared by any `List` value that represents a
/// path (`filepath` and its `.parent` chains, per §4.3).
fn resolve_path_leaf(value: &str, attr: &str) -> Option<String> {
    let p = Path::new(value);
    Some(match attr {
        "name" => p.file_name()?.to_string_lossy().into_owned(),
        "stem" => p.file_stem()?.to_string_lossy().into_owned(),
        // Decision: follows `std::path::Path::extension()` (no leading dot),
        // not Python `pathlib.Path.suffix` (which keeps it) — this crate
        // takes `std::path` as its path authority throughout, matching the
        // teacher's own bare-`std::path` leaf resolution in
        // `tpnote-lib/src/filename.rs`.
        "suffix" => p.extension()?.to_string_lossy().into_owned(),
        "parent" => p
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default(),
        _ => return None,
    })
}

/// Coerces a string to a number if it parses cleanly as one, for the
/// comparison operators' "both-parseable-as-number ⇒ numeric, otherwise
/// lexicographic" rule (§4.6, resolved Open Question OQ-b).
pub fn as_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

/// Normalizes a filesystem path to a `String`, used by the built-in
/// `filepath` provider.
pub fn path_to_string(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

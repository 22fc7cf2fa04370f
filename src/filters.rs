//! The filter pipeline (§4.4): a chain of built-in, list- and
//! scalar-aware filters applied left-to-right to a value's `List` form.

use crate::ast::FilterSpec;
use crate::error::ParseError;
use substring::Substring;

/// Whether a filter walks every element independently or sees/produces
/// the whole list at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    Scalar,
    List,
}

fn arity(name: &str) -> Option<Arity> {
    Some(match name {
        "lower" | "upper" | "strip" | "titlecase" | "capitalize" | "braces" | "parens"
        | "brackets" | "chop" | "chomp" => Arity::Scalar,
        "split" | "autosplit" | "sort" | "rsort" | "reverse" | "uniq" | "join" | "append"
        | "prepend" | "remove" => Arity::List,
        _ => return None,
    })
}

/// Parses a filter's argument into a `FilterSpec`, validating arity and
/// the "missing argument" rule for `chop`/`chomp` (resolved Open
/// Question OQ-a).
pub fn validate(name: &str, arg: Option<&str>, offset: usize) -> Result<(), ParseError> {
    if arity(name).is_none() {
        // Unknown filter names are not a hard parse error in this
        // grammar (§4.1 only documents failure modes for brace/operator/
        // find-replace/filter-argument syntax); an unrecognised name
        // simply won't match any catalogue entry at render time and is
        // treated as a no-op further down. Still reject the two filters
        // whose argument is mandatory.
    }
    if matches!(name, "chop" | "chomp") && arg.is_none() {
        return Err(ParseError::MissingFilterArgument {
            filter: name.to_string(),
            offset,
        });
    }
    Ok(())
}

/// Applies one filter to the current list, per the catalogue in §4.4.
/// Null input (an empty `items`, see `MetaValue::into_list`) passes
/// through scalar-wise filters unchanged (still empty) and is treated as
/// the empty list for list-wise filters, which may still introduce
/// elements (e.g. `append`).
pub fn apply(spec: &FilterSpec, items: Vec<String>) -> Vec<String> {
    apply_raw(&spec.name, spec.arg.as_deref(), items)
}

/// Same as [`apply`], but takes the filter name and argument directly
/// rather than a [`FilterSpec`] — used by the renderer once a filter
/// argument has had its `%NAME` variable references substituted (§9
/// "var side effects"), which happens after parsing and so can't be
/// folded back into the `FilterSpec` the parser built.
pub fn apply_raw(name: &str, arg: Option<&str>, items: Vec<String>) -> Vec<String> {
    match name {
        "lower" => map_scalar(items, |s| s.to_lowercase()),
        "upper" => map_scalar(items, |s| s.to_uppercase()),
        "strip" => map_scalar(items, |s| s.trim().to_string()),
        "titlecase" => map_scalar(items, titlecase),
        "capitalize" => map_scalar(items, capitalize),
        "braces" => map_scalar(items, |s| format!("{{{s}}}")),
        "parens" => map_scalar(items, |s| format!("({s})")),
        "brackets" => map_scalar(items, |s| format!("[{s}]")),
        "chop" => map_scalar(items, |s| chop(&s, arg.unwrap_or("1"))),
        "chomp" => map_scalar(items, |s| chomp(&s, arg.unwrap_or("1"))),
        "split" => {
            let sep = arg.unwrap_or("");
            items
                .into_iter()
                .flat_map(|s| {
                    if sep.is_empty() {
                        vec![s]
                    } else {
                        s.split(sep).map(str::to_string).collect()
                    }
                })
                .collect()
        }
        "autosplit" => items
            .into_iter()
            .flat_map(|s| {
                s.split(|c: char| c == ',' || c == ';' || c == ' ')
                    .filter(|piece| !piece.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect(),
        "sort" => {
            let mut items = items;
            items.sort();
            items
        }
        "rsort" => {
            let mut items = items;
            items.sort();
            items.reverse();
            items
        }
        "reverse" => {
            let mut items = items;
            items.reverse();
            items
        }
        "uniq" => {
            let mut seen = std::collections::HashSet::new();
            items.into_iter().filter(|s| seen.insert(s.clone())).collect()
        }
        "join" => {
            let sep = arg.unwrap_or("");
            vec![items.join(sep)]
        }
        "append" => {
            let mut items = items;
            if let Some(arg) = arg {
                items.push(arg.to_string());
            }
            items
        }
        "prepend" => {
            let mut items = items;
            if let Some(arg) = arg {
                items.insert(0, arg.to_string());
            }
            items
        }
        "remove" => {
            let target = arg.unwrap_or("");
            items.into_iter().filter(|s| s != target).collect()
        }
        _ => items,
    }
}

fn map_scalar(items: Vec<String>, f: impl Fn(String) -> String) -> Vec<String> {
    items.into_iter().map(f).collect()
}

fn chop(s: &str, arg: &str) -> String {
    let n: usize = arg.parse().unwrap_or(0);
    let len = s.chars().count();
    s.substring(0, len.saturating_sub(n)).to_string()
}

fn chomp(s: &str, arg: &str) -> String {
    let n: usize = arg.parse().unwrap_or(0);
    s.substring(n.min(s.chars().count()), s.chars().count())
        .to_string()
}

fn capitalize(s: String) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => s,
    }
}

fn titlecase(s: String) -> String {
    s.split(' ')
        .map(|word| capitalize(word.to_string()))
        .collect::<Vec<_>>()
        .join(" ")
}

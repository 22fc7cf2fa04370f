//! The render-local variable environment (§4.7, §9 "`var` side
//! effects"): `{var:NAME,VALUE}` bindings and `%NAME`/`%%` substitution.
//!
//! Binding happens during render, not parse, because `VALUE` is a
//! template evaluated against metadata that is only known once a file
//! is being rendered. A fresh `Variables` is created per render (§3
//! Lifecycle) and is never shared across files.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Variables {
    bindings: HashMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`, overwriting any prior binding — later
    /// `{var:...}` occurrences in the same render win, matching the
    /// left-to-right evaluation order required by §9.
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.bindings.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }
}

/// Textually substitutes `%NAME` references in `raw` with their bound
/// values, and collapses `%%` to a literal `%`, in one left-to-right
/// scan. An unbound `%NAME` is left as literal text (there is no
/// "undefined variable" error in this grammar — only a missing binding).
///
/// Applies to literal pretext/posttext and filter arguments (§4.7); the
/// other templated positions (conditional value, default, bool branch,
/// find/replace's `replace`) are already parsed as sub-`Template`s and
/// so never reach this function — `%NAME` there is resolved by parsing
/// `{%NAME}` as an ordinary field instead (see `render::resolve_field`).
pub fn substitute(raw: &str, vars: &Variables) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '%' {
            if let Some(&(_, '%')) = chars.peek() {
                chars.next();
                out.push('%');
                continue;
            }
            let name_start = i + 1;
            let mut name_end = name_start;
            for (j, nc) in raw[name_start..].char_indices() {
                if nc.is_ascii_alphanumeric() || nc == '_' {
                    name_end = name_start + j + nc.len_utf8();
                } else {
                    break;
                }
            }
            if name_end > name_start {
                let name = &raw[name_start..name_end];
                match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('%');
                        out.push_str(name);
                    }
                }
                for _ in name_start..name_end {
                    chars.next();
                }
                continue;
            }
            out.push('%');
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_percent_is_a_literal_percent() {
        let vars = Variables::new();
        assert_eq!(substitute("100%%", &vars), "100%");
    }

    #[test]
    fn var_ref_substitutes_bound_value() {
        let mut vars = Variables::new();
        vars.bind("pipe", "|");
        assert_eq!(substitute("a%pipeb", &vars), "a|b");
    }

    #[test]
    fn scenario_g_find_replace_uses_bound_pipe() {
        let mut vars = Variables::new();
        vars.bind("pipe", "|");
        assert_eq!(substitute("%pipe", &vars), "|");
    }

    #[test]
    fn unbound_variable_is_left_literal() {
        let vars = Variables::new();
        assert_eq!(substitute("%nope", &vars), "%nope");
    }

    #[test]
    fn escaped_percent_before_a_real_reference_does_not_consume_it() {
        let mut vars = Variables::new();
        vars.bind("x", "Y");
        assert_eq!(substitute("%%%x", &vars), "%Y");
    }

    #[test]
    fn later_binding_overwrites_earlier_one() {
        let mut vars = Variables::new();
        vars.bind("x", "first");
        vars.bind("x", "second");
        assert_eq!(vars.get("x"), Some("second"));
    }
}

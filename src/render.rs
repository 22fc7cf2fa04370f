//! The renderer (§4.7): walks a parsed [`Template`]'s segments left to
//! right, maintaining an ordered accumulator of output strings, calling
//! out to the provider registry, the filter pipeline, the find/replace
//! engine and the conditional evaluator as it goes.
//!
//! A [`Renderer`] borrows an immutable [`ProviderRegistry`] and is
//! itself cheap and short-lived: one per render, a fresh [`Variables`]
//! environment each time (§3 Lifecycle, §5 Concurrency).

use crate::ast::{Field, Op, Segment, Template};
use crate::config::RENDER_CFG;
use crate::conditional;
use crate::error::RenderError;
use crate::filters;
use crate::findreplace;
use crate::provider::{FileContext, ProviderPolicy, ProviderRegistry};
use crate::value::{MetaValue, PathResolution};
use crate::variables::{self, Variables};
use itertools::iproduct;

/// Evaluates parsed templates against a [`ProviderRegistry`] and a
/// per-file [`FileContext`].
pub struct Renderer<'a> {
    registry: &'a ProviderRegistry,
}

impl<'a> Renderer<'a> {
    pub fn new(registry: &'a ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Renders `template` for one file, returning the ordered list of
    /// fully rendered output strings (§3 invariant: never empty).
    ///
    /// ```
    /// use mtl::config::RENDER_CFG;
    /// use mtl::parser::parse;
    /// use mtl::provider::{FileContext, ProviderRegistry};
    /// use mtl::render::Renderer;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let registry = ProviderRegistry::new();
    /// let ctx = FileContext::new("/music/song.mp3", Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    /// let tmpl = parse("{filepath.name}").unwrap();
    /// let out = Renderer::new(&registry).render(&tmpl, &ctx).unwrap();
    /// assert_eq!(out, vec!["song.mp3".to_string()]);
    /// # let _ = &RENDER_CFG;
    /// ```
    pub fn render(&self, template: &Template, ctx: &FileContext) -> Result<Vec<String>, RenderError> {
        let mut vars = Variables::new();
        self.render_template(template, ctx, &mut vars)
    }

    /// Renders `template` against an already-populated variable
    /// environment; used both for the top-level render and for every
    /// recursively nested sub-template (conditional RHS, bool/default
    /// branches, find/replace values, `strftime` formats).
    fn render_template(
        &self,
        template: &Template,
        ctx: &FileContext,
        vars: &mut Variables,
    ) -> Result<Vec<String>, RenderError> {
        let mut acc: Vec<String> = vec![String::new()];
        for segment in &template.segments {
            match segment {
                Segment::Literal(text) => {
                    let substituted = variables::substitute(text, vars);
                    for a in acc.iter_mut() {
                        a.push_str(&substituted);
                    }
                }
                Segment::Field(field) => {
                    let values = self.render_field(field, ctx, vars)?;
                    if field.in_place {
                        let joined = values.join(field.delim.as_deref().unwrap_or(""));
                        for a in acc.iter_mut() {
                            a.push_str(&joined);
                        }
                    } else {
                        acc = iproduct!(acc.iter(), values.iter())
                            .map(|(a, v)| format!("{a}{v}"))
                            .collect();
                    }
                }
            }
        }
        Ok(acc)
    }

    /// Resolves one `{...}` field to its result list `F` (§4.7), before
    /// in-place collapsing or Cartesian expansion is applied by the
    /// caller. Always returns at least one element.
    fn render_field(
        &self,
        field: &Field,
        ctx: &FileContext,
        vars: &mut Variables,
    ) -> Result<Vec<String>, RenderError> {
        match field.name.as_str() {
            "var" => self.render_var(field, ctx, vars),
            "strip" => self.render_strip(field, ctx, vars),
            "format" => self.render_format(field, ctx, vars),
            _ => self.render_ordinary(field, ctx, vars),
        }
    }

    /// `{var:NAME,VALUE}` (§4.7): binds `NAME` to the rendered `VALUE`
    /// as a side effect and contributes nothing to the output.
    ///
    /// `VALUE` is itself template-valued and may in principle render to
    /// more than one string; there is no documented Cartesian semantics
    /// for a variable binding, so multiple candidates are joined with
    /// the empty string before binding (a design call, `SPEC_FULL.md`
    /// Open Question OQ-5 sibling, recorded in `DESIGN.md`).
    fn render_var(&self, field: &Field, ctx: &FileContext, vars: &mut Variables) -> Result<Vec<String>, RenderError> {
        let name = field.subfield.clone().unwrap_or_default();
        let value = match &field.default_branch {
            Some(tmpl) => self.render_template(tmpl, ctx, vars)?.join(""),
            None => String::new(),
        };
        log::trace!("var binding: {name}={value:?}");
        vars.bind(name, value);
        Ok(vec![String::new()])
    }

    /// `{strip,TEMPLATE}` (§4.7): renders `TEMPLATE` and trims
    /// surrounding whitespace from every resulting element.
    fn render_strip(&self, field: &Field, ctx: &FileContext, vars: &mut Variables) -> Result<Vec<String>, RenderError> {
        let rendered = match &field.default_branch {
            Some(tmpl) => self.render_template(tmpl, ctx, vars)?,
            None => return Ok(vec![self.null_sentinel()]),
        };
        Ok(rendered.into_iter().map(|s| s.trim().to_string()).collect())
    }

    /// `{format:TYPE:FORMAT,TEMPLATE}` (§4.7): renders `TEMPLATE`,
    /// coerces each element to `TYPE` and applies the Python-style
    /// format spec `FORMAT` (`crate::pyformat`).
    fn render_format(&self, field: &Field, ctx: &FileContext, vars: &mut Variables) -> Result<Vec<String>, RenderError> {
        let subfield = field.subfield.as_deref().unwrap_or("");
        let (ty, spec) = subfield.split_once(':').unwrap_or((subfield, ""));
        let rendered = match &field.default_branch {
            Some(tmpl) => self.render_template(tmpl, ctx, vars)?,
            None => return Ok(vec![self.null_sentinel()]),
        };
        Ok(rendered
            .into_iter()
            .map(|s| crate::pyformat::format_value(ty, spec, &s))
            .collect())
    }

    /// A `%NAME`-as-field-reference or a registry-dispatched provider
    /// field, carried through path navigation, filters, find/replace and
    /// conditional/default branching (§4.2–§4.6).
    fn render_ordinary(
        &self,
        field: &Field,
        ctx: &FileContext,
        vars: &mut Variables,
    ) -> Result<Vec<String>, RenderError> {
        let value = self.lookup(field, ctx, vars)?;
        let value = self.resolve_path(field, value, ctx, vars)?;

        let mut items = value.into_list();
        for spec in &field.filters {
            let arg = spec.arg.as_ref().map(|a| variables::substitute(a, vars));
            items = filters::apply_raw(&spec.name, arg.as_deref(), items);
        }

        for (find, replace_tmpl) in &field.replacements {
            let replace = self.render_template(replace_tmpl, ctx, vars)?.join("");
            items = findreplace::apply_pair(items, find, &replace);
        }

        self.branch(field, items, ctx, vars)
    }

    /// `{%NAME}` resolves to the bound variable, treated as a
    /// single-element list (§9 "var side effects"); everything else
    /// dispatches through the provider registry.
    fn lookup(&self, field: &Field, ctx: &FileContext, vars: &Variables) -> Result<MetaValue, RenderError> {
        if let Some(name) = field.name.strip_prefix('%') {
            return Ok(match vars.get(name) {
                Some(v) => MetaValue::scalar(v),
                None => MetaValue::Null,
            });
        }
        match self.registry.lookup(&field.name, field.subfield.as_deref(), ctx) {
            None => Err(RenderError::UnknownField {
                name: field.name.clone(),
                span: field.span,
            }),
            Some(Ok(value)) => Ok(value),
            Some(Err(failure)) => {
                let policy = self.registry.policy(&field.name).unwrap_or_default();
                match policy {
                    ProviderPolicy::Hard => Err(RenderError::Provider {
                        name: field.name.clone(),
                        span: field.span,
                        source: failure.0,
                    }),
                    ProviderPolicy::Soft => {
                        log::debug!("provider {:?} failed, degrading to Null: {failure}", field.name);
                        Ok(MetaValue::Null)
                    }
                }
            }
        }
    }

    /// Applies the field's `.attr` path (§4.3), special-casing
    /// `strftime` (which consumes the default branch as its format
    /// template) and an unrecognised leaf (a `TypeError`, §7: logged and
    /// degraded to `Null` rather than aborting the render).
    fn resolve_path(
        &self,
        field: &Field,
        value: MetaValue,
        ctx: &FileContext,
        vars: &mut Variables,
    ) -> Result<MetaValue, RenderError> {
        let locale = RENDER_CFG.read().locale.clone();
        match value.resolve_path(&field.path, &locale) {
            PathResolution::Value(v) => Ok(v),
            PathResolution::Error(attr) => {
                log::warn!("field {:?}: `.{attr}` is not a valid attribute here", field.name);
                Ok(MetaValue::Null)
            }
            PathResolution::Strftime { instant, remaining } => {
                let format_list = match &field.default_branch {
                    Some(tmpl) => self.render_template(tmpl, ctx, vars)?,
                    None => return Ok(MetaValue::Null),
                };
                let formatted: Vec<String> = format_list
                    .iter()
                    .map(|fmt| crate::datetime::strftime(instant, fmt))
                    .collect();
                if remaining.is_empty() {
                    Ok(MetaValue::List(formatted))
                } else {
                    MetaValue::List(formatted)
                        .resolve_path(&remaining, &locale)
                        .into_value_or_null(&field.name)
                }
            }
        }
    }

    /// Conditional evaluation and default/boolean branching (§4.6),
    /// applied to the post-filter, post-replace list `items`.
    fn branch(
        &self,
        field: &Field,
        items: Vec<String>,
        ctx: &FileContext,
        vars: &mut Variables,
    ) -> Result<Vec<String>, RenderError> {
        if let Some(bool_branch) = &field.bool_branch {
            let truthy = match &field.conditional {
                Some(cond) => self.evaluate_conditional(cond.negated, cond.op, &cond.rhs, &items, ctx, vars)?,
                None => is_truthy(&items),
            };
            return if truthy {
                self.render_template(bool_branch, ctx, vars)
            } else {
                self.render_default(field, ctx, vars)
            };
        }

        // No bool branch: the conditional (if present) is evaluated for
        // its side effects only (nested `var`s in its RHS) and
        // otherwise discarded — §4.6 point 4 falls back to `items`
        // itself, not to a true/false text, whenever there is no
        // `bool_value` to choose between (spec.md §8 scenario J).
        if let Some(cond) = &field.conditional {
            let _ = self.evaluate_conditional(cond.negated, cond.op, &cond.rhs, &items, ctx, vars)?;
        }

        if is_truthy(&items) {
            Ok(items)
        } else {
            self.render_default(field, ctx, vars)
        }
    }

    fn render_default(&self, field: &Field, ctx: &FileContext, vars: &mut Variables) -> Result<Vec<String>, RenderError> {
        match &field.default_branch {
            Some(default) => self.render_template(default, ctx, vars),
            None => Ok(vec![self.null_sentinel()]),
        }
    }

    fn evaluate_conditional(
        &self,
        negated: bool,
        op: Op,
        rhs: &[Template],
        lhs: &[String],
        ctx: &FileContext,
        vars: &mut Variables,
    ) -> Result<bool, RenderError> {
        let mut candidates = Vec::with_capacity(rhs.len());
        for tmpl in rhs {
            candidates.push(self.render_template(tmpl, ctx, vars)?);
        }
        Ok(conditional::evaluate(negated, op, lhs, &candidates))
    }

    fn null_sentinel(&self) -> String {
        RENDER_CFG.read().null_sentinel.clone()
    }
}

/// Truthiness without an explicit conditional (§4.6 point 2): `true`
/// iff `items` is non-empty and not all-empty-strings.
fn is_truthy(items: &[String]) -> bool {
    !items.is_empty() && items.iter().any(|s| !s.is_empty())
}

impl PathResolution {
    /// Collapses a further path-resolution step (used after `strftime`
    /// leaves a `remaining` chain) into a plain `MetaValue`, treating an
    /// unresolvable leaf the same as [`Renderer::resolve_path`] does:
    /// `Null`, not a hard error.
    fn into_value_or_null(self, field_name: &str) -> Result<MetaValue, RenderError> {
        match self {
            PathResolution::Value(v) => Ok(v),
            PathResolution::Error(attr) => {
                log::warn!("field {field_name:?}: `.{attr}` is not a valid attribute here");
                Ok(MetaValue::Null)
            }
            // `strftime` cannot itself be reached twice in one path; a
            // second DateTime never arises from resolving a `List`.
            PathResolution::Strftime { .. } => Ok(MetaValue::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::provider::{FileContext, Provider, ProviderFailure, ProviderPolicy, ProviderRegistry};
    use crate::value::MetaValue;
    use chrono::{TimeZone, Utc};

    struct Fixed(MetaValue);
    impl Provider for Fixed {
        fn lookup(&self, _subfield: Option<&str>, _ctx: &FileContext) -> Result<MetaValue, ProviderFailure> {
            Ok(self.0.clone())
        }
    }

    fn registry_with(pairs: &[(&str, MetaValue)]) -> ProviderRegistry {
        let mut reg = ProviderRegistry::new();
        for (name, value) in pairs {
            reg.register(*name, Box::new(Fixed(value.clone())), ProviderPolicy::Soft);
        }
        reg
    }

    fn ctx() -> FileContext {
        FileContext::new("/music/song.mp3", Utc.with_ymd_and_hms(2020, 2, 4, 19, 7, 38).unwrap())
    }

    fn render(source: &str, reg: &ProviderRegistry) -> Vec<String> {
        let tmpl = parse(source).unwrap();
        Renderer::new(reg).render(&tmpl, &ctx()).unwrap()
    }

    #[test]
    fn scenario_a_two_scalar_fields() {
        // `audio` is a single provider dispatching on subfield.
        struct Audio;
        impl Provider for Audio {
            fn lookup(&self, subfield: Option<&str>, _ctx: &FileContext) -> Result<MetaValue, ProviderFailure> {
                Ok(match subfield {
                    Some("artist") => MetaValue::scalar("The Piano Guys"),
                    Some("album") => MetaValue::scalar("Wonders"),
                    _ => MetaValue::Null,
                })
            }
        }
        let mut reg = ProviderRegistry::new();
        reg.register("audio", Box::new(Audio), ProviderPolicy::Soft);
        let out = render("{audio:artist}/{audio:album}", &reg);
        assert_eq!(out, vec!["The Piano Guys/Wonders".to_string()]);
    }

    #[test]
    fn scenario_b_format_int_zero_padded() {
        struct Audio;
        impl Provider for Audio {
            fn lookup(&self, subfield: Option<&str>, _ctx: &FileContext) -> Result<MetaValue, ProviderFailure> {
                Ok(match subfield {
                    Some("track") => MetaValue::scalar("1"),
                    Some("title") => MetaValue::scalar("Story of My Life"),
                    _ => MetaValue::Null,
                })
            }
        }
        let mut reg = ProviderRegistry::new();
        reg.register("audio", Box::new(Audio), ProviderPolicy::Soft);
        let out = render("{format:int:02d,{audio:track}} - {audio:title}.mp3", &reg);
        assert_eq!(out, vec!["01 - Story of My Life.mp3".to_string()]);
    }

    #[test]
    fn scenario_c_in_place_joins_with_delimiter() {
        let mut reg = ProviderRegistry::new();
        reg.register(
            "exiftool",
            Box::new(Fixed(MetaValue::List(vec!["foo".to_string(), "bar".to_string()]))),
            ProviderPolicy::Soft,
        );
        let out = render("{,+exiftool:Keywords}", &reg);
        assert_eq!(out, vec!["foo,bar".to_string()]);
    }

    #[test]
    fn scenario_d_cartesian_expansion_without_in_place() {
        let mut reg = ProviderRegistry::new();
        reg.register(
            "exiftool",
            Box::new(Fixed(MetaValue::List(vec!["foo".to_string(), "bar".to_string()]))),
            ProviderPolicy::Soft,
        );
        let out = render("{exiftool:Keywords}", &reg);
        assert_eq!(out, vec!["foo".to_string(), "bar".to_string()]);
    }

    #[test]
    fn scenario_e_filters_apply_to_each_expansion() {
        let mut reg = ProviderRegistry::new();
        reg.register(
            "exiftool",
            Box::new(Fixed(MetaValue::List(vec!["FOO".to_string(), "bar".to_string()]))),
            ProviderPolicy::Soft,
        );
        let out = render("{exiftool:Keywords|lower|parens}", &reg);
        assert_eq!(out, vec!["(foo)".to_string(), "(bar)".to_string()]);
    }

    #[test]
    fn scenario_f_bool_default_branching() {
        let mut reg = ProviderRegistry::new();
        reg.register(
            "audio",
            Box::new(Fixed(MetaValue::scalar("Song"))),
            ProviderPolicy::Soft,
        );
        let out = render("{audio:title?yes,no}", &reg);
        assert_eq!(out, vec!["yes".to_string()]);

        let mut reg2 = ProviderRegistry::new();
        reg2.register("audio", Box::new(Fixed(MetaValue::Null)), ProviderPolicy::Soft);
        let out2 = render("{audio:title?yes,no}", &reg2);
        assert_eq!(out2, vec!["no".to_string()]);
    }

    #[test]
    fn scenario_g_var_binding_feeds_find_replace() {
        let reg = ProviderRegistry::new();
        let mut reg = reg;
        reg.register("audio", Box::new(Fixed(MetaValue::scalar("a-b"))), ProviderPolicy::Soft);
        let out = render("{var:pipe,{pipe}}{audio:title[-,%pipe]}", &reg);
        assert_eq!(out, vec!["a|b".to_string()]);
    }

    #[test]
    fn scenario_h_filter_then_conditional() {
        let mut reg = ProviderRegistry::new();
        reg.register(
            "exiftool",
            Box::new(Fixed(MetaValue::List(vec!["BeachDay".to_string(), "sun".to_string()]))),
            ProviderPolicy::Soft,
        );
        let out = render("{exiftool:Keywords|lower contains beach?B,N}", &reg);
        assert_eq!(out, vec!["B".to_string()]);
    }

    #[test]
    fn scenario_i_strftime_consumes_default_as_format() {
        let mut reg = ProviderRegistry::new();
        reg.register(
            "created",
            Box::new(Fixed(MetaValue::DateTime(
                Utc.with_ymd_and_hms(2020, 2, 4, 19, 7, 38).unwrap(),
            ))),
            ProviderPolicy::Soft,
        );
        let out = render("{created.strftime,%Y-%m-%d-%H%M%S}", &reg);
        assert_eq!(out, vec!["2020-02-04-190738".to_string()]);
    }

    #[test]
    fn scenario_j_conditional_without_bool_branch_emits_the_value() {
        let mut reg = ProviderRegistry::new();
        reg.register("ISO", Box::new(Fixed(MetaValue::scalar("50"))), ProviderPolicy::Soft);
        let out = render("{ISO < 100}", &reg);
        assert_eq!(out, vec!["50".to_string()]);

        let out2 = render("{ISO < 100?Low,High}", &reg);
        assert_eq!(out2, vec!["Low".to_string()]);
    }

    #[test]
    fn null_without_default_emits_sentinel() {
        let mut reg = ProviderRegistry::new();
        reg.register("audio", Box::new(Fixed(MetaValue::Null)), ProviderPolicy::Soft);
        let out = render("{audio:title}", &reg);
        assert_eq!(out, vec!["_".to_string()]);
    }

    #[test]
    fn unknown_field_is_a_render_error() {
        let reg = ProviderRegistry::new();
        let tmpl = parse("{nope:thing}").unwrap();
        let err = Renderer::new(&reg).render(&tmpl, &ctx()).unwrap_err();
        assert!(matches!(err, RenderError::UnknownField { .. }));
    }

    #[test]
    fn hard_provider_failure_propagates() {
        struct Failing;
        impl Provider for Failing {
            fn lookup(&self, _subfield: Option<&str>, _ctx: &FileContext) -> Result<MetaValue, ProviderFailure> {
                Err(ProviderFailure("exiftool not found".into()))
            }
        }
        let mut reg = ProviderRegistry::new();
        reg.register("exiftool", Box::new(Failing), ProviderPolicy::Hard);
        let tmpl = parse("{exiftool:Keywords}").unwrap();
        let err = Renderer::new(&reg).render(&tmpl, &ctx()).unwrap_err();
        assert!(matches!(err, RenderError::Provider { .. }));
    }

    #[test]
    fn soft_provider_failure_degrades_to_null() {
        struct Failing;
        impl Provider for Failing {
            fn lookup(&self, _subfield: Option<&str>, _ctx: &FileContext) -> Result<MetaValue, ProviderFailure> {
                Err(ProviderFailure("no Finder on this platform".into()))
            }
        }
        let mut reg = ProviderRegistry::new();
        reg.register("finder", Box::new(Failing), ProviderPolicy::Soft);
        let out = render("{finder:tags?yes,no}", &reg);
        assert_eq!(out, vec!["no".to_string()]);
    }

    #[test]
    fn punctuation_round_trip() {
        let reg = ProviderRegistry::new();
        let out = render("{openbrace}x{closebrace}", &reg);
        assert_eq!(out, vec!["{x}".to_string()]);
        let out = render("100%% done", &reg);
        assert_eq!(out, vec!["100% done".to_string()]);
    }

    #[test]
    fn in_place_field_always_renders_to_exactly_one_element() {
        let mut reg = ProviderRegistry::new();
        reg.register(
            "exiftool",
            Box::new(Fixed(MetaValue::List(vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
            ]))),
            ProviderPolicy::Soft,
        );
        let out = render("{+exiftool:Keywords}", &reg);
        assert_eq!(out.len(), 1);
        assert_eq!(out, vec!["abc".to_string()]);
    }

    #[test]
    fn cartesian_expansion_multiplies_across_two_multi_valued_fields() {
        let mut reg = ProviderRegistry::new();
        reg.register(
            "a",
            Box::new(Fixed(MetaValue::List(vec!["1".to_string(), "2".to_string()]))),
            ProviderPolicy::Soft,
        );
        reg.register(
            "b",
            Box::new(Fixed(MetaValue::List(vec!["x".to_string(), "y".to_string()]))),
            ProviderPolicy::Soft,
        );
        let out = render("{a}-{b}", &reg);
        assert_eq!(out.len(), 4);
        assert_eq!(
            out,
            vec![
                "1-x".to_string(),
                "1-y".to_string(),
                "2-x".to_string(),
                "2-y".to_string(),
            ]
        );
    }

    #[test]
    fn variable_reference_field_form() {
        let reg = ProviderRegistry::new();
        let out = render("{var:x,hello}{%x} world", &reg);
        assert_eq!(out, vec!["hello world".to_string()]);
    }
}

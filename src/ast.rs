//! The parsed representation of a template: an ordered list of segments,
//! each either a literal run of text or a field reference.
//!
//! Nothing in this module touches metadata or renders anything; it is
//! pure data, built once by [`crate::parser::parse`] and walked
//! repeatedly by [`crate::render::Renderer`].

/// A span into the original template source, in byte offsets, used to
/// report parse and render errors at the offending location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A fully parsed template: an ordered sequence of segments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pub segments: Vec<Segment>,
}

impl Template {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

/// One top-level element of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Verbatim UTF-8 text, copied into every element of the accumulator.
    Literal(String),
    /// A `{...}` field reference.
    Field(Box<Field>),
}

/// A parsed `{...}` field expression.
///
/// Field names followed by a `.`-separated chain are split into `name`
/// (the part up to the first `.`, `:`, `|`, `[`, space, `?`, `,` or `}`)
/// and `path` (the `.attr` chain that follows). For example
/// `filepath.parent.name` parses to `name = "filepath"`,
/// `path = ["parent", "name"]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// The field's source span, used to label render errors (§6).
    pub span: Span,
    /// Join string for in-place expansion (the text between the leading
    /// delimiter prefix and the `+`). `None` means no delimiter text was
    /// given before the `+` (join with the empty string).
    pub delim: Option<String>,
    /// `true` when the field was written with a leading `+` (or delimiter
    /// prefix ending in `+`): the field's multi-valued result is joined
    /// into a single string before being placed in the accumulator,
    /// suppressing Cartesian expansion for this segment.
    pub in_place: bool,
    /// Top-level provider name (`audio`, `exiftool`, `filepath`, `var`, ...).
    pub name: String,
    /// Optional `:subfield`, e.g. the `Keywords` in `{exiftool:Keywords}`.
    pub subfield: Option<String>,
    /// The `.attr` chain following name/subfield.
    pub path: Vec<String>,
    /// Filters applied left-to-right after path navigation.
    pub filters: Vec<FilterSpec>,
    /// Find/replace pairs, applied in listed order after filters. The
    /// replacement side is itself a template, rendered once per element
    /// against the current variable environment.
    pub replacements: Vec<(String, Template)>,
    /// Optional `[not] op value` conditional.
    pub conditional: Option<Cond>,
    /// `?bool_value` branch.
    pub bool_branch: Option<Template>,
    /// `,default` branch.
    pub default_branch: Option<Template>,
}

/// A single filter in a field's filter chain, e.g. `split(;)`, `chop(1)`,
/// `join(:)`. `arg` is `None` when the filter takes no argument (e.g.
/// `lower`, `autosplit`, `sort`).
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub name: String,
    pub arg: Option<String>,
    pub span: Span,
}

/// The operator of a conditional, `[not] op value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Contains,
    Matches,
    StartsWith,
    EndsWith,
    Le,
    Ge,
    Lt,
    Gt,
    Eq,
    Ne,
}

impl Op {
    /// The keyword/symbol spellings recognised in source order of
    /// longest-match, as required by §4.1 point 7.
    pub const KEYWORDS: &'static [(&'static str, Op)] = &[
        ("contains", Op::Contains),
        ("matches", Op::Matches),
        ("startswith", Op::StartsWith),
        ("endswith", Op::EndsWith),
        ("<=", Op::Le),
        (">=", Op::Ge),
        ("<", Op::Lt),
        (">", Op::Gt),
        ("==", Op::Eq),
        ("!=", Op::Ne),
    ];
}

/// `[not] op value`: a conditional predicate on a field's post-filter,
/// post-replace value list.
///
/// The source value is split on literal top-level `|` *before* parsing
/// (§4.6: "split by the literal `|` in the source is pre-parse"), giving
/// one candidate template per alternative. `{ISO < 100|200}` is true iff
/// `ISO` compares `<` to either `100` or `200`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cond {
    pub negated: bool,
    pub op: Op,
    /// One parsed template per `|`-separated alternative; always
    /// non-empty.
    pub rhs: Vec<Template>,
}

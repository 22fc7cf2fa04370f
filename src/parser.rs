//! Recursive-descent parser turning a template source string into an
//! [`crate::ast::Template`] (§4.1).
//!
//! Nested template positions (`default`, `bool_value`, a conditional's
//! RHS candidates, a find/replace pair's `replace` side) are first
//! isolated as byte ranges with [`crate::lexer::find_stop`], then parsed
//! by recursing into [`parse_window`] — so the recursive call sees a
//! plain, already-delimited source window and never needs its own stop
//! set. Byte offsets are always kept relative to the original top-level
//! source, for accurate error spans even many levels deep.

use crate::ast::{Cond, Field, FilterSpec, Op, Segment, Span, Template};
use crate::error::ParseError;
use crate::lexer::{find_close_paren, find_stop, is_name_char, split_top_level};

/// Parses a complete template source string.
pub fn parse(source: &str) -> Result<Template, ParseError> {
    parse_window(source, 0, source.len())
}

/// Parses `src[start..end]` as a standalone template. `start`/`end` must
/// land on UTF-8 char boundaries.
fn parse_window(src: &str, start: usize, end: usize) -> Result<Template, ParseError> {
    let mut p = Parser { src, pos: start, limit: end };
    p.parse_segments()
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    limit: usize,
}

impl<'a> Parser<'a> {
    fn eof(&self) -> bool {
        self.pos >= self.limit
    }

    fn peek(&self) -> Option<char> {
        if self.eof() {
            None
        } else {
            self.src[self.pos..self.limit].chars().next()
        }
    }

    fn char_at(&self, idx: usize) -> Option<char> {
        if idx >= self.limit {
            None
        } else {
            self.src[idx..self.limit].chars().next()
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn parse_segments(&mut self) -> Result<Template, ParseError> {
        let mut segments = Vec::new();
        loop {
            let lit_start = self.pos;
            while let Some(c) = self.peek() {
                if c == '{' {
                    break;
                }
                self.bump();
            }
            if self.pos > lit_start {
                segments.push(Segment::Literal(self.src[lit_start..self.pos].to_string()));
            }
            if self.eof() {
                break;
            }
            let field = self.parse_field()?;
            segments.push(Segment::Field(Box::new(field)));
        }
        Ok(Template::new(segments))
    }

    /// Scans a run of non-terminator characters, used for name/subfield/
    /// path segments. Stops at the first char in `terminators`, or at
    /// the end of the current window (the caller's closing-`}` check
    /// turns that into `UnterminatedBrace`).
    fn scan_until(&mut self, terminators: &[char]) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if terminators.contains(&c) {
                break;
            }
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    /// Isolates `src[self.pos..stop)` as a sub-template (`stop` found by
    /// depth-aware scanning for one of `stops`) and parses it
    /// recursively, per the "already-parsed sub-ASTs" design note.
    fn parse_subtemplate(&mut self, stops: &[char]) -> Result<Template, ParseError> {
        let start = self.pos;
        let stop = find_stop(self.src, start, self.limit, stops)?;
        let tmpl = parse_window(self.src, start, stop)?;
        self.pos = stop;
        Ok(tmpl)
    }

    fn parse_field(&mut self) -> Result<Field, ParseError> {
        let field_start = self.pos;
        self.bump(); // '{'

        let (delim, in_place) = self.parse_delim_prefix();

        let name_start = self.pos;
        let name = self.scan_until(&[':', '.', '|', '[', ' ', '?', ',', '}']);
        if name.is_empty() {
            return Err(ParseError::EmptyFieldName { offset: name_start });
        }

        let subfield = if self.peek() == Some(':') {
            self.bump();
            let subfield_start = self.pos;
            let s = self.scan_until(&['.', '|', '[', ' ', '?', ',', '}']);
            if name == "var" && !is_valid_variable_name(&s) {
                return Err(ParseError::InvalidVariableName {
                    name: s,
                    offset: subfield_start,
                });
            }
            Some(s)
        } else {
            None
        };

        let mut path = Vec::new();
        while self.peek() == Some('.') {
            self.bump();
            path.push(self.scan_until(&['.', '|', '[', ' ', '?', ',', '}']));
        }

        let mut filters = Vec::new();
        while self.peek() == Some('|') {
            self.bump();
            filters.push(self.parse_filter()?);
        }

        let mut replacements = Vec::new();
        if self.peek() == Some('[') {
            replacements = self.parse_replacements()?;
        }

        let conditional = if self.peek() == Some(' ') {
            Some(self.parse_conditional()?)
        } else {
            None
        };

        let bool_branch = if self.peek() == Some('?') {
            self.bump();
            Some(self.parse_subtemplate(&[',', '}'])?)
        } else {
            None
        };

        let default_branch = if self.peek() == Some(',') {
            self.bump();
            Some(self.parse_subtemplate(&['}'])?)
        } else {
            None
        };

        match self.bump() {
            Some('}') => {}
            _ => return Err(ParseError::UnterminatedBrace { offset: field_start }),
        }

        Ok(Field {
            span: Span::new(field_start, self.pos),
            delim,
            in_place,
            name,
            subfield,
            path,
            filters,
            replacements,
            conditional,
            bool_branch,
            default_branch,
        })
    }

    /// §4.1 point 1: an optional run of verbatim text ending in a `+`
    /// that is itself immediately followed by a field-name character.
    /// Leaves `self.pos` untouched if no qualifying `+` is found before
    /// the field's closing `}` (or window end).
    fn parse_delim_prefix(&mut self) -> (Option<String>, bool) {
        let scan_start = self.pos;
        let mut cursor = self.pos;
        while cursor < self.limit {
            let c = self.char_at(cursor).expect("cursor < limit");
            let clen = c.len_utf8();
            if c == '+' {
                let after = cursor + clen;
                if let Some(nc) = self.char_at(after) {
                    if is_name_char(nc) {
                        let delim_text = &self.src[scan_start..cursor];
                        let delim = if delim_text.is_empty() {
                            None
                        } else {
                            Some(delim_text.to_string())
                        };
                        self.pos = after;
                        return (delim, true);
                    }
                }
                cursor += clen;
                continue;
            }
            if c == '}' {
                break;
            }
            cursor += clen;
        }
        (None, false)
    }

    fn parse_filter(&mut self) -> Result<FilterSpec, ParseError> {
        let start = self.pos;
        let name = self.scan_until(&['(', '|', '[', ' ', '?', ',', '}']);
        let mut arg = None;
        if self.peek() == Some('(') {
            let open = self.pos;
            self.bump();
            let arg_start = self.pos;
            let close = find_close_paren(self.src, arg_start, self.limit)?;
            arg = Some(self.src[arg_start..close].to_string());
            self.pos = close;
            match self.bump() {
                Some(')') => {}
                _ => return Err(ParseError::UnterminatedFilterArgument { offset: open }),
            }
        }
        crate::filters::validate(&name, arg.as_deref(), start)?;
        Ok(FilterSpec {
            name,
            arg,
            span: Span::new(start, self.pos),
        })
    }

    /// `[find,replace(|find,replace)*]` (§4.1 point 6). `find` is a
    /// plain literal; `replace` is itself a template.
    fn parse_replacements(&mut self) -> Result<Vec<(String, Template)>, ParseError> {
        let bracket_start = self.pos;
        self.bump(); // '['
        let mut pairs = Vec::new();
        loop {
            let find_start = self.pos;
            let stop = find_stop(self.src, find_start, self.limit, &[',', '|', ']'])?;
            match self.char_at(stop) {
                Some(',') => {
                    let find_text = self.src[find_start..stop].to_string();
                    self.pos = stop + 1;
                    let replace_start = self.pos;
                    let replace_end = find_stop(self.src, replace_start, self.limit, &['|', ']'])?;
                    let replace_tmpl = parse_window(self.src, replace_start, replace_end)?;
                    self.pos = replace_end;
                    pairs.push((find_text, replace_tmpl));
                    match self.bump() {
                        Some('|') => continue,
                        Some(']') => break,
                        _ => return Err(ParseError::UnterminatedBrace { offset: bracket_start }),
                    }
                }
                Some('|') | Some(']') => {
                    return Err(ParseError::FindReplacePipe { offset: find_start });
                }
                _ => return Err(ParseError::UnterminatedBrace { offset: bracket_start }),
            }
        }
        Ok(pairs)
    }

    /// A single space, then `[not ]op value` (§4.1 point 7).
    fn parse_conditional(&mut self) -> Result<Cond, ParseError> {
        self.bump(); // the required single space

        let negated = if self.src[self.pos..self.limit].starts_with("not ") {
            self.pos += "not ".len();
            true
        } else {
            false
        };

        let op = self.match_operator()?;
        if self.peek() == Some(' ') {
            self.bump();
        }

        let value_start = self.pos;
        let value_end = find_stop(self.src, value_start, self.limit, &['?', ',', '}'])?;
        let candidates = split_top_level(self.src, value_start, value_end, '|');
        let mut rhs = Vec::with_capacity(candidates.len());
        for (start, end) in candidates {
            rhs.push(parse_window(self.src, start, end)?);
        }
        self.pos = value_end;

        Ok(Cond { negated, op, rhs })
    }

    fn match_operator(&mut self) -> Result<Op, ParseError> {
        let rest = &self.src[self.pos..self.limit];
        for (kw, op) in Op::KEYWORDS {
            if rest.starts_with(kw) {
                self.pos += kw.len();
                return Ok(*op);
            }
        }
        Err(ParseError::UnknownOperator { offset: self.pos })
    }
}

fn is_valid_variable_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Op, Segment};

    fn field_of(tmpl: &Template, i: usize) -> &Field {
        match &tmpl.segments[i] {
            Segment::Field(f) => f,
            other => panic!("expected field segment, got {other:?}"),
        }
    }

    #[test]
    fn literal_only_template() {
        let t = parse("hello world").unwrap();
        assert_eq!(t.segments, vec![Segment::Literal("hello world".to_string())]);
    }

    #[test]
    fn simple_name_and_subfield() {
        let t = parse("{audio:artist}/{audio:album}").unwrap();
        assert_eq!(t.segments.len(), 3);
        let f0 = field_of(&t, 0);
        assert_eq!(f0.name, "audio");
        assert_eq!(f0.subfield.as_deref(), Some("artist"));
        assert_eq!(t.segments[1], Segment::Literal("/".to_string()));
        let f2 = field_of(&t, 2);
        assert_eq!(f2.subfield.as_deref(), Some("album"));
    }

    #[test]
    fn path_chain_splits_on_name_and_path() {
        let t = parse("{filepath.parent.name}").unwrap();
        let f = field_of(&t, 0);
        assert_eq!(f.name, "filepath");
        assert_eq!(f.path, vec!["parent".to_string(), "name".to_string()]);
    }

    #[test]
    fn in_place_with_delimiter_prefix() {
        let t = parse("{,+exiftool:Keywords}").unwrap();
        let f = field_of(&t, 0);
        assert!(f.in_place);
        assert_eq!(f.delim.as_deref(), Some(","));
        assert_eq!(f.name, "exiftool");
        assert_eq!(f.subfield.as_deref(), Some("Keywords"));
    }

    #[test]
    fn in_place_without_delimiter_text() {
        let t = parse("{+exiftool:Keywords}").unwrap();
        let f = field_of(&t, 0);
        assert!(f.in_place);
        assert_eq!(f.delim, None);
    }

    #[test]
    fn no_plus_means_not_in_place() {
        let t = parse("{exiftool:Keywords}").unwrap();
        let f = field_of(&t, 0);
        assert!(!f.in_place);
        assert_eq!(f.delim, None);
    }

    #[test]
    fn filters_chain_with_and_without_arguments() {
        let t = parse("{exiftool:Keywords|lower|parens}").unwrap();
        let f = field_of(&t, 0);
        assert_eq!(f.filters.len(), 2);
        assert_eq!(f.filters[0].name, "lower");
        assert_eq!(f.filters[0].arg, None);
        assert_eq!(f.filters[1].name, "parens");
    }

    #[test]
    fn chop_requires_an_argument() {
        assert!(parse("{audio:title|chop}").is_err());
        assert!(parse("{audio:title|chop(2)}").is_ok());
    }

    #[test]
    fn find_replace_block_parses_pairs_with_template_replace() {
        let t = parse("{audio:title[-,%pipe]}").unwrap();
        let f = field_of(&t, 0);
        assert_eq!(f.replacements.len(), 1);
        assert_eq!(f.replacements[0].0, "-");
        assert_eq!(
            f.replacements[0].1.segments,
            vec![Segment::Literal("%pipe".to_string())]
        );
    }

    #[test]
    fn find_replace_rejects_pipe_inside_a_pair() {
        assert!(parse("{audio:title[a|b,c]}").is_err());
    }

    #[test]
    fn conditional_requires_leading_space() {
        // "ISO<100" with no space is just an (unusual) field name, not a
        // conditional: no space means the whole run up to '}' is `name`.
        let t = parse("{ISO<100}").unwrap();
        let f = field_of(&t, 0);
        assert_eq!(f.name, "ISO<100");
        assert!(f.conditional.is_none());
    }

    #[test]
    fn conditional_with_space_parses_operator_and_value() {
        let t = parse("{ISO < 100}").unwrap();
        let f = field_of(&t, 0);
        let cond = f.conditional.as_ref().unwrap();
        assert_eq!(cond.op, Op::Lt);
        assert!(!cond.negated);
        assert_eq!(cond.rhs.len(), 1);
        assert_eq!(cond.rhs[0].segments, vec![Segment::Literal("100".to_string())]);
    }

    #[test]
    fn conditional_rhs_splits_on_top_level_pipe() {
        let t = parse("{ISO < 100|200}").unwrap();
        let f = field_of(&t, 0);
        let cond = f.conditional.as_ref().unwrap();
        assert_eq!(cond.rhs.len(), 2);
    }

    #[test]
    fn not_negates_conditional() {
        let t = parse("{ISO not < 100}").unwrap();
        let f = field_of(&t, 0);
        assert!(f.conditional.as_ref().unwrap().negated);
    }

    #[test]
    fn bool_and_default_branches() {
        let t = parse("{audio:title?yes,no}").unwrap();
        let f = field_of(&t, 0);
        assert_eq!(
            f.bool_branch.as_ref().unwrap().segments,
            vec![Segment::Literal("yes".to_string())]
        );
        assert_eq!(
            f.default_branch.as_ref().unwrap().segments,
            vec![Segment::Literal("no".to_string())]
        );
    }

    #[test]
    fn default_branch_can_contain_a_nested_field() {
        let t = parse("{var:pipe,{pipe}}").unwrap();
        let f = field_of(&t, 0);
        assert_eq!(f.name, "var");
        assert_eq!(f.subfield.as_deref(), Some("pipe"));
        let default = f.default_branch.as_ref().unwrap();
        assert_eq!(default.segments.len(), 1);
        assert!(matches!(default.segments[0], Segment::Field(_)));
    }

    #[test]
    fn invalid_variable_name_is_a_parse_error() {
        assert!(parse("{var:1bad,x}").is_err());
        assert!(parse("{var:_ok,x}").is_ok());
    }

    #[test]
    fn strftime_uses_default_as_format_template() {
        let t = parse("{created.strftime,%Y-%m-%d-%H%M%S}").unwrap();
        let f = field_of(&t, 0);
        assert_eq!(f.path, vec!["strftime".to_string()]);
        assert!(f.default_branch.is_some());
    }

    #[test]
    fn unterminated_brace_is_an_error() {
        assert!(parse("{audio:title").is_err());
    }

    #[test]
    fn empty_field_name_is_an_error() {
        assert!(parse("{:artist}").is_err());
    }

    #[test]
    fn combined_filter_and_conditional_scenario_h() {
        let t = parse("{exiftool:Keywords|lower contains beach?B,N}").unwrap();
        let f = field_of(&t, 0);
        assert_eq!(f.filters.len(), 1);
        let cond = f.conditional.as_ref().unwrap();
        assert_eq!(cond.op, Op::Contains);
        assert_eq!(cond.rhs[0].segments, vec![Segment::Literal("beach".to_string())]);
        assert_eq!(
            f.bool_branch.as_ref().unwrap().segments,
            vec![Segment::Literal("B".to_string())]
        );
    }
}

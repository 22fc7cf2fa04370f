//! A small subset of Python's format-spec mini-language (PEP 3101),
//! used by the `{format:TYPE:FORMAT,TEMPLATE}` meta-provider (§4.7).
//!
//! Only the pieces that show up in real MTL templates are implemented:
//! fill/align, sign, zero-padding, width, thousands separators and
//! precision. Anything the spec string doesn't ask for falls back to a
//! sane default rather than erroring — a malformed *format string* isn't
//! one of the documented failure modes; only a coercion failure
//! (`TYPE` doesn't parse) is (§7 `FormatError`), and that is handled by
//! the caller, which leaves the element unchanged.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
    AfterSign,
}

struct Spec {
    fill: char,
    align: Option<Align>,
    sign: char,
    width: usize,
    thousands: bool,
    precision: Option<usize>,
    type_char: Option<char>,
}

fn parse_spec(spec: &str) -> Spec {
    let chars: Vec<char> = spec.chars().collect();
    let mut i = 0;
    let mut fill = ' ';
    let mut align = None;

    let align_of = |c: char| -> Option<Align> {
        match c {
            '<' => Some(Align::Left),
            '>' => Some(Align::Right),
            '^' => Some(Align::Center),
            '=' => Some(Align::AfterSign),
            _ => None,
        }
    };

    if chars.len() >= 2 && align_of(chars[1]).is_some() {
        fill = chars[0];
        align = align_of(chars[1]);
        i = 2;
    } else if !chars.is_empty() && align_of(chars[0]).is_some() {
        align = align_of(chars[0]);
        i = 1;
    }

    let mut sign = '-';
    if i < chars.len() && matches!(chars[i], '+' | '-' | ' ') {
        sign = chars[i];
        i += 1;
    }

    if i < chars.len() && chars[i] == '#' {
        i += 1; // alternate form: not meaningful for the types we support
    }

    let mut zero = false;
    if i < chars.len() && chars[i] == '0' {
        zero = true;
        i += 1;
    }
    if zero && align.is_none() {
        align = Some(Align::AfterSign);
        fill = '0';
    }

    let width_start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    let width: usize = chars[width_start..i].iter().collect::<String>().parse().unwrap_or(0);

    let mut thousands = false;
    if i < chars.len() && matches!(chars[i], ',' | '_') {
        thousands = true;
        i += 1;
    }

    let mut precision = None;
    if i < chars.len() && chars[i] == '.' {
        i += 1;
        let p_start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        precision = chars[p_start..i].iter().collect::<String>().parse().ok();
    }

    let type_char = if i < chars.len() { Some(chars[i]) } else { None };

    Spec {
        fill,
        align,
        sign,
        width,
        thousands,
        precision,
        type_char,
    }
}

fn group_thousands(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*b as char);
    }
    out
}

/// Pads `sign_str` + `body` to `spec.width`, respecting `align`
/// (defaulting numbers to right-aligned, everything else to left).
fn pad(sign_str: &str, body: &str, spec: &Spec, default_right: bool) -> String {
    let content_len = sign_str.chars().count() + body.chars().count();
    if content_len >= spec.width {
        return format!("{sign_str}{body}");
    }
    let fill_count = spec.width - content_len;
    let fill: String = std::iter::repeat(spec.fill).take(fill_count).collect();
    match spec.align.unwrap_or(if default_right { Align::Right } else { Align::Left }) {
        Align::Left => format!("{sign_str}{body}{fill}"),
        Align::Right => format!("{fill}{sign_str}{body}"),
        Align::AfterSign => format!("{sign_str}{fill}{body}"),
        Align::Center => {
            let left = fill_count / 2;
            let right = fill_count - left;
            let lfill: String = std::iter::repeat(spec.fill).take(left).collect();
            let rfill: String = std::iter::repeat(spec.fill).take(right).collect();
            format!("{lfill}{sign_str}{body}{rfill}")
        }
    }
}

fn sign_str(spec: &Spec, negative: bool) -> &'static str {
    if negative {
        "-"
    } else {
        match spec.sign {
            '+' => "+",
            ' ' => " ",
            _ => "",
        }
    }
}

fn format_int(n: i64, spec_str: &str) -> String {
    let spec = parse_spec(spec_str);
    let negative = n < 0;
    let mut body = n.unsigned_abs().to_string();
    if let Some('x') = spec.type_char {
        body = format!("{:x}", n.unsigned_abs());
    } else if let Some('X') = spec.type_char {
        body = format!("{:X}", n.unsigned_abs());
    } else if let Some('o') = spec.type_char {
        body = format!("{:o}", n.unsigned_abs());
    } else if let Some('b') = spec.type_char {
        body = format!("{:b}", n.unsigned_abs());
    } else if spec.thousands {
        body = group_thousands(&body);
    }
    pad(sign_str(&spec, negative), &body, &spec, true)
}

fn format_float(n: f64, spec_str: &str) -> String {
    let spec = parse_spec(spec_str);
    let negative = n.is_sign_negative();
    let precision = spec.precision.unwrap_or(6);
    let mut body = format!("{:.*}", precision, n.abs());
    if spec.thousands {
        if let Some((int_part, frac_part)) = body.split_once('.') {
            body = format!("{}.{}", group_thousands(int_part), frac_part);
        } else {
            body = group_thousands(&body);
        }
    }
    pad(sign_str(&spec, negative), &body, &spec, true)
}

fn format_str(s: &str, spec_str: &str) -> String {
    let spec = parse_spec(spec_str);
    let truncated = match spec.precision {
        Some(p) => s.chars().take(p).collect::<String>(),
        None => s.to_string(),
    };
    pad("", &truncated, &spec, false)
}

/// Coerces `value` to `ty` (`int`, `float`, or `str`) and applies
/// `spec`. On coercion failure, returns `value` unchanged (§7
/// `FormatError`): the element is emitted as-is, not dropped.
pub fn format_value(ty: &str, spec: &str, value: &str) -> String {
    match ty {
        "int" => match value.trim().parse::<i64>() {
            Ok(n) => format_int(n, spec),
            Err(_) => value.to_string(),
        },
        "float" => match value.trim().parse::<f64>() {
            Ok(n) => format_float(n, spec),
            Err(_) => value.to_string(),
        },
        _ => format_str(value, spec),
    }
}

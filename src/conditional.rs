//! The conditional evaluator (§4.6 point 1): `[not] op value` applied to
//! a field's post-filter, post-replace list `L` against each rendered
//! RHS candidate.

use crate::ast::Op;
use crate::value::as_number;

/// `true` iff any `(element of L, candidate of R)` pair satisfies `op`,
/// then inverted if `negated`.
pub fn evaluate(negated: bool, op: Op, lhs: &[String], rhs_candidates: &[Vec<String>]) -> bool {
    let matched = lhs.iter().any(|l| {
        rhs_candidates
            .iter()
            .flat_map(|candidate| candidate.iter())
            .any(|r| satisfies(op, l, r))
    });
    matched ^ negated
}

fn satisfies(op: Op, l: &str, r: &str) -> bool {
    match op {
        Op::Contains => l.contains(r),
        Op::Matches => l == r,
        Op::StartsWith => l.starts_with(r),
        Op::EndsWith => l.ends_with(r),
        Op::Eq => compare(l, r) == std::cmp::Ordering::Equal,
        Op::Ne => compare(l, r) != std::cmp::Ordering::Equal,
        Op::Lt => compare(l, r) == std::cmp::Ordering::Less,
        Op::Le => compare(l, r) != std::cmp::Ordering::Greater,
        Op::Gt => compare(l, r) == std::cmp::Ordering::Greater,
        Op::Ge => compare(l, r) != std::cmp::Ordering::Less,
    }
}

/// Numeric comparison when both sides parse as numbers, else
/// lexicographic (§4.6, resolved Open Question OQ-b).
fn compare(l: &str, r: &str) -> std::cmp::Ordering {
    match (as_number(l), as_number(r)) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal),
        _ => l.cmp(r),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(s: &str) -> Vec<String> {
        vec![s.to_string()]
    }

    #[test]
    fn contains_is_substring() {
        assert!(evaluate(false, Op::Contains, &one("beachday"), &[one("beach")]));
        assert!(!evaluate(false, Op::Contains, &one("day"), &[one("beach")]));
    }

    #[test]
    fn numeric_comparison_when_both_parse() {
        assert!(evaluate(false, Op::Lt, &one("50"), &[one("100")]));
        assert!(!evaluate(false, Op::Gt, &one("9"), &[one("100")]));
    }

    #[test]
    fn lexicographic_fallback_when_not_numeric() {
        // "9" > "100" lexicographically even though 9 < 100 numerically.
        assert!(evaluate(false, Op::Gt, &one("9x"), &[one("100x")]));
    }

    #[test]
    fn any_pair_across_multiple_candidates_and_elements() {
        assert!(evaluate(
            false,
            Op::Lt,
            &one("50"),
            &[one("10"), one("200")]
        ));
    }

    #[test]
    fn not_inverts_the_result() {
        assert!(!evaluate(true, Op::Contains, &one("beachday"), &[one("beach")]));
    }

    #[test]
    fn matches_is_full_equality_not_substring() {
        assert!(!evaluate(false, Op::Matches, &one("beachday"), &[one("beach")]));
        assert!(evaluate(false, Op::Matches, &one("beach"), &[one("beach")]));
    }
}

//! The find/replace engine (§4.5): literal, non-regex substitution
//! applied to every element of a field's post-filter list.

/// Replaces every non-overlapping, left-to-right occurrence of `find` in
/// `s` with `replace`. `find` is matched literally; an empty `find`
/// leaves `s` unchanged (there is no sensible "occurrence" of the empty
/// string to substitute without looping forever).
pub fn replace_all(s: &str, find: &str, replace: &str) -> String {
    if find.is_empty() {
        return s.to_string();
    }
    s.replace(find, replace)
}

/// Applies one `(find, replace)` pair to every element of `items`,
/// where `replace` has already been rendered against the current
/// variable environment (§4.5: "`replace` is a template and is rendered
/// once ... before substitution").
pub fn apply_pair(items: Vec<String>, find: &str, replace: &str) -> Vec<String> {
    items.into_iter().map(|s| replace_all(&s, find, replace)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_every_occurrence_left_to_right() {
        assert_eq!(replace_all("a-b-c", "-", "_"), "a_b_c");
    }

    #[test]
    fn non_overlapping_semantics() {
        // "aaa" with find "aa" -> one match consumed, then "a" left over,
        // not two overlapping matches.
        assert_eq!(replace_all("aaa", "aa", "b"), "ba");
    }

    #[test]
    fn empty_find_is_a_no_op() {
        assert_eq!(replace_all("abc", "", "X"), "abc");
    }

    #[test]
    fn pair_applies_across_every_element() {
        let items = vec!["a-b".to_string(), "c-d".to_string()];
        assert_eq!(
            apply_pair(items, "-", "|"),
            vec!["a|b".to_string(), "c|d".to_string()]
        );
    }
}

//! DateTime attribute navigation (§4.3).
//!
//! `MetaValue::DateTime` wraps a `chrono` instant. Before any filter,
//! find/replace or output, it must be resolved to a `List` by applying a
//! field's `path`; only `strftime` additionally consumes the default
//! branch as its format template (§3 invariants, §4.3).

use crate::config::LocaleNames;
use chrono::{DateTime, Datelike, Timelike, Utc};

/// A resolved point in time. The teacher crate never formats dates (it
/// only stores `SystemTime` as an opaque integer); `chrono` is pulled in
/// from the `fschutt-divinum-officium-rs` example, which already depends
/// on it for calendar arithmetic, because MTL needs real `strftime`
/// support that the teacher's own stack has no equivalent for.
pub type Instant = DateTime<Utc>;

/// Resolves a single `.attr` path element against a `DateTime`, per the
/// fixed attribute table in §4.3. Returns `None` for any leaf not in that
/// table (the caller turns that into a render warning and `Null`, or -
/// for `strftime` - consumes `default` separately). Month/weekday names
/// come from `locale` (`config::RENDER_CFG` by default).
pub fn resolve_attr(instant: Instant, attr: &str, locale: &LocaleNames) -> Option<String> {
    Some(match attr {
        "date" => instant.format("%Y-%m-%d").to_string(),
        "year" => format!("{:04}", instant.year()),
        "yy" => format!("{:02}", instant.year().rem_euclid(100)),
        "month" => locale.month_names[(instant.month0()) as usize].clone(),
        "mon" => locale.month_abbrev[(instant.month0()) as usize].clone(),
        "mm" => format!("{:02}", instant.month()),
        "dd" => format!("{:02}", instant.day()),
        "dow" => locale.weekday_names[instant.weekday().num_days_from_monday() as usize].clone(),
        "doy" => format!("{:03}", instant.ordinal()),
        "hour" => format!("{:02}", instant.hour()),
        "min" => format!("{:02}", instant.minute()),
        "sec" => format!("{:02}", instant.second()),
        _ => return None,
    })
}

/// Applies a user-supplied `strftime`-style format string to a `DateTime`.
/// `strftime` with no `default` branch yields `Null` at the call site;
/// this function is only reached once a format string is available.
pub fn strftime(instant: Instant, format: &str) -> String {
    instant.format(format).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> Instant {
        Utc.with_ymd_and_hms(y, m, d, h, mi, s).unwrap()
    }

    #[test]
    fn resolves_table_attributes() {
        let t = dt(2020, 2, 4, 19, 7, 38);
        let locale = LocaleNames::default();
        assert_eq!(resolve_attr(t, "date", &locale).unwrap(), "2020-02-04");
        assert_eq!(resolve_attr(t, "year", &locale).unwrap(), "2020");
        assert_eq!(resolve_attr(t, "yy", &locale).unwrap(), "20");
        assert_eq!(resolve_attr(t, "month", &locale).unwrap(), "February");
        assert_eq!(resolve_attr(t, "mon", &locale).unwrap(), "Feb");
        assert_eq!(resolve_attr(t, "mm", &locale).unwrap(), "02");
        assert_eq!(resolve_attr(t, "dd", &locale).unwrap(), "04");
        assert_eq!(resolve_attr(t, "dow", &locale).unwrap(), "Tuesday");
        assert_eq!(resolve_attr(t, "doy", &locale).unwrap(), "035");
        assert_eq!(resolve_attr(t, "hour", &locale).unwrap(), "19");
        assert_eq!(resolve_attr(t, "min", &locale).unwrap(), "07");
        assert_eq!(resolve_attr(t, "sec", &locale).unwrap(), "38");
    }

    #[test]
    fn unknown_attr_is_none() {
        let t = dt(2020, 2, 4, 19, 7, 38);
        assert_eq!(resolve_attr(t, "nope", &LocaleNames::default()), None);
    }

    #[test]
    fn strftime_formats_like_the_spec_example() {
        let t = dt(2020, 2, 4, 19, 7, 38);
        assert_eq!(strftime(t, "%Y-%m-%d-%H%M%S"), "2020-02-04-190738");
    }
}

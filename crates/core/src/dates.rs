//! Relative date expressions ("last friday", "2 weeks ago", "yesterday").
//!
//! Parsing is anchored on a caller-supplied `today` so results are
//! reproducible. Months are fixed 30-day blocks, not calendar months.

use std::sync::OnceLock;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use regex::Regex;

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

pub const DAYS_PER_WEEK: u64 = 7;
pub const DAYS_PER_MONTH: u64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Offset {
    DaysAgo,
    WeeksAgo,
    MonthsAgo,
    Yesterday,
    LastWeek,
    LastMonth,
}

struct Patterns {
    last_weekday: Regex,
    offsets: Vec<(Regex, Offset)>,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |pattern: &str| Regex::new(pattern).expect("static date pattern compiles");
        Patterns {
            last_weekday: compile(
                r"last\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)",
            ),
            offsets: vec![
                (compile(r"(\d+)\s+days?\s+ago"), Offset::DaysAgo),
                (compile(r"(\d+)\s+weeks?\s+ago"), Offset::WeeksAgo),
                (compile(r"(\d+)\s+months?\s+ago"), Offset::MonthsAgo),
                (compile(r"yesterday"), Offset::Yesterday),
                (compile(r"last\s+week"), Offset::LastWeek),
                (compile(r"last\s+month"), Offset::LastMonth),
            ],
        }
    })
}

/// Resolves a natural-language date phrase relative to `today`.
///
/// Returns `None` when no recognised phrase occurs in `text`, which callers
/// treat as "no date filter".
pub fn parse_relative_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = text.trim().to_lowercase();
    let patterns = patterns();

    let mentioned: Vec<&str> = patterns
        .last_weekday
        .captures_iter(&text)
        .filter_map(|captures| captures.get(1).map(|name| name.as_str()))
        .collect();
    if let Some((_, weekday)) = WEEKDAYS.iter().find(|(name, _)| mentioned.contains(name)) {
        return last_weekday(*weekday, today);
    }

    for (pattern, offset) in &patterns.offsets {
        let Some(captures) = pattern.captures(&text) else {
            continue;
        };

        let amount = captures.get(1).map(|amount| amount.as_str().parse::<u64>());
        let days = match (offset, amount) {
            (Offset::DaysAgo, Some(Ok(n))) => Some(n),
            (Offset::WeeksAgo, Some(Ok(n))) => n.checked_mul(DAYS_PER_WEEK),
            (Offset::MonthsAgo, Some(Ok(n))) => n.checked_mul(DAYS_PER_MONTH),
            (Offset::Yesterday, _) => Some(1),
            (Offset::LastWeek, _) => Some(DAYS_PER_WEEK),
            (Offset::LastMonth, _) => Some(DAYS_PER_MONTH),
            _ => None,
        };

        return days.and_then(|days| today.checked_sub_days(Days::new(days)));
    }

    None
}

/// Most recent `weekday` strictly before `today`; a full week back when today
/// already is that weekday. `None` when that falls before `NaiveDate::MIN`.
pub fn last_weekday(weekday: Weekday, today: NaiveDate) -> Option<NaiveDate> {
    let today_index = today.weekday().num_days_from_monday();
    let target_index = weekday.num_days_from_monday();
    let days_back = match (today_index + 7 - target_index) % 7 {
        0 => 7,
        n => n,
    };
    today.checked_sub_days(Days::new(u64::from(days_back)))
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDate, Weekday};
    use proptest::prelude::*;

    use super::{last_weekday, parse_relative_date, WEEKDAYS};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    // 2024-06-10 is a Monday.
    fn monday() -> NaiveDate {
        date(2024, 6, 10)
    }

    #[test]
    fn last_friday_from_monday_is_three_days_back() {
        assert_eq!(
            parse_relative_date("my iPhone order from last Friday", monday()),
            Some(date(2024, 6, 7))
        );
    }

    #[test]
    fn last_same_weekday_steps_back_a_full_week() {
        assert_eq!(parse_relative_date("last monday", monday()), Some(date(2024, 6, 3)));
    }

    #[test]
    fn counted_offsets_resolve_against_reference() {
        assert_eq!(parse_relative_date("3 days ago", monday()), Some(date(2024, 6, 7)));
        assert_eq!(parse_relative_date("1 day ago", monday()), Some(date(2024, 6, 9)));
        assert_eq!(parse_relative_date("2 weeks ago", monday()), Some(date(2024, 5, 27)));
        assert_eq!(parse_relative_date("1 months ago", monday()), Some(date(2024, 5, 11)));
        assert_eq!(
            parse_relative_date("ordered 2 months ago", monday()),
            Some(date(2024, 4, 11))
        );
    }

    #[test]
    fn fixed_phrases_resolve_against_reference() {
        assert_eq!(parse_relative_date("Yesterday", monday()), Some(date(2024, 6, 9)));
        assert_eq!(parse_relative_date("sometime last week", monday()), Some(date(2024, 6, 3)));
        assert_eq!(parse_relative_date("last month", monday()), Some(date(2024, 5, 11)));
    }

    #[test]
    fn weekday_phrase_takes_priority_over_last_week() {
        assert_eq!(
            parse_relative_date("last week, last tuesday", monday()),
            Some(date(2024, 6, 4))
        );
    }

    #[test]
    fn earlier_weekday_in_calendar_order_wins_when_several_are_mentioned() {
        assert_eq!(
            parse_relative_date("last sunday or maybe last wednesday", monday()),
            Some(date(2024, 6, 5))
        );
    }

    #[test]
    fn extra_whitespace_between_words_is_tolerated() {
        assert_eq!(parse_relative_date("  LAST   Friday ", monday()), Some(date(2024, 6, 7)));
        assert_eq!(parse_relative_date("3\tdays  ago", monday()), Some(date(2024, 6, 7)));
    }

    #[test]
    fn unrecognised_text_has_no_date() {
        assert_eq!(parse_relative_date("sometime", monday()), None);
        assert_eq!(parse_relative_date("", monday()), None);
        assert_eq!(parse_relative_date("a few days ago", monday()), None);
    }

    #[test]
    fn overflowing_amounts_have_no_date() {
        assert_eq!(parse_relative_date("99999999999999999999999 days ago", monday()), None);
        assert_eq!(parse_relative_date("9999999999 months ago", monday()), None);
    }

    #[test]
    fn last_weekday_helper_matches_weekday_table() {
        for (_, weekday) in WEEKDAYS {
            assert_eq!(last_weekday(weekday, monday()).map(|day| day.weekday()), Some(weekday));
        }
        assert_eq!(last_weekday(Weekday::Sun, monday()), Some(date(2024, 6, 9)));
    }

    #[test]
    fn phrases_before_the_earliest_date_have_no_date() {
        let earliest = NaiveDate::MIN;

        assert_eq!(parse_relative_date("last monday", earliest), None);
        assert_eq!(parse_relative_date("3 days ago", earliest), None);
        for (name, weekday) in WEEKDAYS {
            assert_eq!(last_weekday(weekday, earliest), None);
            assert_eq!(parse_relative_date(&format!("last {name}"), earliest), None);
        }

        let next_day = earliest.succ_opt().expect("day after MIN");
        assert_eq!(parse_relative_date("yesterday", next_day), Some(earliest));
    }

    proptest! {
        #[test]
        fn last_weekday_is_always_strictly_past(offset in 0i64..20_000, index in 0usize..7) {
            let today = date(1990, 1, 1) + chrono::Duration::days(offset);
            let (name, weekday) = WEEKDAYS[index];

            let resolved = parse_relative_date(&format!("last {name}"), today)
                .expect("weekday phrase resolves");
            let days_back = (today - resolved).num_days();

            prop_assert!(resolved < today);
            prop_assert!((1..=7).contains(&days_back));
            prop_assert_eq!(resolved.weekday(), weekday);
            prop_assert_eq!(days_back == 7, today.weekday() == weekday);
        }
    }
}

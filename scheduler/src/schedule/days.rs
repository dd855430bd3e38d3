//! Day-spec matching: decides whether "today" is an active day.

const WEEKDAYS: [&str; 5] = ["mon", "tue", "wed", "thu", "fri"];

/// Returns whether `today` (lowercase weekday abbreviation) with the given
/// day of month is active under the day spec.
///
/// Comma-separated tokens match by the first of three alternatives: exact
/// weekday abbreviation, numeric month-day (1-31), or `<weekday>/<n>` for
/// the n-th occurrence of that weekday in the month counted in strict
/// 7-day blocks from day 1.
pub fn is_active_day(days_active: &str, today: &str, day_of_month: u32) -> bool {
    if days_active == "all" {
        return true;
    }
    if days_active == "weekdays" {
        return WEEKDAYS.contains(&today);
    }
    days_active
        .split(',')
        .any(|token| token_matches(token, today, day_of_month))
}

fn token_matches(token: &str, today: &str, day_of_month: u32) -> bool {
    if token == today {
        return true;
    }
    if let Some(day) = parse_month_day(token) {
        return day == day_of_month;
    }
    if let Some((weekday, nth)) = parse_nth_weekday(token) {
        // n-th block is the inclusive day range [7n-6, 7n]
        return weekday == today && day_of_month >= nth * 7 - 6 && day_of_month <= nth * 7;
    }
    false
}

fn parse_month_day(token: &str) -> Option<u32> {
    if token.is_empty() || token.len() > 2 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let day: u32 = token.parse().ok()?;
    (1..=31).contains(&day).then_some(day)
}

fn parse_nth_weekday(token: &str) -> Option<(&str, u32)> {
    let (weekday, nth) = token.split_once('/')?;
    if weekday.len() != 3 || !weekday.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    if nth.len() != 1 || !nth.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let nth: u32 = nth.parse().ok()?;
    (nth >= 1).then_some((weekday, nth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("mon", 1; "monday first")]
    #[test_case("sat", 15; "saturday mid month")]
    #[test_case("sun", 31; "sunday last")]
    fn all_matches_every_day(today: &str, day_of_month: u32) {
        assert!(is_active_day("all", today, day_of_month));
    }

    #[test_case("mon", true)]
    #[test_case("fri", true)]
    #[test_case("sat", false)]
    #[test_case("sun", false)]
    fn weekdays_excludes_weekend(today: &str, expected: bool) {
        assert_eq!(is_active_day("weekdays", today, 10), expected);
    }

    #[test]
    fn weekday_token_matches_today() {
        assert!(is_active_day("mon,wed", "wed", 10));
        assert!(!is_active_day("mon,wed", "thu", 10));
    }

    #[test_case("15", "tue", 15, true; "plain month day")]
    #[test_case("05", "tue", 5, true; "leading zero")]
    #[test_case("15", "tue", 16, false; "wrong day")]
    #[test_case("32", "tue", 32, false; "out of range")]
    #[test_case("015", "tue", 15, false; "too many digits")]
    fn month_day_tokens(token: &str, today: &str, day_of_month: u32, expected: bool) {
        assert_eq!(is_active_day(token, today, day_of_month), expected);
    }

    #[test_case(8, true; "second block lower bound")]
    #[test_case(14, true; "second block upper bound")]
    #[test_case(7, false; "first block")]
    #[test_case(15, false; "third block")]
    fn second_monday_block(day_of_month: u32, expected: bool) {
        assert_eq!(is_active_day("mon/2", "mon", day_of_month), expected);
    }

    #[test]
    fn nth_weekday_requires_matching_weekday() {
        assert!(!is_active_day("mon/2", "tue", 8));
    }

    #[test]
    fn nth_zero_never_matches() {
        assert!(!is_active_day("mon/0", "mon", 1));
    }

    #[test]
    fn any_token_match_wins() {
        assert!(is_active_day("tue,15,mon/2", "fri", 15));
        assert!(!is_active_day("tue,16,mon/2", "fri", 15));
    }

    #[test]
    fn malformed_tokens_never_match() {
        assert!(!is_active_day("monday", "mon", 10));
        assert!(!is_active_day("mo/2", "mon", 10));
        assert!(!is_active_day("mon/22", "mon", 10));
        assert!(!is_active_day("", "mon", 10));
    }
}

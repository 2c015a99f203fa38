//! Human-readable publication dates as shown on Russian-language job boards.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

const MONTHS: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

/// Resolves phrases like `"сегодня"`, `"вчера"` or `"19 июля"` against `now`.
///
/// Absolute dates resolve to midnight UTC and take the year from `now` unless
/// one follows the month name. Anything unrecognized resolves to `now`.
pub fn parse_date_text(text: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let lowered = text.trim().to_lowercase();

    if lowered.contains("сегодня") {
        return now;
    }
    if lowered.contains("вчера") {
        return now - Duration::days(1);
    }

    parse_day_month(&lowered, now).unwrap_or(now)
}

fn parse_day_month(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let mut words = text
        .split(|c: char| c.is_whitespace() || c == ',' || c == '.')
        .filter(|word| !word.is_empty());

    let day: u32 = words.next()?.parse().ok()?;
    let month_name = words.next()?;
    let month = MONTHS.iter().position(|name| *name == month_name)? as u32 + 1;
    let year = words
        .next()
        .filter(|word| word.len() == 4)
        .and_then(|word| word.parse::<i32>().ok())
        .unwrap_or_else(|| now.year());

    let midnight = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}

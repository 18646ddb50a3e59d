//! Natural-language due-date resolution
//!
//! Phrases are resolved forward from the reference instant in the run's
//! timezone: "Friday" means the coming Friday, "Feb 10" the next Feb 10.
//! A phrase naming only a day resolves to local midnight. A weekday whose
//! resolved instant is already behind the reference moves to next week.

use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static LEADING_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:by|on|due|before|until|till|no later than|at the latest)\s+)+")
        .expect("valid regex")
});
static NAMED_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)(?:at\s+|by\s+)?(noon|midday|midnight|eod|cob|end of (?:the )?day|close of business)$")
        .expect("valid regex")
});
static MERIDIEM_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)(?:at\s+|by\s+)?(\d{1,2})(?::(\d{2}))?\s*(am|pm)$").expect("valid regex")
});
static CLOCK_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)(?:at\s+|by\s+)?(\d{1,2}):(\d{2})$").expect("valid regex")
});
static AT_HOUR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)at\s+(\d{1,2})$").expect("valid regex"));
static RELATIVE_OFFSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:in\s+)?(\w+)\s+(day|week|month|year)s?(?:\s+from\s+(?:now|today))?$")
        .expect("valid regex")
});
static WEEKDAY_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(this|next|coming|this coming)\s+)?([a-z]+)$").expect("valid regex")
});
static MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s+(\d{4}))?$").expect("valid regex")
});
static DAY_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:the\s+)?(\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?([a-z]+)\.?(?:,?\s+(\d{4}))?$")
        .expect("valid regex")
});
static NUMERIC_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})(?:/(\d{2}|\d{4}))?$").expect("valid regex")
});
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid regex"));
static ORDINAL_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:the\s+)?(\d{1,2})(?:st|nd|rd|th)(?:\s+of\s+(?:the\s+|this\s+)?month)?$")
        .expect("valid regex")
});

/// Resolve a due-date phrase to an absolute instant
///
/// Returns `None` when the phrase cannot be understood. An unknown
/// timezone falls back to UTC with a warning.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use tasklift_extractor::resolve_date;
///
/// let monday = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let friday = resolve_date("next Friday", monday, "UTC").unwrap();
/// assert_eq!(friday.to_rfc3339(), "2024-01-05T00:00:00+00:00");
/// assert!(resolve_date("not a date", monday, "UTC").is_none());
/// ```
pub fn resolve_date(
    phrase: &str,
    reference: DateTime<Utc>,
    timezone: &str,
) -> Option<DateTime<Utc>> {
    let trimmed = phrase.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(exact) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(exact.with_timezone(&Utc));
    }

    let tz = match timezone.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            warn!(timezone, "Unknown timezone, resolving dates in UTC");
            Tz::UTC
        }
    };

    let now = reference.with_timezone(&tz).naive_local();
    let text = clean_phrase(trimmed);
    let (rest, time) = split_time(&text);

    let date = if rest.is_empty() {
        let time = time?;
        if time > now.time() {
            now.date()
        } else {
            now.date().checked_add_days(Days::new(1))?
        }
    } else {
        resolve_day(rest, now.date())?
    };

    let mut local = date.and_time(time.unwrap_or(NaiveTime::MIN));
    if local < now && names_weekday(rest) {
        local = local.checked_add_days(Days::new(7))?;
    }
    localize(&tz, local)
}

fn names_weekday(text: &str) -> bool {
    WEEKDAY_PHRASE
        .captures(text)
        .is_some_and(|caps| weekday(&caps[2]).is_some())
}

fn clean_phrase(phrase: &str) -> String {
    let lower = phrase
        .to_lowercase()
        .replace("a.m.", "am")
        .replace("p.m.", "pm");
    let collapsed = lower.split_whitespace().collect::<Vec<_>>().join(" ");
    let stripped = collapsed.trim_end_matches(['.', ',', ';', '!', '?']);
    LEADING_WORDS.replace(stripped, "").trim().to_string()
}

/// Split a trailing time of day off the phrase
///
/// A bare number only counts as a time after "at", so "feb 10" keeps its day.
fn split_time(text: &str) -> (&str, Option<NaiveTime>) {
    if let Some(caps) = NAMED_TIME.captures(text) {
        let time = match &caps[1] {
            "noon" | "midday" => NaiveTime::from_hms_opt(12, 0, 0),
            "midnight" => NaiveTime::from_hms_opt(23, 59, 59),
            _ => NaiveTime::from_hms_opt(17, 0, 0),
        };
        return (rest_before(text, caps.get(0).map(|m| m.start())), time);
    }

    if let Some(caps) = MERIDIEM_TIME.captures(text) {
        let hour: u32 = caps[1].parse().unwrap_or(99);
        let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok()).unwrap_or(99);
        let time = match (hour, &caps[3]) {
            (1..=11, "pm") => NaiveTime::from_hms_opt(hour + 12, minute, 0),
            (12, "am") => NaiveTime::from_hms_opt(0, minute, 0),
            (1..=12, _) => NaiveTime::from_hms_opt(hour, minute, 0),
            _ => None,
        };
        if time.is_some() {
            return (rest_before(text, caps.get(0).map(|m| m.start())), time);
        }
    }

    if let Some(caps) = CLOCK_TIME.captures(text) {
        let time = match (caps[1].parse::<u32>(), caps[2].parse::<u32>()) {
            (Ok(h), Ok(m)) => NaiveTime::from_hms_opt(h, m, 0),
            _ => None,
        };
        if time.is_some() {
            return (rest_before(text, caps.get(0).map(|m| m.start())), time);
        }
    }

    if let Some(caps) = AT_HOUR.captures(text) {
        let time = caps[1]
            .parse::<u32>()
            .ok()
            .and_then(|h| NaiveTime::from_hms_opt(h, 0, 0));
        if time.is_some() {
            return (rest_before(text, caps.get(0).map(|m| m.start())), time);
        }
    }

    (text, None)
}

fn rest_before(text: &str, end: Option<usize>) -> &str {
    let rest = &text[..end.unwrap_or(text.len())];
    rest.trim_end_matches([' ', ','])
        .trim_end_matches(" at")
        .trim()
}

fn resolve_day(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    match text {
        "today" | "tonight" | "this evening" | "this afternoon" => return Some(today),
        "tomorrow" | "tmrw" | "tmr" => return today.checked_add_days(Days::new(1)),
        "day after tomorrow" | "the day after tomorrow" => {
            return today.checked_add_days(Days::new(2))
        }
        "next week" => return today.checked_add_days(Days::new(7)),
        "next month" => return today.checked_add_months(Months::new(1)),
        "next year" => return today.checked_add_months(Months::new(12)),
        "end of week" | "end of the week" | "end of this week" | "eow" | "this week" => {
            return Some(upcoming(today, Weekday::Fri, 0))
        }
        "end of next week" => {
            return upcoming(today, Weekday::Fri, 0).checked_add_days(Days::new(7))
        }
        "end of month" | "end of the month" | "end of this month" | "eom" | "this month" => {
            return last_day_of_month(today.year(), today.month())
        }
        "end of next month" => {
            let next = today.checked_add_months(Months::new(1))?;
            return last_day_of_month(next.year(), next.month());
        }
        "end of year" | "end of the year" | "end of this year" | "eoy" => {
            return NaiveDate::from_ymd_opt(today.year(), 12, 31)
        }
        _ => {}
    }

    if let Some(caps) = RELATIVE_OFFSET.captures(text) {
        let n = number_word(&caps[1])?;
        return match &caps[2] {
            "day" => today.checked_add_days(Days::new(n.into())),
            "week" => today.checked_add_days(Days::new(u64::from(n) * 7)),
            "month" => today.checked_add_months(Months::new(n)),
            _ => today.checked_add_months(Months::new(n.checked_mul(12)?)),
        };
    }

    if let Some(caps) = WEEKDAY_PHRASE.captures(text) {
        if let Some(weekday) = weekday(&caps[2]) {
            let min_ahead = if caps.get(1).is_some_and(|m| m.as_str() != "this") {
                1
            } else {
                0
            };
            return Some(upcoming(today, weekday, min_ahead));
        }
    }

    if let Some(caps) = MONTH_DAY.captures(text) {
        if let Some(month) = month(&caps[1]) {
            let day = caps[2].parse().ok()?;
            return calendar_date(today, month, day, caps.get(3).map(|m| m.as_str()));
        }
    }

    if let Some(caps) = DAY_MONTH.captures(text) {
        if let Some(month) = month(&caps[2]) {
            let day = caps[1].parse().ok()?;
            return calendar_date(today, month, day, caps.get(3).map(|m| m.as_str()));
        }
    }

    if let Some(caps) = NUMERIC_DATE.captures(text) {
        let month = caps[1].parse().ok()?;
        let day = caps[2].parse().ok()?;
        return calendar_date(today, month, day, caps.get(3).map(|m| m.as_str()));
    }

    if let Some(caps) = ISO_DATE.captures(text) {
        return NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
    }

    if let Some(caps) = ORDINAL_DAY.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let this_month = NaiveDate::from_ymd_opt(today.year(), today.month(), day);
        return match this_month {
            Some(date) if date >= today => Some(date),
            _ => {
                let next = today.checked_add_months(Months::new(1))?;
                NaiveDate::from_ymd_opt(next.year(), next.month(), day)
            }
        };
    }

    None
}

/// First `weekday` at least `min_ahead` days after `today` (within a week)
fn upcoming(today: NaiveDate, weekday: Weekday, min_ahead: u32) -> NaiveDate {
    let current = today.weekday().num_days_from_monday();
    let target = weekday.num_days_from_monday();
    let mut ahead = (target + 7 - current) % 7;
    if ahead < min_ahead {
        ahead += 7;
    }
    today + Duration::days(i64::from(ahead))
}

/// Month and day with an optional year; without one, a date already past
/// rolls to next year
fn calendar_date(today: NaiveDate, month: u32, day: u32, year: Option<&str>) -> Option<NaiveDate> {
    match year {
        Some(raw) => {
            let mut year: i32 = raw.parse().ok()?;
            if raw.len() == 2 {
                year += 2000;
            }
            NaiveDate::from_ymd_opt(year, month, day)
        }
        None => {
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
            match this_year {
                Some(date) if date >= today => Some(date),
                _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
            }
        }
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first.checked_add_months(Months::new(1))?.pred_opt()
}

fn localize(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        // Skipped by a DST jump
        LocalResult::None => tz
            .from_local_datetime(&(local + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

fn number_word(word: &str) -> Option<u32> {
    let n = match word {
        "a" | "an" | "one" => 1,
        "two" | "couple" => 2,
        "three" | "few" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        _ => return word.parse().ok(),
    };
    Some(n)
}

fn weekday(word: &str) -> Option<Weekday> {
    let day = match word {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thur" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

fn month(word: &str) -> Option<u32> {
    let month = match word {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

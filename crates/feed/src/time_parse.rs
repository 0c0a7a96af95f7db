// ABOUTME: RFC-822 style date parsing for RSS pubDate values.
// ABOUTME: Tolerates missing weekdays, short years, named zones and RFC 3339 stamps.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Named zones seen in real feeds, as seconds east of UTC.
const NAMED_ZONES: &[(&str, i32)] = &[
    ("GMT", 0),
    ("UT", 0),
    ("UTC", 0),
    ("Z", 0),
    ("EST", -5 * 3600),
    ("EDT", -4 * 3600),
    ("CST", -6 * 3600),
    ("CDT", -5 * 3600),
    ("MST", -7 * 3600),
    ("MDT", -6 * 3600),
    ("PST", -8 * 3600),
    ("PDT", -7 * 3600),
    ("AKST", -9 * 3600),
    ("AKDT", -8 * 3600),
    ("HST", -10 * 3600),
    ("WET", 0),
    ("WEST", 3600),
    ("BST", 3600),
    ("CET", 3600),
    ("CEST", 2 * 3600),
    ("EET", 2 * 3600),
    ("EEST", 3 * 3600),
    ("JST", 9 * 3600),
    ("AEST", 10 * 3600),
    ("AEDT", 11 * 3600),
];

const STAMP_FORMATS: &[&str] = &["%d %b %Y %H:%M:%S", "%e %b %Y %H:%M:%S", "%d %b %Y %H:%M"];

/// RFC 822 proper allows two-digit years.
const SHORT_YEAR_FORMATS: &[&str] = &["%d %b %y %H:%M:%S", "%d %b %y %H:%M"];

/// Parses an RSS `pubDate`. Returns None when nothing matches.
pub fn parse_rfc822_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if s.is_empty() {
        return None;
    }

    if let Some(dt) = parse_lenient(&s) {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(&s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Some feeds put Atom-style stamps in pubDate.
    DateTime::parse_from_rfc3339(&s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_lenient(s: &str) -> Option<DateTime<Utc>> {
    let body = strip_weekday(s);
    let (stamp, offset_secs) = split_zone(body);
    let short_year = stamp.split(' ').nth(2).is_some_and(|y| y.len() == 2);
    let formats = if short_year {
        SHORT_YEAR_FORMATS
    } else {
        STAMP_FORMATS
    };
    let naive = formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(stamp, fmt).ok())?;
    let offset = FixedOffset::east_opt(offset_secs)?;
    let dt = offset.from_local_datetime(&naive).single()?;
    Some(dt.with_timezone(&Utc))
}

/// Drops a leading "Mon," or "Monday " style day name.
fn strip_weekday(s: &str) -> &str {
    match s.split_once(' ') {
        Some((first, rest)) if first.trim_end_matches(',').chars().all(char::is_alphabetic) => {
            rest
        }
        _ => s,
    }
}

/// Splits a trailing zone off the stamp. Stamps without a recognizable zone
/// are taken as UTC.
fn split_zone(s: &str) -> (&str, i32) {
    let Some((stamp, zone)) = s.rsplit_once(' ') else {
        return (s, 0);
    };
    if let Some(offset) = numeric_offset(zone) {
        return (stamp, offset);
    }
    let upper = zone.to_ascii_uppercase();
    match NAMED_ZONES.iter().find(|(name, _)| *name == upper) {
        Some((_, offset)) => (stamp, *offset),
        None => (s, 0),
    }
}

/// Parses "+0200", "-07:00" or "+02".
fn numeric_offset(zone: &str) -> Option<i32> {
    let sign = match zone.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let digits: String = zone[1..].chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (
            digits[..2].parse::<i32>().ok()?,
            digits[2..].parse::<i32>().ok()?,
        ),
        _ => return None,
    };
    Some(sign * (hours * 3600 + minutes * 60))
}

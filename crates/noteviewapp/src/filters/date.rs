//! `date` and `date_modify`.
//!
//! Formats use moment-style tokens (`YYYY-MM-DD`, `MMMM D, YYYY`, `HH:mm`).
//! Text inside `[...]` is emitted literally. Output goes through a local token
//! formatter so no user-supplied string ever reaches chrono's `format`.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

use super::registry::arg_str;
use super::{FilterArg, FilterError};
use crate::value::FilterValue;

const DEFAULT_FORMAT: &str = "YYYY-MM-DD";

/// Longest first, so `MMMM` wins over `MM`.
const TOKENS: &[&str] = &[
    "YYYY", "MMMM", "dddd", "MMM", "ddd", "SSS", "YY", "MM", "Do", "DD", "HH", "hh", "mm", "ss",
    "M", "D", "H", "h", "m", "s", "A", "a", "X", "x",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

static ORDINAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d)(st|nd|rd|th)\b").expect("ordinal pattern is valid"));

const AUTO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];
const AUTO_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// A parsed input, remembering whether it carried a time of day.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Moment {
    at: NaiveDateTime,
    date_only: bool,
}

impl Moment {
    fn datetime(at: NaiveDateTime) -> Self {
        Moment {
            at,
            date_only: false,
        }
    }

    fn date(date: NaiveDate) -> Self {
        Moment {
            at: date.and_time(chrono::NaiveTime::MIN),
            date_only: true,
        }
    }
}

#[derive(Debug, PartialEq)]
enum Piece<'a> {
    Token(&'static str),
    Literal(&'a str),
}

fn tokenize(format: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut rest = format;
    while !rest.is_empty() {
        if let Some(inner) = rest.strip_prefix('[') {
            if let Some(end) = inner.find(']') {
                pieces.push(Piece::Literal(&inner[..end]));
                rest = &inner[end + 1..];
                continue;
            }
        }
        if let Some(token) = TOKENS.iter().find(|t| rest.starts_with(**t)) {
            pieces.push(Piece::Token(*token));
            rest = &rest[token.len()..];
            continue;
        }
        let len = rest.chars().next().map_or(1, char::len_utf8);
        pieces.push(Piece::Literal(&rest[..len]));
        rest = &rest[len..];
    }
    pieces
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

fn format_moment(at: &NaiveDateTime, format: &str) -> String {
    let mut out = String::new();
    let hour12 = match at.hour() % 12 {
        0 => 12,
        h => h,
    };
    for piece in tokenize(format) {
        let token = match piece {
            Piece::Literal(text) => {
                out.push_str(text);
                continue;
            }
            Piece::Token(token) => token,
        };
        let month = MONTHS[at.month0() as usize];
        let weekday = WEEKDAYS[at.weekday().num_days_from_monday() as usize];
        let rendered = match token {
            "YYYY" => format!("{:04}", at.year()),
            "YY" => format!("{:02}", at.year().rem_euclid(100)),
            "MMMM" => month.to_string(),
            "MMM" => month[..3].to_string(),
            "MM" => format!("{:02}", at.month()),
            "M" => at.month().to_string(),
            "Do" => ordinal(at.day()),
            "DD" => format!("{:02}", at.day()),
            "D" => at.day().to_string(),
            "dddd" => weekday.to_string(),
            "ddd" => weekday[..3].to_string(),
            "HH" => format!("{:02}", at.hour()),
            "H" => at.hour().to_string(),
            "hh" => format!("{:02}", hour12),
            "h" => hour12.to_string(),
            "mm" => format!("{:02}", at.minute()),
            "m" => at.minute().to_string(),
            "ss" => format!("{:02}", at.second()),
            "s" => at.second().to_string(),
            "SSS" => format!("{:03}", at.nanosecond() / 1_000_000 % 1000),
            "A" => (if at.hour() < 12 { "AM" } else { "PM" }).to_string(),
            "a" => (if at.hour() < 12 { "am" } else { "pm" }).to_string(),
            "X" => at.and_utc().timestamp().to_string(),
            "x" => at.and_utc().timestamp_millis().to_string(),
            _ => token.to_string(),
        };
        out.push_str(&rendered);
    }
    out
}

/// Translates moment tokens into a chrono parse pattern.
fn to_strftime(format: &str) -> String {
    let mut out = String::new();
    for piece in tokenize(format) {
        match piece {
            Piece::Literal(text) => out.push_str(&text.replace('%', "%%")),
            Piece::Token(token) => out.push_str(match token {
                "YYYY" => "%Y",
                "YY" => "%y",
                "MMMM" => "%B",
                "MMM" => "%b",
                "MM" | "M" => "%m",
                "Do" | "DD" | "D" => "%d",
                "dddd" => "%A",
                "ddd" => "%a",
                "HH" | "H" => "%H",
                "hh" | "h" => "%I",
                "mm" | "m" => "%M",
                "ss" | "s" => "%S",
                "SSS" => "%3f",
                "A" | "a" => "%p",
                "X" => "%s",
                _ => token,
            }),
        }
    }
    out
}

fn parse_with_format(input: &str, format: &str) -> Option<Moment> {
    let pattern = to_strftime(format);
    let input = if format.contains("Do") {
        ORDINAL_RE.replace_all(input, "$1").into_owned()
    } else {
        input.to_string()
    };
    NaiveDateTime::parse_from_str(&input, &pattern)
        .map(Moment::datetime)
        .or_else(|_| NaiveDate::parse_from_str(&input, &pattern).map(Moment::date))
        .ok()
}

fn parse_auto(input: &str) -> Option<Moment> {
    let input = input.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Some(Moment::datetime(at.naive_local()));
    }
    AUTO_DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(input, f).ok())
        .map(Moment::datetime)
        .or_else(|| {
            AUTO_DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(input, f).ok())
                .map(Moment::date)
        })
}

/// Numbers are millisecond timestamps.
fn parse_value(value: &FilterValue, input_format: Option<&str>) -> Option<Moment> {
    match value {
        FilterValue::Number(ms) if ms.is_finite() => {
            DateTime::from_timestamp_millis(*ms as i64).map(|at| Moment::datetime(at.naive_utc()))
        }
        FilterValue::Text(s) => match input_format {
            Some(format) if !format.is_empty() => parse_with_format(s.trim(), format),
            _ => parse_auto(s),
        },
        _ => None,
    }
}

fn map_scalars(
    value: &FilterValue,
    f: impl Fn(&FilterValue) -> Result<FilterValue, FilterError>,
) -> Result<FilterValue, FilterError> {
    match value {
        FilterValue::List(items) => items
            .iter()
            .map(&f)
            .collect::<Result<Vec<_>, _>>()
            .map(FilterValue::List),
        other => f(other),
    }
}

/// `date(format = "YYYY-MM-DD", inputFormat?)`.
pub fn date(value: &FilterValue, args: &[FilterArg]) -> Result<FilterValue, FilterError> {
    let format = arg_str(args, 0)
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_FORMAT);
    let input_format = arg_str(args, 1);
    map_scalars(value, |item| {
        Ok(match parse_value(item, input_format) {
            Some(moment) => FilterValue::Text(format_moment(&moment.at, format)),
            None => item.clone(),
        })
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Unit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

fn parse_modifier(expr: &str) -> Result<(i64, Unit), FilterError> {
    let mut parts = expr.split_whitespace();
    let (Some(amount), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FilterError::argument(
            "date_modify",
            format!("expected '<amount> <unit>', got '{}'", expr),
        ));
    };
    let amount: i64 = amount
        .trim_start_matches('+')
        .parse()
        .map_err(|_| FilterError::argument("date_modify", format!("bad amount '{}'", amount)))?;
    let unit = match unit.to_lowercase().trim_end_matches('s') {
        "year" | "y" => Unit::Years,
        "month" => Unit::Months,
        "week" | "w" => Unit::Weeks,
        "day" | "d" => Unit::Days,
        "hour" | "h" => Unit::Hours,
        "minute" | "min" => Unit::Minutes,
        "second" | "sec" => Unit::Seconds,
        other => {
            return Err(FilterError::argument(
                "date_modify",
                format!("unknown unit '{}'", other),
            ))
        }
    };
    Ok((amount, unit))
}

fn shift(at: NaiveDateTime, amount: i64, unit: Unit) -> Option<NaiveDateTime> {
    let months = |n: i64| -> Option<NaiveDateTime> {
        let count = Months::new(u32::try_from(n.unsigned_abs()).ok()?);
        if n >= 0 {
            at.checked_add_months(count)
        } else {
            at.checked_sub_months(count)
        }
    };
    let delta = match unit {
        Unit::Years => return months(amount.checked_mul(12)?),
        Unit::Months => return months(amount),
        Unit::Weeks => TimeDelta::try_weeks(amount)?,
        Unit::Days => TimeDelta::try_days(amount)?,
        Unit::Hours => TimeDelta::try_hours(amount)?,
        Unit::Minutes => TimeDelta::try_minutes(amount)?,
        Unit::Seconds => TimeDelta::try_seconds(amount)?,
    };
    at.checked_add_signed(delta)
}

/// `date_modify("<signed-int> <unit>")`, e.g. `"+1 month"`, `"-3 days"`.
///
/// Date-only inputs stay date-only (`%Y-%m-%d`); anything with a time of day
/// comes back as `%Y-%m-%dT%H:%M:%S`. Unparsable values pass through.
pub fn date_modify(value: &FilterValue, args: &[FilterArg]) -> Result<FilterValue, FilterError> {
    let expr = arg_str(args, 0)
        .ok_or_else(|| FilterError::argument("date_modify", "missing modifier"))?;
    let (amount, unit) = parse_modifier(expr)?;
    map_scalars(value, |item| {
        let Some(moment) = parse_value(item, None) else {
            return Ok(item.clone());
        };
        let shifted = shift(moment.at, amount, unit).ok_or_else(|| {
            FilterError::argument(
                "date_modify",
                format!("{} {:?} is out of range", amount, unit),
            )
        })?;
        let keeps_date_only =
            moment.date_only && !matches!(unit, Unit::Hours | Unit::Minutes | Unit::Seconds);
        let pattern = if keeps_date_only {
            "%Y-%m-%d"
        } else {
            "%Y-%m-%dT%H:%M:%S"
        };
        Ok(FilterValue::Text(shifted.format(pattern).to_string()))
    })
}

//! List filters and `calc`.
//!
//! Indexing follows the familiar negative-from-the-end convention: `slice:-2`
//! keeps the last two items (or characters, for text).

use super::registry::arg_str;
use super::{FilterArg, FilterError};
use crate::value::{parse_number, FilterValue};

type FilterResult = Result<FilterValue, FilterError>;

pub fn split(value: &FilterValue, args: &[FilterArg]) -> FilterResult {
    let sep = arg_str(args, 0).unwrap_or(",");
    Ok(match value {
        FilterValue::Text(s) if sep.is_empty() => {
            FilterValue::List(s.chars().map(|c| FilterValue::Text(c.to_string())).collect())
        }
        FilterValue::Text(s) => FilterValue::list(s.split(sep).map(str::trim)),
        other => other.clone(),
    })
}

pub fn join(value: &FilterValue, args: &[FilterArg]) -> FilterResult {
    let sep = arg_str(args, 0).unwrap_or(",");
    Ok(match value {
        FilterValue::List(items) => FilterValue::Text(
            items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(sep),
        ),
        other => other.clone(),
    })
}

pub fn first(value: &FilterValue, _args: &[FilterArg]) -> FilterResult {
    Ok(match value {
        FilterValue::List(items) => items.first().cloned().unwrap_or_default(),
        other => other.clone(),
    })
}

pub fn last(value: &FilterValue, _args: &[FilterArg]) -> FilterResult {
    Ok(match value {
        FilterValue::List(items) => items.last().cloned().unwrap_or_default(),
        other => other.clone(),
    })
}

/// Resolves a possibly negative index against `len`, clamped to `0..=len`.
fn resolve_index(index: i64, len: usize) -> usize {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    resolved.clamp(0, len) as usize
}

fn bounds(args: &[FilterArg], len: usize) -> Result<(usize, usize), FilterError> {
    let start = match args.first() {
        Some(arg) => arg
            .as_index()
            .ok_or_else(|| FilterError::argument("slice", format!("bad start '{}'", arg.as_str())))?,
        None => 0,
    };
    let end = match args.get(1) {
        Some(arg) => Some(
            arg.as_index()
                .ok_or_else(|| FilterError::argument("slice", format!("bad end '{}'", arg.as_str())))?,
        ),
        None => None,
    };
    let start = resolve_index(start, len);
    let end = end.map_or(len, |e| resolve_index(e, len));
    Ok((start, end.max(start)))
}

/// `slice(start, end?)` on lists or text.
pub fn slice(value: &FilterValue, args: &[FilterArg]) -> FilterResult {
    Ok(match value {
        FilterValue::List(items) => {
            let (start, end) = bounds(args, items.len())?;
            FilterValue::List(items[start..end].to_vec())
        }
        FilterValue::Text(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = bounds(args, chars.len())?;
            FilterValue::Text(chars[start..end].iter().collect())
        }
        other => other.clone(),
    })
}

/// List length, or character count for scalars.
pub fn count(value: &FilterValue, _args: &[FilterArg]) -> FilterResult {
    let n = match value {
        FilterValue::Empty => 0,
        FilterValue::List(items) => items.len(),
        other => other.to_string().chars().count(),
    };
    Ok(FilterValue::Number(n as f64))
}

/// `calc(expr)`: `+3`, `-1`, `*2`, `/4`, `^2` or `**2` applied to the
/// numeric value. Anything that does not compute returns the input unchanged.
pub fn calc(value: &FilterValue, args: &[FilterArg]) -> FilterResult {
    let Some(input) = value.as_number() else {
        return Ok(value.clone());
    };
    let Some(expr) = arg_str(args, 0).map(str::trim) else {
        return Ok(value.clone());
    };
    let (op, operand) = match expr.strip_prefix("**") {
        Some(rest) => ('^', rest),
        None => {
            let mut chars = expr.chars();
            match chars.next() {
                Some(op @ ('+' | '-' | '*' | '/' | '^')) => (op, chars.as_str()),
                _ => return Ok(value.clone()),
            }
        }
    };
    let Some(operand) = parse_number(operand) else {
        return Ok(value.clone());
    };
    let result = match op {
        '+' => input + operand,
        '-' => input - operand,
        '*' => input * operand,
        '/' => input / operand,
        _ => input.powf(operand),
    };
    if !result.is_finite() {
        return Ok(value.clone());
    }
    Ok(FilterValue::Number(result))
}

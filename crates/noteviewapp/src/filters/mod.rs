//! # Filter Chains
//!
//! A placeholder may pipe its value through a chain of named transforms:
//!
//! ```text
//! {{ published | date:"MMMM D, YYYY" }}
//! {{ title | replace:("/\s+/g", "-") | lower }}
//! {{ score | calc:+3 | calc:**2 }}
//! ```
//!
//! ## Chain Syntax
//!
//! - Steps are separated by `|`. A `|` inside a quoted span (`"..."` or `'...'`)
//!   does not split.
//! - Each step is `name` or `name:args`, split on the first `:`.
//! - Args may be wrapped in one layer of `( )`, are separated by `,` outside
//!   quotes, trimmed, and unquoted once. An arg that is entirely a number is
//!   also available numerically (see [`FilterArg`]).
//!
//! ## Failure Model
//!
//! Chains never fail as a whole:
//!
//! - An unknown filter name is a no-op; the value passes through.
//! - A filter that returns an error is logged with `tracing::warn!` and the chain
//!   continues with the value from before that step.
//!
//! ## Registry
//!
//! | Group | Filters |
//! |-------|---------|
//! | Dates | `date`, `date_modify` |
//! | Text | `capitalize`, `upper`, `lower`, `title`, `camel`, `kebab`, `snake`, `trim`, `replace`, `strip_tags` |
//! | Markdown | `wikilink`, `link`, `image`, `blockquote` |
//! | Lists | `split`, `join`, `first`, `last`, `slice`, `count` |
//! | Math | `calc` |

mod date;
mod list;
mod markdown;
mod parse;
mod registry;
mod text;

use thiserror::Error;
use tracing::{debug, warn};

use crate::value::FilterValue;

pub use parse::{parse_args, split_chain, split_step};
pub use registry::{filter_names, lookup, FilterFn};

/// One parsed filter argument.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterArg {
    Text(String),
    /// An arg that parsed fully as a number. `raw` keeps the text as written
    /// (after unquoting), so `calc:+3` still sees its `+`.
    Number { value: f64, raw: String },
}

impl FilterArg {
    pub fn as_str(&self) -> &str {
        match self {
            FilterArg::Text(s) => s,
            FilterArg::Number { raw, .. } => raw,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FilterArg::Number { value, .. } => Some(*value),
            FilterArg::Text(_) => None,
        }
    }

    /// Integral numeric value, truncated toward zero.
    pub fn as_index(&self) -> Option<i64> {
        self.as_number().map(|n| n as i64)
    }
}

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("invalid regex /{pattern}/: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unsupported regex flag '{0}'")]
    UnsupportedFlag(char),

    #[error("{filter}: {message}")]
    InvalidArgument {
        filter: &'static str,
        message: String,
    },
}

impl FilterError {
    pub(crate) fn argument(filter: &'static str, message: impl Into<String>) -> Self {
        FilterError::InvalidArgument {
            filter,
            message: message.into(),
        }
    }
}

/// Runs `value` through every step of `chain`, left to right.
pub fn apply_filter_chain(value: FilterValue, chain: &str) -> FilterValue {
    let mut current = value;
    for step in split_chain(chain) {
        let (name, raw_args) = split_step(step);
        if name.is_empty() {
            continue;
        }
        let Some(filter) = lookup(name) else {
            debug!(filter = name, "unknown filter; passing value through");
            continue;
        };
        let args = parse_args(raw_args);
        match filter(&current, &args) {
            Ok(next) => current = next,
            Err(error) => {
                warn!(filter = name, %error, "filter failed; keeping previous value");
            }
        }
    }
    current
}

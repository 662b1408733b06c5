// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Expansion of compact identifier notations like `INV02-05, 7,8` or
//! `MPPT 1-3` into explicit lists of identifiers.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::Error;

/// Whitespace around a range dash is not significant: `1 - 3` is `1-3`.
static RANGE_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*-\s*").unwrap());

/// Ranges wider than this are rejected instead of being expanded.
const MAX_RANGE_SPAN: u32 = 10_000;

/// A parsed identifier notation.
///
/// The alphabetic prefix (`INV`, `MPPT`, ...) is kept only to format labels
/// for the expanded values; it never changes the set of values.
#[derive(Clone, Debug, PartialEq)]
pub struct Notation {
    raw: String,
    prefix: String,
    width: usize,
    values: Vec<u32>,
}

/// Expands the given notation into the ordered, duplicate-free list of
/// integers it denotes.
///
/// ```
/// use frequenz_pv_design_report::expand_notation;
///
/// assert_eq!(expand_notation("INV02-05, 7,8").unwrap(), vec![2, 3, 4, 5, 7, 8]);
/// assert_eq!(expand_notation("MPPT 1-3").unwrap(), vec![1, 2, 3]);
/// assert!(expand_notation("INV02-").is_err());
/// ```
pub fn expand_notation(notation: &str) -> Result<Vec<u32>, Error> {
    Notation::parse(notation).map(|n| n.values)
}

impl Notation {
    /// Parses the given notation.
    ///
    /// Tokens are separated by commas and/or whitespace.  Each token is either
    /// a single integer or an inclusive `A-B` range, optionally preceded by an
    /// alphabetic prefix, which may also stand alone as its own token.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let normalized = RANGE_DASH.replace_all(raw.trim(), "-");
        let tokens = normalized
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>();

        let mut prefix = String::new();
        let mut width = None;
        let mut seen = HashSet::new();
        let mut values = vec![];

        for (pos, token) in tokens.iter().enumerate() {
            let Some(digits_start) = token.find(|c: char| c.is_ascii_digit()) else {
                // A bare prefix word is only valid in front of a number.
                let next_is_number = tokens
                    .get(pos + 1)
                    .is_some_and(|t| t.starts_with(|c: char| c.is_ascii_digit()));
                if !is_prefix(token) || !next_is_number {
                    return Err(Error::notation(format!(
                        "Can't parse token `{token}` in `{raw}`."
                    )));
                }
                if values.is_empty() {
                    prefix.push_str(token);
                }
                continue;
            };

            let (token_prefix, body) = token.split_at(digits_start);
            if !is_prefix(token_prefix) {
                return Err(Error::notation(format!(
                    "Can't parse token `{token}` in `{raw}`."
                )));
            }
            if values.is_empty() {
                prefix.push_str(token_prefix);
            }

            let (start, end) = parse_token(body).ok_or_else(|| {
                Error::notation(format!("Can't parse token `{body}` in `{raw}`."))
            })?;
            if start > end {
                return Err(Error::notation(format!(
                    "Range `{body}` in `{raw}` starts after it ends."
                )));
            }
            if end - start > MAX_RANGE_SPAN {
                return Err(Error::notation(format!(
                    "Range `{body}` in `{raw}` is too wide."
                )));
            }
            if width.is_none() {
                width = body.split('-').next().map(str::len);
            }

            for value in start..=end {
                if seen.insert(value) {
                    values.push(value);
                }
            }
        }

        if values.is_empty() {
            return Err(Error::notation(format!("No identifiers found in `{raw}`.")));
        }

        Ok(Self {
            raw: raw.to_string(),
            prefix: prefix.replace('#', ""),
            width: width.unwrap_or(1),
            values,
        })
    }

    /// Returns the notation as it appeared in the source.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the alphabetic prefix of the notation, if any.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the expanded values.
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    /// Formats a label for every expanded value, using the notation's own
    /// prefix, or `default_prefix` when it has none, and zero-padding numbers
    /// to the width they were written with, but at least to `min_width`.
    pub(crate) fn labels(&self, default_prefix: &str, min_width: usize) -> Vec<String> {
        let prefix = if self.prefix.is_empty() {
            default_prefix
        } else {
            &self.prefix
        };
        let width = self.width.max(min_width);
        self.values
            .iter()
            .map(|v| format!("{prefix}{v:0width$}"))
            .collect()
    }
}

fn is_prefix(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphabetic() || c == '#')
}

/// Parses `A` or `A-B` into an inclusive range.  The end of a range may repeat
/// the prefix, as in `INV02-INV05`.
fn parse_token(body: &str) -> Option<(u32, u32)> {
    match body.split_once('-') {
        Some((start, end)) => {
            let end = end.trim_start_matches(|c: char| c.is_ascii_alphabetic() || c == '#');
            Some((start.parse().ok()?, end.parse().ok()?))
        }
        None => {
            let value = body.parse().ok()?;
            Some((value, value))
        }
    }
}

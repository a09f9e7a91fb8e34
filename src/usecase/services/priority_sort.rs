//! Stable ordering by a status priority list with a secondary tie-breaker.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// A secondary sort key with type-aware comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Null,
    Number(f64),
    Date(NaiveDateTime),
    Text(String),
}

impl SortValue {
    /// Reads a cell value: numbers first, then dates, then plain text.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if let Ok(number) = trimmed.parse::<f64>() {
            if number.is_finite() {
                return SortValue::Number(number);
            }
        }
        match parse_date(trimmed) {
            Some(date) => SortValue::Date(date),
            None => SortValue::Text(text.to_string()),
        }
    }

    fn as_text(&self) -> String {
        match self {
            SortValue::Null => String::new(),
            SortValue::Number(number) => number.to_string(),
            SortValue::Date(date) => date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            SortValue::Text(text) => text.clone(),
        }
    }
}

impl From<&str> for SortValue {
    fn from(value: &str) -> Self {
        SortValue::parse(value)
    }
}

impl From<String> for SortValue {
    fn from(value: String) -> Self {
        SortValue::parse(&value)
    }
}

impl From<f64> for SortValue {
    fn from(value: f64) -> Self {
        SortValue::Number(value)
    }
}

impl From<i64> for SortValue {
    fn from(value: i64) -> Self {
        SortValue::Number(value as f64)
    }
}

impl From<NaiveDate> for SortValue {
    fn from(value: NaiveDate) -> Self {
        SortValue::Date(value.and_time(chrono::NaiveTime::MIN))
    }
}

impl From<NaiveDateTime> for SortValue {
    fn from(value: NaiveDateTime) -> Self {
        SortValue::Date(value)
    }
}

impl<T: Into<SortValue>> From<Option<T>> for SortValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SortValue::Null, Into::into)
    }
}

fn parse_date(text: &str) -> Option<NaiveDateTime> {
    if let Ok(date_time) = DateTime::parse_from_rfc3339(text) {
        return Some(date_time.naive_utc());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(text, format) {
            return Some(date_time);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date.and_time(chrono::NaiveTime::MIN));
        }
    }
    None
}

/// Nulls first; numbers numerically; dates chronologically; anything else as
/// case-insensitive natural text.
pub fn compare_values(left: &SortValue, right: &SortValue) -> Ordering {
    match (left, right) {
        (SortValue::Null, SortValue::Null) => Ordering::Equal,
        (SortValue::Null, _) => Ordering::Less,
        (_, SortValue::Null) => Ordering::Greater,
        (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
        (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
        _ => natural_cmp(&left.as_text(), &right.as_text()),
    }
}

/// Case-insensitive comparison where digit runs compare by numeric value,
/// so `"item2"` sorts before `"item10"`.
pub fn natural_cmp(left: &str, right: &str) -> Ordering {
    let mut a = left.chars().peekable();
    let mut b = right.chars().peekable();

    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let run_a = take_digits(&mut a);
                let run_b = take_digits(&mut b);
                let ordering = compare_digit_runs(&run_a, &run_b);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                let ordering = x.to_lowercase().cmp(y.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    run
}

fn compare_digit_runs(left: &str, right: &str) -> Ordering {
    let left = left.trim_start_matches('0');
    let right = right.trim_start_matches('0');
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}

/// Orders `items` by the rank of their primary key in `priority_order`.
///
/// Keys missing from the list rank after every listed key. Ties keep input order.
pub fn sort_by_priority<T, K, P>(items: &[T], primary_key: P, priority_order: &[K]) -> Vec<T>
where
    T: Clone,
    K: AsRef<str>,
    P: Fn(&T) -> Option<&str>,
{
    ranked_sort(items, primary_key, priority_order, None)
}

/// Like [`sort_by_priority`], breaking rank ties with `secondary_key` before
/// falling back to input order.
pub fn sort_by_priority_then<T, K, P, S>(
    items: &[T],
    primary_key: P,
    priority_order: &[K],
    secondary_key: S,
) -> Vec<T>
where
    T: Clone,
    K: AsRef<str>,
    P: Fn(&T) -> Option<&str>,
    S: Fn(&T) -> SortValue,
{
    ranked_sort(items, primary_key, priority_order, Some(&secondary_key))
}

fn ranked_sort<T, K, P>(
    items: &[T],
    primary_key: P,
    priority_order: &[K],
    secondary_key: Option<&dyn Fn(&T) -> SortValue>,
) -> Vec<T>
where
    T: Clone,
    K: AsRef<str>,
    P: Fn(&T) -> Option<&str>,
{
    let unranked = priority_order.len();
    let mut keyed: Vec<(usize, Option<SortValue>, usize)> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let rank = primary_key(item)
                .and_then(|key| priority_order.iter().position(|p| p.as_ref() == key))
                .unwrap_or(unranked);
            (rank, secondary_key.map(|secondary| secondary(item)), index)
        })
        .collect();

    keyed.sort_by(|(rank_a, value_a, index_a), (rank_b, value_b, index_b)| {
        rank_a
            .cmp(rank_b)
            .then_with(|| match (value_a, value_b) {
                (Some(a), Some(b)) => compare_values(a, b),
                _ => Ordering::Equal,
            })
            .then_with(|| index_a.cmp(index_b))
    });

    keyed
        .into_iter()
        .map(|(_, _, index)| items[index].clone())
        .collect()
}

//! Recognition of calendar periods in header labels and cell values.
//!
//! A period maps to an ordinal within its family, so that a run of labels
//! such as `Jan, Feb, Mar` or `2024Q1, 2024Q2` can be checked for ordering.

use crate::cell::{Cell, CellValue, ValueKind};
use chrono::Datelike;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Family {
    Day,
    Month,
    Quarter,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Period {
    pub family: Family,
    pub ordinal: i64,
}

impl Period {
    fn new(family: Family, ordinal: i64) -> Self {
        Self { family, ordinal }
    }
}

const MONTHS: [[&str; 3]; 12] = [
    ["jan", "january", "一月"],
    ["feb", "february", "二月"],
    ["mar", "march", "三月"],
    ["apr", "april", "四月"],
    ["may", "may", "五月"],
    ["jun", "june", "六月"],
    ["jul", "july", "七月"],
    ["aug", "august", "八月"],
    ["sep", "september", "九月"],
    ["oct", "october", "十月"],
    ["nov", "november", "十一月"],
    ["dec", "december", "十二月"],
];

/// Interpret a body cell as a point in time.
///
/// Real dates map to days; `YYYY-MM`, month names, and quarter labels map to
/// their own families. Plain numbers are not periods.
pub(crate) fn value_period(cell: &Cell) -> Option<Period> {
    match cell.value() {
        CellValue::Date(dt) => Some(Period::new(
            Family::Day,
            i64::from(dt.date().num_days_from_ce()),
        )),
        CellValue::String(s) if cell.kind() != ValueKind::Number => label_period(s.trim()),
        _ => None,
    }
}

/// Interpret a header label as a period. Unlike body values, integer
/// labels (years, sequence numbers) are accepted.
pub(crate) fn header_period(cell: &Cell) -> Option<Period> {
    match cell.value() {
        CellValue::Int(i) => Some(Period::new(Family::Integer, *i)),
        CellValue::Float(f) if f.fract() == 0.0 => Some(Period::new(Family::Integer, *f as i64)),
        _ => {
            let text = cell.text();
            text.parse::<i64>()
                .ok()
                .map(|i| Period::new(Family::Integer, i))
                .or_else(|| value_period(cell))
                .or_else(|| label_period(&text))
        }
    }
}

fn label_period(text: &str) -> Option<Period> {
    if text.is_empty() {
        return None;
    }
    if let Some(month) = month_index(text) {
        return Some(Period::new(Family::Month, month));
    }
    if let Some(caps) = year_month_regex().captures(text) {
        let year: i64 = caps[1].parse().ok()?;
        let month: i64 = caps[2].parse().ok()?;
        if (1..=12).contains(&month) {
            return Some(Period::new(Family::Month, year * 12 + month - 1));
        }
    }
    if let Some(caps) = quarter_regex().captures(text) {
        let year: i64 = caps
            .get(1)
            .or_else(|| caps.get(3))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        let quarter: i64 = caps[2].parse().ok()?;
        return Some(Period::new(Family::Quarter, year * 4 + quarter - 1));
    }
    None
}

fn month_index(text: &str) -> Option<i64> {
    let lower = text.to_lowercase();
    let word = lower.trim_end_matches('.');
    if let Some(index) = MONTHS
        .iter()
        .position(|names| names.contains(&word) || (word == "sept" && names[0] == "sep"))
    {
        return Some(index as i64);
    }
    let number = word.strip_suffix('月')?;
    let month: i64 = number.parse().ok()?;
    (1..=12).contains(&month).then_some(month - 1)
}

fn year_month_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4})\s*(?:[-/.]|年)\s*(\d{1,2})\s*月?$").expect("valid year-month regex")
    })
}

fn quarter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:(\d{4})\s*[-/ ]?\s*)?(?:q|quarter\s*)([1-4])(?:\s*[-/ ]?\s*(\d{4}))?$")
            .expect("valid quarter regex")
    })
}

/// Length of the longest ordered run of `family` labels, scanning left to
/// right and skipping labels that break the order. Integers must step by
/// exactly one; other families only need to increase.
pub(crate) fn ordered_matches(periods: &[Option<Period>], family: Family) -> usize {
    let mut matched = 0;
    let mut last: Option<i64> = None;
    for period in periods.iter().flatten().filter(|p| p.family == family) {
        let in_order = match last {
            None => true,
            Some(prev) if family == Family::Integer => {
                prev.checked_add(1) == Some(period.ordinal)
            }
            Some(prev) => period.ordinal > prev,
        };
        if in_order {
            matched += 1;
            last = Some(period.ordinal);
        }
    }
    matched
}

/// Most frequent family among the labels; ties go to the first seen.
pub(crate) fn dominant_family(periods: &[Option<Period>]) -> Option<Family> {
    let mut counts: Vec<(Family, usize)> = Vec::new();
    for period in periods.iter().flatten() {
        match counts.iter_mut().find(|(family, _)| *family == period.family) {
            Some((_, count)) => *count += 1,
            None => counts.push((period.family, 1)),
        }
    }
    counts
        .iter()
        .fold(None, |best: Option<(Family, usize)>, &(family, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((family, count)),
        })
        .map(|(family, _)| family)
}

//! Table archetype classification.
//!
//! The body below the header is checked against the archetypes in a fixed
//! priority order; the first whose signal exceeds its configured threshold
//! wins, and `standard` catches everything else.

use crate::cell::{Cell, CellValue, ValueKind};
use crate::columns::Column;
use crate::config::DetectorConfig;
use crate::error::Result;
use crate::grid::Grid;
use crate::periods::{self, Family};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Structural layout of a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    BudgetComparison,
    TimeSeries,
    Pivot,
    Hierarchical,
    Standard,
}

impl Archetype {
    /// Evaluation order: specific layouts before the generic fallback.
    pub const PRIORITY: [Archetype; 5] = [
        Archetype::BudgetComparison,
        Archetype::TimeSeries,
        Archetype::Pivot,
        Archetype::Hierarchical,
        Archetype::Standard,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Archetype::BudgetComparison => "budget_comparison",
            Archetype::TimeSeries => "time_series",
            Archetype::Pivot => "pivot",
            Archetype::Hierarchical => "hierarchical",
            Archetype::Standard => "standard",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Winning archetype and the strength of its discriminating signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub archetype: Archetype,
    pub signal: f64,
}

/// Signal reported for `standard` whenever the body has rows.
pub const STANDARD_SIGNAL: f64 = 0.5;

/// Archetype heuristics with their keyword matchers compiled once.
#[derive(Debug, Clone)]
pub struct ArchetypeClassifier {
    thresholds: [(Archetype, f64); 4],
    budget_roles: [Vec<String>; 3],
    rate_pattern: Option<Regex>,
    pivot_max_categories: usize,
}

impl ArchetypeClassifier {
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        let lowercase = |keywords: &[String]| -> Vec<String> {
            keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        };
        // Variance goes first so that "Budget Variance" is not taken as the
        // budget column.
        let budget_roles = [
            lowercase(&config.budget_keywords.variance),
            lowercase(&config.budget_keywords.budget),
            lowercase(&config.budget_keywords.actual),
        ];

        Ok(Self {
            thresholds: [
                Archetype::BudgetComparison,
                Archetype::TimeSeries,
                Archetype::Pivot,
                Archetype::Hierarchical,
            ]
            .map(|archetype| (archetype, config.threshold(archetype))),
            budget_roles,
            rate_pattern: rate_regex(&config.rate_keywords)?,
            pivot_max_categories: config.pivot_max_categories,
        })
    }

    /// Classify the body that follows `header_rows` rows starting at
    /// `data_start`.
    pub fn classify(
        &self,
        grid: &Grid,
        header_rows: usize,
        data_start: usize,
        columns: &[Column],
    ) -> Classification {
        let body_start = (data_start + header_rows).min(grid.height());
        let body_end = grid.content_height().max(body_start);
        let body = Body {
            rows: &grid.rows()[body_start..body_end],
        };

        for (archetype, threshold) in self.thresholds {
            let signal = match archetype {
                Archetype::BudgetComparison => self.budget_signal(columns),
                Archetype::TimeSeries => self.time_series_signal(&body, columns),
                Archetype::Pivot => self.pivot_signal(&body, columns),
                Archetype::Hierarchical => hierarchical_signal(&body, columns),
                Archetype::Standard => continue,
            };
            tracing::trace!(%archetype, signal, threshold, "archetype signal");
            if signal > threshold {
                return Classification { archetype, signal };
            }
        }

        Classification {
            archetype: Archetype::Standard,
            signal: STANDARD_SIGNAL,
        }
    }

    /// Fraction of the budget / actual / variance roles held by distinct
    /// columns.
    fn budget_signal(&self, columns: &[Column]) -> f64 {
        let labels: Vec<String> = columns.iter().map(|c| c.label.to_lowercase()).collect();
        let mut used: HashSet<usize> = HashSet::new();
        let mut matched = 0u32;
        for keywords in &self.budget_roles {
            let hit = labels.iter().enumerate().find(|(index, label)| {
                !used.contains(index) && keywords.iter().any(|k| label.contains(k.as_str()))
            });
            if let Some((index, _)) = hit {
                used.insert(index);
                matched += 1;
            }
        }
        f64::from(matched) / 3.0
    }

    /// Half for an ordered date/period column, half for a change-rate column.
    fn time_series_signal(&self, body: &Body<'_>, columns: &[Column]) -> f64 {
        let date_column = (0..columns.len()).find(|&col| is_period_column(body, col));
        let rate_column = columns.iter().find(|column| {
            Some(column.index) != date_column && self.is_rate_label(&column.label)
        });

        let mut signal = 0.0;
        if date_column.is_some() {
            signal += 0.5;
        }
        if rate_column.is_some() {
            signal += 0.5;
        }
        signal
    }

    fn is_rate_label(&self, label: &str) -> bool {
        label.trim_end().ends_with('%')
            || self
                .rate_pattern
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(label))
    }

    /// Share of the non-first headers forming an ordered period sequence,
    /// provided column 0 holds a small set of text categories.
    fn pivot_signal(&self, body: &Body<'_>, columns: &[Column]) -> f64 {
        if columns.len() < 2 || !self.is_categorical(body, columns) {
            return 0.0;
        }

        let periods: Vec<Option<periods::Period>> = columns[1..]
            .iter()
            .map(|column| periods::header_period(&Cell::new(CellValue::parse(&column.label))))
            .collect();

        let Some(family) = periods::dominant_family(&periods) else {
            return 0.0;
        };
        let matched = periods::ordered_matches(&periods, family);
        if matched < 2 {
            return 0.0;
        }
        matched as f64 / (columns.len() - 1) as f64
    }

    fn is_categorical(&self, body: &Body<'_>, columns: &[Column]) -> bool {
        if columns[0].inferred_kind != ValueKind::Text {
            return false;
        }
        let distinct: HashSet<String> = body
            .column(0)
            .filter(|cell| !cell.is_empty())
            .map(Cell::text)
            .collect();
        !distinct.is_empty() && distinct.len() <= self.pivot_max_categories
    }
}

/// Rows of the table body.
struct Body<'a> {
    rows: &'a [Vec<Cell>],
}

impl<'a> Body<'a> {
    fn column(&self, col: usize) -> impl Iterator<Item = &'a Cell> {
        let rows = self.rows;
        rows.iter().filter_map(move |row| row.get(col))
    }
}

/// Every non-empty value is a period of one family, strictly increasing,
/// with at least two values.
fn is_period_column(body: &Body<'_>, col: usize) -> bool {
    let mut family: Option<Family> = None;
    let mut last: Option<i64> = None;
    let mut count = 0;
    for cell in body.column(col).filter(|cell| !cell.is_empty()) {
        let Some(period) = periods::value_period(cell) else {
            return false;
        };
        if family.is_some_and(|f| f != period.family) {
            return false;
        }
        if last.is_some_and(|prev| period.ordinal <= prev) {
            return false;
        }
        family = Some(period.family);
        last = Some(period.ordinal);
        count += 1;
    }
    count >= 2
}

/// Share of adjacent pairs among the leading text columns where the left
/// column nests the right one. The columns after the text block must be
/// numeric.
fn hierarchical_signal(body: &Body<'_>, columns: &[Column]) -> f64 {
    let leading = columns
        .iter()
        .take_while(|c| c.inferred_kind == ValueKind::Text)
        .count();
    if leading < 2 || leading == columns.len() {
        return 0.0;
    }
    let rest = &columns[leading..];
    let numeric_rest = rest
        .iter()
        .all(|c| matches!(c.inferred_kind, ValueKind::Number | ValueKind::Empty))
        && rest.iter().any(|c| c.inferred_kind == ValueKind::Number);
    if !numeric_rest {
        return 0.0;
    }

    let nesting = (0..leading - 1)
        .filter(|&col| nests(body, col, col + 1))
        .count();
    nesting as f64 / (leading - 1) as f64
}

/// Column `parent` forms contiguous runs (blank cells continue the run
/// above), at least one run repeats, and `child` changes value wherever a
/// parent run ends.
fn nests(body: &Body<'_>, parent: usize, child: usize) -> bool {
    let mut seen: HashSet<String> = HashSet::new();
    let mut current: Option<String> = None;
    let mut previous_child: Option<String> = None;
    let mut run_len = 0;
    let mut repeated = false;

    for row in body.rows {
        let parent_text = row.get(parent).map(Cell::text).unwrap_or_default();
        let child_text = row.get(child).map(Cell::text).unwrap_or_default();

        let value = if parent_text.is_empty() {
            match &current {
                Some(value) => value.clone(),
                None => continue,
            }
        } else {
            parent_text
        };

        if current.as_ref() == Some(&value) {
            run_len += 1;
            repeated |= run_len >= 2;
        } else {
            if !seen.insert(value.clone()) {
                return false;
            }
            if current.is_some()
                && !child_text.is_empty()
                && previous_child.as_deref() == Some(child_text.as_str())
            {
                return false;
            }
            current = Some(value);
            run_len = 1;
        }

        if !child_text.is_empty() {
            previous_child = Some(child_text);
        }
    }

    repeated
}

/// Case-insensitive alternation of the rate keywords. ASCII words only match
/// on word boundaries so that `mom` does not fire inside `Moment`.
fn rate_regex(keywords: &[String]) -> Result<Option<Regex>> {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(|k| {
            let escaped = regex::escape(k);
            if k.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ') {
                format!(r"\b{escaped}\b")
            } else {
                escaped
            }
        })
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    Ok(Some(Regex::new(&format!("(?i){}", alternatives.join("|")))?))
}

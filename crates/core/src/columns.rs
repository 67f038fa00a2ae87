//! Column naming from (possibly merged, multi-row) headers.

use crate::cell::ValueKind;
use crate::grid::{Grid, MergedCellRange};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A resolved output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub index: usize,
    /// Full name, parent group labels joined with `" / "`.
    pub name: String,
    /// Shared by columns under the same merged header cell.
    pub group_id: Option<String>,
    pub inferred_kind: ValueKind,
    /// Leaf header text without parent labels or disambiguation suffix.
    #[serde(skip)]
    pub label: String,
}

impl Column {
    /// Column with a generated name and no inferred kind.
    pub fn placeholder(index: usize) -> Self {
        let label = generated_name(index);
        Self {
            index,
            name: label.clone(),
            group_id: None,
            inferred_kind: ValueKind::Empty,
            label,
        }
    }
}

const NAME_SEPARATOR: &str = " / ";

fn generated_name(index: usize) -> String {
    format!("Column_{}", index + 1)
}

/// Resolve one [`Column`] per grid column.
///
/// The leaf label comes from the last header row. Merged ranges that span
/// several columns above the leaf row contribute parent labels, outermost
/// first, and the innermost one provides the `group_id`.
pub fn resolve_columns(
    grid: &Grid,
    data_start: usize,
    header_rows: usize,
    merged: &[MergedCellRange],
) -> Vec<Column> {
    let header_rows = header_rows.max(1);
    let leaf_row = data_start + header_rows - 1;
    let body_start = data_start + header_rows;

    let mut columns: Vec<Column> = (0..grid.width())
        .map(|col| {
            let leaf_merge = merged.iter().find(|m| m.contains(leaf_row, col));

            let mut label = grid.text(leaf_row, col);
            if label.is_empty() {
                if let Some(range) = leaf_merge {
                    label = grid.text(range.row_start, range.col_start);
                }
            }
            if label.is_empty() {
                label = generated_name(col);
            }

            let mut parents: Vec<&MergedCellRange> = merged
                .iter()
                .filter(|m| {
                    m.spans_columns()
                        && m.covers_col(col)
                        && m.row_start >= data_start
                        && m.row_end < leaf_row
                        && !grid.text(m.row_start, m.col_start).is_empty()
                })
                .collect();
            parents.sort_by_key(|m| (m.row_start, std::cmp::Reverse(m.col_end - m.col_start)));

            let mut parts: Vec<String> = Vec::with_capacity(parents.len() + 1);
            for range in &parents {
                let text = grid.text(range.row_start, range.col_start);
                if parts.last() != Some(&text) {
                    parts.push(text);
                }
            }
            if parts.last() != Some(&label) {
                parts.push(label.clone());
            }

            let group_id = parents.last().map(|range| range.group_id());

            Column {
                index: col,
                name: parts.join(NAME_SEPARATOR),
                group_id,
                inferred_kind: dominant_kind(grid, col, body_start),
                label,
            }
        })
        .collect();

    disambiguate_names(&mut columns);
    columns
}

/// Most common non-empty kind in the body of a column. Ties resolve in the
/// order number, date, text.
fn dominant_kind(grid: &Grid, col: usize, body_start: usize) -> ValueKind {
    let (mut numbers, mut dates, mut texts) = (0usize, 0usize, 0usize);
    for row in grid.rows().iter().skip(body_start) {
        match row.get(col).map(|cell| cell.kind()) {
            Some(ValueKind::Number) => numbers += 1,
            Some(ValueKind::Date) => dates += 1,
            Some(ValueKind::Text) => texts += 1,
            Some(ValueKind::Empty) | None => {}
        }
    }
    [
        (ValueKind::Number, numbers),
        (ValueKind::Date, dates),
        (ValueKind::Text, texts),
    ]
    .into_iter()
    .fold((ValueKind::Empty, 0), |best, (kind, count)| {
        if count > best.1 {
            (kind, count)
        } else {
            best
        }
    })
    .0
}

/// Append `_1`, `_2`, ... to every occurrence of a repeated name, left to
/// right, skipping suffixes that are already taken.
fn disambiguate_names(columns: &mut [Column]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for column in columns.iter() {
        *counts.entry(column.name.clone()).or_default() += 1;
    }

    let mut taken: HashSet<String> = counts
        .iter()
        .filter(|(_, count)| **count == 1)
        .map(|(name, _)| name.clone())
        .collect();
    let mut next_suffix: HashMap<String, usize> = HashMap::new();

    for column in columns.iter_mut() {
        if counts.get(&column.name).copied().unwrap_or(0) < 2 {
            continue;
        }
        let suffix = next_suffix.entry(column.name.clone()).or_insert(1);
        let mut candidate = format!("{}_{}", column.name, suffix);
        while taken.contains(&candidate) {
            *suffix += 1;
            candidate = format!("{}_{}", column.name, suffix);
        }
        *suffix += 1;
        taken.insert(candidate.clone());
        column.name = candidate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_row_header() {
        let grid = Grid::parse_rows(vec![vec!["Name", "Qty"], vec!["Bolt", "3"]]);
        let columns = resolve_columns(&grid, 0, 1, &[]);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "Name");
        assert_eq!(columns[0].inferred_kind, ValueKind::Text);
        assert_eq!(columns[1].inferred_kind, ValueKind::Number);
        assert!(columns.iter().all(|c| c.group_id.is_none()));
    }

    #[test]
    fn test_merged_parent_labels() {
        let grid = Grid::parse_rows(vec![
            vec!["", "2024", "", ""],
            vec!["Dept", "Q1", "Q2", "Total"],
            vec!["Ops", "1", "2", "3"],
        ]);
        let merged = [MergedCellRange::new(0, 0, 1, 3)];
        let columns = resolve_columns(&grid, 0, 2, &merged);
        assert_eq!(columns[0].name, "Dept");
        assert_eq!(columns[0].group_id, None);
        assert_eq!(columns[1].name, "2024 / Q1");
        assert_eq!(columns[1].label, "Q1");
        assert_eq!(columns[3].group_id.as_deref(), Some("r0c1"));
        assert_eq!(columns[1].group_id, columns[3].group_id);
    }

    #[test]
    fn test_nested_parents_outermost_first() {
        let grid = Grid::parse_rows(vec![
            vec!["", "FY24", "", "", ""],
            vec!["", "H1", "", "H2", ""],
            vec!["Dept", "Q1", "Q2", "Q3", "Q4"],
            vec!["Ops", "1", "2", "3", "4"],
        ]);
        let merged = [
            MergedCellRange::new(0, 0, 1, 4),
            MergedCellRange::new(1, 1, 1, 2),
            MergedCellRange::new(1, 1, 3, 4),
        ];
        let columns = resolve_columns(&grid, 0, 3, &merged);
        assert_eq!(columns[2].name, "FY24 / H1 / Q2");
        assert_eq!(columns[3].name, "FY24 / H2 / Q3");
        assert_eq!(columns[2].group_id.as_deref(), Some("r1c1"));
        assert_eq!(columns[3].group_id.as_deref(), Some("r1c3"));
    }

    #[test]
    fn test_vertical_merge_supplies_leaf_label() {
        let grid = Grid::parse_rows(vec![
            vec!["Dept", "Sales", ""],
            vec!["", "East", "West"],
            vec!["Ops", "1", "2"],
        ]);
        let merged = [
            MergedCellRange::new(0, 1, 0, 0),
            MergedCellRange::new(0, 0, 1, 2),
        ];
        let columns = resolve_columns(&grid, 0, 2, &merged);
        assert_eq!(columns[0].name, "Dept");
        assert_eq!(columns[0].group_id, None);
        assert_eq!(columns[2].name, "Sales / West");
    }

    #[test]
    fn test_merge_in_single_header_row_has_no_group() {
        let grid = Grid::parse_rows(vec![
            vec!["Region", "Sales", ""],
            vec!["North", "1", "2"],
            vec!["South", "3", "4"],
        ]);
        let merged = [MergedCellRange::new(0, 0, 1, 2)];
        let columns = resolve_columns(&grid, 0, 1, &merged);
        assert_eq!(columns[2].name, "Sales_2");
        assert!(columns.iter().all(|c| c.group_id.is_none()));
    }

    #[test]
    fn test_empty_header_gets_generated_name() {
        let grid = Grid::parse_rows(vec![vec!["Name", ""], vec!["Bolt", "3"]]);
        let columns = resolve_columns(&grid, 0, 1, &[]);
        assert_eq!(columns[1].name, "Column_2");
    }

    #[test]
    fn test_duplicate_names_are_suffixed() {
        let grid = Grid::parse_rows(vec![
            vec!["Total", "Total", "Total_1", "Name"],
            vec!["1", "2", "3", "x"],
        ]);
        let columns = resolve_columns(&grid, 0, 1, &[]);
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Total_2", "Total_3", "Total_1", "Name"]);
    }

    #[test]
    fn test_placeholder() {
        let column = Column::placeholder(4);
        assert_eq!(column.name, "Column_5");
        assert_eq!(column.inferred_kind, ValueKind::Empty);
    }
}

//! Skipping report titles, unit lines and blank separators above a table.

use crate::config::DetectorConfig;
use crate::grid::{Grid, MergedCellRange};

/// Index of the first row that looks like part of the table.
///
/// Leading rows that are empty, hold a single value, or are sparse are
/// skipped until a row's occupancy exceeds `data_density`. When no such row
/// appears within `max_title_scan` rows the grid is assumed to have no title
/// block and 0 is returned.
pub fn find_data_start(grid: &Grid, merged: &[MergedCellRange], config: &DetectorConfig) -> usize {
    let width = grid.width();
    if width == 0 {
        return 0;
    }

    let limit = config.max_title_scan.min(grid.height());
    for row in 0..limit {
        let occupancy = Occupancy::of(grid, merged, row);
        let ratio = occupancy.covered as f64 / width as f64;
        let title_like = occupancy.values <= 1 || ratio <= config.title_sparsity;

        if !title_like && ratio > config.data_density {
            tracing::debug!(row, ratio, "table region starts");
            return row;
        }
        tracing::trace!(row, ratio, title_like, "skipping leading row");
    }

    tracing::debug!(limit, "no dense row in title scan window, assuming no title block");
    0
}

/// Filled cells of a row. `covered` also counts cells hidden under a merged
/// range whose anchor has a value, so a row of group labels over a
/// multi-row header is not mistaken for a sparse title line.
struct Occupancy {
    values: usize,
    covered: usize,
}

impl Occupancy {
    fn of(grid: &Grid, merged: &[MergedCellRange], row: usize) -> Self {
        let Some(cells) = grid.row(row) else {
            return Self {
                values: 0,
                covered: 0,
            };
        };

        let values = cells.iter().filter(|cell| !cell.is_empty()).count();
        let covered = cells
            .iter()
            .enumerate()
            .filter(|(col, cell)| {
                !cell.is_empty()
                    || merged.iter().any(|m| {
                        m.contains(row, *col)
                            && grid
                                .cell(m.row_start, m.col_start)
                                .is_some_and(|anchor| !anchor.is_empty())
                    })
            })
            .count();

        Self { values, covered }
    }
}

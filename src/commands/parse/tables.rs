use super::*;

/// Shading fill that marks a retired coin.
pub const DEFAULT_RETIRED_FILL: &str = "f2dbdb";

/// Grid convention of a label table: each label occupies `rows_per_label`
/// stacked rows (top label first), and only every `column_stride`-th column
/// holds labels, the rest being spacers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelLayout {
    pub rows_per_label: usize,
    pub column_stride: usize,
}

impl Default for LabelLayout {
    fn default() -> Self {
        Self {
            rows_per_label: 2,
            column_stride: 2,
        }
    }
}

impl LabelLayout {
    fn data_columns(&self, column_count: usize) -> Vec<usize> {
        (0..column_count).step_by(self.column_stride.max(1)).collect()
    }

    fn group_height(&self) -> usize {
        self.rows_per_label.max(2)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableExtraction {
    pub pairs: Vec<LabelPair>,
    pub warnings: Vec<String>,
}

pub fn is_retired_fill(cell: &Cell, retired_fill: &str) -> bool {
    cell.fill
        .as_deref()
        .is_some_and(|fill| fill.trim_start_matches('#').eq_ignore_ascii_case(retired_fill))
}

/// Label pairs in row-major order. Position counts label slots across each
/// band of rows, so the first band of a four-label table is 1..=4 and the
/// next starts at 5.
pub fn extract_label_pairs(table: &Table, layout: LabelLayout, retired_fill: &str) -> TableExtraction {
    let mut extraction = TableExtraction::default();

    let columns = layout.data_columns(table.column_count());
    let height = layout.group_height();
    let bands = table.rows.len() / height;
    let leftover = table.rows.len() % height;

    if leftover > 0 {
        extraction.warnings.push(format!(
            "table has {} rows; skipped incomplete trailing group of {} row(s)",
            table.rows.len(),
            leftover
        ));
    }

    for band in 0..bands {
        let top_row = band * height;

        for (slot, &column) in columns.iter().enumerate() {
            let top_cell = table.cell(top_row, column);
            let bottom_cells: Vec<&Cell> = (1..height)
                .filter_map(|offset| table.cell(top_row + offset, column))
                .collect();

            let top = top_cell.map(|cell| cell.text.clone()).unwrap_or_default();
            let bottom = bottom_cells
                .iter()
                .map(|cell| cell.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");

            if top.trim().is_empty() && bottom.trim().is_empty() {
                continue;
            }

            let retired = top_cell.is_some_and(|cell| is_retired_fill(cell, retired_fill))
                && !bottom_cells.is_empty()
                && bottom_cells
                    .iter()
                    .all(|cell| is_retired_fill(cell, retired_fill));

            let position = slot + 1 + band * columns.len();
            extraction.pairs.push(LabelPair {
                top,
                bottom,
                retired,
                position: u32::try_from(position).unwrap_or(u32::MAX),
            });
        }
    }

    extraction
}

use crate::model::{CellValue, ColumnResolution};

/// Reorders one source row into template column order.
///
/// The output always has one cell per template column. Unresolved columns,
/// and resolved columns beyond the end of a short row, receive `empty`.
pub fn project(resolution: &ColumnResolution, source_row: &[CellValue], empty: &CellValue) -> Vec<CellValue> {
    resolution
        .slots()
        .iter()
        .map(|&slot| {
            slot.and_then(|index| source_row.get(index))
                .cloned()
                .unwrap_or_else(|| empty.clone())
        })
        .collect()
}

/// Projects every row of a source file, preserving row order.
pub fn project_rows(
    resolution: &ColumnResolution,
    rows: &[Vec<CellValue>],
    empty: &CellValue,
) -> Vec<Vec<CellValue>> {
    rows.iter().map(|row| project(resolution, row, empty)).collect()
}

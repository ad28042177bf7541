// Primitives for reading Excel exports.

use std::path::Path;

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::pipeline::*;

/// Converts a cell of a workbook. Dates are formatted with `datetime_format`,
/// so that they read like the dates of a CSV export. Error cells have no
/// counterpart.
fn read_cell(cell: &DataType, datetime_format: &str) -> Option<Cell> {
    match cell {
        DataType::Int(i) => Some(Cell::Number(*i as f64)),
        DataType::Float(f) => Some(Cell::Number(*f)),
        DataType::String(s) => Some(Cell::raw(s)),
        DataType::Bool(b) => Some(Cell::Bool(*b)),
        DataType::Empty => Some(Cell::Empty),
        DataType::DateTime(_) => cell
            .as_datetime()
            .map(|d| Cell::Text(d.format(datetime_format).to_string())),
        _ => None,
    }
}

fn read_row(
    row: &[DataType],
    row_number: usize,
    datetime_format: &str,
    path: &str,
) -> PResult<Vec<Cell>> {
    row.iter()
        .enumerate()
        .map(|(idx, c)| {
            read_cell(c, datetime_format).context(ExcelCellSnafu {
                path,
                row: row_number,
                column: idx + 1,
                cell: format!("{:?}", c),
            })
        })
        .collect()
}

/// Reads one worksheet of an xlsx file. The first row is the header.
///
/// Without a worksheet name, the first worksheet is used.
pub fn read_excel_table(
    path: &Path,
    worksheet: Option<&str>,
    datetime_format: &str,
) -> PResult<Table> {
    let p = path.display().to_string();
    debug!("read_excel_table: path: {:?} worksheet: {:?}", p, worksheet);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path: p.clone() })?;
    let wrange = match worksheet {
        Some(name) => workbook.worksheet_range(name),
        None => workbook.worksheet_range_at(0),
    }
    .context(EmptyExcelSnafu { path: p.clone() })?
    .context(OpeningExcelSnafu { path: p.clone() })?;

    let mut rows = wrange.rows();
    let first = rows.next().context(EmptyExcelSnafu { path: p.clone() })?;
    let header: Vec<String> = read_row(first, 1, datetime_format, &p)?
        .iter()
        .map(|c| c.to_string())
        .collect();
    debug!("read_excel_table: header: {:?}", header);

    let mut table = Table::new(header);
    for (idx, row) in rows.enumerate() {
        table.push_row(read_row(row, idx + 2, datetime_format, &p)?);
    }
    info!("Read {} rows from {}", table.len(), p);
    Ok(table)
}

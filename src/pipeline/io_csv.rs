// Primitives for reading and writing CSV files.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::pipeline::{io_common::UTF8_BOM, *};

/// Reads a comma-separated file with a header row.
///
/// Rows may be shorter or longer than the header. A byte order mark at the
/// start of the file is ignored.
pub fn read_csv_table(path: &Path) -> PResult<Table> {
    let p = path.display().to_string();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path: p.clone() })?;
    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu {
            path: p.clone(),
            lineno: 1_usize,
        })?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    debug!("read_csv_table: {:?} header: {:?}", p, header);

    let mut table = Table::new(header);
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is on the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {
            path: p.clone(),
            lineno,
        })?;
        table.push_row(line.iter().map(Cell::raw).collect());
    }
    debug!("read_csv_table: {:?}: {} rows", p, table.len());
    Ok(table)
}

/// Writes a table, optionally preceded by a byte order mark so that
/// spreadsheet tools detect the UTF-8 encoding.
pub fn write_csv_table(path: &Path, table: &Table, with_bom: bool) -> PResult<()> {
    let p = path.display().to_string();
    let mut file = File::create(path).context(WritingFileSnafu { path: p.clone() })?;
    if with_bom {
        file.write_all(UTF8_BOM)
            .context(WritingFileSnafu { path: p.clone() })?;
    }
    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record(table.header())
        .context(CsvWriteSnafu { path: p.clone() })?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(|c| c.to_string()))
            .context(CsvWriteSnafu { path: p.clone() })?;
    }
    wtr.flush().context(WritingFileSnafu { path: p })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn read_ragged_rows_and_bom() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("N3.csv");
        fs::write(&p, "\u{feff}Kasutaja täisnimi,Aeg\nMari Maasikas,\"3,5\"\nJaan Tamm\n").unwrap();
        let t = read_csv_table(&p).unwrap();
        assert_eq!(t.header(), &["Kasutaja täisnimi".to_string(), "Aeg".to_string()]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows()[0][1].as_f64(), Some(3.5));
        assert_eq!(t.rows()[1][1], Cell::Empty);
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("students.csv");
        let mut t = Table::new(vec!["full_name".to_string(), "7_ajakulu".to_string()]);
        t.push_row(vec![Cell::text("Mari, Maasikas"), Cell::Number(4.5)]);
        t.push_row(vec![Cell::text("0043"), Cell::Empty]);
        write_csv_table(&p, &t, true).unwrap();
        assert!(fs::read(&p).unwrap().starts_with(UTF8_BOM));
        let back = read_csv_table(&p).unwrap();
        assert_eq!(back.header(), t.header());
        assert_eq!(back.rows()[0][1], Cell::text("4.5"));
        assert_eq!(back.rows()[0][1].as_f64(), Some(4.5));
        assert_eq!(back.rows()[1], vec![Cell::text("0043"), Cell::Empty]);
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            read_csv_table(Path::new("/nonexistent/N1.csv")),
            Err(PipelineError::CsvOpen { .. })
        ));
    }
}

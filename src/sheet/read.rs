use anyhow::{anyhow, Context as _, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;

use super::cell::{excel_serial_to_datetime, parse_date};
use super::{Cell, Table};

const CSV_DELIMITER: u8 = b';';

/// Reads the first worksheet of a workbook (xlsx, xlsm, xls, ods) or a semicolon separated CSV file.
pub fn read_table(path: &Path, header_row: usize) -> Result<Table> {
    log::info!("Reading {}...", path.display());
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let rows = if is_csv {
        read_csv_rows(path)?
    } else {
        read_workbook_rows(path)?
    };
    let table = Table::from_rows(rows, header_row);
    log::info!(
        "Reading {}...done ({} rows, columns {:?})",
        path.display(),
        table.rows().len(),
        table.headers()
    );
    Ok(table)
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| anyhow!("Failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| anyhow!("Failed to read line {}", index + 1))?;
        rows.push(
            record
                .iter()
                .enumerate()
                .map(|(column, field)| {
                    let field = if index == 0 && column == 0 {
                        field.trim_start_matches('\u{FEFF}')
                    } else {
                        field
                    };
                    Cell::text(field)
                })
                .collect(),
        );
    }
    Ok(rows)
}

fn read_workbook_rows(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| anyhow!("Failed to open workbook: {e}"))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook {} has no worksheets", path.display()))?
        .map_err(|e| anyhow!("Failed to read first worksheet: {e}"))?;
    Ok(range_to_rows(&range))
}

/// Converts a calamine range to rows anchored at A1. Calamine starts a range
/// at the first used cell, so leading empty rows and columns are restored.
fn range_to_rows(range: &Range<Data>) -> Vec<Vec<Cell>> {
    let (start_row, start_col) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));
    let mut rows = vec![vec![]; start_row];
    rows.extend(range.rows().map(|row| {
        std::iter::repeat(Cell::Empty)
            .take(start_col)
            .chain(row.iter().map(data_to_cell))
            .collect()
    }));
    rows
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s.as_str()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Number(dt.as_f64())),
        Data::DateTimeIso(s) => match parse_date(s) {
            Some(date) => date
                .and_hms_opt(0, 0, 0)
                .map(Cell::Date)
                .unwrap_or_else(|| Cell::text(s.as_str())),
            None => Cell::text(s.as_str()),
        },
        Data::DurationIso(s) => Cell::text(s.as_str()),
        Data::Error(e) => {
            log::debug!("Cell with error value {:?} read as empty", e);
            Cell::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn reads_semicolon_csv() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("input.csv");
        fs::write(
            &path,
            "\u{FEFF}Order nummer;Datum;Totaal inclusief\nVK-2024-00001;05/03/2024;121,00\n;;\n",
        )
        .unwrap();

        let table = read_table(&path, 0).unwrap();

        assert_eq!(
            &[
                "Order nummer".to_string(),
                "Datum".to_string(),
                "Totaal inclusief".to_string()
            ],
            table.headers()
        );
        assert_eq!(1, table.rows().len());
        assert_eq!(2, table.rows()[0].number);
        assert_eq!(&Cell::text("121,00"), table.rows()[0].get(2));
    }

    #[test]
    fn data_conversion() {
        assert_eq!(Cell::Empty, data_to_cell(&Data::String("  ".to_string())));
        assert_eq!(Cell::Number(3.0), data_to_cell(&Data::Int(3)));
        assert_eq!(Cell::Empty, data_to_cell(&Data::Empty));
    }

    #[test]
    fn range_is_anchored_at_a1() {
        let mut range = Range::new((1, 2), (1, 3));
        range.set_value((1, 2), Data::String("Gebouw".to_string()));
        range.set_value((1, 3), Data::Float(1.5));

        let rows = range_to_rows(&range);

        assert_eq!(2, rows.len());
        assert!(rows[0].is_empty());
        assert_eq!(
            vec![
                Cell::Empty,
                Cell::Empty,
                Cell::text("Gebouw"),
                Cell::Number(1.5)
            ],
            rows[1]
        );
    }
}

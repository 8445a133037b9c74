//! Tabular input, read from a workbook or a CSV file.

mod cell;
mod read;

pub use cell::{excel_serial_to_datetime, parse_amount, parse_date, Cell};
pub use read::read_table;

/// One data row together with the row number a spreadsheet program would show for it.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub number: usize,
    pub cells: Vec<Cell>,
}

impl SheetRow {
    pub fn get(&self, column: usize) -> &Cell {
        self.cells.get(column).unwrap_or(&Cell::Empty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<SheetRow>,
}

impl Table {
    /// Uses row `header_row` (0-based) as the header and everything below it as data.
    /// Empty header cells are named `Unnamed: <column>`. Rows without any content are dropped.
    pub fn from_rows(mut rows: Vec<Vec<Cell>>, header_row: usize) -> Self {
        let data = if rows.len() > header_row {
            rows.split_off(header_row + 1)
        } else {
            vec![]
        };
        let header_cells = rows.pop().filter(|_| rows.len() == header_row).unwrap_or_default();
        let width = data
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header_cells.len()))
            .max()
            .unwrap_or(0);
        let headers = (0..width)
            .map(|column| {
                header_cells
                    .get(column)
                    .and_then(Cell::as_text)
                    .unwrap_or_else(|| format!("Unnamed: {column}"))
            })
            .collect();
        let rows = data
            .into_iter()
            .enumerate()
            .filter(|(_, cells)| !cells.iter().all(Cell::is_empty))
            .map(|(index, cells)| SheetRow {
                // +1 for the header row, +1 for 1-based numbering
                number: header_row + index + 2,
                cells,
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[SheetRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<SheetRow> {
        self.rows
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Names from `expected` that are not a column of this table, in the given order.
    pub fn missing_columns(&self, expected: &[&str]) -> Vec<String> {
        expected
            .iter()
            .filter(|name| self.column(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }

    /// Renames columns by their position, for exports without a usable header.
    pub fn rename_positional(&mut self, names: &[&str]) {
        for (column, name) in names.iter().enumerate() {
            if let Some(header) = self.headers.get_mut(column) {
                if *header == format!("Unnamed: {column}") {
                    *header = name.to_string();
                }
            }
        }
    }
}

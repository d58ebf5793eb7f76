use crate::config::Config;
use crate::error::{ReportError, Result};
use crate::normalize::normalize_column;
use crate::types::{Column, Table};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    /// Records the parser rejected or that carried more fields than the header.
    pub skipped_rows: usize,
    pub file_missing: bool,
}

/// Load the primary sales feed. A missing file is fatal.
pub fn load_sales(path: &Path, cfg: &Config) -> Result<(Table, LoadReport)> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ReportError::MissingInput(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    let (mut table, report) = read_table(BufReader::new(file), cfg.delimiter_byte())?;
    prepare_sales(&mut table, cfg);
    info!(
        path = %path.display(),
        loaded = report.loaded_rows,
        skipped = report.skipped_rows,
        "sales data loaded"
    );
    Ok((table, report))
}

/// Load the gift-card feed. A missing file yields an empty table and a
/// report with `file_missing` set.
pub fn load_giftcards(path: &Path, cfg: &Config) -> Result<(Table, LoadReport)> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(
                path = %path.display(),
                "gift card file not found, gift card section will be empty"
            );
            let report = LoadReport {
                file_missing: true,
                ..LoadReport::default()
            };
            return Ok((Table::empty(), report));
        }
        Err(e) => return Err(e.into()),
    };
    let (mut table, report) = read_table(BufReader::new(file), cfg.delimiter_byte())?;
    prepare_giftcards(&mut table, cfg);
    info!(
        path = %path.display(),
        loaded = report.loaded_rows,
        skipped = report.skipped_rows,
        "gift card data loaded"
    );
    Ok((table, report))
}

/// Parse delimited text into a text table, dropping records the parser
/// rejects and records with more fields than the header. Short records are
/// padded with missing cells. Cells are trimmed and empty cells are missing.
pub fn read_table<R: Read>(reader: R, delimiter: u8) -> Result<(Table, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();

    let mut total_rows = 0usize;
    let mut skipped_rows = 0usize;
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for result in rdr.records() {
        total_rows += 1;
        let record = match result {
            Ok(r) => r,
            Err(_) => {
                skipped_rows += 1;
                continue;
            }
        };
        if record.len() > headers.len() {
            skipped_rows += 1;
            continue;
        }
        rows.push(
            record
                .iter()
                .map(|cell| {
                    let cell = cell.trim();
                    if cell.is_empty() {
                        None
                    } else {
                        Some(cell.to_string())
                    }
                })
                .collect(),
        );
    }

    let loaded_rows = rows.len();
    let report = LoadReport {
        total_rows,
        loaded_rows,
        skipped_rows,
        file_missing: false,
    };
    Ok((Table::from_rows(headers, rows), report))
}

/// Sales fixups: org-code sentinel remap and numeric conversion, then the
/// quantity and revenue measures.
pub fn prepare_sales(table: &mut Table, cfg: &Config) {
    let cols = &cfg.sales_columns;
    if let Some(column) = table.column_mut(&cols.org_code) {
        *column = org_codes(column, &cfg.online_code_sentinel, cfg.online_code_sentinel_value);
    } else {
        warn!(column = %cols.org_code, "organization code column missing");
    }
    for name in [&cols.quantity, &cols.revenue] {
        if !normalize_column(table, name, cfg.comma_ratio_threshold) {
            warn!(column = %name, "measure column missing in sales data");
        }
    }
}

pub fn prepare_giftcards(table: &mut Table, cfg: &Config) {
    let cols = &cfg.giftcard_columns;
    for name in [&cols.quantity, &cols.invoice, &cols.discount] {
        if !normalize_column(table, name, cfg.comma_ratio_threshold) {
            warn!(column = %name, "measure column missing in gift card data");
        }
    }
}

// Unparsable codes stay missing so the row drops out of the code-based split.
fn org_codes(column: &Column, sentinel: &str, sentinel_value: f64) -> Column {
    match column {
        Column::Number(v) => Column::Number(v.clone()),
        Column::Text(v) => Column::Number(
            v.iter()
                .map(|cell| match cell.as_deref() {
                    Some(s) if s == sentinel => Some(sentinel_value),
                    Some(s) => s.parse::<f64>().ok().filter(|n| n.is_finite()),
                    None => None,
                })
                .collect(),
        ),
    }
}

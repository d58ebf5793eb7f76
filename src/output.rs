use crate::assemble::{Cell, NumberKind, Report, Section, SUMMARY_SHEET};
use crate::error::Result;
use crate::types::{AggTable, ChannelRow, RefurbishedRow, StoreSplit, TotalRow};
use crate::util::{format_amount, format_qty};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

const RULE: &str = "------------------------------------------------------------";

// Header row sits below the title and caption rows.
const HEADER_ROW: u32 = 3;

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Print a markdown table, or a note when there is nothing to show.
pub fn print_table<T>(title: &str, table: &AggTable<T>, empty_note: &str)
where
    T: Tabled + Clone,
{
    println!("\n{}", title);
    if !table.is_available() {
        println!("{} (missing column: {})", empty_note, table.missing().join(", "));
    } else if table.is_empty() {
        println!("{}", empty_note);
    } else {
        let table_str = Table::new(table.rows().to_vec())
            .with(Style::markdown())
            .to_string();
        println!("{}", table_str);
    }
    println!("{}", RULE);
}

pub fn print_total(total: &AggTable<TotalRow>) {
    println!("\nGRAND TOTAL (SALES DATA)");
    match total.rows().first() {
        Some(t) => {
            println!("Total quantity : {}", format_qty(t.quantity));
            println!("Total revenue  : {}", format_amount(t.revenue));
        }
        None => println!("Quantity or revenue column missing: {}", total.missing().join(", ")),
    }
    println!("{}", RULE);
}

pub fn print_stores(split: &StoreSplit, top_n: usize) {
    print_table(
        &format!("TOP {} STORES - ONLINE", top_n),
        &split.online,
        "No online store found.",
    );
    print_table(
        &format!("TOP {} STORES - PHYSICAL", top_n),
        &split.offline,
        "No physical store found.",
    );
}

pub fn print_channels(channels: &AggTable<ChannelRow>) {
    println!("\nSALES BY CHANNEL (ORGANIZATION CODE)");
    if !channels.is_available() {
        println!("No channel data (missing column: {})", channels.missing().join(", "));
    }
    for row in channels.rows() {
        println!("\n{} SALES", row.channel.to_string().to_uppercase());
        println!("Quantity: {}", format_qty(row.quantity));
        println!("Revenue : {}", format_amount(row.revenue));
    }
    println!("{}", RULE);
}

pub fn print_refurbished(summary: &AggTable<RefurbishedRow>) {
    println!("\nREFURBISHED PRODUCTS");
    match summary.rows().first() {
        Some(r) => {
            println!("Flag column used          : {}", r.column);
            println!("Refurbished quantity      : {}", format_qty(r.quantity));
            println!("Refurbished revenue       : {}", format_amount(r.revenue));
        }
        None => println!("No refurbished product column or no data."),
    }
    println!("{}", RULE);
}

/// Write every section of `report` as its own worksheet, summary first.
pub fn write_xlsx(path: &Path, report: &Report) -> Result<()> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet().set_name(SUMMARY_SHEET)?;
    write_summary_sheet(sheet, report, &formats)?;

    for section in &report.sections {
        let sheet = workbook.add_worksheet().set_name(&section.sheet)?;
        write_section_sheet(sheet, section, &formats)?;
    }

    workbook.save(path)?;
    Ok(())
}

struct Formats {
    title: Format,
    caption: Format,
    header: Format,
    text: Format,
    int: Format,
    dec: Format,
    total_label: Format,
}

impl Formats {
    fn new() -> Self {
        let cell = || {
            Format::new()
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::VerticalCenter)
        };
        Formats {
            title: Format::new()
                .set_bold()
                .set_font_size(14)
                .set_align(FormatAlign::Left),
            caption: Format::new()
                .set_italic()
                .set_font_size(10)
                .set_font_color(Color::RGB(0x666666))
                .set_align(FormatAlign::Left),
            header: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(0xD9E1F2))
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            text: cell().set_align(FormatAlign::Left),
            int: cell().set_align(FormatAlign::Right).set_num_format("#,##0"),
            dec: cell().set_align(FormatAlign::Right).set_num_format("#,##0.00"),
            total_label: Format::new().set_bold().set_align(FormatAlign::Left),
        }
    }
}

fn write_summary_sheet(ws: &mut Worksheet, report: &Report, f: &Formats) -> Result<()> {
    ws.merge_range(0, 0, 0, 1, "Sales summary", &f.title)?;
    let stamp = format!(
        "Report date: {}",
        report.generated_at.format("%d.%m.%Y %H:%M")
    );
    ws.merge_range(1, 0, 1, 1, &stamp, &f.caption)?;

    ws.write_string_with_format(HEADER_ROW, 0, "Metric", &f.header)?;
    ws.write_string_with_format(HEADER_ROW, 1, "Value", &f.header)?;
    for (i, item) in report.summary.iter().enumerate() {
        let row = HEADER_ROW + 1 + i as u32;
        ws.write_string_with_format(row, 0, &item.label, &f.text)?;
        let fmt = match item.kind {
            NumberKind::Count => &f.int,
            NumberKind::Amount => &f.dec,
        };
        ws.write_number_with_format(row, 1, item.value, fmt)?;
    }

    ws.set_column_width(0, 34)?;
    ws.set_column_width(1, 20)?;
    ws.set_freeze_panes(HEADER_ROW + 1, 0)?;
    Ok(())
}

fn write_section_sheet(ws: &mut Worksheet, section: &Section, f: &Formats) -> Result<()> {
    let last_col = section.columns.len().saturating_sub(1).max(1) as u16;
    ws.merge_range(0, 0, 0, last_col, &section.title, &f.title)?;
    ws.merge_range(1, 0, 1, last_col, &section.caption, &f.caption)?;

    for (col, name) in section.columns.iter().enumerate() {
        ws.write_string_with_format(HEADER_ROW, col as u16, name, &f.header)?;
    }

    if !section.has_data() {
        ws.write_string_with_format(HEADER_ROW + 1, 0, "No data", &f.text)?;
    }
    for (i, cells) in section.rows.iter().enumerate() {
        let row = HEADER_ROW + 1 + i as u32;
        for (col, cell) in cells.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(s) => ws.write_string_with_format(row, col, s, &f.text)?,
                Cell::Count(n) => ws.write_number_with_format(row, col, *n, &f.int)?,
                Cell::Amount(n) => ws.write_number_with_format(row, col, *n, &f.dec)?,
            };
        }
    }

    if let Some(label) = &section.count_label {
        let row = HEADER_ROW + 1 + section.rows.len().max(1) as u32 + 1;
        ws.write_string_with_format(row, 0, label, &f.total_label)?;
        ws.write_number_with_format(row, 1, section.rows.len() as f64, &f.int)?;
    }

    ws.set_column_width(0, key_width(section))?;
    for col in 1..section.columns.len() {
        ws.set_column_width(col as u16, 20)?;
    }
    ws.set_freeze_panes(HEADER_ROW + 1, 1)?;
    Ok(())
}

// Product names run long; other keys fit a narrower column.
fn key_width(section: &Section) -> u16 {
    let longest = section
        .rows
        .iter()
        .filter_map(|r| match r.first() {
            Some(Cell::Text(s)) => Some(s.chars().count()),
            _ => None,
        })
        .max()
        .unwrap_or(0);
    (longest as u16).clamp(28, 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble;
    use crate::config::Config;
    use crate::types::Table as DataTable;
    use chrono::NaiveDate;

    fn report() -> Report {
        let at = NaiveDate::from_ymd_opt(2025, 11, 17)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let mut sales = DataTable::from_rows(
            vec![
                "Kategori2".to_string(),
                "Uzun Tanım".to_string(),
                "Sipariş Miktarı".to_string(),
                "KDV dahil ciro".to_string(),
            ],
            vec![vec![
                Some("TV".to_string()),
                Some("ACME TV".to_string()),
                Some("1".to_string()),
                Some("10".to_string()),
            ]],
        );
        crate::loader::prepare_sales(&mut sales, &Config::default());
        assemble(&Config::default(), &sales, &DataTable::empty(), 0, 0, at)
    }

    #[test]
    fn writes_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        write_xlsx(&path, &report()).unwrap();
        let meta = std::fs::metadata(&path).unwrap();
        assert!(meta.len() > 0);
    }

    #[test]
    fn writes_json_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_json(&path, &report()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["summary"][0]["label"], "Total quantity");
        assert_eq!(value["summary"][0]["value"], 1.0);
        assert!(value["refurbished_column"].is_null());
    }

    #[test]
    fn key_width_bounds() {
        let mut section = report().sections.remove(0);
        assert_eq!(key_width(&section), 28);
        section.rows = vec![vec![Cell::Text("x".repeat(200))]];
        assert_eq!(key_width(&section), 60);
    }
}

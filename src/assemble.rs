// Report assembly: turns the aggregate tables into the fixed sheet layout
// consumed by the spreadsheet writer and the JSON summary.
use crate::config::Config;
use crate::reports::{find_refurbished_column, Aggregator};
use crate::types::{AggTable, GiftCardRow, GroupRow, RefurbishedRow, Table};
use crate::util::{format_amount, format_int, format_qty};
use chrono::NaiveDateTime;
use serde::Serialize;

pub const SUMMARY_SHEET: &str = "Summary";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Count,
    Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryItem {
    pub label: String,
    pub value: f64,
    #[serde(skip)]
    pub kind: NumberKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Count(f64),
    Amount(f64),
}

/// One dimension sheet. Sections exist even when they hold no rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub sheet: String,
    pub title: String,
    pub caption: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// Label of the trailing "number of entities" line, when the sheet has one.
    pub count_label: Option<String>,
}

impl Section {
    pub fn has_data(&self) -> bool {
        !self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub generated_at: NaiveDateTime,
    pub summary: Vec<SummaryItem>,
    #[serde(skip)]
    pub sections: Vec<Section>,
    pub refurbished_column: Option<String>,
}

impl Report {
    /// Sheet order of the written workbook.
    pub fn sheet_names(&self) -> Vec<&str> {
        std::iter::once(SUMMARY_SHEET)
            .chain(self.sections.iter().map(|s| s.sheet.as_str()))
            .collect()
    }
}

pub fn assemble(
    cfg: &Config,
    sales: &Table,
    giftcards: &Table,
    malformed_sales: usize,
    malformed_giftcards: usize,
    generated_at: NaiveDateTime,
) -> Report {
    let agg = Aggregator::new(cfg);
    let cols = &cfg.sales_columns;
    let flag = find_refurbished_column(sales, &cfg.refurbished_column_marker);

    let total = agg.grand_total(sales);
    let channels = agg.channels_by_code(sales);
    let refurbished = agg.refurbished_summary(sales, flag.as_deref());

    let mut summary = Vec::new();
    if let Some(t) = total.rows().first() {
        summary.push(count("Total quantity", t.quantity));
        summary.push(amount("Total revenue", t.revenue));
    }
    for c in channels.rows() {
        summary.push(count(&format!("{} quantity", c.channel), c.quantity));
        summary.push(amount(&format!("{} revenue", c.channel), c.revenue));
    }
    if let Some(r) = refurbished.rows().first() {
        summary.push(count("Refurbished quantity", r.quantity));
        summary.push(amount("Refurbished revenue", r.revenue));
    }
    summary.push(count("Malformed rows in sales data", malformed_sales as f64));
    summary.push(count(
        "Malformed rows in gift card data",
        malformed_giftcards as f64,
    ));

    let stores = agg.stores_by_storefront_all(sales);
    let refurbished_category = if sales.has_column(&cols.category3) {
        &cols.category3
    } else {
        &cols.category
    };

    let sections = vec![
        group_section(
            "Category",
            "Sales by category",
            &cols.category,
            &agg.by_category(sales),
            |n| format!("{} distinct categories reported sales in this period.", n),
            "No category data for this period.",
            Some("Category count"),
        ),
        group_section(
            "BrandTotal",
            "Sales by brand",
            &cols.brand,
            &agg.brands_all(sales),
            |n| format!("{} distinct brands reported sales in this period.", n),
            "No brand data for this period.",
            Some("Brand count"),
        ),
        group_section(
            "OnlineStoreTotal",
            "Sales by online store",
            &cols.store,
            &stores.online,
            |n| format!("{} distinct online stores reported sales in this period.", n),
            "No online store sales in this period.",
            Some("Online store count"),
        ),
        group_section(
            "OfflineStoreTotal",
            "Sales by physical store",
            &cols.store,
            &stores.offline,
            |n| format!("{} distinct physical stores reported sales in this period.", n),
            "No physical store sales in this period.",
            Some("Physical store count"),
        ),
        refurbished_section(
            refurbished_category,
            &refurbished,
            &agg.refurbished_by_category(sales, flag.as_deref()),
        ),
        group_section(
            "ProductTotal",
            &format!("Best-selling products - top {}", cfg.report_top_products),
            &cols.product,
            &agg.top_products(sales, cfg.report_top_products),
            |n| format!("The {} best-selling products by quantity.", n),
            "No product sales data for this period.",
            None,
        ),
        giftcard_section(
            &cfg.giftcard_columns.product,
            &agg.giftcard_products(giftcards),
            giftcards.headers().is_empty(),
        ),
    ];

    Report {
        generated_at,
        summary,
        sections,
        refurbished_column: flag,
    }
}

fn count(label: &str, value: f64) -> SummaryItem {
    SummaryItem {
        label: label.to_string(),
        value,
        kind: NumberKind::Count,
    }
}

fn amount(label: &str, value: f64) -> SummaryItem {
    SummaryItem {
        label: label.to_string(),
        value,
        kind: NumberKind::Amount,
    }
}

fn group_cells(rows: &[GroupRow]) -> Vec<Vec<Cell>> {
    rows.iter()
        .map(|r| {
            vec![
                Cell::Text(r.key.clone()),
                Cell::Count(r.quantity),
                Cell::Amount(r.revenue),
            ]
        })
        .collect()
}

fn group_columns(key: &str) -> Vec<String> {
    vec![
        key.to_string(),
        "TotalQuantity".to_string(),
        "TotalRevenue".to_string(),
    ]
}

/// Caption for a table that may be unavailable or empty.
fn caption<R>(table: &AggTable<R>, describe: impl Fn(String) -> String, empty: &str) -> String {
    match table {
        AggTable::Unavailable { missing } => {
            format!("{} (missing column: {})", empty, missing.join(", "))
        }
        AggTable::Rows(_) if table.is_empty() => empty.to_string(),
        AggTable::Rows(_) => describe(format_int(table.len())),
    }
}

fn group_section(
    sheet: &str,
    title: &str,
    key_column: &str,
    table: &AggTable<GroupRow>,
    describe: impl Fn(String) -> String,
    empty: &str,
    count_label: Option<&str>,
) -> Section {
    Section {
        sheet: sheet.to_string(),
        title: title.to_string(),
        caption: caption(table, describe, empty),
        columns: group_columns(key_column),
        rows: group_cells(table.rows()),
        count_label: count_label.map(|s| s.to_string()),
    }
}

fn refurbished_section(
    category_column: &str,
    summary: &AggTable<RefurbishedRow>,
    by_category: &AggTable<GroupRow>,
) -> Section {
    let caption = match summary.rows().first() {
        Some(r) => format!(
            "{} units and {} revenue of refurbished products sold in this period (flag column: {}).",
            format_qty(r.quantity),
            format_amount(r.revenue),
            r.column
        ),
        None => "No refurbished product sales in this period.".to_string(),
    };
    Section {
        sheet: "RefurbishedTotal".to_string(),
        title: "Refurbished product summary".to_string(),
        caption,
        columns: group_columns(category_column),
        rows: group_cells(by_category.rows()),
        count_label: None,
    }
}

// A table without headers means no gift card file was read at all.
fn giftcard_section(
    product_column: &str,
    table: &AggTable<GiftCardRow>,
    file_absent: bool,
) -> Section {
    let caption = if file_absent {
        "No gift card file was found for this period.".to_string()
    } else {
        caption(
            table,
            |n| format!("Quantities and amounts for {} gift card products.", n),
            "No gift card data for this period.",
        )
    };
    Section {
        sheet: "GiftCardTotal".to_string(),
        title: "Gift card product summary".to_string(),
        caption,
        columns: vec![
            product_column.to_string(),
            "TotalQuantity".to_string(),
            "TotalInvoiceAmount".to_string(),
            "TotalDiscountAmount".to_string(),
        ],
        rows: table
            .rows()
            .iter()
            .map(|r| {
                vec![
                    Cell::Text(r.product.clone()),
                    Cell::Count(r.quantity),
                    Cell::Amount(r.invoice),
                    Cell::Amount(r.discount),
                ]
            })
            .collect(),
        count_label: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 17)
            .unwrap()
            .and_hms_opt(5, 1, 22)
            .unwrap()
    }

    fn sales() -> Table {
        let cfg = Config::default();
        let mut t = Table::from_rows(
            [
                "OrganizationCode",
                "Magaza",
                "Marka",
                "Kategori2",
                "Uzun Tanım",
                "YENILENMIS",
                "Sipariş Miktarı",
                "KDV dahil ciro",
            ]
            .iter()
            .map(|h| h.to_string())
            .collect(),
            vec![
                ["1001", "KADIKOY", "ACME", "TV", "ACME TV", "X", "2", "1.000,50"],
                ["9001", "TRENDYOL", "ZETA", "PHONE", "ZETA X", "", "3", "2.000,00"],
            ]
            .into_iter()
            .map(|r| {
                r.iter()
                    .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
                    .collect()
            })
            .collect(),
        );
        crate::loader::prepare_sales(&mut t, &cfg);
        t
    }

    #[test]
    fn sections_in_fixed_order() {
        let cfg = Config::default();
        let report = assemble(&cfg, &sales(), &Table::empty(), 3, 0, at());
        assert_eq!(
            report.sheet_names(),
            [
                "Summary",
                "Category",
                "BrandTotal",
                "OnlineStoreTotal",
                "OfflineStoreTotal",
                "RefurbishedTotal",
                "ProductTotal",
                "GiftCardTotal"
            ]
        );
    }

    #[test]
    fn summary_rollup() {
        let cfg = Config::default();
        let report = assemble(&cfg, &sales(), &Table::empty(), 3, 1, at());
        let labels: Vec<(&str, f64)> = report
            .summary
            .iter()
            .map(|s| (s.label.as_str(), s.value))
            .collect();
        assert_eq!(
            labels,
            [
                ("Total quantity", 5.0),
                ("Total revenue", 3000.5),
                ("Online quantity", 3.0),
                ("Online revenue", 2000.0),
                ("Offline quantity", 2.0),
                ("Offline revenue", 1000.5),
                ("Refurbished quantity", 2.0),
                ("Refurbished revenue", 1000.5),
                ("Malformed rows in sales data", 3.0),
                ("Malformed rows in gift card data", 1.0),
            ]
        );
        assert_eq!(report.refurbished_column.as_deref(), Some("YENILENMIS"));
    }

    #[test]
    fn empty_sections_are_kept_with_no_data_caption() {
        let cfg = Config::default();
        let report = assemble(&cfg, &Table::empty(), &Table::empty(), 0, 0, at());
        assert_eq!(report.sections.len(), 7);
        for section in &report.sections {
            assert!(!section.has_data(), "{} should be empty", section.sheet);
            assert!(section.caption.starts_with("No "), "{}", section.caption);
        }
        // Only the malformed counts remain in the summary.
        assert_eq!(report.summary.len(), 2);
    }

    #[test]
    fn captions_mention_counts() {
        let cfg = Config::default();
        let report = assemble(&cfg, &sales(), &Table::empty(), 0, 0, at());
        let category = &report.sections[0];
        assert_eq!(
            category.caption,
            "2 distinct categories reported sales in this period."
        );
        assert_eq!(category.columns[0], "Kategori2");
        assert_eq!(category.count_label.as_deref(), Some("Category count"));
        let online = &report.sections[2];
        assert_eq!(
            online.rows,
            vec![vec![
                Cell::Text("TRENDYOL".into()),
                Cell::Count(3.0),
                Cell::Amount(2000.0),
            ]]
        );
        let refurbished = &report.sections[4];
        assert!(refurbished.caption.contains("YENILENMIS"));
        assert_eq!(refurbished.rows.len(), 1);
        let gift = &report.sections[6];
        assert_eq!(gift.caption, "No gift card file was found for this period.");
    }

    #[test]
    fn giftcard_schema_gap_is_not_reported_as_missing_file() {
        let cfg = Config::default();
        let gift = Table::from_rows(
            vec!["MALZEME TANIMI".to_string(), "MIKTAR".to_string()],
            vec![vec![Some("CARD".to_string()), Some("1".to_string())]],
        );
        let report = assemble(&cfg, &sales(), &gift, 0, 0, at());
        let section = &report.sections[6];
        assert_eq!(
            section.caption,
            "No gift card data for this period. \
             (missing column: FATURA_TUTARI, INDIRIM_TUTARI)"
        );
        assert!(!section.has_data());
    }
}

use crate::util::{format_amount, format_qty};
use serde::Serialize;
use std::borrow::Cow;
use tabled::Tabled;

/// One column of a loaded table. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(Vec<Option<String>>),
    Number(Vec<Option<f64>>),
}

impl Column {
    /// Cell as a grouping key. Missing cells group under the empty string.
    pub fn label(&self, row: usize) -> Cow<'_, str> {
        match self {
            Column::Text(v) => match &v[row] {
                Some(s) => Cow::Borrowed(s.as_str()),
                None => Cow::Borrowed(""),
            },
            Column::Number(v) => match v[row] {
                Some(n) => Cow::Owned(n.to_string()),
                None => Cow::Borrowed(""),
            },
        }
    }

    /// Cell as a measure. Missing or non-numeric cells count as zero.
    pub fn value(&self, row: usize) -> f64 {
        match self {
            Column::Number(v) => v[row].unwrap_or(0.0),
            Column::Text(v) => v[row]
                .as_deref()
                .and_then(|s| s.trim().parse::<f64>().ok())
                .unwrap_or(0.0),
        }
    }

    /// Cell as a number, keeping missing distinct from zero.
    pub fn number(&self, row: usize) -> Option<f64> {
        match self {
            Column::Number(v) => v[row],
            Column::Text(v) => v[row].as_deref().and_then(|s| s.trim().parse::<f64>().ok()),
        }
    }
}

/// A delimited dataset held column-major. The column set is whatever the
/// source header declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Column>,
    len: usize,
}

impl Table {
    pub fn empty() -> Self {
        Table::default()
    }

    /// Build a text table from row-major cells. Short rows are padded with
    /// missing cells and surplus cells are ignored.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let len = rows.len();
        let mut columns: Vec<Vec<Option<String>>> =
            headers.iter().map(|_| Vec::with_capacity(len)).collect();
        for row in rows {
            let mut cells = row.into_iter();
            for col in columns.iter_mut() {
                col.push(cells.next().flatten());
            }
        }
        Table {
            headers,
            columns: columns.into_iter().map(Column::Text).collect(),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|i| &self.columns[i])
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        let i = self.position(name)?;
        Some(&mut self.columns[i])
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Result of an aggregation. `Unavailable` means the dataset lacks a column
/// the aggregate needs; `Rows` may still be empty when nothing matched.
#[derive(Debug, Clone, PartialEq)]
pub enum AggTable<R> {
    Unavailable { missing: Vec<String> },
    Rows(Vec<R>),
}

impl<R> AggTable<R> {
    pub fn rows(&self) -> &[R] {
        match self {
            AggTable::Unavailable { .. } => &[],
            AggTable::Rows(rows) => rows,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, AggTable::Rows(_))
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    pub fn missing(&self) -> &[String] {
        match self {
            AggTable::Unavailable { missing } => missing,
            AggTable::Rows(_) => &[],
        }
    }
}

/// Quantity and revenue summed over one group.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct GroupRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub key: String,
    #[serde(rename = "TotalQuantity")]
    #[tabled(rename = "TotalQuantity", display_with = "display_qty")]
    pub quantity: f64,
    #[serde(rename = "TotalRevenue")]
    #[tabled(rename = "TotalRevenue", display_with = "display_amount")]
    pub revenue: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct TotalRow {
    #[serde(rename = "TotalQuantity")]
    #[tabled(rename = "TotalQuantity", display_with = "display_qty")]
    pub quantity: f64,
    #[serde(rename = "TotalRevenue")]
    #[tabled(rename = "TotalRevenue", display_with = "display_amount")]
    pub revenue: f64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Online,
    Offline,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Online => write!(f, "Online"),
            Channel::Offline => write!(f, "Offline"),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ChannelRow {
    #[serde(rename = "Channel")]
    #[tabled(rename = "Channel")]
    pub channel: Channel,
    #[serde(rename = "TotalQuantity")]
    #[tabled(rename = "TotalQuantity", display_with = "display_qty")]
    pub quantity: f64,
    #[serde(rename = "TotalRevenue")]
    #[tabled(rename = "TotalRevenue", display_with = "display_amount")]
    pub revenue: f64,
}

/// Refurbished sales totals and the auto-detected column they came from.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct RefurbishedRow {
    #[serde(rename = "FlagColumn")]
    #[tabled(rename = "FlagColumn")]
    pub column: String,
    #[serde(rename = "TotalQuantity")]
    #[tabled(rename = "TotalQuantity", display_with = "display_qty")]
    pub quantity: f64,
    #[serde(rename = "TotalRevenue")]
    #[tabled(rename = "TotalRevenue", display_with = "display_amount")]
    pub revenue: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct GiftCardRow {
    #[serde(rename = "Product")]
    #[tabled(rename = "Product")]
    pub product: String,
    #[serde(rename = "TotalQuantity")]
    #[tabled(rename = "TotalQuantity", display_with = "display_qty")]
    pub quantity: f64,
    #[serde(rename = "TotalInvoiceAmount")]
    #[tabled(rename = "TotalInvoiceAmount", display_with = "display_amount")]
    pub invoice: f64,
    #[serde(rename = "TotalDiscountAmount")]
    #[tabled(rename = "TotalDiscountAmount", display_with = "display_amount")]
    pub discount: f64,
}

/// Online and offline store tables from the storefront allow-list.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSplit {
    pub online: AggTable<GroupRow>,
    pub offline: AggTable<GroupRow>,
}

fn display_qty(v: &f64) -> String {
    format_qty(*v)
}

fn display_amount(v: &f64) -> String {
    format_amount(*v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(v: &[&str]) -> Vec<Option<String>> {
        v.iter()
            .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
            .collect()
    }

    #[test]
    fn from_rows_pads_short_rows() {
        let t = Table::from_rows(
            vec!["a".into(), "b".into(), "c".into()],
            vec![cells(&["1", "2", "3"]), cells(&["4"])],
        );
        assert_eq!(t.len(), 2);
        let c = t.column("c").unwrap();
        assert_eq!(c.label(0), "3");
        assert_eq!(c.label(1), "");
        assert_eq!(c.number(1), None);
        assert!(!t.has_column("d"));
    }

    #[test]
    fn text_cells_read_as_measures() {
        let col = Column::Text(cells(&[" 2.5 ", "abc", ""]));
        assert_eq!(col.value(0), 2.5);
        assert_eq!(col.value(1), 0.0);
        assert_eq!(col.value(2), 0.0);
    }

    #[test]
    fn unavailable_reads_as_empty() {
        let agg: AggTable<GroupRow> = AggTable::Unavailable {
            missing: vec!["Marka".into()],
        };
        assert!(!agg.is_available());
        assert!(agg.is_empty());
        assert_eq!(agg.missing(), ["Marka".to_string()]);
        let computed: AggTable<GroupRow> = AggTable::Rows(vec![]);
        assert!(computed.is_available());
        assert!(computed.is_empty());
    }
}

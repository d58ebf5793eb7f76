// Run configuration: input locations, column names and classification
// thresholds. A `Config` is built once in `main` and passed by reference to
// the loader, the aggregator and the assembler.
use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Column names of the primary sales feed.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SalesColumns {
    pub quantity: String,
    pub revenue: String,
    pub category: String,
    /// Finer category level, preferred for the refurbished breakdown.
    pub category3: String,
    pub org_code: String,
    pub brand: String,
    pub store: String,
    pub product: String,
}

impl Default for SalesColumns {
    fn default() -> Self {
        SalesColumns {
            quantity: "Sipariş Miktarı".to_string(),
            revenue: "KDV dahil ciro".to_string(),
            category: "Kategori2".to_string(),
            category3: "Kategori3".to_string(),
            org_code: "OrganizationCode".to_string(),
            brand: "Marka".to_string(),
            store: "Magaza".to_string(),
            product: "Uzun Tanım".to_string(),
        }
    }
}

/// Column names of the gift-card feed.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GiftCardColumns {
    pub product: String,
    pub quantity: String,
    /// Gross invoice amount.
    pub invoice: String,
    pub discount: String,
}

impl Default for GiftCardColumns {
    fn default() -> Self {
        GiftCardColumns {
            product: "MALZEME TANIMI".to_string(),
            quantity: "MIKTAR".to_string(),
            invoice: "FATURA_TUTARI".to_string(),
            discount: "INDIRIM_TUTARI".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sales_path: PathBuf,
    pub giftcard_path: PathBuf,
    pub output_dir: PathBuf,
    pub delimiter: char,
    pub sales_columns: SalesColumns,
    pub giftcard_columns: GiftCardColumns,
    /// Store names that count as online storefronts.
    pub online_stores: Vec<String>,
    /// Organization codes strictly above this value are online.
    pub online_code_threshold: f64,
    /// Non-numeric org-code token that marks an online order.
    pub online_code_sentinel: String,
    pub online_code_sentinel_value: f64,
    /// Case-insensitive substring identifying the refurbished flag column.
    pub refurbished_column_marker: String,
    pub refurbished_flag: String,
    /// Share of comma-bearing values above which a column is read as decimal-comma.
    pub comma_ratio_threshold: f64,
    pub console_top_n: usize,
    pub report_top_products: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sales_path: PathBuf::from("gfk_sales.csv"),
            giftcard_path: PathBuf::from("gfk_gift_card.csv"),
            output_dir: PathBuf::from("."),
            delimiter: ';',
            sales_columns: SalesColumns::default(),
            giftcard_columns: GiftCardColumns::default(),
            online_stores: [
                "AMAZON",
                "HEPSIBURADA",
                "MP",
                "N11",
                "PAZARAMA",
                "TEKNOSA",
                "TEKNOSA KURUMSAL ELEKTRONIK",
                "TRENDYOL",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            online_code_threshold: 5000.0,
            online_code_sentinel: "TSAMP".to_string(),
            online_code_sentinel_value: 999_999.0,
            refurbished_column_marker: "YENILEN".to_string(),
            refurbished_flag: "X".to_string(),
            comma_ratio_threshold: 0.5,
            console_top_n: 10,
            report_top_products: 50,
        }
    }
}

impl Config {
    /// Read a JSON config file. Keys that are absent keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path)?;
        let cfg: Config = serde_json::from_str(&text)?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() {
            return Err(ReportError::Config(format!(
                "delimiter {:?} is not a single-byte ASCII character",
                self.delimiter
            )));
        }
        if !(0.0..=1.0).contains(&self.comma_ratio_threshold) {
            return Err(ReportError::Config(format!(
                "comma_ratio_threshold must be within 0..=1, got {}",
                self.comma_ratio_threshold
            )));
        }
        if self.refurbished_column_marker.trim().is_empty() {
            return Err(ReportError::Config(
                "refurbished_column_marker must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The delimiter as the byte the CSV reader expects. Only valid after `validate`.
    pub fn delimiter_byte(&self) -> u8 {
        let mut buf = [0u8; 4];
        self.delimiter.encode_utf8(&mut buf);
        buf[0]
    }

    pub fn is_online_store(&self, store: &str) -> bool {
        self.online_stores.iter().any(|s| s == store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.delimiter_byte(), b';');
        assert_eq!(cfg.online_code_threshold, 5000.0);
        assert_eq!(cfg.refurbished_flag, "X");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: Config = serde_json::from_str(
            r#"{"delimiter": ",", "sales_columns": {"brand": "Brand"}, "online_stores": ["WEB"]}"#,
        )
        .unwrap();
        assert_eq!(cfg.delimiter, ',');
        assert_eq!(cfg.sales_columns.brand, "Brand");
        assert_eq!(cfg.sales_columns.store, "Magaza");
        assert!(cfg.is_online_store("WEB"));
        assert!(!cfg.is_online_store("AMAZON"));
        assert_eq!(cfg.comma_ratio_threshold, 0.5);
    }

    #[test]
    fn rejects_non_ascii_delimiter() {
        let cfg = Config {
            delimiter: '§',
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(ReportError::Config(_))));
    }

    #[test]
    fn rejects_out_of_range_ratio() {
        let cfg = Config {
            comma_ratio_threshold: 1.5,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(&path, r#"{"online_code_threshold": 100}"#).unwrap();
        let cfg = Config::from_json_file(&path).unwrap();
        assert_eq!(cfg.online_code_threshold, 100.0);
        assert_eq!(cfg.refurbished_column_marker, "YENILEN");
    }
}

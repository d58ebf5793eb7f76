// Locale-aware numeric normalization.
//
// Source files come from Turkish and English exports alike and nobody tells
// us which. A column is read as decimal-comma ("1.234,56") when more than the
// configured share of its non-missing values contains a comma.
use crate::types::{Column, Table};

/// Convert `name` to a numeric column in place. Returns `false` when the
/// table has no such column.
pub fn normalize_column(table: &mut Table, name: &str, comma_ratio_threshold: f64) -> bool {
    let Some(column) = table.column_mut(name) else {
        return false;
    };
    let normalized = match column {
        Column::Number(values) => {
            Column::Number(values.iter().map(|v| Some(v.unwrap_or(0.0))).collect())
        }
        Column::Text(values) => Column::Number(
            normalize_text(values, comma_ratio_threshold)
                .into_iter()
                .map(Some)
                .collect(),
        ),
    };
    *column = normalized;
    true
}

/// Share of non-missing values that contain a comma. Zero for an all-missing column.
pub fn comma_ratio(values: &[Option<String>]) -> f64 {
    let present: Vec<&str> = values.iter().flatten().map(|s| s.trim()).collect();
    if present.is_empty() {
        return 0.0;
    }
    let with_comma = present.iter().filter(|s| s.contains(',')).count();
    with_comma as f64 / present.len() as f64
}

pub fn normalize_text(values: &[Option<String>], comma_ratio_threshold: f64) -> Vec<f64> {
    let decimal_comma = comma_ratio(values) > comma_ratio_threshold;
    values
        .iter()
        .map(|v| match v {
            Some(s) => parse_cell(s.trim(), decimal_comma),
            None => 0.0,
        })
        .collect()
}

fn parse_cell(s: &str, decimal_comma: bool) -> f64 {
    // Periods are thousands separators under the decimal-comma convention and
    // must go before commas become decimal points.
    let parsed = if decimal_comma {
        s.replace('.', "").replace(',', ".").parse::<f64>()
    } else {
        s.parse::<f64>()
    };
    match parsed {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(v: &[&str]) -> Vec<Option<String>> {
        v.iter()
            .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
            .collect()
    }

    fn table(name: &str, values: &[&str]) -> Table {
        Table::from_rows(
            vec![name.to_string()],
            values
                .iter()
                .map(|s| vec![if s.is_empty() { None } else { Some(s.to_string()) }])
                .collect(),
        )
    }

    #[test]
    fn decimal_comma_majority() {
        let out = normalize_text(&text(&["1.234,56", "12,5", "7"]), 0.5);
        assert_eq!(out, vec![1234.56, 12.5, 7.0]);
    }

    #[test]
    fn period_decimal_when_commas_are_rare() {
        let out = normalize_text(&text(&["1234.56", "10", "3,5"]), 0.5);
        assert_eq!(out[0], 1234.56);
        assert_eq!(out[1], 10.0);
        // "3,5" is not a number under the period convention.
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn exactly_half_is_not_a_majority() {
        let values = text(&["1,5", "2.5"]);
        assert_eq!(comma_ratio(&values), 0.5);
        assert_eq!(normalize_text(&values, 0.5), vec![0.0, 2.5]);
    }

    #[test]
    fn missing_cells_do_not_count_towards_ratio() {
        let values = text(&["1,5", "", "", "2,25"]);
        assert_eq!(comma_ratio(&values), 1.0);
        assert_eq!(normalize_text(&values, 0.5), vec![1.5, 0.0, 0.0, 2.25]);
    }

    #[test]
    fn unparsable_becomes_zero_and_row_survives() {
        let mut t = table("q", &["abc", " 4 ", "", "NaN"]);
        assert!(normalize_column(&mut t, "q", 0.5));
        assert_eq!(t.len(), 4);
        assert_eq!(
            t.column("q"),
            Some(&Column::Number(vec![Some(0.0), Some(4.0), Some(0.0), Some(0.0)]))
        );
    }

    #[test]
    fn missing_column_is_not_an_error() {
        let mut t = table("q", &["1"]);
        assert!(!normalize_column(&mut t, "revenue", 0.5));
        assert_eq!(t.column("q"), Some(&Column::Text(vec![Some("1".to_string())])));
    }

    #[test]
    fn numeric_column_only_fills_missing() {
        let mut t = table("q", &["1"]);
        *t.column_mut("q").unwrap() = Column::Number(vec![None]);
        normalize_column(&mut t, "q", 0.5);
        assert_eq!(t.column("q"), Some(&Column::Number(vec![Some(0.0)])));
    }

    #[test]
    fn idempotent_on_normalized_column() {
        let mut t = table("q", &["1.234,5", "2,75", "x"]);
        normalize_column(&mut t, "q", 0.5);
        let once = t.clone();
        normalize_column(&mut t, "q", 0.5);
        assert_eq!(t, once);
    }
}

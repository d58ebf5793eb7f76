// Aggregation engine.
//
// Every operation borrows the loaded table, never mutates it, and returns a
// fresh `AggTable`. Groups keep first-encounter order and all sorts are
// stable, so ties come out in the order the rows were read.
use crate::config::Config;
use crate::types::{
    AggTable, Channel, ChannelRow, Column, GiftCardRow, GroupRow, RefurbishedRow, StoreSplit,
    Table, TotalRow,
};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Find the refurbished flag column: the first header containing `marker`,
/// compared case-insensitively.
pub fn find_refurbished_column(table: &Table, marker: &str) -> Option<String> {
    let marker = marker.to_uppercase();
    table
        .headers()
        .iter()
        .find(|h| h.to_uppercase().contains(&marker))
        .cloned()
}

pub struct Aggregator<'c> {
    cfg: &'c Config,
}

impl<'c> Aggregator<'c> {
    pub fn new(cfg: &'c Config) -> Self {
        Aggregator { cfg }
    }

    pub fn grand_total(&self, table: &Table) -> AggTable<TotalRow> {
        let cols = &self.cfg.sales_columns;
        let [qty, rev] = match lookup(table, [cols.quantity.as_str(), cols.revenue.as_str()]) {
            Ok(c) => c,
            Err(missing) => return AggTable::Unavailable { missing },
        };
        let (quantity, revenue) = sum_measures(qty, rev, 0..table.len());
        AggTable::Rows(vec![TotalRow { quantity, revenue }])
    }

    pub fn by_category(&self, table: &Table) -> AggTable<GroupRow> {
        self.grouped_by_revenue(table, &self.cfg.sales_columns.category, None)
    }

    pub fn brands_top(&self, table: &Table) -> AggTable<GroupRow> {
        let n = self.cfg.console_top_n;
        self.grouped_by_revenue(table, &self.cfg.sales_columns.brand, Some(n))
    }

    pub fn brands_all(&self, table: &Table) -> AggTable<GroupRow> {
        self.grouped_by_revenue(table, &self.cfg.sales_columns.brand, None)
    }

    pub fn stores_by_storefront_top(&self, table: &Table) -> StoreSplit {
        self.stores_by_storefront(table, Some(self.cfg.console_top_n))
    }

    pub fn stores_by_storefront_all(&self, table: &Table) -> StoreSplit {
        self.stores_by_storefront(table, None)
    }

    /// Online and offline totals from the numeric organization code. Rows
    /// without a code are left out. Always two rows, online first.
    pub fn channels_by_code(&self, table: &Table) -> AggTable<ChannelRow> {
        let cols = &self.cfg.sales_columns;
        let names = [
            cols.org_code.as_str(),
            cols.quantity.as_str(),
            cols.revenue.as_str(),
        ];
        let [org, qty, rev] = match lookup(table, names) {
            Ok(c) => c,
            Err(missing) => return AggTable::Unavailable { missing },
        };
        let threshold = self.cfg.online_code_threshold;
        let mut online = Vec::new();
        let mut offline = Vec::new();
        for i in 0..table.len() {
            match org.number(i) {
                Some(code) if code > threshold => online.push(i),
                Some(_) => offline.push(i),
                None => {}
            }
        }

        let (on_qty, on_rev) = sum_measures(qty, rev, online);
        let (off_qty, off_rev) = sum_measures(qty, rev, offline);
        AggTable::Rows(vec![
            ChannelRow {
                channel: Channel::Online,
                quantity: on_qty,
                revenue: on_rev,
            },
            ChannelRow {
                channel: Channel::Offline,
                quantity: off_qty,
                revenue: off_rev,
            },
        ])
    }

    /// Totals over rows flagged as refurbished in `flag_column`.
    pub fn refurbished_summary(
        &self,
        table: &Table,
        flag_column: Option<&str>,
    ) -> AggTable<RefurbishedRow> {
        let cols = &self.cfg.sales_columns;
        let Some(flag_name) = flag_column else {
            return AggTable::Unavailable {
                missing: vec![self.flag_placeholder()],
            };
        };
        let names = [flag_name, cols.quantity.as_str(), cols.revenue.as_str()];
        let [flag, qty, rev] = match lookup(table, names) {
            Ok(c) => c,
            Err(missing) => return AggTable::Unavailable { missing },
        };
        let (quantity, revenue) = sum_measures(qty, rev, self.flagged_rows(flag, table.len()));
        AggTable::Rows(vec![RefurbishedRow {
            column: flag_name.to_string(),
            quantity,
            revenue,
        }])
    }

    /// Refurbished rows grouped by the tertiary category, or by the primary
    /// one when the dataset has no tertiary level.
    pub fn refurbished_by_category(
        &self,
        table: &Table,
        flag_column: Option<&str>,
    ) -> AggTable<GroupRow> {
        let cols = &self.cfg.sales_columns;
        let Some(flag_name) = flag_column else {
            return AggTable::Unavailable {
                missing: vec![self.flag_placeholder()],
            };
        };
        let category_name = if table.has_column(&cols.category3) {
            cols.category3.as_str()
        } else {
            cols.category.as_str()
        };
        let names = [
            flag_name,
            category_name,
            cols.quantity.as_str(),
            cols.revenue.as_str(),
        ];
        let [flag, category, qty, rev] = match lookup(table, names) {
            Ok(c) => c,
            Err(missing) => return AggTable::Unavailable { missing },
        };
        let rows = group_rows(category, qty, rev, self.flagged_rows(flag, table.len()));
        AggTable::Rows(finish(rows, by_revenue, None))
    }

    /// Best sellers ranked by quantity, not revenue.
    pub fn top_products(&self, table: &Table, n: usize) -> AggTable<GroupRow> {
        let cols = &self.cfg.sales_columns;
        let names = [cols.product.as_str(), cols.quantity.as_str(), cols.revenue.as_str()];
        let [product, qty, rev] = match lookup(table, names) {
            Ok(c) => c,
            Err(missing) => return AggTable::Unavailable { missing },
        };
        let rows = group_rows(product, qty, rev, 0..table.len());
        AggTable::Rows(finish(rows, by_quantity, Some(n)))
    }

    /// Case-insensitive substring search over product descriptions, grouped
    /// per product and ranked by quantity. No match is an empty table.
    pub fn search_products(&self, table: &Table, needle: &str) -> AggTable<GroupRow> {
        let cols = &self.cfg.sales_columns;
        let names = [cols.product.as_str(), cols.quantity.as_str(), cols.revenue.as_str()];
        let [product, qty, rev] = match lookup(table, names) {
            Ok(c) => c,
            Err(missing) => return AggTable::Unavailable { missing },
        };
        let needle = fold_case(needle);
        let matches = (0..table.len()).filter(|&i| {
            let text = product.label(i);
            !text.is_empty() && fold_case(&text).contains(&needle)
        });
        let rows = group_rows(product, qty, rev, matches);
        AggTable::Rows(finish(rows, by_quantity, None))
    }

    /// Gift cards per product: quantity, gross invoice and discount, ranked by quantity.
    pub fn giftcard_products(&self, table: &Table) -> AggTable<GiftCardRow> {
        let cols = &self.cfg.giftcard_columns;
        let names = [
            cols.product.as_str(),
            cols.quantity.as_str(),
            cols.invoice.as_str(),
            cols.discount.as_str(),
        ];
        let [product, qty, invoice, discount] = match lookup(table, names) {
            Ok(c) => c,
            Err(missing) => return AggTable::Unavailable { missing },
        };

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut rows: Vec<GiftCardRow> = Vec::new();
        for i in 0..table.len() {
            let key = product.label(i);
            let slot = match index.get(&*key) {
                Some(&slot) => slot,
                None => {
                    index.insert(key.to_string(), rows.len());
                    rows.push(GiftCardRow {
                        product: key.to_string(),
                        quantity: 0.0,
                        invoice: 0.0,
                        discount: 0.0,
                    });
                    rows.len() - 1
                }
            };
            let e = &mut rows[slot];
            e.quantity += qty.value(i);
            e.invoice += invoice.value(i);
            e.discount += discount.value(i);
        }
        rows.sort_by(|a, b| desc(a.quantity, b.quantity));
        AggTable::Rows(rows)
    }

    fn grouped_by_revenue(
        &self,
        table: &Table,
        key: &str,
        limit: Option<usize>,
    ) -> AggTable<GroupRow> {
        let cols = &self.cfg.sales_columns;
        let names = [key, cols.quantity.as_str(), cols.revenue.as_str()];
        let [key, qty, rev] = match lookup(table, names) {
            Ok(c) => c,
            Err(missing) => return AggTable::Unavailable { missing },
        };
        let rows = group_rows(key, qty, rev, 0..table.len());
        AggTable::Rows(finish(rows, by_revenue, limit))
    }

    fn stores_by_storefront(&self, table: &Table, limit: Option<usize>) -> StoreSplit {
        let cols = &self.cfg.sales_columns;
        let names = [cols.store.as_str(), cols.quantity.as_str(), cols.revenue.as_str()];
        let [store, qty, rev] = match lookup(table, names) {
            Ok(c) => c,
            Err(missing) => {
                return StoreSplit {
                    online: AggTable::Unavailable {
                        missing: missing.clone(),
                    },
                    offline: AggTable::Unavailable { missing },
                }
            }
        };
        let (online, offline): (Vec<usize>, Vec<usize>) =
            (0..table.len()).partition(|&i| self.cfg.is_online_store(&store.label(i)));
        StoreSplit {
            online: AggTable::Rows(finish(group_rows(store, qty, rev, online), by_revenue, limit)),
            offline: AggTable::Rows(finish(
                group_rows(store, qty, rev, offline),
                by_revenue,
                limit,
            )),
        }
    }

    fn flagged_rows(&self, flag: &Column, len: usize) -> Vec<usize> {
        let wanted = self.cfg.refurbished_flag.trim().to_uppercase();
        (0..len)
            .filter(|&i| flag.label(i).trim().to_uppercase() == wanted)
            .collect()
    }

    fn flag_placeholder(&self) -> String {
        format!("*{}*", self.cfg.refurbished_column_marker)
    }
}

/// Simple per-character case folding. `str::to_lowercase` expands the Turkish
/// dotted capital `İ` into `i` plus a combining dot, which would keep
/// "iphone" from matching "İPHONE".
fn fold_case(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'İ' => 'i',
            c => c.to_lowercase().next().unwrap_or(c),
        })
        .collect()
}

/// Resolve every named column or report all the missing ones.
fn lookup<'t, const N: usize>(
    table: &'t Table,
    names: [&str; N],
) -> Result<[&'t Column; N], Vec<String>> {
    let missing: Vec<String> = names
        .iter()
        .filter(|n| !table.has_column(n))
        .map(|n| n.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(missing);
    }
    let found: Vec<&Column> = names.iter().filter_map(|n| table.column(n)).collect();
    found.try_into().map_err(|_| Vec::new())
}

fn sum_measures(qty: &Column, rev: &Column, rows: impl IntoIterator<Item = usize>) -> (f64, f64) {
    rows.into_iter()
        .fold((0.0, 0.0), |(q, r), i| (q + qty.value(i), r + rev.value(i)))
}

/// Group `rows` by `key`, summing quantity and revenue, in first-encounter order.
fn group_rows(
    key: &Column,
    qty: &Column,
    rev: &Column,
    rows: impl IntoIterator<Item = usize>,
) -> Vec<GroupRow> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<GroupRow> = Vec::new();
    for i in rows {
        let label = key.label(i);
        let slot = match index.get(&*label) {
            Some(&slot) => slot,
            None => {
                index.insert(label.to_string(), out.len());
                out.push(GroupRow {
                    key: label.to_string(),
                    quantity: 0.0,
                    revenue: 0.0,
                });
                out.len() - 1
            }
        };
        out[slot].quantity += qty.value(i);
        out[slot].revenue += rev.value(i);
    }
    out
}

fn finish(
    mut rows: Vec<GroupRow>,
    order: fn(&GroupRow, &GroupRow) -> Ordering,
    limit: Option<usize>,
) -> Vec<GroupRow> {
    // `sort_by` is stable; equal groups keep encounter order.
    rows.sort_by(order);
    if let Some(n) = limit {
        rows.truncate(n);
    }
    rows
}

fn by_revenue(a: &GroupRow, b: &GroupRow) -> Ordering {
    desc(a.revenue, b.revenue)
}

fn by_quantity(a: &GroupRow, b: &GroupRow) -> Ordering {
    desc(a.quantity, b.quantity)
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

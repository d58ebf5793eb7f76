// Entry point and high-level CLI flow.
//
// One run audits both input files, loads and normalizes them, prints the
// console view, writes the spreadsheet and JSON summary, then drops into the
// product search loop until an empty line is entered.
mod assemble;
mod audit;
mod config;
mod error;
mod loader;
mod normalize;
mod output;
mod reports;
mod types;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use reports::{find_refurbished_column, Aggregator};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};
use types::{AggTable, GiftCardRow, Table};

#[derive(Parser, Debug)]
#[command(name = "sales_report", about = "Aggregates sales and gift card exports into a report")]
struct Args {
    /// JSON configuration file; missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Primary sales CSV
    #[arg(long)]
    sales: Option<PathBuf>,

    /// Gift card CSV
    #[arg(long)]
    giftcards: Option<PathBuf>,

    /// Field delimiter of both inputs
    #[arg(long)]
    delimiter: Option<char>,

    /// Directory for the spreadsheet and the JSON summary
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Skip the interactive product search
    #[arg(long, default_value = "false")]
    no_interactive: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_config(args: &Args) -> Result<Config> {
    let mut cfg = match &args.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(p) = &args.sales {
        cfg.sales_path = p.clone();
    }
    if let Some(p) = &args.giftcards {
        cfg.giftcard_path = p.clone();
    }
    if let Some(d) = args.delimiter {
        cfg.delimiter = d;
    }
    if let Some(d) = &args.output_dir {
        cfg.output_dir = d.clone();
    }
    cfg.validate()?;
    Ok(cfg)
}

fn malformed(path: &std::path::Path, cfg: &Config) -> usize {
    match audit::count_malformed(path, cfg.delimiter_byte()) {
        Ok(n) => {
            info!(path = %path.display(), malformed = n, "file audited");
            n
        }
        Err(e) => {
            warn!(path = %path.display(), "structural audit failed: {}", e);
            0
        }
    }
}

fn print_console_view(cfg: &Config, sales: &Table, giftcards: &Table) {
    let agg = Aggregator::new(cfg);
    let top_n = cfg.console_top_n;

    output::print_total(&agg.grand_total(sales));
    output::print_table(
        &format!("SALES BY CATEGORY ({})", cfg.sales_columns.category),
        &agg.by_category(sales),
        "No category data.",
    );
    output::print_table(
        &format!("TOP {} BRANDS", top_n),
        &agg.brands_top(sales),
        "No brand data.",
    );
    output::print_stores(&agg.stores_by_storefront_top(sales), top_n);
    output::print_channels(&agg.channels_by_code(sales));

    let flag = find_refurbished_column(sales, &cfg.refurbished_column_marker);
    match &flag {
        Some(col) => info!(column = %col, "refurbished flag column detected"),
        None => info!(marker = %cfg.refurbished_column_marker, "no refurbished flag column"),
    }
    output::print_refurbished(&agg.refurbished_summary(sales, flag.as_deref()));

    output::print_table(
        &format!("BEST-SELLING PRODUCTS - TOP {}", top_n),
        &agg.top_products(sales, top_n),
        "Top products list unavailable (no product column or no data).",
    );
    if giftcards.headers().is_empty() {
        output::print_table::<GiftCardRow>(
            "GIFT CARD PRODUCT TOTALS",
            &AggTable::Rows(Vec::new()),
            "No gift card file found, nothing to show.",
        );
    } else {
        output::print_table(
            "GIFT CARD PRODUCT TOTALS",
            &agg.giftcard_products(giftcards),
            "Gift card data is empty, nothing to show.",
        );
    }
}

fn export(cfg: &Config, report: &assemble::Report) {
    let stamp = report.generated_at.format("%Y%m%d_%H%M%S");
    let xlsx_path = cfg.output_dir.join(format!("sales_report_{}.xlsx", stamp));
    match output::write_xlsx(&xlsx_path, report) {
        Ok(()) => {
            info!(
                path = %xlsx_path.display(),
                sheets = ?report.sheet_names(),
                "spreadsheet report written"
            );
            println!("\nSpreadsheet report created: {}", xlsx_path.display());
        }
        Err(e) => error!(path = %xlsx_path.display(), "spreadsheet export failed: {}", e),
    }

    let json_path = cfg.output_dir.join(format!("sales_summary_{}.json", stamp));
    match output::write_json(&json_path, report) {
        Ok(()) => info!(path = %json_path.display(), "summary written"),
        Err(e) => error!(path = %json_path.display(), "summary export failed: {}", e),
    }
}

/// Read one trimmed line after a prompt. `None` on end of input.
fn read_search() -> Option<String> {
    print!("-> Product name or fragment (Enter to quit): ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn interactive_search(cfg: &Config, sales: &Table) {
    let agg = Aggregator::new(cfg);
    println!("\nPRODUCT LOOKUP");
    println!("Type part of a product name to see its quantity and revenue.");
    println!("Press Enter on an empty line to quit.\n");

    loop {
        let Some(search) = read_search() else {
            println!("\nNo input available, product lookup skipped.");
            break;
        };
        if search.is_empty() {
            println!("\nProduct lookup closed.");
            break;
        }
        output::print_table(
            &format!("Search: '{}'", search),
            &agg.search_products(sales, &search),
            "No product matches this search.",
        );
    }
}

fn run(args: Args) -> Result<()> {
    let cfg = build_config(&args)?;
    info!("starting sales report");

    let bad_sales = malformed(&cfg.sales_path, &cfg);
    let bad_gift = malformed(&cfg.giftcard_path, &cfg);

    let (sales, sales_load) = loader::load_sales(&cfg.sales_path, &cfg)
        .with_context(|| format!("loading sales data {}", cfg.sales_path.display()))?;
    if sales.is_empty() {
        warn!(path = %cfg.sales_path.display(), "sales data has no usable rows");
    }
    let (giftcards, gift_load) = loader::load_giftcards(&cfg.giftcard_path, &cfg)
        .unwrap_or_else(|e| {
            error!(path = %cfg.giftcard_path.display(), "gift card data unreadable: {}", e);
            (Table::empty(), loader::LoadReport::default())
        });

    print_console_view(&cfg, &sales, &giftcards);

    let report = assemble::assemble(
        &cfg,
        &sales,
        &giftcards,
        bad_sales,
        bad_gift,
        chrono::Local::now().naive_local(),
    );
    export(&cfg, &report);

    println!("\nMalformed rows in sales data     : {}", util::format_int(bad_sales));
    println!("Malformed rows in gift card data : {}", util::format_int(bad_gift));
    println!(
        "Rows loaded                      : {} of {} sales, {} of {} gift card",
        util::format_int(sales_load.loaded_rows),
        util::format_int(sales_load.total_rows),
        util::format_int(gift_load.loaded_rows),
        util::format_int(gift_load.total_rows)
    );
    println!(
        "Rows skipped by the parser       : {} sales, {} gift card",
        util::format_int(sales_load.skipped_rows),
        util::format_int(gift_load.skipped_rows)
    );
    println!("{}", "-".repeat(60));

    if !args.no_interactive {
        interactive_search(&cfg, &sales);
    }
    info!("report run finished");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);
    run(args)
}

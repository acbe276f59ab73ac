//! Logs in and prints a stock summary.
//!
//! ```text
//! YAROMA_CONFIG=yaroma.json YAROMA_LOGIN=admin@yaroma.com YAROMA_PASSWORD=admin123 \
//!     cargo run -p stock-report
//! ```

use std::fmt::Write as _;

use serde_json::Value;
use yaroma::prelude::*;
use yaroma::transport::Transport;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

struct Report {
    stats: ProductStats,
    low_stock: Vec<Value>,
    out_of_stock: Vec<Value>,
}

async fn collect<T: Transport>(yaroma: &Yaroma<T>) -> Result<Report, YaromaError> {
    let products = yaroma.products();
    let threshold = yaroma.config().alerts.low_stock_threshold;
    let stats = products.get_stats().await?;
    let low_stock = products.get_low_stock(threshold).await?;
    let out_of_stock = products.get_out_of_stock().await?;
    Ok(Report {
        stats,
        low_stock,
        out_of_stock,
    })
}

fn render<T: Transport>(yaroma: &Yaroma<T>, report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", yaroma.config().app.name);
    let _ = writeln!(
        out,
        "products: {}  low: {}  out: {}",
        report.stats.total, report.stats.low_stock, report.stats.out_of_stock
    );

    for record in report.low_stock.iter().chain(&report.out_of_stock) {
        let qty = record["qty_available"].as_f64().unwrap_or(0.0);
        let _ = writeln!(
            out,
            "  [{:<12}] {:>8} {}",
            yaroma.stock_level(qty),
            qty,
            record["name"].as_str().unwrap_or("?"),
        );
    }
    out
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

fn load_config() -> Result<AppConfig, YaromaError> {
    match std::env::var("YAROMA_CONFIG") {
        Ok(path) => AppConfig::from_file(path),
        Err(_) => {
            tracing::warn!("YAROMA_CONFIG not set, using defaults");
            Ok(AppConfig::default())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    yaroma::init_tracing();

    let yaroma = Yaroma::builder(load_config()?).build()?;

    if !yaroma.is_authenticated() {
        let login = std::env::var("YAROMA_LOGIN").unwrap_or_else(|_| "admin@yaroma.com".into());
        let password = std::env::var("YAROMA_PASSWORD").unwrap_or_else(|_| "admin123".into());
        let outcome = yaroma.login(&login, &password, true).await;
        if !outcome.is_success() {
            return Err(outcome.message().into());
        }
    }

    let report = collect(&yaroma).await?;
    print!("{}", render(&yaroma, &report));
    Ok(())
}

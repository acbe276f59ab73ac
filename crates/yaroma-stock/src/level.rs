//! Stock thresholds and the level they put a quantity in.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Alert thresholds, in product units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockConfig {
    /// At or below this, stock is low. Default: 10.
    pub low_stock_threshold: f64,
    /// At or below this, stock is critical. Default: 5.
    pub critical_stock_threshold: f64,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: 10.0,
            critical_stock_threshold: 5.0,
        }
    }
}

/// Where a quantity on hand sits relative to the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    OutOfStock,
    Critical,
    Low,
    InStock,
}

impl StockLevel {
    /// Classifies `qty`. Checked from the most severe level down, so a
    /// critical threshold above the low one never yields `Low`.
    pub fn classify(qty: f64, config: &StockConfig) -> Self {
        if qty <= 0.0 {
            Self::OutOfStock
        } else if qty <= config.critical_stock_threshold {
            Self::Critical
        } else if qty <= config.low_stock_threshold {
            Self::Low
        } else {
            Self::InStock
        }
    }

    /// Whether the level calls for an alert.
    pub fn needs_attention(&self) -> bool {
        !matches!(self, Self::InStock)
    }
}

impl fmt::Display for StockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::OutOfStock => "out of stock",
            Self::Critical => "critical",
            Self::Low => "low",
            Self::InStock => "in stock",
        };
        f.pad(label)
    }
}

//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "stocktake", version, about = "Count and reconcile a stock-take session")]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, value_name = "FILE", env = "STOCKTAKE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Stock-take session id
    #[arg(value_name = "SESSION_ID")]
    pub session_id: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List line items, optionally filtered
    Show {
        /// Case-insensitive product name or barcode fragment
        #[arg(short, long, value_name = "TEXT")]
        search: Option<String>,

        /// all, remaining or counted
        #[arg(long, default_value = "all")]
        status: String,
    },

    /// List counted items by product name
    Counted,

    /// Set a line's counted quantity
    Count {
        #[arg(value_name = "ITEM_ID")]
        item_id: String,

        /// Quantity as typed; decimals are truncated, invalid input counts as 0
        #[arg(value_name = "QTY", allow_hyphen_values = true)]
        quantity: String,
    },

    /// Count one unit of the scanned product
    Scan {
        #[arg(value_name = "BARCODE")]
        barcode: String,
    },

    /// Read barcodes from stdin, one per line, until EOF
    Listen,

    /// Set every uncounted line to its expected quantity
    AutoComplete,

    /// Re-submit every counted line
    Save,

    /// Commit the stock-take
    Complete,

    /// Delete the stock-take
    Delete,

    /// Print totals and the variance report
    Report,
}

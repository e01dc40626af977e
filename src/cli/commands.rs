//! CLI command definitions using clap.
//!
//! - send: run a full dispatch against the simulated transport
//! - segments: show how a message would be split
//! - classify: show how a transport result code is interpreted

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// guardian-sos - emergency SMS dispatch harness
#[derive(Parser, Debug)]
#[command(name = "guardian-sos")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch an alert through the simulated transport
    Send {
        /// Recipient phone number (repeat for several, order is kept)
        #[arg(short = 'n', long = "number", required = true)]
        numbers: Vec<String>,

        /// Message text
        #[arg(short, long)]
        message: String,

        /// Make a recipient fail with a result code, e.g. +1555000222=4
        #[arg(long, value_name = "NUMBER=CODE")]
        fail: Vec<String>,

        /// Recipient whose sends error before reaching the carrier
        #[arg(long, value_name = "NUMBER")]
        reject: Vec<String>,

        /// Simulate a missing radio manager
        #[arg(long)]
        no_radio: bool,

        /// Outcome latency in milliseconds (overrides config)
        #[arg(long)]
        latency_ms: Option<u64>,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how a message is split into segments
    Segments {
        /// Message text
        #[arg(short, long)]
        message: String,
    },

    /// Interpret a raw transport result code
    Classify {
        /// Result code (-1 is success)
        #[arg(allow_negative_numbers = true)]
        code: i32,
    },
}

/// Parse a `NUMBER=CODE` pair.
pub fn parse_failure(value: &str) -> Option<(String, i32)> {
    let (number, code) = value.rsplit_once('=')?;
    let code = code.trim().parse().ok()?;
    Some((number.trim().to_string(), code))
}

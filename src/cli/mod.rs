//! CLI module for guardian-sos - command-line harness and subcommands.
//!
//! Drives the dispatch engine against the simulated transport so runs,
//! segmentation and classification can be exercised from a terminal.

pub mod commands;

pub use commands::Cli;

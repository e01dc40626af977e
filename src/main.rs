use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use guardian_sos::bridge::{EmergencySmsBridge, StaticPermissions, normalize_number};
use guardian_sos::classify::{Classification, classify};
use guardian_sos::dispatch::{DispatchCoordinator, RunReport};
use guardian_sos::domain::{AttemptStatus, ResultCode};
use guardian_sos::notify::{ChannelNotifier, Notification, NotificationPolicy, Severity};
use guardian_sos::segment::segment;
use guardian_sos::transport::SimulatedTransport;

mod cli;
mod config;

use cli::Cli;
use cli::commands::{Commands, parse_failure};
use config::Config;

fn setup_logging(config: &Config) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("guardian-sos")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("guardian-sos.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter()))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match cli.command {
        Commands::Send {
            numbers,
            message,
            fail,
            reject,
            no_radio,
            latency_ms,
            json,
        } => {
            let transport = build_transport(config, &fail, &reject, no_radio, latency_ms)?;
            handle_send_command(transport, numbers, message, json, config).await
        }
        Commands::Segments { message } => handle_segments_command(&message),
        Commands::Classify { code } => handle_classify_command(code, &config.notifications),
    }
}

fn build_transport(
    config: &Config,
    fail: &[String],
    reject: &[String],
    no_radio: bool,
    latency_ms: Option<u64>,
) -> Result<SimulatedTransport> {
    let latency = Duration::from_millis(latency_ms.unwrap_or(config.simulation.latency_ms));
    let mut transport = SimulatedTransport::new()
        .with_latency(latency)
        .with_default_code(config.simulation.default_code);

    for value in fail {
        let (number, code) = parse_failure(value).ok_or_else(|| eyre!("Invalid --fail value '{}', expected NUMBER=CODE", value))?;
        transport = transport.fail_recipient(normalize_number(&number), code);
    }
    for number in reject {
        transport = transport.reject_recipient(normalize_number(number));
    }
    if no_radio {
        transport = transport.unavailable();
    }
    Ok(transport)
}

async fn handle_send_command(
    transport: SimulatedTransport,
    numbers: Vec<String>,
    message: String,
    json: bool,
    config: &Config,
) -> Result<()> {
    info!("Dispatching to {} recipients", numbers.len());

    let (notifier, mut notifications) = ChannelNotifier::channel();
    let notifier = Arc::new(notifier);
    let coordinator = DispatchCoordinator::new(Arc::new(transport), notifier.clone())
        .with_policy(config.dispatch.policy())
        .with_notifications(config.notifications.clone());
    let bridge = EmergencySmsBridge::new(coordinator, notifier, Arc::new(StaticPermissions::all()));

    // UI side: everything the core surfaces is printed from this task only
    let printer = tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            print_notification(&notification);
        }
    });

    let handle = bridge
        .send_emergency_sms(Some(numbers), Some(message))
        .map_err(|rejection| eyre!("Dispatch rejected: {}", rejection))?;
    println!("{} {}", "Run started:".green(), handle.run_id());

    let report = handle.wait().await.context("Dispatch run failed")?;

    drop(bridge);
    printer.await.context("Notification printer failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialize report")?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_notification(notification: &Notification) {
    match notification {
        Notification::Progress(indicator) => {
            println!("{} {}: {}", "[progress]".cyan(), indicator.title.bold(), indicator.text);
        }
        Notification::Transient(msg) => {
            let text = match msg.severity {
                Severity::Info => msg.text.normal(),
                Severity::Warning => msg.text.yellow(),
                Severity::Critical => msg.text.red().bold(),
                Severity::Advisory => msg.text.magenta(),
            };
            println!("{} {}", "[toast]".cyan(), text);
        }
        Notification::ClearProgress => {
            println!("{} {}", "[progress]".cyan(), "cleared".dimmed());
        }
    }
}

fn print_report(report: &RunReport) {
    println!();
    println!("{} {}", "Run:".green(), report.run_id);
    for attempt in &report.attempts {
        let status = match attempt.status {
            AttemptStatus::Succeeded => "succeeded".green(),
            AttemptStatus::Failed(reason) => format!("failed ({})", reason).red(),
            AttemptStatus::Pending => "pending".yellow(),
        };
        println!(
            "  {:>2}. {:<20} {} [{} segment(s)]",
            attempt.index + 1,
            attempt.recipient,
            status,
            attempt.expected
        );
    }
    if report.aborted {
        println!("{}", "Run aborted: transport unavailable".red());
    }
    println!(
        "{} {} succeeded, {} failed, {} pending",
        "Summary:".green(),
        report.succeeded(),
        report.failed(),
        report.pending()
    );
}

fn handle_segments_command(message: &str) -> Result<()> {
    let segmentation = segment(message);
    info!("Segmented message into {} parts", segmentation.len());

    println!(
        "{} {:?}, {} segment(s)",
        "Encoding:".green(),
        segmentation.encoding,
        segmentation.len()
    );
    for (i, part) in segmentation.segments.iter().enumerate() {
        println!(
            "  {:>2}. ({} units) {}",
            i + 1,
            segmentation.encoding.units(part),
            part
        );
    }
    Ok(())
}

fn handle_classify_command(code: i32, notifications: &NotificationPolicy) -> Result<()> {
    match classify(ResultCode(code)) {
        Classification::Delivered => println!("{} delivered", format!("{}:", code).green()),
        Classification::Failed(reason) => {
            println!("{} {:?}", format!("{}:", code).red(), reason);
            println!("  {}", notifications.delivery_failed("<recipient>", &reason).text);
            if let Some(advisory) = notifications.advisory(&reason) {
                println!("  {}", advisory.text.magenta());
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration; it decides the log level
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(cli, &config).await.context("Application failed")?;

    Ok(())
}

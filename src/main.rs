use anyhow::Result;
use clap::Parser;
use relatorio::{
    compose_report, render_channel_chart, Credentials, Insights, PipelineError, SalesTable,
    send_report,
};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Analyse a sales CSV file, generate a PDF report with a sales-by-channel
/// chart, and email it to a recipient.
///
/// Sender, recipient, and output filename are prompted for when not given;
/// the app password is always prompted (input not echoed) unless
/// SMTP_APP_PASSWORD is set.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the sales CSV file
    #[arg(short, long, default_value = "sales.csv", value_name = "FILE")]
    input: PathBuf,

    /// Path for the generated chart image (overwritten each run)
    #[arg(long, default_value = "sales_by_channel.png", value_name = "FILE")]
    chart: PathBuf,

    /// Sender email address
    #[arg(long, env = "REPORT_SENDER")]
    sender: Option<String>,

    /// Recipient email address
    #[arg(long, env = "REPORT_RECIPIENT")]
    recipient: Option<String>,

    /// Output PDF filename
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// SMTP relay host (submission port, STARTTLS)
    #[arg(long, default_value = "smtp.gmail.com", env = "SMTP_RELAY")]
    relay: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging()?;

    println!("--- Sales Analysis & Report Delivery ---");

    let sender = prompt_or(args.sender, "Sender email: ")?;
    let app_password = match std::env::var("SMTP_APP_PASSWORD") {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password("App password: ")?,
    };
    let recipient = prompt_or(args.recipient, "Recipient email: ")?;
    let output = match args.output {
        Some(path) => path,
        None => PathBuf::from(prompt("Report PDF filename (e.g. report.pdf): ")?),
    };

    let credentials = Credentials::new(sender, app_password);
    let outcome = run(
        &args.input,
        &args.chart,
        &output,
        &credentials,
        &recipient,
        &args.relay,
    );
    if let Err(e) = outcome {
        error!("{e}");
    }

    // The banner prints no matter where the pipeline halted, and failures
    // surface through console messages only.
    println!("\n--- Process complete ---");
    Ok(())
}

/// Runs the five pipeline stages strictly in order. Each stage runs only if
/// the previous one succeeded; the first failure short-circuits the rest.
fn run(
    input: &Path,
    chart: &Path,
    output: &Path,
    credentials: &Credentials,
    recipient: &str,
    relay: &str,
) -> Result<(), PipelineError> {
    info!("loading sales data from {}", input.display());
    let table = SalesTable::from_csv(input)?;
    info!("loaded {} valid records", table.len());

    let insights = Insights::from_table(&table)?;
    println!("\n{insights}");

    render_channel_chart(&table, chart)?;
    info!("chart saved to {}", chart.display());

    compose_report(output, &insights, chart)?;
    info!("report composed at {}", output.display());

    send_report(credentials, recipient, output, relay)?;
    info!("report emailed to {recipient}");
    Ok(())
}

fn init_logging() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_target(false)
        .without_time()
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_or(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => prompt(label),
    }
}

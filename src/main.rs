//! jarvis-hull: convex hulls over TCP
//!
//! One binary, three modes:
//! - `serve`: compute the Jarvis March hull of each request and send it back
//! - `client`: send one point set and compare the server's hull with a local one
//! - `mass-test`: verify many generated point sets against the server
//!
//! Configuration via CLI arguments, environment, or TOML file.

mod client;
mod codec;
mod config;
mod geometry;
mod mass_test;
mod server;
mod test_log;

use client::HullClient;
use config::{Config, Mode};
use server::Server;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Fatal errors are shown with their Display message, not Debug
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Connections are handled one after another; a single thread is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match config.mode.clone() {
        Mode::Serve => runtime.block_on(run_server(config)),
        Mode::Client { points } => runtime.block_on(run_client(config, points)),
        Mode::MassTest => runtime.block_on(run_mass_test(config)),
    }
}

async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let server = Server::bind(config.server.clone()).await?;

    info!(
        address = %server.local_addr()?,
        buffer_size = config.server.buffer_size,
        policy = ?config.server.policy,
        concurrent = config.server.concurrent,
        read_timeout_ms = ?config.server.read_timeout_ms,
        "Starting jarvis-hull server"
    );

    server.run().await?;
    Ok(())
}

async fn run_client(config: Config, points: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let line = match points {
        Some(line) => line,
        None => prompt_line("Enter points (format 'x,y x,y ...'): ").await?,
    };

    // Rejected before any network traffic
    let points = client::parse_input(&line)?;

    let client = HullClient::new(config.client);
    let verification = client.verify(&points).await?;

    println!();
    println!("Server response: {}", verification.remote);
    println!("Local result:    {}", verification.local);
    println!();
    if verification.matched() {
        println!("Results match!");
    } else {
        println!("Warning: Results don't match!");
    }
    Ok(())
}

async fn run_mass_test(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let client = HullClient::new(config.client);
    let report = mass_test::run(&config.mass_test, &client).await?;

    println!(
        "Tests completed: {}/{} ({}%)",
        report.passed,
        report.total,
        report.percent()
    );
    Ok(())
}

async fn prompt_line(prompt: &str) -> std::io::Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line)
}

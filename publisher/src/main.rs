//! Deployments Status Publisher - Entry Point
//!
//! Replays recorded CI build events as GitHub deployment and commit statuses,
//! or checks that a GitHub repository is reachable with the given token.

use std::collections::HashMap;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use deployments_status_publisher::app::console::ConsoleHost;
use deployments_status_publisher::app::options::AppOptions;
use deployments_status_publisher::app::replay::{replay, HostEvent};
use deployments_status_publisher::app::state::AppState;
use deployments_status_publisher::constants::{
    GITHUB_PUBLISHER_ID, GITHUB_SERVER, GITHUB_TOKEN, GIT_VCS_NAME, PUBLISHER_ID_PARAM,
};
use deployments_status_publisher::filesys::file::File;
use deployments_status_publisher::host::{BuildConfiguration, VcsRoot};
use deployments_status_publisher::http::client::DEFAULT_API_URL;
use deployments_status_publisher::logs::{init_logging, LogOptions};
use deployments_status_publisher::storage::settings::Settings;
use deployments_status_publisher::utils::version_info;

use tracing::{error, info};

const USAGE: &str = "Usage:
  dsp --version
  dsp --test-connection --vcs-url=<url> --token=<token> [--server=<api url>] [--publisher=<id>] [--settings=<file>] [--log-level=<level>]
  dsp --replay=<events.json> [--ci-url=<url>] [--settings=<file>] [--log-level=<level>]";

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{}", version),
            Err(e) => eprintln!("Failed to print version: {e}"),
        }
        return ExitCode::SUCCESS;
    }

    // Retrieve the settings file
    let settings = match cli_args.get("settings") {
        Some(path) => match File::new(path).read_json::<Settings>().await {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Unable to read settings file {}: {e}", path);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };

    // Initialize logging
    let log_options = match LogOptions::from(&settings)
        .with_level_override(cli_args.get("log-level").map(String::as_str))
    {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let host = Arc::new(ConsoleHost::new(
        cli_args
            .get("ci-url")
            .cloned()
            .unwrap_or_else(|| "http://localhost:8111".to_string()),
    ));
    let options = AppOptions::from(&settings);
    info!("Running with options: {:?}", options);
    let app = AppState::new(&options, host.clone(), host.clone());

    if cli_args.contains_key("test-connection") {
        return test_connection(&app, &cli_args).await;
    }

    if let Some(path) = cli_args.get("replay") {
        let events = match File::new(path).read_json::<Vec<HostEvent>>().await {
            Ok(events) => events,
            Err(e) => {
                error!("Unable to read events file {}: {e}", path);
                return ExitCode::FAILURE;
            }
        };
        info!("Replaying {} event(s) from {}", events.len(), path);
        tokio::select! {
            _ = replay(&app.listener, &host, events) => {}
            _ = await_shutdown_signal() => {}
        }
        app.shutdown().await;
        return ExitCode::SUCCESS;
    }

    eprintln!("{}", USAGE);
    ExitCode::FAILURE
}

async fn test_connection(app: &AppState, cli_args: &HashMap<String, String>) -> ExitCode {
    let (Some(vcs_url), Some(token)) = (cli_args.get("vcs-url"), cli_args.get("token")) else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };
    let publisher_id = cli_args
        .get("publisher")
        .map(String::as_str)
        .unwrap_or(GITHUB_PUBLISHER_ID);
    let server = cli_args
        .get("server")
        .map(String::as_str)
        .unwrap_or(DEFAULT_API_URL);

    let root = VcsRoot {
        id: 0,
        external_id: "cli".to_string(),
        name: vcs_url.clone(),
        vcs_name: GIT_VCS_NAME.to_string(),
        properties: HashMap::from([("url".to_string(), vcs_url.clone())]),
    };
    let params = HashMap::from([
        (PUBLISHER_ID_PARAM.to_string(), publisher_id.to_string()),
        (GITHUB_SERVER.to_string(), server.to_string()),
        (GITHUB_TOKEN.to_string(), token.clone()),
    ]);

    match app
        .test_connection(publisher_id, &BuildConfiguration::default(), &root, &params)
        .await
    {
        Ok(()) => {
            println!("Connection to {} succeeded", vcs_url);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Connection to {} failed: {e}", vcs_url);
            ExitCode::FAILURE
        }
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (Ok(mut sigterm), Ok(mut sigint)) =
            (signal(SignalKind::terminate()), signal(SignalKind::interrupt()))
        else {
            error!("Failed to install signal handlers");
            return std::future::pending().await;
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down...");
        }
    }
}

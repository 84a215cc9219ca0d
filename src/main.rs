//! Native Bridge - browser native messaging host that delegates to a co-located helper.

use std::env;
use std::process::ExitCode;

use tracing::{debug, error, info_span, Instrument};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use native_bridge::bridge::{Bridge, Outcome};
use native_bridge::config::{resolve_install_dir, BridgeConfig, Settings};
use native_bridge::error::BridgeError;
use native_bridge::helper::discovery_for_platform;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

fn main() -> ExitCode {
    // Browsers append their own arguments (caller origin, manifest path,
    // parent window); anything unrecognised is ignored.
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{} {}", NAME, VERSION);
        return ExitCode::SUCCESS;
    }

    let settings = match get_config_path(&args) {
        Some(path) => match Settings::load(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading configuration: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };

    if let Err(e) = init_logging(&settings) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    let span = info_span!("exchange", id = %Uuid::new_v4());
    span.in_scope(|| {
        debug!(
            args = ?args.get(1..).unwrap_or_default(),
            "Starting {} v{}", NAME, VERSION
        )
    });

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            span.in_scope(|| error!(error = %e, "Failed to create Tokio runtime"));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(async_main(settings).instrument(span.clone())) {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            span.in_scope(|| error!(error = %e, "Bridge failed"));
            ExitCode::FAILURE
        }
    }
}

/// Resolve the install directory and run one exchange over stdio.
async fn async_main(settings: Settings) -> Result<Outcome, BridgeError> {
    let install_dir = resolve_install_dir()?;
    let config = BridgeConfig::new(install_dir, &settings);
    let bridge = Bridge::new(config, discovery_for_platform(&settings.helper));

    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    bridge.run(&mut stdin, &mut stdout).await
}

/// Print help message.
fn print_help() {
    println!(
        r#"{} {}
Native messaging host: answers pings and forwards other requests to the helper
installed next to this executable.

Reads one length-prefixed JSON message from stdin and writes one to stdout.

USAGE:
    {} [OPTIONS] [BROWSER ARGS...]

OPTIONS:
    -c, --config <PATH>    Path to an optional TOML configuration file
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT:
    RUST_LOG               Overrides the configured log filter (logs go to stderr)
"#,
        NAME, VERSION, NAME
    );
}

/// Get configuration file path from command line arguments.
fn get_config_path(args: &[String]) -> Option<String> {
    for (i, arg) in args.iter().enumerate() {
        if (arg == "--config" || arg == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(path.to_string());
        }
    }
    None
}

/// Initialize logging based on settings.
///
/// Stdout carries the protocol, so every layer writes to stderr.
fn init_logging(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.level))?;

    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .pretty()
                        .with_ansi(false)
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_config_path_absent() {
        let argv = args(&["native-bridge", "chrome-extension://abcdef/"]);
        assert_eq!(get_config_path(&argv), None);
    }

    #[test]
    fn test_config_path_separate() {
        let argv = args(&["native-bridge", "--config", "/etc/bridge.toml"]);
        assert_eq!(get_config_path(&argv), Some("/etc/bridge.toml".to_string()));
    }

    #[test]
    fn test_config_path_inline() {
        let argv = args(&["native-bridge", "--config=/etc/bridge.toml", "ext@example.org"]);
        assert_eq!(get_config_path(&argv), Some("/etc/bridge.toml".to_string()));
    }

    #[test]
    fn test_config_flag_without_value() {
        let argv = args(&["native-bridge", "-c"]);
        assert_eq!(get_config_path(&argv), None);
    }
}

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::SecondsFormat;
use clap::{Parser, Subcommand};
use expiring_link::{ExpiringLink, LinkConfig, parse};

#[derive(Parser, Debug)]
#[command(name = "expiring-link", about = "Generate and check expiring link tokens", long_about = None)]
struct Args {
    /// YAML config with the epoch, expiry and round settings.
    #[arg(short, long, default_value = "link.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a new token for SECRET.
    Generate { secret: String },
    /// Verify TOKEN against SECRET; exits non-zero when it does not validate.
    Check { token: String, secret: String },
    /// Show what TOKEN claims without verifying its signature.
    Inspect { token: String },
}

fn main() -> ExitCode {
    // Enable basic logging; set RUST_LOG=debug to see rejection reasons.
    env_logger::init();

    let args = Args::parse();

    let config = match LinkConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e}", args.config.display());
            return ExitCode::from(2);
        }
    };
    log::info!(
        "Loaded link config from {:?} (format {:?})",
        args.config,
        config.format
    );

    let link = ExpiringLink::new(config);

    match args.command {
        Command::Generate { secret } => {
            println!("{}", link.generate(&secret));
            ExitCode::SUCCESS
        }
        Command::Check { token, secret } => match link.check(&token, &secret) {
            Ok(()) => {
                println!("valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                println!("{e}");
                ExitCode::FAILURE
            }
        },
        Command::Inspect { token } => {
            let parsed = match parse(&token, link.format()) {
                Ok(parsed) => parsed,
                Err(e) => {
                    println!("{e}");
                    return ExitCode::FAILURE;
                }
            };
            let expires_at = match link.expires_at(&token) {
                Ok(at) => at,
                Err(e) => {
                    println!("{e}");
                    return ExitCode::FAILURE;
                }
            };
            println!("age: {}", parsed.age);
            match parsed.rounds {
                Some(rounds) => println!("rounds: {rounds}"),
                None => println!("rounds: -"),
            }
            println!(
                "expires_at: {}",
                expires_at.to_rfc3339_opts(SecondsFormat::Millis, true)
            );
            ExitCode::SUCCESS
        }
    }
}

use crate::{
    output::{Console, ExitStatus, RunResult},
    run::RunOptions,
    CREDENTIAL_ENV,
};
use clap::{error::ErrorKind, Args, Parser, Subcommand};
use std::{io::Write, path::PathBuf, time::Duration};

const EXIT_CODES: &str = "\
Exit codes:
  0  Success (payment accepted or probe completed)
  1  Error (network, config, or unexpected failure)
  2  Payment rejected by facilitator
  3  Route is free (no payment needed)

Environment:
  EVM_PRIVATE_KEY    Private key for signing payments";

#[derive(Parser, Debug)]
#[command(name = "x402-cli")]
#[command(about = "Test x402 payment endpoints")]
#[command(disable_version_flag = true, after_help = EXIT_CODES)]
pub struct Cli {
    /// Print version and exit
    #[arg(long, global = true)]
    pub version: bool,

    /// Output structured JSON (for agents and scripts)
    #[arg(long, global = true)]
    pub json: bool,

    /// TOML file overriding network RPC endpoints
    #[arg(long, env = "X402_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Private key for signing payments (hex, with or without 0x prefix)
    #[arg(long, env = CREDENTIAL_ENV, hide = true, hide_env_values = true, global = true)]
    pub private_key: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Probe an endpoint and pay for it if it answers 402
    Run(RunArgs),

    /// Show the wallet address and USDC balances
    Wallet(WalletArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Endpoint url
    pub url: Option<String>,

    /// Skip TLS certificate verification
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// Request timeout (e.g. 30s, 500ms, 2m)
    #[arg(long, default_value = "30s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// HTTP method [default: GET, or POST with --data]
    #[arg(short = 'X', long)]
    pub method: Option<String>,

    /// Request body
    #[arg(short = 'd', long)]
    pub data: Option<String>,

    /// Custom header 'Key: Value' (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Show full request/response headers
    #[arg(short, long)]
    pub verbose: bool,

    /// Show payment cost and ask for confirmation before paying
    #[arg(long)]
    pub dry_run: bool,

    /// Auto-confirm payment without prompting
    #[arg(short, long)]
    pub yes: bool,

    /// Suppress human-readable output, only print JSON or exit code
    #[arg(short, long)]
    pub quiet: bool,

    /// Save response body to file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only send Step 1 (no payment), skip Step 2
    #[arg(long)]
    pub skip_verify: bool,
}

impl RunArgs {
    pub fn options(&self) -> RunOptions {
        let method = self.method.clone().unwrap_or_else(|| {
            if self.data.as_deref().is_some_and(|d| !d.is_empty()) {
                "POST".to_string()
            } else {
                "GET".to_string()
            }
        });

        RunOptions {
            url: self.url.clone().unwrap_or_default(),
            method,
            data: self.data.clone(),
            headers: self.headers.clone(),
            skip_verify: self.skip_verify,
            dry_run: self.dry_run,
            yes: self.yes,
            output: self.output.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct WalletArgs {
    /// Query a specific network (default: all)
    #[arg(long)]
    pub network: Option<String>,

    /// Per-network RPC timeout
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub timeout: Duration,
}

/// Report a command line the parser rejected.
///
/// Help requests succeed. Anything else is an input error: clap's own
/// rendering in text mode, a single error document in structured mode.
pub fn reject<W, E>(error: &clap::Error, console: &mut Console<W, E>) -> ExitStatus
where
    W: Write,
    E: Write,
{
    if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        console.say(error);
        return ExitStatus::Success;
    }

    if console.is_json() {
        let rendered = error.to_string();
        let message = rendered.lines().next().unwrap_or_default();
        let mut result = RunResult::new("", "");
        result.error = Some(message.strip_prefix("error: ").unwrap_or(message).to_string());
        console.json(&result);
    } else {
        console.note(error.to_string().trim_end());
    }

    ExitStatus::Error
}

/// Parse `500ms`, `30s`, `2m` or a bare number of seconds.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let (number, unit) = value
        .find(|c: char| !c.is_ascii_digit())
        .map_or((value, ""), |i| value.split_at(i));

    let number: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration {value:?}"))?;

    match unit {
        "" | "s" => Ok(Duration::from_secs(number)),
        "ms" => Ok(Duration::from_millis(number)),
        "m" => Ok(Duration::from_secs(number.saturating_mul(60))),
        _ => Err(format!("invalid duration unit {unit:?} (use ms, s or m)")),
    }
}

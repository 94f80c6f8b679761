use balance::monitor::BalanceMonitor;
use clap::{CommandFactory, Parser};
use client::RpcClient;
use config::{NetworkRegistry, Settings};
use payment::exact::ExactEvmBackend;
use std::process::ExitCode;
use tokio::io::BufReader;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use x402_cli::{
    cli::{self, Cli, Command},
    output::Console,
    run::{self, Session},
    wallet, VERSION,
};

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let json = std::env::args().any(|arg| arg == "--json");
            let mut console = Console::stdio(json, false, false);
            return Ok(cli::reject(&e, &mut console).into());
        }
    };
    init_tracing(cli.json);

    if cli.version {
        if cli.json {
            println!("{}", serde_json::json!({ "version": VERSION }));
        } else {
            println!("x402-cli {VERSION}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(ExitCode::FAILURE);
    };

    let registry = match &cli.config {
        Some(path) => {
            debug!(path = %path.display(), "Loading config");
            Settings::from_file(path)?.registry()?
        }
        None => NetworkRegistry::builtin(),
    };
    let backend = ExactEvmBackend::new(registry.clone());
    let credential = cli.private_key.as_deref();

    let status = match command {
        Command::Run(args) => {
            let session = Session {
                backend: &backend,
                client: client::create_http_client(args.insecure, args.timeout)?,
                credential,
                registry: &registry,
            };
            let mut console = Console::stdio(cli.json, args.quiet, args.verbose);
            let mut input = BufReader::new(tokio::io::stdin());

            run::run(&session, &args.options(), &mut console, &mut input).await
        }
        Command::Wallet(args) => {
            let monitor = BalanceMonitor::new(RpcClient::new(client::create_http_client(false, args.timeout)?));
            let mut console = Console::stdio(cli.json, false, false);

            wallet::wallet(
                &backend,
                &monitor,
                &registry,
                credential,
                args.network.as_deref(),
                &mut console,
            )
            .await
        }
    };

    Ok(status.into())
}

/// Diagnostics go to stderr; stdout carries only the command output.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

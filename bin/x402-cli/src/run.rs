//! Two-phase probe and pay orchestration.

use crate::{
    confirm,
    output::{Console, ExitStatus, RunResult, RunStatus, PAYMENT_BODY_PREVIEW, PROBE_BODY_PREVIEW},
    RunError,
};
use config::NetworkRegistry;
use payment::{
    header::{PAYMENT_REQUIRED, PAYMENT_RESPONSE, X_PAYMENT_RESPONSE},
    EndpointTarget, Executor, PaymentBackend, ProbeClass, Reply, SettlementClass, SettlementResponse,
};
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tokio::io::AsyncBufRead;
use tracing::{debug, warn};

/// What to request and how far to go.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub url: String,
    pub method: String,
    pub data: Option<String>,
    pub headers: Vec<String>,
    /// Stop after the unauthenticated request
    pub skip_verify: bool,
    /// Confirm before paying
    pub dry_run: bool,
    /// Auto-confirm
    pub yes: bool,
    /// Where to save the final response body
    pub output: Option<PathBuf>,
}

/// Collaborators shared by both phases.
pub struct Session<'a, B> {
    pub backend: &'a B,
    /// Transport reused by the probe and the payment phase
    pub client: reqwest::Client,
    pub credential: Option<&'a str>,
    pub registry: &'a NetworkRegistry,
}

/// Run the probe, the optional confirmation and the payment, then emit the
/// result exactly once.
pub async fn run<B, W, E, R>(
    session: &Session<'_, B>,
    options: &RunOptions,
    console: &mut Console<W, E>,
    input: &mut R,
) -> ExitStatus
where
    B: PaymentBackend,
    W: Write,
    E: Write,
    R: AsyncBufRead + Unpin,
{
    let mut result = RunResult::new(&options.url, &options.method);

    match execute(session, options, console, input, &mut result).await {
        Ok(status) => {
            result.status = status;
            console.finish(result, None);
            status.exit_status()
        }
        Err(e) => {
            debug!(error = %e, "Run failed");
            result.fail(&e);
            console.finish(result, Some(&e));
            ExitStatus::Error
        }
    }
}

async fn execute<B, W, E, R>(
    session: &Session<'_, B>,
    options: &RunOptions,
    console: &mut Console<W, E>,
    input: &mut R,
    result: &mut RunResult,
) -> Result<RunStatus, RunError>
where
    B: PaymentBackend,
    W: Write,
    E: Write,
    R: AsyncBufRead + Unpin,
{
    if options.url.trim().is_empty() {
        return Err(RunError::MissingUrl);
    }

    console.banner(&options.url, &options.method);
    console.line("--- Step 1: Request without payment ---");

    let target = EndpointTarget::new(&options.url, &options.method, options.data.clone(), &options.headers)?;
    console.dump_request(&target);

    let (probe, reply) = payment::probe(&session.client, &target).await?;
    console.dump_response(&reply);
    print_payment_header(console, &reply, &[PAYMENT_REQUIRED]);
    console.status(probe.status_code, &probe.body, PROBE_BODY_PREVIEW);

    let class = probe.class();
    let requirements = probe.requirements();
    result.probe = Some(probe);

    if class != ProbeClass::PaymentRequired {
        console.line("Endpoint did not return 402 Payment Required.");
        if class == ProbeClass::Free {
            console.line("The endpoint is accessible without payment (free route).");
            save_output(options.output.as_deref(), &reply.body).await;
            return Ok(RunStatus::Free);
        }
        return Ok(RunStatus::No402);
    }

    if options.skip_verify {
        console.line("--skip-verify: stopping after Step 1.");
        return Ok(RunStatus::PaymentRequired);
    }

    if options.dry_run && !options.yes {
        if console.is_json() {
            return Ok(RunStatus::PaymentRequired);
        }

        for line in confirm::summary(requirements.as_ref(), session.registry) {
            console.say(format_args!("{line}\n"));
        }
        console.say(confirm::PROMPT);
        if !confirm::read_confirmation(input).await? {
            console.say("Aborted.\n");
            return Ok(RunStatus::PaymentRequired);
        }
        console.say("\n");
    }

    let credential = session
        .credential
        .filter(|c| !c.trim().is_empty())
        .ok_or(RunError::MissingPaymentCredential)?;

    console.line("--- Step 2: Request with x402 payment ---");

    let executor = Executor::prepare(session.backend, session.client.clone(), Some(credential))?;
    console.line(format_args!("Signer: {}", executor.signer()));

    let (outcome, reply) = executor.execute(&target).await.map_err(RunError::PaymentRequest)?;
    console.dump_response(&reply);
    print_payment_header(console, &reply, &[PAYMENT_RESPONSE, X_PAYMENT_RESPONSE]);
    console.status(outcome.status_code, &outcome.body, PAYMENT_BODY_PREVIEW);

    let class = outcome.class();
    let settlement = outcome.payment_response.as_ref().and_then(SettlementResponse::from_value);
    result.payment = Some(outcome);
    save_output(options.output.as_deref(), &reply.body).await;

    match class {
        SettlementClass::Accepted => {
            console.line("Payment accepted!");
            if let Some(tx) = settlement.and_then(|s| s.transaction) {
                console.line(format_args!("Transaction: {tx}"));
            }
            Ok(RunStatus::Accepted)
        }
        SettlementClass::Rejected => {
            console.line("Payment was rejected. Check wallet balance and facilitator logs.");
            if let Some(reason) = settlement.and_then(|s| s.error_reason) {
                console.line(format_args!("Reason: {reason}"));
            }
            Ok(RunStatus::Rejected)
        }
        SettlementClass::Unexpected(status) => Err(RunError::UnexpectedStatus(status)),
    }
}

fn print_payment_header<W: Write, E: Write>(console: &mut Console<W, E>, reply: &Reply, names: &[&str]) {
    if let Some((name, value)) = names.iter().find_map(|name| reply.header(name).map(|v| (name, v))) {
        console.payment_header(&name.to_ascii_uppercase(), value);
    }
}

/// Persist a response body when requested. Failure is only a warning.
async fn save_output(path: Option<&Path>, body: &[u8]) {
    let Some(path) = path else {
        return;
    };
    if body.is_empty() {
        return;
    }

    match tokio::fs::write(path, body).await {
        Ok(()) => debug!(path = %path.display(), bytes = body.len(), "Saved response body"),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to write response body"),
    }
}

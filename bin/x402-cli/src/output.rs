//! Run result aggregation and the text/JSON/quiet output multiplexer.

use crate::{RunError, VERSION};
use payment::{header, EndpointTarget, PaymentOutcome, ProbeOutcome, Reply};
use serde::Serialize;
use std::{
    fmt,
    io::{self, Write},
    process::ExitCode,
};
use tracing::debug;

/// Body preview length after the unauthenticated request.
pub const PROBE_BODY_PREVIEW: usize = 300;
/// Body preview length after the paid request.
pub const PAYMENT_BODY_PREVIEW: usize = 500;
/// Preview length of raw payment header values.
const HEADER_PREVIEW: usize = 60;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Payment accepted, or the probe completed
    Success = 0,
    /// Network, configuration or unexpected failure
    Error = 1,
    /// Payment declined by the facilitator
    PaymentRejected = 2,
    /// Route needs no payment
    FreeRoute = 3,
}

impl ExitStatus {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        Self::from(status.code())
    }
}

/// Final state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Free,
    PaymentRequired,
    #[serde(rename = "no_402")]
    No402,
    Accepted,
    Rejected,
    Error,
}

impl RunStatus {
    pub const fn exit_status(self) -> ExitStatus {
        match self {
            Self::Free => ExitStatus::FreeRoute,
            Self::PaymentRequired | Self::No402 | Self::Accepted => ExitStatus::Success,
            Self::Rejected => ExitStatus::PaymentRejected,
            Self::Error => ExitStatus::Error,
        }
    }
}

/// Everything known about a run, emitted once when it ends.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub version: String,
    pub endpoint: String,
    pub method: String,
    pub status: RunStatus,
    pub probe: Option<ProbeOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResult {
    pub fn new(endpoint: &str, method: &str) -> Self {
        Self {
            version: VERSION.to_string(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
            status: RunStatus::Error,
            probe: None,
            payment: None,
            error: None,
        }
    }

    pub fn fail(&mut self, error: &RunError) {
        self.status = RunStatus::Error;
        self.error = Some(error.to_string());
    }
}

/// Output sink for a command.
///
/// Human-readable lines go to `out` only in text mode without `quiet`;
/// structured mode writes a single JSON document to `out` at the end.
/// Errors in text mode go to `err`.
pub struct Console<W, E> {
    out: W,
    err: E,
    json: bool,
    quiet: bool,
    verbose: bool,
}

impl<W, E> Console<W, E>
where
    W: Write,
    E: Write,
{
    pub const fn new(out: W, err: E, json: bool, quiet: bool, verbose: bool) -> Self {
        Self {
            out,
            err,
            json,
            quiet,
            verbose,
        }
    }

    pub const fn is_json(&self) -> bool {
        self.json
    }

    /// Whether full request/response dumps replace body previews.
    pub const fn is_verbose(&self) -> bool {
        self.verbose && self.is_human()
    }

    const fn is_human(&self) -> bool {
        !self.json && !self.quiet
    }

    /// Print a progress line in text mode.
    pub fn line(&mut self, line: impl fmt::Display) {
        if self.is_human() {
            self.write_out(format_args!("{line}\n"));
        }
    }

    /// Print text regardless of `quiet`; used by the interactive prompt.
    pub fn say(&mut self, text: impl fmt::Display) {
        self.write_out(format_args!("{text}"));
        if let Err(e) = self.out.flush() {
            debug!(error = %e, "Failed to flush output");
        }
    }

    pub fn banner(&mut self, endpoint: &str, method: &str) {
        self.line(format_args!("x402-cli {VERSION}"));
        self.line(format_args!("Endpoint: {endpoint}"));
        self.line(format_args!("Method:   {method}\n"));
    }

    /// Status line and body preview, unless the body was already dumped.
    pub fn status(&mut self, status: u16, body: &str, preview: usize) {
        self.line(format_args!("Status: {status}"));
        if !self.verbose {
            self.line(format_args!("Body: {}\n", truncate(body, preview)));
        }
    }

    /// Raw x402 header preview followed by its decoded document.
    pub fn payment_header(&mut self, name: &str, value: &str) {
        if !self.is_human() {
            return;
        }

        self.line(format_args!("{name}: {}...", truncate(value, HEADER_PREVIEW)));
        if let Some(pretty) = header::decode_base64_json(value).and_then(|v| serde_json::to_string_pretty(&v).ok()) {
            self.line(format_args!("{name} (decoded):\n  {}", pretty.replace('\n', "\n  ")));
        }
    }

    pub fn dump_request(&mut self, target: &EndpointTarget) {
        if !self.is_verbose() {
            return;
        }

        let mut dump = format!("→ Request:\n{} {}\n", target.method(), target.url());
        for (name, value) in target.headers() {
            dump.push_str(&format!("{name}: {}\n", String::from_utf8_lossy(value.as_bytes())));
        }
        if let Some(body) = target.body() {
            dump.push_str(&format!("\n{body}\n"));
        }
        self.line(dump);
    }

    pub fn dump_response(&mut self, reply: &Reply) {
        if !self.is_verbose() {
            return;
        }

        let mut dump = format!("← Response:\n{:?} {}\n", reply.version, reply.status);
        for (name, value) in &reply.headers {
            dump.push_str(&format!("  {name}: {}\n", String::from_utf8_lossy(value.as_bytes())));
        }
        dump.push_str(&format!("\n{}\n", reply.text()));
        self.line(dump);
    }

    /// Emit a document in structured mode.
    pub fn json<T: Serialize>(&mut self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => self.write_out(format_args!("{json}\n")),
            Err(e) => self.error(format_args!("failed to encode result: {e}")),
        }
    }

    /// Report an error on the diagnostic stream.
    pub fn error(&mut self, message: impl fmt::Display) {
        if let Err(e) = writeln!(self.err, "Error: {message}") {
            debug!(error = %e, "Failed to write error");
        }
    }

    /// Extra diagnostic line, e.g. a remediation hint.
    pub fn note(&mut self, message: impl fmt::Display) {
        if let Err(e) = writeln!(self.err, "{message}") {
            debug!(error = %e, "Failed to write error");
        }
    }

    /// Emit the terminal state of a run.
    ///
    /// Structured mode prints the document, error included; text mode only
    /// has the error left to report.
    pub fn finish(&mut self, result: RunResult, error: Option<&RunError>) {
        if self.json {
            self.json(&result);
            return;
        }

        if let Some(error) = error {
            self.error(error);
            if let Some(hint) = error.hint() {
                self.note(hint);
            }
        }
    }

    pub fn into_inner(self) -> (W, E) {
        (self.out, self.err)
    }

    fn write_out(&mut self, args: fmt::Arguments<'_>) {
        if let Err(e) = self.out.write_fmt(args) {
            debug!(error = %e, "Failed to write output");
        }
    }
}

impl Console<io::Stdout, io::Stderr> {
    pub fn stdio(json: bool, quiet: bool, verbose: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), json, quiet, verbose)
    }
}

/// First `max` characters of `s`.
pub fn truncate(s: &str, max: usize) -> &str {
    s.char_indices().nth(max).map_or(s, |(i, _)| &s[..i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use payment::header::encode_base64_json;
    use serde_json::{json, Value};

    fn console(json: bool, quiet: bool) -> Console<Vec<u8>, Vec<u8>> {
        Console::new(Vec::new(), Vec::new(), json, quiet, false)
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("", 3), "");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunStatus::Free.exit_status().code(), 3);
        assert_eq!(RunStatus::No402.exit_status().code(), 0);
        assert_eq!(RunStatus::PaymentRequired.exit_status().code(), 0);
        assert_eq!(RunStatus::Accepted.exit_status().code(), 0);
        assert_eq!(RunStatus::Rejected.exit_status().code(), 2);
        assert_eq!(RunStatus::Error.exit_status().code(), 1);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_value(RunStatus::No402).unwrap(), "no_402");
        assert_eq!(serde_json::to_value(RunStatus::PaymentRequired).unwrap(), "payment_required");
    }

    #[test]
    fn test_text_mode_lines() {
        let mut console = console(false, false);
        console.banner("https://api.example.com", "GET");
        console.status(402, &"x".repeat(400), PROBE_BODY_PREVIEW);

        let (out, err) = console.into_inner();
        let out = text(out);
        assert!(out.starts_with(&format!("x402-cli {VERSION}\nEndpoint: https://api.example.com\nMethod:   GET\n\n")));
        assert!(out.contains("Status: 402\n"));
        assert!(out.contains(&format!("Body: {}\n", "x".repeat(300))));
        assert!(!out.contains(&"x".repeat(301)));
        assert!(err.is_empty());
    }

    #[test]
    fn test_verbose_skips_body_preview() {
        let mut console = Console::new(Vec::new(), Vec::new(), false, false, true);
        assert!(console.is_verbose());
        console.status(200, "hello", PROBE_BODY_PREVIEW);

        let out = text(console.into_inner().0);
        assert_eq!(out, "Status: 200\n");

        let console = Console::new(Vec::<u8>::new(), Vec::<u8>::new(), true, false, true);
        assert!(!console.is_verbose());
    }

    #[test]
    fn test_payment_header_decoded() {
        let mut console = console(false, false);
        let value = encode_base64_json(&json!({ "success": true })).unwrap();
        console.payment_header("PAYMENT-RESPONSE", &value);

        let out = text(console.into_inner().0);
        assert!(out.starts_with(&format!("PAYMENT-RESPONSE: {value}...\n")));
        assert!(out.contains("PAYMENT-RESPONSE (decoded):\n  {\n    \"success\": true\n  }\n"));
    }

    #[test]
    fn test_quiet_and_json_suppress_progress() {
        for (json, quiet) in [(false, true), (true, false), (true, true)] {
            let mut console = console(json, quiet);
            console.banner("https://api.example.com", "GET");
            console.line("--- Step 1: Request without payment ---");
            console.payment_header("PAYMENT-REQUIRED", "abc");
            assert!(console.into_inner().0.is_empty());
        }
    }

    #[test]
    fn test_finish_json_carries_error() {
        let mut console = console(true, true);
        let mut result = RunResult::new("https://api.example.com", "GET");
        result.fail(&RunError::MissingPaymentCredential);
        console.finish(result, Some(&RunError::MissingPaymentCredential));

        let (out, err) = console.into_inner();
        let document: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(document["status"], "error");
        assert_eq!(document["error"], "EVM_PRIVATE_KEY is required for Step 2 (payment)");
        assert!(document["probe"].is_null());
        assert!(document.get("payment").is_none());
        assert!(err.is_empty());
    }

    #[test]
    fn test_finish_text_reports_error_with_hint() {
        let mut console = console(false, true);
        let mut result = RunResult::new("https://api.example.com", "GET");
        result.fail(&RunError::MissingPaymentCredential);
        console.finish(result, Some(&RunError::MissingPaymentCredential));

        let (out, err) = console.into_inner();
        assert!(out.is_empty());
        assert_eq!(
            text(err),
            "Error: EVM_PRIVATE_KEY is required for Step 2 (payment)\nSet it with: export EVM_PRIVATE_KEY=0x...\n"
        );
    }
}

//! Interactive confirmation before paying.

use alloy_primitives::Address;
use balance::amount;
use config::NetworkRegistry;
use payment::{PaymentOption, PaymentRequired};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const PROMPT: &str = "\nProceed with payment? [y/N] ";

/// Lines describing what is about to be paid, from the first accepted option.
pub fn summary(required: Option<&PaymentRequired>, registry: &NetworkRegistry) -> Vec<String> {
    let mut lines = vec!["\n--- Payment Summary ---".to_string()];

    let Some(required) = required else {
        lines.push("Payment requirements unavailable.".to_string());
        return lines;
    };

    if let Some(url) = required.resource_url() {
        lines.push(format!("Resource: {url}"));
    }

    if let Some(option) = required.first_option() {
        let mut cost = format!("Cost:     {} {} (atomic units)", option.amount, option.asset_name());
        if let Some(human) = human_cost(&option, registry) {
            cost.push_str(&format!(" = {human}"));
        }
        lines.push(cost);
        lines.push(format!("Network:  {}", option.network));
        lines.push(format!("Pay to:   {}", option.pay_to));
    }

    lines
}

/// Cost in token units when the option pays a known registry token.
fn human_cost(option: &PaymentOption, registry: &NetworkRegistry) -> Option<String> {
    let network = registry.resolve(&option.network)?;
    let asset: Address = option.asset.parse().ok()?;
    if asset != network.token {
        return None;
    }

    let raw = amount::parse_atomic(&option.amount).ok()?;
    Some(format!("{} {}", amount::to_human(raw, network.decimals), network.symbol))
}

/// Read one line of operator input; only an answer starting with `y`
/// proceeds. End of input declines.
pub async fn read_confirmation<R>(input: &mut R) -> std::io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = input.read_line(&mut line).await?;
    Ok(read > 0 && line.trim().to_lowercase().starts_with('y'))
}

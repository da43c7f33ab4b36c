//! Commands that talk to a running router: `status` and `reset`.

use crate::api::HealthResponse;
use crate::cli::output::format_status;
use crate::cli::{ResetArgs, StatusArgs};
use crate::metrics::StatsResponse;
use serde::de::DeserializeOwned;
use std::time::Duration;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

fn client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(CLIENT_TIMEOUT).build()
}

async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: String,
) -> Result<T, Box<dyn std::error::Error>> {
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| format!("Cannot reach router at {}: {}", url, e))?;
    if !response.status().is_success() {
        return Err(format!("{} returned {}", url, response.status()).into());
    }
    Ok(response.json().await?)
}

/// Handle `llm-router status`
pub async fn handle_status(args: &StatusArgs) -> Result<String, Box<dyn std::error::Error>> {
    let base = args.url.trim_end_matches('/');
    let client = client()?;

    let health: HealthResponse = get_json(&client, format!("{}/health", base)).await?;
    let stats: StatsResponse = get_json(&client, format!("{}/v1/stats", base)).await?;

    if args.json {
        Ok(serde_json::to_string_pretty(&serde_json::json!({
            "health": health,
            "stats": stats,
        }))?)
    } else {
        Ok(format_status(&health, &stats))
    }
}

/// Handle `llm-router reset`
pub async fn handle_reset(args: &ResetArgs) -> Result<String, Box<dyn std::error::Error>> {
    let base = args.url.trim_end_matches('/');
    let url = match &args.model {
        Some(model) => format!("{}/circuit-breaker/reset/{}", base, model),
        None => format!("{}/circuit-breaker/reset-all", base),
    };

    let response = client()?
        .post(&url)
        .send()
        .await
        .map_err(|e| format!("Cannot reach router at {}: {}", base, e))?;

    let status = response.status();
    if !status.is_success() {
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body["error"]["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string());
        return Err(message.into());
    }

    Ok(match &args.model {
        Some(model) => format!("✓ Circuit reset for {}", model),
        None => "✓ All circuits reset".to_string(),
    })
}

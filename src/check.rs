//! Connectivity probe for the configured model backends.
//!
//! `docqa check` verifies that the Ollama instance is reachable and that
//! the configured embedding and generation models have been pulled, so a
//! failing upload can be told apart from a missing model before the
//! service goes up.

use anyhow::Result;
use std::time::Duration;

use crate::config::{Config, DEFAULT_OLLAMA_URL};

pub async fn run_check(config: &Config) -> Result<()> {
    let url = config
        .embedding
        .url
        .as_deref()
        .or(config.llm.url.as_deref())
        .unwrap_or(DEFAULT_OLLAMA_URL);

    println!("{:<12} {:<28} STATUS", "KIND", "TARGET");

    let models = match list_ollama_models(url).await {
        Ok(models) => {
            println!("{:<12} {:<28} OK", "ollama", url);
            Some(models)
        }
        Err(e) => {
            println!("{:<12} {:<28} UNREACHABLE ({})", "ollama", url, e);
            None
        }
    };

    for (kind, provider, model) in [
        (
            "embedding",
            config.embedding.provider.as_str(),
            config.embedding.model.as_str(),
        ),
        ("llm", config.llm.provider.as_str(), config.llm.model.as_str()),
    ] {
        if provider != "ollama" {
            println!("{:<12} {:<28} SKIPPED ({} provider)", kind, model, provider);
            continue;
        }
        match &models {
            Some(available) if available.iter().any(|m| m.starts_with(model)) => {
                println!("{:<12} {:<28} PRESENT", kind, model);
            }
            Some(_) => {
                println!(
                    "{:<12} {:<28} MISSING (run: ollama pull {})",
                    kind, model, model
                );
            }
            None => {
                println!("{:<12} {:<28} UNKNOWN", kind, model);
            }
        }
    }

    Ok(())
}

/// Fetch the names of locally available models via `GET /api/tags`.
async fn list_ollama_models(url: &str) -> Result<Vec<String>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let json: serde_json::Value = client
        .get(format!("{}/api/tags", url))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(json
        .get("models")
        .and_then(|m| m.as_array())
        .map(|models| {
            models
                .iter()
                .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default())
}

mod cli;

use crate::cli::{Command, LogFormat, CLI};
use clap::Parser;
use serde_json::json;
use std::sync::Arc;
use tinylink_core::{CreationRequest, SystemClock, TracingSink, UrlRecord};
use tinylink_generator::RandomGenerator;
use tinylink_shortener::{BatchSettings, FixedLocator, ShortenerService};
use tinylink_storage::JsonFilePersistence;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    info!(
        store = %config.store.display(),
        default_validity = config.default_validity,
        "opening url store"
    );

    let service = ShortenerService::open(
        Arc::new(JsonFilePersistence::new(&config.store)),
        RandomGenerator::new(),
        Arc::new(SystemClock),
        Arc::new(TracingSink),
    )
    .await
    .with_settings(
        BatchSettings::builder()
            .default_validity_minutes(config.default_validity)
            .build(),
    )
    .with_locator(Arc::new(FixedLocator::new(config.location)));

    let base_url = config.base_url;
    let output = match config.command {
        Command::Shorten {
            urls,
            codes,
            validity,
        } => {
            let mut codes = codes.into_iter();
            let requests = urls.into_iter().enumerate().map(|(index, url)| {
                let code = codes.next();
                CreationRequest {
                    id: (index + 1).to_string(),
                    long_url: url,
                    validity_minutes: validity,
                    custom_shortcode: code,
                }
            });
            let outcome = service.shorten(requests).await;
            json!({
                "succeeded": outcome
                    .succeeded
                    .iter()
                    .map(|record| summary(record, &base_url))
                    .collect::<Vec<_>>(),
                "errors": outcome.error_messages(),
            })
        }
        Command::Open { code, referrer } => match service.redirect(&code, &referrer).await {
            Some(record) => summary(&record, &base_url),
            None => return Err(format!("shortcode not found or expired: {code}").into()),
        },
        Command::Show { code } => match service.lookup(&code) {
            Some(record) => serde_json::to_value(&record)?,
            None => return Err(format!("shortcode not found or expired: {code}").into()),
        },
        Command::List => json!(service
            .list()
            .iter()
            .map(|record| summary(record, &base_url))
            .collect::<Vec<_>>()),
        Command::Clear => json!({ "removed": service.clear().await }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn summary(record: &UrlRecord, base_url: &str) -> serde_json::Value {
    json!({
        "id": record.id,
        "shortcode": record.shortcode,
        "shortUrl": record.shortcode.to_url(base_url),
        "longUrl": record.long_url,
        "createdAt": record.created_at,
        "expiresAt": record.expires_at,
        "clicks": record.click_count(),
    })
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

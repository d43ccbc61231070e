//! Sample data loading for demo replay

use std::path::Path;

use crate::types::{FeedResult, SampleBatch};

/// Load a sample batch from an http(s) URL or a local file
pub async fn load_sample(source: &str) -> FeedResult<SampleBatch> {
    let batch = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_sample(source).await?
    } else {
        read_sample(source).await?
    };

    tracing::info!(
        "[Sample] Loaded {} messages from {}",
        batch.messages.len(),
        source
    );
    Ok(batch)
}

/// Fetch a `/latest.json` style document over HTTP
pub async fn fetch_sample(url: &str) -> FeedResult<SampleBatch> {
    let batch = reqwest::get(url)
        .await?
        .error_for_status()?
        .json::<SampleBatch>()
        .await?;
    Ok(batch)
}

/// Read a sample document from disk
pub async fn read_sample<P: AsRef<Path>>(path: P) -> FeedResult<SampleBatch> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

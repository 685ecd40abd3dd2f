//! Turning text or a voice recording into an image prompt.

use anyhow::{Context, Result};
use std::path::Path;

use crate::api::ApiClient;

pub async fn text(client: &ApiClient, input: &str) -> Result<()> {
    let result = client.process_text(input).await?;
    println!("{}", result.translation);
    if result.source_language != result.target_language {
        println!(
            "  (translated from {} to {})",
            result.source_language, result.target_language
        );
    }
    Ok(())
}

pub async fn voice(client: &ApiClient, file: &Path) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("recording.wav");

    let result = client.process_voice(filename, bytes).await?;
    println!("Transcription: {}", result.transcription);
    println!("Prompt:        {}", result.translation);
    println!("Language:      {}", result.language);
    Ok(())
}

use anyhow::Result;

use crate::api::{ApiClient, GenerateRequest};

pub async fn generate(client: &ApiClient, request: GenerateRequest) -> Result<()> {
    println!("Generating image (this can take a few minutes)...");
    let image = client.generate_image(&request).await?;

    println!("Generated {}", image.filename);
    if let Some(url) = &image.image_url {
        println!("  url: {}", url);
    }
    if let Some(seconds) = image.generation_time {
        println!("  took {:.1}s", seconds);
    }
    if let Some(credits) = image.credits_remaining {
        println!("  credits remaining: {}", credits);
    }
    Ok(())
}

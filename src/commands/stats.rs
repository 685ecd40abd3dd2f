use anyhow::Result;

use crate::api::ApiClient;

pub async fn stats(client: &ApiClient) -> Result<()> {
    let stats = client.user_stats().await?;

    println!("plan:           {}", stats.plan);
    println!("credits:        {}", stats.credits);
    println!("images:         {}", stats.total_images);
    println!("feedback given: {}", stats.total_feedback);

    if !stats.recent_activity.is_empty() {
        println!("recent activity:");
        for entry in &stats.recent_activity {
            println!("  {}  {}", entry.created_at, entry.art_style);
        }
    }
    Ok(())
}

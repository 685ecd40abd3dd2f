use anyhow::Result;

use crate::api::ApiClient;

pub async fn health(client: &ApiClient) -> Result<()> {
    let health = client.health().await?;
    println!("{}", serde_json::to_string_pretty(&health)?);
    Ok(())
}

pub async fn status(client: &ApiClient) -> Result<()> {
    let status = client.system_status().await?;

    println!("status:    {}", status.status);
    println!("timestamp: {}", status.timestamp);
    if let Some(memory) = &status.memory_usage {
        println!("cpu memory: {:.0} MB", memory.cpu_memory_mb);
        if let Some(gpu) = memory.gpu_memory_mb {
            println!("gpu memory: {:.0} MB", gpu);
        }
        println!("models loaded: {}", memory.models_loaded);
        if let Some(generation) = &memory.generation_stats {
            println!(
                "generations: {} ({} failed, avg {:.1}s)",
                generation.total_generations,
                generation.failed_generations,
                generation.average_generation_time
            );
        }
    }
    if let Some(db) = &status.database_stats {
        println!(
            "database: {} users, {} images, {} feedback entries",
            db.users, db.images, db.feedback
        );
    }
    Ok(())
}

use anyhow::Result;

use crate::api::{ApiClient, FeedbackRequest};

pub async fn feedback(client: &ApiClient, request: FeedbackRequest) -> Result<()> {
    let message = client.submit_feedback(&request).await?;
    println!("{}", message);
    Ok(())
}

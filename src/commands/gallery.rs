use anyhow::Result;

use crate::api::{ApiClient, GalleryQuery};

pub async fn gallery(client: &ApiClient, query: GalleryQuery) -> Result<()> {
    let page = client.gallery(&query).await?;

    if page.images.is_empty() {
        println!("No images found");
        return Ok(());
    }

    for image in &page.images {
        println!(
            "{}  {}  [{} / {}]",
            image.created_at, image.filename, image.art_style, image.quality
        );
        println!("    {}", image.prompt);
    }
    println!(
        "Page {}/{} ({} images total)",
        page.pagination.page, page.pagination.total_pages, page.pagination.total
    );
    if page.pagination.has_more {
        println!("Use --page {} for more", page.pagination.page + 1);
    }
    Ok(())
}

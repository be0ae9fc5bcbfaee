use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// true  => registration number is TAKEN
/// false => registration number is AVAILABLE (usually we store only taken)
pub static REGNO_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000) // tune based on memory
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Mark a single registration number as taken
pub async fn mark_taken(reg_no: &str) {
    REGNO_CACHE.insert(reg_no.to_uppercase(), true).await;
}

/// Check if a registration number is taken
pub async fn is_taken(reg_no: &str) -> bool {
    REGNO_CACHE.get(&reg_no.to_uppercase()).await.unwrap_or(false)
}

/// Batch mark registration numbers as taken
async fn batch_mark(reg_nos: &[String]) {
    let futures: Vec<_> = reg_nos
        .iter()
        .map(|r| REGNO_CACHE.insert(r.to_uppercase(), true))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load RECENTLY registered students into the in-memory cache (batched)
pub async fn warmup_regno_cache(pool: &MySqlPool, days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT reg_no
        FROM students
        WHERE created_at >= NOW() - INTERVAL ? DAY
        ORDER BY created_at DESC
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (reg_no,) = row?;
        batch.push(reg_no);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_mark(&batch).await;
            batch.clear();
        }
    }

    // Insert any remaining registration numbers
    if !batch.is_empty() {
        batch_mark(&batch).await;
    }

    log::info!(
        "Reg no cache warmup complete: {} recent students (last {} days)",
        total_count,
        days
    );

    Ok(())
}

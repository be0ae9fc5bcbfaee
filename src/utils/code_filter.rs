use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on real enrollment counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static CODE_FILTER: Lazy<RwLock<CuckooFilter<String>>> = Lazy::new(|| {
    RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE))
});

#[inline]
fn normalize(code: &str) -> String {
    code.to_uppercase()
}

/// Check if a scan code might already be issued (false positives possible)
pub fn might_exist(code: &str) -> bool {
    let code = normalize(code);
    CODE_FILTER
        .read()
        .expect("scan code filter poisoned")
        .contains(&code)
}

/// Insert a single issued scan code into the filter
pub fn insert(code: &str) {
    let code = normalize(code);
    CODE_FILTER
        .write()
        .expect("scan code filter poisoned")
        .add(&code);
}

/// Warm up the scan code filter from both identity tables, streaming + batching
pub async fn warmup_code_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut total = 0usize;

    for table in ["students", "staff"] {
        let sql = format!("SELECT barcode FROM {}", table);
        let mut stream = sqlx::query_as::<_, (String,)>(&sql).fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);

        while let Some(row) = stream.next().await {
            let (code,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

            batch.push(normalize(&code));
            total += 1;

            if batch.len() == batch_size {
                insert_batch(&batch);
                batch.clear();
            }
        }

        if !batch.is_empty() {
            insert_batch(&batch);
        }
    }

    log::info!("Scan code filter warmup complete: {} codes", total);
    Ok(())
}

/// Insert a batch of normalized scan codes
fn insert_batch(codes: &[String]) {
    let mut filter = CODE_FILTER.write().expect("scan code filter poisoned");

    for code in codes {
        filter.add(code);
    }
}

use std::sync::Arc;

use cloudsift_core::pricing::PriceCache;

#[tokio::test]
async fn saved_prices_load_into_a_fresh_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache").join("costs.json");

    let cache = PriceCache::new(&path);
    cache.set("EC2:us-east-1:t3.micro", 0.0104);
    cache.set("EBSVolumes:eu-west-1:gp3", 0.088);
    cache.save().await.unwrap();

    let reloaded = PriceCache::open(&path).await.unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.get("EC2:us-east-1:t3.micro"), Some(0.0104));
    assert_eq!(reloaded.get("EBSVolumes:eu-west-1:gp3"), Some(0.088));
    assert_eq!(reloaded.get("ELB:us-east-1:none"), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_leave_a_readable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("costs.json");
    let cache = Arc::new(PriceCache::new(&path));

    let writers: Vec<_> = (0..16)
        .map(|i| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache.set(format!("EC2:us-east-1:m{i}.large"), i as f64 / 100.0);
                cache.save().await
            })
        })
        .collect();
    for writer in writers {
        writer.await.unwrap().unwrap();
    }

    let reloaded = PriceCache::open(&path).await.unwrap();
    assert_eq!(reloaded.len(), 16);
    assert_eq!(reloaded.get("EC2:us-east-1:m7.large"), Some(0.07));
}

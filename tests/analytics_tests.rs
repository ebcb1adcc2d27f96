//! View tracking and daily ranking tests
//!
//! Runs `ViewAnalytics` against temporary SQLite databases.

use std::sync::{Arc, Once};
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use jcpe_portal::analytics::{ViewAnalytics, ViewOutcome, rank_counts};
use jcpe_portal::config::init_config;
use jcpe_portal::storage::{NewArticle, RankingEntry, SeaOrmStorage, ViewCount};
use tempfile::TempDir;

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

async fn create_temp_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    init_test_config();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("analytics.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");

    (Arc::new(storage), temp_dir)
}

async fn create_article(storage: &SeaOrmStorage, title: &str, slug: &str) -> i64 {
    storage
        .insert_article(&NewArticle {
            title: title.to_string(),
            slug: slug.to_string(),
            summary: None,
            body: "Corpo da notícia".to_string(),
            image: None,
            category_id: None,
            author_id: None,
            tag_ids: Vec::new(),
            published_at: Utc::now(),
        })
        .await
        .expect("Failed to insert article")
}

/// UTC 偏移为 0，缓存极短，日期计算一目了然
fn analytics(storage: Arc<SeaOrmStorage>) -> ViewAnalytics {
    ViewAnalytics::new(storage, 0, Duration::from_millis(1))
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// =============================================================================
// 访问记录
// =============================================================================

#[tokio::test]
async fn test_record_view_is_idempotent_per_ip_and_day() {
    let (storage, _dir) = create_temp_storage().await;
    let article = create_article(&storage, "Chuva forte no Recife", "chuva-forte").await;
    let analytics = analytics(storage.clone());

    let morning = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let evening = Utc.with_ymd_and_hms(2024, 5, 1, 21, 0, 0).unwrap();

    assert_eq!(
        analytics.record_view(article, "10.0.0.1", morning).await.unwrap(),
        ViewOutcome::Recorded
    );
    assert_eq!(
        analytics.record_view(article, "10.0.0.1", evening).await.unwrap(),
        ViewOutcome::Duplicate
    );
    assert_eq!(
        analytics.count_unique_views(article, day(2024, 5, 1)).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_record_view_counts_again_on_next_day() {
    let (storage, _dir) = create_temp_storage().await;
    let article = create_article(&storage, "Frevo no carnaval", "frevo").await;
    let analytics = analytics(storage.clone());

    let first = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();

    analytics.record_view(article, "10.0.0.1", first).await.unwrap();
    assert_eq!(
        analytics.record_view(article, "10.0.0.1", second).await.unwrap(),
        ViewOutcome::Recorded
    );
    assert_eq!(analytics.count_unique_views(article, day(2024, 5, 1)).await.unwrap(), 1);
    assert_eq!(analytics.count_unique_views(article, day(2024, 5, 2)).await.unwrap(), 1);
}

#[tokio::test]
async fn test_record_view_uses_local_calendar_day() {
    let (storage, _dir) = create_temp_storage().await;
    let article = create_article(&storage, "Maré alta em Olinda", "mare-alta").await;
    let recife = ViewAnalytics::new(storage.clone(), -180, Duration::from_millis(1));

    // 01:00 UTC 是 Recife 前一天 22:00
    let when = Utc.with_ymd_and_hms(2024, 5, 2, 1, 0, 0).unwrap();
    recife.record_view(article, "10.0.0.9", when).await.unwrap();

    assert_eq!(recife.count_unique_views(article, day(2024, 5, 1)).await.unwrap(), 1);
    assert_eq!(recife.count_unique_views(article, day(2024, 5, 2)).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_views_record_once() {
    let (storage, _dir) = create_temp_storage().await;
    let article = create_article(&storage, "Ponte interditada na Boa Vista", "ponte").await;
    let analytics = Arc::new(analytics(storage.clone()));
    let when = Utc.with_ymd_and_hms(2024, 5, 3, 10, 0, 0).unwrap();

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let analytics = analytics.clone();
            tokio::spawn(async move { analytics.record_view(article, "10.1.1.1", when).await })
        })
        .collect();

    let mut recorded = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            ViewOutcome::Recorded => recorded += 1,
            ViewOutcome::Duplicate => duplicates += 1,
        }
    }

    assert_eq!(recorded, 1);
    assert_eq!(duplicates, 31);
    assert_eq!(
        analytics.count_unique_views(article, day(2024, 5, 3)).await.unwrap(),
        1
    );
}

// =============================================================================
// 日榜
// =============================================================================

#[tokio::test]
async fn test_daily_ranking_orders_by_unique_views() {
    let (storage, _dir) = create_temp_storage().await;
    let popular = create_article(&storage, "Notícia popular", "popular").await;
    let quiet = create_article(&storage, "Notícia tranquila", "tranquila").await;
    let unseen = create_article(&storage, "Notícia sem leitores", "sem-leitores").await;
    let analytics = analytics(storage.clone());

    let when = Utc.with_ymd_and_hms(2024, 6, 10, 15, 0, 0).unwrap();
    for ip in ["1.1.1.1", "2.2.2.2", "3.3.3.3"] {
        analytics.record_view(popular, ip, when).await.unwrap();
    }
    analytics.record_view(quiet, "1.1.1.1", when).await.unwrap();

    let entries = analytics.compute_daily_ranking(day(2024, 6, 10)).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!((entries[0].article_id, entries[0].views, entries[0].rank), (popular, 3, 1));
    assert_eq!((entries[1].article_id, entries[1].views, entries[1].rank), (quiet, 1, 2));
    assert!(entries.iter().all(|e| e.article_id != unseen));

    let stored = analytics.ranking_for(day(2024, 6, 10)).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].article.slug, "popular");
    assert_eq!(stored[0].rank, 1);
}

#[tokio::test]
async fn test_daily_ranking_breaks_ties_by_article_id() {
    let (storage, _dir) = create_temp_storage().await;
    let first = create_article(&storage, "Primeira notícia", "primeira").await;
    let second = create_article(&storage, "Segunda notícia", "segunda").await;
    let analytics = analytics(storage.clone());

    let when = Utc.with_ymd_and_hms(2024, 6, 11, 10, 0, 0).unwrap();
    // 先访问 second，确保顺序不取决于写入先后
    analytics.record_view(second, "9.9.9.9", when).await.unwrap();
    analytics.record_view(first, "9.9.9.9", when).await.unwrap();

    let entries = analytics.compute_daily_ranking(day(2024, 6, 11)).await.unwrap();
    assert_eq!(entries[0].article_id, first);
    assert_eq!(entries[0].rank, 1);
    assert_eq!(entries[1].article_id, second);
    assert_eq!(entries[1].rank, 2);
}

#[tokio::test]
async fn test_daily_ranking_recompute_is_stable() {
    let (storage, _dir) = create_temp_storage().await;
    let a = create_article(&storage, "Notícia A do dia", "noticia-a").await;
    let b = create_article(&storage, "Notícia B do dia", "noticia-b").await;
    let analytics = analytics(storage.clone());

    let when = Utc.with_ymd_and_hms(2024, 6, 12, 8, 0, 0).unwrap();
    analytics.record_view(a, "1.1.1.1", when).await.unwrap();
    analytics.record_view(b, "1.1.1.1", when).await.unwrap();
    analytics.record_view(b, "2.2.2.2", when).await.unwrap();

    let first = analytics.compute_daily_ranking(day(2024, 6, 12)).await.unwrap();
    let second = analytics.compute_daily_ranking(day(2024, 6, 12)).await.unwrap();
    assert_eq!(first, second);

    let stored = storage.ranking_for_day(day(2024, 6, 12)).await.unwrap();
    assert_eq!(stored, first);

    let summary = storage.find_article_summary(b).await.unwrap().unwrap();
    assert_eq!(summary.daily_rank, Some(1));
    assert_eq!(summary.daily_rank_date, Some(day(2024, 6, 12)));
}

#[tokio::test]
async fn test_daily_ranking_for_empty_day() {
    let (storage, _dir) = create_temp_storage().await;
    let analytics = analytics(storage);

    let entries = analytics.compute_daily_ranking(day(2024, 1, 1)).await.unwrap();
    assert!(entries.is_empty());
    assert!(analytics.ranking_for(day(2024, 1, 1)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_most_viewed_limits_results() {
    let (storage, _dir) = create_temp_storage().await;
    let analytics = analytics(storage.clone());
    let when = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();

    for i in 0..4 {
        let id = create_article(&storage, &format!("Notícia número {}", i), &format!("n-{}", i)).await;
        analytics.record_view(id, "5.5.5.5", when).await.unwrap();
    }

    let top = analytics.most_viewed(day(2024, 7, 1), 3).await.unwrap();
    assert_eq!(top.len(), 3);
    assert_eq!(
        top.iter().map(|r| r.rank).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn test_rank_counts_drops_zero_views() {
    let counts = vec![
        ViewCount { article_id: 3, views: 0 },
        ViewCount { article_id: 1, views: 2 },
    ];
    let entries = rank_counts(counts, day(2024, 1, 1));
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].article_id, 1);
}

#[tokio::test]
async fn test_large_ranking_is_stored_in_chunks() {
    let (storage, _dir) = create_temp_storage().await;
    let ranking_day = day(2024, 8, 1);

    let mut ids = Vec::new();
    for i in 0..1100 {
        let title = format!("Notícia do arquivo {}", i);
        ids.push(create_article(&storage, &title, &format!("arquivo-{}", i)).await);
    }

    let entries: Vec<RankingEntry> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| RankingEntry {
            article_id: *id,
            day: ranking_day,
            views: 2000 - i as i64,
            rank: i as i32 + 1,
        })
        .collect();
    storage.replace_daily_ranking(ranking_day, &entries).await.unwrap();

    let stored = storage.ranking_for_day(ranking_day).await.unwrap();
    assert_eq!(stored, entries);

    let last = storage.find_article_summary(ids[1099]).await.unwrap().unwrap();
    assert_eq!(last.daily_rank, Some(1100));
    assert_eq!(last.daily_rank_date, Some(ranking_day));

    // 新快照只剩两篇，其余文章当天的名次标记被清除
    storage
        .replace_daily_ranking(ranking_day, &entries[..2])
        .await
        .unwrap();
    assert_eq!(storage.ranking_for_day(ranking_day).await.unwrap().len(), 2);
    let dropped = storage.find_article_summary(ids[1099]).await.unwrap().unwrap();
    assert_eq!(dropped.daily_rank, None);
    let kept = storage.find_article_summary(ids[1]).await.unwrap().unwrap();
    assert_eq!(kept.daily_rank, Some(2));
}

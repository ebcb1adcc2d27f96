//! Reader feature tests: bookmarks and personalized listing

use std::sync::{Arc, Once};

use chrono::{Duration, Utc};
use jcpe_portal::config::init_config;
use jcpe_portal::errors::PortalError;
use jcpe_portal::services::{
    PersonalizationService, Preference, PreferenceSource, SavedArticleService, encode_token,
};
use jcpe_portal::storage::{ArticleFilter, InsertOutcome, NewArticle, SeaOrmStorage, UserAccount};
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
    let db_path = temp_dir.path().join("reader.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");

    (Arc::new(storage), temp_dir)
}

async fn create_reader(storage: &SeaOrmStorage, email: &str) -> UserAccount {
    storage
        .insert_user("Leitor", email, "not-a-real-hash", false)
        .await
        .expect("Failed to insert user")
}

async fn create_article(
    storage: &SeaOrmStorage,
    slug: &str,
    category_id: Option<i64>,
    tag_ids: Vec<i64>,
    age_minutes: i64,
) -> i64 {
    storage
        .insert_article(&NewArticle {
            title: format!("Notícia {}", slug),
            slug: slug.to_string(),
            summary: None,
            body: "Conteúdo".to_string(),
            image: None,
            category_id,
            author_id: None,
            tag_ids,
            published_at: Utc::now() - Duration::minutes(age_minutes),
        })
        .await
        .expect("Failed to insert article")
}

// =============================================================================
// 收藏
// =============================================================================

#[tokio::test]
async fn test_save_twice_keeps_single_bookmark() {
    let (storage, _dir) = create_temp_storage().await;
    let reader = create_reader(&storage, "leitor@example.com").await;
    let article = create_article(&storage, "salva", None, vec![], 0).await;
    let saved = SavedArticleService::new(storage.clone());

    saved.save(reader.id, article).await.unwrap();
    saved.save(reader.id, article).await.unwrap();

    let items = saved.list(reader.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].article.id, article);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_keep_single_bookmark() {
    let (storage, _dir) = create_temp_storage().await;
    let reader = create_reader(&storage, "leitor@example.com").await;
    let article = create_article(&storage, "concorrente", None, vec![], 0).await;
    let user_id = reader.id;

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let storage = storage.clone();
            tokio::spawn(async move { storage.insert_saved_article(user_id, article).await })
        })
        .collect();

    let mut inserted = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            InsertOutcome::Inserted => inserted += 1,
            InsertOutcome::Duplicate => duplicates += 1,
        }
    }
    assert_eq!((inserted, duplicates), (1, 15));

    let saved = Arc::new(SavedArticleService::new(storage.clone()));
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let saved = saved.clone();
            tokio::spawn(async move { saved.save(user_id, article).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(saved.list(user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_remove_only_affects_that_bookmark() {
    let (storage, _dir) = create_temp_storage().await;
    let alice = create_reader(&storage, "alice@example.com").await;
    let bob = create_reader(&storage, "bob@example.com").await;
    let first = create_article(&storage, "primeira", None, vec![], 10).await;
    let second = create_article(&storage, "segunda", None, vec![], 0).await;
    let saved = SavedArticleService::new(storage.clone());

    saved.save(alice.id, first).await.unwrap();
    saved.save(alice.id, second).await.unwrap();
    saved.save(bob.id, first).await.unwrap();

    assert!(saved.remove(alice.id, first).await.unwrap());
    assert!(!saved.remove(alice.id, first).await.unwrap());

    let alice_items = saved.list(alice.id).await.unwrap();
    assert_eq!(alice_items.len(), 1);
    assert_eq!(alice_items[0].article.id, second);
    assert_eq!(saved.list(bob.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_save_missing_article() {
    let (storage, _dir) = create_temp_storage().await;
    let reader = create_reader(&storage, "leitor@example.com").await;
    let saved = SavedArticleService::new(storage);

    let err = saved.save(reader.id, 4242).await.unwrap_err();
    assert!(matches!(err, PortalError::NotFound(_)));
}

// =============================================================================
// 个性化
// =============================================================================

#[tokio::test]
async fn test_account_preference_wins_over_token() {
    let (storage, _dir) = create_temp_storage().await;
    let esportes = storage.create_category("Esportes", "esportes").await.unwrap();
    let cultura = storage.create_category("Cultura", "cultura").await.unwrap();
    let reader = create_reader(&storage, "leitor@example.com").await;
    let service = PersonalizationService::new(storage.clone());

    service
        .save_for_user(
            reader.id,
            Preference {
                categories: vec!["esportes".into()],
                tags: vec![],
            },
        )
        .await
        .unwrap();

    let token = encode_token(&Preference {
        categories: vec!["cultura".into()],
        tags: vec![],
    });

    let (source, ids) = service.resolve(Some(reader.id), Some(token.as_str())).await.unwrap();
    assert_eq!(source, PreferenceSource::Account);
    assert_eq!(ids.unwrap().category_ids, vec![esportes.id]);

    let (source, ids) = service.resolve(None, Some(token.as_str())).await.unwrap();
    assert_eq!(source, PreferenceSource::Token);
    assert_eq!(ids.unwrap().category_ids, vec![cultura.id]);
}

#[tokio::test]
async fn test_malformed_token_is_ignored() {
    let (storage, _dir) = create_temp_storage().await;
    let service = PersonalizationService::new(storage);

    let (source, ids) = service.resolve(None, Some("%%%not-base64")).await.unwrap();
    assert_eq!(source, PreferenceSource::None);
    assert!(ids.is_none());
}

#[tokio::test]
async fn test_token_with_only_unknown_entries_means_no_preference() {
    let (storage, _dir) = create_temp_storage().await;
    let service = PersonalizationService::new(storage);

    let token = encode_token(&Preference {
        categories: vec!["inexistente".into()],
        tags: vec!["nada".into()],
    });
    let (source, ids) = service.resolve(None, Some(token.as_str())).await.unwrap();
    assert_eq!(source, PreferenceSource::None);
    assert!(ids.is_none());
}

#[tokio::test]
async fn test_save_for_user_rejects_unknown_entries() {
    let (storage, _dir) = create_temp_storage().await;
    storage.create_category("Política", "politica").await.unwrap();
    let reader = create_reader(&storage, "leitor@example.com").await;
    let service = PersonalizationService::new(storage.clone());

    let err = service
        .save_for_user(
            reader.id,
            Preference {
                categories: vec!["politica".into(), "inexistente".into()],
                tags: vec![],
            },
        )
        .await
        .unwrap_err();
    assert!(err.field_errors().unwrap().contains_key("categories"));
    assert!(storage.user_preferences(reader.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_preference_filters_listing_by_category_or_tag() {
    let (storage, _dir) = create_temp_storage().await;
    let esportes = storage.create_category("Esportes", "esportes").await.unwrap();
    let economia = storage.create_category("Economia", "economia").await.unwrap();
    let futebol = storage.create_tag("futebol").await.unwrap();

    let by_category = create_article(&storage, "jogo", Some(esportes.id), vec![], 30).await;
    let by_tag = create_article(&storage, "estadio", Some(economia.id), vec![futebol.id], 20).await;
    create_article(&storage, "inflacao", Some(economia.id), vec![], 10).await;

    let service = PersonalizationService::new(storage.clone());
    let token = encode_token(&Preference {
        categories: vec!["esportes".into()],
        tags: vec!["futebol".into()],
    });
    let (_, ids) = service.resolve(None, Some(token.as_str())).await.unwrap();

    let filter = ArticleFilter {
        preference: ids,
        ..Default::default()
    };
    let page = storage.list_articles(&filter, 1, 10).await.unwrap();
    let ids: Vec<i64> = page.items.iter().map(|a| a.id).collect();

    assert_eq!(page.total, 2);
    // 发布时间倒序
    assert_eq!(ids, vec![by_tag, by_category]);
}

#[tokio::test]
async fn test_for_user_returns_public_identifiers() {
    let (storage, _dir) = create_temp_storage().await;
    storage.create_category("Cultura", "cultura").await.unwrap();
    storage.create_tag("frevo").await.unwrap();
    let reader = create_reader(&storage, "leitor@example.com").await;
    let service = PersonalizationService::new(storage);

    let stored = service
        .save_for_user(
            reader.id,
            Preference {
                categories: vec![" cultura ".into(), "cultura".into()],
                tags: vec!["frevo".into()],
            },
        )
        .await
        .unwrap();
    assert_eq!(stored.categories, vec!["cultura".to_string()]);

    let loaded = service.for_user(reader.id).await.unwrap();
    assert_eq!(loaded, stored);
}

#[tokio::test]
async fn test_listing_page_zero_is_first_page() {
    let (storage, _dir) = create_temp_storage().await;
    let newest = create_article(&storage, "capa", None, vec![], 0).await;
    create_article(&storage, "antiga", None, vec![], 60).await;

    let page = storage
        .list_articles(&ArticleFilter::default(), 0, 10)
        .await
        .unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].id, newest);
}

//! Poll service tests
//!
//! Voting, tallies and poll editing against temporary SQLite databases.

use std::sync::{Arc, Once};

use chrono::Utc;
use jcpe_portal::config::init_config;
use jcpe_portal::errors::PortalError;
use jcpe_portal::services::{PollForm, PollService};
use jcpe_portal::storage::{NewArticle, PollTally, SeaOrmStorage};
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
    let db_path = temp_dir.path().join("polls.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");

    (Arc::new(storage), temp_dir)
}

fn poll_form(options: &[&str]) -> PollForm {
    PollForm {
        title: "Mobilidade".to_string(),
        question: "Como você vai ao trabalho?".to_string(),
        article_id: None,
        options: options.iter().map(|o| o.to_string()).collect(),
    }
}

fn option_id(tally: &PollTally, text: &str) -> i64 {
    tally
        .options
        .iter()
        .find(|o| o.text == text)
        .map(|o| o.id)
        .expect("option should exist")
}

#[tokio::test]
async fn test_new_poll_has_zero_percentages() {
    let (storage, _dir) = create_temp_storage().await;
    let polls = PollService::new(storage);

    let tally = polls.create(poll_form(&["Ônibus", "Bicicleta"])).await.unwrap();
    assert_eq!(tally.total_votes, 0);
    assert_eq!(tally.options.len(), 2);
    assert!(tally.options.iter().all(|o| o.votes == 0 && o.percentage == 0.0));
}

#[tokio::test]
async fn test_vote_percentages_round_to_one_decimal() {
    let (storage, _dir) = create_temp_storage().await;
    let polls = PollService::new(storage);

    let tally = polls.create(poll_form(&["Sim", "Não"])).await.unwrap();
    let yes = option_id(&tally, "Sim");
    let no = option_id(&tally, "Não");

    polls.cast_vote(tally.poll_id, yes, "10.0.0.1").await.unwrap();
    polls.cast_vote(tally.poll_id, yes, "10.0.0.2").await.unwrap();
    let tally = polls.cast_vote(tally.poll_id, no, "10.0.0.3").await.unwrap();

    assert_eq!(tally.total_votes, 3);
    let yes_tally = tally.options.iter().find(|o| o.id == yes).unwrap();
    let no_tally = tally.options.iter().find(|o| o.id == no).unwrap();
    assert_eq!((yes_tally.votes, yes_tally.percentage), (2, 66.7));
    assert_eq!((no_tally.votes, no_tally.percentage), (1, 33.3));
}

#[tokio::test]
async fn test_second_vote_from_same_ip_is_rejected() {
    let (storage, _dir) = create_temp_storage().await;
    let polls = PollService::new(storage);

    let tally = polls.create(poll_form(&["Sim", "Não"])).await.unwrap();
    let yes = option_id(&tally, "Sim");
    let no = option_id(&tally, "Não");

    polls.cast_vote(tally.poll_id, yes, "10.0.0.1").await.unwrap();
    let err = polls
        .cast_vote(tally.poll_id, no, "10.0.0.1")
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::AlreadyVoted(_)));

    let after = polls.tally(tally.poll_id).await.unwrap();
    assert_eq!(after.total_votes, 1);
    assert_eq!(after.options.iter().find(|o| o.id == no).unwrap().votes, 0);
}

#[tokio::test]
async fn test_vote_with_option_from_other_poll() {
    let (storage, _dir) = create_temp_storage().await;
    let polls = PollService::new(storage);

    let first = polls.create(poll_form(&["A", "B"])).await.unwrap();
    let second = polls.create(poll_form(&["C", "D"])).await.unwrap();
    let foreign = option_id(&second, "C");

    let err = polls
        .cast_vote(first.poll_id, foreign, "10.0.0.1")
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::InvalidOption(_)));
    assert_eq!(polls.tally(first.poll_id).await.unwrap().total_votes, 0);
}

#[tokio::test]
async fn test_vote_on_missing_poll() {
    let (storage, _dir) = create_temp_storage().await;
    let polls = PollService::new(storage);

    let err = polls.cast_vote(999, 1, "10.0.0.1").await.unwrap_err();
    assert!(matches!(err, PortalError::NotFound(_)));
}

#[tokio::test]
async fn test_poll_form_requires_two_options() {
    let (storage, _dir) = create_temp_storage().await;
    let polls = PollService::new(storage.clone());

    let err = polls.create(poll_form(&["Só uma", "  "])).await.unwrap_err();
    let fields = err.field_errors().expect("form errors");
    assert!(fields.contains_key("options"));
    assert!(storage.list_polls().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_one_poll_per_article() {
    let (storage, _dir) = create_temp_storage().await;
    let article = storage
        .insert_article(&NewArticle {
            title: "Eleições municipais".to_string(),
            slug: "eleicoes".to_string(),
            summary: None,
            body: "Texto".to_string(),
            image: None,
            category_id: None,
            author_id: None,
            tag_ids: Vec::new(),
            published_at: Utc::now(),
        })
        .await
        .unwrap();
    let polls = PollService::new(storage);

    let mut form = poll_form(&["Sim", "Não"]);
    form.article_id = Some(article);
    polls.create(form.clone()).await.unwrap();

    let err = polls.create(form).await.unwrap_err();
    assert!(err.field_errors().unwrap().contains_key("article_id"));

    let attached = polls.tally_for_article(article).await.unwrap();
    assert!(attached.is_some());
}

#[tokio::test]
async fn test_update_keeps_votes_of_unchanged_options() {
    let (storage, _dir) = create_temp_storage().await;
    let polls = PollService::new(storage);

    let tally = polls.create(poll_form(&["Metrô", "Carro"])).await.unwrap();
    let metro = option_id(&tally, "Metrô");
    polls.cast_vote(tally.poll_id, metro, "10.0.0.1").await.unwrap();

    let updated = polls
        .update(tally.poll_id, poll_form(&["Metrô", "Bicicleta"]))
        .await
        .unwrap();

    assert_eq!(updated.options.len(), 2);
    let kept = updated.options.iter().find(|o| o.text == "Metrô").unwrap();
    assert_eq!(kept.votes, 1);
    assert_eq!(kept.percentage, 100.0);
    assert!(updated.options.iter().all(|o| o.text != "Carro"));
}

#[tokio::test]
async fn test_delete_poll() {
    let (storage, _dir) = create_temp_storage().await;
    let polls = PollService::new(storage);

    let tally = polls.create(poll_form(&["Sim", "Não"])).await.unwrap();
    polls.delete(tally.poll_id).await.unwrap();

    assert!(matches!(
        polls.tally(tally.poll_id).await.unwrap_err(),
        PortalError::NotFound(_)
    ));
    assert!(matches!(
        polls.delete(tally.poll_id).await.unwrap_err(),
        PortalError::NotFound(_)
    ));
}

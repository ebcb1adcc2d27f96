//! Account and editorial service tests

use std::io::Cursor;
use std::sync::{Arc, Once};

use image::{DynamicImage, ImageFormat, RgbImage};
use jcpe_portal::config::{MediaConfig, init_config};
use jcpe_portal::errors::PortalError;
use jcpe_portal::ingest::seed_categories;
use jcpe_portal::services::{
    AccountService, ArticleForm, CategoryForm, EditorialService, FeedbackForm, FeedbackService,
    MediaStore, RegisterForm, TagForm,
};
use jcpe_portal::storage::SeaOrmStorage;
use tempfile::TempDir;

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

struct TestEnv {
    storage: Arc<SeaOrmStorage>,
    media: Arc<MediaStore>,
    _dir: TempDir,
}

async fn create_env() -> TestEnv {
    init_test_config();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("editorial.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");

    let media = MediaStore::new(&MediaConfig {
        root: temp_dir.path().join("media").display().to_string(),
        ..MediaConfig::default()
    });

    TestEnv {
        storage: Arc::new(storage),
        media: Arc::new(media),
        _dir: temp_dir,
    }
}

fn register_form(email: &str, password: &str, confirm: &str) -> RegisterForm {
    RegisterForm {
        name: "Maria Silva".to_string(),
        email: email.to_string(),
        password: password.to_string(),
        password_confirm: confirm.to_string(),
    }
}

fn article_form(title: &str) -> ArticleForm {
    ArticleForm {
        title: title.to_string(),
        summary: Some("Resumo".to_string()),
        body: "Texto completo da notícia.".to_string(),
        category_id: None,
        author_id: None,
        tag_ids: Vec::new(),
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

// =============================================================================
// 账户
// =============================================================================

#[tokio::test]
async fn test_register_and_authenticate() {
    let env = create_env().await;
    let accounts = AccountService::new(env.storage.clone());

    let user = accounts
        .register(register_form(" Maria@Example.com ", "segredo123", "segredo123"))
        .await
        .unwrap();
    assert_eq!(user.email, "maria@example.com");
    assert!(!user.is_staff);

    let logged = accounts
        .authenticate("MARIA@example.com", "segredo123")
        .await
        .unwrap();
    assert_eq!(logged.id, user.id);

    let err = accounts
        .authenticate("maria@example.com", "errada123")
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::Unauthorized(_)));
}

#[tokio::test]
async fn test_register_reports_every_field_error_without_writing() {
    let env = create_env().await;
    let accounts = AccountService::new(env.storage.clone());

    let err = accounts
        .register(register_form("sem-arroba", "curta", "outra"))
        .await
        .unwrap_err();

    let fields = err.field_errors().expect("form errors");
    assert!(fields.contains_key("email"));
    assert!(fields.contains_key("password"));
    assert!(fields.contains_key("password_confirm"));
    assert_eq!(env.storage.count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let env = create_env().await;
    let accounts = AccountService::new(env.storage.clone());

    accounts
        .register(register_form("joao@example.com", "segredo123", "segredo123"))
        .await
        .unwrap();
    let err = accounts
        .register(register_form("JOAO@example.com", "segredo123", "segredo123"))
        .await
        .unwrap_err();

    assert_eq!(
        err.field_errors().unwrap()["email"],
        vec!["E-mail já registrado.".to_string()]
    );
    assert_eq!(env.storage.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_create_staff() {
    let env = create_env().await;
    let accounts = AccountService::new(env.storage.clone());

    let staff = accounts
        .create_staff("Editor", "editor@jcpe.com.br", "segredo123")
        .await
        .unwrap();
    assert!(staff.is_staff);

    let err = accounts
        .create_staff("Outro", "editor@jcpe.com.br", "segredo123")
        .await
        .unwrap_err();
    assert!(err.field_errors().unwrap().contains_key("email"));
}

// =============================================================================
// 编辑
// =============================================================================

#[tokio::test]
async fn test_article_slugs_get_numeric_suffix() {
    let env = create_env().await;
    let editorial = EditorialService::new(env.storage.clone(), env.media.clone());

    let first = editorial
        .create_article(article_form("Chuvas no Grande Recife"))
        .await
        .unwrap();
    let second = editorial
        .create_article(article_form("Chuvas no Grande Recife"))
        .await
        .unwrap();
    let third = editorial
        .create_article(article_form("Chuvas no Grande Recife"))
        .await
        .unwrap();

    assert_eq!(first.slug, "chuvas-no-grande-recife");
    assert_eq!(second.slug, "chuvas-no-grande-recife-2");
    assert_eq!(third.slug, "chuvas-no-grande-recife-3");
}

#[tokio::test]
async fn test_article_form_checks_references() {
    let env = create_env().await;
    let editorial = EditorialService::new(env.storage.clone(), env.media.clone());

    let mut form = article_form("Curta");
    form.category_id = Some(77);
    form.tag_ids = vec![5];

    let err = editorial.create_article(form).await.unwrap_err();
    let fields = err.field_errors().unwrap();
    assert!(fields.contains_key("title"));
    assert!(fields.contains_key("category_id"));
    assert!(fields.contains_key("tag_ids"));
    assert_eq!(env.storage.count_articles().await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_keeps_slug() {
    let env = create_env().await;
    let editorial = EditorialService::new(env.storage.clone(), env.media.clone());

    let created = editorial
        .create_article(article_form("Festival de inverno em Garanhuns"))
        .await
        .unwrap();
    let updated = editorial
        .update_article(created.id, article_form("Festival de inverno começa hoje"))
        .await
        .unwrap();

    assert_eq!(updated.slug, created.slug);
    assert_eq!(updated.title, "Festival de inverno começa hoje");
}

#[tokio::test]
async fn test_category_names_are_unique() {
    let env = create_env().await;
    let editorial = EditorialService::new(env.storage.clone(), env.media.clone());

    let created = editorial
        .create_category(CategoryForm {
            name: "Política".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(created.slug, "politica");

    let err = editorial
        .create_category(CategoryForm {
            name: " Política ".to_string(),
        })
        .await
        .unwrap_err();
    assert!(err.field_errors().unwrap().contains_key("name"));
}

#[tokio::test]
async fn test_seed_categories_is_idempotent() {
    let env = create_env().await;
    let editorial = EditorialService::new(env.storage.clone(), env.media.clone());

    let first = seed_categories(&editorial).await.unwrap();
    assert!(first.created > 0);
    assert_eq!(first.existing, 0);

    let second = seed_categories(&editorial).await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.existing, first.created);
}

#[tokio::test]
async fn test_upload_article_image_replaces_previous_file() {
    let env = create_env().await;
    let editorial = EditorialService::new(env.storage.clone(), env.media.clone());

    let article = editorial
        .create_article(article_form("Obras na avenida Agamenon"))
        .await
        .unwrap();

    let first = editorial
        .upload_article_image(article.id, png_bytes(800, 800))
        .await
        .unwrap();
    let first_path = first.image.clone().expect("image path");
    assert!(first_path.ends_with(".jpg"));
    assert!(env.media.exists(&first_path).await);

    let second = editorial
        .upload_article_image(article.id, png_bytes(640, 480))
        .await
        .unwrap();
    let second_path = second.image.expect("image path");
    assert_ne!(first_path, second_path);
    assert!(env.media.exists(&second_path).await);
    assert!(!env.media.exists(&first_path).await);
}

#[tokio::test]
async fn test_upload_rejects_non_image() {
    let env = create_env().await;
    let editorial = EditorialService::new(env.storage.clone(), env.media.clone());

    let article = editorial
        .create_article(article_form("Obras na avenida Norte"))
        .await
        .unwrap();
    let err = editorial
        .upload_article_image(article.id, b"not an image".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::InvalidImage(_)));
}

#[tokio::test]
async fn test_tags_and_dashboard() {
    let env = create_env().await;
    let editorial = EditorialService::new(env.storage.clone(), env.media.clone());

    editorial
        .create_tag(TagForm {
            name: "frevo".to_string(),
        })
        .await
        .unwrap();
    editorial
        .create_article(article_form("Galo da Madrugada desfila"))
        .await
        .unwrap();

    let feedback = FeedbackService::new(env.storage.clone(), env.media.clone());
    feedback
        .submit(
            FeedbackForm {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                rating: 5,
                comment: Some("Ótimo portal".to_string()),
            },
            None,
        )
        .await
        .unwrap();

    let summary = editorial.dashboard().await.unwrap();
    assert_eq!(summary.articles, 1);
    assert_eq!(summary.tags, 1);
    assert_eq!(summary.feedback_pending, 1);
    assert_eq!(summary.latest.len(), 1);
}

//! Editorial service: content CRUD behind the admin API and the ingest commands
//!
//! Slugs are derived from the title/name with `slug::slugify` and made unique
//! with a numeric suffix (`-2`, `-3`, ...). Article slugs and `published_at`
//! are fixed at creation.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::media::{MediaKind, MediaStore};
use super::{finish_form, form_errors, non_blank, push_error};
use crate::errors::{FieldErrors, PortalError, Result};
use crate::storage::{
    ArticleChanges, ArticleSummary, AuthorInfo, CategoryRef, DashboardSummary, NewArticle,
    SeaOrmStorage, TagRef,
};

/// Dashboard shows this many recent articles
const DASHBOARD_LATEST: u64 = 5;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ArticleForm {
    #[validate(length(
        min = 10,
        max = 200,
        message = "O título deve ter entre 10 e 200 caracteres."
    ))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 300, message = "O resumo deve ter no máximo 300 caracteres."))]
    pub summary: Option<String>,
    #[validate(length(min = 1, message = "O conteúdo não pode ficar vazio."))]
    pub body: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub author_id: Option<i64>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryForm {
    #[validate(length(min = 1, max = 100, message = "O nome deve ter entre 1 e 100 caracteres."))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AuthorForm {
    #[validate(length(min = 1, max = 100, message = "O nome deve ter entre 1 e 100 caracteres."))]
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TagForm {
    #[validate(length(min = 1, max = 50, message = "O nome deve ter entre 1 e 50 caracteres."))]
    pub name: String,
}

/// Which table a slug must be unique in
#[derive(Debug, Clone, Copy)]
enum SlugScope {
    Article,
    Category(Option<i64>),
    Author(Option<i64>),
}

/// `slugify(text)`, or `fallback` when nothing survives
pub fn slug_base(text: &str, fallback: &str) -> String {
    let slug = slug::slugify(text);
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Attempt `n` (1-based) for a slug: `base`, `base-2`, `base-3`...
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}

pub struct EditorialService {
    storage: Arc<SeaOrmStorage>,
    media: Arc<MediaStore>,
}

impl EditorialService {
    pub fn new(storage: Arc<SeaOrmStorage>, media: Arc<MediaStore>) -> Self {
        Self { storage, media }
    }

    async fn slug_taken(&self, scope: SlugScope, slug: &str) -> Result<bool> {
        match scope {
            SlugScope::Article => self.storage.article_slug_taken(slug).await,
            SlugScope::Category(exclude) => self.storage.category_slug_taken(slug, exclude).await,
            SlugScope::Author(exclude) => self.storage.author_slug_taken(slug, exclude).await,
        }
    }

    async fn unique_slug(&self, scope: SlugScope, text: &str, fallback: &str) -> Result<String> {
        let base = slug_base(text, fallback);
        let mut attempt = 1;
        loop {
            let candidate = slug_candidate(&base, attempt);
            if !self.slug_taken(scope, &candidate).await? {
                return Ok(candidate);
            }
            attempt += 1;
        }
    }

    /// Slug a new article with this title would get
    pub async fn unique_article_slug(&self, title: &str) -> Result<String> {
        self.unique_slug(SlugScope::Article, title, "noticia").await
    }

    // ============ Articles ============

    async fn check_article_form(&self, form: &mut ArticleForm) -> Result<()> {
        form.title = form.title.trim().to_string();
        form.summary = non_blank(form.summary.as_deref());
        form.body = form.body.trim().to_string();
        form.tag_ids.sort_unstable();
        form.tag_ids.dedup();

        let mut errors = form_errors(&*form);
        self.check_references(form, &mut errors).await?;
        finish_form(errors)
    }

    async fn check_references(&self, form: &ArticleForm, errors: &mut FieldErrors) -> Result<()> {
        if let Some(id) = form.category_id
            && self.storage.find_category(id).await?.is_none()
        {
            push_error(errors, "category_id", "Categoria não encontrada.");
        }
        if let Some(id) = form.author_id
            && self.storage.find_author(id).await?.is_none()
        {
            push_error(errors, "author_id", "Autor não encontrado.");
        }
        let existing = self.storage.existing_tag_ids(&form.tag_ids).await?;
        if existing.len() != form.tag_ids.len() {
            push_error(errors, "tag_ids", "Tag desconhecida.");
        }
        Ok(())
    }

    async fn load_article(&self, id: i64) -> Result<ArticleSummary> {
        self.storage
            .find_article_summary(id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Notícia {} não encontrada", id)))
    }

    pub async fn create_article(&self, mut form: ArticleForm) -> Result<ArticleSummary> {
        self.check_article_form(&mut form).await?;

        let slug = self.unique_article_slug(&form.title).await?;
        let id = self
            .storage
            .insert_article(&NewArticle {
                title: form.title,
                slug,
                summary: form.summary,
                body: form.body,
                image: None,
                category_id: form.category_id,
                author_id: form.author_id,
                tag_ids: form.tag_ids,
                published_at: Utc::now(),
            })
            .await?;

        info!("EditorialService: article {} created", id);
        self.load_article(id).await
    }

    pub async fn update_article(&self, id: i64, mut form: ArticleForm) -> Result<ArticleSummary> {
        self.load_article(id).await?;
        self.check_article_form(&mut form).await?;

        self.storage
            .update_article(
                id,
                &ArticleChanges {
                    title: form.title,
                    summary: form.summary,
                    body: form.body,
                    category_id: form.category_id,
                    author_id: form.author_id,
                    tag_ids: form.tag_ids,
                },
            )
            .await?;

        info!("EditorialService: article {} updated", id);
        self.load_article(id).await
    }

    /// Delete an article and its image file
    pub async fn delete_article(&self, id: i64) -> Result<()> {
        let article = self.load_article(id).await?;
        self.storage.delete_article(id).await?;
        if let Some(ref image) = article.image {
            self.media.remove(image).await;
        }
        Ok(())
    }

    /// Normalize and attach an article image, replacing the previous file
    pub async fn upload_article_image(&self, id: i64, bytes: Vec<u8>) -> Result<ArticleSummary> {
        let article = self.load_article(id).await?;
        let path = self.media.save(MediaKind::Article, bytes).await?;

        if let Err(e) = self.storage.set_article_image(id, Some(path.clone())).await {
            self.media.remove(&path).await;
            return Err(e);
        }
        if let Some(ref old) = article.image {
            self.media.remove(old).await;
        }
        self.load_article(id).await
    }

    // ============ Categories ============

    pub async fn list_categories(&self) -> Result<Vec<CategoryRef>> {
        self.storage.list_categories().await
    }

    async fn check_category_form(&self, form: &mut CategoryForm, id: Option<i64>) -> Result<()> {
        form.name = form.name.trim().to_string();
        let mut errors = form_errors(&*form);
        if !errors.contains_key("name")
            && let Some(existing) = self.storage.find_category_by_name(&form.name).await?
            && Some(existing.id) != id
        {
            push_error(&mut errors, "name", "Já existe uma categoria com este nome.");
        }
        finish_form(errors)
    }

    pub async fn create_category(&self, mut form: CategoryForm) -> Result<CategoryRef> {
        self.check_category_form(&mut form, None).await?;
        let slug = self
            .unique_slug(SlugScope::Category(None), &form.name, "categoria")
            .await?;
        self.storage.create_category(&form.name, &slug).await
    }

    pub async fn update_category(&self, id: i64, mut form: CategoryForm) -> Result<CategoryRef> {
        if self.storage.find_category(id).await?.is_none() {
            return Err(PortalError::not_found(format!("Categoria {} não encontrada", id)));
        }
        self.check_category_form(&mut form, Some(id)).await?;
        let slug = self
            .unique_slug(SlugScope::Category(Some(id)), &form.name, "categoria")
            .await?;
        self.storage.update_category(id, &form.name, &slug).await
    }

    pub async fn delete_category(&self, id: i64) -> Result<()> {
        if !self.storage.delete_category(id).await? {
            return Err(PortalError::not_found(format!("Categoria {} não encontrada", id)));
        }
        info!("EditorialService: category {} deleted", id);
        Ok(())
    }

    /// Existing category with this exact name, or a new one
    pub async fn get_or_create_category(&self, name: &str) -> Result<(CategoryRef, bool)> {
        let name = name.trim();
        if let Some(existing) = self.storage.find_category_by_name(name).await? {
            return Ok((existing, false));
        }
        let created = self
            .create_category(CategoryForm {
                name: name.to_string(),
            })
            .await?;
        Ok((created, true))
    }

    // ============ Authors ============

    pub async fn list_authors(&self) -> Result<Vec<AuthorInfo>> {
        self.storage.list_authors().await
    }

    pub async fn create_author(&self, mut form: AuthorForm) -> Result<AuthorInfo> {
        form.name = form.name.trim().to_string();
        finish_form(form_errors(&form))?;
        let slug = self
            .unique_slug(SlugScope::Author(None), &form.name, "autor")
            .await?;
        self.storage
            .create_author(&form.name, &slug, non_blank(form.bio.as_deref()))
            .await
    }

    pub async fn update_author(&self, id: i64, mut form: AuthorForm) -> Result<AuthorInfo> {
        if self.storage.find_author(id).await?.is_none() {
            return Err(PortalError::not_found(format!("Autor {} não encontrado", id)));
        }
        form.name = form.name.trim().to_string();
        finish_form(form_errors(&form))?;
        let slug = self
            .unique_slug(SlugScope::Author(Some(id)), &form.name, "autor")
            .await?;
        self.storage
            .update_author(id, &form.name, &slug, non_blank(form.bio.as_deref()))
            .await
    }

    pub async fn delete_author(&self, id: i64) -> Result<()> {
        let author = self
            .storage
            .find_author(id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Autor {} não encontrado", id)))?;
        self.storage.delete_author(id).await?;
        if let Some(ref photo) = author.photo {
            self.media.remove(photo).await;
        }
        Ok(())
    }

    pub async fn upload_author_photo(&self, id: i64, bytes: Vec<u8>) -> Result<AuthorInfo> {
        let author = self
            .storage
            .find_author(id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Autor {} não encontrado", id)))?;

        let path = self.media.save(MediaKind::AuthorPhoto, bytes).await?;
        if let Err(e) = self.storage.set_author_photo(id, Some(path.clone())).await {
            self.media.remove(&path).await;
            return Err(e);
        }
        if let Some(ref old) = author.photo {
            self.media.remove(old).await;
        }

        self.storage
            .find_author(id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Autor {} não encontrado", id)))
    }

    /// First author with this name, or a new one (ingest attribution)
    pub async fn get_or_create_author(&self, name: &str) -> Result<AuthorInfo> {
        if let Some(existing) = self.storage.find_author_by_name(name.trim()).await? {
            return Ok(existing);
        }
        self.create_author(AuthorForm {
            name: name.to_string(),
            bio: None,
        })
        .await
    }

    // ============ Tags ============

    pub async fn list_tags(&self) -> Result<Vec<TagRef>> {
        self.storage.list_tags().await
    }

    pub async fn create_tag(&self, mut form: TagForm) -> Result<TagRef> {
        form.name = form.name.trim().to_string();
        let mut errors = form_errors(&form);
        if !errors.contains_key("name") && self.storage.find_tag_by_name(&form.name).await?.is_some()
        {
            push_error(&mut errors, "name", "Já existe uma tag com este nome.");
        }
        finish_form(errors)?;
        self.storage.create_tag(&form.name).await
    }

    pub async fn delete_tag(&self, id: i64) -> Result<()> {
        if !self.storage.delete_tag(id).await? {
            return Err(PortalError::not_found(format!("Tag {} não encontrada", id)));
        }
        Ok(())
    }

    // ============ Dashboard ============

    pub async fn dashboard(&self) -> Result<DashboardSummary> {
        Ok(DashboardSummary {
            articles: self.storage.count_articles().await?,
            categories: self.storage.count_categories().await?,
            authors: self.storage.count_authors().await?,
            tags: self.storage.count_tags().await?,
            feedback_pending: self.storage.count_pending_feedback().await?,
            latest: self.storage.latest_articles(DASHBOARD_LATEST).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_base() {
        assert_eq!(
            slug_base("Política: eleições em Pernambuco", "noticia"),
            "politica-eleicoes-em-pernambuco"
        );
        assert_eq!(slug_base("!!!", "noticia"), "noticia");
    }

    #[test]
    fn test_slug_candidate_suffixes() {
        assert_eq!(slug_candidate("recife", 1), "recife");
        assert_eq!(slug_candidate("recife", 2), "recife-2");
        assert_eq!(slug_candidate("recife", 3), "recife-3");
    }

    #[test]
    fn test_article_form_rules() {
        let form = ArticleForm {
            title: "Curto".into(),
            summary: Some("x".repeat(301)),
            body: String::new(),
            category_id: None,
            author_id: None,
            tag_ids: vec![],
        };
        let errors = form_errors(&form);
        assert!(errors.contains_key("title"));
        assert!(errors.contains_key("summary"));
        assert!(errors.contains_key("body"));
    }
}

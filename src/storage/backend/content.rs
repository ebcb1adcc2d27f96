//! 内容表的读写：文章、分类、作者、标签
//!
//! 文章与分类/作者/标签之间是显式外键和关联表，
//! 列表查询统一先取文章行，再批量补齐分类与作者。

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, ExprTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::{Expr, Func},
};
use tracing::{debug, info};

use super::SeaOrmStorage;
use crate::errors::{PortalError, Result};
use crate::storage::models::{
    ArticleBodyRow, ArticleChanges, ArticleDetail, ArticleFilter, ArticleSummary, AuthorInfo,
    CategoryRef, NewArticle, Page, TagRef,
};

use migration::entities::{article, article_tag, author, category, tag};

fn category_ref(model: category::Model) -> CategoryRef {
    CategoryRef {
        id: model.id,
        name: model.name,
        slug: model.slug,
    }
}

fn author_info(model: author::Model) -> AuthorInfo {
    AuthorInfo {
        id: model.id,
        name: model.name,
        slug: model.slug,
        bio: model.bio,
        photo: model.photo,
    }
}

fn tag_ref(model: tag::Model) -> TagRef {
    TagRef {
        id: model.id,
        name: model.name,
    }
}

/// 用于 COUNT 缓存的过滤条件 key
fn filter_cache_key(filter: &ArticleFilter) -> String {
    let pref = filter
        .preference
        .as_ref()
        .map(|p| format!("{:?}|{:?}", p.category_ids, p.tag_ids));
    format!(
        "articles:c={:?}:a={:?}:t={:?}:q={:?}:p={:?}",
        filter.category, filter.author, filter.tag, filter.search, pref
    )
}

impl SeaOrmStorage {
    // ============ 分类 ============

    pub async fn list_categories(&self) -> Result<Vec<CategoryRef>> {
        let rows = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(category_ref).collect())
    }

    pub async fn find_category(&self, id: i64) -> Result<Option<CategoryRef>> {
        let row = category::Entity::find_by_id(id).one(&self.db).await?;
        Ok(row.map(category_ref))
    }

    pub async fn find_category_by_slug(&self, slug: &str) -> Result<Option<CategoryRef>> {
        let row = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await?;
        Ok(row.map(category_ref))
    }

    pub async fn find_category_by_name(&self, name: &str) -> Result<Option<CategoryRef>> {
        let row = category::Entity::find()
            .filter(category::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        Ok(row.map(category_ref))
    }

    pub async fn find_categories_by_slugs(&self, slugs: &[String]) -> Result<Vec<CategoryRef>> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }
        let rows = category::Entity::find()
            .filter(category::Column::Slug.is_in(slugs.iter().cloned()))
            .order_by_asc(category::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(category_ref).collect())
    }

    pub async fn category_slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let mut query = category::Entity::find().filter(category::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            query = query.filter(category::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    pub async fn create_category(&self, name: &str, slug: &str) -> Result<CategoryRef> {
        let model = category::ActiveModel {
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!("Category created: {} ({})", model.name, model.slug);
        Ok(category_ref(model))
    }

    pub async fn update_category(&self, id: i64, name: &str, slug: &str) -> Result<CategoryRef> {
        let existing = category::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Categoria {} não encontrada", id)))?;

        let mut active = existing.into_active_model();
        active.name = Set(name.to_string());
        active.slug = Set(slug.to_string());
        let model = active.update(&self.db).await?;

        self.invalidate_count_cache();
        Ok(category_ref(model))
    }

    /// 删除分类，文章的 category_id 由外键置空
    pub async fn delete_category(&self, id: i64) -> Result<bool> {
        let result = category::Entity::delete_by_id(id).exec(&self.db).await?;
        self.invalidate_count_cache();
        Ok(result.rows_affected > 0)
    }

    pub async fn count_categories(&self) -> Result<u64> {
        Ok(category::Entity::find().count(&self.db).await?)
    }

    // ============ 作者 ============

    pub async fn list_authors(&self) -> Result<Vec<AuthorInfo>> {
        let rows = author::Entity::find()
            .order_by_asc(author::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(author_info).collect())
    }

    pub async fn find_author(&self, id: i64) -> Result<Option<AuthorInfo>> {
        let row = author::Entity::find_by_id(id).one(&self.db).await?;
        Ok(row.map(author_info))
    }

    pub async fn find_author_by_slug(&self, slug: &str) -> Result<Option<AuthorInfo>> {
        let row = author::Entity::find()
            .filter(author::Column::Slug.eq(slug))
            .one(&self.db)
            .await?;
        Ok(row.map(author_info))
    }

    pub async fn find_author_by_name(&self, name: &str) -> Result<Option<AuthorInfo>> {
        let row = author::Entity::find()
            .filter(author::Column::Name.eq(name))
            .order_by_asc(author::Column::Id)
            .one(&self.db)
            .await?;
        Ok(row.map(author_info))
    }

    pub async fn author_slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let mut query = author::Entity::find().filter(author::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            query = query.filter(author::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    pub async fn create_author(
        &self,
        name: &str,
        slug: &str,
        bio: Option<String>,
    ) -> Result<AuthorInfo> {
        let model = author::ActiveModel {
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            bio: Set(bio),
            photo: Set(None),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!("Author created: {} ({})", model.name, model.slug);
        Ok(author_info(model))
    }

    pub async fn update_author(
        &self,
        id: i64,
        name: &str,
        slug: &str,
        bio: Option<String>,
    ) -> Result<AuthorInfo> {
        let existing = author::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Autor {} não encontrado", id)))?;

        let mut active = existing.into_active_model();
        active.name = Set(name.to_string());
        active.slug = Set(slug.to_string());
        active.bio = Set(bio);
        let model = active.update(&self.db).await?;

        self.invalidate_count_cache();
        Ok(author_info(model))
    }

    pub async fn set_author_photo(&self, id: i64, photo: Option<String>) -> Result<()> {
        let result = author::Entity::update_many()
            .col_expr(author::Column::Photo, Expr::value(photo))
            .filter(author::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(PortalError::not_found(format!("Autor {} não encontrado", id)));
        }
        Ok(())
    }

    pub async fn delete_author(&self, id: i64) -> Result<bool> {
        let result = author::Entity::delete_by_id(id).exec(&self.db).await?;
        self.invalidate_count_cache();
        Ok(result.rows_affected > 0)
    }

    pub async fn count_authors(&self) -> Result<u64> {
        Ok(author::Entity::find().count(&self.db).await?)
    }

    // ============ 标签 ============

    pub async fn list_tags(&self) -> Result<Vec<TagRef>> {
        let rows = tag::Entity::find()
            .order_by_asc(tag::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(tag_ref).collect())
    }

    pub async fn find_tag_by_name(&self, name: &str) -> Result<Option<TagRef>> {
        let row = tag::Entity::find()
            .filter(tag::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        Ok(row.map(tag_ref))
    }

    pub async fn find_tags_by_names(&self, names: &[String]) -> Result<Vec<TagRef>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let rows = tag::Entity::find()
            .filter(tag::Column::Name.is_in(names.iter().cloned()))
            .order_by_asc(tag::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(tag_ref).collect())
    }

    /// 返回给定 ID 中实际存在的标签 ID
    pub async fn existing_tag_ids(&self, ids: &[i64]) -> Result<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = tag::Entity::find()
            .select_only()
            .column(tag::Column::Id)
            .filter(tag::Column::Id.is_in(ids.iter().copied()))
            .into_tuple::<i64>()
            .all(&self.db)
            .await?;
        Ok(found)
    }

    pub async fn create_tag(&self, name: &str) -> Result<TagRef> {
        let model = tag::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(tag_ref(model))
    }

    pub async fn delete_tag(&self, id: i64) -> Result<bool> {
        let result = tag::Entity::delete_by_id(id).exec(&self.db).await?;
        self.invalidate_count_cache();
        Ok(result.rows_affected > 0)
    }

    pub async fn count_tags(&self) -> Result<u64> {
        Ok(tag::Entity::find().count(&self.db).await?)
    }

    pub async fn tags_for_article(&self, article_id: i64) -> Result<Vec<TagRef>> {
        let tag_ids = article_tag::Entity::find()
            .select_only()
            .column(article_tag::Column::TagId)
            .filter(article_tag::Column::ArticleId.eq(article_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await?;
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = tag::Entity::find()
            .filter(tag::Column::Id.is_in(tag_ids))
            .order_by_asc(tag::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(tag_ref).collect())
    }

    /// 带有任一给定标签的文章 ID（去重）
    pub async fn article_ids_with_tags(&self, tag_ids: &[i64]) -> Result<Vec<i64>> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = article_tag::Entity::find()
            .select_only()
            .column(article_tag::Column::ArticleId)
            .filter(article_tag::Column::TagId.is_in(tag_ids.iter().copied()))
            .distinct()
            .into_tuple::<i64>()
            .all(&self.db)
            .await?;
        Ok(ids)
    }

    // ============ 文章 ============

    pub async fn article_slug_taken(&self, slug: &str) -> Result<bool> {
        let count = article::Entity::find()
            .filter(article::Column::Slug.eq(slug))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn article_title_exists(&self, title: &str) -> Result<bool> {
        let count = article::Entity::find()
            .filter(article::Column::Title.eq(title))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn article_exists(&self, id: i64) -> Result<bool> {
        let count = article::Entity::find()
            .filter(article::Column::Id.eq(id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// 插入文章及其标签关联，返回新文章 ID
    pub async fn insert_article(&self, new: &NewArticle) -> Result<i64> {
        let db = &self.db;

        let id = self.retry.run(
            &format!("insert_article({})", new.slug),
            || async {
                let txn = db.begin().await?;

                let model = article::ActiveModel {
                    title: Set(new.title.clone()),
                    slug: Set(new.slug.clone()),
                    summary: Set(new.summary.clone()),
                    body: Set(new.body.clone()),
                    image: Set(new.image.clone()),
                    category_id: Set(new.category_id),
                    author_id: Set(new.author_id),
                    published_at: Set(new.published_at),
                    daily_rank: Set(None),
                    daily_rank_date: Set(None),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;

                if !new.tag_ids.is_empty() {
                    let links = new.tag_ids.iter().map(|tag_id| article_tag::ActiveModel {
                        article_id: Set(model.id),
                        tag_id: Set(*tag_id),
                        ..Default::default()
                    });
                    article_tag::Entity::insert_many(links)
                        .exec_without_returning(&txn)
                        .await?;
                }

                txn.commit().await?;
                Ok(model.id)
            },
        )
        .await?;

        self.invalidate_count_cache();
        info!("Article created: {} (id={})", new.slug, id);
        Ok(id)
    }

    /// 更新可编辑字段并替换标签集合；slug 与发布时间保持不变
    pub async fn update_article(&self, id: i64, changes: &ArticleChanges) -> Result<()> {
        let db = &self.db;

        let updated = self.retry.run(
            &format!("update_article({})", id),
            || async {
                let txn = db.begin().await?;

                let Some(existing) = article::Entity::find_by_id(id).one(&txn).await? else {
                    txn.rollback().await?;
                    return Ok(false);
                };

                let mut active = existing.into_active_model();
                active.title = Set(changes.title.clone());
                active.summary = Set(changes.summary.clone());
                active.body = Set(changes.body.clone());
                active.category_id = Set(changes.category_id);
                active.author_id = Set(changes.author_id);
                active.update(&txn).await?;

                article_tag::Entity::delete_many()
                    .filter(article_tag::Column::ArticleId.eq(id))
                    .exec(&txn)
                    .await?;
                if !changes.tag_ids.is_empty() {
                    let links = changes.tag_ids.iter().map(|tag_id| article_tag::ActiveModel {
                        article_id: Set(id),
                        tag_id: Set(*tag_id),
                        ..Default::default()
                    });
                    article_tag::Entity::insert_many(links)
                        .exec_without_returning(&txn)
                        .await?;
                }

                txn.commit().await?;
                Ok(true)
            },
        )
        .await?;

        if !updated {
            return Err(PortalError::not_found(format!("Notícia {} não encontrada", id)));
        }
        self.invalidate_count_cache();
        Ok(())
    }

    pub async fn set_article_image(&self, id: i64, image: Option<String>) -> Result<()> {
        let result = article::Entity::update_many()
            .col_expr(article::Column::Image, Expr::value(image))
            .filter(article::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(PortalError::not_found(format!("Notícia {} não encontrada", id)));
        }
        Ok(())
    }

    pub async fn update_article_body(&self, id: i64, body: &str) -> Result<()> {
        article::Entity::update_many()
            .col_expr(article::Column::Body, Expr::value(body.to_string()))
            .filter(article::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// 删除文章（标签关联、访问记录随外键级联）
    pub async fn delete_article(&self, id: i64) -> Result<bool> {
        let db = &self.db;
        let result = self.retry.run(
            &format!("delete_article({})", id),
            || async { article::Entity::delete_by_id(id).exec(db).await },
        )
        .await?;

        self.invalidate_count_cache();
        if result.rows_affected > 0 {
            info!("Article deleted: id={}", id);
        }
        Ok(result.rows_affected > 0)
    }

    pub async fn count_articles(&self) -> Result<u64> {
        Ok(article::Entity::find().count(&self.db).await?)
    }

    /// 为文章行批量补齐分类与作者
    async fn hydrate(&self, models: Vec<article::Model>) -> Result<Vec<ArticleSummary>> {
        let category_ids: HashSet<i64> = models.iter().filter_map(|m| m.category_id).collect();
        let author_ids: HashSet<i64> = models.iter().filter_map(|m| m.author_id).collect();

        let categories: HashMap<i64, CategoryRef> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            category::Entity::find()
                .filter(category::Column::Id.is_in(category_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|c| (c.id, category_ref(c)))
                .collect()
        };

        let authors: HashMap<i64, AuthorInfo> = if author_ids.is_empty() {
            HashMap::new()
        } else {
            author::Entity::find()
                .filter(author::Column::Id.is_in(author_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|a| (a.id, author_info(a)))
                .collect()
        };

        Ok(models
            .into_iter()
            .map(|m| ArticleSummary {
                category: m.category_id.and_then(|id| categories.get(&id).cloned()),
                author: m.author_id.and_then(|id| authors.get(&id).cloned()),
                id: m.id,
                title: m.title,
                slug: m.slug,
                summary: m.summary,
                image: m.image,
                published_at: m.published_at,
                daily_rank: m.daily_rank,
                daily_rank_date: m.daily_rank_date,
            })
            .collect())
    }

    pub async fn find_article_summary(&self, id: i64) -> Result<Option<ArticleSummary>> {
        let Some(model) = article::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![model]).await?.pop())
    }

    /// 按 slug 读取文章详情（poll 由上层补齐）
    pub async fn find_article_by_slug(&self, slug: &str) -> Result<Option<ArticleDetail>> {
        let Some(model) = article::Entity::find()
            .filter(article::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let body = model.body.clone();
        let tags = self.tags_for_article(model.id).await?;
        let Some(summary) = self.hydrate(vec![model]).await?.pop() else {
            return Ok(None);
        };

        Ok(Some(ArticleDetail {
            article: summary,
            body,
            tags,
            poll: None,
        }))
    }

    pub async fn summaries_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, ArticleSummary>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let models = article::Entity::find()
            .filter(article::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await?;
        Ok(self
            .hydrate(models)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect())
    }

    pub async fn latest_articles(&self, limit: u64) -> Result<Vec<ArticleSummary>> {
        let models = article::Entity::find()
            .order_by_desc(article::Column::PublishedAt)
            .order_by_desc(article::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;
        self.hydrate(models).await
    }

    /// 维护命令使用：最新优先的文章正文，`limit` 为空时返回全部
    pub async fn article_bodies(&self, limit: Option<u64>) -> Result<Vec<ArticleBodyRow>> {
        let mut query = article::Entity::find()
            .order_by_desc(article::Column::PublishedAt)
            .order_by_desc(article::Column::Id);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        let rows = query.all(&self.db).await?;
        Ok(rows
            .into_iter()
            .map(|m| ArticleBodyRow {
                id: m.id,
                title: m.title,
                body: m.body,
                image: m.image,
            })
            .collect())
    }

    /// 按过滤条件分页列出文章（发布时间倒序）
    pub async fn list_articles(
        &self,
        filter: &ArticleFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Page<ArticleSummary>> {
        let page = Ord::max(page, 1);
        let mut condition = Condition::all();

        if let Some(ref slug) = filter.category {
            match self.find_category_by_slug(slug).await? {
                Some(c) => condition = condition.add(article::Column::CategoryId.eq(c.id)),
                None => return Ok(Page::empty(page, page_size)),
            }
        }

        if let Some(ref slug) = filter.author {
            match self.find_author_by_slug(slug).await? {
                Some(a) => condition = condition.add(article::Column::AuthorId.eq(a.id)),
                None => return Ok(Page::empty(page, page_size)),
            }
        }

        if let Some(ref name) = filter.tag {
            let Some(tag) = self.find_tag_by_name(name).await? else {
                return Ok(Page::empty(page, page_size));
            };
            let ids = self.article_ids_with_tags(&[tag.id]).await?;
            if ids.is_empty() {
                return Ok(Page::empty(page, page_size));
            }
            condition = condition.add(article::Column::Id.is_in(ids));
        }

        if let Some(ref search) = filter.search {
            let pattern = format!("%{}%", search.to_lowercase());
            let lower = |col: article::Column| Expr::expr(Func::lower(Expr::col(col)));
            condition = condition.add(
                Condition::any()
                    .add(lower(article::Column::Title).like(pattern.clone()))
                    .add(lower(article::Column::Summary).like(pattern.clone()))
                    .add(lower(article::Column::Body).like(pattern)),
            );
        }

        // 个性化：分类命中 或 任一标签命中
        if let Some(ref pref) = filter.preference
            && !pref.is_empty()
        {
            let tagged = self.article_ids_with_tags(&pref.tag_ids).await?;
            if pref.category_ids.is_empty() && tagged.is_empty() {
                return Ok(Page::empty(page, page_size));
            }
            let mut any = Condition::any();
            if !pref.category_ids.is_empty() {
                any = any.add(article::Column::CategoryId.is_in(pref.category_ids.clone()));
            }
            if !tagged.is_empty() {
                any = any.add(article::Column::Id.is_in(tagged));
            }
            condition = condition.add(any);
        }

        let query = article::Entity::find()
            .filter(condition)
            .order_by_desc(article::Column::PublishedAt)
            .order_by_desc(article::Column::Id);

        let cache_key = filter_cache_key(filter);
        let paginator = query.paginate(&self.db, page_size);
        let total = match self.count_cache.get(&cache_key) {
            Some(cached) => cached,
            None => {
                let total = paginator.num_items().await?;
                self.count_cache.insert(cache_key, total);
                total
            }
        };

        let models = paginator.fetch_page(page - 1).await?;
        debug!(
            "list_articles page={} size={} total={} returned={}",
            page,
            page_size,
            total,
            models.len()
        );

        let items = self.hydrate(models).await?;
        Ok(Page::new(items, page, page_size, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::PreferenceIds;

    #[test]
    fn test_filter_cache_key_distinguishes_preferences() {
        let plain = ArticleFilter::default();
        let personalized = ArticleFilter {
            preference: Some(PreferenceIds {
                category_ids: vec![1],
                tag_ids: vec![],
            }),
            ..Default::default()
        };
        assert_ne!(filter_cache_key(&plain), filter_cache_key(&personalized));
    }
}

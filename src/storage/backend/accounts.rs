//! 读者账户、收藏与偏好

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait, sea_query::OnConflict,
};
use tracing::info;

use super::SeaOrmStorage;
use super::retry::InsertOutcome;
use crate::errors::Result;
use crate::storage::models::{PreferenceIds, SavedItem, UserAccount};

use migration::entities::{category_preference, saved_article, tag_preference, user};

/// 含密码哈希的用户记录，只在认证流程内部使用
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub account: UserAccount,
    pub password_hash: String,
}

fn user_account(model: &user::Model) -> UserAccount {
    UserAccount {
        id: model.id,
        name: model.name.clone(),
        email: model.email.clone(),
        is_staff: model.is_staff,
        created_at: model.created_at,
    }
}

impl SeaOrmStorage {
    // ============ 用户 ============

    pub async fn email_registered(&self, email: &str) -> Result<bool> {
        let count = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn insert_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        is_staff: bool,
    ) -> Result<UserAccount> {
        let model = user::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            is_staff: Set(is_staff),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!("User created: id={} staff={}", model.id, model.is_staff);
        Ok(user_account(&model))
    }

    pub async fn find_user(&self, id: i64) -> Result<Option<UserAccount>> {
        let row = user::Entity::find_by_id(id).one(&self.db).await?;
        Ok(row.as_ref().map(user_account))
    }

    pub async fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        let row = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(row.map(|m| UserCredentials {
            account: user_account(&m),
            password_hash: m.password_hash,
        }))
    }

    pub async fn count_users(&self) -> Result<u64> {
        Ok(user::Entity::find().count(&self.db).await?)
    }

    // ============ 收藏 ============

    /// 收藏文章；已收藏时返回 Duplicate
    pub async fn insert_saved_article(&self, user_id: i64, article_id: i64) -> Result<InsertOutcome> {
        let db = &self.db;
        let label = format!("insert_saved_article({}, {})", user_id, article_id);
        self.retry
            .insert_once(&label, || async {
                let model = saved_article::ActiveModel {
                    user_id: Set(user_id),
                    article_id: Set(article_id),
                    saved_at: Set(Utc::now()),
                    ..Default::default()
                };
                saved_article::Entity::insert(model)
                    .on_conflict(
                        OnConflict::columns([
                            saved_article::Column::UserId,
                            saved_article::Column::ArticleId,
                        ])
                        .do_nothing()
                        .to_owned(),
                    )
                    .exec_without_returning(db)
                    .await
            })
            .await
    }

    pub async fn delete_saved_article(&self, user_id: i64, article_id: i64) -> Result<bool> {
        let result = saved_article::Entity::delete_many()
            .filter(saved_article::Column::UserId.eq(user_id))
            .filter(saved_article::Column::ArticleId.eq(article_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// 收藏列表，最近收藏在前
    pub async fn saved_articles(&self, user_id: i64) -> Result<Vec<SavedItem>> {
        let rows = saved_article::Entity::find()
            .filter(saved_article::Column::UserId.eq(user_id))
            .order_by_desc(saved_article::Column::SavedAt)
            .order_by_desc(saved_article::Column::Id)
            .all(&self.db)
            .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.article_id).collect();
        let mut summaries = self.summaries_by_ids(&ids).await?;

        Ok(rows
            .into_iter()
            .filter_map(|r| {
                summaries.remove(&r.article_id).map(|article| SavedItem {
                    saved_at: r.saved_at,
                    article,
                })
            })
            .collect())
    }

    // ============ 偏好 ============

    pub async fn user_preferences(&self, user_id: i64) -> Result<PreferenceIds> {
        let category_ids = category_preference::Entity::find()
            .select_only()
            .column(category_preference::Column::CategoryId)
            .filter(category_preference::Column::UserId.eq(user_id))
            .order_by_asc(category_preference::Column::CategoryId)
            .into_tuple::<i64>()
            .all(&self.db)
            .await?;

        let tag_ids = tag_preference::Entity::find()
            .select_only()
            .column(tag_preference::Column::TagId)
            .filter(tag_preference::Column::UserId.eq(user_id))
            .order_by_asc(tag_preference::Column::TagId)
            .into_tuple::<i64>()
            .all(&self.db)
            .await?;

        Ok(PreferenceIds {
            category_ids,
            tag_ids,
        })
    }

    /// 整体替换用户偏好
    pub async fn replace_user_preferences(&self, user_id: i64, prefs: &PreferenceIds) -> Result<()> {
        let db = &self.db;

        self.retry.run(
            &format!("replace_user_preferences({})", user_id),
            || async {
                let txn = db.begin().await?;

                category_preference::Entity::delete_many()
                    .filter(category_preference::Column::UserId.eq(user_id))
                    .exec(&txn)
                    .await?;
                tag_preference::Entity::delete_many()
                    .filter(tag_preference::Column::UserId.eq(user_id))
                    .exec(&txn)
                    .await?;

                if !prefs.category_ids.is_empty() {
                    let rows = prefs.category_ids.iter().map(|id| category_preference::ActiveModel {
                        user_id: Set(user_id),
                        category_id: Set(*id),
                        ..Default::default()
                    });
                    category_preference::Entity::insert_many(rows)
                        .exec_without_returning(&txn)
                        .await?;
                }

                if !prefs.tag_ids.is_empty() {
                    let rows = prefs.tag_ids.iter().map(|id| tag_preference::ActiveModel {
                        user_id: Set(user_id),
                        tag_id: Set(*id),
                        ..Default::default()
                    });
                    tag_preference::Entity::insert_many(rows)
                        .exec_without_returning(&txn)
                        .await?;
                }

                txn.commit().await
            },
        )
        .await?;

        Ok(())
    }
}

//! 投票、选项与投票记录
//!
//! votes 表不带唯一约束，“每个 IP 每个投票只能投一次”由服务层先查后写保证。

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, FromQueryResult,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::info;

use super::SeaOrmStorage;
use crate::errors::Result;

use migration::entities::{poll, poll_option, vote};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptionRecord {
    pub id: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRecord {
    pub id: i64,
    pub title: String,
    pub question: String,
    pub article_id: Option<i64>,
    pub options: Vec<PollOptionRecord>,
}

#[derive(Debug, FromQueryResult)]
struct OptionVotesRow {
    option_id: i64,
    votes: i64,
}

impl SeaOrmStorage {
    async fn load_options(&self, poll_id: i64) -> Result<Vec<PollOptionRecord>> {
        let rows = poll_option::Entity::find()
            .filter(poll_option::Column::PollId.eq(poll_id))
            .order_by_asc(poll_option::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|o| PollOptionRecord {
                id: o.id,
                text: o.text,
            })
            .collect())
    }

    async fn poll_record(&self, model: poll::Model) -> Result<PollRecord> {
        let options = self.load_options(model.id).await?;
        Ok(PollRecord {
            id: model.id,
            title: model.title,
            question: model.question,
            article_id: model.article_id,
            options,
        })
    }

    pub async fn find_poll(&self, id: i64) -> Result<Option<PollRecord>> {
        match poll::Entity::find_by_id(id).one(&self.db).await? {
            Some(model) => Ok(Some(self.poll_record(model).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_poll_for_article(&self, article_id: i64) -> Result<Option<PollRecord>> {
        let model = poll::Entity::find()
            .filter(poll::Column::ArticleId.eq(article_id))
            .one(&self.db)
            .await?;
        match model {
            Some(model) => Ok(Some(self.poll_record(model).await?)),
            None => Ok(None),
        }
    }

    pub async fn list_polls(&self) -> Result<Vec<PollRecord>> {
        let models = poll::Entity::find()
            .order_by_desc(poll::Column::Id)
            .all(&self.db)
            .await?;
        let mut records = Vec::with_capacity(models.len());
        for model in models {
            records.push(self.poll_record(model).await?);
        }
        Ok(records)
    }

    /// 创建投票及其选项
    pub async fn insert_poll(
        &self,
        title: &str,
        question: &str,
        article_id: Option<i64>,
        options: &[String],
    ) -> Result<i64> {
        let db = &self.db;

        let id = self.retry.run("insert_poll", || async {
            let txn = db.begin().await?;

            let model = poll::ActiveModel {
                title: Set(title.to_string()),
                question: Set(question.to_string()),
                article_id: Set(article_id),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            if !options.is_empty() {
                let rows = options.iter().map(|text| poll_option::ActiveModel {
                    poll_id: Set(model.id),
                    text: Set(text.clone()),
                    ..Default::default()
                });
                poll_option::Entity::insert_many(rows)
                    .exec_without_returning(&txn)
                    .await?;
            }

            txn.commit().await?;
            Ok(model.id)
        })
        .await?;

        info!("Poll created: id={} options={}", id, options.len());
        Ok(id)
    }

    /// 更新投票；选项按文本对齐，文本未变的选项保留其票数
    pub async fn update_poll(
        &self,
        id: i64,
        title: &str,
        question: &str,
        article_id: Option<i64>,
        options: &[String],
    ) -> Result<bool> {
        let db = &self.db;

        self.retry.run(&format!("update_poll({})", id), || async {
            let txn = db.begin().await?;

            let Some(existing) = poll::Entity::find_by_id(id).one(&txn).await? else {
                txn.rollback().await?;
                return Ok(false);
            };

            let mut active = existing.into_active_model();
            active.title = Set(title.to_string());
            active.question = Set(question.to_string());
            active.article_id = Set(article_id);
            active.update(&txn).await?;

            let current = poll_option::Entity::find()
                .filter(poll_option::Column::PollId.eq(id))
                .all(&txn)
                .await?;

            let removed: Vec<i64> = current
                .iter()
                .filter(|o| !options.contains(&o.text))
                .map(|o| o.id)
                .collect();
            if !removed.is_empty() {
                poll_option::Entity::delete_many()
                    .filter(poll_option::Column::Id.is_in(removed))
                    .exec(&txn)
                    .await?;
            }

            let added: Vec<poll_option::ActiveModel> = options
                .iter()
                .filter(|text| !current.iter().any(|o| &o.text == *text))
                .map(|text| poll_option::ActiveModel {
                    poll_id: Set(id),
                    text: Set(text.clone()),
                    ..Default::default()
                })
                .collect();
            if !added.is_empty() {
                poll_option::Entity::insert_many(added)
                    .exec_without_returning(&txn)
                    .await?;
            }

            txn.commit().await?;
            Ok(true)
        })
        .await
        .map_err(Into::into)
    }

    pub async fn delete_poll(&self, id: i64) -> Result<bool> {
        let result = poll::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    /// 该 IP 是否已对投票的任一选项投过票
    pub async fn has_voted(&self, poll_id: i64, ip_address: &str) -> Result<bool> {
        let option_ids = poll_option::Entity::find()
            .select_only()
            .column(poll_option::Column::Id)
            .filter(poll_option::Column::PollId.eq(poll_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await?;
        if option_ids.is_empty() {
            return Ok(false);
        }

        let count = vote::Entity::find()
            .filter(vote::Column::OptionId.is_in(option_ids))
            .filter(vote::Column::IpAddress.eq(ip_address))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn insert_vote(&self, option_id: i64, ip_address: &str) -> Result<()> {
        let db = &self.db;
        self.retry.run(
            &format!("insert_vote({})", option_id),
            || async {
                vote::ActiveModel {
                    option_id: Set(option_id),
                    ip_address: Set(ip_address.to_string()),
                    voted_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(db)
                .await
            },
        )
        .await?;
        Ok(())
    }

    /// 每个选项的票数（没有票的选项不出现）
    pub async fn vote_counts(&self, poll_id: i64) -> Result<HashMap<i64, i64>> {
        let option_ids = poll_option::Entity::find()
            .select_only()
            .column(poll_option::Column::Id)
            .filter(poll_option::Column::PollId.eq(poll_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await?;
        if option_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = vote::Entity::find()
            .select_only()
            .column(vote::Column::OptionId)
            .column_as(vote::Column::Id.count(), "votes")
            .filter(vote::Column::OptionId.is_in(option_ids))
            .group_by(vote::Column::OptionId)
            .into_model::<OptionVotesRow>()
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(|r| (r.option_id, r.votes)).collect())
    }
}

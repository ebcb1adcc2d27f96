use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, sea_query::Expr,
};

use super::SeaOrmStorage;
use crate::errors::{PortalError, Result};
use crate::storage::models::{FeedbackEntry, NewFeedback};

use migration::entities::feedback;

/// 评分对应的显示文本
pub fn rating_label(rating: i16) -> &'static str {
    match rating {
        1 => "Ruim",
        2 => "Regular",
        3 => "Bom",
        4 => "Muito bom",
        5 => "Excelente",
        _ => "",
    }
}

fn feedback_entry(model: feedback::Model) -> FeedbackEntry {
    FeedbackEntry {
        rating_label: rating_label(model.rating).to_string(),
        id: model.id,
        name: model.name,
        email: model.email,
        rating: model.rating,
        comment: model.comment,
        image: model.image,
        sent_at: model.sent_at,
        answered: model.answered,
    }
}

impl SeaOrmStorage {
    pub async fn insert_feedback(&self, new: &NewFeedback) -> Result<FeedbackEntry> {
        let model = feedback::ActiveModel {
            name: Set(new.name.clone()),
            email: Set(new.email.clone()),
            rating: Set(new.rating),
            comment: Set(new.comment.clone()),
            image: Set(new.image.clone()),
            sent_at: Set(Utc::now()),
            answered: Set(false),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(feedback_entry(model))
    }

    /// 最新在前
    pub async fn list_feedback(&self, only_pending: bool) -> Result<Vec<FeedbackEntry>> {
        let mut query = feedback::Entity::find();
        if only_pending {
            query = query.filter(feedback::Column::Answered.eq(false));
        }
        let rows = query
            .order_by_desc(feedback::Column::SentAt)
            .order_by_desc(feedback::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(feedback_entry).collect())
    }

    pub async fn set_feedback_answered(&self, id: i64, answered: bool) -> Result<()> {
        let result = feedback::Entity::update_many()
            .col_expr(feedback::Column::Answered, Expr::value(answered))
            .filter(feedback::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(PortalError::not_found(format!(
                "Feedback {} não encontrado",
                id
            )));
        }
        Ok(())
    }

    pub async fn count_pending_feedback(&self) -> Result<u64> {
        Ok(feedback::Entity::find()
            .filter(feedback::Column::Answered.eq(false))
            .count(&self.db)
            .await?)
    }
}

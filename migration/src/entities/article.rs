//! 新闻文章实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub summary: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub image: Option<String>,
    pub category_id: Option<i64>,
    pub author_id: Option<i64>,
    pub published_at: DateTimeUtc,
    /// 最近一次日榜中的名次
    pub daily_rank: Option<i32>,
    /// 最近一次日榜对应的日期
    pub daily_rank_date: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

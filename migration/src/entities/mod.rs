pub mod article;
pub mod article_tag;
pub mod author;
pub mod category;
pub mod category_preference;
pub mod daily_ranking;
pub mod feedback;
pub mod poll;
pub mod poll_option;
pub mod saved_article;
pub mod tag;
pub mod tag_preference;
pub mod user;
pub mod view_event;
pub mod vote;

pub use article::Entity as ArticleEntity;
pub use article_tag::Entity as ArticleTagEntity;
pub use author::Entity as AuthorEntity;
pub use category::Entity as CategoryEntity;
pub use category_preference::Entity as CategoryPreferenceEntity;
pub use daily_ranking::Entity as DailyRankingEntity;
pub use feedback::Entity as FeedbackEntity;
pub use poll::Entity as PollEntity;
pub use poll_option::Entity as PollOptionEntity;
pub use saved_article::Entity as SavedArticleEntity;
pub use tag::Entity as TagEntity;
pub use tag_preference::Entity as TagPreferenceEntity;
pub use user::Entity as UserEntity;
pub use view_event::Entity as ViewEventEntity;
pub use vote::Entity as VoteEntity;

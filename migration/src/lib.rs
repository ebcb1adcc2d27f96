pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20250301_000001_content_tables;
mod m20250301_000002_view_tracking;
mod m20250310_000001_reader_accounts;
mod m20250315_000001_polls_feedback;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_content_tables::Migration),
            Box::new(m20250301_000002_view_tracking::Migration),
            Box::new(m20250310_000001_reader_accounts::Migration),
            Box::new(m20250315_000001_polls_feedback::Migration),
        ]
    }
}

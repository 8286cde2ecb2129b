pub use sea_orm_migration::prelude::*;

mod m20260105_000000_init;
mod m20260112_000000_activity;
mod m20260120_000000_planning;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260105_000000_init::Migration),
            Box::new(m20260112_000000_activity::Migration),
            Box::new(m20260120_000000_planning::Migration),
        ]
    }
}

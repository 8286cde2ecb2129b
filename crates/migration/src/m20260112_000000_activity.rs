//! Activity tables: the per-expense audit trail and role-targeted notifications.
//!
//! `expense_audit_logs.expense_id` carries no foreign key: deleting an
//! expense writes a final audit entry for it.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum ExpenseAuditLogs {
    Table,
    Id,
    ExpenseId,
    Action,
    OldStatus,
    NewStatus,
    Comment,
    ActorName,
    ActorRole,
    CreatedAt,
}

#[derive(Iden)]
enum Notifications {
    Table,
    Id,
    #[iden = "type"]
    Kind,
    Title,
    Message,
    Link,
    TargetRole,
    IsRead,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExpenseAuditLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseAuditLogs::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExpenseAuditLogs::ExpenseId)
                            .blob()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExpenseAuditLogs::Action).string().not_null())
                    .col(ColumnDef::new(ExpenseAuditLogs::OldStatus).string())
                    .col(ColumnDef::new(ExpenseAuditLogs::NewStatus).string())
                    .col(ColumnDef::new(ExpenseAuditLogs::Comment).string())
                    .col(
                        ColumnDef::new(ExpenseAuditLogs::ActorName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseAuditLogs::ActorRole)
                            .string()
                            .not_null()
                            .default("User"),
                    )
                    .col(
                        ColumnDef::new(ExpenseAuditLogs::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_audit_logs-expense_id-created_at")
                    .table(ExpenseAuditLogs::Table)
                    .col(ExpenseAuditLogs::ExpenseId)
                    .col(ExpenseAuditLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Notifications::Kind)
                            .string()
                            .not_null()
                            .default("info"),
                    )
                    .col(ColumnDef::new(Notifications::Title).string().not_null())
                    .col(ColumnDef::new(Notifications::Message).string().not_null())
                    .col(ColumnDef::new(Notifications::Link).string())
                    .col(ColumnDef::new(Notifications::TargetRole).string())
                    .col(
                        ColumnDef::new(Notifications::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-notifications-created_at")
                    .table(Notifications::Table)
                    .col(Notifications::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExpenseAuditLogs::Table).to_owned())
            .await?;
        Ok(())
    }
}

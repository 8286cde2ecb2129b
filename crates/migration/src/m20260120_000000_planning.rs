//! Budgets and recurring expense templates.
//!
//! A budget covers exactly one scope (category xor department) for one
//! `YYYY-MM` month. Uniqueness is enforced with one index per scope column:
//! NULLs are distinct in unique indexes, so a department budget never
//! collides with a category budget for the same month.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Budgets {
    Table,
    Id,
    BudgetType,
    CategoryId,
    DepartmentId,
    Month,
    AmountMinor,
    AlertThreshold,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum RecurringExpenses {
    Table,
    Id,
    Description,
    AmountMinor,
    CategoryId,
    DepartmentId,
    PaymentMethodId,
    Vendor,
    Frequency,
    StartDate,
    NextDueDate,
    Active,
    CreatedByName,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
}

#[derive(Iden)]
enum Departments {
    Table,
    Id,
}

#[derive(Iden)]
enum PaymentMethods {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Budgets::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Budgets::BudgetType).string().not_null())
                    .col(ColumnDef::new(Budgets::CategoryId).blob())
                    .col(ColumnDef::new(Budgets::DepartmentId).blob())
                    .col(ColumnDef::new(Budgets::Month).string().not_null())
                    .col(ColumnDef::new(Budgets::AmountMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Budgets::AlertThreshold)
                            .integer()
                            .not_null()
                            .default(80),
                    )
                    .col(ColumnDef::new(Budgets::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Budgets::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-category_id")
                            .from(Budgets::Table, Budgets::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-department_id")
                            .from(Budgets::Table, Budgets::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budgets-category_id-month-unique")
                    .table(Budgets::Table)
                    .col(Budgets::CategoryId)
                    .col(Budgets::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budgets-department_id-month-unique")
                    .table(Budgets::Table)
                    .col(Budgets::DepartmentId)
                    .col(Budgets::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RecurringExpenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecurringExpenses::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RecurringExpenses::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringExpenses::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RecurringExpenses::CategoryId).blob())
                    .col(ColumnDef::new(RecurringExpenses::DepartmentId).blob())
                    .col(ColumnDef::new(RecurringExpenses::PaymentMethodId).blob())
                    .col(ColumnDef::new(RecurringExpenses::Vendor).string())
                    .col(
                        ColumnDef::new(RecurringExpenses::Frequency)
                            .string()
                            .not_null()
                            .default("monthly"),
                    )
                    .col(
                        ColumnDef::new(RecurringExpenses::StartDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringExpenses::NextDueDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringExpenses::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RecurringExpenses::CreatedByName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringExpenses::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringExpenses::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recurring_expenses-category_id")
                            .from(RecurringExpenses::Table, RecurringExpenses::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recurring_expenses-department_id")
                            .from(RecurringExpenses::Table, RecurringExpenses::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recurring_expenses-payment_method_id")
                            .from(
                                RecurringExpenses::Table,
                                RecurringExpenses::PaymentMethodId,
                            )
                            .to(PaymentMethods::Table, PaymentMethods::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-recurring_expenses-active-next_due_date")
                    .table(RecurringExpenses::Table)
                    .col(RecurringExpenses::Active)
                    .col(RecurringExpenses::NextDueDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecurringExpenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;
        Ok(())
    }
}

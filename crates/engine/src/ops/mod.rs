use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{EngineError, ObjectStore, ResultEngine};

mod attachments;
mod audit;
mod budgets;
mod dashboard;
mod expenses;
mod lookups;
mod notifications;
mod recurring;

pub use attachments::MAX_UPLOAD_BYTES;
pub use budgets::{BudgetCheck, BudgetCheckStatus, BudgetUsage};
pub use dashboard::{CategorySummary, Dashboard, DepartmentSummary};
pub use expenses::{AttachmentView, EXPENSE_PAGE_SIZE, ExpenseDetail, ExpensePage, ExpenseSummary};
pub use lookups::Lookups;
pub use notifications::{ADMIN_ROLE, NewNotification, USER_ROLE};

/// The expense rule engine. Every operation reads and writes through the
/// database handle and the object store it was built with.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    objects: Arc<dyn ObjectStore>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn database(&self) -> &DatabaseConnection {
        &self.database
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    objects: Option<Arc<dyn ObjectStore>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Pass the required attachment store
    pub fn object_store(mut self, store: Arc<dyn ObjectStore>) -> EngineBuilder {
        self.objects = Some(store);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let objects = self.objects.ok_or_else(|| {
            EngineError::InvalidInput("an object store is required".to_string())
        })?;
        Ok(Engine {
            database: self.database,
            objects,
        })
    }
}

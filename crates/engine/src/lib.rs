pub use aggregation::{BudgetAlert, GroupTotal, MonthlyTotal};
pub use attachments::{Attachment, AttachmentType};
pub use audit_logs::{AuditAction, AuditLogEntry};
pub use budgets::{Budget, BudgetHealth, BudgetScope};
pub use categories::Category;
pub use commands::{
    Actor, BudgetCheckCmd, BudgetCmd, EditExpenseCmd, ExpenseCmd, ExpenseListFilter, LookupRef,
    RecurringCmd, Upload,
};
pub use departments::Department;
pub use error::{EngineError, FieldErrors};
pub use expenses::Expense;
pub use money::Money;
pub use notifications::{Notification, NotificationKind};
pub use ops::{
    ADMIN_ROLE, AttachmentView, BudgetCheck, BudgetCheckStatus, BudgetUsage, CategorySummary,
    Dashboard, DepartmentSummary, EXPENSE_PAGE_SIZE, Engine, EngineBuilder, ExpenseDetail,
    ExpensePage, ExpenseSummary, Lookups, MAX_UPLOAD_BYTES, NewNotification, USER_ROLE,
};
pub use payment_methods::PaymentMethod;
pub use recurring_expenses::{Frequency, RecurringExpense};
pub use status::{ExpenseStatus, StatusEffects, StatusNotice, transition_allowed};
pub use storage::{LocalObjectStore, MemoryObjectStore, ObjectStore, ObjectStoreError, StoredObject};

pub mod aggregation;
mod attachments;
mod audit_logs;
mod budgets;
mod categories;
mod commands;
mod departments;
mod error;
mod expenses;
mod money;
mod notifications;
mod ops;
mod payment_methods;
mod recurring_expenses;
pub mod report;
mod status;
pub mod storage;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;

//! Command structs for engine operations.
//!
//! These types group parameters for write operations (create/edit expense,
//! budgets, recurring templates), keeping call sites readable and avoiding
//! long argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{AttachmentType, BudgetScope, ExpenseStatus, Frequency, Money};

pub(crate) const FALLBACK_ACTOR_NAME: &str = "System";

/// Who performs an operation, as resolved by the caller's identity source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    pub role: String,
}

impl Actor {
    #[must_use]
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }

    /// Builds an actor from optional identity fields, falling back to
    /// `System` / `User`.
    #[must_use]
    pub fn resolve(name: Option<&str>, role: Option<&str>) -> Self {
        let pick = |value: Option<&str>, fallback: &str| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };
        Self {
            name: pick(name, FALLBACK_ACTOR_NAME),
            role: pick(role, crate::audit_logs::DEFAULT_ACTOR_ROLE),
        }
    }

    #[must_use]
    pub fn system() -> Self {
        Self::resolve(None, None)
    }
}

/// A category or payment method chosen from the list, or typed as free text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupRef {
    Id(Uuid),
    Name(String),
}

/// A file submitted with an expense form.
#[derive(Clone, Debug)]
pub struct Upload {
    pub attachment_type: AttachmentType,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    #[must_use]
    pub fn new(
        attachment_type: AttachmentType,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            attachment_type,
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Fields of the expense form, shared by create and edit.
///
/// Everything is optional so validation can report every missing field at
/// once.
#[derive(Clone, Debug, Default)]
pub struct ExpenseCmd {
    pub date: Option<NaiveDate>,
    pub amount: Money,
    pub category: Option<LookupRef>,
    pub payment_method: Option<LookupRef>,
    pub department_id: Option<Uuid>,
    pub vendor: Option<String>,
    pub description: String,
    pub note_internal: Option<String>,
    pub created_by_name: String,
    /// Defaults to [`ExpenseStatus::Draft`].
    pub status: Option<ExpenseStatus>,
    pub uploads: Vec<Upload>,
}

impl ExpenseCmd {
    #[must_use]
    pub fn new(
        date: NaiveDate,
        amount: Money,
        description: impl Into<String>,
        created_by_name: impl Into<String>,
    ) -> Self {
        Self {
            date: Some(date),
            amount,
            description: description.into(),
            created_by_name: created_by_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn category(mut self, category: LookupRef) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn payment_method(mut self, payment_method: LookupRef) -> Self {
        self.payment_method = Some(payment_method);
        self
    }

    #[must_use]
    pub fn department(mut self, department_id: Uuid) -> Self {
        self.department_id = Some(department_id);
        self
    }

    #[must_use]
    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    #[must_use]
    pub fn note_internal(mut self, note: impl Into<String>) -> Self {
        self.note_internal = Some(note.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: ExpenseStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn upload(mut self, upload: Upload) -> Self {
        self.uploads.push(upload);
        self
    }
}

/// Edit an existing expense: the full form plus attachments to remove.
#[derive(Clone, Debug, Default)]
pub struct EditExpenseCmd {
    pub fields: ExpenseCmd,
    pub delete_attachment_ids: Vec<Uuid>,
}

impl EditExpenseCmd {
    #[must_use]
    pub fn new(fields: ExpenseCmd) -> Self {
        Self {
            fields,
            delete_attachment_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn delete_attachment(mut self, id: Uuid) -> Self {
        self.delete_attachment_ids.push(id);
        self
    }
}

/// Filters for listing and exporting expenses.
///
/// `from` and `to` are both inclusive.
#[derive(Clone, Debug, Default)]
pub struct ExpenseListFilter {
    /// Case-insensitive substring of description or vendor.
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub status: Option<ExpenseStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Pre-submission budget check for a prospective amount.
#[derive(Clone, Debug)]
pub struct BudgetCheckCmd {
    pub amount: Money,
    pub date: NaiveDate,
    pub category_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
}

/// Create a budget.
#[derive(Clone, Debug)]
pub struct BudgetCmd {
    pub scope: BudgetScope,
    /// `YYYY-MM`.
    pub month: String,
    pub amount: Money,
    /// Defaults to 80.
    pub alert_threshold: Option<i32>,
}

impl BudgetCmd {
    #[must_use]
    pub fn new(scope: BudgetScope, month: impl Into<String>, amount: Money) -> Self {
        Self {
            scope,
            month: month.into(),
            amount,
            alert_threshold: None,
        }
    }

    #[must_use]
    pub fn alert_threshold(mut self, threshold: i32) -> Self {
        self.alert_threshold = Some(threshold);
        self
    }
}

/// Create or update a recurring template.
#[derive(Clone, Debug)]
pub struct RecurringCmd {
    pub description: String,
    pub amount: Money,
    pub category_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,
    pub vendor: Option<String>,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub created_by_name: String,
    /// Ignored on create (templates start active).
    pub active: bool,
}

impl RecurringCmd {
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        amount: Money,
        frequency: Frequency,
        start_date: NaiveDate,
        created_by_name: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            category_id: None,
            department_id: None,
            payment_method_id: None,
            vendor: None,
            frequency,
            start_date,
            created_by_name: created_by_name.into(),
            active: true,
        }
    }

    #[must_use]
    pub fn category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn department(mut self, department_id: Uuid) -> Self {
        self.department_id = Some(department_id);
        self
    }

    #[must_use]
    pub fn payment_method(mut self, payment_method_id: Uuid) -> Self {
        self.payment_method_id = Some(payment_method_id);
        self
    }

    #[must_use]
    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

//! Request and response bodies of the HTTP API.
//!
//! Amounts travel as the text the user typed (`"1,234.50"`) and are parsed
//! by the server, so a malformed amount surfaces as a field error like any
//! other invalid input.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod lookup {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepartmentNew {
        pub name: String,
    }
}

pub mod expense {
    use super::*;

    /// A file sent inline with an expense form.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AttachmentUpload {
        /// `approve_proof`, `slip`, `receipt`, `invoice` or `product_photo`.
        pub attachment_type: String,
        pub file_name: String,
        pub content_type: String,
        /// File bytes, standard base64.
        pub data: String,
    }

    /// The expense form, shared by create and edit.
    ///
    /// A category or payment method is either picked by id or typed as a
    /// new name; the id wins when both are sent.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseForm {
        pub date: Option<NaiveDate>,
        #[serde(default)]
        pub amount: String,
        pub category_id: Option<Uuid>,
        pub category_name: Option<String>,
        pub payment_method_id: Option<Uuid>,
        pub payment_method_name: Option<String>,
        pub department_id: Option<Uuid>,
        pub vendor: Option<String>,
        #[serde(default)]
        pub description: String,
        pub note_internal: Option<String>,
        #[serde(default)]
        pub created_by_name: String,
        pub status: Option<String>,
        #[serde(default)]
        pub attachments: Vec<AttachmentUpload>,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseEdit {
        #[serde(flatten)]
        pub form: ExpenseForm,
        #[serde(default)]
        pub delete_attachment_ids: Vec<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StatusUpdate {
        pub status: String,
        pub comment: Option<String>,
    }

    /// Query string of the list and export endpoints.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseQuery {
        pub search: Option<String>,
        pub category_id: Option<Uuid>,
        pub department_id: Option<Uuid>,
        pub status: Option<String>,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
        /// 1-based, defaults to 1.
        pub page: Option<u64>,
    }
}

pub mod budget {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetCheckRequest {
        #[serde(default)]
        pub amount: String,
        pub date: NaiveDate,
        pub category_id: Option<Uuid>,
        pub department_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetNew {
        /// `category` or `department`.
        pub budget_type: String,
        pub category_id: Option<Uuid>,
        pub department_id: Option<Uuid>,
        /// `YYYY-MM`.
        pub month: String,
        #[serde(default)]
        pub amount: String,
        pub alert_threshold: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetUpdate {
        #[serde(default)]
        pub amount: String,
        pub alert_threshold: Option<i32>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MonthQuery {
        /// `YYYY-MM`, defaults to the current month.
        pub month: Option<String>,
    }
}

pub mod recurring {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurringForm {
        #[serde(default)]
        pub description: String,
        #[serde(default)]
        pub amount: String,
        pub category_id: Option<Uuid>,
        pub department_id: Option<Uuid>,
        pub payment_method_id: Option<Uuid>,
        pub vendor: Option<String>,
        /// `weekly`, `monthly` or `yearly`.
        pub frequency: String,
        pub start_date: NaiveDate,
        #[serde(default)]
        pub created_by_name: String,
        /// Ignored on create.
        pub active: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RecurringCheck {
        /// Run as of this day instead of today.
        pub date: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurringChecked {
        pub date: NaiveDate,
        pub processed: u64,
    }
}

pub mod notification {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct NotificationQuery {
        /// Only notifications for this role plus untargeted ones.
        pub role: Option<String>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MarkRead {
        pub ids: Vec<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MarkedRead {
        pub updated: u64,
    }
}

pub mod dashboard {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct DashboardQuery {
        /// Compute as of this day instead of today.
        pub date: Option<NaiveDate>,
    }
}

use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, FieldErrors, Money};

use serde::Serialize;
pub use server::{ServerState, router, run, run_with_listener};

mod budgets;
mod dashboard;
mod expenses;
mod lookups;
mod notifications;
mod recurring;
mod server;

pub mod types {
    pub mod lookup {
        pub use api_types::lookup::DepartmentNew;
        pub use engine::{Category, Department, Lookups, PaymentMethod};
    }

    pub mod expense {
        pub use api_types::expense::{
            AttachmentUpload, ExpenseCreated, ExpenseEdit, ExpenseForm, ExpenseQuery, StatusUpdate,
        };
        pub use engine::{AuditLogEntry, ExpenseDetail, ExpensePage, ExpenseSummary};
    }

    pub mod budget {
        pub use api_types::budget::{BudgetCheckRequest, BudgetNew, BudgetUpdate, MonthQuery};
        pub use engine::{Budget, BudgetAlert, BudgetCheck, BudgetUsage};
    }

    pub mod recurring {
        pub use api_types::recurring::{RecurringCheck, RecurringChecked, RecurringForm};
        pub use engine::RecurringExpense;
    }

    pub mod notification {
        pub use crate::notifications::NotificationsResponse;
        pub use api_types::notification::{MarkRead, MarkedRead, NotificationQuery};
    }
}

const RETRY_MESSAGE: &str = "เกิดข้อผิดพลาดในการบันทึก กรุณาลองใหม่";

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

#[derive(Serialize)]
struct ValidationBody {
    errors: FieldErrors,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::ConstraintViolation(_) => StatusCode::CONFLICT,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidStatus(_) | EngineError::InvalidInput(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::LookupCreation(_)
        | EngineError::ObjectStore(_)
        | EngineError::Export(_)
        | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::ConstraintViolation(message)
        | EngineError::KeyNotFound(message)
        | EngineError::InvalidStatus(message)
        | EngineError::InvalidInput(message) => message,
        other => {
            tracing::error!("request failed: {other}");
            RETRY_MESSAGE.to_string()
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServerError::Engine(EngineError::Validation(errors)) => {
                (StatusCode::BAD_REQUEST, Json(ValidationBody { errors })).into_response()
            }
            ServerError::Engine(err) => {
                let status = status_for_engine_error(&err);
                let error = message_for_engine_error(err);
                (status, Json(Error { error })).into_response()
            }
            ServerError::Generic(error) => {
                (StatusCode::BAD_REQUEST, Json(Error { error })).into_response()
            }
        }
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Parses a typed amount. Text that is not a valid amount becomes zero so
/// the engine reports it as an invalid `amount` field.
pub(crate) fn parse_amount(text: &str) -> Money {
    text.trim().parse().unwrap_or(Money::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use sea_orm::DbErr;

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_maps_to_400_with_field_errors() {
        let mut errors = FieldErrors::new();
        errors.insert("amount", "จำนวนเงินต้องเป็นตัวเลขมากกว่า 0");
        let res = ServerError::from(EngineError::Validation(errors)).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["errors"]["amount"], "จำนวนเงินต้องเป็นตัวเลขมากกว่า 0");
    }

    #[test]
    fn constraint_violation_maps_to_409() {
        let res = ServerError::from(EngineError::ConstraintViolation("x".to_string()))
            .into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_status_maps_to_422() {
        let res =
            ServerError::from(EngineError::InvalidStatus("สถานะไม่ถูกต้อง".to_string()))
                .into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let res = ServerError::from(EngineError::InvalidInput("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn internal_errors_are_not_echoed() {
        let res = ServerError::from(EngineError::Database(DbErr::Custom(
            "no such table: expenses".to_string(),
        )))
        .into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(res).await;
        assert_eq!(body["error"], RETRY_MESSAGE);

        let res = ServerError::from(EngineError::LookupCreation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unparseable_amounts_become_zero() {
        assert_eq!(parse_amount(" 1,234.50 "), Money::new(123_450));
        assert_eq!(parse_amount("abc"), Money::ZERO);
        assert_eq!(parse_amount(""), Money::ZERO);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}

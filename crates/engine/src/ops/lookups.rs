//! Categories, departments and payment methods.
//!
//! Categories and payment methods can be typed as free text on the expense
//! form. Such names are resolved insert-then-find: a fresh row is inserted and,
//! when the unique name index rejects it, the existing row is reused.

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Category, Department, EngineError, LookupRef, PaymentMethod, ResultEngine, categories,
    departments, payment_methods,
    util::{is_unique_violation, normalize_required_text},
};

use super::Engine;

const CATEGORY_CREATION_FAILED: &str = "เกิดข้อผิดพลาดในการสร้างหมวดหมู่ใหม่";
const PAYMENT_METHOD_CREATION_FAILED: &str = "เกิดข้อผิดพลาดในการสร้างวิธีชำระเงินใหม่";
const DEPARTMENT_NAME_REQUIRED: &str = "กรุณาระบุชื่อแผนก";
const DEPARTMENT_EXISTS: &str = "มีแผนกนี้อยู่แล้ว";

/// Everything the expense form offers for selection.
#[derive(Clone, Debug, Serialize)]
pub struct Lookups {
    pub categories: Vec<Category>,
    pub departments: Vec<Department>,
    pub payment_methods: Vec<PaymentMethod>,
}

/// Generates the insert-or-find resolver of a named lookup table.
macro_rules! insert_or_find {
    ($fn_name:ident, $module:ident, $domain:ty, $label:literal, $failure:expr) => {
        /// Returns the row named `name`, creating it with default styling when
        /// missing.
        pub async fn $fn_name(&self, name: &str) -> ResultEngine<$domain> {
            let Some(name) = normalize_required_text(name) else {
                return Err(EngineError::InvalidInput(format!(
                    "{} name must not be empty",
                    $label
                )));
            };

            let insert_err = match $module::ActiveModel::named(&name)
                .insert(&self.database)
                .await
            {
                Ok(model) => {
                    tracing::info!(lookup = $label, %name, "created lookup from free text");
                    return Ok(model.into());
                }
                Err(err) => err,
            };

            match $module::Entity::find()
                .filter($module::Column::Name.eq(name.as_str()))
                .one(&self.database)
                .await
            {
                Ok(Some(model)) => Ok(model.into()),
                Ok(None) => {
                    tracing::warn!(lookup = $label, %name, error = %insert_err, "lookup insert failed and no row matches");
                    Err(EngineError::LookupCreation($failure.to_string()))
                }
                Err(find_err) => {
                    tracing::warn!(lookup = $label, %name, error = %find_err, "lookup find failed");
                    Err(EngineError::LookupCreation($failure.to_string()))
                }
            }
        }
    };
}

impl Engine {
    pub async fn lookups(&self) -> ResultEngine<Lookups> {
        Ok(Lookups {
            categories: self.list_categories().await?,
            departments: self.list_departments().await?,
            payment_methods: self.list_payment_methods().await?,
        })
    }

    pub async fn list_categories(&self) -> ResultEngine<Vec<Category>> {
        let rows = categories::Entity::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    pub async fn list_departments(&self) -> ResultEngine<Vec<Department>> {
        let rows = departments::Entity::find()
            .order_by_asc(departments::Column::Name)
            .all(&self.database)
            .await?;
        Ok(rows.into_iter().map(Department::from).collect())
    }

    pub async fn list_payment_methods(&self) -> ResultEngine<Vec<PaymentMethod>> {
        let rows = payment_methods::Entity::find()
            .order_by_asc(payment_methods::Column::Name)
            .all(&self.database)
            .await?;
        Ok(rows.into_iter().map(PaymentMethod::from).collect())
    }

    pub async fn create_department(&self, name: &str) -> ResultEngine<Department> {
        let Some(name) = normalize_required_text(name) else {
            return Err(EngineError::field("name", DEPARTMENT_NAME_REQUIRED));
        };
        let model = departments::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            name: ActiveValue::Set(name),
        }
        .insert(&self.database)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                EngineError::ConstraintViolation(DEPARTMENT_EXISTS.to_string())
            } else {
                err.into()
            }
        })?;
        Ok(model.into())
    }

    insert_or_find!(
        find_or_create_category,
        categories,
        Category,
        "category",
        CATEGORY_CREATION_FAILED
    );

    insert_or_find!(
        find_or_create_payment_method,
        payment_methods,
        PaymentMethod,
        "payment method",
        PAYMENT_METHOD_CREATION_FAILED
    );

    pub(super) async fn category_exists(&self, id: Uuid) -> ResultEngine<bool> {
        Ok(categories::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .is_some())
    }

    pub(super) async fn department_exists(&self, id: Uuid) -> ResultEngine<bool> {
        Ok(departments::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .is_some())
    }

    pub(super) async fn payment_method_exists(&self, id: Uuid) -> ResultEngine<bool> {
        Ok(payment_methods::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .is_some())
    }

    /// Id of the chosen category, creating a free-text one if needed.
    pub(super) async fn resolve_category(&self, category: &LookupRef) -> ResultEngine<Uuid> {
        match category {
            LookupRef::Id(id) => Ok(*id),
            LookupRef::Name(name) => Ok(self.find_or_create_category(name).await?.id),
        }
    }

    /// Id of the chosen payment method, creating a free-text one if needed.
    pub(super) async fn resolve_payment_method(
        &self,
        payment_method: &LookupRef,
    ) -> ResultEngine<Uuid> {
        match payment_method {
            LookupRef::Id(id) => Ok(*id),
            LookupRef::Name(name) => Ok(self.find_or_create_payment_method(name).await?.id),
        }
    }
}

//! Files attached to an expense.
//!
//! The row only stores the object-store path; bytes live in the
//! [`ObjectStore`](crate::ObjectStore).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// Purpose of an attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentType {
    ApproveProof,
    Slip,
    Receipt,
    Invoice,
    ProductPhoto,
}

impl AttachmentType {
    pub const ALL: [AttachmentType; 5] = [
        AttachmentType::ApproveProof,
        AttachmentType::Slip,
        AttachmentType::Receipt,
        AttachmentType::Invoice,
        AttachmentType::ProductPhoto,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApproveProof => "approve_proof",
            Self::Slip => "slip",
            Self::Receipt => "receipt",
            Self::Invoice => "invoice",
            Self::ProductPhoto => "product_photo",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ApproveProof => "หลักฐานอนุมัติ",
            Self::Slip => "สลิปโอนเงิน",
            Self::Receipt => "ใบเสร็จ",
            Self::Invoice => "ใบแจ้งหนี้",
            Self::ProductPhoto => "รูปสินค้า",
        }
    }
}

impl TryFrom<&str> for AttachmentType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| EngineError::InvalidInput(format!("invalid attachment type: {value}")))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub attachment_type: AttachmentType,
    pub file_path: String,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "attachments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub expense_id: Uuid,
    pub attachment_type: String,
    pub file_path: String,
    pub file_name: String,
    pub uploaded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expense,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Attachment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            expense_id: model.expense_id,
            attachment_type: AttachmentType::try_from(model.attachment_type.as_str())?,
            file_path: model.file_path,
            file_name: model.file_name,
            uploaded_at: model.uploaded_at,
        })
    }
}

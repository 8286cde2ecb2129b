//! Expense lifecycle status and the effects each transition triggers.
//!
//! The state machine is permissive: every status is reachable from every
//! other one. [`transition_allowed`] is the single place to tighten it.

use serde::{Deserialize, Serialize};

use crate::{AuditAction, EngineError, NotificationKind, ResultEngine};

pub(crate) const INVALID_STATUS_MESSAGE: &str = "สถานะไม่ถูกต้อง";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    #[default]
    Draft,
    Approved,
    Rejected,
    Paid,
}

impl ExpenseStatus {
    pub const ALL: [ExpenseStatus; 4] = [
        ExpenseStatus::Draft,
        ExpenseStatus::Approved,
        ExpenseStatus::Rejected,
        ExpenseStatus::Paid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Paid => "paid",
        }
    }

    /// Thai label shown to users and in reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Draft => "แบบร่าง",
            Self::Approved => "อนุมัติแล้ว",
            Self::Rejected => "ถูกปฏิเสธ",
            Self::Paid => "จ่ายเงินแล้ว",
        }
    }

    /// Audit action, default comment and notification for a transition into
    /// this status.
    pub fn effects(self) -> StatusEffects {
        match self {
            Self::Approved => StatusEffects {
                action: AuditAction::Approve,
                default_comment: "อนุมัติรายการ",
                notification: Some(StatusNotice {
                    kind: NotificationKind::Success,
                    title: "รายการเบิกได้รับการอนุมัติ",
                    verb: "ได้รับการอนุมัติแล้ว",
                }),
            },
            Self::Rejected => StatusEffects {
                action: AuditAction::Reject,
                default_comment: "ปฏิเสธรายการ",
                notification: Some(StatusNotice {
                    kind: NotificationKind::Error,
                    title: "รายการเบิกถูกปฏิเสธ",
                    verb: "ถูกปฏิเสธ",
                }),
            },
            Self::Paid => StatusEffects {
                action: AuditAction::Pay,
                default_comment: "จ่ายเงินแล้ว",
                notification: Some(StatusNotice {
                    kind: NotificationKind::Success,
                    title: "จ่ายเงินเรียบร้อย",
                    verb: "ได้รับการจ่ายเงินแล้ว",
                }),
            },
            Self::Draft => StatusEffects {
                action: AuditAction::Update,
                default_comment: "เปลี่ยนสถานะรายการ",
                notification: None,
            },
        }
    }
}

impl TryFrom<&str> for ExpenseStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "draft" => Ok(Self::Draft),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "paid" => Ok(Self::Paid),
            _ => Err(EngineError::InvalidStatus(INVALID_STATUS_MESSAGE.to_string())),
        }
    }
}

/// Row of the status → side effect lookup table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusEffects {
    pub action: AuditAction,
    pub default_comment: &'static str,
    /// `None` means the transition is silent (moves back to draft).
    pub notification: Option<StatusNotice>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusNotice {
    pub kind: NotificationKind,
    pub title: &'static str,
    verb: &'static str,
}

impl StatusNotice {
    /// `รายการ "<description>" <verb>`.
    pub fn message(&self, description: &str) -> String {
        format!("รายการ \"{description}\" {}", self.verb)
    }
}

/// Whether an expense may move from `from` to `to`.
pub fn transition_allowed(_from: ExpenseStatus, _to: ExpenseStatus) -> bool {
    true
}

/// `transition_allowed` as an engine result, shared by every write that moves
/// an expense to another status.
pub(crate) fn ensure_transition(from: ExpenseStatus, to: ExpenseStatus) -> ResultEngine<()> {
    if transition_allowed(from, to) {
        Ok(())
    } else {
        Err(EngineError::InvalidStatus(INVALID_STATUS_MESSAGE.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_closed_set_only() {
        for status in ExpenseStatus::ALL {
            assert_eq!(ExpenseStatus::try_from(status.as_str()).unwrap(), status);
        }
        assert_eq!(
            ExpenseStatus::try_from("archived").unwrap_err(),
            EngineError::InvalidStatus("สถานะไม่ถูกต้อง".to_string())
        );
        assert!(ExpenseStatus::try_from("Approved").is_err());
    }

    #[test]
    fn effects_map_status_to_action_and_notice() {
        let approved = ExpenseStatus::Approved.effects();
        assert_eq!(approved.action, AuditAction::Approve);
        assert_eq!(
            approved.notification.map(|n| n.kind),
            Some(NotificationKind::Success)
        );

        let rejected = ExpenseStatus::Rejected.effects();
        assert_eq!(rejected.action, AuditAction::Reject);
        assert_eq!(
            rejected.notification.map(|n| n.kind),
            Some(NotificationKind::Error)
        );

        assert_eq!(ExpenseStatus::Paid.effects().action, AuditAction::Pay);

        let draft = ExpenseStatus::Draft.effects();
        assert_eq!(draft.action, AuditAction::Update);
        assert!(draft.notification.is_none());
    }

    #[test]
    fn notice_message_quotes_description() {
        let notice = ExpenseStatus::Rejected.effects().notification.unwrap();
        assert_eq!(notice.message("ค่าน้ำมัน"), "รายการ \"ค่าน้ำมัน\" ถูกปฏิเสธ");
    }

    #[test]
    fn every_transition_is_allowed() {
        for from in ExpenseStatus::ALL {
            for to in ExpenseStatus::ALL {
                assert!(transition_allowed(from, to));
                assert_eq!(ensure_transition(from, to), Ok(()));
            }
        }
    }
}

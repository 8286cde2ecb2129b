//! Report rendering and Thai display formatting.
//!
//! Renders already computed rows; totals are summed from the rows passed in,
//! never re-queried.

use chrono::{Datelike, NaiveDate};
use csv::Writer;
use serde::Serialize;

use crate::{EngineError, ExpenseStatus, Money, ResultEngine};

const THAI_SHORT_MONTHS: [&str; 12] = [
    "ม.ค.", "ก.พ.", "มี.ค.", "เม.ย.", "พ.ค.", "มิ.ย.", "ก.ค.", "ส.ค.", "ก.ย.", "ต.ค.", "พ.ย.",
    "ธ.ค.",
];

const BUDDHIST_ERA_OFFSET: i32 = 543;

const EXPORT_HEADERS: [&str; 11] = [
    "ลำดับ",
    "วันที่",
    "รายละเอียด",
    "หมวดหมู่",
    "แผนก",
    "จำนวนเงิน",
    "วิธีชำระเงิน",
    "ร้านค้า",
    "สถานะ",
    "ผู้ทำรายการ",
    "หมายเหตุ",
];

const TOTAL_LABEL: &str = "รวมทั้งหมด:";
const EMPTY_CELL: &str = "-";

/// `11 ธ.ค. 2567` (day, short Thai month, Buddhist-era year).
pub fn thai_short_date(date: NaiveDate) -> String {
    let month = THAI_SHORT_MONTHS[date.month0() as usize];
    format!(
        "{} {month} {}",
        date.day(),
        date.year() + BUDDHIST_ERA_OFFSET
    )
}

/// `ธ.ค. 67` for the month starting at `month_start`, used as chart labels.
pub fn thai_month_label(month_start: NaiveDate) -> String {
    let month = THAI_SHORT_MONTHS[month_start.month0() as usize];
    let year = (month_start.year() + BUDDHIST_ERA_OFFSET) % 100;
    format!("{month} {year:02}")
}

/// `+12.5%` / `-3.0%`.
pub fn signed_percentage(percentage: f64) -> String {
    let sign = if percentage >= 0.0 { "+" } else { "" };
    format!("{sign}{percentage:.1}%")
}

/// One line of the expense report.
#[derive(Clone, Debug, Serialize)]
pub struct ExportRow {
    pub date: NaiveDate,
    pub description: String,
    pub category: Option<String>,
    pub department: Option<String>,
    pub amount: Money,
    pub payment_method: Option<String>,
    pub vendor: Option<String>,
    pub status: ExpenseStatus,
    pub created_by_name: String,
    pub note_internal: Option<String>,
}

fn cell(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(EMPTY_CELL)
}

/// Renders rows as CSV with a trailing total line.
pub fn expenses_csv(rows: &[ExportRow]) -> ResultEngine<Vec<u8>> {
    let export_err = |err: csv::Error| EngineError::Export(err.to_string());

    let mut writer = Writer::from_writer(vec![]);
    writer.write_record(EXPORT_HEADERS).map_err(export_err)?;

    for (index, row) in rows.iter().enumerate() {
        let position = (index + 1).to_string();
        let date = thai_short_date(row.date);
        let amount = row.amount.to_string();
        writer
            .write_record([
                position.as_str(),
                date.as_str(),
                row.description.as_str(),
                cell(row.category.as_deref()),
                cell(row.department.as_deref()),
                amount.as_str(),
                cell(row.payment_method.as_deref()),
                cell(row.vendor.as_deref()),
                row.status.label(),
                row.created_by_name.as_str(),
                cell(row.note_internal.as_deref()),
            ])
            .map_err(export_err)?;
    }

    let total = Money::checked_sum(rows.iter().map(|row| row.amount))
        .ok_or_else(|| EngineError::InvalidInput("export total out of range".to_string()))?
        .to_string();
    writer
        .write_record(["", "", "", "", TOTAL_LABEL, total.as_str(), "", "", "", "", ""])
        .map_err(export_err)?;

    writer
        .into_inner()
        .map_err(|err| EngineError::Export(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn thai_dates_use_buddhist_era() {
        assert_eq!(thai_short_date(date(2024, 12, 11)), "11 ธ.ค. 2567");
        assert_eq!(thai_short_date(date(2025, 1, 3)), "3 ม.ค. 2568");
        assert_eq!(thai_month_label(date(2024, 12, 1)), "ธ.ค. 67");
        assert_eq!(thai_month_label(date(2033, 5, 1)), "พ.ค. 76");
    }

    #[test]
    fn signed_percentage_formats_sign() {
        assert_eq!(signed_percentage(12.345), "+12.3%");
        assert_eq!(signed_percentage(0.0), "+0.0%");
        assert_eq!(signed_percentage(-50.0), "-50.0%");
    }

    #[test]
    fn csv_has_headers_rows_and_total() {
        let rows = vec![
            ExportRow {
                date: date(2024, 12, 11),
                description: "ค่ากาแฟ".to_string(),
                category: Some("อาหาร".to_string()),
                department: Some("ขาย".to_string()),
                amount: Money::new(12_050),
                payment_method: Some("เงินสด".to_string()),
                vendor: None,
                status: ExpenseStatus::Approved,
                created_by_name: "สมชาย".to_string(),
                note_internal: None,
            },
            ExportRow {
                date: date(2024, 12, 12),
                description: "กระดาษ A4".to_string(),
                category: None,
                department: Some("บัญชี".to_string()),
                amount: Money::new(150_000),
                payment_method: Some("โอน".to_string()),
                vendor: Some("OfficeMate".to_string()),
                status: ExpenseStatus::Paid,
                created_by_name: "สมหญิง".to_string(),
                note_internal: Some("ด่วน".to_string()),
            },
        ];

        let csv = String::from_utf8(expenses_csv(&rows).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "ลำดับ,วันที่,รายละเอียด,หมวดหมู่,แผนก,จำนวนเงิน,วิธีชำระเงิน,ร้านค้า,สถานะ,ผู้ทำรายการ,หมายเหตุ"
        );
        assert_eq!(
            lines[1],
            "1,11 ธ.ค. 2567,ค่ากาแฟ,อาหาร,ขาย,฿120.50,เงินสด,-,อนุมัติแล้ว,สมชาย,-"
        );
        assert_eq!(
            lines[2],
            "2,12 ธ.ค. 2567,กระดาษ A4,-,บัญชี,\"฿1,500.00\",โอน,OfficeMate,จ่ายเงินแล้ว,สมหญิง,ด่วน"
        );
        assert_eq!(lines[3], ",,,,รวมทั้งหมด:,\"฿1,620.50\",,,,,");
    }
}

//! # CSV 내보내기 모듈
//!
//! 연락처 목록을 CSV 문서로 변환합니다. 출력은 스프레드시트 프로그램
//! (특히 Excel)에서 바로 열 수 있는 형식을 목표로 합니다:
//!
//! - **UTF-8 BOM**으로 시작 — BOM이 없으면 Excel이 인코딩을 잘못 추측해서
//!   "Imię" 같은 비ASCII 헤더가 깨집니다
//! - 헤더는 폴란드어 컬럼명 고정
//! - 값에 쉼표/따옴표/줄바꿈이 있으면 RFC 4180 방식으로 인용 처리
//! - 날짜는 ISO 타임스탬프를 `YYYY-MM-DD HH:MM:SS`로 변환
//!
//! CSV는 행 수 제한 없이 전체를 출력합니다 — 화면 검색의 50건 제한은
//! 페이지 표시용이고, 내보내기는 필터에 걸린 전체가 대상입니다.

use chrono::{DateTime, Utc};

use crate::models::ContactResponse;

/// CSV 헤더 행 (폴란드어 컬럼명)
pub const CSV_HEADER: &str = "Imię,Nazwisko,Email,Telefon,Firma,Stanowisko,Tagi,Data utworzenia";

/// 연락처 목록을 CSV 문서(BOM 포함 전체 문자열)로 변환합니다.
///
/// # 매개변수
/// - `contacts`: 내보낼 연락처 목록 (필터/정렬이 이미 적용된 상태)
///
/// # 반환값
/// `\u{FEFF}` BOM + 헤더 행 + 데이터 행들. 행 구분은 CRLF(RFC 4180)입니다.
pub fn contacts_csv(contacts: &[ContactResponse]) -> String {
    // \u{feff}: UTF-8 BOM. 문자열 맨 앞에 딱 한 번만 들어갑니다.
    let mut out = String::from("\u{feff}");
    out.push_str(CSV_HEADER);
    out.push_str("\r\n");

    for contact in contacts {
        // 태그 컬럼: 태그 이름들을 ", "로 이어 하나의 셀에 담습니다.
        // 셀 안에 쉼표가 생기므로 아래 csv_field가 자동으로 인용 처리합니다.
        let tags = contact
            .tags
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let row = [
            csv_field(&contact.first_name),
            csv_field(&contact.last_name),
            csv_field(&contact.email),
            // 전화번호가 없으면 빈 셀 — "null" 같은 문자가 나가면 안 됩니다
            csv_field(contact.phone.as_deref().unwrap_or("")),
            csv_field(&contact.company),
            csv_field(&contact.position),
            csv_field(&tags),
            csv_field(&format_created_at(&contact.created_at)),
        ]
        .join(",");

        out.push_str(&row);
        out.push_str("\r\n");
    }

    out
}

/// 필드 하나를 RFC 4180 규칙으로 인용 처리합니다.
///
/// 쉼표, 따옴표, 줄바꿈 중 하나라도 포함하면 전체를 큰따옴표로 감싸고,
/// 내부의 큰따옴표는 두 번 겹쳐 씁니다 (`"` → `""`).
/// 그 외의 값은 그대로 내보냅니다 (불필요한 인용은 하지 않습니다).
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// DB의 ISO-8601 타임스탬프를 `YYYY-MM-DD HH:MM:SS`로 변환합니다.
///
/// 예: `2025-01-15T10:30:00.000Z` → `2025-01-15 10:30:00`
///
/// DB가 항상 strftime으로 생성한 값이라 파싱은 실패하지 않지만,
/// 만약 형식이 어긋나도 내보내기 전체를 실패시키지 않고
/// 문자열 수준에서 비슷한 모양으로 잘라 냅니다.
fn format_created_at(iso: &str) -> String {
    match DateTime::parse_from_rfc3339(iso) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => iso
            .replace('T', " ")
            .trim_end_matches('Z')
            .chars()
            .take(19)
            .collect(),
    }
}

/// 내보내기 파일명: `kontakty_<YYYY-MM-DD_HH-MM-SS>.csv` (내보내는 시점의 UTC)
pub fn export_filename() -> String {
    export_filename_at(Utc::now())
}

/// 시각을 받아 파일명을 만드는 내부 구현 — 테스트에서 고정 시각을 넣기 위해 분리
pub fn export_filename_at(when: DateTime<Utc>) -> String {
    format!("kontakty_{}.csv", when.format("%Y-%m-%d_%H-%M-%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contact, TagSummary};
    use chrono::TimeZone;

    fn contact_with_tags(tags: Vec<&str>) -> ContactResponse {
        ContactResponse::from_contact(
            Contact {
                id: "0192d3e8-0000-7000-8000-000000000001".to_string(),
                first_name: "Anna".to_string(),
                last_name: "Kowalska".to_string(),
                email: "anna@example.com".to_string(),
                phone: Some("+48 123 456 789".to_string()),
                company: "ABC Corp".to_string(),
                position: "Developer".to_string(),
                created_by: None,
                created_at: "2025-01-15T10:30:00.000Z".to_string(),
                updated_at: "2025-01-15T10:30:00.000Z".to_string(),
            },
            tags.into_iter()
                .enumerate()
                .map(|(i, name)| TagSummary {
                    id: format!("tag-{}", i),
                    name: name.to_string(),
                    color: "#3B82F6".to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn csv_starts_with_bom_then_polish_header() {
        let csv = contacts_csv(&[]);
        assert!(csv.starts_with('\u{feff}'));
        let without_bom = csv.trim_start_matches('\u{feff}');
        assert!(without_bom.starts_with(
            "Imię,Nazwisko,Email,Telefon,Firma,Stanowisko,Tagi,Data utworzenia\r\n"
        ));
    }

    #[test]
    fn row_contains_all_columns_and_reformatted_date() {
        let csv = contacts_csv(&[contact_with_tags(vec!["VIP"])]);
        let row = csv.lines().nth(1).unwrap();

        assert_eq!(
            row,
            "Anna,Kowalska,anna@example.com,+48 123 456 789,ABC Corp,Developer,VIP,2025-01-15 10:30:00"
        );
    }

    #[test]
    fn multiple_tags_are_joined_and_quoted() {
        let csv = contacts_csv(&[contact_with_tags(vec!["VIP", "Klient"])]);
        // ", "로 이어 붙인 태그 셀은 쉼표를 포함하므로 인용되어야 합니다
        assert!(csv.contains("\"VIP, Klient\""));
    }

    #[test]
    fn missing_phone_is_an_empty_cell() {
        let mut contact = contact_with_tags(vec![]);
        contact.phone = None;
        let csv = contacts_csv(&[contact]);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains("anna@example.com,,ABC Corp"));
    }

    #[test]
    fn quotes_and_commas_are_escaped_rfc4180_style() {
        let mut contact = contact_with_tags(vec![]);
        contact.company = "ABC \"Corp\", Ltd".to_string();
        let csv = contacts_csv(&[contact]);
        assert!(csv.contains("\"ABC \"\"Corp\"\", Ltd\""));
    }

    #[test]
    fn export_is_unbounded() {
        let contacts: Vec<ContactResponse> =
            (0..120).map(|_| contact_with_tags(vec![])).collect();
        let csv = contacts_csv(&contacts);
        // 헤더 1행 + 데이터 120행 — 검색의 50건 제한이 적용되면 안 됩니다
        assert_eq!(csv.lines().count(), 121);
    }

    #[test]
    fn filename_embeds_utc_timestamp() {
        let when = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 5).unwrap();
        assert_eq!(export_filename_at(when), "kontakty_2025-01-15_10-30-05.csv");
    }
}

//! # 연락처 모델 정의
//!
//! 연락처(Contact) 시스템에서 사용하는 데이터 구조체들을 정의합니다.
//! 연락처는 이 애플리케이션의 핵심 엔티티로, 이름/이메일/회사/직함 등의
//! 속성과 여러 태그를 가질 수 있습니다.
//!
//! ## 구조체 역할
//! - `Contact`: 데이터베이스의 `contacts` 테이블 한 행에 대응 (DB 조회 결과)
//! - `ContactResponse`: API 응답용 — 파생 필드(full_name, initials)와 태그 목록 포함
//! - `CreateContactRequest`: 연락처 생성 시 클라이언트가 보내는 JSON 본문
//! - `UpdateContactRequest`: 연락처 수정 시 클라이언트가 보내는 JSON 본문

use serde::{Deserialize, Serialize};

use super::tag::TagSummary;

/// 연락처 엔티티 — DB의 `contacts` 테이블 한 행(row)에 대응합니다.
///
/// # derive 매크로 설명
/// - `Serialize`/`Deserialize`: JSON ↔ 구조체 변환
/// - `sqlx::FromRow`: SQL 쿼리 결과(행)를 이 구조체로 자동 매핑합니다
/// - `Clone`: 값을 복제할 수 있게 합니다 (.clone() 메서드 제공)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contact {
    /// 연락처 고유 식별자 (UUIDv7 형식 문자열)
    pub id: String,
    /// 이름 (예: "Anna")
    pub first_name: String,
    /// 성 (예: "Kowalska")
    pub last_name: String,
    /// 이메일 주소 — 전체 연락처에서 유일해야 합니다
    pub email: String,
    /// 전화번호, 없을 수도 있으므로 Option 타입
    /// Option<T>: 값이 있으면 Some(값), 없으면 None — Rust의 null 안전 처리 방식
    pub phone: Option<String>,
    /// 회사명 (필수)
    pub company: String,
    /// 직함 (필수)
    pub position: String,
    /// 이 연락처를 생성한 사용자 ID (사용자 삭제 시 NULL로 남음)
    pub created_by: Option<String>,
    /// 생성 시각 (ISO-8601 문자열, SQLite strftime이 생성)
    pub created_at: String,
    /// 수정 시각 (ISO-8601 문자열)
    pub updated_at: String,
}

/// 연락처 API 응답 — DB 행에 파생 필드와 태그 목록을 더한 형태입니다.
///
/// `full_name`과 `initials`는 DB에 저장하지 않고 응답 생성 시점에 계산합니다.
/// 저장하면 이름 변경 시마다 함께 갱신해야 하므로, 파생 값은 항상 계산이 안전합니다.
///
/// Deserialize도 함께 derive한 이유: 캐시가 응답 구조체를 JSON 값으로 저장했다가
/// 다시 꺼내서 역직렬화하기 때문입니다 (`services::cache` 참고).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactResponse {
    pub id: String,
    /// 표시용 전체 이름: "이름 성" (예: "Anna Kowalska")
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: String,
    pub position: String,
    /// 이 연락처에 달린 태그 목록 (id, 이름, 색상만 포함한 요약형)
    pub tags: Vec<TagSummary>,
    /// 아바타 표시용 이니셜 (예: "AK") — 이름과 성의 첫 글자를 대문자로
    pub initials: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ContactResponse {
    /// DB 행(Contact)과 태그 목록으로부터 응답 구조체를 만듭니다.
    ///
    /// # 매개변수
    /// - `contact`: DB에서 조회한 연락처 행 (소유권을 가져옵니다)
    /// - `tags`: 해당 연락처에 연결된 태그 요약 목록
    ///
    /// # 반환값
    /// 파생 필드가 채워진 `ContactResponse`
    pub fn from_contact(contact: Contact, tags: Vec<TagSummary>) -> Self {
        // format! 매크로: 문자열 보간으로 새 String을 만듭니다
        let full_name = format!("{} {}", contact.first_name, contact.last_name);
        // 이니셜: 각 이름의 첫 글자를 대문자로 이어 붙입니다.
        // .chars().next(): 유니코드 문자 단위의 첫 글자 (바이트 단위가 아님!)
        // 한 글자가 여러 대문자로 변하는 언어도 있어 to_uppercase()는 반복자를 반환합니다.
        let initials = format!(
            "{}{}",
            initial_of(&contact.first_name),
            initial_of(&contact.last_name)
        );
        Self {
            id: contact.id,
            full_name,
            first_name: contact.first_name,
            last_name: contact.last_name,
            email: contact.email,
            phone: contact.phone,
            company: contact.company,
            position: contact.position,
            tags,
            initials,
            created_at: contact.created_at,
            updated_at: contact.updated_at,
        }
    }
}

/// 문자열의 첫 글자를 대문자로 반환합니다. 빈 문자열이면 빈 문자열을 반환합니다.
fn initial_of(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_default()
}

/// 연락처 생성 요청 — `POST /api/v1/contacts`의 요청 본문(body)에 해당합니다.
///
/// Serialize를 빼고 Deserialize만 derive한 이유:
/// 이 구조체는 클라이언트 → 서버 방향으로만 사용되므로
/// JSON 파싱(Deserialize)만 필요하고, JSON 생성(Serialize)은 불필요합니다.
#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: String,
    pub position: String,
    /// 생성과 동시에 연결할 태그 ID 목록 (선택)
    /// #[serde(default)]: JSON에 필드가 없으면 Vec::default() = 빈 목록으로 처리
    #[serde(default)]
    pub tags: Vec<String>,
}

/// 연락처 수정 요청 — `PUT /api/v1/contacts/{id}`의 요청 본문에 해당합니다.
///
/// PATCH가 아닌 PUT이므로 **전체 교체(full replace)** 의미입니다:
/// 모든 속성 필드가 필수이고, `tags`를 생략하면 "태그 없음"으로 교체됩니다
/// (생략 = 유지가 아닙니다).
#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: String,
    pub position: String,
    /// 교체 후 연락처가 가질 태그 ID 목록 (생략 시 빈 목록 = 모든 태그 해제)
    #[serde(default)]
    pub tags: Vec<String>,
}

//! # 태그 모델 정의
//!
//! 태그(Tag) 시스템에서 사용하는 데이터 구조체들을 정의합니다.
//! 태그는 연락처를 분류하고 검색하기 위한 색상 있는 라벨입니다 (예: "VIP", "Klient").
//!
//! ## 구조체 역할
//! - `Tag`: 데이터베이스에 저장된 태그를 표현 (응답용)
//! - `TagSummary`: 연락처 응답에 포함되는 태그 요약형 (id, 이름, 색상만)
//! - `TagWithCount`: 검색 화면용 — 태그별 연락처 개수를 함께 담습니다
//! - `CreateTagRequest` / `UpdateTagRequest`: 클라이언트가 보내는 JSON 본문

use serde::{Deserialize, Serialize};

/// 태그 엔티티 — DB의 `tags` 테이블 한 행(row)에 대응합니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    /// 태그 고유 식별자 (UUIDv7 형식 문자열)
    pub id: String,
    /// 태그 이름 (예: "VIP", "Dostawca") — 같은 사용자가 만든 태그끼리 유일
    pub name: String,
    /// 태그 색상 코드 (`#RGB` 또는 `#RRGGBB`, 기본값 "#3B82F6")
    pub color: String,
    /// 이 태그를 생성한 사용자 ID (사용자 삭제 시 NULL로 남음)
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// 연락처 응답에 내장되는 태그 요약형입니다.
///
/// 연락처 목록 한 건마다 태그 전체 행(타임스탬프 포함)을 싣는 대신
/// 화면 표시에 필요한 세 필드만 담습니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagSummary {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// 태그와 해당 태그가 달린 연락처 개수 — `GET /api/v1/search/available-tags` 응답용.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagWithCount {
    pub id: String,
    pub name: String,
    pub color: String,
    /// 이 태그가 연결된 연락처 수 (COUNT 집계 결과이므로 i64)
    pub contacts_count: i64,
}

/// 태그 생성 요청 — `POST /api/v1/tags`의 요청 본문(body)에 해당합니다.
#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    /// 생성할 태그 이름 (필수)
    pub name: String,
    /// 태그 색상 코드 (선택 — 생략 시 기본 색상 사용)
    pub color: Option<String>,
}

/// 태그 수정 요청 — `PUT /api/v1/tags/{id}`의 요청 본문에 해당합니다.
///
/// 이름은 항상 교체하고(필수), 색상은 보낸 경우에만 교체합니다.
#[derive(Debug, Deserialize)]
pub struct UpdateTagRequest {
    /// 변경할 태그 이름 (필수)
    pub name: String,
    /// 변경할 태그 색상 (None이면 기존 색상 유지)
    pub color: Option<String>,
}

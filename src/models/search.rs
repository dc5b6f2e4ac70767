//! # 검색 관련 모델 정의
//!
//! 다기준 검색, 자동완성, 그룹화에서 사용하는 구조체들을 정의합니다.
//!
//! ## 구조체 역할
//! - `ContactFilter`: 검색/목록/내보내기 엔드포인트가 공유하는 쿼리 파라미터
//! - `TagFilter`: `GET /search/by-tags` 전용 쿼리 파라미터
//! - `TagMode`: 태그 일치 방식 (any = OR / all = AND)
//! - `Suggestion`: 자동완성 제안 한 건
//! - `CompanyGroup` / `PositionGroup`: 그룹화 결과 한 묶음

use serde::{Deserialize, Serialize};

use super::contact::ContactResponse;

/// 연락처 검색/필터 쿼리 파라미터입니다.
///
/// `GET /api/v1/search`, `GET /api/v1/contacts`, `GET /api/v1/contacts/export`,
/// 그룹화 엔드포인트가 모두 이 구조체를 공유합니다.
///
/// `tags[]=a&tags[]=b` 같은 반복 파라미터는 axum 기본 `Query`가 지원하지 않으므로
/// `axum_extra::extract::Query`로 추출합니다 (라우트 핸들러 참고).
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ContactFilter {
    /// 자유 텍스트 검색어 — 이름/성/이메일/회사/직함/전체이름/태그명을 대상으로 부분 일치
    pub query: Option<String>,
    /// 회사명 정확 일치 필터
    pub company: Option<String>,
    /// 직함 정확 일치 필터
    pub position: Option<String>,
    /// 태그 ID 목록 (`tags[]` 반복 파라미터)
    /// #[serde(rename)]: JSON/쿼리스트링의 키 이름이 Rust 필드명과 다를 때 매핑합니다
    #[serde(rename = "tags[]", default)]
    pub tags: Vec<String>,
    /// 태그 일치 방식 원본 값 ("any" | "all", 그 외 값은 any로 해석)
    pub tag_search_mode: Option<String>,
}

impl ContactFilter {
    /// 이 필터의 태그 일치 방식을 해석합니다. 알 수 없는 값은 에러가 아니라 Any입니다.
    pub fn tag_mode(&self) -> TagMode {
        TagMode::from_param(self.tag_search_mode.as_deref())
    }

    /// 필터 조건이 하나도 없는지 확인합니다 (빈 문자열은 조건 없음으로 취급).
    pub fn is_empty(&self) -> bool {
        non_empty(&self.query).is_none()
            && non_empty(&self.company).is_none()
            && non_empty(&self.position).is_none()
            && self.tags.is_empty()
    }
}

/// `Some("")`과 `Some("  ")`을 None으로 정규화합니다.
/// 클라이언트가 `?query=`처럼 빈 값을 보내는 경우가 흔하기 때문입니다.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    match value {
        Some(s) if !s.trim().is_empty() => Some(s.trim()),
        _ => None,
    }
}

/// `GET /api/v1/search/by-tags` 전용 쿼리 파라미터입니다.
/// 파라미터 이름이 일반 검색(`tags[]`/`tag_search_mode`)과 다릅니다.
#[derive(Debug, Default, Deserialize)]
pub struct TagFilter {
    /// 태그 ID 목록 (`tag_ids[]` 반복 파라미터)
    #[serde(rename = "tag_ids[]", default)]
    pub tag_ids: Vec<String>,
    /// 태그 일치 방식 ("any" | "all")
    pub search_mode: Option<String>,
}

/// 태그 일치 방식 — 여러 태그를 지정했을 때의 결합 방법입니다.
///
/// #[derive(Default)] + #[default]: TagMode::default()가 Any를 반환하게 합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagMode {
    /// 지정한 태그 중 **하나라도** 달려 있으면 일치 (OR 결합)
    #[default]
    Any,
    /// 지정한 태그가 **전부** 달려 있어야 일치 (AND 결합)
    All,
}

impl TagMode {
    /// 쿼리 파라미터 값을 TagMode로 해석합니다.
    ///
    /// "all"만 All로 인정하고, 나머지("any", 오타, 빈 값, 누락)는 전부 Any입니다.
    /// 잘못된 값을 400 에러로 돌려주지 않는 이유: 검색 UI의 드롭다운 외 입력은
    /// 전부 기본 동작으로 흡수하는 편이 사용자에게 관대하기 때문입니다.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("all") => TagMode::All,
            _ => TagMode::Any,
        }
    }

    /// 로그/응답 표기용 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            TagMode::Any => "any",
            TagMode::All => "all",
        }
    }
}

/// 자동완성 제안 한 건 — `GET /api/v1/search/suggestions` 응답의 배열 요소입니다.
///
/// `type` 필드는 Rust 예약어라 필드명을 `kind`로 하고 serde rename으로 맞춥니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// 제안 종류: "name" | "company" | "position" | "tag"
    #[serde(rename = "type")]
    pub kind: String,
    /// 선택 시 검색어로 사용할 값
    pub value: String,
    /// 화면에 표시할 라벨
    pub label: String,
    /// 연락처 이름 제안일 때만 포함되는 연락처 ID
    /// skip_serializing_if: 값이 None이면 JSON에서 키 자체를 생략합니다
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// 태그 제안일 때만 포함되는 태그 색상
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// 회사별 그룹 한 묶음 — `GET /api/v1/search/group-by-company` 응답의 배열 요소입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyGroup {
    /// 그룹 키 (회사명 정확 값)
    pub company: String,
    /// 이 그룹에 속한 연락처 수 (항상 contacts.len()과 같음)
    pub count: usize,
    pub contacts: Vec<ContactResponse>,
}

/// 직함별 그룹 한 묶음 — `GET /api/v1/search/group-by-position` 응답의 배열 요소입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionGroup {
    /// 그룹 키 (직함 정확 값)
    pub position: String,
    pub count: usize,
    pub contacts: Vec<ContactResponse>,
}

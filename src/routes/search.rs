//! # 검색 API 라우트 핸들러
//!
//! 다기준 검색, 자동완성, 그룹화, 필터 드롭다운용 목록 엔드포인트를 제공합니다.
//! 모든 조회는 캐시를 먼저 확인하는 **cache-aside** 패턴으로 동작합니다:
//! 캐시에 있으면 그대로 반환하고, 없으면 DB에서 채워 넣습니다.
//!
//! ## 엔드포인트
//! | 메서드 | 경로 | 설명 |
//! |--------|------|------|
//! | GET | /api/v1/search | 다기준 검색 (최대 50건) |
//! | GET | /api/v1/search/suggestions | 자동완성 제안 (최대 15건) |
//! | GET | /api/v1/search/by-tags | 태그 전용 검색 (any/all) |
//! | GET | /api/v1/search/group-by-company | 검색 결과를 회사별로 묶음 |
//! | GET | /api/v1/search/group-by-position | 검색 결과를 직함별로 묶음 |
//! | GET | /api/v1/search/available-tags | 전체 태그 + 연락처 수 |
//! | GET | /api/v1/search/companies | 회사명 목록 (드롭다운용) |
//! | GET | /api/v1/search/positions | 직함 목록 (드롭다운용) |
//!
//! ## 사용 예시
//! ```text
//! GET /api/v1/search?query=anna&company=ABC%20Corp
//! GET /api/v1/search?tags[]=<id1>&tags[]=<id2>&tag_search_mode=all
//! GET /api/v1/search/suggestions?query=ko
//! ```

use crate::{
    db,
    error::AppError,
    models::*,
    routes::contacts::AppState,
    services::{cache, grouping},
};
use axum::{extract::State, Json};
use axum_extra::extract::Query; // 반복 키(tags[]=a&tags[]=b)를 Vec으로 파싱하는 Query
use serde::Deserialize;
use serde_json::{json, Value};

/// 화면 검색의 반환 행 수 상한입니다.
/// 이 상한을 넘는 결과는 잘리며, 내보내기 경로만 상한 없이 동작합니다.
const RESULT_LIMIT: i64 = 50;

/// 필터에 해당하는 검색 결과를 캐시 우선으로 조회합니다.
///
/// 검색/목록/그룹화 핸들러가 모두 이 함수를 거치므로, 같은 필터의 조회는
/// 캐시 키(`contacts:search:<해시>`)를 공유합니다.
///
/// ## 일관성
/// 쓰기가 캐시를 지우지 않으므로, 변경 직후 최대 5분간은 이전 결과가
/// 반환될 수 있습니다 (TTL 만료로만 갱신).
pub async fn cached_search(
    state: &AppState,
    filter: &ContactFilter,
) -> Result<Vec<ContactResponse>, AppError> {
    let key = cache::search_key(filter);
    if let Some(hit) = state.cache.get::<Vec<ContactResponse>>(&key).await {
        return Ok(hit);
    }

    let rows = db::search_contacts(&state.pool, filter, Some(RESULT_LIMIT)).await?;
    let contacts = db::attach_tags(&state.pool, rows).await?;
    state.cache.put(&key, &contacts, cache::SEARCH_TTL).await;

    Ok(contacts)
}

/// `GET /search` — 다기준 검색을 수행합니다.
///
/// 자유 텍스트(`query`) + 회사/직함 정확 일치 + 태그 필터를 AND로 결합합니다.
/// 조건이 하나도 없으면 전체 목록(상한 50건)을 반환합니다.
///
/// # 반환값
/// 프런트엔드 목록 컴포넌트가 기대하는 고정 페이지 형태의 JSON:
/// `{ "success": true, "contacts": [...], "total": n,
///    "per_page": 50, "current_page": 1, "last_page": 1 }`
/// 결과가 상한으로 잘려도 total은 반환된 행 수입니다.
pub async fn search(
    State(state): State<AppState>,
    Query(filter): Query<ContactFilter>,
) -> Result<Json<Value>, AppError> {
    let contacts = cached_search(&state, &filter).await?;
    let total = contacts.len();

    Ok(Json(json!({
        "success": true,
        "contacts": contacts,
        "total": total,
        "per_page": RESULT_LIMIT,
        "current_page": 1,
        "last_page": 1,
    })))
}

/// `GET /search/suggestions`의 쿼리 파라미터입니다.
#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    /// 자동완성 검색어 — 2글자 미만이면 빈 결과
    #[serde(default)]
    pub query: String,
}

/// `GET /search/suggestions` — 자동완성 제안을 반환합니다.
///
/// 이름 5건 → 회사 5건 → 직함 5건 → 태그 5건 순서로 이어 붙여
/// 최대 15건을 반환합니다. 2글자 미만의 검색어는 캐시도 DB도 거치지 않고
/// 바로 빈 목록입니다.
pub async fn suggestions(
    State(state): State<AppState>,
    Query(params): Query<SuggestQuery>,
) -> Result<Json<Value>, AppError> {
    if params.query.trim().chars().count() < 2 {
        return Ok(Json(json!({ "success": true, "suggestions": [] })));
    }

    let key = cache::suggest_key(&params.query);
    let suggestions = match state.cache.get::<Vec<Suggestion>>(&key).await {
        Some(hit) => hit,
        None => {
            let found = db::suggestions(&state.pool, &params.query).await?;
            state.cache.put(&key, &found, cache::SEARCH_TTL).await;
            found
        }
    };

    Ok(Json(json!({ "success": true, "suggestions": suggestions })))
}

/// `GET /search/by-tags` — 태그만으로 검색합니다.
///
/// `tag_ids[]`로 태그를 지정하고 `search_mode`로 결합 방식을 고릅니다:
/// - `any`(기본): 지정 태그 중 하나라도 달린 연락처
/// - `all`: 지정 태그가 전부 달린 연락처
///
/// 응답에는 실제로 적용된 모드가 함께 실립니다 (오타는 any로 해석).
pub async fn search_by_tags(
    State(state): State<AppState>,
    Query(params): Query<TagFilter>,
) -> Result<Json<Value>, AppError> {
    let mode = TagMode::from_param(params.search_mode.as_deref());
    let filter = ContactFilter {
        tags: params.tag_ids,
        tag_search_mode: params.search_mode,
        ..Default::default()
    };

    let contacts = cached_search(&state, &filter).await?;
    let total = contacts.len();

    Ok(Json(json!({
        "success": true,
        "contacts": contacts,
        "total": total,
        "search_mode": mode.as_str(),
    })))
}

/// `GET /search/group-by-company` — 검색 결과를 회사별로 묶어 반환합니다.
///
/// 검색과 같은 필터를 받아 같은 캐시를 공유하고, 묶는 작업은
/// 메모리에서 수행합니다 (`services::grouping`).
pub async fn group_by_company(
    State(state): State<AppState>,
    Query(filter): Query<ContactFilter>,
) -> Result<Json<Value>, AppError> {
    let contacts = cached_search(&state, &filter).await?;
    let total = contacts.len();
    let groups = grouping::group_by_company(contacts);

    Ok(Json(json!({ "success": true, "groups": groups, "total": total })))
}

/// `GET /search/group-by-position` — 검색 결과를 직함별로 묶어 반환합니다.
pub async fn group_by_position(
    State(state): State<AppState>,
    Query(filter): Query<ContactFilter>,
) -> Result<Json<Value>, AppError> {
    let contacts = cached_search(&state, &filter).await?;
    let total = contacts.len();
    let groups = grouping::group_by_position(contacts);

    Ok(Json(json!({ "success": true, "groups": groups, "total": total })))
}

/// `GET /search/available-tags` — 전체 태그를 연락처 수와 함께 반환합니다.
///
/// 태그 필터 UI가 쓰는 목록이므로 1시간 캐시(`contacts:available_tags`)를 탑니다.
pub async fn available_tags(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let tags = match state
        .cache
        .get::<Vec<TagWithCount>>(cache::KEY_AVAILABLE_TAGS)
        .await
    {
        Some(hit) => hit,
        None => {
            let tags = db::available_tags(&state.pool).await?;
            state
                .cache
                .put(cache::KEY_AVAILABLE_TAGS, &tags, cache::LIST_TTL)
                .await;
            tags
        }
    };

    Ok(Json(json!({ "success": true, "tags": tags })))
}

/// `GET /search/companies` — 회사명 목록(중복 제거, 이름순)을 반환합니다.
pub async fn companies(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let companies = match state.cache.get::<Vec<String>>(cache::KEY_COMPANIES).await {
        Some(hit) => hit,
        None => {
            let companies = db::distinct_companies(&state.pool).await?;
            state
                .cache
                .put(cache::KEY_COMPANIES, &companies, cache::LIST_TTL)
                .await;
            companies
        }
    };

    Ok(Json(json!({ "success": true, "companies": companies })))
}

/// `GET /search/positions` — 직함 목록(중복 제거, 이름순)을 반환합니다.
pub async fn positions(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let positions = match state.cache.get::<Vec<String>>(cache::KEY_POSITIONS).await {
        Some(hit) => hit,
        None => {
            let positions = db::distinct_positions(&state.pool).await?;
            state
                .cache
                .put(cache::KEY_POSITIONS, &positions, cache::LIST_TTL)
                .await;
            positions
        }
    };

    Ok(Json(json!({ "success": true, "positions": positions })))
}

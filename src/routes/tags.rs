//! # 태그 API 라우트 핸들러
//!
//! 태그 CRUD를 처리하는 HTTP 핸들러 함수들입니다.
//! 연락처-태그 연결은 별도 엔드포인트가 아니라 연락처 생성/수정 요청의
//! `tags` 필드로 함께 처리됩니다 (routes/contacts 참고).
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | GET | /api/v1/tags | `list_tags` | 전체 태그 목록 |
//! | POST | /api/v1/tags | `create_tag` | 새 태그 생성 (인증 필요) |
//! | PUT | /api/v1/tags/{id} | `update_tag` | 태그 수정 (인증 필요) |
//! | DELETE | /api/v1/tags/{id} | `delete_tag` | 태그 삭제 (인증 필요) |
//!
//! ## 이름 유일성 규칙
//! 태그 이름은 **같은 사용자가 만든 태그끼리** 유일합니다.
//! 서로 다른 사용자는 같은 이름의 태그를 각자 가질 수 있습니다.

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::contacts::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

/// 색상을 생략하고 만든 태그에 적용되는 기본 색상입니다.
const DEFAULT_TAG_COLOR: &str = "#3B82F6";

/// 전체 태그 목록을 조회합니다.
///
/// `GET /api/v1/tags` → `{ "tags": [...] }` (이름순 정렬)
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let tags = db::list_tags(&state.pool).await?;
    Ok(Json(json!({ "tags": tags })))
}

/// 새 태그를 생성합니다.
///
/// `POST /api/v1/tags` + `{ "name": "...", "color": "#RRGGBB" }`
///
/// - 이름이 비어 있으면 400
/// - 색상이 `#RGB`/`#RRGGBB` 16진수 형식이 아니면 400 (생략 시 기본 색상)
/// - 같은 사용자의 태그 중 같은 이름이 이미 있으면 409
pub async fn create_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateTagRequest>,
) -> Result<Json<Tag>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Tag name is required".to_string()));
    }

    let color = req.color.as_deref().unwrap_or(DEFAULT_TAG_COLOR);
    if !valid_color(color) {
        return Err(AppError::BadRequest(
            "Color must be a hex code like #3B82F6".to_string(),
        ));
    }

    if db::tag_name_taken(&state.pool, &req.name, Some(&user.user_id), None).await? {
        return Err(AppError::Conflict("Tag name already exists".to_string()));
    }

    let id = uuid::Uuid::now_v7().to_string();
    let tag = db::create_tag(&state.pool, &id, &req.name, color, Some(&user.user_id)).await?;
    Ok(Json(tag))
}

/// 태그 정보를 수정합니다.
///
/// `PUT /api/v1/tags/{id}` + `{ "name": "...", "color": "#RRGGBB" }`
///
/// 이름은 필수이고, 색상은 보낸 경우에만 교체됩니다.
/// 이름 유일성은 수정하는 사람이 아니라 **태그를 만든 사용자** 기준으로
/// 검사합니다 — 태그는 항상 만든 사람의 이름 공간에 속합니다.
pub async fn update_tag(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateTagRequest>,
) -> Result<Json<Tag>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Tag name is required".to_string()));
    }
    if let Some(color) = req.color.as_deref() {
        if !valid_color(color) {
            return Err(AppError::BadRequest(
                "Color must be a hex code like #3B82F6".to_string(),
            ));
        }
    }

    let current = db::get_tag(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    if db::tag_name_taken(&state.pool, &req.name, current.created_by.as_deref(), Some(&id)).await? {
        return Err(AppError::Conflict("Tag name already exists".to_string()));
    }

    let tag = db::update_tag(&state.pool, &id, &req.name, req.color.as_deref())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(tag))
}

/// 태그를 삭제합니다.
///
/// `DELETE /api/v1/tags/{id}` → `204 No Content`
///
/// 연락처와의 연결(contact_tag)도 함께 삭제되지만, 연락처 자체는 남습니다.
pub async fn delete_tag(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let deleted = db::delete_tag(&state.pool, &id).await?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// 색상 코드가 `#RGB` 또는 `#RRGGBB` 16진수 형식인지 검사합니다.
fn valid_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(hex) => {
            (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

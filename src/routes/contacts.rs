//! # 연락처(Contact) 라우트 핸들러
//!
//! 연락처의 CRUD(생성/조회/수정/삭제)와 CSV 내보내기, QR 코드,
//! vCard 다운로드를 처리하는 HTTP 핸들러 함수들입니다.
//!
//! ## 엔드포인트
//! - `GET    /api/v1/contacts`            → 연락처 목록 조회 (검색 필터 공유)
//! - `POST   /api/v1/contacts`            → 새 연락처 생성 (인증 필요)
//! - `GET    /api/v1/contacts/export`     → 필터 적용된 CSV 다운로드
//! - `GET    /api/v1/contacts/{id}`       → 단일 연락처 조회
//! - `PUT    /api/v1/contacts/{id}`       → 연락처 수정 — 전체 교체 (인증 필요)
//! - `DELETE /api/v1/contacts/{id}`       → 연락처 삭제 (인증 필요)
//! - `GET    /api/v1/contacts/{id}/qr`    → vCard QR 코드 (SVG 또는 JSON)
//! - `GET    /api/v1/contacts/{id}/vcard` → vCard(.vcf) 다운로드
//!
//! ## Axum 핸들러 패턴
//! Axum 핸들러는 **Extractor(추출기)**를 매개변수로 받습니다:
//! - `State(state)`: 앱 전역 상태 (DB 풀, 캐시, 설정)
//! - `Path(id)`: URL 경로 파라미터 (예: /contacts/{id}에서 id)
//! - `Query(filter)`: URL 쿼리 파라미터 — 여기서는 `tags[]` 같은 반복 키를
//!   지원하는 `axum_extra`의 Query를 사용합니다 (기본 Query는 미지원)
//! - `Json(body)`: 요청 본문을 JSON으로 파싱하여 구조체로 변환
//! - `AuthUser`: Authorization 헤더의 JWT를 검증하고 사용자 ID를 추출
//!   (쓰기 엔드포인트에만 붙입니다 — 조회는 공개)

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::search::cached_search, // 검색 라우트와 공유하는 캐시 조회 헬퍼
    services::{
        cache::{self, Cache},
        export, vcard,
    },
};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::Query;
use serde_json::{json, Value};
use sqlx::SqlitePool;

// #[derive(Clone)]: AppState가 Clone 트레이트를 구현하게 합니다.
// Axum의 State Extractor는 내부적으로 AppState를 clone하므로 필수입니다.
// SqlitePool과 Cache는 내부에 Arc를 사용하므로 clone해도 실제 자원이 복제되지 않습니다.

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// Axum의 의존성 주입(Dependency Injection) 메커니즘입니다.
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀 (내부적으로 Arc로 공유)
    pub pool: SqlitePool,
    /// 조회 결과를 TTL 기반으로 보관하는 인메모리 캐시
    pub cache: Cache,
    /// JWT 토큰 서명용 비밀키
    pub jwt_secret: String,
}

/// `GET /contacts` — 연락처 목록을 조회합니다.
///
/// 검색 엔드포인트와 같은 필터 파라미터(`query`, `company`, `position`,
/// `tags[]`, `tag_search_mode`)를 받습니다. 파라미터가 없으면 전체 목록입니다.
/// 결과는 검색과 같은 캐시 키를 공유하므로, 같은 조건의 목록/검색 조회는
/// 한 번만 DB에 내려갑니다.
///
/// # 반환값
/// `{ "contacts": [...] }` 형태의 JSON — 각 항목에 태그와 파생 필드 포함
pub async fn list_contacts(
    State(state): State<AppState>,
    Query(filter): Query<ContactFilter>,
) -> Result<Json<Value>, AppError> {
    let contacts = cached_search(&state, &filter).await?;
    Ok(Json(json!({ "contacts": contacts })))
}

/// `GET /contacts/{id}` — 단일 연락처를 조회합니다.
///
/// # Extractor
/// - `Path(id)`: URL의 `{id}` 부분을 String으로 추출합니다.
pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContactResponse>, AppError> {
    let contact = db::get_contact(&state.pool, &id)
        .await?
        // .ok_or(): Option이 None이면 지정한 에러를 반환합니다.
        // 연락처를 찾지 못하면 404 NotFound 응답이 됩니다.
        .ok_or(AppError::NotFound)?;
    let tags = db::tags_for_contact(&state.pool, &id).await?;

    Ok(Json(ContactResponse::from_contact(contact, tags)))
}

/// `POST /contacts` — 새 연락처를 생성합니다.
///
/// 검증 → 중복 확인 → 트랜잭션 저장(속성 + 태그 연결) 순서로 진행합니다.
///
/// # 검증 규칙
/// - 이름/성/회사/직함: 공백 제외 비어 있으면 400
/// - 이메일: `@` 미포함이면 400, 이미 등록된 주소면 409
/// - 태그: 존재하지 않는 태그 ID가 섞여 있으면 400
/// - 전화번호: 빈 문자열은 "없음"으로 정규화
pub async fn create_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut req): Json<CreateContactRequest>,
) -> Result<Json<ContactResponse>, AppError> {
    validate_contact_fields(&req.first_name, &req.last_name, &req.email, &req.company, &req.position)?;
    req.phone = normalize_phone(req.phone.take());
    ensure_tags_exist(&state.pool, &req.tags).await?;

    if db::email_taken(&state.pool, &req.email, None).await? {
        return Err(AppError::Conflict(
            "A contact with this email already exists".to_string(),
        ));
    }

    // UUIDv7: 시간순 정렬 가능한 UUID — 생성 순서대로 ID가 증가합니다
    let id = uuid::Uuid::now_v7().to_string();
    let contact = db::create_contact(&state.pool, &id, &req, Some(&user.user_id)).await?;
    let tags = db::tags_for_contact(&state.pool, &id).await?;

    Ok(Json(ContactResponse::from_contact(contact, tags)))
}

/// `PUT /contacts/{id}` — 연락처를 수정합니다.
///
/// PUT이므로 **전체 교체**입니다: 모든 속성이 요청 값으로 바뀌고,
/// 태그 집합도 요청의 `tags` 목록으로 동기화됩니다 (생략 = 전부 해제).
pub async fn update_contact(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    Json(mut req): Json<UpdateContactRequest>,
) -> Result<Json<ContactResponse>, AppError> {
    // 존재 확인을 먼저 — 없는 연락처에 대한 검증/중복 에러로 404를 가리지 않습니다
    let _ = db::get_contact(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    validate_contact_fields(&req.first_name, &req.last_name, &req.email, &req.company, &req.position)?;
    req.phone = normalize_phone(req.phone.take());
    ensure_tags_exist(&state.pool, &req.tags).await?;

    // 자기 자신의 이메일은 중복이 아닙니다 (exclude_id로 제외)
    if db::email_taken(&state.pool, &req.email, Some(&id)).await? {
        return Err(AppError::Conflict(
            "A contact with this email already exists".to_string(),
        ));
    }

    let contact = db::update_contact(&state.pool, &id, &req)
        .await?
        .ok_or(AppError::NotFound)?;
    let tags = db::tags_for_contact(&state.pool, &id).await?;

    Ok(Json(ContactResponse::from_contact(contact, tags)))
}

/// `DELETE /contacts/{id}` — 연락처를 삭제합니다. 성공 시 `204 No Content`.
///
/// 태그 연결(contact_tag)도 함께 지워지지만 태그 자체는 남습니다.
pub async fn delete_contact(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let deleted = db::delete_contact(&state.pool, &id).await?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /contacts/export` — 필터에 걸린 연락처 전체를 CSV 파일로 내려보냅니다.
///
/// 검색과 같은 필터를 받지만 50건 상한이 **없습니다** — 내보내기는
/// 조건에 맞는 전체 행을 담아야 하기 때문입니다. 행 집합은 내보내기
/// 전용 캐시 키(`contacts:export:<해시>`)로 5분간 보관합니다.
///
/// 응답 헤더:
/// - `Content-Type: text/csv; charset=UTF-8`
/// - `Content-Disposition: attachment; filename="kontakty_<타임스탬프>.csv"`
pub async fn export_contacts(
    State(state): State<AppState>,
    Query(filter): Query<ContactFilter>,
) -> Result<Response, AppError> {
    let key = cache::export_key(&filter);
    let contacts = match state.cache.get::<Vec<ContactResponse>>(&key).await {
        Some(hit) => hit,
        None => {
            // limit: None — 내보내기는 전체 행
            let rows = db::search_contacts(&state.pool, &filter, None).await?;
            let contacts = db::attach_tags(&state.pool, rows).await?;
            state.cache.put(&key, &contacts, cache::SEARCH_TTL).await;
            contacts
        }
    };

    let csv = export::contacts_csv(&contacts);
    let filename = export::export_filename();
    tracing::info!(rows = contacts.len(), %filename, "exporting contacts to CSV");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=UTF-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response())
}

/// `GET /contacts/{id}/qr` — 연락처 vCard를 담은 QR 코드를 반환합니다.
///
/// 호출 방식에 따라 두 형태로 응답합니다:
/// - 일반 요청: `image/svg+xml` 본문으로 SVG를 그대로 반환
/// - AJAX 요청(`X-Requested-With: XMLHttpRequest` 헤더): 모달에 바로 넣을 수
///   있도록 data URL을 담은 JSON을 반환
pub async fn contact_qr(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let contact = db::get_contact(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    let svg = vcard::vcard_qr_svg(&contact)?;

    let is_ajax = headers
        .get("X-Requested-With")
        .and_then(|value| value.to_str().ok())
        .map(|value| value == "XMLHttpRequest")
        .unwrap_or(false);

    if is_ajax {
        let body = json!({
            "success": true,
            "qr_code": vcard::svg_data_url(&svg),
            "contact": {
                "id": contact.id,
                "full_name": format!("{} {}", contact.first_name, contact.last_name),
            }
        });
        return Ok(Json(body).into_response());
    }

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

/// `GET /contacts/{id}/vcard` — 연락처를 vCard(.vcf) 파일로 내려보냅니다.
///
/// 파일명은 `<이름>_<성>.vcf` 형태입니다 (예: `Anna_Kowalska.vcf`).
pub async fn contact_vcard(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let contact = db::get_contact(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    let body = vcard::contact_vcard(&contact);
    let filename = vcard::vcard_filename(&contact);

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "text/vcard; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

/// 연락처 생성/수정 공통 검증 — 실패 시 어떤 필드가 문제인지 담은 400 에러.
fn validate_contact_fields(
    first_name: &str,
    last_name: &str,
    email: &str,
    company: &str,
    position: &str,
) -> Result<(), AppError> {
    if first_name.trim().is_empty() {
        return Err(AppError::BadRequest("First name is required".to_string()));
    }
    if last_name.trim().is_empty() {
        return Err(AppError::BadRequest("Last name is required".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if company.trim().is_empty() {
        return Err(AppError::BadRequest("Company is required".to_string()));
    }
    if position.trim().is_empty() {
        return Err(AppError::BadRequest("Position is required".to_string()));
    }
    Ok(())
}

/// 빈 문자열/공백뿐인 전화번호를 "없음"(None)으로 정규화합니다.
fn normalize_phone(phone: Option<String>) -> Option<String> {
    phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
}

/// 요청의 태그 ID가 전부 실제로 존재하는지 확인합니다.
/// 없는 ID가 섞여 있으면 해당 ID들을 나열한 400 에러를 반환합니다.
async fn ensure_tags_exist(pool: &SqlitePool, tags: &[String]) -> Result<(), AppError> {
    if tags.is_empty() {
        return Ok(());
    }

    let existing = db::existing_tag_ids(pool, tags).await?;
    let missing: Vec<String> = tags
        .iter()
        .filter(|id| !existing.contains(*id))
        .cloned()
        .collect();

    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Unknown tag ids: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

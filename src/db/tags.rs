//! # 태그 데이터베이스 쿼리 모듈
//!
//! 태그 CRUD를 담당하는 SQL 쿼리 함수들입니다.
//! 모든 함수는 `SqlitePool` 참조를 받아 비동기로 실행됩니다.
//!
//! ## 이름 유일성 규칙
//! 태그 이름은 **만든 사용자별로** 유일합니다. 사용자 A와 B가 각자
//! "VIP" 태그를 가질 수 있습니다. DB UNIQUE 제약이 아니라
//! 애플리케이션에서 `tag_name_taken`으로 검사합니다.

use crate::error::AppError;
use crate::models::*;
use sqlx::SqlitePool;

/// 모든 태그를 이름순으로 조회합니다.
///
/// `sqlx::query_as::<_, Tag>(sql)` 설명:
/// - `query_as`는 SQL 결과를 지정한 구조체(Tag)로 자동 변환합니다
/// - `<_, Tag>`에서 `_`는 DB 드라이버(SQLite)를 컴파일러가 추론하게 하고,
///   `Tag`는 결과를 매핑할 대상 구조체입니다
/// - `fetch_all`은 모든 행을 Vec으로 반환합니다
pub async fn list_tags(pool: &SqlitePool) -> Result<Vec<Tag>, AppError> {
    let tags = sqlx::query_as::<_, Tag>(
        "SELECT id, name, color, created_by, created_at, updated_at FROM tags ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(tags)
}

/// ID로 태그 하나를 조회합니다.
///
/// `fetch_optional`은 결과가 0행이면 None, 1행이면 Some(Tag)을 반환합니다.
pub async fn get_tag(pool: &SqlitePool, id: &str) -> Result<Option<Tag>, AppError> {
    let tag = sqlx::query_as::<_, Tag>(
        "SELECT id, name, color, created_by, created_at, updated_at FROM tags WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(tag)
}

/// 같은 사용자가 이미 이 이름의 태그를 가지고 있는지 확인합니다.
///
/// # 매개변수
/// - `created_by`: 태그를 만들려는/수정하려는 사용자 ID
/// - `exclude_id`: 수정 시 자기 자신을 제외하기 위한 태그 ID
///   (없으면 None — 생성 시에는 제외할 태그가 없습니다)
///
/// `created_by IS ?`: SQLite의 IS 연산자는 NULL끼리도 같다고 판단하는
/// NULL-safe 비교라서, 생성자 없는(NULL) 태그끼리의 중복도 잡아냅니다.
pub async fn tag_name_taken(
    pool: &SqlitePool,
    name: &str,
    created_by: Option<&str>,
    exclude_id: Option<&str>,
) -> Result<bool, AppError> {
    let count: (i64,) = if let Some(exclude) = exclude_id {
        sqlx::query_as(
            "SELECT COUNT(*) FROM tags WHERE name = ? AND created_by IS ? AND id != ?",
        )
        .bind(name)
        .bind(created_by)
        .bind(exclude)
        .fetch_one(pool)
        .await?
    } else {
        sqlx::query_as("SELECT COUNT(*) FROM tags WHERE name = ? AND created_by IS ?")
            .bind(name)
            .bind(created_by)
            .fetch_one(pool)
            .await?
    };

    Ok(count.0 > 0)
}

/// 새 태그를 생성하고 생성된 태그를 반환합니다.
///
/// 색상 기본값 처리와 유효성 검사는 라우트 핸들러가 이미 끝낸 상태이므로,
/// 여기서는 확정된 값을 그대로 저장합니다.
pub async fn create_tag(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    color: &str,
    created_by: Option<&str>,
) -> Result<Tag, AppError> {
    sqlx::query("INSERT INTO tags (id, name, color, created_by) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(color)
        .bind(created_by) // Option<&str>: None이면 SQL NULL로 저장됩니다
        .execute(pool)
        .await?;

    // 생성 직후 조회하여 완전한 Tag 객체(타임스탬프 포함)를 반환합니다
    get_tag(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created tag".to_string()))
}

/// 태그를 수정합니다. 이름은 항상 교체하고, 색상은 Some일 때만 교체합니다.
///
/// # 반환값
/// - `Ok(Some(Tag))`: 수정 성공, 변경된 태그 반환
/// - `Ok(None)`: 해당 ID의 태그가 존재하지 않음
pub async fn update_tag(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    color: Option<&str>,
) -> Result<Option<Tag>, AppError> {
    // 먼저 태그 존재 여부를 확인합니다
    if get_tag(pool, id).await?.is_none() {
        return Ok(None); // 404 처리를 라우트 핸들러에 위임
    }

    if let Some(color) = color {
        sqlx::query(
            "UPDATE tags SET name = ?, color = ?, \
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
        )
        .bind(name)
        .bind(color)
        .bind(id)
        .execute(pool)
        .await?;
    } else {
        sqlx::query(
            "UPDATE tags SET name = ?, \
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
        )
        .bind(name)
        .bind(id)
        .execute(pool)
        .await?;
    }

    // 수정 후 최신 상태를 조회하여 반환
    get_tag(pool, id).await
}

/// 태그를 삭제합니다 — 연락처와의 연결 해제와 태그 삭제를 한 트랜잭션으로 묶습니다.
///
/// 태그를 지워도 연락처 자체는 절대 지워지지 않습니다. 사라지는 것은
/// `contact_tag`의 연결 행들뿐입니다.
///
/// ## 반환값
/// - `true`: 삭제 성공
/// - `false`: 해당 ID의 태그가 존재하지 않음
pub async fn delete_tag(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    // pool.begin(): 트랜잭션 시작. tx가 commit 없이 버려지면(drop) 자동 롤백됩니다.
    let mut tx = pool.begin().await?;

    // &mut *tx: 트랜잭션 안에서 쿼리를 실행할 때의 executor 형태입니다
    sqlx::query("DELETE FROM contact_tag WHERE tag_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(result.rows_affected() > 0)
}

/// 주어진 ID 목록 중 실제로 존재하는 태그 ID만 돌려줍니다.
///
/// 연락처 생성/수정 요청의 `tags` 배열을 저장하기 전에,
/// 없는 태그 ID가 섞여 있는지 검사할 때 사용합니다.
pub async fn existing_tag_ids(
    pool: &SqlitePool,
    ids: &[String],
) -> Result<Vec<String>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    // IN (?, ?, ...) — 플레이스홀더를 ID 개수만큼 만들어 이어 붙입니다
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("SELECT id FROM tags WHERE id IN ({})", placeholders);

    let mut query = sqlx::query_as::<_, (String,)>(&sql);
    for id in ids {
        query = query.bind(id);
    }

    let rows = query.fetch_all(pool).await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

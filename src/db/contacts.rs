//! # 연락처 데이터베이스 쿼리 모듈
//!
//! `contacts` 테이블과 `contact_tag` 연결 테이블에 대한 쿼리 함수들입니다.
//!
//! ## 트랜잭션 규칙
//! 연락처 쓰기(생성/수정/삭제)는 속성 변경과 태그 연결 변경을
//! **하나의 트랜잭션**으로 묶습니다. 속성은 바뀌었는데 태그 연결만
//! 실패하는 식의 반쪽짜리 상태를 남기지 않기 위해서입니다.
//! `tx.commit()` 전에 에러가 나면 sqlx가 트랜잭션을 자동 롤백합니다.

use std::collections::HashMap;

use crate::error::AppError;
use crate::models::*;
use sqlx::SqlitePool;

/// ID로 단일 연락처를 조회합니다.
///
/// # 반환값
/// - `Ok(Some(Contact))`: 연락처를 찾은 경우
/// - `Ok(None)`: 해당 ID의 연락처가 없는 경우
pub async fn get_contact(pool: &SqlitePool, id: &str) -> Result<Option<Contact>, AppError> {
    let contact = sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, first_name, last_name, email, phone, company, position,
               created_by, created_at, updated_at
        FROM contacts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(contact)
}

/// 이 이메일을 가진 연락처가 이미 있는지 확인합니다.
///
/// # 매개변수
/// - `exclude_id`: 수정 시 자기 자신을 제외하기 위한 연락처 ID (생성 시 None)
///
/// DB에도 UNIQUE 제약이 있지만, 먼저 확인해야 제약 위반 에러 대신
/// 사용자에게 친절한 409 응답을 만들 수 있습니다.
pub async fn email_taken(
    pool: &SqlitePool,
    email: &str,
    exclude_id: Option<&str>,
) -> Result<bool, AppError> {
    let count: (i64,) = if let Some(exclude) = exclude_id {
        sqlx::query_as("SELECT COUNT(*) FROM contacts WHERE email = ? AND id != ?")
            .bind(email)
            .bind(exclude)
            .fetch_one(pool)
            .await?
    } else {
        sqlx::query_as("SELECT COUNT(*) FROM contacts WHERE email = ?")
            .bind(email)
            .fetch_one(pool)
            .await?
    };

    Ok(count.0 > 0)
}

/// 새 연락처를 생성합니다. 속성 저장과 태그 연결을 한 트랜잭션으로 처리합니다.
///
/// 태그 ID들이 실제로 존재하는지는 핸들러가 미리 검사한 상태입니다.
/// `INSERT OR IGNORE`는 요청에 같은 태그 ID가 중복으로 들어와도
/// 연결이 한 번만 만들어지게 합니다.
pub async fn create_contact(
    pool: &SqlitePool,
    id: &str,
    req: &CreateContactRequest,
    created_by: Option<&str>,
) -> Result<Contact, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO contacts (id, first_name, last_name, email, phone, company, position, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(&req.email)
    .bind(&req.phone)
    .bind(&req.company)
    .bind(&req.position)
    .bind(created_by)
    .execute(&mut *tx)
    .await?;

    for tag_id in &req.tags {
        sqlx::query("INSERT OR IGNORE INTO contact_tag (contact_id, tag_id) VALUES (?, ?)")
            .bind(id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    get_contact(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created contact".to_string()))
}

/// 연락처를 수정합니다 — PUT 의미론: 속성 전체 교체 + 태그 집합 교체.
///
/// ## 태그 동기화(sync) 방식
/// 전부 지우고 다시 넣는 대신:
/// 1. 새 목록에 **없는** 연결만 DELETE
/// 2. 아직 없는 연결만 INSERT OR IGNORE
///
/// 이렇게 하면 계속 유지되는 연결 행은 건드리지 않으므로
/// 해당 연결의 `created_at`(처음 연결된 시각)이 보존됩니다.
///
/// # 반환값
/// - `Ok(Some(Contact))`: 수정 성공
/// - `Ok(None)`: 해당 ID의 연락처가 없음
pub async fn update_contact(
    pool: &SqlitePool,
    id: &str,
    req: &UpdateContactRequest,
) -> Result<Option<Contact>, AppError> {
    // 먼저 연락처 존재 여부를 확인합니다
    if get_contact(pool, id).await?.is_none() {
        return Ok(None);
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE contacts
        SET first_name = ?, last_name = ?, email = ?, phone = ?,
            company = ?, position = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(&req.email)
    .bind(&req.phone)
    .bind(&req.company)
    .bind(&req.position)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if req.tags.is_empty() {
        // 빈 목록 = 모든 태그 해제 (PUT에서 tags 생략도 여기로 옵니다)
        sqlx::query("DELETE FROM contact_tag WHERE contact_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
    } else {
        // 1단계: 새 목록에 없는 연결 제거
        let placeholders = vec!["?"; req.tags.len()].join(", ");
        let sql = format!(
            "DELETE FROM contact_tag WHERE contact_id = ? AND tag_id NOT IN ({})",
            placeholders
        );
        let mut query = sqlx::query(&sql).bind(id);
        for tag_id in &req.tags {
            query = query.bind(tag_id);
        }
        query.execute(&mut *tx).await?;

        // 2단계: 새로 추가된 연결만 삽입 (기존 연결은 IGNORE로 보존)
        for tag_id in &req.tags {
            sqlx::query("INSERT OR IGNORE INTO contact_tag (contact_id, tag_id) VALUES (?, ?)")
                .bind(id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;

    get_contact(pool, id).await
}

/// 연락처를 삭제합니다 — 태그 연결 해제와 행 삭제를 한 트랜잭션으로 묶습니다.
///
/// ## 반환값
/// - `true`: 삭제 성공
/// - `false`: 해당 ID의 연락처가 없음
pub async fn delete_contact(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM contact_tag WHERE contact_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(result.rows_affected() > 0)
}

/// 특정 연락처에 달린 태그 목록을 이름순으로 조회합니다.
pub async fn tags_for_contact(
    pool: &SqlitePool,
    contact_id: &str,
) -> Result<Vec<TagSummary>, AppError> {
    let tags = sqlx::query_as::<_, TagSummary>(
        r#"
        SELECT t.id, t.name, t.color
        FROM tags t
        JOIN contact_tag ct ON ct.tag_id = t.id
        WHERE ct.contact_id = ?
        ORDER BY t.name
        "#,
    )
    .bind(contact_id)
    .fetch_all(pool)
    .await?;

    Ok(tags)
}

/// 연락처 목록에 태그를 **한 번의 쿼리로** 붙여 응답 구조체로 변환합니다.
///
/// 연락처마다 태그 쿼리를 따로 날리면 목록 50건에 쿼리 50번이 나갑니다
/// (N+1 문제). 대신 연락처 ID 전체를 IN 절에 넣어 연결을 한 번에 가져온 뒤
/// 메모리에서 연락처별로 나눕니다.
///
/// 입력 순서가 곧 출력 순서입니다 — 검색이 정한 정렬을 여기서 바꾸지 않습니다.
pub async fn attach_tags(
    pool: &SqlitePool,
    contacts: Vec<Contact>,
) -> Result<Vec<ContactResponse>, AppError> {
    if contacts.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; contacts.len()].join(", ");
    let sql = format!(
        "SELECT ct.contact_id, t.id, t.name, t.color \
         FROM contact_tag ct \
         JOIN tags t ON t.id = ct.tag_id \
         WHERE ct.contact_id IN ({}) \
         ORDER BY t.name",
        placeholders
    );

    let mut query = sqlx::query_as::<_, (String, String, String, String)>(&sql);
    for contact in &contacts {
        query = query.bind(&contact.id);
    }
    let rows = query.fetch_all(pool).await?;

    // 연락처 ID → 태그 목록으로 재분배합니다
    let mut by_contact: HashMap<String, Vec<TagSummary>> = HashMap::new();
    for (contact_id, id, name, color) in rows {
        by_contact
            .entry(contact_id)
            .or_default()
            .push(TagSummary { id, name, color });
    }

    Ok(contacts
        .into_iter()
        .map(|contact| {
            let tags = by_contact.remove(&contact.id).unwrap_or_default();
            ContactResponse::from_contact(contact, tags)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{tags as db_tags, test_pool};
    use std::time::Duration;

    fn create_req(email: &str, tags: Vec<String>) -> CreateContactRequest {
        CreateContactRequest {
            first_name: "Anna".to_string(),
            last_name: "Kowalska".to_string(),
            email: email.to_string(),
            phone: Some("+48 123 456 789".to_string()),
            company: "ABC Corp".to_string(),
            position: "Developer".to_string(),
            tags,
        }
    }

    async fn make_tag(pool: &SqlitePool, name: &str) -> String {
        let id = uuid::Uuid::now_v7().to_string();
        db_tags::create_tag(pool, &id, name, "#3B82F6", None)
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn create_stores_attributes_and_tag_links() {
        let pool = test_pool().await;
        let vip = make_tag(&pool, "VIP").await;
        let klient = make_tag(&pool, "Klient").await;

        let contact = create_contact(
            &pool,
            "c-1",
            &create_req("anna@example.com", vec![vip.clone(), klient.clone()]),
            None,
        )
        .await
        .unwrap();

        assert_eq!(contact.email, "anna@example.com");
        assert!(!contact.created_at.is_empty());

        let tags = tags_for_contact(&pool, "c-1").await.unwrap();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Klient", "VIP"]); // 이름순
    }

    #[tokio::test]
    async fn update_replaces_attributes_and_syncs_tags() {
        let pool = test_pool().await;
        let vip = make_tag(&pool, "VIP").await;
        let klient = make_tag(&pool, "Klient").await;
        let partner = make_tag(&pool, "Partner").await;

        create_contact(
            &pool,
            "c-1",
            &create_req("anna@example.com", vec![vip.clone(), klient.clone()]),
            None,
        )
        .await
        .unwrap();

        // 유지되는 연결(klient)의 최초 연결 시각을 기억해 둡니다
        let (before,): (String,) = sqlx::query_as(
            "SELECT created_at FROM contact_tag WHERE contact_id = 'c-1' AND tag_id = ?",
        )
        .bind(&klient)
        .fetch_one(&pool)
        .await
        .unwrap();

        // 타임스탬프(ms 해상도)가 확실히 달라지도록 잠깐 기다립니다
        tokio::time::sleep(Duration::from_millis(20)).await;

        let updated = update_contact(
            &pool,
            "c-1",
            &UpdateContactRequest {
                first_name: "Anna Maria".to_string(),
                last_name: "Nowak".to_string(),
                email: "anna.nowak@example.com".to_string(),
                phone: None,
                company: "XYZ Ltd".to_string(),
                position: "Manager".to_string(),
                tags: vec![klient.clone(), partner.clone()],
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.last_name, "Nowak");
        assert_eq!(updated.company, "XYZ Ltd");
        assert_eq!(updated.phone, None);

        let tags = tags_for_contact(&pool, "c-1").await.unwrap();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Klient", "Partner"]); // VIP 제거, Partner 추가

        // 살아남은 연결은 다시 만들어지지 않고 원래 시각을 유지해야 합니다
        let (after,): (String,) = sqlx::query_as(
            "SELECT created_at FROM contact_tag WHERE contact_id = 'c-1' AND tag_id = ?",
        )
        .bind(&klient)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn update_with_empty_tags_detaches_everything() {
        let pool = test_pool().await;
        let vip = make_tag(&pool, "VIP").await;
        create_contact(&pool, "c-1", &create_req("anna@example.com", vec![vip]), None)
            .await
            .unwrap();

        update_contact(
            &pool,
            "c-1",
            &UpdateContactRequest {
                first_name: "Anna".to_string(),
                last_name: "Kowalska".to_string(),
                email: "anna@example.com".to_string(),
                phone: None,
                company: "ABC Corp".to_string(),
                position: "Developer".to_string(),
                tags: vec![],
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert!(tags_for_contact(&pool, "c-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_missing_contact_returns_none() {
        let pool = test_pool().await;
        let result = update_contact(
            &pool,
            "no-such-id",
            &UpdateContactRequest {
                first_name: "A".to_string(),
                last_name: "B".to_string(),
                email: "a@example.com".to_string(),
                phone: None,
                company: "C".to_string(),
                position: "D".to_string(),
                tags: vec![],
            },
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_removes_contact_and_links() {
        let pool = test_pool().await;
        let vip = make_tag(&pool, "VIP").await;
        create_contact(&pool, "c-1", &create_req("anna@example.com", vec![vip]), None)
            .await
            .unwrap();

        assert!(delete_contact(&pool, "c-1").await.unwrap());

        assert!(get_contact(&pool, "c-1").await.unwrap().is_none());
        let links: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contact_tag")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(links.0, 0);

        // 태그 자체는 삭제되지 않습니다
        let tags: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(tags.0, 1);

        assert!(!delete_contact(&pool, "c-1").await.unwrap());
    }

    #[tokio::test]
    async fn email_taken_respects_exclusion() {
        let pool = test_pool().await;
        create_contact(&pool, "c-1", &create_req("anna@example.com", vec![]), None)
            .await
            .unwrap();

        assert!(email_taken(&pool, "anna@example.com", None).await.unwrap());
        assert!(!email_taken(&pool, "other@example.com", None).await.unwrap());
        // 자기 자신의 이메일은 중복이 아닙니다 (수정 시나리오)
        assert!(!email_taken(&pool, "anna@example.com", Some("c-1"))
            .await
            .unwrap());
        assert!(email_taken(&pool, "anna@example.com", Some("c-2"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn attach_tags_batches_and_keeps_order() {
        let pool = test_pool().await;
        let vip = make_tag(&pool, "VIP").await;
        let klient = make_tag(&pool, "Klient").await;

        create_contact(&pool, "c-1", &create_req("anna@example.com", vec![vip.clone()]), None)
            .await
            .unwrap();
        let mut second = create_req("jan@example.com", vec![vip, klient]);
        second.first_name = "Jan".to_string();
        second.last_name = "Nowak".to_string();
        create_contact(&pool, "c-2", &second, None).await.unwrap();
        create_contact(&pool, "c-3", &{
            let mut r = create_req("bez@example.com", vec![]);
            r.first_name = "Piotr".to_string();
            r
        }, None)
        .await
        .unwrap();

        let contacts = vec![
            get_contact(&pool, "c-2").await.unwrap().unwrap(),
            get_contact(&pool, "c-1").await.unwrap().unwrap(),
            get_contact(&pool, "c-3").await.unwrap().unwrap(),
        ];
        let responses = attach_tags(&pool, contacts).await.unwrap();

        // 입력 순서 유지
        assert_eq!(responses[0].id, "c-2");
        assert_eq!(responses[1].id, "c-1");
        assert_eq!(responses[2].id, "c-3");

        assert_eq!(responses[0].tags.len(), 2);
        assert_eq!(responses[1].tags.len(), 1);
        assert!(responses[2].tags.is_empty());

        // 파생 필드도 채워져야 합니다
        assert_eq!(responses[1].full_name, "Anna Kowalska");
        assert_eq!(responses[1].initials, "AK");
    }
}

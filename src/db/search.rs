//! # 연락처 다기준 검색 쿼리 모듈
//!
//! 자유 텍스트 + 회사/직함 정확 일치 + 태그 필터를 하나의 SQL로 결합하는
//! 동적 쿼리 빌더와, 자동완성/집계 쿼리를 제공합니다.
//!
//! ## 검색 의미론
//! - **자유 텍스트**(`query`): 이름/성/이메일/회사/직함/전체이름에 대한
//!   부분 일치(LIKE %q%), 또는 연락처에 달린 **태그 이름** 일치.
//!   이 일곱 조건은 OR로 묶입니다.
//! - **회사/직함**: 정확 일치(=). 드롭다운에서 고른 값이므로 부분 일치가 아닙니다.
//! - **태그 필터**: `any`면 지정 태그 중 하나라도(OR), `all`이면 전부(AND).
//! - 서로 다른 기준끼리는 **AND**: 모든 기준을 동시에 만족해야 합니다.
//! - 잘못된 입력은 에러가 아닙니다: 빈 문자열 필터는 무시되고,
//!   알 수 없는 태그 모드는 any로 해석됩니다.
//!
//! ## 대소문자
//! SQLite의 LIKE는 ASCII 범위에서 대소문자를 구분하지 않습니다
//! ("anna" ≈ "Anna"). 비ASCII 문자(Ł/ł 등)는 구분되는데, 이는 SQLite의
//! 기본 동작을 그대로 따르는 것입니다.

use crate::error::AppError;
use crate::models::*;
use sqlx::SqlitePool;

/// 다기준 검색을 실행합니다.
///
/// # 매개변수
/// - `filter`: 검색 조건 묶음 (모두 선택 사항 — 전부 비면 전체 목록)
/// - `limit`: 반환 행 수 상한. 화면 검색은 `Some(50)`, CSV 내보내기는
///   전체가 필요하므로 `None`을 넘깁니다.
///
/// # 반환값
/// (성, 이름) 오름차순으로 정렬된 연락처 행 목록.
/// 태그는 아직 붙어 있지 않습니다 — `db::contacts::attach_tags`가
/// 한 번의 배치 쿼리로 채웁니다.
pub async fn search_contacts(
    pool: &SqlitePool,
    filter: &ContactFilter,
    limit: Option<i64>,
) -> Result<Vec<Contact>, AppError> {
    // ── 동적 쿼리 구성 ──
    // 기준이 있을 때만 해당 조건을 SQL에 덧붙이고,
    // 바인딩할 값은 같은 순서로 bindings에 모아 둡니다.
    // "WHERE 1=1"은 이후 조건을 전부 " AND ..."로 붙일 수 있게 하는 관용구입니다.
    let mut sql = String::from(
        "SELECT id, first_name, last_name, email, phone, company, position, \
         created_by, created_at, updated_at \
         FROM contacts WHERE 1=1",
    );
    let mut bindings: Vec<String> = Vec::new();

    if let Some(q) = non_empty(&filter.query) {
        // 일곱 조건이 같은 패턴을 쓰므로 바인딩도 일곱 번 반복합니다.
        // 태그 이름 일치는 EXISTS 서브쿼리로: 이 연락처의 연결 행 중
        // 이름이 패턴에 걸리는 태그가 하나라도 있으면 참입니다.
        sql.push_str(
            " AND (first_name LIKE ? \
             OR last_name LIKE ? \
             OR email LIKE ? \
             OR company LIKE ? \
             OR position LIKE ? \
             OR (first_name || ' ' || last_name) LIKE ? \
             OR EXISTS (SELECT 1 FROM contact_tag ct \
                        JOIN tags t ON t.id = ct.tag_id \
                        WHERE ct.contact_id = contacts.id AND t.name LIKE ?))",
        );
        let pattern = format!("%{}%", q);
        for _ in 0..7 {
            bindings.push(pattern.clone());
        }
    }

    if let Some(company) = non_empty(&filter.company) {
        sql.push_str(" AND company = ?");
        bindings.push(company.to_string());
    }

    if let Some(position) = non_empty(&filter.position) {
        sql.push_str(" AND position = ?");
        bindings.push(position.to_string());
    }

    if !filter.tags.is_empty() {
        match filter.tag_mode() {
            // any: 지정 태그 중 하나라도 연결되어 있으면 통과 — EXISTS 하나에 IN
            TagMode::Any => {
                let placeholders = vec!["?"; filter.tags.len()].join(", ");
                sql.push_str(&format!(
                    " AND EXISTS (SELECT 1 FROM contact_tag ct \
                     WHERE ct.contact_id = contacts.id AND ct.tag_id IN ({}))",
                    placeholders
                ));
                bindings.extend(filter.tags.iter().cloned());
            }
            // all: 태그마다 EXISTS를 하나씩 — 전부 연결된 연락처만 통과
            TagMode::All => {
                for tag_id in &filter.tags {
                    sql.push_str(
                        " AND EXISTS (SELECT 1 FROM contact_tag ct \
                         WHERE ct.contact_id = contacts.id AND ct.tag_id = ?)",
                    );
                    bindings.push(tag_id.clone());
                }
            }
        }
    }

    sql.push_str(" ORDER BY last_name, first_name");

    if limit.is_some() {
        sql.push_str(" LIMIT ?");
    }

    // ── 동적 쿼리 실행 ──
    let mut query = sqlx::query_as::<_, Contact>(&sql);
    for binding in &bindings {
        query = query.bind(binding);
    }
    if let Some(limit) = limit {
        query = query.bind(limit); // LIMIT 값은 문자열이 아닌 정수로 바인딩합니다
    }

    let contacts = query.fetch_all(pool).await?;
    Ok(contacts)
}

/// 연락처에 등장하는 회사명 목록 (중복 제거, 이름순) — 필터 드롭다운용
pub async fn distinct_companies(pool: &SqlitePool) -> Result<Vec<String>, AppError> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT company FROM contacts ORDER BY company")
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(company,)| company).collect())
}

/// 연락처에 등장하는 직함 목록 (중복 제거, 이름순) — 필터 드롭다운용
pub async fn distinct_positions(pool: &SqlitePool) -> Result<Vec<String>, AppError> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT position FROM contacts ORDER BY position")
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(position,)| position).collect())
}

/// 전체 태그를 "달린 연락처 수"와 함께 조회합니다.
///
/// LEFT JOIN이므로 아직 아무 연락처에도 달리지 않은 태그도
/// `contacts_count = 0`으로 포함됩니다 — 필터 UI에는 전체 태그가 보여야 합니다.
pub async fn available_tags(pool: &SqlitePool) -> Result<Vec<TagWithCount>, AppError> {
    let tags = sqlx::query_as::<_, TagWithCount>(
        r#"
        SELECT t.id, t.name, t.color, COUNT(ct.contact_id) AS contacts_count
        FROM tags t
        LEFT JOIN contact_tag ct ON ct.tag_id = t.id
        GROUP BY t.id, t.name, t.color
        ORDER BY t.name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(tags)
}

/// 자동완성 제안을 조회합니다.
///
/// ## 규칙
/// - 검색어가 2글자 미만이면 **DB에 가지 않고** 빈 목록을 반환합니다
///   (한 글자마다 전체 테이블을 훑는 것을 방지)
/// - 우선순위 순서로 이어 붙입니다: 연락처 이름 5건 → 회사 5건 →
///   직함 5건 → 태그 5건
/// - 전체 상한 15건 — 네 범주가 다 차면 뒤쪽 범주(태그)부터 잘려 나갑니다
pub async fn suggestions(pool: &SqlitePool, query: &str) -> Result<Vec<Suggestion>, AppError> {
    let query = query.trim();
    // chars().count(): 바이트 길이(len)가 아닌 문자 수 — "Łu"도 2글자입니다
    if query.chars().count() < 2 {
        return Ok(Vec::new());
    }

    let pattern = format!("%{}%", query);
    let mut suggestions = Vec::new();

    // 1순위: 연락처 이름 — 선택하면 해당 연락처로 바로 이동할 수 있게 id를 함께 싣습니다
    let names: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT id, first_name || ' ' || last_name AS full_name
        FROM contacts
        WHERE first_name LIKE ? OR last_name LIKE ?
           OR (first_name || ' ' || last_name) LIKE ?
        ORDER BY last_name, first_name
        LIMIT 5
        "#,
    )
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(pool)
    .await?;

    for (id, full_name) in names {
        suggestions.push(Suggestion {
            kind: "name".to_string(),
            value: full_name.clone(),
            label: full_name,
            id: Some(id),
            color: None,
        });
    }

    // 2순위: 회사명
    let companies: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT company FROM contacts WHERE company LIKE ? ORDER BY company LIMIT 5",
    )
    .bind(&pattern)
    .fetch_all(pool)
    .await?;

    for (company,) in companies {
        suggestions.push(Suggestion {
            kind: "company".to_string(),
            value: company.clone(),
            label: company,
            id: None,
            color: None,
        });
    }

    // 3순위: 직함
    let positions: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT position FROM contacts WHERE position LIKE ? ORDER BY position LIMIT 5",
    )
    .bind(&pattern)
    .fetch_all(pool)
    .await?;

    for (position,) in positions {
        suggestions.push(Suggestion {
            kind: "position".to_string(),
            value: position.clone(),
            label: position,
            id: None,
            color: None,
        });
    }

    // 4순위: 태그 이름 — UI가 배지 색을 그릴 수 있게 color를 함께 싣습니다
    let tags: Vec<(String, String)> = sqlx::query_as(
        "SELECT name, color FROM tags WHERE name LIKE ? ORDER BY name LIMIT 5",
    )
    .bind(&pattern)
    .fetch_all(pool)
    .await?;

    for (name, color) in tags {
        suggestions.push(Suggestion {
            kind: "tag".to_string(),
            value: name.clone(),
            label: name,
            id: None,
            color: Some(color),
        });
    }

    suggestions.truncate(15);
    Ok(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{contacts as db_contacts, tags as db_tags, test_pool};

    async fn seed_tag(pool: &SqlitePool, name: &str) -> String {
        let id = uuid::Uuid::now_v7().to_string();
        db_tags::create_tag(pool, &id, name, "#3B82F6", None)
            .await
            .unwrap();
        id
    }

    async fn seed_contact(
        pool: &SqlitePool,
        first: &str,
        last: &str,
        company: &str,
        position: &str,
        tags: Vec<String>,
    ) -> String {
        let id = uuid::Uuid::now_v7().to_string();
        let req = CreateContactRequest {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!(
                "{}.{}@example.com",
                first.to_lowercase().replace(' ', "-"),
                last.to_lowercase().replace(' ', "-")
            ),
            phone: None,
            company: company.to_string(),
            position: position.to_string(),
            tags,
        };
        db_contacts::create_contact(pool, &id, &req, None)
            .await
            .unwrap();
        id
    }

    fn last_names(contacts: &[Contact]) -> Vec<&str> {
        contacts.iter().map(|c| c.last_name.as_str()).collect()
    }

    #[tokio::test]
    async fn free_text_matches_every_field_case_insensitively() {
        let pool = test_pool().await;
        seed_contact(&pool, "Anna", "Kowalska", "ABC Corp", "Developer", vec![]).await;
        seed_contact(&pool, "Jan", "Nowak", "XYZ Ltd", "Manager", vec![]).await;

        // 직함으로
        let filter = ContactFilter {
            query: Some("Developer".to_string()),
            ..Default::default()
        };
        let found = search_contacts(&pool, &filter, Some(50)).await.unwrap();
        assert_eq!(last_names(&found), vec!["Kowalska"]);

        // 회사로
        let filter = ContactFilter {
            query: Some("XYZ".to_string()),
            ..Default::default()
        };
        let found = search_contacts(&pool, &filter, Some(50)).await.unwrap();
        assert_eq!(last_names(&found), vec!["Nowak"]);

        // 소문자로도 (ASCII 대소문자 무시)
        let filter = ContactFilter {
            query: Some("anna".to_string()),
            ..Default::default()
        };
        let found = search_contacts(&pool, &filter, Some(50)).await.unwrap();
        assert_eq!(last_names(&found), vec!["Kowalska"]);

        // "이름 성" 전체 문자열로
        let filter = ContactFilter {
            query: Some("Anna Kowalska".to_string()),
            ..Default::default()
        };
        let found = search_contacts(&pool, &filter, Some(50)).await.unwrap();
        assert_eq!(last_names(&found), vec!["Kowalska"]);

        // 이메일 조각으로
        let filter = ContactFilter {
            query: Some("jan.nowak@".to_string()),
            ..Default::default()
        };
        let found = search_contacts(&pool, &filter, Some(50)).await.unwrap();
        assert_eq!(last_names(&found), vec!["Nowak"]);
    }

    #[tokio::test]
    async fn free_text_matches_attached_tag_names() {
        let pool = test_pool().await;
        let vip = seed_tag(&pool, "VIP").await;
        seed_contact(&pool, "Anna", "Kowalska", "ABC Corp", "Developer", vec![vip]).await;
        seed_contact(&pool, "Jan", "Nowak", "XYZ Ltd", "Manager", vec![]).await;

        let filter = ContactFilter {
            query: Some("VIP".to_string()),
            ..Default::default()
        };
        let found = search_contacts(&pool, &filter, Some(50)).await.unwrap();
        assert_eq!(last_names(&found), vec!["Kowalska"]);
    }

    #[tokio::test]
    async fn company_and_position_filters_are_exact() {
        let pool = test_pool().await;
        seed_contact(&pool, "Anna", "Kowalska", "ABC Corp", "Developer", vec![]).await;

        // 부분 문자열로는 걸리지 않습니다
        let filter = ContactFilter {
            company: Some("ABC".to_string()),
            ..Default::default()
        };
        assert!(search_contacts(&pool, &filter, Some(50))
            .await
            .unwrap()
            .is_empty());

        let filter = ContactFilter {
            company: Some("ABC Corp".to_string()),
            ..Default::default()
        };
        assert_eq!(
            search_contacts(&pool, &filter, Some(50)).await.unwrap().len(),
            1
        );

        let filter = ContactFilter {
            position: Some("Dev".to_string()),
            ..Default::default()
        };
        assert!(search_contacts(&pool, &filter, Some(50))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn tag_any_matches_union_and_all_requires_every_tag() {
        let pool = test_pool().await;
        let vip = seed_tag(&pool, "VIP").await;
        let klient = seed_tag(&pool, "Klient").await;

        // A는 VIP만, B는 Klient만
        seed_contact(&pool, "Anna", "Adamska", "ABC Corp", "Developer", vec![vip.clone()]).await;
        seed_contact(&pool, "Jan", "Bielski", "ABC Corp", "Developer", vec![klient.clone()]).await;

        let both = vec![vip.clone(), klient.clone()];

        // any: 둘 다 걸립니다
        let filter = ContactFilter {
            tags: both.clone(),
            ..Default::default()
        };
        let found = search_contacts(&pool, &filter, Some(50)).await.unwrap();
        assert_eq!(last_names(&found), vec!["Adamska", "Bielski"]);

        // all: 두 태그를 모두 가진 연락처가 없으므로 빈 결과
        let filter = ContactFilter {
            tags: both.clone(),
            tag_search_mode: Some("all".to_string()),
            ..Default::default()
        };
        assert!(search_contacts(&pool, &filter, Some(50))
            .await
            .unwrap()
            .is_empty());

        // 두 태그를 모두 단 C를 추가하면 all에 C만 걸립니다
        seed_contact(&pool, "Piotr", "Czerwiński", "XYZ Ltd", "Manager", both.clone()).await;
        let filter = ContactFilter {
            tags: both,
            tag_search_mode: Some("all".to_string()),
            ..Default::default()
        };
        let found = search_contacts(&pool, &filter, Some(50)).await.unwrap();
        assert_eq!(last_names(&found), vec!["Czerwiński"]);
    }

    #[tokio::test]
    async fn unknown_tag_mode_falls_back_to_any() {
        let pool = test_pool().await;
        let vip = seed_tag(&pool, "VIP").await;
        let klient = seed_tag(&pool, "Klient").await;
        seed_contact(&pool, "Anna", "Adamska", "ABC Corp", "Developer", vec![vip.clone()]).await;

        let filter = ContactFilter {
            tags: vec![vip, klient],
            tag_search_mode: Some("sometimes".to_string()), // 잘못된 값
            ..Default::default()
        };
        // 에러가 아니라 any 의미로 동작해야 합니다
        let found = search_contacts(&pool, &filter, Some(50)).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn criteria_combine_with_and() {
        let pool = test_pool().await;
        let vip = seed_tag(&pool, "VIP").await;
        seed_contact(&pool, "Anna", "Kowalska", "ABC Corp", "Developer", vec![vip.clone()]).await;
        seed_contact(&pool, "Jan", "Nowak", "ABC Corp", "Developer", vec![]).await;

        // 같은 회사·직함이지만 태그 조건까지 만족하는 쪽만 남아야 합니다
        let filter = ContactFilter {
            query: Some("Developer".to_string()),
            company: Some("ABC Corp".to_string()),
            tags: vec![vip],
            ..Default::default()
        };
        let found = search_contacts(&pool, &filter, Some(50)).await.unwrap();
        assert_eq!(last_names(&found), vec!["Kowalska"]);
    }

    #[tokio::test]
    async fn results_ordered_by_last_then_first_name() {
        let pool = test_pool().await;
        seed_contact(&pool, "Zofia", "Nowak", "ABC Corp", "Developer", vec![]).await;
        seed_contact(&pool, "Adam", "Nowak", "ABC Corp", "Developer", vec![]).await;
        seed_contact(&pool, "Ewa", "Adamska", "ABC Corp", "Developer", vec![]).await;

        let found = search_contacts(&pool, &ContactFilter::default(), Some(50))
            .await
            .unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|c| format!("{} {}", c.first_name, c.last_name))
            .collect();
        assert_eq!(names, vec!["Ewa Adamska", "Adam Nowak", "Zofia Nowak"]);
    }

    #[tokio::test]
    async fn limit_caps_results_and_none_returns_everything() {
        let pool = test_pool().await;
        for i in 0..55 {
            seed_contact(
                &pool,
                &format!("User{:02}", i),
                &format!("Last{:02}", i),
                "ABC Corp",
                "Developer",
                vec![],
            )
            .await;
        }

        let capped = search_contacts(&pool, &ContactFilter::default(), Some(50))
            .await
            .unwrap();
        assert_eq!(capped.len(), 50);

        // 내보내기 경로: 상한 없음
        let all = search_contacts(&pool, &ContactFilter::default(), None)
            .await
            .unwrap();
        assert_eq!(all.len(), 55);
    }

    #[tokio::test]
    async fn blank_filters_are_ignored() {
        let pool = test_pool().await;
        seed_contact(&pool, "Anna", "Kowalska", "ABC Corp", "Developer", vec![]).await;

        let filter = ContactFilter {
            query: Some("   ".to_string()),
            company: Some(String::new()),
            ..Default::default()
        };
        // 빈 기준은 "조건 없음"이므로 전체가 나와야 합니다
        assert_eq!(
            search_contacts(&pool, &filter, Some(50)).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn distinct_lists_are_unique_and_sorted() {
        let pool = test_pool().await;
        seed_contact(&pool, "Anna", "Kowalska", "XYZ Ltd", "Developer", vec![]).await;
        seed_contact(&pool, "Jan", "Nowak", "ABC Corp", "Developer", vec![]).await;
        seed_contact(&pool, "Piotr", "Wiśniewski", "ABC Corp", "Manager", vec![]).await;

        assert_eq!(
            distinct_companies(&pool).await.unwrap(),
            vec!["ABC Corp".to_string(), "XYZ Ltd".to_string()]
        );
        assert_eq!(
            distinct_positions(&pool).await.unwrap(),
            vec!["Developer".to_string(), "Manager".to_string()]
        );
    }

    #[tokio::test]
    async fn available_tags_count_attached_contacts() {
        let pool = test_pool().await;
        let vip = seed_tag(&pool, "VIP").await;
        let klient = seed_tag(&pool, "Klient").await;
        seed_tag(&pool, "Archiwum").await; // 아무 데도 안 달린 태그

        seed_contact(&pool, "Anna", "Kowalska", "ABC Corp", "Developer", vec![vip.clone(), klient.clone()]).await;
        seed_contact(&pool, "Jan", "Nowak", "XYZ Ltd", "Manager", vec![vip]).await;

        let tags = available_tags(&pool).await.unwrap();
        let summary: Vec<(&str, i64)> = tags
            .iter()
            .map(|t| (t.name.as_str(), t.contacts_count))
            .collect();
        // 이름순, 0건짜리 태그도 포함
        assert_eq!(
            summary,
            vec![("Archiwum", 0), ("Klient", 1), ("VIP", 2)]
        );
    }

    #[tokio::test]
    async fn short_suggestion_query_returns_empty() {
        let pool = test_pool().await;
        seed_contact(&pool, "Jan", "Nowak", "ABC Corp", "Developer", vec![]).await;

        assert!(suggestions(&pool, "").await.unwrap().is_empty());
        assert!(suggestions(&pool, "J").await.unwrap().is_empty());
        assert!(suggestions(&pool, "  J  ").await.unwrap().is_empty());
        // 2글자부터 동작합니다
        assert!(!suggestions(&pool, "Ja").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn suggestions_follow_priority_order_with_metadata() {
        let pool = test_pool().await;
        let _tag = seed_tag(&pool, "Kontrahent").await;
        let contact_id =
            seed_contact(&pool, "Anna", "Kowalska", "Kopalnia", "Koordynator", vec![]).await;

        let found = suggestions(&pool, "ko").await.unwrap();
        let kinds: Vec<&str> = found.iter().map(|s| s.kind.as_str()).collect();
        assert_eq!(kinds, vec!["name", "company", "position", "tag"]);

        // 이름 제안에는 연락처 id가 실립니다
        assert_eq!(found[0].value, "Anna Kowalska");
        assert_eq!(found[0].id.as_deref(), Some(contact_id.as_str()));

        // 태그 제안에는 색상이 실립니다
        assert_eq!(found[3].value, "Kontrahent");
        assert_eq!(found[3].color.as_deref(), Some("#3B82F6"));
    }

    #[tokio::test]
    async fn suggestions_cap_five_per_category_and_fifteen_total() {
        let pool = test_pool().await;
        for i in 0..6 {
            // 이름/회사/직함이 전부 "corp"에 걸리는 연락처를 6명 만듭니다
            seed_contact(
                &pool,
                &format!("User{}", i),
                &format!("Corpowski{}", i),
                &format!("CorpFirm{}", i),
                &format!("CorpRole{}", i),
                vec![],
            )
            .await;
            seed_tag(&pool, &format!("corptag{}", i)).await;
        }

        let found = suggestions(&pool, "corp").await.unwrap();
        assert_eq!(found.len(), 15);

        let count_of = |kind: &str| found.iter().filter(|s| s.kind == kind).count();
        assert_eq!(count_of("name"), 5);
        assert_eq!(count_of("company"), 5);
        assert_eq!(count_of("position"), 5);
        // 앞선 세 범주가 상한을 다 채웠으므로 태그는 잘려 나갑니다
        assert_eq!(count_of("tag"), 0);
    }
}

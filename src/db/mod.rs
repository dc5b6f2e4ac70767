//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 라우트 핸들러(routes/)에서 이 모듈의 함수를 호출하여 DB 작업을 수행합니다.
//!
//! 각 하위 모듈:
//! - `contacts`: 연락처 CRUD와 연락처-태그 관계(sync) 쿼리
//! - `search`: 다기준 검색, 자동완성, 집계(회사/직함/태그 목록) 쿼리
//! - `tags`: 태그 CRUD 쿼리
//! - `users`: 사용자 인증 관련 쿼리

pub mod contacts;
pub mod search;
pub mod tags;
pub mod users;

// 하위 모듈의 모든 공개 함수를 재공개(re-export)하여
// `crate::db::search_contacts`처럼 바로 접근할 수 있게 합니다.
pub use contacts::*;
pub use search::*;
pub use tags::*;

/// 테스트용 인메모리 SQLite 풀을 만들고 마이그레이션을 실행합니다.
///
/// `sqlite::memory:`는 연결마다 **독립된** 메모리 DB를 만들기 때문에
/// `max_connections(1)`이 필수입니다 — 연결이 둘이면 마이그레이션이 실행된
/// DB와 쿼리가 실행되는 DB가 서로 다른 DB가 되어 버립니다.
#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory sqlite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    pool
}

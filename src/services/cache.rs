//! # 조회 결과 캐시 모듈
//!
//! 검색/목록 조회 결과를 메모리에 TTL(Time To Live) 기반으로 보관합니다.
//! 같은 조건의 조회가 반복될 때 DB 쿼리를 건너뛰어 응답 속도를 높입니다.
//!
//! ## 캐시 대상과 수명
//! | 항목 | 키 | TTL |
//! |------|-----|-----|
//! | 회사명 목록 | `contacts:companies` | 1시간 |
//! | 직함 목록 | `contacts:positions` | 1시간 |
//! | 태그+연락처 수 목록 | `contacts:available_tags` | 1시간 |
//! | 검색 결과 | `contacts:search:<해시>` | 5분 |
//! | 자동완성 제안 | `contacts:suggest:<해시>` | 5분 |
//! | 내보내기 행 집합 | `contacts:export:<해시>` | 5분 |
//!
//! ## 일관성 모델
//! 쓰기(연락처/태그 변경) 시 캐시를 지우지 **않습니다**.
//! 변경 후 최대 TTL 동안은 이전 결과가 보일 수 있으며(eventual consistency),
//! TTL이 지나면 자연히 새 데이터로 채워집니다. 조회 비율이 압도적인
//! 연락처 도메인에서는 이 단순한 모델로 충분합니다.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::models::{non_empty, ContactFilter};

/// 목록성 캐시(회사/직함/태그)의 수명: 1시간
pub const LIST_TTL: Duration = Duration::from_secs(60 * 60);
/// 검색 결과 캐시의 수명: 5분
pub const SEARCH_TTL: Duration = Duration::from_secs(5 * 60);

/// 회사명 목록 캐시 키
pub const KEY_COMPANIES: &str = "contacts:companies";
/// 직함 목록 캐시 키
pub const KEY_POSITIONS: &str = "contacts:positions";
/// 사용 가능한 태그(연락처 수 포함) 캐시 키
pub const KEY_AVAILABLE_TAGS: &str = "contacts:available_tags";

/// 캐시 항목 하나 — 값과 만료 시각을 함께 저장합니다.
///
/// Instant: 시스템 시계 변경에 영향받지 않는 단조(monotonic) 시계의 한 시점.
/// "지금부터 5분"같은 상대 시간 측정에는 SystemTime보다 Instant가 적합합니다.
struct Entry {
    value: Value,
    expires_at: Instant,
}

/// 인메모리 TTL 캐시.
///
/// ## 구조
/// `Arc<Mutex<HashMap<...>>>`:
/// - `HashMap`: 키 → 항목 저장소
/// - `Mutex`: 여러 요청(태스크)이 동시에 접근해도 안전하도록 잠금
///   (tokio::sync::Mutex — 비동기 함수 안에서 .await로 잠급니다)
/// - `Arc`: 참조 카운트 스마트 포인터. AppState가 복제될 때마다
///   캐시 전체가 복사되는 대신 같은 저장소를 공유합니다.
///
/// ## 만료 처리
/// 별도의 백그라운드 청소 태스크를 두지 않고, get/put 시점에
/// 만료된 항목을 retain으로 정리합니다. 접근이 있어야만 청소가 일어나지만
/// 캐시 항목 수가 작은 이 애플리케이션에서는 충분합니다.
#[derive(Clone, Default)]
pub struct Cache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 키에 해당하는 값을 꺼내 T로 역직렬화합니다.
    ///
    /// # 반환값
    /// - `Some(T)`: 캐시 적중(hit) — 살아있는 항목을 찾았고 역직렬화에 성공
    /// - `None`: 캐시 미스(miss) — 항목 없음, 만료됨, 또는 형태 불일치
    ///
    /// 역직렬화 실패(저장 당시와 다른 타입으로 요청)도 미스로 처리합니다.
    /// 미스는 항상 "DB에서 새로 조회"로 이어지므로 어떤 경우에도 안전합니다.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().await;
        // 만료된 항목을 먼저 정리합니다 — 만료 직후의 get이 옛 값을 돌려주지 않도록
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);

        let entry = entries.get(key)?;
        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => {
                tracing::debug!(key, "cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "cached value has unexpected shape, discarding");
                None
            }
        }
    }

    /// 값을 직렬화하여 지정한 TTL로 저장합니다.
    ///
    /// 직렬화에 실패하면 저장하지 않고 넘어갑니다 — 캐시는 항상 생략 가능한
    /// 최적화이므로, 캐시 문제로 요청 자체를 실패시키지 않습니다.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let json = match serde_json::to_value(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to serialize value for cache, skipping");
                return;
            }
        };

        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value: json,
                expires_at: now + ttl,
            },
        );
    }

    /// 현재 저장된(만료 포함) 항목 수 — 테스트와 디버깅용
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// 검색 필터를 캐시 키 해시로 변환합니다.
///
/// 같은 조건이면 항상 같은 키가 나오도록 **정규화**합니다:
/// - 빈 문자열 필터는 "없음"과 동일하게 취급
/// - 태그 ID는 정렬 (tags[]=a&tags[]=b 와 tags[]=b&tags[]=a 는 같은 검색)
/// - 태그 방식은 해석된 값("any"/"all")을 사용 (오타도 any와 같은 키)
/// - 필터 값 안의 구분자 문자는 이스케이프 — 서로 다른 필터가 같은
///   정규화 문자열로 합쳐지지 않도록
///
/// 해시로 SHA-256 16진수 문자열을 사용합니다. 필터 값을 그대로 키에 넣으면
/// 사용자 입력이 무제한 길이의 키가 되므로 고정 길이 해시로 접습니다.
pub fn filter_hash(filter: &ContactFilter) -> String {
    let mut tags = filter.tags.clone();
    tags.sort();
    let tags = tags
        .iter()
        .map(|t| canonical_part(t))
        .collect::<Vec<_>>()
        .join(",");

    let canonical = format!(
        "q={}|c={}|p={}|t={}|m={}",
        canonical_part(non_empty(&filter.query).unwrap_or("")),
        canonical_part(non_empty(&filter.company).unwrap_or("")),
        canonical_part(non_empty(&filter.position).unwrap_or("")),
        tags,
        filter.tag_mode().as_str(),
    );

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// 정규화 문자열의 구분자(`|`, `=`, `,`)가 필터 값 안에 들어 있으면
/// 구분자와 섞여버립니다. 예를 들어 query `"x|c=y"` 와
/// query `"x"` + company `"y|c="` 는 이스케이프 없이는 같은 문자열이 됩니다.
/// 역슬래시를 가장 먼저 치환해야 이스케이프 결과가 다시 이스케이프로
/// 읽히지 않습니다.
fn canonical_part(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace('=', "\\=")
        .replace(',', "\\,")
}

/// 검색 결과 캐시 키: `contacts:search:<필터 해시>`
pub fn search_key(filter: &ContactFilter) -> String {
    format!("contacts:search:{}", filter_hash(filter))
}

/// 내보내기 행 집합 캐시 키: `contacts:export:<필터 해시>`
pub fn export_key(filter: &ContactFilter) -> String {
    format!("contacts:export:{}", filter_hash(filter))
}

/// 자동완성 캐시 키: `contacts:suggest:<검색어 해시>`
pub fn suggest_key(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.trim().as_bytes());
    format!("contacts:suggest:{:x}", hasher.finalize())
}

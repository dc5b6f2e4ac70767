//! # 서비스 계층 (비즈니스 로직)
//!
//! DB 계층(db/)과 라우트 핸들러(routes/) 사이의 도메인 로직을 담당합니다.
//! HTTP나 SQL을 직접 다루지 않는 순수 로직이 이곳에 모입니다:
//! - `cache`: 조회 결과를 TTL 기반으로 보관하는 인메모리 캐시
//! - `export`: 연락처 목록을 CSV 문서로 변환
//! - `grouping`: 연락처 목록을 회사/직함별로 묶기
//! - `vcard`: vCard 3.0 텍스트 생성과 QR 코드 SVG 렌더링

pub mod cache;
pub mod export;
pub mod grouping;
pub mod vcard;

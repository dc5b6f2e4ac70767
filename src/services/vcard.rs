//! # vCard / QR 코드 생성 모듈
//!
//! 연락처 한 건을 vCard 3.0 텍스트로 변환하고, 그 텍스트를 QR 코드 SVG로
//! 렌더링합니다. 스마트폰 카메라로 QR을 찍으면 주소록에 바로 저장되는
//! 형식입니다.
//!
//! ## vCard 3.0 형식 (RFC 2426)
//! - 각 줄은 `속성:값` 형태이고 줄바꿈은 **CRLF**(\r\n)여야 합니다
//! - 값 안의 백슬래시/세미콜론/쉼표/줄바꿈은 백슬래시로 이스케이프합니다
//! - `N`(구조화된 이름)은 `성;이름;추가이름;접두어;접미어` 형태입니다
//!
//! QR 심볼 생성 자체(오류 정정, 마스킹 등)는 `qrcode` 크레이트에 위임하고,
//! 이 모듈은 vCard 내용 구성과 렌더링 옵션만 책임집니다.

use base64::{engine::general_purpose::STANDARD, Engine};
use qrcode::{render::svg, QrCode};

use crate::error::AppError;
use crate::models::Contact;

/// 연락처를 vCard 3.0 텍스트로 변환합니다.
///
/// ## 출력 속성 순서
/// BEGIN → VERSION → FN → N → EMAIL → TEL(전화번호가 있을 때만) → ORG →
/// TITLE → END. 회사(ORG)와 직함(TITLE)은 필수 필드이므로 항상 출력되고,
/// 전화번호만 조건부입니다.
pub fn contact_vcard(contact: &Contact) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(9);

    lines.push("BEGIN:VCARD".to_string());
    lines.push("VERSION:3.0".to_string());
    lines.push(format!(
        "FN:{} {}",
        escape(&contact.first_name),
        escape(&contact.last_name)
    ));
    // N: 성;이름;추가이름;접두어;접미어 — 뒤의 세 칸은 사용하지 않으므로 빈 값
    lines.push(format!(
        "N:{};{};;;",
        escape(&contact.last_name),
        escape(&contact.first_name)
    ));
    lines.push(format!("EMAIL:{}", escape(&contact.email)));

    // TEL은 전화번호가 실제로 있을 때만 출력합니다 (빈 문자열도 없음으로 취급)
    if let Some(phone) = &contact.phone {
        if !phone.trim().is_empty() {
            lines.push(format!("TEL:{}", escape(phone)));
        }
    }

    lines.push(format!("ORG:{}", escape(&contact.company)));
    lines.push(format!("TITLE:{}", escape(&contact.position)));
    lines.push("END:VCARD".to_string());

    // join은 줄 사이에만 CRLF를 넣으므로 마지막 줄의 CRLF는 직접 붙입니다
    lines.join("\r\n") + "\r\n"
}

/// vCard 값 이스케이프 (RFC 2426 §2.4.2)
///
/// 백슬래시를 **가장 먼저** 치환해야 합니다 — 나중에 하면 이스케이프용으로
/// 넣은 백슬래시까지 다시 이스케이프되어 값이 망가집니다.
/// 줄바꿈은 CRLF 쌍을 먼저 하나의 `\n`으로 접고, 남은 낱개 CR/LF도 각각
/// 치환합니다. 값에 원시 CR이나 LF가 살아남으면 줄 구조가 깨집니다.
fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace("\r\n", "\\n")
        .replace('\r', "\\n")
        .replace('\n', "\\n")
}

/// 연락처의 vCard를 QR 코드 SVG로 렌더링합니다.
///
/// `min_dimensions(200, 200)`: SVG의 최소 크기를 200×200으로 지정합니다.
/// QR 모듈 수에 맞춰 정수 배율로 확대되므로 실제 크기는 200 이상이 됩니다.
///
/// # 에러
/// vCard 텍스트가 QR 용량을 넘으면 `Internal` 에러를 반환합니다.
/// (일반적인 연락처 길이에서는 발생하지 않습니다)
pub fn vcard_qr_svg(contact: &Contact) -> Result<String, AppError> {
    let vcard = contact_vcard(contact);

    let code = QrCode::new(vcard.as_bytes())
        .map_err(|e| AppError::Internal(format!("QR encoding failed: {}", e)))?;

    Ok(code
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .build())
}

/// SVG 문자열을 `data:` URL로 변환합니다.
///
/// AJAX 호출자는 이 값을 `<img src=...>`에 그대로 넣을 수 있습니다.
pub fn svg_data_url(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg.as_bytes()))
}

/// vCard 다운로드 파일명: `<이름>_<성>.vcf`
///
/// HTTP 헤더(Content-Disposition)에 들어가므로 따옴표/제어문자 등
/// 헤더를 깨뜨릴 수 있는 문자는 밑줄로 치환합니다.
pub fn vcard_filename(contact: &Contact) -> String {
    let base = format!("{}_{}", contact.first_name, contact.last_name);
    let safe: String = base
        .chars()
        .map(|c| {
            if c == '"' || c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!("{}.vcf", safe)
}

//! # 연락처 그룹화 모듈
//!
//! 이미 조회된 연락처 목록을 회사/직함별로 묶는 순수 함수들입니다.
//! DB를 건드리지 않으므로 SQL GROUP BY가 아니라 메모리에서 분할합니다 —
//! 그룹 구성원 전체(연락처 JSON)를 응답에 실어야 하기 때문에
//! 어차피 행 전체가 필요하고, 그렇다면 분할은 메모리 쪽이 단순합니다.
//!
//! ## 보장하는 성질
//! - 그룹 키는 필드 값 **정확 일치** ("ABC Corp"와 "abc corp"는 다른 그룹)
//! - 모든 입력 연락처는 정확히 하나의 그룹에 속합니다 (누락/중복 없음)
//! - `count`는 항상 해당 그룹의 `contacts.len()`과 같습니다
//! - 그룹은 키 오름차순, 구성원은 (성, 이름) 오름차순으로 정렬됩니다

use std::collections::BTreeMap;

use crate::models::{CompanyGroup, ContactResponse, PositionGroup};

/// 연락처 목록을 회사별로 묶습니다.
///
/// # 매개변수
/// - `contacts`: 분할할 연락처 목록 (소유권을 가져와 그룹으로 재배치합니다)
///
/// # 반환값
/// 회사명 오름차순으로 정렬된 `CompanyGroup` 목록
pub fn group_by_company(contacts: Vec<ContactResponse>) -> Vec<CompanyGroup> {
    partition_by(contacts, |c| c.company.clone())
        .into_iter()
        .map(|(company, contacts)| CompanyGroup {
            company,
            count: contacts.len(),
            contacts,
        })
        .collect()
}

/// 연락처 목록을 직함별로 묶습니다.
///
/// # 반환값
/// 직함 오름차순으로 정렬된 `PositionGroup` 목록
pub fn group_by_position(contacts: Vec<ContactResponse>) -> Vec<PositionGroup> {
    partition_by(contacts, |c| c.position.clone())
        .into_iter()
        .map(|(position, contacts)| PositionGroup {
            position,
            count: contacts.len(),
            contacts,
        })
        .collect()
}

/// 키 추출 함수로 연락처를 분할하는 공통 구현입니다.
///
/// BTreeMap을 쓰는 이유: 키를 넣는 순서와 무관하게 **항상 키 오름차순**으로
/// 순회됩니다. HashMap + 마지막에 정렬하는 방법도 되지만, BTreeMap이
/// "그룹은 키순"이라는 성질을 자료구조 차원에서 보장합니다.
///
/// `F: Fn(&ContactResponse) -> String`: 키 추출 클로저를 제네릭으로 받아
/// 회사/직함 두 경우를 한 구현으로 처리합니다.
fn partition_by<F>(contacts: Vec<ContactResponse>, key_of: F) -> BTreeMap<String, Vec<ContactResponse>>
where
    F: Fn(&ContactResponse) -> String,
{
    let mut groups: BTreeMap<String, Vec<ContactResponse>> = BTreeMap::new();

    for contact in contacts {
        // entry API: 키가 없으면 빈 Vec을 만들고, 있으면 기존 Vec을 돌려줍니다
        groups.entry(key_of(&contact)).or_default().push(contact);
    }

    // 구성원 정렬: (성, 이름) 오름차순 — 검색 결과가 이미 이 순서이긴 하지만,
    // 호출자가 어떤 순서로 넘겨도 같은 결과가 나오도록 여기서 다시 보장합니다
    for members in groups.values_mut() {
        members.sort_by(|a, b| {
            (a.last_name.as_str(), a.first_name.as_str())
                .cmp(&(b.last_name.as_str(), b.first_name.as_str()))
        });
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Contact;

    fn contact(first: &str, last: &str, company: &str, position: &str) -> ContactResponse {
        ContactResponse::from_contact(
            Contact {
                id: uuid::Uuid::now_v7().to_string(),
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
                phone: None,
                company: company.to_string(),
                position: position.to_string(),
                created_by: None,
                created_at: "2025-01-15T10:30:00.000Z".to_string(),
                updated_at: "2025-01-15T10:30:00.000Z".to_string(),
            },
            vec![],
        )
    }

    #[test]
    fn groups_by_company_with_counts() {
        let contacts = vec![
            contact("Anna", "Kowalska", "ABC Corp", "Developer"),
            contact("Jan", "Nowak", "XYZ Ltd", "Manager"),
            contact("Piotr", "Wiśniewski", "ABC Corp", "Tester"),
        ];

        let groups = group_by_company(contacts);

        assert_eq!(groups.len(), 2);
        // 그룹은 회사명 오름차순
        assert_eq!(groups[0].company, "ABC Corp");
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[1].company, "XYZ Ltd");
        assert_eq!(groups[1].count, 1);
    }

    #[test]
    fn exact_key_match_separates_case_variants() {
        let contacts = vec![
            contact("Anna", "Kowalska", "ABC Corp", "Developer"),
            contact("Jan", "Nowak", "abc corp", "Developer"),
        ];

        let groups = group_by_company(contacts);
        // 정확 일치이므로 대소문자가 다르면 다른 그룹입니다
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn every_contact_lands_in_exactly_one_group() {
        let contacts = vec![
            contact("Anna", "Kowalska", "ABC Corp", "Developer"),
            contact("Jan", "Nowak", "XYZ Ltd", "Developer"),
            contact("Piotr", "Wiśniewski", "ABC Corp", "Manager"),
            contact("Maria", "Lewandowska", "Delta", "Manager"),
        ];
        let mut input_ids: Vec<String> = contacts.iter().map(|c| c.id.clone()).collect();

        let groups = group_by_position(contacts);

        let mut grouped_ids: Vec<String> = groups
            .iter()
            .flat_map(|g| g.contacts.iter().map(|c| c.id.clone()))
            .collect();

        input_ids.sort();
        grouped_ids.sort();
        // 누락도 중복도 없이 입력 전체가 그룹에 분배되어야 합니다
        assert_eq!(input_ids, grouped_ids);

        for group in &groups {
            assert_eq!(group.count, group.contacts.len());
        }
    }

    #[test]
    fn members_sorted_by_last_then_first_name() {
        let contacts = vec![
            contact("Zofia", "Nowak", "ABC Corp", "Developer"),
            contact("Adam", "Nowak", "ABC Corp", "Developer"),
            contact("Ewa", "Adamska", "ABC Corp", "Developer"),
        ];

        let groups = group_by_company(contacts);
        let names: Vec<&str> = groups[0]
            .contacts
            .iter()
            .map(|c| c.full_name.as_str())
            .collect();

        // 성 우선, 같은 성 안에서는 이름순
        assert_eq!(names, vec!["Ewa Adamska", "Adam Nowak", "Zofia Nowak"]);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_by_company(vec![]).is_empty());
        assert!(group_by_position(vec![]).is_empty());
    }
}

//! 医生端患者列表：排序与分页

use std::cmp::Ordering;

use crate::Patient;
use crate::date::{display_date, timestamp_millis};

/// 每页行数
pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Name,
    Email,
    Tests,
    LatestTest,
}

impl SortColumn {
    pub const ALL: [SortColumn; 4] = [Self::Name, Self::Email, Self::Tests, Self::LatestTest];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Email => "Email",
            Self::Tests => "Tests",
            Self::LatestTest => "Latest Test",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub column: SortColumn,
    pub direction: SortDirection,
}

/// 点击表头：未排序 -> 升序 -> 降序 -> 未排序；切换列时从升序开始
pub fn toggle_sort(current: Option<SortOrder>, column: SortColumn) -> Option<SortOrder> {
    match current {
        Some(SortOrder {
            column: c,
            direction: SortDirection::Ascending,
        }) if c == column => Some(SortOrder {
            column,
            direction: SortDirection::Descending,
        }),
        Some(SortOrder {
            column: c,
            direction: SortDirection::Descending,
        }) if c == column => None,
        _ => Some(SortOrder {
            column,
            direction: SortDirection::Ascending,
        }),
    }
}

fn compare(a: &Patient, b: &Patient, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Name => a
            .first_name
            .to_lowercase()
            .cmp(&b.first_name.to_lowercase())
            .then_with(|| a.last_name.to_lowercase().cmp(&b.last_name.to_lowercase())),
        SortColumn::Email => a.email.to_lowercase().cmp(&b.email.to_lowercase()),
        SortColumn::Tests => a.test_count.cmp(&b.test_count),
        // 没有检测记录的患者视为最早
        SortColumn::LatestTest => latest_millis(a).cmp(&latest_millis(b)),
    }
}

fn latest_millis(patient: &Patient) -> Option<i64> {
    patient.latest_test_date.as_deref().and_then(timestamp_millis)
}

/// 稳定排序；`None` 保持后端返回顺序
pub fn sorted(patients: &[Patient], order: Option<SortOrder>) -> Vec<Patient> {
    let mut rows = patients.to_vec();
    if let Some(order) = order {
        rows.sort_by(|a, b| {
            let ord = compare(a, b, order.column);
            match order.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
    }
    rows
}

/// 一页数据
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 从 1 开始
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn has_prev(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }
}

/// 取第 `number` 页（从 1 开始），超出范围时取最近的有效页
pub fn paginate<T: Clone>(rows: &[T], number: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_pages = rows.len().div_ceil(per_page).max(1);
    let number = number.clamp(1, total_pages);
    let start = (number - 1) * per_page;
    let items = rows.iter().skip(start).take(per_page).cloned().collect();
    Page {
        items,
        number,
        total_pages,
        total_items: rows.len(),
    }
}

/// 表格中的最近检测日期
pub fn latest_test_label(patient: &Patient) -> String {
    match patient.latest_test_date.as_deref() {
        Some(date) if !date.trim().is_empty() => display_date(date),
        _ => "No tests".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityId;

    fn patient(id: i64, first: &str, email: &str, tests: u32, latest: Option<&str>) -> Patient {
        Patient {
            id: EntityId::from(id),
            first_name: first.to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            test_count: tests,
            latest_test_date: latest.map(str::to_string),
        }
    }

    fn roster() -> Vec<Patient> {
        vec![
            patient(1, "carla", "c@x.com", 4, Some("2024-03-01")),
            patient(2, "Ana", "b@x.com", 1, None),
            patient(3, "Bruno", "a@x.com", 9, Some("2024-01-15T08:00:00Z")),
        ]
    }

    fn ids(rows: &[Patient]) -> Vec<&str> {
        rows.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_sort_columns() {
        let rows = roster();
        let asc = |column| {
            Some(SortOrder {
                column,
                direction: SortDirection::Ascending,
            })
        };
        assert_eq!(ids(&sorted(&rows, asc(SortColumn::Name))), vec!["2", "3", "1"]);
        assert_eq!(ids(&sorted(&rows, asc(SortColumn::Email))), vec!["3", "2", "1"]);
        assert_eq!(ids(&sorted(&rows, asc(SortColumn::Tests))), vec!["2", "1", "3"]);
        assert_eq!(ids(&sorted(&rows, asc(SortColumn::LatestTest))), vec!["2", "3", "1"]);
        assert_eq!(ids(&sorted(&rows, None)), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_descending() {
        let order = Some(SortOrder {
            column: SortColumn::Tests,
            direction: SortDirection::Descending,
        });
        assert_eq!(ids(&sorted(&roster(), order)), vec!["3", "1", "2"]);
    }

    #[test]
    fn test_toggle_cycle() {
        let first = toggle_sort(None, SortColumn::Email);
        assert_eq!(first.map(|o| o.direction), Some(SortDirection::Ascending));
        let second = toggle_sort(first, SortColumn::Email);
        assert_eq!(second.map(|o| o.direction), Some(SortDirection::Descending));
        assert_eq!(toggle_sort(second, SortColumn::Email), None);

        let switched = toggle_sort(second, SortColumn::Name).unwrap();
        assert_eq!(switched.column, SortColumn::Name);
        assert_eq!(switched.direction, SortDirection::Ascending);
    }

    #[test]
    fn test_pagination() {
        let rows: Vec<u32> = (1..=23).collect();
        let first = paginate(&rows, 1, PAGE_SIZE);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_items, 23);
        assert!(!first.has_prev());
        assert!(first.has_next());

        let last = paginate(&rows, 3, PAGE_SIZE);
        assert_eq!(last.items, vec![21, 22, 23]);
        assert!(!last.has_next());

        assert_eq!(paginate(&rows, 99, PAGE_SIZE).number, 3);
        assert_eq!(paginate(&rows, 0, PAGE_SIZE).number, 1);

        let empty: Page<u32> = paginate(&[], 1, PAGE_SIZE);
        assert_eq!(empty.total_pages, 1);
        assert_eq!(empty.total_items, 0);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn test_latest_test_label() {
        let rows = roster();
        assert_eq!(latest_test_label(&rows[0]), "3/1/2024");
        assert_eq!(latest_test_label(&rows[1]), "No tests");
    }
}

//! 查询参数解析

use phonebook_common::Pagination;
use phonebook_errors::FieldErrors;

use crate::domain::value_objects::{AreaCode, ListOrdering, LocalNumber, SortField, SortOrder};

/// 搜索默认返回条数
pub const DEFAULT_TOP: u32 = 50;
/// 搜索最大返回条数
pub const MAX_TOP: u32 = 100;
/// 后台列表每页条数
pub const DASHBOARD_PAGE_SIZE: u32 = 25;

/// 最近号码搜索
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub area_code: AreaCode,
    pub target: LocalNumber,
    pub top: u32,
}

impl SearchQuery {
    /// 校验原始查询参数，所有字段错误一起返回
    pub fn parse(area_code: Option<&str>, digits: Option<&str>, top: Option<&str>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let area_code = AreaCode::new(area_code.unwrap_or_default())
            .map_err(|_| errors.add("area_code", "area_code must be exactly 3 digits."))
            .ok();
        let target = LocalNumber::new(digits.unwrap_or_default())
            .map_err(|_| errors.add("digits", "digits must be exactly 7 digits."))
            .ok();
        let top = match parse_top(top) {
            Ok(top) => Some(top),
            Err(message) => {
                errors.add("top", message);
                None
            }
        };

        match (area_code, target, top) {
            (Some(area_code), Some(target), Some(top)) if errors.is_empty() => Ok(Self {
                area_code,
                target,
                top,
            }),
            _ => Err(errors),
        }
    }
}

/// 空值视为未提供
fn parse_top(raw: Option<&str>) -> Result<u32, &'static str> {
    let raw = match raw {
        None | Some("") => return Ok(DEFAULT_TOP),
        Some(raw) => raw,
    };
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err("top must be an integer between 1 and 100.");
    }
    match raw.parse::<u64>() {
        Ok(top) if (1..=u64::from(MAX_TOP)).contains(&top) => Ok(top as u32),
        _ => Err("top must be between 1 and 100."),
    }
}

/// 后台列表查询
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub ordering: ListOrdering,
    pub pagination: Pagination,
}

impl ListQuery {
    pub fn parse(sort: Option<&str>, order: Option<&str>, page: Option<&str>) -> Self {
        Self {
            ordering: ListOrdering::new(SortField::parse(sort), SortOrder::parse(order)),
            pagination: Pagination::from_query(page, DASHBOARD_PAGE_SIZE),
        }
    }
}

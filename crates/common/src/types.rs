//! 通用类型定义

use serde::{Deserialize, Serialize};

/// 分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// 从查询字符串解析页码，无法解析时回到第一页
    pub fn from_query(page: Option<&str>, page_size: u32) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(1);
        Self::new(page, page_size)
    }

    pub fn offset(&self) -> u32 {
        (self.page.saturating_sub(1)) * self.page_size
    }

    /// 超出范围的页码收敛到最后一页
    pub fn clamp_to(self, total: u64) -> Self {
        let last = total_pages(total, self.page_size).max(1);
        Self {
            page: self.page.min(last),
            page_size: self.page_size,
        }
    }
}

fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64) as u32
}

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: &Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
            total_pages: total_pages(total, pagination.page_size),
        }
    }

    /// 当前页第一行之前的序号（用于列表编号）
    pub fn serial_start(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.page_size as u64
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        assert_eq!(Pagination::new(1, 25).offset(), 0);
        assert_eq!(Pagination::new(3, 25).offset(), 50);
    }

    #[test]
    fn test_from_query_falls_back_to_first_page() {
        assert_eq!(Pagination::from_query(Some("abc"), 25).page, 1);
        assert_eq!(Pagination::from_query(None, 25).page, 1);
        assert_eq!(Pagination::from_query(Some("0"), 25).page, 1);
        assert_eq!(Pagination::from_query(Some(" 4 "), 25).page, 4);
    }

    #[test]
    fn test_clamp_to_last_page() {
        let p = Pagination::new(9, 25).clamp_to(60);
        assert_eq!(p.page, 3);

        // 空表时保持第一页
        let p = Pagination::new(5, 25).clamp_to(0);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn test_total_pages() {
        let result: PagedResult<u8> = PagedResult::new(vec![], 51, &Pagination::new(1, 25));
        assert_eq!(result.total_pages, 3);

        let result: PagedResult<u8> = PagedResult::new(vec![], 50, &Pagination::new(2, 25));
        assert_eq!(result.total_pages, 2);
        assert_eq!(result.serial_start(), 25);
    }
}

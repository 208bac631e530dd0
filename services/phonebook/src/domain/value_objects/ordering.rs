//! 列表排序

use serde::Serialize;

/// 允许排序的列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    AreaCode,
    LocalNumber,
    Cost,
}

impl SortField {
    /// 不在白名单中的值回退到默认列
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("local_number") => Self::LocalNumber,
            Some("cost") => Self::Cost,
            _ => Self::AreaCode,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::AreaCode => "area_code",
            Self::LocalNumber => "local_number",
            Self::Cost => "cost",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// 排序规格
///
/// 主排序列之后固定以 (area_code, local_number) 升序兜底，保证分页稳定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ListOrdering {
    pub sort: SortField,
    pub order: SortOrder,
}

impl ListOrdering {
    pub fn new(sort: SortField, order: SortOrder) -> Self {
        Self { sort, order }
    }

    pub fn order_by_clause(&self) -> String {
        format!(
            "{} {}, area_code ASC, local_number ASC",
            self.sort.column(),
            self.order.keyword()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_values_fall_back() {
        assert_eq!(SortField::parse(Some("id; DROP TABLE")), SortField::AreaCode);
        assert_eq!(SortField::parse(None), SortField::AreaCode);
        assert_eq!(SortOrder::parse(Some("sideways")), SortOrder::Asc);
    }

    #[test]
    fn test_order_by_clause() {
        let ordering = ListOrdering::new(SortField::Cost, SortOrder::Desc);
        assert_eq!(
            ordering.order_by_clause(),
            "cost DESC, area_code ASC, local_number ASC"
        );
    }
}

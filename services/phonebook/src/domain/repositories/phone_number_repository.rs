//! 号码 Repository trait

use async_trait::async_trait;
use phonebook_common::Pagination;
use phonebook_errors::AppResult;

use crate::domain::entities::{NewPhoneNumber, PhoneNumber, PhoneNumberId};
use crate::domain::value_objects::{AreaCode, ListOrdering, LocalNumber};

/// upsert 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(PhoneNumber),
    Updated(PhoneNumber),
}

impl UpsertOutcome {
    pub fn number(&self) -> &PhoneNumber {
        match self {
            Self::Inserted(n) | Self::Updated(n) => n,
        }
    }

    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

#[async_trait]
pub trait PhoneNumberRepository: Send + Sync {
    async fn find_by_id(&self, id: PhoneNumberId) -> AppResult<Option<PhoneNumber>>;

    /// 插入新号码；(area_code, local_number) 已存在时返回 Conflict
    async fn insert(&self, number: &NewPhoneNumber) -> AppResult<PhoneNumber>;

    /// 整体替换一条号码；不存在返回 NotFound，与其他行冲突返回 Conflict
    async fn update(&self, id: PhoneNumberId, number: &NewPhoneNumber) -> AppResult<PhoneNumber>;

    /// 按 (area_code, local_number) 插入或更新费用
    async fn upsert(&self, number: &NewPhoneNumber) -> AppResult<UpsertOutcome>;

    /// 删除一条号码，返回是否存在
    async fn delete(&self, id: PhoneNumberId) -> AppResult<bool>;

    /// 删除全部号码，返回删除行数
    async fn delete_all(&self) -> AppResult<u64>;

    async fn count(&self) -> AppResult<u64>;

    /// 分页列表
    async fn list(&self, ordering: ListOrdering, pagination: &Pagination) -> AppResult<Vec<PhoneNumber>>;

    /// 去重后升序的区号
    async fn distinct_area_codes(&self) -> AppResult<Vec<AreaCode>>;

    /// 同区号内按与 `target` 的数值距离升序，距离相同按号码字符串升序
    async fn search_nearest(
        &self,
        area_code: &AreaCode,
        target: &LocalNumber,
        limit: u32,
    ) -> AppResult<Vec<PhoneNumber>>;
}

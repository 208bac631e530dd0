//! 号码目录处理器：搜索、后台 CRUD 与 CSV 导入

use std::sync::Arc;

use metrics::counter;
use phonebook_common::PagedResult;
use phonebook_errors::{AppError, AppResult, FieldErrors};
use tracing::{debug, info};

use crate::application::commands::PhoneNumberForm;
use crate::application::csv_import::{CsvImporter, ImportError, ImportSummary};
use crate::application::queries::{ListQuery, SearchQuery};
use crate::domain::entities::{PhoneNumber, PhoneNumberId};
use crate::domain::repositories::PhoneNumberRepository;
use crate::domain::value_objects::{AreaCode, ListOrdering};

/// 后台列表的一页
#[derive(Debug, Clone)]
pub struct PhoneNumberPage {
    pub page: PagedResult<PhoneNumber>,
    pub ordering: ListOrdering,
}

pub struct CatalogHandler {
    repository: Arc<dyn PhoneNumberRepository>,
    importer: CsvImporter,
}

impl CatalogHandler {
    pub fn new(repository: Arc<dyn PhoneNumberRepository>) -> Self {
        Self {
            importer: CsvImporter::new(repository.clone()),
            repository,
        }
    }

    pub async fn area_codes(&self) -> AppResult<Vec<AreaCode>> {
        self.repository.distinct_area_codes().await
    }

    pub async fn search(&self, query: &SearchQuery) -> AppResult<Vec<PhoneNumber>> {
        counter!("phonebook_search_total").increment(1);
        let results = self
            .repository
            .search_nearest(&query.area_code, &query.target, query.top)
            .await?;
        debug!(
            area_code = %query.area_code,
            digits = %query.target,
            top = query.top,
            found = results.len(),
            "Search completed"
        );
        Ok(results)
    }

    /// 页码超出范围时返回最后一页
    pub async fn list(&self, query: &ListQuery) -> AppResult<PhoneNumberPage> {
        let total = self.repository.count().await?;
        let pagination = query.pagination.clamp_to(total);
        let items = self.repository.list(query.ordering, &pagination).await?;
        Ok(PhoneNumberPage {
            page: PagedResult::new(items, total, &pagination),
            ordering: query.ordering,
        })
    }

    pub async fn get(&self, id: PhoneNumberId) -> AppResult<PhoneNumber> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Phone number {} not found", id)))
    }

    pub async fn create(&self, form: &PhoneNumberForm) -> AppResult<PhoneNumber> {
        let number = form.validate()?;
        let created = self.repository.insert(&number).await.map_err(|e| {
            if e.is_conflict() {
                AppError::conflict("This phone number already exists.")
            } else {
                e
            }
        })?;
        info!(id = %created.id, full_number = %created.full_number(), "Phone number created");
        Ok(created)
    }

    pub async fn update(&self, id: PhoneNumberId, form: &PhoneNumberForm) -> AppResult<PhoneNumber> {
        // 先确认存在，未知 id 不应被表单错误掩盖
        self.get(id).await?;
        let number = form.validate()?;
        let updated = self.repository.update(id, &number).await.map_err(|e| {
            if e.is_conflict() {
                AppError::conflict("Another entry with this area code and phone number already exists.")
            } else {
                e
            }
        })?;
        info!(id = %updated.id, full_number = %updated.full_number(), "Phone number updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: PhoneNumberId) -> AppResult<()> {
        if !self.repository.delete(id).await? {
            return Err(AppError::not_found(format!("Phone number {} not found", id)));
        }
        info!(id = %id, "Phone number deleted");
        Ok(())
    }

    pub async fn count(&self) -> AppResult<u64> {
        self.repository.count().await
    }

    /// 删除全部号码；必须显式确认
    pub async fn delete_all(&self, confirmed: bool) -> AppResult<u64> {
        if !confirmed {
            return Err(FieldErrors::single("confirm", "Confirm deletion of all phone numbers.").into());
        }
        let deleted = self.repository.delete_all().await?;
        info!(deleted, "All phone numbers deleted");
        Ok(deleted)
    }

    pub async fn import_csv(&self, bytes: &[u8]) -> Result<ImportSummary, ImportError> {
        self.importer.import(bytes).await
    }
}

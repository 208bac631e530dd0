//! 内存 Repository 实现，用于测试与无数据库的本地运行

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use phonebook_common::Pagination;
use phonebook_errors::{AppError, AppResult};
use tokio::sync::RwLock;

use crate::domain::entities::{DashboardUser, NewPhoneNumber, PhoneNumber, PhoneNumberId};
use crate::domain::repositories::{PhoneNumberRepository, UpsertOutcome, UserRepository};
use crate::domain::services::rank_by_distance;
use crate::domain::value_objects::{
    AreaCode, HashedPassword, ListOrdering, LocalNumber, SortField, SortOrder, Username,
};

#[derive(Default)]
struct PhoneNumberTable {
    next_id: i64,
    rows: BTreeMap<i64, PhoneNumber>,
}

impl PhoneNumberTable {
    fn find_key(&self, area_code: &AreaCode, local_number: &LocalNumber) -> Option<i64> {
        self.rows
            .values()
            .find(|n| n.same_key(area_code, local_number))
            .map(|n| n.id.0)
    }

    fn allocate(&mut self, number: NewPhoneNumber) -> PhoneNumber {
        self.next_id += 1;
        let entity = number.into_entity(PhoneNumberId(self.next_id));
        self.rows.insert(self.next_id, entity.clone());
        entity
    }
}

#[derive(Default)]
pub struct InMemoryPhoneNumberRepository {
    table: RwLock<PhoneNumberTable>,
}

impl InMemoryPhoneNumberRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare(a: &PhoneNumber, b: &PhoneNumber, ordering: ListOrdering) -> Ordering {
    let primary = match ordering.sort {
        SortField::AreaCode => a.area_code.cmp(&b.area_code),
        SortField::LocalNumber => a.local_number.cmp(&b.local_number),
        SortField::Cost => a.cost.cmp(&b.cost),
    };
    let primary = match ordering.order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary
        .then_with(|| a.area_code.cmp(&b.area_code))
        .then_with(|| a.local_number.cmp(&b.local_number))
}

fn duplicate_key() -> AppError {
    AppError::conflict("Duplicate entry violates unique constraint")
}

#[async_trait]
impl PhoneNumberRepository for InMemoryPhoneNumberRepository {
    async fn find_by_id(&self, id: PhoneNumberId) -> AppResult<Option<PhoneNumber>> {
        Ok(self.table.read().await.rows.get(&id.0).cloned())
    }

    async fn insert(&self, number: &NewPhoneNumber) -> AppResult<PhoneNumber> {
        let mut table = self.table.write().await;
        if table.find_key(&number.area_code, &number.local_number).is_some() {
            return Err(duplicate_key());
        }
        Ok(table.allocate(number.clone()))
    }

    async fn update(&self, id: PhoneNumberId, number: &NewPhoneNumber) -> AppResult<PhoneNumber> {
        let mut table = self.table.write().await;
        if !table.rows.contains_key(&id.0) {
            return Err(AppError::not_found(format!("Phone number {} not found", id)));
        }
        if table
            .find_key(&number.area_code, &number.local_number)
            .is_some_and(|existing| existing != id.0)
        {
            return Err(duplicate_key());
        }
        let entity = number.clone().into_entity(id);
        table.rows.insert(id.0, entity.clone());
        Ok(entity)
    }

    async fn upsert(&self, number: &NewPhoneNumber) -> AppResult<UpsertOutcome> {
        let mut table = self.table.write().await;
        match table.find_key(&number.area_code, &number.local_number) {
            Some(id) => {
                let entity = number.clone().into_entity(PhoneNumberId(id));
                table.rows.insert(id, entity.clone());
                Ok(UpsertOutcome::Updated(entity))
            }
            None => Ok(UpsertOutcome::Inserted(table.allocate(number.clone()))),
        }
    }

    async fn delete(&self, id: PhoneNumberId) -> AppResult<bool> {
        Ok(self.table.write().await.rows.remove(&id.0).is_some())
    }

    async fn delete_all(&self) -> AppResult<u64> {
        let mut table = self.table.write().await;
        let deleted = table.rows.len() as u64;
        table.rows.clear();
        Ok(deleted)
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.table.read().await.rows.len() as u64)
    }

    async fn list(&self, ordering: ListOrdering, pagination: &Pagination) -> AppResult<Vec<PhoneNumber>> {
        let table = self.table.read().await;
        let mut rows: Vec<PhoneNumber> = table.rows.values().cloned().collect();
        rows.sort_by(|a, b| compare(a, b, ordering));
        Ok(rows
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.page_size as usize)
            .collect())
    }

    async fn distinct_area_codes(&self) -> AppResult<Vec<AreaCode>> {
        let table = self.table.read().await;
        let mut codes: Vec<AreaCode> = table.rows.values().map(|n| n.area_code.clone()).collect();
        codes.sort();
        codes.dedup();
        Ok(codes)
    }

    async fn search_nearest(
        &self,
        area_code: &AreaCode,
        target: &LocalNumber,
        limit: u32,
    ) -> AppResult<Vec<PhoneNumber>> {
        let table = self.table.read().await;
        Ok(rank_by_distance(
            table.rows.values().cloned(),
            area_code,
            target,
            limit as usize,
        ))
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<DashboardUser>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<DashboardUser>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> AppResult<Option<DashboardUser>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| &u.username == username)
            .cloned())
    }

    async fn create(&self, username: &Username, password_hash: &HashedPassword) -> AppResult<DashboardUser> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| &u.username == username) {
            return Err(duplicate_key());
        }
        let now = Utc::now();
        let user = DashboardUser {
            id: users.len() as i64 + 1,
            username: username.clone(),
            password_hash: password_hash.clone(),
            session_version: 1,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_password(&self, id: i64, password_hash: &HashedPassword) -> AppResult<i32> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found(format!("Dashboard user {} not found", id)))?;
        user.password_hash = password_hash.clone();
        user.session_version += 1;
        user.updated_at = Utc::now();
        Ok(user.session_version)
    }
}

//! PostgreSQL 号码 Repository 实现

use async_trait::async_trait;
use phonebook_adapter_postgres::map_sqlx_error;
use phonebook_common::Pagination;
use phonebook_errors::{AppError, AppResult};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::entities::{NewPhoneNumber, PhoneNumber, PhoneNumberId};
use crate::domain::repositories::{PhoneNumberRepository, UpsertOutcome};
use crate::domain::value_objects::{AreaCode, Cost, ListOrdering, LocalNumber};

const COLUMNS: &str = "id, area_code, local_number, cost";

pub struct PostgresPhoneNumberRepository {
    pool: PgPool,
}

impl PostgresPhoneNumberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PhoneNumberRow {
    id: i64,
    area_code: String,
    local_number: String,
    cost: Decimal,
}

impl PhoneNumberRow {
    fn into_entity(self) -> AppResult<PhoneNumber> {
        let id = self.id;
        let corrupt = |field: &str| AppError::internal(format!("Stored phone number {} has invalid {}", id, field));
        Ok(PhoneNumber {
            id: PhoneNumberId(id),
            area_code: AreaCode::new(self.area_code).map_err(|_| corrupt("area_code"))?,
            local_number: LocalNumber::new(self.local_number).map_err(|_| corrupt("local_number"))?,
            cost: Cost::from_stored(self.cost),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    number: PhoneNumberRow,
    inserted: bool,
}

#[async_trait]
impl PhoneNumberRepository for PostgresPhoneNumberRepository {
    async fn find_by_id(&self, id: PhoneNumberId) -> AppResult<Option<PhoneNumber>> {
        let row = sqlx::query_as::<_, PhoneNumberRow>(&format!(
            "SELECT {} FROM phone_numbers WHERE id = $1",
            COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(PhoneNumberRow::into_entity).transpose()
    }

    async fn insert(&self, number: &NewPhoneNumber) -> AppResult<PhoneNumber> {
        sqlx::query_as::<_, PhoneNumberRow>(&format!(
            r#"
            INSERT INTO phone_numbers (area_code, local_number, cost)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(number.area_code.as_str())
        .bind(number.local_number.as_str())
        .bind(number.cost.value())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .into_entity()
    }

    async fn update(&self, id: PhoneNumberId, number: &NewPhoneNumber) -> AppResult<PhoneNumber> {
        let row = sqlx::query_as::<_, PhoneNumberRow>(&format!(
            r#"
            UPDATE phone_numbers
            SET area_code = $2, local_number = $3, cost = $4
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id.0)
        .bind(number.area_code.as_str())
        .bind(number.local_number.as_str())
        .bind(number.cost.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.ok_or_else(|| AppError::not_found(format!("Phone number {} not found", id)))?
            .into_entity()
    }

    async fn upsert(&self, number: &NewPhoneNumber) -> AppResult<UpsertOutcome> {
        // xmax = 0 表示本语句新插入的行
        let row = sqlx::query_as::<_, UpsertRow>(&format!(
            r#"
            INSERT INTO phone_numbers (area_code, local_number, cost)
            VALUES ($1, $2, $3)
            ON CONFLICT (area_code, local_number) DO UPDATE SET cost = EXCLUDED.cost
            RETURNING {}, (xmax = 0) AS inserted
            "#,
            COLUMNS
        ))
        .bind(number.area_code.as_str())
        .bind(number.local_number.as_str())
        .bind(number.cost.value())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let entity = row.number.into_entity()?;
        Ok(if row.inserted {
            UpsertOutcome::Inserted(entity)
        } else {
            UpsertOutcome::Updated(entity)
        })
    }

    async fn delete(&self, id: PhoneNumberId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM phone_numbers WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM phone_numbers")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM phone_numbers")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(count as u64)
    }

    async fn list(&self, ordering: ListOrdering, pagination: &Pagination) -> AppResult<Vec<PhoneNumber>> {
        // 排序列来自白名单枚举，可以安全拼接
        let sql = format!(
            "SELECT {} FROM phone_numbers ORDER BY {} LIMIT $1 OFFSET $2",
            COLUMNS,
            ordering.order_by_clause()
        );
        sqlx::query_as::<_, PhoneNumberRow>(&sql)
            .bind(i64::from(pagination.page_size))
            .bind(i64::from(pagination.offset()))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .into_iter()
            .map(PhoneNumberRow::into_entity)
            .collect()
    }

    async fn distinct_area_codes(&self) -> AppResult<Vec<AreaCode>> {
        let codes: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT area_code FROM phone_numbers ORDER BY area_code")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        codes
            .into_iter()
            .map(|code| {
                AreaCode::new(code).map_err(|e| AppError::internal(format!("Stored area code is invalid: {}", e)))
            })
            .collect()
    }

    async fn search_nearest(
        &self,
        area_code: &AreaCode,
        target: &LocalNumber,
        limit: u32,
    ) -> AppResult<Vec<PhoneNumber>> {
        sqlx::query_as::<_, PhoneNumberRow>(&format!(
            r#"
            SELECT {}
            FROM phone_numbers
            WHERE area_code = $1
            ORDER BY ABS(local_number::BIGINT - $2), local_number
            LIMIT $3
            "#,
            COLUMNS
        ))
        .bind(area_code.as_str())
        .bind(i64::from(target.numeric_value()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .into_iter()
        .map(PhoneNumberRow::into_entity)
        .collect()
    }
}

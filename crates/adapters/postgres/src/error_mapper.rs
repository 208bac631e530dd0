//! 数据库错误映射
//!
//! 统一的 SQLx 错误到 AppError 的转换

use phonebook_errors::AppError;

/// 唯一约束冲突
pub const UNIQUE_VIOLATION: &str = "23505";

/// 将 SQLx 错误转换为 AppError，区分不同错误类型
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::RowNotFound => AppError::not_found("Record not found"),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                AppError::conflict("Duplicate entry violates unique constraint")
            }
            Some("23514") => AppError::validation("Check constraint violation"),
            Some("23502") => AppError::validation("Not null constraint violation"),
            Some("22001") => AppError::validation("String data too long"),
            Some("22003") => AppError::validation("Numeric value out of range"),
            Some(code) => AppError::database(format!("Database error ({}): {}", code, db_err)),
            None => AppError::database(db_err.to_string()),
        },
        sqlx::Error::PoolTimedOut => AppError::database("Database connection pool timeout"),
        sqlx::Error::PoolClosed => AppError::database("Database connection pool is closed"),
        other => AppError::database(other.to_string()),
    }
}

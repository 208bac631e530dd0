//! 内嵌的数据库迁移脚本

use phonebook_adapter_postgres::{Migration, MigrationManager, MigrationResult};
use phonebook_errors::AppResult;
use sqlx::PgPool;
use tracing::info;

pub fn migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "create_phone_numbers",
            include_str!("../../../migrations/0001_create_phone_numbers.sql"),
        ),
        Migration::new(
            2,
            "create_dashboard_users",
            include_str!("../../../migrations/0002_create_dashboard_users.sql"),
        ),
    ]
}

pub async fn run_migrations(pool: &PgPool) -> AppResult<MigrationResult> {
    let result = MigrationManager::new(pool.clone()).migrate(&migrations()).await?;
    info!(
        applied = result.applied_count(),
        skipped = result.skipped.len(),
        "Database migrations finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_unique_and_ordered() {
        let versions: Vec<i64> = migrations().iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![1, 2]);
    }

    #[test]
    fn test_scripts_create_expected_tables() {
        let all = migrations();
        assert!(all[0].up_sql.contains("unique_area_code_local_number"));
        assert!(all[1].up_sql.contains("dashboard_users"));
    }
}

//! Row-level security for every tenant-owned table.
//!
//! Tenant-scoped transactions run `SET LOCAL ROLE restaurant_app_user` and bind
//! `app.current_restaurant` / `app.current_user_role`. The policies below only
//! admit rows of the bound restaurant, plus platform organization rows when the
//! bound role is KAM or Admin. An unbound session sees nothing.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

use crate::{APP_DB_ROLE, CURRENT_RESTAURANT_SETTING, CURRENT_ROLE_SETTING, TENANT_TABLES};

#[derive(DeriveMigrationName)]
pub struct Migration;

const CREATE_APP_ROLE: &str = r#"
DO $$
BEGIN
    IF NOT EXISTS (SELECT 1 FROM pg_roles WHERE rolname = 'restaurant_app_user') THEN
        CREATE ROLE restaurant_app_user NOLOGIN;
    END IF;
END
$$;
"#;

fn tenant_predicate() -> String {
    format!(
        "restaurant_id = NULLIF(current_setting('{CURRENT_RESTAURANT_SETTING}', true), '')::BIGINT \
         OR (restaurant_id = 1 AND current_setting('{CURRENT_ROLE_SETTING}', true) IN ('KAM', 'Admin'))"
    )
}

fn policy_name(table: &str) -> String {
    format!("isolate_{table}")
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() != DatabaseBackend::Postgres {
            return Ok(());
        }

        let db = manager.get_connection();
        db.execute_unprepared(CREATE_APP_ROLE).await?;
        db.execute_unprepared(&format!("GRANT {APP_DB_ROLE} TO CURRENT_USER"))
            .await?;
        db.execute_unprepared(&format!("GRANT USAGE ON SCHEMA public TO {APP_DB_ROLE}"))
            .await?;
        db.execute_unprepared(&format!(
            "GRANT SELECT, INSERT, UPDATE, DELETE ON ALL TABLES IN SCHEMA public TO {APP_DB_ROLE}"
        ))
        .await?;
        db.execute_unprepared(&format!(
            "GRANT USAGE, SELECT ON ALL SEQUENCES IN SCHEMA public TO {APP_DB_ROLE}"
        ))
        .await?;

        let predicate = tenant_predicate();
        for table in TENANT_TABLES {
            let policy = policy_name(table);
            db.execute_unprepared(&format!("ALTER TABLE {table} ENABLE ROW LEVEL SECURITY"))
                .await?;
            db.execute_unprepared(&format!("DROP POLICY IF EXISTS {policy} ON {table}"))
                .await?;
            db.execute_unprepared(&format!(
                "CREATE POLICY {policy} ON {table} FOR ALL TO {APP_DB_ROLE} \
                 USING ({predicate}) WITH CHECK ({predicate})"
            ))
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() != DatabaseBackend::Postgres {
            return Ok(());
        }

        let db = manager.get_connection();
        for table in TENANT_TABLES {
            let policy = policy_name(table);
            db.execute_unprepared(&format!("DROP POLICY IF EXISTS {policy} ON {table}"))
                .await?;
            db.execute_unprepared(&format!("ALTER TABLE {table} DISABLE ROW LEVEL SECURITY"))
                .await?;
        }
        db.execute_unprepared(&format!(
            "REVOKE ALL ON ALL TABLES IN SCHEMA public FROM {APP_DB_ROLE}"
        ))
        .await?;
        db.execute_unprepared(&format!(
            "REVOKE ALL ON ALL SEQUENCES IN SCHEMA public FROM {APP_DB_ROLE}"
        ))
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_admits_bound_restaurant_and_platform_staff() {
        let predicate = tenant_predicate();
        assert!(predicate.contains("current_setting('app.current_restaurant', true)"));
        assert!(predicate.contains("restaurant_id = 1"));
        assert!(predicate.contains("IN ('KAM', 'Admin')"));
    }

    #[test]
    fn policy_names_are_per_table() {
        assert_eq!(policy_name("menu_items"), "isolate_menu_items");
    }
}

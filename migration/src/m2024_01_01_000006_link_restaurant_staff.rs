//! Links restaurants to the platform staff that manage and activated them.
//!
//! The restaurants table is created before users, so these foreign keys are
//! added afterwards. SQLite cannot add constraints to an existing table; there
//! the columns stay plain integers.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

use super::m2024_01_01_000001_create_restaurants::Restaurants;
use super::m2024_01_01_000002_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() != DatabaseBackend::Postgres {
            return Ok(());
        }

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_restaurants_kam_id")
                    .from(Restaurants::Table, Restaurants::KamId)
                    .to(Users::Table, Users::Id)
                    .on_delete(ForeignKeyAction::SetNull)
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_restaurants_activated_by")
                    .from(Restaurants::Table, Restaurants::ActivatedBy)
                    .to(Users::Table, Users::Id)
                    .on_delete(ForeignKeyAction::SetNull)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() != DatabaseBackend::Postgres {
            return Ok(());
        }

        manager
            .drop_foreign_key(
                ForeignKey::drop()
                    .name("fk_restaurants_activated_by")
                    .table(Restaurants::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_foreign_key(
                ForeignKey::drop()
                    .name("fk_restaurants_kam_id")
                    .table(Restaurants::Table)
                    .to_owned(),
            )
            .await
    }
}

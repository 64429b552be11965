use migration::{APP_DB_ROLE, CURRENT_RESTAURANT_SETTING, CURRENT_ROLE_SETTING};
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, DatabaseTransaction, DbErr, Statement,
    TransactionTrait,
};

use super::{Role, TenantContext, TenantId};

/// Role bound for unauthenticated requests addressing a restaurant by path.
const GUEST_SESSION_ROLE: &str = "Guest";

/// A database transaction bound to one restaurant.
///
/// On Postgres the binding is issued as the first statements of the
/// transaction, using transaction-local settings (`set_config(.., true)` and
/// `SET LOCAL ROLE`). They end with the transaction, so a pooled connection
/// never carries one request's tenant into the next. Dropping the session
/// without committing rolls back.
///
/// Other backends have no row-level security; there the session is a plain
/// transaction and isolation rests on the repository filters alone.
pub struct TenantSession {
    txn: DatabaseTransaction,
    tenant: TenantId,
}

impl TenantSession {
    /// Binds a transaction to the caller's own restaurant and role.
    pub async fn begin(db: &DatabaseConnection, ctx: &TenantContext) -> Result<Self, DbErr> {
        Self::bind(db, ctx.restaurant_id, ctx.role.as_str()).await
    }

    /// Binds a transaction for an unauthenticated request to `tenant`.
    pub async fn begin_guest(db: &DatabaseConnection, tenant: TenantId) -> Result<Self, DbErr> {
        Self::bind(db, tenant, GUEST_SESSION_ROLE).await
    }

    /// Binds a transaction to `tenant` on behalf of an already authorized
    /// actor acting outside its own restaurant (platform staff provisioning a
    /// tenant, or self-registration into a restaurant).
    pub async fn begin_for(
        db: &DatabaseConnection,
        tenant: TenantId,
        role: Role,
    ) -> Result<Self, DbErr> {
        Self::bind(db, tenant, role.as_str()).await
    }

    async fn bind(db: &DatabaseConnection, tenant: TenantId, role: &str) -> Result<Self, DbErr> {
        let txn = db.begin().await?;

        if txn.get_database_backend() == DatabaseBackend::Postgres {
            txn.query_one(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                "SELECT set_config($1, $2, true), set_config($3, $4, true)",
                [
                    CURRENT_RESTAURANT_SETTING.into(),
                    tenant.get().to_string().into(),
                    CURRENT_ROLE_SETTING.into(),
                    role.into(),
                ],
            ))
            .await?;
            txn.execute_unprepared(&format!("SET LOCAL ROLE {APP_DB_ROLE}"))
                .await?;
        }

        tracing::debug!(restaurant_id = %tenant, role, "Bound tenant session");
        Ok(Self { txn, tenant })
    }

    pub fn tenant(&self) -> TenantId {
        self.tenant
    }

    /// Connection to run every query of the request on.
    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenancy::PLATFORM_ORGANIZATION_ID;
    use sea_orm::Database;

    #[tokio::test]
    async fn sqlite_session_is_a_plain_transaction() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let tenant = TenantId::new(5).unwrap();
        let ctx = TenantContext::new(3, tenant, Role::Staff, "s@r.io", false).unwrap();

        let session = TenantSession::begin(&db, &ctx).await.unwrap();
        assert_eq!(session.tenant(), tenant);
        session
            .conn()
            .execute_unprepared("CREATE TABLE probe (id INTEGER)")
            .await
            .unwrap();
        session.commit().await.unwrap();

        let guest = TenantSession::begin_guest(&db, tenant).await.unwrap();
        assert_eq!(guest.tenant(), tenant);
        drop(guest);

        let scoped = TenantSession::begin_for(&db, PLATFORM_ORGANIZATION_ID, Role::Kam)
            .await
            .unwrap();
        assert!(scoped.tenant().is_platform());
    }
}

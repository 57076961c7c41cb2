//! services/dashboard/src/adapters/db.rs
//!
//! Profile store that talks to the project's Postgres database directly with
//! `sqlx`, bypassing the REST gateway. Selected when `DATABASE_URL` is set.

use async_trait::async_trait;
use dashboard_core::domain::ProfileRecord;
use dashboard_core::ports::{PortError, PortResult, ProfileLookup, ProfileStore};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ProfileStore` port.
#[derive(Clone)]
pub struct DbProfileStore {
    pool: PgPool,
    select_sql: String,
    insert_sql: String,
}

impl DbProfileStore {
    /// Creates a new `DbProfileStore` over `table`, which must be a plain
    /// identifier (see `Config`). The bundled migration only creates `users`.
    pub fn new(pool: PgPool, table: &str) -> Self {
        Self {
            pool,
            select_sql: format!(
                r#"SELECT id, email, username FROM "{}" WHERE email = $1 LIMIT 1"#,
                table
            ),
            insert_sql: format!(
                r#"INSERT INTO "{}" (id, email, username) VALUES ($1, $2, $3)"#,
                table
            ),
        }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ProfileRow {
    id: Uuid,
    email: String,
    username: String,
}
impl ProfileRow {
    fn to_domain(self) -> ProfileRecord {
        ProfileRecord {
            id: self.id,
            email: self.email,
            username: self.username,
        }
    }
}

/// Constraint violations and the like carry a message worth showing; anything
/// else is a transport-level fault.
fn to_port_error(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::Database(db) => PortError::Backend(db.message().to_string()),
        other => PortError::Unexpected(other.to_string()),
    }
}

//=========================================================================================
// `ProfileStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProfileStore for DbProfileStore {
    async fn find_by_email(&self, email: &str) -> ProfileLookup {
        let row = sqlx::query_as::<_, ProfileRow>(&self.select_sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await;

        match row {
            Ok(Some(row)) => ProfileLookup::Found(row.to_domain()),
            Ok(None) => ProfileLookup::NotFound,
            Err(e) => ProfileLookup::Failed(to_port_error(e)),
        }
    }

    async fn insert(&self, profile: &ProfileRecord) -> PortResult<()> {
        sqlx::query(&self.insert_sql)
            .bind(profile.id)
            .bind(&profile.email)
            .bind(&profile.username)
            .execute(&self.pool)
            .await
            .map_err(to_port_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_unexpected() {
        let err = to_port_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, PortError::Unexpected(_)));
    }

    #[tokio::test]
    async fn queries_target_the_configured_table() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/dashboard")
            .unwrap();
        let store = DbProfileStore::new(pool, "profiles");
        assert_eq!(
            store.select_sql,
            r#"SELECT id, email, username FROM "profiles" WHERE email = $1 LIMIT 1"#
        );
        assert_eq!(
            store.insert_sql,
            r#"INSERT INTO "profiles" (id, email, username) VALUES ($1, $2, $3)"#
        );
    }

    #[test]
    fn row_maps_to_domain() {
        let id = Uuid::new_v4();
        let record = ProfileRow {
            id,
            email: "a@x.com".to_string(),
            username: "alice".to_string(),
        }
        .to_domain();
        assert_eq!(record.id, id);
        assert_eq!(record.username, "alice");
    }
}

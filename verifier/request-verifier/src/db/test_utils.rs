//! Utilities for tests against an embedded Postgres instance

use diesel::sql_query;
use diesel_async::{AsyncConnection, AsyncMigrationHarness, AsyncPgConnection, RunQueryDsl};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use postgresql_embedded::PostgreSQL;

use crate::db::{client::DbClient, error::DbError};

// -------------
// | Constants |
// -------------

/// The name of the test database
const TEST_DB_NAME: &str = "request_verifier_test";
/// The pool size of test clients
const TEST_POOL_SIZE: u32 = 4;
/// The migrations to apply to the test database
const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

// ---------
// | Types |
// ---------

/// A database client paired with the embedded instance it targets
pub struct TestDbClient {
    /// The database client
    pub client: DbClient,
    /// The embedded PostgreSQL instance
    pub postgres: PostgreSQL,
}

impl TestDbClient {
    /// Get a reference to the database client
    pub fn get_client(&self) -> &DbClient {
        &self.client
    }
}

// -----------
// | Helpers |
// -----------

/// Start an embedded PostgreSQL instance, create the test database and apply
/// the migrations
pub async fn setup_test_db_client() -> Result<TestDbClient, DbError> {
    let mut postgres = PostgreSQL::default();

    postgres.setup().await.map_err(DbError::client_setup)?;
    postgres.start().await.map_err(DbError::client_setup)?;
    postgres.create_database(TEST_DB_NAME).await.map_err(DbError::client_setup)?;

    let db_url = postgres.settings().url(TEST_DB_NAME);
    let client = DbClient::new(&db_url, TEST_POOL_SIZE).await?;

    let conn = client.get_db_conn().await?;
    let mut harness = AsyncMigrationHarness::new(conn);
    harness.run_pending_migrations(MIGRATIONS).map_err(DbError::client_setup)?;

    Ok(TestDbClient { client, postgres })
}

/// Terminate every connection to the test database, drop it and stop the
/// embedded instance
pub async fn cleanup_test_db(test_db_client: TestDbClient) -> Result<(), DbError> {
    let terminate_query = r#"
        SELECT pg_terminate_backend(pid)
        FROM pg_stat_activity
        WHERE datname = $1
            AND pid <> pg_backend_pid();
    "#;

    // Pooled connections would be returned to the pool instead of closed
    let mut conn = create_unpooled_conn(&test_db_client).await?;
    sql_query(terminate_query)
        .bind::<diesel::sql_types::Text, _>(TEST_DB_NAME.to_string())
        .execute(&mut conn)
        .await?;
    drop(conn);

    let TestDbClient { client, postgres } = test_db_client;
    drop(client);

    postgres.drop_database(TEST_DB_NAME).await.map_err(DbError::client_setup)?;
    postgres.stop().await.map_err(DbError::client_setup)
}

/// Open a connection to the test database outside the pool
async fn create_unpooled_conn(test_db_client: &TestDbClient) -> Result<AsyncPgConnection, DbError> {
    let db_url = test_db_client.postgres.settings().url(TEST_DB_NAME);
    AsyncPgConnection::establish(&db_url).await.map_err(DbError::client_setup)
}

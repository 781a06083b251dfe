//! A pooled client for the verifier's Postgres database

use std::sync::Arc;

use bb8::{Pool, PooledConnection};
use diesel::ConnectionError;
use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{AsyncDieselConnectionManager, ManagerConfig},
};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tracing::{error, info};

use crate::db::error::DbError;

// ---------
// | Types |
// ---------

/// The DB connection type
pub type DbConn<'a> = PooledConnection<'a, AsyncDieselConnectionManager<AsyncPgConnection>>;
/// The DB pool type
pub type DbPool = Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

// ----------
// | Client |
// ----------

/// A client for the verifier database, holding a pool of TLS connections
#[derive(Clone)]
pub struct DbClient {
    /// The database connection pool
    db_pool: Arc<DbPool>,
}

impl DbClient {
    /// Create a new database client with a pool of at most `max_connections`
    /// connections to the given database
    pub async fn new(db_url: &str, max_connections: u32) -> Result<Self, DbError> {
        let mut conf = ManagerConfig::default();
        conf.custom_setup = Box::new(|url| Box::pin(Self::establish_tls_connection(url)));

        let manager = AsyncDieselConnectionManager::new_with_config(db_url, conf);
        let db_pool = Pool::builder()
            .max_size(max_connections)
            .build(manager)
            .await
            .map_err(DbError::client_setup)?;

        info!("Connected to request database with up to {max_connections} connections");
        Ok(Self { db_pool: Arc::new(db_pool) })
    }

    /// Establish a TLS connection to the database
    async fn establish_tls_connection(db_url: &str) -> Result<AsyncPgConnection, ConnectionError> {
        // Certificates are not validated, traffic stays within the deployment's
        // private network
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;

        let (client, conn) = tokio_postgres::connect(db_url, MakeTlsConnector::new(connector))
            .await
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;

        // Drive the connection until it closes
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                error!("Request database connection error: {e}");
            }
        });

        AsyncPgConnection::try_from(client).await
    }

    /// Get a connection from the pool
    pub async fn get_db_conn(&self) -> Result<DbConn<'_>, DbError> {
        self.db_pool.get().await.map_err(DbError::pool_connection)
    }
}

//! Connection management for MySQL and MongoDB
//!
//! Two policies are supported, chosen by `ConnectionConfig::pooled`:
//! - per call (default): every call opens its own connection and closes it
//!   before returning
//! - pooled: a bounded pool per MySQL schema and one shared MongoDB client
//!   are created lazily and reused across calls
//!
//! Either way the dispatchers see the same handle types and call `release`
//! when done.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use mongodb::{Client, options::ClientOptions};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{Connection, MySql};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::error::{ConnectionError, Result};

/// Factory for backend connections
pub struct ConnectionManager {
    /// Connection configuration
    config: ConnectionConfig,

    /// Lazily created pools, keyed by schema
    mysql_pools: Mutex<HashMap<String, MySqlPool>>,

    /// Shared client when pooled
    mongo_client: Mutex<Option<Client>>,
}

/// A MySQL connection for one call
pub enum MySqlHandle {
    /// Opened for this call, closed on release
    Dedicated(MySqlConnection),

    /// Borrowed from a pool, returned on release
    Pooled(PoolConnection<MySql>),
}

/// A MongoDB client for one call
pub struct MongoHandle {
    client: Client,
    dedicated: bool,
}

impl ConnectionManager {
    /// Create a new connection manager
    ///
    /// # Arguments
    /// * `config` - Connection configuration
    ///
    /// # Returns
    /// * `Self` - New connection manager instance
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            mysql_pools: Mutex::new(HashMap::new()),
            mongo_client: Mutex::new(None),
        }
    }

    /// Whether connections are shared across calls
    pub fn is_pooled(&self) -> bool {
        self.config.pooled
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout)
    }

    /// Connect options for one MySQL schema
    pub fn mysql_options(&self, schema: &str) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.config.mysql_host)
            .port(self.config.mysql_port)
            .username(&self.config.mysql_user)
            .password(&self.config.mysql_password)
            .database(schema)
    }

    /// Get a MySQL connection bound to `schema`
    ///
    /// # Returns
    /// * `Result<MySqlHandle>` - Connection handle or error
    pub async fn mysql(&self, schema: &str) -> Result<MySqlHandle> {
        if !self.config.pooled {
            debug!("Opening MySQL connection to schema '{}'", schema);
            let options = self.mysql_options(schema);
            let connect = MySqlConnection::connect_with(&options);
            let conn = tokio::time::timeout(self.timeout(), connect)
                .await
                .map_err(|_| timed_out("MySQL", self.config.timeout))??;
            return Ok(MySqlHandle::Dedicated(conn));
        }

        let pool = {
            let mut pools = self.mysql_pools.lock().await;
            pools
                .entry(schema.to_string())
                .or_insert_with(|| {
                    debug!("Creating MySQL pool for schema '{}'", schema);
                    MySqlPoolOptions::new()
                        .max_connections(self.config.max_pool_size)
                        .acquire_timeout(self.timeout())
                        .connect_lazy_with(self.mysql_options(schema))
                })
                .clone()
        };

        Ok(MySqlHandle::Pooled(pool.acquire().await?))
    }

    /// Build MongoDB client options from the configured URI
    ///
    /// # Returns
    /// * `Result<ClientOptions>` - Parsed client options or error
    pub async fn mongo_options(&self) -> Result<ClientOptions> {
        let mut options = ClientOptions::parse(&self.config.mongo_uri)
            .await
            .map_err(|e| ConnectionError::InvalidUri(e.to_string()))?;

        options.connect_timeout = Some(self.timeout());
        options.server_selection_timeout = Some(self.timeout());
        if self.config.pooled {
            options.max_pool_size = Some(self.config.max_pool_size);
        } else {
            options.max_pool_size = Some(1);
        }
        options.app_name = Some("nlquery".to_string());

        Ok(options)
    }

    /// Get a MongoDB client
    ///
    /// # Returns
    /// * `Result<MongoHandle>` - Client handle or error
    pub async fn mongo(&self) -> Result<MongoHandle> {
        if !self.config.pooled {
            debug!("Opening MongoDB client");
            let client = Client::with_options(self.mongo_options().await?)?;
            return Ok(MongoHandle {
                client,
                dedicated: true,
            });
        }

        let mut shared = self.mongo_client.lock().await;
        let client = match shared.as_ref() {
            Some(client) => client.clone(),
            None => {
                debug!("Creating shared MongoDB client");
                let client = Client::with_options(self.mongo_options().await?)?;
                *shared = Some(client.clone());
                client
            }
        };

        Ok(MongoHandle {
            client,
            dedicated: false,
        })
    }

    /// Close every pooled connection
    pub async fn shutdown(&self) {
        let pools: Vec<MySqlPool> = self
            .mysql_pools
            .lock()
            .await
            .drain()
            .map(|(_, pool)| pool)
            .collect();
        for pool in pools {
            pool.close().await;
        }
        if let Some(client) = self.mongo_client.lock().await.take() {
            client.shutdown().await;
        }
    }
}

fn timed_out(backend: &str, seconds: u64) -> ConnectionError {
    ConnectionError::ConnectionFailed(format!("{backend} connection timed out after {seconds}s"))
}

impl MySqlHandle {
    /// Close a dedicated connection or return a pooled one
    pub async fn release(self) {
        match self {
            MySqlHandle::Dedicated(conn) => {
                if let Err(e) = conn.close().await {
                    debug!("Error closing MySQL connection: {}", e);
                }
            }
            MySqlHandle::Pooled(conn) => drop(conn),
        }
    }
}

impl Deref for MySqlHandle {
    type Target = MySqlConnection;

    fn deref(&self) -> &Self::Target {
        match self {
            MySqlHandle::Dedicated(conn) => conn,
            MySqlHandle::Pooled(conn) => &**conn,
        }
    }
}

impl DerefMut for MySqlHandle {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            MySqlHandle::Dedicated(conn) => conn,
            MySqlHandle::Pooled(conn) => &mut **conn,
        }
    }
}

impl MongoHandle {
    /// The client for this call
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Shut down a dedicated client; shared clients stay open
    pub async fn release(self) {
        if self.dedicated {
            self.client.shutdown().await;
        }
    }
}

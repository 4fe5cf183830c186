//! MongoDB client factory

use super::{collection::MongoCollection, convert_mongodb_error};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use mongodb::{bson::doc, options::ClientOptions, Client};
use tracing::{debug, info};

/// Owns a driver client and hands out collection handles.
///
/// The driver connects lazily and pools connections internally; cloning a
/// `MongoConnect` shares that pool.
#[derive(Debug, Clone)]
pub struct MongoConnect {
    client: Client,
    soft_delete: bool,
}

impl MongoConnect {
    /// Create a client from configuration
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let uri = config
            .mongo_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| Error::Config("MONGO_URI is not set".to_string()))?;

        let mut client_options = ClientOptions::parse(uri)
            .await
            .map_err(convert_mongodb_error)?;

        let pool = &config.pool;
        client_options.max_pool_size = Some(pool.max_pool_size);
        client_options.min_pool_size = Some(pool.min_pool_size);
        client_options.connect_timeout = Some(pool.connect_timeout());
        client_options.server_selection_timeout = Some(pool.server_selection_timeout());
        if let Some(ref app_name) = pool.app_name {
            client_options.app_name = Some(app_name.clone());
        }

        let client = Client::with_options(client_options).map_err(convert_mongodb_error)?;
        info!(
            max_pool_size = pool.max_pool_size,
            soft_delete = config.meta_soft_del,
            "MongoDB client created"
        );

        Ok(Self {
            client,
            soft_delete: config.meta_soft_del,
        })
    }

    /// Wrap an existing client
    pub fn from_client(client: Client, soft_delete: bool) -> Self {
        Self {
            client,
            soft_delete,
        }
    }

    /// Get reference to MongoDB client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Round-trip a ping to the server
    pub async fn ping(&self) -> Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(convert_mongodb_error)?;
        debug!("MongoDB ping ok");
        Ok(())
    }

    /// Handle for one collection, inheriting the soft-delete default
    pub fn collection(&self, database: &str, collection: &str) -> MongoCollection {
        MongoCollection::new(self.client.clone(), database, collection, self.soft_delete)
    }
}

//! Database connection wrapper.

use bson::{Document, doc};
use mongodb::{Client, Collection, Database};
use tracing::{debug, info};

use crate::config::ConnectOptions;
use crate::error::{OdmError, OdmResult};

/// A MongoDB connection bound to a default database.
///
/// Pooling is handled by the driver; this wraps the driver client with the
/// pieces the document manager needs.
#[derive(Clone, Debug)]
pub struct Connection {
    client: Client,
    database: Database,
}

impl Connection {
    /// Open a connection from a URI, default database, and connect options.
    ///
    /// Building the client does not contact the server; call [`ping`] to
    /// verify reachability.
    ///
    /// [`ping`]: Connection::ping
    pub async fn open(uri: &str, database: &str, options: &ConnectOptions) -> OdmResult<Self> {
        let client_options = options.to_client_options(uri).await?;

        let client = Client::with_options(client_options)
            .map_err(|e| OdmError::connection(format!("failed to create client: {e}")))?;
        let database = client.database(database);

        info!(database = %database.name(), "connection opened");
        Ok(Self { client, database })
    }

    /// Verify the server is reachable, bounded by the server selection
    /// timeout.
    pub async fn ping(&self) -> OdmResult<()> {
        debug!(database = %self.database.name(), "pinging server");
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| OdmError::connection(format!("ping failed: {e}")))?;
        Ok(())
    }

    /// The default database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// The underlying driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get a typed collection in the default database.
    pub fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.database.collection(name)
    }

    /// Get a BSON-document collection in the default database.
    pub fn collection_doc(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn test_open_selects_database() {
        let connection = Connection::open(
            "mongodb://localhost:27017/app",
            "app",
            &ConnectOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(connection.database().name(), "app");
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_uri() {
        let err = Connection::open("not-a-uri", "app", &ConnectOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_config_error());
    }
}

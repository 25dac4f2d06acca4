//! MongoDB connector.

use futures_util::future::{BoxFuture, FutureExt};
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::Client;
use tokio::time;

use crate::config::DatabaseConfig;
use crate::database::{DatabaseConnector, DatabaseError};

pub struct MongoConnector {
    config: DatabaseConfig,
}

impl MongoConnector {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    async fn open(&self) -> Result<Client, DatabaseError> {
        let uri = self
            .config
            .uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .ok_or(DatabaseError::MissingUri)?;

        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some(self.config.app_name.clone());
        options.connect_timeout = Some(self.config.connect_timeout());
        options.server_selection_timeout = Some(self.config.connect_timeout());

        let client = Client::with_options(options)?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database("admin"));
        database.run_command(doc! { "ping": 1 }).await?;

        Ok(client)
    }
}

impl DatabaseConnector for MongoConnector {
    type Client = Client;

    fn connect(&self) -> BoxFuture<'_, Result<Client, DatabaseError>> {
        async move {
            let deadline = self.config.connect_timeout();
            time::timeout(deadline, self.open())
                .await
                .map_err(|_| DatabaseError::Timeout(deadline))?
        }
        .boxed()
    }

    /// Host list only; credentials stay in the URI.
    fn describe(&self) -> String {
        match self.config.uri.as_deref() {
            None | Some("") => "<unset>".to_string(),
            Some(uri) => redact(uri),
        }
    }
}

fn redact(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return "<invalid uri>".to_string();
    };
    let authority = rest.split(['/', '?']).next().unwrap_or_default();
    let hosts = authority.rsplit_once('@').map_or(authority, |(_, hosts)| hosts);
    format!("{scheme}://{hosts}")
}

//! Redis implementation of the connector seams.

use futures_util::future::{BoxFuture, FutureExt};
use redis::aio::MultiplexedConnection;
use redis::{Client, Cmd, FromRedisValue};
use url::Url;

use crate::cache::connection::{CacheConnection, CacheConnector, CacheError};
use crate::cache::manager::CacheHandle;
use crate::config::CacheConfig;

/// Opens multiplexed connections to a single Redis endpoint.
pub struct RedisConnector {
    client: Client,
    endpoint: String,
    connection_name: String,
}

impl RedisConnector {
    pub fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let url = endpoint_url(config)?;
        let client = Client::open(url.as_str())?;

        Ok(Self {
            client,
            endpoint: format!("{}:{}", config.host, config.port),
            connection_name: config.connection_name.clone(),
        })
    }
}

/// Build the connection URL. The password is percent-encoded by `url`.
pub fn endpoint_url(config: &CacheConfig) -> Result<Url, CacheError> {
    let scheme = if config.tls { "rediss" } else { "redis" };
    let mut url = Url::parse(&format!("{scheme}://{}:{}", config.host, config.port))
        .map_err(|e| CacheError::InvalidEndpoint(e.to_string()))?;

    if let Some(password) = config.password.as_deref() {
        url.set_password(Some(password))
            .map_err(|()| CacheError::InvalidEndpoint("cannot attach password".to_string()))?;
    }

    Ok(url)
}

impl CacheConnector for RedisConnector {
    type Connection = MultiplexedConnection;

    fn connect(&self) -> BoxFuture<'_, Result<MultiplexedConnection, CacheError>> {
        async move {
            let mut connection = self.client.get_multiplexed_async_connection().await?;
            if !self.connection_name.is_empty() {
                let () = redis::cmd("CLIENT")
                    .arg("SETNAME")
                    .arg(&self.connection_name)
                    .query_async(&mut connection)
                    .await?;
            }
            Ok(connection)
        }
        .boxed()
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }
}

impl CacheConnection for MultiplexedConnection {
    fn ping(&mut self) -> BoxFuture<'_, Result<(), CacheError>> {
        async move {
            let _: String = redis::cmd("PING").query_async(self).await?;
            Ok(())
        }
        .boxed()
    }

    fn ready_check(&mut self) -> BoxFuture<'_, Result<(), CacheError>> {
        async move {
            let info: String = redis::cmd("INFO").arg("persistence").query_async(self).await?;
            if is_loading(&info) {
                return Err(CacheError::Loading);
            }
            Ok(())
        }
        .boxed()
    }
}

fn is_loading(info: &str) -> bool {
    info.lines().any(|line| line.trim() == "loading:1")
}

impl CacheHandle<MultiplexedConnection> {
    /// Run a single command under the per-request retry ceiling.
    pub async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> Result<T, CacheError> {
        self.with_connection(|mut connection| async move {
            Ok::<T, CacheError>(cmd.query_async(&mut connection).await?)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_plain() {
        let config = CacheConfig {
            host: "127.0.0.1".into(),
            port: 6380,
            tls: false,
            ..Default::default()
        };
        let url = endpoint_url(&config).unwrap();
        assert_eq!(url.scheme(), "redis");
        assert_eq!(url.host_str(), Some("127.0.0.1"));
        assert_eq!(url.port(), Some(6380));
        assert_eq!(url.password(), None);
    }

    #[test]
    fn test_endpoint_url_tls_with_password() {
        let config = CacheConfig {
            host: "cache.internal".into(),
            password: Some("p@ss:word".into()),
            ..Default::default()
        };
        let url = endpoint_url(&config).unwrap();
        assert_eq!(url.scheme(), "rediss");
        assert_eq!(url.port(), Some(6379));
        assert_eq!(url.username(), "");
        assert_eq!(url.password(), Some("p%40ss%3Aword"));
    }

    #[test]
    fn test_connector_does_not_leak_password() {
        let config = CacheConfig {
            tls: false,
            password: Some("secret".into()),
            ..Default::default()
        };
        let connector = RedisConnector::new(&config).unwrap();
        assert_eq!(connector.endpoint(), "localhost:6379");
    }

    #[test]
    fn test_loading_detection() {
        assert!(is_loading("# Persistence\r\nloading:1\r\nrdb_changes_since_last_save:0\r\n"));
        assert!(!is_loading("# Persistence\r\nloading:0\r\n"));
    }
}

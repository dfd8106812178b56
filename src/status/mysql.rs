//! MySQL replica access over `mysql_async`.
//!
//! Reads `SHOW REPLICA STATUS` and runs the recovery statement
//! (`CALL mysql.rds_skip_repl_error;` by default, the RDS procedure that skips
//! the current replication error).

use std::time::Duration;

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{OptsBuilder, Pool, Row, Value};
use tracing::debug;

use super::{RecoveryInvoker, StatusSnapshot, StatusSource};
use crate::error::SourceError;

/// Statement used to read replica status.
pub const STATUS_QUERY: &str = "SHOW REPLICA STATUS";

/// Default recovery statement.
pub const DEFAULT_RECOVERY_STATEMENT: &str = "CALL mysql.rds_skip_repl_error;";

const DEFAULT_PORT: u16 = 3306;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A connection pool to one replica, usable as both status source and
/// recovery invoker. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct MySqlReplica {
    pool: Pool,
    description: String,
    recovery_statement: String,
    timeout: Duration,
}

impl MySqlReplica {
    /// Create a new builder for configuring the connection.
    pub fn builder() -> MySqlReplicaBuilder {
        MySqlReplicaBuilder::default()
    }

    /// Check that the server is reachable and the credentials work.
    pub async fn ping(&self) -> Result<(), SourceError> {
        let mut conn = tokio::time::timeout(self.timeout, self.pool.get_conn()).await??;
        tokio::time::timeout(self.timeout, conn.ping()).await??;
        Ok(())
    }

    /// Close all pooled connections.
    pub async fn disconnect(self) -> Result<(), SourceError> {
        self.pool.disconnect().await?;
        Ok(())
    }

    async fn query_status(&self) -> Result<Option<Row>, SourceError> {
        let mut conn = self.pool.get_conn().await?;
        let row: Option<Row> = conn.query_first(STATUS_QUERY).await?;
        Ok(row)
    }
}

#[async_trait]
impl StatusSource for MySqlReplica {
    async fn fetch_status(&mut self) -> Result<Option<StatusSnapshot>, SourceError> {
        let row = tokio::time::timeout(self.timeout, self.query_status()).await??;
        Ok(row.map(|row| row_to_snapshot(&row)))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[async_trait]
impl RecoveryInvoker for MySqlReplica {
    async fn invoke_recovery(&mut self) -> Result<(), SourceError> {
        debug!(statement = %self.recovery_statement, "executing recovery statement");
        let statement = self.recovery_statement.clone();
        let pool = self.pool.clone();
        tokio::time::timeout(self.timeout, async move {
            let mut conn = pool.get_conn().await?;
            conn.query_drop(statement).await?;
            Ok::<_, SourceError>(())
        })
        .await?
    }

    fn action(&self) -> &str {
        &self.recovery_statement
    }
}

fn row_to_snapshot(row: &Row) -> StatusSnapshot {
    let columns = row.columns_ref().iter().enumerate().map(|(index, column)| {
        let value = row.as_ref(index).and_then(value_to_string);
        (column.name_str().into_owned(), value)
    });
    StatusSnapshot::from_columns(columns)
}

/// Render a column value as text; `NULL` becomes `None`.
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::Int(v) => Some(v.to_string()),
        Value::UInt(v) => Some(v.to_string()),
        Value::Float(v) => Some(v.to_string()),
        Value::Double(v) => Some(v.to_string()),
        other => Some(other.as_sql(true).trim_matches('\'').to_string()),
    }
}

/// Builder for MySqlReplica.
#[derive(Debug, Default)]
pub struct MySqlReplicaBuilder {
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    recovery_statement: Option<String>,
    timeout: Option<Duration>,
}

impl MySqlReplicaBuilder {
    /// Set the replica host name or address (default: "localhost").
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the TCP port (default: 3306).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the user name and password.
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Set the statement run as the recovery action.
    pub fn recovery_statement(mut self, statement: impl Into<String>) -> Self {
        self.recovery_statement = Some(statement.into());
        self
    }

    /// Set the per-call timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the replica handle. No connection is opened until first use.
    pub fn build(self) -> MySqlReplica {
        let host = self.host.unwrap_or_else(|| "localhost".to_string());
        let port = self.port.unwrap_or(DEFAULT_PORT);

        let opts = OptsBuilder::default()
            .ip_or_hostname(host.clone())
            .tcp_port(port)
            .user(self.user)
            .pass(self.password);

        MySqlReplica {
            pool: Pool::new(opts),
            description: format!("{}:{}", host, port),
            recovery_statement: self
                .recovery_statement
                .unwrap_or_else(|| DEFAULT_RECOVERY_STATEMENT.to_string()),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builder_defaults() {
        let replica = MySqlReplica::builder().build();
        assert_eq!(replica.description(), "localhost:3306");
        assert_eq!(replica.action(), DEFAULT_RECOVERY_STATEMENT);
        assert_eq!(replica.timeout, DEFAULT_TIMEOUT);
    }

    #[tokio::test]
    async fn test_builder_custom() {
        let replica = MySqlReplica::builder()
            .host("replica-1.internal")
            .port(3307)
            .credentials("monitor", "secret")
            .recovery_statement("STOP REPLICA; START REPLICA;")
            .timeout(Duration::from_secs(3))
            .build();

        assert_eq!(replica.description(), "replica-1.internal:3307");
        assert_eq!(replica.action(), "STOP REPLICA; START REPLICA;");
        assert_eq!(replica.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&Value::NULL), None);
        assert_eq!(value_to_string(&Value::Bytes(b"Yes".to_vec())), Some("Yes".to_string()));
        assert_eq!(value_to_string(&Value::Int(-4)), Some("-4".to_string()));
        assert_eq!(value_to_string(&Value::UInt(3306)), Some("3306".to_string()));
    }
}

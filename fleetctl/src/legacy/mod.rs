//! Read-only access to the legacy SQL Server master-data system.
//!
//! The import reads customer rows through [`LegacyCustomerSource`]. The production source,
//! [`SqlServerSource`], keeps one tiberius client for the whole process, creates it lazily on
//! first use, and drops it whenever a call fails with a connection-class error so the next
//! attempt reconnects. Calls are wrapped in [`retry::with_retry`].

pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiberius::{AuthMethod, Client, Row};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::config::LegacyConfig;
use retry::with_retry;

#[derive(Debug, Error)]
pub enum LegacyError {
    /// Network, TLS or protocol failure; the cached connection is discarded
    #[error("Legacy database connection failed: {0}")]
    Connection(String),

    /// The server rejected or failed the query
    #[error("Legacy database query failed: {0}")]
    Query(String),

    /// A row could not be read into the expected shape
    #[error("Unexpected legacy row: {0}")]
    Decode(String),
}

impl LegacyError {
    /// Whether the failure is worth retrying on a fresh connection
    pub fn is_connection_error(&self) -> bool {
        matches!(self, LegacyError::Connection(_))
    }
}

impl From<tiberius::error::Error> for LegacyError {
    fn from(err: tiberius::error::Error) -> Self {
        use tiberius::error::Error as E;
        match err {
            E::Io { .. } | E::Tls(_) | E::Routing { .. } | E::Protocol(_) => LegacyError::Connection(err.to_string()),
            E::Conversion(_) | E::Utf8 | E::Utf16 | E::ParseInt(_) => LegacyError::Decode(err.to_string()),
            _ => LegacyError::Query(err.to_string()),
        }
    }
}

impl From<std::io::Error> for LegacyError {
    fn from(err: std::io::Error) -> Self {
        LegacyError::Connection(err.to_string())
    }
}

/// A customer row as held by the legacy system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LegacyCustomer {
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
}

/// Where imported customer master data comes from.
#[async_trait]
pub trait LegacyCustomerSource: Send + Sync {
    /// Customers whose code lies in `from_code..=to_code`, ordered by code
    async fn customers_in_range(&self, from_code: &str, to_code: &str) -> Result<Vec<LegacyCustomer>, LegacyError>;

    async fn customer_by_code(&self, code: &str) -> Result<Option<LegacyCustomer>, LegacyError>;
}

type SqlClient = Client<Compat<TcpStream>>;

/// SQL Server implementation with a lazily created, cached client.
pub struct SqlServerSource {
    config: LegacyConfig,
    client: Mutex<Option<SqlClient>>,
}

impl SqlServerSource {
    pub fn new(config: LegacyConfig) -> Self {
        Self {
            config,
            client: Mutex::new(None),
        }
    }

    #[instrument(skip(self), fields(host = %self.config.host, database = %self.config.database), err)]
    async fn connect(&self) -> Result<SqlClient, LegacyError> {
        let mut config = tiberius::Config::new();
        config.host(&self.config.host);
        config.port(self.config.port);
        config.database(&self.config.database);
        config.authentication(AuthMethod::sql_server(&self.config.username, &self.config.password));
        if self.config.trust_cert {
            config.trust_cert();
        }

        let tcp = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(config.get_addr()))
            .await
            .map_err(|_| LegacyError::Connection(format!("timed out after {:?}", self.config.connect_timeout)))??;
        tcp.set_nodelay(true)?;

        let client = Client::connect(config, tcp.compat_write()).await?;
        info!("Connected to legacy database");
        Ok(client)
    }

    /// Run a query on the cached client, creating it first if needed.
    async fn query_rows(&self, sql: &str, params: Vec<String>) -> Result<Vec<Row>, LegacyError> {
        let mut guard = self.client.lock().await;
        if guard.is_none() {
            *guard = Some(self.connect().await?);
        }
        let Some(client) = guard.as_mut() else {
            return Err(LegacyError::Connection("no client available".to_string()));
        };

        let params: Vec<&dyn tiberius::ToSql> = params.iter().map(|p| p as &dyn tiberius::ToSql).collect();
        let result = match client.query(sql, &params).await {
            Ok(stream) => stream.into_first_result().await,
            Err(e) => Err(e),
        };

        result.map_err(|e| {
            let err = LegacyError::from(e);
            if err.is_connection_error() {
                debug!("Dropping cached legacy connection after error");
                *guard = None;
            }
            err
        })
    }

    fn select_customers(&self) -> String {
        format!(
            "SELECT CustomerCode, CustomerName, Address, Phone, TaxId FROM {}",
            self.config.customer_table
        )
    }
}

fn text(row: &Row, column: &str) -> Result<Option<String>, LegacyError> {
    let value: Option<&str> = row.try_get(column).map_err(|e| LegacyError::Decode(format!("{column}: {e}")))?;
    Ok(value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string))
}

fn customer_from_row(row: &Row) -> Result<LegacyCustomer, LegacyError> {
    let code = text(row, "CustomerCode")?.ok_or_else(|| LegacyError::Decode("CustomerCode is empty".to_string()))?;
    Ok(LegacyCustomer {
        name: text(row, "CustomerName")?.unwrap_or_else(|| code.clone()),
        code,
        address: text(row, "Address")?,
        phone: text(row, "Phone")?,
        tax_id: text(row, "TaxId")?,
    })
}

#[async_trait]
impl LegacyCustomerSource for SqlServerSource {
    #[instrument(skip(self), err)]
    async fn customers_in_range(&self, from_code: &str, to_code: &str) -> Result<Vec<LegacyCustomer>, LegacyError> {
        let sql = format!("{} WHERE CustomerCode BETWEEN @P1 AND @P2 ORDER BY CustomerCode", self.select_customers());
        let sql = sql.as_str();
        let rows = with_retry(&self.config.retry, "customers_in_range", move |_| {
            self.query_rows(sql, vec![from_code.to_string(), to_code.to_string()])
        })
        .await?;
        rows.iter().map(customer_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn customer_by_code(&self, code: &str) -> Result<Option<LegacyCustomer>, LegacyError> {
        let sql = format!("{} WHERE CustomerCode = @P1", self.select_customers());
        let sql = sql.as_str();
        let rows = with_retry(&self.config.retry, "customer_by_code", move |_| self.query_rows(sql, vec![code.to_string()])).await?;
        rows.first().map(customer_from_row).transpose()
    }
}

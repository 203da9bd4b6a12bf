//! Live schema introspection of the landing-zone source database

use tiberius::{Client, Config, Query};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;
use tracing::{debug, info};

use crate::error::{MapError, Result};
use crate::schema::ColumnSchema;

/// Reads the ordered column list of a table from a relational catalog
pub trait TableIntrospector {
    fn table_schema(&self, connection: &str, table: &str) -> Result<Vec<ColumnSchema>>;
}

const COLUMNS_QUERY: &str = r#"
    SELECT COLUMN_NAME, DATA_TYPE
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_NAME = @P1
    ORDER BY ORDINAL_POSITION
"#;

/// SQL Server introspection over an ADO.NET style connection string
///
/// Each call opens one connection on a private current-thread runtime, so the
/// caller stays synchronous.
#[derive(Debug, Clone, Default)]
pub struct MssqlIntrospector;

impl TableIntrospector for MssqlIntrospector {
    fn table_schema(&self, connection: &str, table: &str) -> Result<Vec<ColumnSchema>> {
        let fail = |message: String| MapError::Introspection {
            table: table.to_string(),
            message,
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| fail(e.to_string()))?;

        let columns = runtime
            .block_on(query_columns(connection, table))
            .map_err(|e| fail(e.to_string()))?;

        if columns.is_empty() {
            return Err(fail("table not found or has no columns".to_string()));
        }

        info!(table, count = columns.len(), "Introspected source table");
        Ok(columns)
    }
}

async fn query_columns(connection: &str, table: &str) -> std::result::Result<Vec<ColumnSchema>, tiberius::error::Error> {
    let config = Config::from_ado_string(connection)?;
    debug!(addr = %config.get_addr(), "Connecting to source database");

    let tcp = TcpStream::connect(config.get_addr()).await?;
    tcp.set_nodelay(true).ok();

    let mut client = Client::connect(config, tcp.compat_write()).await?;

    let mut query = Query::new(COLUMNS_QUERY);
    query.bind(table.to_string());

    let rows = query.query(&mut client).await?.into_first_result().await?;

    Ok(rows
        .iter()
        .map(|row| {
            ColumnSchema::new(
                row.get::<&str, _>(0).unwrap_or_default(),
                row.get::<&str, _>(1).unwrap_or_default(),
            )
        })
        .collect())
}

//! Read-only view of the shop's transaction tables
//!
//! Tables:
//! - payment_entity: direct payments
//! - credit_request_entity: credit applications
//! - order_entity: order rows referencing one of the above
//!
//! SQLite files are read through rusqlite; PostgreSQL and MySQL servers
//! through a single-connection sqlx pool. Reads return the most recently
//! created row. An empty table is `Ok(None)`; a failing query is an error and
//! is never turned into "no row".

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row as _};
use std::time::Duration;
use tourpay_common::{TransactionKind, TransactionStatus};
use tracing::{debug, info};

use crate::config::{DbConfig, DbTarget, Dialect};
use crate::error::{E2eError, E2eResult, StorageError};

const PAYMENT_TABLE: &str = "payment_entity";
const CREDIT_TABLE: &str = "credit_request_entity";
const ORDER_TABLE: &str = "order_entity";

/// Orders reference transactions, so they go first
const RESET_ORDER: [&str; 3] = [ORDER_TABLE, PAYMENT_TABLE, CREDIT_TABLE];

const SERVER_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,
    pub amount: Option<i64>,
    pub created: NaiveDateTime,
    pub status: TransactionStatus,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditRecord {
    pub id: String,
    pub bank_id: Option<String>,
    pub created: NaiveDateTime,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLinkRecord {
    pub id: String,
    pub created: NaiveDateTime,
    pub credit_id: Option<String>,
    pub payment_id: Option<String>,
}

/// Latest row of either transaction table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionRow {
    Payment(PaymentRecord),
    Credit(CreditRecord),
}

impl TransactionRow {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::Payment(_) => TransactionKind::Payment,
            Self::Credit(_) => TransactionKind::Credit,
        }
    }

    pub fn status(&self) -> TransactionStatus {
        match self {
            Self::Payment(p) => p.status,
            Self::Credit(c) => c.status,
        }
    }

    pub fn created(&self) -> NaiveDateTime {
        match self {
            Self::Payment(p) => p.created,
            Self::Credit(c) => c.created,
        }
    }

    /// Identifier an order row points at: transaction_id or bank_id
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::Payment(p) => p.transaction_id.as_deref(),
            Self::Credit(c) => c.bank_id.as_deref(),
        }
    }
}

pub struct PersistenceVerifier {
    backend: Backend,
}

enum Backend {
    Sqlite(Mutex<Connection>),
    Server { pool: AnyPool, dialect: Dialect },
}

impl PersistenceVerifier {
    /// Open the database named by the configuration
    pub async fn open(config: &DbConfig) -> E2eResult<Self> {
        let target = config.target()?;
        let backend = match &target {
            DbTarget::Sqlite(path) => Backend::Sqlite(Mutex::new(Connection::open(path)?)),
            DbTarget::Server { dialect, url } => {
                sqlx::any::install_default_drivers();
                let pool = AnyPoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(SERVER_CONNECT_TIMEOUT)
                    .connect(url.as_str())
                    .await?;
                Backend::Server {
                    pool,
                    dialect: *dialect,
                }
            }
        };
        info!("Opened database at {}", target.redacted());
        Ok(Self { backend })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            backend: Backend::Sqlite(Mutex::new(conn)),
        }
    }

    pub fn from_pool(pool: AnyPool, dialect: Dialect) -> Self {
        Self {
            backend: Backend::Server { pool, dialect },
        }
    }

    pub async fn latest_payment(&self) -> E2eResult<Option<PaymentRecord>> {
        self.latest(&PAYMENT_SELECT, payment_record).await
    }

    pub async fn latest_credit(&self) -> E2eResult<Option<CreditRecord>> {
        self.latest(&CREDIT_SELECT, credit_record).await
    }

    pub async fn latest_order_link(&self) -> E2eResult<Option<OrderLinkRecord>> {
        self.latest(&ORDER_SELECT, order_link_record).await
    }

    pub async fn latest_transaction(
        &self,
        kind: TransactionKind,
    ) -> E2eResult<Option<TransactionRow>> {
        Ok(match kind {
            TransactionKind::Payment => self.latest_payment().await?.map(TransactionRow::Payment),
            TransactionKind::Credit => self.latest_credit().await?.map(TransactionRow::Credit),
        })
    }

    /// Delete every row of the three tables, all or nothing
    pub async fn reset(&mut self) -> E2eResult<()> {
        match &mut self.backend {
            Backend::Sqlite(conn) => reset_sqlite(conn.get_mut())?,
            Backend::Server { pool, .. } => {
                let mut tx = pool.begin().await?;
                for table in RESET_ORDER {
                    let deleted = sqlx::query(&format!("DELETE FROM {}", table))
                        .execute(&mut *tx)
                        .await
                        .map_err(E2eError::query(table))?
                        .rows_affected();
                    debug!("Deleted {} row(s) from {}", deleted, table);
                }
                tx.commit().await?;
            }
        }
        info!("Storage reset");
        Ok(())
    }

    async fn latest<T>(&self, select: &Select, map: RowMapper<T>) -> E2eResult<Option<T>> {
        let table = select.table;
        let found = match &self.backend {
            Backend::Sqlite(conn) => latest_sqlite(conn, select, map)?,
            Backend::Server { pool, dialect } => sqlx::query(&select.sql(Some(*dialect)))
                .fetch_optional(pool)
                .await
                .map_err(E2eError::query(table))?
                .map(|row: AnyRow| map(&row)),
        };

        match found {
            None => {
                debug!("{} is empty", table);
                Ok(None)
            }
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(RowError::Sql(source))) => Err(E2eError::Query { table, source }),
            Some(Err(RowError::Malformed(reason))) => Err(E2eError::MalformedRow { table, reason }),
        }
    }
}

fn latest_sqlite<T>(
    conn: &Mutex<Connection>,
    select: &Select,
    map: RowMapper<T>,
) -> E2eResult<Option<Result<T, RowError>>> {
    let conn = conn.lock();
    let mut stmt = conn
        .prepare(&select.sql(None))
        .map_err(E2eError::query(select.table))?;
    let found = stmt
        .query_row([], |row| Ok(map(row)))
        .optional()
        .map_err(E2eError::query(select.table))?;
    Ok(found)
}

fn reset_sqlite(conn: &mut Connection) -> E2eResult<()> {
    let tx = conn.transaction()?;
    for table in RESET_ORDER {
        let deleted = tx
            .execute(&format!("DELETE FROM {}", table), [])
            .map_err(E2eError::query(table))?;
        debug!("Deleted {} row(s) from {}", deleted, table);
    }
    tx.commit()?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum ColumnType {
    Text,
    Integer,
}

/// "Latest row" query over one table
struct Select {
    table: &'static str,
    columns: &'static [(&'static str, ColumnType)],
}

const PAYMENT_SELECT: Select = Select {
    table: PAYMENT_TABLE,
    columns: &[
        ("id", ColumnType::Text),
        ("amount", ColumnType::Integer),
        ("created", ColumnType::Text),
        ("status", ColumnType::Text),
        ("transaction_id", ColumnType::Text),
    ],
};

const CREDIT_SELECT: Select = Select {
    table: CREDIT_TABLE,
    columns: &[
        ("id", ColumnType::Text),
        ("bank_id", ColumnType::Text),
        ("created", ColumnType::Text),
        ("status", ColumnType::Text),
    ],
};

const ORDER_SELECT: Select = Select {
    table: ORDER_TABLE,
    columns: &[
        ("id", ColumnType::Text),
        ("created", ColumnType::Text),
        ("credit_id", ColumnType::Text),
        ("payment_id", ColumnType::Text),
    ],
};

impl Select {
    /// SQLite is read as stored; server columns are cast so that every
    /// dialect decodes as text or BIGINT
    fn sql(&self, dialect: Option<Dialect>) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|&(name, ty)| match (dialect, ty) {
                (None, _) => name.to_string(),
                (Some(Dialect::Postgres), ColumnType::Text) => format!("CAST({} AS TEXT)", name),
                (Some(Dialect::Postgres), ColumnType::Integer) => {
                    format!("CAST({} AS BIGINT)", name)
                }
                (Some(Dialect::MySql), ColumnType::Text) => format!("CAST({} AS CHAR)", name),
                (Some(Dialect::MySql), ColumnType::Integer) => format!("CAST({} AS SIGNED)", name),
            })
            .collect();
        format!(
            "SELECT {columns} FROM {table} ORDER BY {table}.created DESC LIMIT 1",
            columns = columns.join(", "),
            table = self.table
        )
    }
}

type RowMapper<T> = fn(&dyn Columns) -> Result<T, RowError>;

/// Failure while mapping one row
pub(crate) enum RowError {
    Sql(StorageError),
    Malformed(String),
}

impl From<rusqlite::Error> for RowError {
    fn from(e: rusqlite::Error) -> Self {
        RowError::Sql(e.into())
    }
}

impl From<sqlx::Error> for RowError {
    fn from(e: sqlx::Error) -> Self {
        RowError::Sql(e.into())
    }
}

/// Column access over either backend's row type
trait Columns {
    fn text(&self, idx: usize) -> Result<Option<String>, RowError>;

    fn integer(&self, idx: usize) -> Result<Option<i64>, RowError>;
}

impl Columns for rusqlite::Row<'_> {
    /// Identifiers may be stored as text or integers
    fn text(&self, idx: usize) -> Result<Option<String>, RowError> {
        use rusqlite::types::ValueRef;
        Ok(match self.get_ref(idx)? {
            ValueRef::Null => None,
            ValueRef::Integer(i) => Some(i.to_string()),
            ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
            other => {
                return Err(RowError::Malformed(format!(
                    "column {} has unexpected type {:?}",
                    idx,
                    other.data_type()
                )))
            }
        })
    }

    fn integer(&self, idx: usize) -> Result<Option<i64>, RowError> {
        Ok(self.get(idx)?)
    }
}

impl Columns for AnyRow {
    fn text(&self, idx: usize) -> Result<Option<String>, RowError> {
        Ok(self.try_get(idx)?)
    }

    fn integer(&self, idx: usize) -> Result<Option<i64>, RowError> {
        Ok(self.try_get(idx)?)
    }
}

fn payment_record(row: &dyn Columns) -> Result<PaymentRecord, RowError> {
    Ok(PaymentRecord {
        id: required_text(row, 0)?,
        amount: row.integer(1)?,
        created: timestamp(row, 2)?,
        status: status(row, 3)?,
        transaction_id: row.text(4)?,
    })
}

fn credit_record(row: &dyn Columns) -> Result<CreditRecord, RowError> {
    Ok(CreditRecord {
        id: required_text(row, 0)?,
        bank_id: row.text(1)?,
        created: timestamp(row, 2)?,
        status: status(row, 3)?,
    })
}

fn order_link_record(row: &dyn Columns) -> Result<OrderLinkRecord, RowError> {
    Ok(OrderLinkRecord {
        id: required_text(row, 0)?,
        created: timestamp(row, 1)?,
        credit_id: row.text(2)?,
        payment_id: row.text(3)?,
    })
}

fn required_text(row: &dyn Columns, idx: usize) -> Result<String, RowError> {
    row.text(idx)?
        .ok_or_else(|| RowError::Malformed(format!("column {} is NULL", idx)))
}

fn status(row: &dyn Columns, idx: usize) -> Result<TransactionStatus, RowError> {
    required_text(row, idx)?.parse().map_err(RowError::Malformed)
}

fn timestamp(row: &dyn Columns, idx: usize) -> Result<NaiveDateTime, RowError> {
    let raw = required_text(row, idx)?;
    parse_timestamp(&raw)
        .ok_or_else(|| RowError::Malformed(format!("unparseable timestamp '{}'", raw)))
}

/// `YYYY-MM-DD HH:MM:SS[.fraction]`, with either a space or `T`
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

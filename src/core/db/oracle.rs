/// Oracle Gateway Backend
///
/// OCI-backed implementation of the `Driver`/`Session` trait pair, built on
/// the `sibyl` crate in blocking mode. Compiled only under the `oracle`
/// feature because linking requires an Oracle client library.
///
/// Credentials come from configuration at construction time; the account is
/// expected to be an ordinary least-privilege user.

use crate::core::db::{
    Bind, Driver, FetchedLine, GatewayError, GatewayResult, RowSet, Session, SqlValue,
};
use once_cell::sync::OnceCell;
use sibyl::{ColumnType, Environment, StmtInArg};
use tracing::debug;

const GET_LINE: &str = "BEGIN DBMS_OUTPUT.GET_LINE(:LINE, :STATUS); END;";

// DBMS_OUTPUT lines are at most 32767 bytes.
const MAX_LINE_LEN: usize = 32767;

/// The OCI environment outlives every session, so a single one is created
/// lazily and shared for the lifetime of the process.
fn oci_env() -> GatewayResult<&'static Environment> {
    static OCI_ENV: OnceCell<Environment> = OnceCell::new();
    OCI_ENV
        .get_or_try_init(sibyl::env)
        .map_err(|e| map_error(&e))
}

fn map_error(e: &sibyl::Error) -> GatewayError {
    match e {
        sibyl::Error::Oracle(code, message) => GatewayError::with_code(message.clone(), *code),
        other => GatewayError::new(other.to_string()),
    }
}

/// Driver that opens one dedicated connection per session.
pub struct OracleDriver {
    connect_string: String,
    user: String,
    password: String,
}

impl OracleDriver {
    pub fn new(
        connect_string: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        OracleDriver {
            connect_string: connect_string.into(),
            user: user.into(),
            password: password.into(),
        }
    }
}

impl Driver for OracleDriver {
    fn connect(&self) -> GatewayResult<Box<dyn Session>> {
        let env = oci_env()?;
        let connection = env
            .connect(&self.connect_string, &self.user, &self.password)
            .map_err(|e| map_error(&e))?;
        debug!(db = %self.connect_string, user = %self.user, "session acquired");
        Ok(Box::new(OracleSession {
            connection: Some(connection),
        }))
    }
}

struct OracleSession {
    // Dropped on release; a released session rejects further calls.
    connection: Option<sibyl::Connection<'static>>,
}

impl OracleSession {
    fn connection(&self) -> GatewayResult<&sibyl::Connection<'static>> {
        self.connection
            .as_ref()
            .ok_or_else(|| GatewayError::new("session already released"))
    }
}

/// Uppercased placeholder names, matching how OCI reports bind parameters.
fn placeholder_names(binds: &[Bind]) -> Vec<String> {
    binds
        .iter()
        .map(|(name, _)| format!(":{}", name.to_uppercase()))
        .collect()
}

/// Packs the gateway binds into sibyl's named-argument form. The returned
/// boxes must outlive the execute call that borrows them.
fn bind_args<'a>(binds: &'a [Bind], names: &'a [String]) -> Vec<Box<dyn StmtInArg + 'a>> {
    binds
        .iter()
        .zip(names)
        .map(|((_, value), name)| match value {
            SqlValue::Text(t) => {
                Box::new((name.as_str(), t.as_str())) as Box<dyn StmtInArg + 'a>
            }
            SqlValue::Integer(i) => Box::new((name.as_str(), *i)) as Box<dyn StmtInArg + 'a>,
            SqlValue::Number(n) => Box::new((name.as_str(), *n)) as Box<dyn StmtInArg + 'a>,
            SqlValue::Null => Box::new((name.as_str(), "")) as Box<dyn StmtInArg + 'a>,
        })
        .collect()
}

impl Session for OracleSession {
    fn run(&mut self, text: &str, binds: &[Bind]) -> GatewayResult<()> {
        let connection = self.connection()?;
        let stmt = connection.prepare(text).map_err(|e| map_error(&e))?;
        let names = placeholder_names(binds);
        let args = bind_args(binds, &names);
        let arg_refs: Vec<&dyn StmtInArg> = args.iter().map(|arg| arg.as_ref()).collect();
        stmt.execute(&arg_refs).map_err(|e| map_error(&e))?;
        Ok(())
    }

    fn query(&mut self, sql: &str, binds: &[Bind]) -> GatewayResult<RowSet> {
        let connection = self.connection()?;
        let stmt = connection.prepare(sql).map_err(|e| map_error(&e))?;
        let names = placeholder_names(binds);
        let args = bind_args(binds, &names);
        let arg_refs: Vec<&dyn StmtInArg> = args.iter().map(|arg| arg.as_ref()).collect();
        let mut rows = stmt.query(&arg_refs).map_err(|e| map_error(&e))?;

        // Column names are captured once and applied to every row.
        let column_count = stmt.column_count().map_err(|e| map_error(&e))?;
        let mut columns = Vec::with_capacity(column_count);
        let mut numeric = Vec::with_capacity(column_count);
        for pos in 0..column_count {
            let info = stmt
                .column(pos)
                .ok_or_else(|| GatewayError::new(format!("no metadata for column {}", pos)))?;
            columns.push(info.name().map_err(|e| map_error(&e))?.to_string());
            numeric.push(info.data_type().map_err(|e| map_error(&e))? == ColumnType::Number);
        }

        let mut collected = Vec::new();
        while let Some(row) = rows.next().map_err(|e| map_error(&e))? {
            let mut values = Vec::with_capacity(column_count);
            for pos in 0..column_count {
                let value = if numeric[pos] {
                    match row.get::<f64>(pos).map_err(|e| map_error(&e))? {
                        Some(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                            SqlValue::Integer(n as i64)
                        }
                        Some(n) => SqlValue::Number(n),
                        None => SqlValue::Null,
                    }
                } else {
                    // Non-numeric columns (including dates) surface through
                    // their textual form.
                    match row.get::<String>(pos).map_err(|e| map_error(&e))? {
                        Some(t) => SqlValue::Text(t),
                        None => SqlValue::Null,
                    }
                };
                values.push(value);
            }
            collected.push(values);
        }
        Ok(RowSet {
            columns,
            rows: collected,
        })
    }

    fn fetch_output_line(&mut self) -> GatewayResult<FetchedLine> {
        let connection = self.connection()?;
        let stmt = connection.prepare(GET_LINE).map_err(|e| map_error(&e))?;
        let mut line = String::with_capacity(MAX_LINE_LEN);
        let mut status: i32 = 0;
        stmt.execute_into(
            &[],
            &mut [&mut (":LINE", &mut line), &mut (":STATUS", &mut status)],
        )
        .map_err(|e| map_error(&e))?;

        // GET_LINE reports 1 when the buffer is exhausted.
        if status == 1 {
            Ok(FetchedLine {
                line: None,
                more: false,
            })
        } else {
            let line = if line.is_empty() { None } else { Some(line) };
            Ok(FetchedLine { line, more: true })
        }
    }

    fn release(&mut self) {
        if self.connection.take().is_some() {
            debug!("session released");
        }
    }
}

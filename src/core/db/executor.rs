/// Script and Query Execution Module
///
/// This module provides the two execution paths of the application:
///
/// - `ScriptExecutor`: the orchestrator that runs one PL/SQL block end to
///   end — enable the output buffer, submit, drain, disable, run follow-up
///   queries — with the session released on every exit path.
/// - `QueryExecutor`: the tabular gateway that runs one read query and maps
///   its rows into column-keyed records.

use crate::core::db::{drain_output, with_session, Bind, Driver, RowSet, Session, SqlValue};
use crate::core::{OralabError, Result};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

const ENABLE_OUTPUT: &str = "BEGIN DBMS_OUTPUT.ENABLE(NULL); END;";
const DISABLE_OUTPUT: &str = "BEGIN DBMS_OUTPUT.DISABLE(); END;";

/// One result row keyed by column name, preserving column order.
///
/// Serializes as a JSON object whose keys appear in the query's column
/// order (a plain map would reorder them).
#[derive(Debug, Clone, PartialEq)]
pub struct Record(pub Vec<(String, SqlValue)>);

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Represents the result of a read query execution.
#[derive(Debug, Serialize)]
pub struct QueryResult {
    /// Column names from the query result
    pub columns: Vec<String>,
    /// Rows as column-keyed records, in row order
    pub records: Vec<Record>,
    /// Number of rows returned
    pub row_count: usize,
}

impl QueryResult {
    /// Creates a new QueryResult from a raw row set, applying the column
    /// names captured once to every row.
    pub fn from_row_set(row_set: RowSet) -> Self {
        let columns = row_set.columns;
        let records: Vec<Record> = row_set
            .rows
            .into_iter()
            .map(|row| Record(columns.iter().cloned().zip(row).collect()))
            .collect();
        let row_count = records.len();
        QueryResult {
            columns,
            records,
            row_count,
        }
    }
}

/// Whether a follow-up table was actually loaded or degraded to empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    Loaded,
    Unavailable,
}

/// One named follow-up result set, with an explicit status instead of a
/// silent empty row list when the query behind it failed.
#[derive(Debug, Serialize)]
pub struct TableResult {
    pub label: String,
    pub status: TableStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl TableResult {
    fn loaded(label: &str, result: QueryResult) -> Self {
        TableResult {
            label: label.to_string(),
            status: TableStatus::Loaded,
            error: None,
            columns: result.columns,
            rows: result.records,
        }
    }

    /// Builds an explicitly degraded table for a follow-up that could not
    /// be loaded.
    pub fn unavailable(label: &str, message: String) -> Self {
        TableResult {
            label: label.to_string(),
            status: TableStatus::Unavailable,
            error: Some(message),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// A read query run after a script to surface its side effects.
#[derive(Debug, Clone)]
pub struct FollowUp {
    pub label: String,
    pub sql: String,
    pub binds: Vec<Bind>,
}

impl FollowUp {
    pub fn new(label: impl Into<String>, sql: impl Into<String>) -> Self {
        FollowUp {
            label: label.into(),
            sql: sql.into(),
            binds: Vec::new(),
        }
    }
}

/// One script execution request: the immutable block text, its bind
/// parameters, and the follow-up queries to run on the same session.
#[derive(Debug, Clone, Default)]
pub struct ScriptRequest {
    pub script_text: String,
    pub binds: Vec<Bind>,
    pub follow_ups: Vec<FollowUp>,
}

impl ScriptRequest {
    pub fn new(script_text: impl Into<String>) -> Self {
        ScriptRequest {
            script_text: script_text.into(),
            binds: Vec::new(),
            follow_ups: Vec::new(),
        }
    }

    pub fn bind(mut self, name: &'static str, value: impl Into<SqlValue>) -> Self {
        self.binds.push((name, value.into()));
        self
    }

    pub fn follow_up(mut self, follow_up: FollowUp) -> Self {
        self.follow_ups.push(follow_up);
        self
    }
}

/// Represents the result of one orchestrated script execution.
#[derive(Debug, Serialize)]
pub struct ScriptResult {
    /// Ordered buffered output, possibly empty
    pub output_lines: Vec<String>,
    /// The submitted script text, echoed for display and audit
    pub script_text: String,
    /// Follow-up result sets in declaration order
    pub tables: Vec<TableResult>,
}

/// Script execution orchestrator operating through a gateway driver.
///
/// Every execution acquires its own session, runs strictly sequential
/// steps, and releases the session exactly once regardless of where a step
/// failed. The orchestrator has no transaction-boundary opinion: commit and
/// rollback behavior is whatever the script text specifies.
pub struct ScriptExecutor<'a> {
    driver: &'a dyn Driver,
}

impl<'a> ScriptExecutor<'a> {
    /// Creates a new ScriptExecutor over the given driver
    pub fn new(driver: &'a dyn Driver) -> Self {
        ScriptExecutor { driver }
    }

    /// Executes one script request end to end.
    ///
    /// # Errors
    ///
    /// - `OralabError::Connection` if no session can be acquired
    /// - `OralabError::Session` if the output buffer cannot be enabled
    /// - `OralabError::Script` if the submitted block itself fails
    /// - `OralabError::Drain` if the retrieval loop fails
    ///
    /// A failure while disabling the buffer or while running a follow-up
    /// query never fails the request: the disable failure is logged, the
    /// follow-up failure degrades that one table to `unavailable`.
    pub fn execute(&self, request: &ScriptRequest) -> Result<ScriptResult> {
        with_session(self.driver, |session| {
            session
                .run(ENABLE_OUTPUT, &[])
                .map_err(|e| OralabError::Session(e.to_string()))?;

            // Disable is attempted whenever enable succeeded, including
            // after a failed submit or drain, so no buffer state leaks into
            // a later session on the same connection.
            let drained = Self::submit_and_drain(session, request);
            if let Err(e) = session.run(DISABLE_OUTPUT, &[]) {
                warn!(error = %e, "failed to disable server output buffer");
            }
            let output_lines = drained?;

            let mut tables = Vec::with_capacity(request.follow_ups.len());
            for follow_up in &request.follow_ups {
                tables.push(Self::run_follow_up(session, follow_up));
            }

            info!(
                lines = output_lines.len(),
                tables = tables.len(),
                "script executed"
            );
            Ok(ScriptResult {
                output_lines,
                script_text: request.script_text.clone(),
                tables,
            })
        })
    }

    fn submit_and_drain(session: &mut dyn Session, request: &ScriptRequest) -> Result<Vec<String>> {
        session
            .run(&request.script_text, &request.binds)
            .map_err(|e| OralabError::Script {
                message: e.message.clone(),
                code: e.code,
            })?;

        let (lines, fetches) = drain_output(session)?;
        debug!(lines = lines.len(), fetches, "output buffer drained");
        Ok(lines)
    }

    /// Runs one follow-up query, downgrading its failure to an explicit
    /// `unavailable` table instead of failing the whole request.
    pub fn run_follow_up(session: &mut dyn Session, follow_up: &FollowUp) -> TableResult {
        let mut executor = QueryExecutor::new(session);
        match executor.execute(&follow_up.sql, &follow_up.binds) {
            Ok(result) => TableResult::loaded(&follow_up.label, result),
            Err(e) => {
                warn!(label = %follow_up.label, error = %e, "follow-up query unavailable");
                TableResult::unavailable(&follow_up.label, e.to_string())
            }
        }
    }
}

/// Tabular query gateway bound to a live session.
///
/// Unlike follow-up handling in the orchestrator, this layer does not
/// tolerate failures: a failing query yields no result, not a partial one.
pub struct QueryExecutor<'a> {
    session: &'a mut dyn Session,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new QueryExecutor for the given session
    pub fn new(session: &'a mut dyn Session) -> Self {
        QueryExecutor { session }
    }

    /// Executes one read query and maps its rows into column-keyed records.
    ///
    /// # Errors
    ///
    /// Returns `OralabError::Query` on any database-reported error.
    pub fn execute(&mut self, sql: &str, binds: &[Bind]) -> Result<QueryResult> {
        let row_set = self
            .session
            .query(sql, binds)
            .map_err(|e| OralabError::Query(e.to_string()))?;
        Ok(QueryResult::from_row_set(row_set))
    }
}

/// Convenience function: acquires a session, runs one read query, releases
/// the session on every exit path.
pub fn execute_query(driver: &dyn Driver, sql: &str, binds: &[Bind]) -> Result<QueryResult> {
    with_session(driver, |session| {
        QueryExecutor::new(session).execute(sql, binds)
    })
}

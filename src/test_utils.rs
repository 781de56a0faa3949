/// # Test Utilities Module
///
/// Scriptable in-memory implementation of the database gateway surface,
/// used by the unit and integration test suites (and by the HTTP handler
/// tests, where it stands in for a real Oracle backend). It supports canned
/// output lines, canned per-query row sets, failure injection at every
/// pipeline stage, and probes for the resource discipline properties:
/// release count, fetch count, and the journal of executed SQL.

use crate::core::db::{
    Bind, Driver, FetchedLine, GatewayError, GatewayResult, RowSet, Session, SqlValue,
};
use std::sync::{Arc, Mutex};

/// A pipeline stage at which the mock injects a failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailPoint {
    /// Session acquisition fails (connection refused).
    Connect,
    /// Enabling the output buffer fails.
    Enable,
    /// Submitting the script fails, with an Oracle-style numeric code.
    Script,
    /// The N-th fetch round trip fails (1-based).
    Fetch(usize),
    /// Disabling the output buffer fails.
    Disable,
    /// Every query fails. For per-query failures use `with_query_failure`.
    Query,
}

/// One canned query response, matched by SQL fragment.
#[derive(Debug, Clone)]
struct CannedQuery {
    fragment: String,
    response: std::result::Result<RowSet, String>,
}

#[derive(Debug, Default)]
struct MockState {
    output_lines: Vec<String>,
    canned_queries: Vec<CannedQuery>,
    fail: Option<FailPoint>,
    release_count: usize,
    fetch_count: usize,
    executed_sql: Vec<String>,
    bound_values: Vec<(String, SqlValue)>,
}

/// Scriptable mock implementation of the `Driver` trait.
///
/// All sessions of one driver share its interior state, and clones share
/// it too, so a test can hand the driver to an executor or a router and
/// keep probing it through a clone after the execution finished.
#[derive(Debug, Default, Clone)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        MockDriver::default()
    }

    /// Lines the next script execution will leave in the output buffer.
    pub fn with_output_lines<S: Into<String>>(self, lines: Vec<S>) -> Self {
        self.state.lock().unwrap().output_lines = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Cans a successful row set for every query whose SQL contains
    /// `fragment`.
    pub fn with_query_rows<S: Into<String>>(
        self,
        fragment: &str,
        columns: Vec<S>,
        rows: Vec<Vec<SqlValue>>,
    ) -> Self {
        self.state.lock().unwrap().canned_queries.push(CannedQuery {
            fragment: fragment.to_string(),
            response: Ok(RowSet {
                columns: columns.into_iter().map(Into::into).collect(),
                rows,
            }),
        });
        self
    }

    /// Cans a failure for every query whose SQL contains `fragment`.
    pub fn with_query_failure(self, fragment: &str, message: &str) -> Self {
        self.state.lock().unwrap().canned_queries.push(CannedQuery {
            fragment: fragment.to_string(),
            response: Err(message.to_string()),
        });
        self
    }

    /// Injects a failure at the given pipeline stage.
    pub fn with_failure(self, fail: FailPoint) -> Self {
        self.state.lock().unwrap().fail = Some(fail);
        self
    }

    /// Number of times any session of this driver was released.
    pub fn release_count(&self) -> usize {
        self.state.lock().unwrap().release_count
    }

    /// Number of fetch round trips issued across all sessions.
    pub fn fetch_count(&self) -> usize {
        self.state.lock().unwrap().fetch_count
    }

    /// Journal of every script and query text submitted, in order.
    pub fn executed_sql(&self) -> Vec<String> {
        self.state.lock().unwrap().executed_sql.clone()
    }

    /// Every bind value that crossed the gateway, as (name, value) pairs.
    pub fn bound_values(&self) -> Vec<(String, SqlValue)> {
        self.state.lock().unwrap().bound_values.clone()
    }
}

impl Driver for MockDriver {
    fn connect(&self) -> GatewayResult<Box<dyn Session>> {
        let state = self.state.lock().unwrap();
        if state.fail == Some(FailPoint::Connect) {
            return Err(GatewayError::new("mock: connection refused"));
        }
        drop(state);
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
            line_pos: 0,
            released: false,
        }))
    }
}

struct MockSession {
    state: Arc<Mutex<MockState>>,
    line_pos: usize,
    released: bool,
}

impl MockSession {
    fn record(&self, text: &str, binds: &[Bind]) {
        let mut state = self.state.lock().unwrap();
        state.executed_sql.push(text.to_string());
        for (name, value) in binds {
            state.bound_values.push((name.to_string(), value.clone()));
        }
    }
}

impl Session for MockSession {
    fn run(&mut self, text: &str, binds: &[Bind]) -> GatewayResult<()> {
        self.record(text, binds);
        let fail = self.state.lock().unwrap().fail;
        if text.contains("DBMS_OUTPUT.ENABLE") {
            if fail == Some(FailPoint::Enable) {
                return Err(GatewayError::new("mock: enable failed"));
            }
        } else if text.contains("DBMS_OUTPUT.DISABLE") {
            if fail == Some(FailPoint::Disable) {
                return Err(GatewayError::new("mock: disable failed"));
            }
        } else if fail == Some(FailPoint::Script) {
            return Err(GatewayError::with_code("mock: script failed", 6550));
        }
        Ok(())
    }

    fn query(&mut self, sql: &str, binds: &[Bind]) -> GatewayResult<RowSet> {
        self.record(sql, binds);
        let state = self.state.lock().unwrap();
        if state.fail == Some(FailPoint::Query) {
            return Err(GatewayError::with_code("mock: query failed", 942));
        }
        for canned in &state.canned_queries {
            if sql.contains(&canned.fragment) {
                return match &canned.response {
                    Ok(row_set) => Ok(row_set.clone()),
                    Err(message) => Err(GatewayError::with_code(message.clone(), 942)),
                };
            }
        }
        // Unmatched queries return an empty row set rather than failing, so
        // tests only need to can the queries they care about.
        Ok(RowSet::default())
    }

    fn fetch_output_line(&mut self) -> GatewayResult<FetchedLine> {
        let mut state = self.state.lock().unwrap();
        state.fetch_count += 1;
        if let Some(FailPoint::Fetch(n)) = state.fail {
            if state.fetch_count == n {
                return Err(GatewayError::new("mock: fetch failed"));
            }
        }
        if self.line_pos < state.output_lines.len() {
            let text = state.output_lines[self.line_pos].clone();
            self.line_pos += 1;
            // An empty PUT_LINE surfaces as no text with the "more" status.
            let line = if text.is_empty() { None } else { Some(text) };
            Ok(FetchedLine { line, more: true })
        } else {
            Ok(FetchedLine {
                line: None,
                more: false,
            })
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.state.lock().unwrap().release_count += 1;
        }
    }
}

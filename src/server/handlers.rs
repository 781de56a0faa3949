/// HTTP endpoint handlers.
///
/// Every database-touching handler follows the same shape: select the fixed
/// script or query text for the route, hop onto the blocking thread pool,
/// run it through the orchestrator or the query gateway, and serialize the
/// result as JSON. Sessions live entirely inside one handler invocation.

use crate::core::db::{
    execute_query, with_session, FollowUp, QueryExecutor, ScriptExecutor, ScriptRequest,
    ScriptResult, SqlValue, TableResult,
};
use crate::core::Result as CoreResult;
use crate::scripts;
use crate::server::error::ApiError;
use crate::server::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Unquoted Oracle identifier shape. Identifiers cannot be bound, so any
/// name spliced into SQL text must match this and is then double-quoted.
static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9_#$]+$").unwrap());

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint. Does not contact the database.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// One catalog entry in the demo listing.
#[derive(Debug, Serialize)]
pub struct DemoSummary {
    pub name: &'static str,
    pub title: &'static str,
    pub has_follow_ups: bool,
}

/// `GET /api/demos` - the script catalog.
pub async fn list_demos() -> Json<Vec<DemoSummary>> {
    let demos = scripts::all()
        .iter()
        .map(|demo| DemoSummary {
            name: demo.name,
            title: demo.title,
            has_follow_ups: !demo.follow_ups.is_empty(),
        })
        .collect();
    Json(demos)
}

/// `GET /api/demos/{name}` - run one cataloged script.
pub async fn run_demo(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> std::result::Result<Json<ScriptResult>, ApiError> {
    let demo = scripts::find(&name)
        .ok_or_else(|| ApiError::NotFound(format!("unknown demo: {}", name)))?;

    let mut request = ScriptRequest::new(demo.script);
    for follow_up in demo.follow_ups {
        request = request.follow_up(FollowUp::new(follow_up.label, follow_up.sql));
    }

    let result = run_blocking(state, move |state| {
        ScriptExecutor::new(state.driver()).execute(&request)
    })
    .await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct ExistsParams {
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub username: String,
    pub exists: bool,
}

/// `GET /api/users/exists?username=X` - one bound dictionary count.
pub async fn user_exists(
    State(state): State<AppState>,
    Query(params): Query<ExistsParams>,
) -> std::result::Result<Json<ExistsResponse>, ApiError> {
    let username = params
        .username
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing username parameter".to_string()))?
        .to_uppercase();

    let bound = username.clone();
    let result = run_blocking(state, move |state| {
        execute_query(
            state.driver(),
            "SELECT COUNT(*) AS TOTAL FROM ALL_USERS WHERE USERNAME = :username",
            &[("username", SqlValue::Text(bound))],
        )
    })
    .await?;

    let exists = result
        .records
        .first()
        .and_then(|record| record.0.first())
        .map(|(_, value)| value_is_positive(value))
        .unwrap_or(false);
    Ok(Json(ExistsResponse { username, exists }))
}

/// One object privilege row from DBA_TAB_PRIVS.
#[derive(Debug, Serialize)]
pub struct ObjectPrivilege {
    pub owner: String,
    pub object: String,
    pub privilege: String,
}

/// Privilege report for one grantee, with a sample of every table the
/// grantee can SELECT from.
#[derive(Debug, Serialize)]
pub struct PrivilegeReport {
    pub username: String,
    pub system_privileges: Vec<String>,
    pub object_privileges: Vec<ObjectPrivilege>,
    pub roles: Vec<String>,
    pub samples: Vec<TableResult>,
}

/// `GET /api/users/{username}/privileges` - privilege introspection.
///
/// The three dictionary queries are strict: a failure in any of them fails
/// the request. The per-table ten-row samples are tolerant and report an
/// `unavailable` status instead.
pub async fn user_privileges(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> std::result::Result<Json<PrivilegeReport>, ApiError> {
    let grantee = username.to_uppercase();

    let report = run_blocking(state, move |state| {
        with_session(state.driver(), |session| {
            let binds = [("grantee", SqlValue::Text(grantee.clone()))];
            let mut executor = QueryExecutor::new(session);

            let sys_privs = executor.execute(
                "SELECT PRIVILEGE FROM DBA_SYS_PRIVS WHERE GRANTEE = :grantee",
                &binds,
            )?;
            let obj_privs = executor.execute(
                "SELECT OWNER, TABLE_NAME, PRIVILEGE FROM DBA_TAB_PRIVS WHERE GRANTEE = :grantee",
                &binds,
            )?;
            let roles = executor.execute(
                "SELECT GRANTED_ROLE FROM DBA_ROLE_PRIVS WHERE GRANTEE = :grantee",
                &binds,
            )?;

            let object_privileges: Vec<ObjectPrivilege> = obj_privs
                .records
                .iter()
                .map(|record| ObjectPrivilege {
                    owner: record.0[0].1.as_text(),
                    object: record.0[1].1.as_text(),
                    privilege: record.0[2].1.as_text(),
                })
                .collect();

            let mut samples = Vec::new();
            for privilege in object_privileges.iter().filter(|p| p.privilege == "SELECT") {
                samples.push(sample_table(session, &privilege.owner, &privilege.object));
            }

            Ok(PrivilegeReport {
                username: grantee.clone(),
                system_privileges: first_column(sys_privs),
                object_privileges,
                roles: first_column(roles),
                samples,
            })
        })
    })
    .await?;
    Ok(Json(report))
}

/// ID-validation response: the candidate value plus the full script result.
#[derive(Debug, Serialize)]
pub struct IdValidationResponse {
    pub id: String,
    #[serde(flatten)]
    pub result: ScriptResult,
}

/// `GET /api/id-numbers/{id}/validate` - run the checksum block with the
/// candidate as a bind variable, then list every stored ID.
pub async fn validate_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<IdValidationResponse>, ApiError> {
    let request = ScriptRequest::new(scripts::ID_VALIDATION_SCRIPT)
        .bind("id", id.clone())
        .follow_up(FollowUp::new("stored_ids", scripts::STORED_IDS_SQL));

    let result = run_blocking(state, move |state| {
        ScriptExecutor::new(state.driver()).execute(&request)
    })
    .await?;
    Ok(Json(IdValidationResponse { id, result }))
}

#[derive(Debug, Serialize)]
pub struct TablesResponse {
    pub tables: Vec<String>,
}

/// `GET /api/tables` - table names of the configured sample schema.
pub async fn list_tables(
    State(state): State<AppState>,
) -> std::result::Result<Json<TablesResponse>, ApiError> {
    let owner = state.sample_schema().to_string();
    let result = run_blocking(state, move |state| {
        execute_query(
            state.driver(),
            "SELECT TABLE_NAME FROM ALL_TABLES WHERE OWNER = :owner ORDER BY TABLE_NAME",
            &[("owner", SqlValue::Text(owner))],
        )
    })
    .await?;
    Ok(Json(TablesResponse {
        tables: first_column(result),
    }))
}

#[derive(Debug, Serialize)]
pub struct ColumnsResponse {
    pub table: String,
    pub columns: Vec<String>,
}

/// `GET /api/tables/{table}/columns` - column names in column order.
pub async fn table_columns(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> std::result::Result<Json<ColumnsResponse>, ApiError> {
    let table = table.to_uppercase();
    let columns = fetch_columns(state, table.clone()).await?;
    if columns.is_empty() {
        return Err(ApiError::NotFound(format!("unknown table: {}", table)));
    }
    Ok(Json(ColumnsResponse { table, columns }))
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub columns: Vec<String>,
    pub separator: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub content: String,
}

/// `POST /api/tables/{table}/export` - the first 50 rows of the chosen
/// columns as separator-joined text.
///
/// Column names cannot be bound, so the requested names are checked against
/// the table's introspected columns and double-quoted before splicing.
pub async fn export_table(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(request): Json<ExportRequest>,
) -> std::result::Result<Json<ExportResponse>, ApiError> {
    if request.columns.is_empty() {
        return Err(ApiError::BadRequest(
            "at least one column must be selected".to_string(),
        ));
    }
    let separator = parse_separator(request.separator.as_deref());

    let table = table.to_uppercase();
    let known = fetch_columns(state.clone(), table.clone()).await?;
    if known.is_empty() {
        return Err(ApiError::NotFound(format!("unknown table: {}", table)));
    }

    let mut selected = Vec::with_capacity(request.columns.len());
    for column in &request.columns {
        let column = column.to_uppercase();
        if !known.contains(&column) {
            return Err(ApiError::BadRequest(format!(
                "unknown column for {}: {}",
                table, column
            )));
        }
        selected.push(quote_identifier(&column)?);
    }

    let owner = quote_identifier(state.sample_schema())?;
    let sql = format!(
        "SELECT {} FROM {}.{} FETCH FIRST 50 ROWS ONLY",
        selected.join(", "),
        owner,
        quote_identifier(&table)?,
    );

    let result = run_blocking(state, move |state| {
        execute_query(state.driver(), &sql, &[])
    })
    .await?;

    let content = result
        .records
        .iter()
        .map(|record| {
            record
                .0
                .iter()
                .map(|(_, value)| value.as_text())
                .collect::<Vec<_>>()
                .join(&separator)
        })
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Json(ExportResponse { content }))
}

/// Runs a core operation on the blocking thread pool. A panicked task maps
/// to an internal error rather than poisoning the connection handler.
async fn run_blocking<T, F>(state: AppState, f: F) -> std::result::Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> CoreResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Column introspection shared by the columns and export routes.
async fn fetch_columns(
    state: AppState,
    table: String,
) -> std::result::Result<Vec<String>, ApiError> {
    let owner = state.sample_schema().to_string();
    let result = run_blocking(state, move |state| {
        execute_query(
            state.driver(),
            "SELECT COLUMN_NAME FROM ALL_TAB_COLUMNS WHERE OWNER = :owner AND TABLE_NAME = :table_name ORDER BY COLUMN_ID",
            &[
                ("owner", SqlValue::Text(owner)),
                ("table_name", SqlValue::Text(table)),
            ],
        )
    })
    .await?;
    Ok(first_column(result))
}

/// Flattens a single-column query result into its textual values.
fn first_column(result: crate::core::db::QueryResult) -> Vec<String> {
    result
        .records
        .iter()
        .filter_map(|record| record.0.first().map(|(_, value)| value.as_text()))
        .collect()
}

fn value_is_positive(value: &SqlValue) -> bool {
    match value {
        SqlValue::Integer(i) => *i > 0,
        SqlValue::Number(n) => *n > 0.0,
        SqlValue::Text(t) => t.parse::<i64>().map(|n| n > 0).unwrap_or(false),
        SqlValue::Null => false,
    }
}

/// Maps the export separator token to the character it stands for.
/// Unknown tokens fall back to the comma default.
fn parse_separator(token: Option<&str>) -> String {
    match token {
        Some(";") => ";".to_string(),
        Some("space") => " ".to_string(),
        Some("\\") => "\\".to_string(),
        Some("tab") => "\t".to_string(),
        Some("newline") => "\n".to_string(),
        _ => ",".to_string(),
    }
}

/// Validates and double-quotes one Oracle identifier for splicing into SQL
/// text, since identifiers cannot be bound.
fn quote_identifier(name: &str) -> std::result::Result<String, ApiError> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(format!("\"{}\"", name))
    } else {
        Err(ApiError::BadRequest(format!("invalid identifier: {}", name)))
    }
}

/// Runs one tolerant ten-row sample of a table the grantee can read. An
/// invalid identifier or a failing query degrades to an `unavailable`
/// sample, never a request failure.
fn sample_table(
    session: &mut dyn crate::core::db::Session,
    owner: &str,
    table: &str,
) -> TableResult {
    let label = format!("{}.{}", owner, table);
    let sql = match (quote_identifier(owner), quote_identifier(table)) {
        (Ok(owner), Ok(table)) => {
            format!("SELECT * FROM {}.{} WHERE ROWNUM <= 10", owner, table)
        }
        _ => {
            return TableResult::unavailable(&label, format!("invalid identifier in {}", label));
        }
    };
    let follow_up = FollowUp::new(label, sql);
    ScriptExecutor::run_follow_up(session, &follow_up)
}

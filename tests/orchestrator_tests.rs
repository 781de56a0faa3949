//! End-to-end properties of the script execution pipeline over the mock
//! gateway: drain termination, session release discipline, and per-label
//! follow-up degradation.

use oralab::core::db::{
    execute_query, FollowUp, ScriptExecutor, ScriptRequest, SqlValue, TableStatus,
};
use oralab::core::OralabError;
use oralab::test_utils::{FailPoint, MockDriver};

#[test]
fn zero_output_script_succeeds_with_empty_lines() {
    let driver = MockDriver::new();
    let executor = ScriptExecutor::new(&driver);

    let result = executor.execute(&ScriptRequest::new("BEGIN NULL; END;")).unwrap();
    assert!(result.output_lines.is_empty());
    // One fetch: the sentinel itself.
    assert_eq!(driver.fetch_count(), 1);
    assert_eq!(driver.release_count(), 1);
}

#[test]
fn n_lines_cost_n_plus_one_fetches() {
    for n in [1usize, 2, 10, 100] {
        let lines: Vec<String> = (0..n).map(|i| format!("line {}", i)).collect();
        let driver = MockDriver::new().with_output_lines(lines.clone());
        let executor = ScriptExecutor::new(&driver);

        let result = executor.execute(&ScriptRequest::new("BEGIN NULL; END;")).unwrap();
        assert_eq!(result.output_lines, lines);
        assert_eq!(driver.fetch_count(), n + 1, "for {} lines", n);
    }
}

#[test]
fn session_released_once_for_every_failure_point() {
    let failure_points = [
        FailPoint::Enable,
        FailPoint::Script,
        FailPoint::Fetch(1),
        FailPoint::Fetch(3),
        FailPoint::Disable,
        FailPoint::Query,
    ];
    for fail in failure_points {
        let driver = MockDriver::new()
            .with_output_lines(vec!["a", "b", "c"])
            .with_failure(fail);
        let executor = ScriptExecutor::new(&driver);
        let request = ScriptRequest::new("BEGIN NULL; END;")
            .follow_up(FollowUp::new("after", "SELECT 1 FROM DUAL"));

        let _ = executor.execute(&request);
        assert_eq!(driver.release_count(), 1, "failure point {:?}", fail);
    }
}

#[test]
fn connect_failure_releases_nothing_and_classifies_as_connection() {
    let driver = MockDriver::new().with_failure(FailPoint::Connect);
    let executor = ScriptExecutor::new(&driver);

    let err = executor
        .execute(&ScriptRequest::new("BEGIN NULL; END;"))
        .unwrap_err();
    assert!(matches!(err, OralabError::Connection(_)));
    assert_eq!(driver.release_count(), 0);
}

#[test]
fn enable_failure_classifies_as_session() {
    let driver = MockDriver::new().with_failure(FailPoint::Enable);
    let executor = ScriptExecutor::new(&driver);

    let err = executor
        .execute(&ScriptRequest::new("BEGIN NULL; END;"))
        .unwrap_err();
    assert!(matches!(err, OralabError::Session(_)));
}

#[test]
fn drain_failure_is_distinct_from_empty_output() {
    let driver = MockDriver::new()
        .with_output_lines(vec!["something"])
        .with_failure(FailPoint::Fetch(1));
    let executor = ScriptExecutor::new(&driver);

    let err = executor
        .execute(&ScriptRequest::new("BEGIN NULL; END;"))
        .unwrap_err();
    assert!(matches!(err, OralabError::Drain(_)));
}

#[test]
fn disable_failure_after_failed_drain_keeps_the_drain_error() {
    // The drain fails on the second fetch; the disable attempt that follows
    // must still happen and must not replace the drain error.
    let driver = MockDriver::new()
        .with_output_lines(vec!["a", "b"])
        .with_failure(FailPoint::Fetch(2));
    let executor = ScriptExecutor::new(&driver);

    let err = executor
        .execute(&ScriptRequest::new("BEGIN NULL; END;"))
        .unwrap_err();
    assert!(matches!(err, OralabError::Drain(_)));
    assert!(driver
        .executed_sql()
        .iter()
        .any(|sql| sql.contains("DBMS_OUTPUT.DISABLE")));
}

#[test]
fn ten_insert_demo_shape() {
    // Script inserting 10 rows and printing one line per insertion: the
    // output has exactly 10 matching entries and the follow-up table
    // reflects the stored values in ascending order.
    let lines: Vec<String> = (1..=10).map(|n| format!("Inserted NUMBER: {}", n)).collect();
    let rows: Vec<Vec<SqlValue>> = (1..=10).map(|n| vec![SqlValue::Integer(n)]).collect();
    let driver = MockDriver::new()
        .with_output_lines(lines)
        .with_query_rows("FROM HR.DEMO_NUMBERS", vec!["N"], rows);
    let executor = ScriptExecutor::new(&driver);

    let request = ScriptRequest::new("BEGIN NULL; END;").follow_up(FollowUp::new(
        "numbers",
        "SELECT n FROM HR.DEMO_NUMBERS ORDER BY n",
    ));
    let result = executor.execute(&request).unwrap();

    assert_eq!(result.output_lines.len(), 10);
    for (i, line) in result.output_lines.iter().enumerate() {
        assert_eq!(line, &format!("Inserted NUMBER: {}", i + 1));
    }

    let table = &result.tables[0];
    assert_eq!(table.status, TableStatus::Loaded);
    let values: Vec<i64> = table
        .rows
        .iter()
        .map(|record| match &record.0[0].1 {
            SqlValue::Integer(n) => *n,
            other => panic!("unexpected value {:?}", other),
        })
        .collect();
    assert_eq!(values, (1..=10).collect::<Vec<i64>>());
}

#[test]
fn missing_follow_up_object_degrades_and_preserves_the_rest() {
    let driver = MockDriver::new()
        .with_output_lines(vec!["main output"])
        .with_query_rows("FROM PRESENT", vec!["X"], vec![vec![SqlValue::Integer(1)]])
        .with_query_failure("FROM ABSENT", "table or view does not exist");
    let executor = ScriptExecutor::new(&driver);

    let request = ScriptRequest::new("BEGIN NULL; END;")
        .follow_up(FollowUp::new("present", "SELECT X FROM PRESENT"))
        .follow_up(FollowUp::new("absent", "SELECT X FROM ABSENT"))
        .follow_up(FollowUp::new("also_present", "SELECT X FROM PRESENT"));
    let result = executor.execute(&request).unwrap();

    assert_eq!(result.output_lines, vec!["main output"]);
    assert_eq!(result.tables.len(), 3);
    assert_eq!(result.tables[0].status, TableStatus::Loaded);
    assert_eq!(result.tables[1].status, TableStatus::Unavailable);
    assert!(result.tables[1].rows.is_empty());
    assert_eq!(result.tables[2].status, TableStatus::Loaded);
}

#[test]
fn script_result_serializes_empty_output_as_empty_array() {
    let driver = MockDriver::new();
    let executor = ScriptExecutor::new(&driver);

    let result = executor.execute(&ScriptRequest::new("BEGIN NULL; END;")).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["output_lines"], serde_json::json!([]));
    assert_eq!(json["script_text"], "BEGIN NULL; END;");
}

#[test]
fn binds_cross_the_gateway_instead_of_being_spliced() {
    let driver = MockDriver::new();
    let executor = ScriptExecutor::new(&driver);

    let request = ScriptRequest::new("BEGIN check(:id); END;").bind("id", "1710034065");
    executor.execute(&request).unwrap();

    let bound = driver.bound_values();
    assert_eq!(bound.len(), 1);
    assert_eq!(bound[0].0, "id");
    assert_eq!(bound[0].1, SqlValue::Text("1710034065".to_string()));
    // The script text itself stays free of the candidate value.
    assert!(driver.executed_sql().iter().all(|sql| !sql.contains("1710034065")));
}

#[test]
fn standalone_query_does_not_tolerate_failure() {
    let driver = MockDriver::new().with_query_failure("FROM GONE", "missing");
    let err = execute_query(&driver, "SELECT 1 FROM GONE", &[]).unwrap_err();
    assert!(matches!(err, OralabError::Query(_)));
    assert_eq!(driver.release_count(), 1);
}

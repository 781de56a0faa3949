/// Output Drain Protocol
///
/// Procedural database output is a server-side line buffer with no random
/// access: the only retrieval mechanism the engine offers is "fetch the next
/// line" repeated until a sentinel status. This module implements that
/// polling loop exactly once, as a lazy, finite, non-restartable iterator,
/// so no call site carries the sentinel bookkeeping itself.

use crate::core::db::Session;
use crate::core::{OralabError, Result};

/// Lazy iterator over a session's buffered output lines.
///
/// Each `next()` call issues one fetch round trip. The iterator ends on the
/// first sentinel status. A fetch failure is yielded as a single `Err` item
/// and poisons the iterator; further calls yield nothing. The drain is not
/// restartable: once exhausted it stays exhausted.
pub struct OutputDrain<'a> {
    session: &'a mut dyn Session,
    fetch_count: usize,
    done: bool,
}

impl<'a> OutputDrain<'a> {
    /// Creates a drain over a session on which output buffering has been
    /// enabled and a script has already been submitted.
    pub fn new(session: &'a mut dyn Session) -> Self {
        OutputDrain {
            session,
            fetch_count: 0,
            done: false,
        }
    }

    /// Number of fetch round trips issued so far. For a script that produced
    /// N lines a full drain issues exactly N+1 fetches, the last one being
    /// the sentinel.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count
    }

    /// Eagerly drains the remaining lines into an ordered sequence.
    ///
    /// Zero produced lines is success (an empty sequence), not an error.
    ///
    /// # Errors
    ///
    /// Returns `OralabError::Drain` if a fetch round trip itself fails; no
    /// retry is attempted.
    pub fn collect_lines(mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        for item in &mut self {
            lines.push(item?);
        }
        Ok(lines)
    }
}

impl Iterator for OutputDrain<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.fetch_count += 1;
        match self.session.fetch_output_line() {
            Ok(fetched) => {
                if fetched.more {
                    // A line with no text is an empty PUT_LINE, not the end.
                    Some(Ok(fetched.line.unwrap_or_default()))
                } else {
                    self.done = true;
                    None
                }
            }
            Err(e) => {
                self.done = true;
                Some(Err(OralabError::Drain(e.to_string())))
            }
        }
    }
}

/// Convenience wrapper: fully drains a session's output buffer, returning
/// the ordered lines and the number of fetch round trips issued.
pub fn drain_output(session: &mut dyn Session) -> Result<(Vec<String>, usize)> {
    let mut drain = OutputDrain::new(session);
    let mut lines = Vec::new();
    while let Some(item) = drain.next() {
        lines.push(item?);
    }
    Ok((lines, drain.fetch_count()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockDriver;
    use crate::core::db::Driver;

    #[test]
    fn test_drain_collects_lines_in_order() {
        let driver = MockDriver::new().with_output_lines(vec!["one", "two", "three"]);
        let mut session = driver.connect().unwrap();

        let (lines, fetches) = drain_output(session.as_mut()).unwrap();
        assert_eq!(lines, vec!["one", "two", "three"]);
        assert_eq!(fetches, 4);
    }

    #[test]
    fn test_drain_empty_buffer_is_success() {
        let driver = MockDriver::new();
        let mut session = driver.connect().unwrap();

        let (lines, fetches) = drain_output(session.as_mut()).unwrap();
        assert!(lines.is_empty());
        assert_eq!(fetches, 1);
    }

    #[test]
    fn test_drain_fetch_failure_aborts() {
        use crate::test_utils::FailPoint;

        let driver = MockDriver::new()
            .with_output_lines(vec!["one", "two"])
            .with_failure(FailPoint::Fetch(2));
        let mut session = driver.connect().unwrap();

        let result = drain_output(session.as_mut());
        match result {
            Err(OralabError::Drain(_)) => {}
            other => panic!("Expected Drain error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_drain_iterator_is_poisoned_after_failure() {
        use crate::test_utils::FailPoint;

        let driver = MockDriver::new()
            .with_output_lines(vec!["one"])
            .with_failure(FailPoint::Fetch(1));
        let mut session = driver.connect().unwrap();

        let mut drain = OutputDrain::new(session.as_mut());
        assert!(matches!(drain.next(), Some(Err(OralabError::Drain(_)))));
        assert!(drain.next().is_none());
        assert!(drain.next().is_none());
        assert_eq!(drain.fetch_count(), 1);
    }

    #[test]
    fn test_drain_treats_empty_line_as_line() {
        let driver = MockDriver::new().with_output_lines(vec![""]);
        let mut session = driver.connect().unwrap();

        let (lines, fetches) = drain_output(session.as_mut()).unwrap();
        assert_eq!(lines, vec![""]);
        assert_eq!(fetches, 2);
    }
}

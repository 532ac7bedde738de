use crate::error::PrompterError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// The five traced operations of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Analyze,
    Optimize,
    Compare,
    Score,
    Orchestrate,
}

impl Stage {
    pub fn op_name(self) -> &'static str {
        match self {
            Stage::Analyze => "analyze_prompt",
            Stage::Optimize => "optimize_prompt",
            Stage::Compare => "compare_outputs",
            Stage::Score => "score_outputs",
            Stage::Orchestrate => "generate_responses",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.op_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Running,
    Succeeded,
    Failed(String),
    /// The call was dropped before completing (Ctrl-C, sibling failure).
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct CallRecord {
    pub id: Uuid,
    pub op: Stage,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub outcome: CallOutcome,
}

/// Oldest records are discarded beyond this many.
pub const MAX_CALLS: usize = 256;

/// In-process call span collector. Cloning shares the same log.
///
/// Recording never alters the result of the wrapped call.
#[derive(Debug, Clone, Default)]
pub struct CallTracer {
    calls: Arc<Mutex<Vec<CallRecord>>>,
}

impl CallTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record<T, F>(&self, op: Stage, call: F) -> Result<T, PrompterError>
    where
        F: Future<Output = Result<T, PrompterError>>,
    {
        let mut span = self.open(op);

        let result = call.await;

        span.outcome = match &result {
            Ok(_) => CallOutcome::Succeeded,
            Err(e) => CallOutcome::Failed(e.to_string()),
        };
        result
    }

    /// Most recently started call of `op`, if any.
    pub fn latest(&self, op: Stage) -> Option<CallRecord> {
        self.lock()
            .iter()
            .filter(|r| r.op == op)
            .max_by_key(|r| r.started_at)
            .cloned()
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.lock().clone()
    }

    pub fn trace_link(&self, base_url: &str, op: Stage) -> Option<String> {
        self.latest(op).map(|rec| format!("{base_url}{}", rec.id))
    }

    fn open(&self, op: Stage) -> OpenSpan<'_> {
        let id = Uuid::new_v4();
        let mut calls = self.lock();
        if calls.len() >= MAX_CALLS {
            let excess = calls.len() + 1 - MAX_CALLS;
            calls.drain(..excess);
        }
        calls.push(CallRecord {
            id,
            op,
            started_at: Utc::now(),
            ended_at: None,
            outcome: CallOutcome::Running,
        });
        log::debug!("span {op} [{id}] started");

        OpenSpan { tracer: self, id, op, outcome: CallOutcome::Cancelled }
    }

    fn close(&self, id: Uuid, outcome: CallOutcome) {
        if let Some(rec) = self.lock().iter_mut().rev().find(|r| r.id == id) {
            rec.ended_at = Some(Utc::now());
            rec.outcome = outcome;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CallRecord>> {
        // A panic while holding the lock leaves the log readable.
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Closes its record on drop; stays `Cancelled` unless an outcome is set.
struct OpenSpan<'a> {
    tracer: &'a CallTracer,
    id: Uuid,
    op: Stage,
    outcome: CallOutcome,
}

impl Drop for OpenSpan<'_> {
    fn drop(&mut self) {
        let outcome = std::mem::replace(&mut self.outcome, CallOutcome::Cancelled);
        log::debug!("span {} [{}] finished: {:?}", self.op, self.id, outcome);
        self.tracer.close(self.id, outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_success_and_failure() {
        let tracer = CallTracer::new();

        let ok: Result<u32, PrompterError> = tracer.record(Stage::Analyze, async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err: Result<u32, PrompterError> = tracer
            .record(Stage::Score, async { Err(PrompterError::Interrupted) })
            .await;
        assert!(matches!(err, Err(PrompterError::Interrupted)));

        let calls = tracer.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].outcome, CallOutcome::Succeeded);
        assert!(calls[0].ended_at.is_some());
        assert_eq!(
            calls[1].outcome,
            CallOutcome::Failed("Interrupted by user".to_string())
        );
    }

    #[tokio::test]
    async fn latest_returns_most_recent_call_of_stage() {
        let tracer = CallTracer::new();
        for _ in 0..3 {
            let _ = tracer
                .record(Stage::Orchestrate, async { Ok::<_, PrompterError>(()) })
                .await;
        }
        let _ = tracer
            .record(Stage::Analyze, async { Ok::<_, PrompterError>(()) })
            .await;

        let last = tracer.latest(Stage::Orchestrate).unwrap();
        let all: Vec<_> = tracer
            .calls()
            .into_iter()
            .filter(|c| c.op == Stage::Orchestrate)
            .collect();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|c| c.started_at <= last.started_at));
        assert!(tracer.latest(Stage::Compare).is_none());

        let link = tracer
            .trace_link("https://traces.example/call/", Stage::Analyze)
            .unwrap();
        assert_eq!(
            link,
            format!(
                "https://traces.example/call/{}",
                tracer.latest(Stage::Analyze).unwrap().id
            )
        );
    }

    #[tokio::test]
    async fn dropped_call_is_marked_cancelled() {
        let tracer = CallTracer::new();
        let pending = std::future::pending::<Result<(), PrompterError>>();

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            tracer.record(Stage::Compare, pending),
        )
        .await;
        assert!(timed_out.is_err());

        let rec = tracer.latest(Stage::Compare).unwrap();
        assert_eq!(rec.outcome, CallOutcome::Cancelled);
        assert!(rec.ended_at.is_some());
    }

    #[tokio::test]
    async fn log_keeps_only_recent_calls() {
        let tracer = CallTracer::new();
        for _ in 0..MAX_CALLS + 10 {
            let _ = tracer
                .record(Stage::Analyze, async { Ok::<_, PrompterError>(()) })
                .await;
        }
        let calls = tracer.calls();
        assert_eq!(calls.len(), MAX_CALLS);
        assert!(calls.iter().all(|c| c.outcome == CallOutcome::Succeeded));
    }

    #[test]
    fn op_names_are_stable() {
        assert_eq!(Stage::Orchestrate.to_string(), "generate_responses");
        assert_eq!(Stage::Compare.op_name(), "compare_outputs");
    }
}

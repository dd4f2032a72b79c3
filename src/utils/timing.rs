use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::info;

use crate::selection::SelectionState;
use crate::utils::logging::TIMING_TARGET;

#[derive(Debug)]
pub struct SubmissionTimer {
    operation: String,
    features: String,
    output_style: &'static str,
    aspect_ratio: &'static str,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    status: String,
    detail: Option<String>,
    completed: bool,
}

impl SubmissionTimer {
    pub fn from_state(operation: &str, state: &SelectionState) -> Self {
        let features = state
            .active_features
            .iter()
            .map(|feature| feature.value())
            .collect::<Vec<_>>()
            .join(",");

        SubmissionTimer {
            operation: operation.to_string(),
            features,
            output_style: state.output_style.value(),
            aspect_ratio: state.aspect_ratio.value(),
            started_at: Utc::now(),
            started_perf: Instant::now(),
            status: "success".to_string(),
            detail: None,
            completed: false,
        }
    }

    pub fn log_received(&self) {
        info!(
            target: TIMING_TARGET,
            "event=submission_received operation={} features={} output_style={} aspect_ratio={} received_at={}",
            self.operation,
            self.features,
            self.output_style,
            self.aspect_ratio,
            self.started_at.to_rfc3339()
        );
    }

    pub fn mark_status(&mut self, status: &str, detail: Option<String>) {
        self.status = status.to_string();
        self.detail = detail;
    }

    pub fn log_completed(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        let completed_at = Utc::now();
        let duration = self.started_perf.elapsed().as_secs_f64();
        info!(
            target: TIMING_TARGET,
            "event=submission_completed operation={} features={} started_at={} completed_at={} duration_s={:.3} status={} detail={}",
            self.operation,
            self.features,
            self.started_at.to_rfc3339(),
            completed_at.to_rfc3339(),
            duration,
            self.status,
            self.detail.clone().unwrap_or_default()
        );
    }
}

pub fn start_submission_timer(operation: &str, state: &SelectionState) -> SubmissionTimer {
    let timer = SubmissionTimer::from_state(operation, state);
    timer.log_received();
    timer
}

pub fn complete_submission_timer(timer: &mut SubmissionTimer, status: &str, detail: Option<String>) {
    timer.mark_status(status, detail);
    timer.log_completed();
}

pub async fn log_llm_timing<T, E, F, Fut>(
    provider: &str,
    model: &str,
    operation: &str,
    metadata: Option<JsonValue>,
    call: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let started_at = Utc::now();
    let started_perf = Instant::now();
    let metadata_text = metadata
        .as_ref()
        .map(|value| value.to_string())
        .unwrap_or_else(|| "{}".to_string());
    info!(
        target: TIMING_TARGET,
        "event=llm_request provider={} model={} operation={} started_at={} metadata={}",
        provider,
        model,
        operation,
        started_at.to_rfc3339(),
        metadata_text
    );

    let result = call().await;
    let status = if result.is_ok() { "success" } else { "error" };

    let completed_at = Utc::now();
    let duration = started_perf.elapsed().as_secs_f64();
    info!(
        target: TIMING_TARGET,
        "event=llm_response provider={} model={} operation={} completed_at={} duration_s={:.3} status={} metadata={}",
        provider,
        model,
        operation,
        completed_at.to_rfc3339(),
        duration,
        status,
        metadata_text
    );

    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::*;
    use crate::selection::Feature;

    #[derive(Clone, Default)]
    struct TargetRecorder {
        targets: Arc<Mutex<Vec<String>>>,
    }

    impl<S: Subscriber> Layer<S> for TargetRecorder {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.targets.lock().push(event.metadata().target().to_string());
        }
    }

    #[test]
    fn timer_summarizes_active_features() {
        let state = SelectionState::default().toggle_feature(Feature::Pose);
        let timer = SubmissionTimer::from_state("submit", &state);
        assert_eq!(timer.features, "location_domestic,pose");
        assert_eq!(timer.aspect_ratio, "9:16");
    }

    #[test]
    fn completion_is_logged_once() {
        let mut timer = SubmissionTimer::from_state("submit", &SelectionState::default());
        complete_submission_timer(&mut timer, "error", Some("missing_credential".to_string()));
        assert!(timer.completed);
        assert_eq!(timer.status, "error");
        timer.mark_status("success", None);
        timer.log_completed();
        assert_eq!(timer.status, "success");
    }

    #[tokio::test]
    async fn llm_timing_passes_the_result_through() {
        let ok: Result<u32, String> = log_llm_timing("gemini", "model", "op", None, || async {
            Ok(7)
        })
        .await;
        assert_eq!(ok, Ok(7));

        let err: Result<u32, String> =
            log_llm_timing("gemini", "model", "op", None, || async { Err("boom".to_string()) })
                .await;
        assert_eq!(err, Err("boom".to_string()));
    }

    #[tokio::test]
    async fn timing_events_reach_the_timing_log_target() {
        let recorder = TargetRecorder::default();
        let _default =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(recorder.clone()));

        let mut timer = start_submission_timer("submit", &SelectionState::default());
        complete_submission_timer(&mut timer, "success", None);
        let _: Result<(), String> =
            log_llm_timing("gemini", "model", "op", None, || async { Ok(()) }).await;

        let targets = recorder.targets.lock().clone();
        assert_eq!(targets.len(), 4);
        assert!(targets.iter().all(|target| target == TIMING_TARGET));
    }
}

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::assets::ImageAsset;
use crate::config::{ApiKey, Config, Credentials};
use crate::error::StudioError;
use crate::llm::gemini::{fallback_world_suggestions, GeminiClient, GeminiTransport, HttpTransport};
use crate::prompt::{compile, TechnicalHints};
use crate::selection::{
    CompanionSource, Feature, GenerationResult, SelectionPatch, SelectionState, SetField,
    SubmissionPhase,
};
use crate::utils::timing::{complete_submission_timer, start_submission_timer};

/// Receives outcomes the UI shows immediately.
pub trait StudioObserver: Send + Sync {
    fn on_result(&self, _result: &GenerationResult) {}
    fn on_alert(&self, _message: &str) {}
}

pub struct NoopObserver;

impl StudioObserver for NoopObserver {}

pub struct Studio {
    config: Config,
    transport: Arc<dyn GeminiTransport>,
    observer: Arc<dyn StudioObserver>,
    state: Mutex<SelectionState>,
    user_api_key: Mutex<Option<String>>,
}

/// Clears the in-flight flag however the submission ends.
struct InFlightGuard<'a> {
    studio: &'a Studio,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.studio.update(SelectionState::with_in_flight_cleared);
    }
}

impl Studio {
    pub fn new(config: Config, transport: Arc<dyn GeminiTransport>) -> Self {
        Studio {
            config,
            transport,
            observer: Arc::new(NoopObserver),
            state: Mutex::new(SelectionState::default()),
            user_api_key: Mutex::new(None),
        }
    }

    pub fn with_http_transport(config: Config) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Studio::new(config, Arc::new(transport)))
    }

    pub fn with_observer(mut self, observer: Arc<dyn StudioObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn snapshot(&self) -> SelectionState {
        self.state.lock().clone()
    }

    /// Swaps in the next state. The superseded state is dropped after the
    /// lock is released so preview revocation never runs under it.
    fn update<F>(&self, next: F) -> SelectionState
    where
        F: FnOnce(&SelectionState) -> SelectionState,
    {
        let mut guard = self.state.lock();
        let updated = next(&guard);
        let previous = std::mem::replace(&mut *guard, updated.clone());
        drop(guard);
        drop(previous);
        updated
    }

    pub fn apply_partial_update(&self, patch: SelectionPatch) -> SelectionState {
        self.update(|state| state.apply_partial_update(patch))
    }

    pub fn toggle_feature(&self, feature: Feature) -> SelectionState {
        self.update(|state| state.toggle_feature(feature))
    }

    pub fn toggle_set_member(&self, field: SetField, item: &str) -> SelectionState {
        self.update(|state| state.toggle_set_member(field, item))
    }

    pub fn set_primary_image(&self, image: ImageAsset) -> SelectionState {
        self.update(|state| state.with_primary_image(image))
    }

    pub fn set_province(&self, province: &str) -> SelectionState {
        self.update(|state| state.with_province(province))
    }

    pub fn set_landmark(&self, landmark: &str) -> SelectionState {
        self.update(|state| state.with_landmark(landmark))
    }

    pub fn set_custom_landmark(&self, text: &str) -> SelectionState {
        self.update(|state| state.with_custom_landmark(text))
    }

    pub fn set_location_style(&self, style: &str) -> SelectionState {
        self.update(|state| state.with_location_style(style))
    }

    pub fn set_expression(&self, expression: &str) -> SelectionState {
        self.update(|state| state.with_expression(expression))
    }

    pub fn apply_pose_suggestion(&self, index: usize) -> SelectionState {
        self.update(|state| state.with_pose_suggestion(index))
    }

    pub fn choose_world_suggestion(&self, index: usize) -> SelectionState {
        self.update(|state| state.with_world_suggestion_chosen(index))
    }

    pub fn set_companion_source(&self, source: CompanionSource) -> SelectionState {
        self.update(|state| state.with_companion_source(source))
    }

    pub fn set_companion_image(&self, image: ImageAsset) -> SelectionState {
        self.update(|state| state.with_companion_image(image))
    }

    /// Session-only key; blank clears it.
    pub fn set_user_api_key(&self, key: Option<&str>) {
        let key = key.map(str::trim).filter(|key| !key.is_empty());
        *self.user_api_key.lock() = key.map(str::to_string);
    }

    fn resolve_credentials(&self) -> Result<ApiKey, StudioError> {
        let user_key = self.user_api_key.lock().clone();
        Credentials::resolve(user_key.as_deref(), &self.config)
    }

    /// Runs one submission against a snapshot of the current selection.
    ///
    /// Updates made while the request is in flight are kept but do not
    /// change the request. Every error is recorded in the state and raised
    /// through the observer before being returned.
    pub async fn submit(&self) -> Result<GenerationResult, StudioError> {
        let snapshot = self.snapshot();
        let mut timer = start_submission_timer("submit", &snapshot);

        if snapshot.primary_image.is_none() {
            let err = StudioError::MissingPrimaryImage;
            complete_submission_timer(&mut timer, "rejected", Some(err.kind().to_string()));
            self.observer.on_alert(&err.to_string());
            return Err(err);
        }

        self.update(SelectionState::with_submission_started);
        let in_flight = InFlightGuard { studio: self };
        let outcome = self.run_submission(&snapshot).await;

        // Observers may read the state; the flag must already be clear.
        match outcome {
            Ok(result) => {
                info!(
                    mime_type = %result.image.mime_type,
                    bytes = result.image.bytes.len(),
                    "Travel portrait generated"
                );
                self.update(|state| state.with_submission_succeeded(result.clone()));
                drop(in_flight);
                complete_submission_timer(&mut timer, "success", None);
                self.observer.on_result(&result);
                Ok(result)
            }
            Err(err) => {
                warn!(kind = err.kind(), "Submission failed: {}", err);
                let message = err.to_string();
                self.update(|state| state.with_submission_failed(message.clone()));
                drop(in_flight);
                complete_submission_timer(&mut timer, "error", Some(err.kind().to_string()));
                self.observer.on_alert(&message);
                Err(err)
            }
        }
    }

    async fn run_submission(
        &self,
        snapshot: &SelectionState,
    ) -> Result<GenerationResult, StudioError> {
        let compiled = compile(snapshot)?;
        let hints = TechnicalHints::from_state(snapshot);

        self.update(|state| state.with_phase(SubmissionPhase::Submitting));
        let api_key = self.resolve_credentials()?;

        let client = GeminiClient::new(&self.config, api_key, self.transport.clone());
        client
            .submit(&compiled.instruction_text, &compiled.image_parts, hints)
            .await
    }

    /// Fetches destination ideas and caches them in the selection state.
    /// Never fails; a fixed list stands in when the provider cannot help.
    pub async fn fetch_world_suggestions(&self) -> Vec<String> {
        let suggestions = match self.resolve_credentials() {
            Ok(api_key) => {
                GeminiClient::new(&self.config, api_key, self.transport.clone())
                    .fetch_world_suggestions()
                    .await
            }
            Err(err) => {
                let err = StudioError::SuggestionFetchFailure(err.to_string());
                warn!(kind = err.kind(), "{}", err);
                fallback_world_suggestions()
            }
        };

        self.update(|state| state.with_world_suggestions(suggestions.clone()));
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Weak;

    use serde_json::Value;
    use tokio::sync::Notify;

    use super::*;
    use crate::assets::testing::{jpeg_asset, png_asset, previewed_asset, RecordingRevoker};
    use crate::llm::gemini::testing::{
        image_response, invalid_key_error, text_response, RecordingTransport,
    };
    use crate::llm::gemini::DEFAULT_CAPTION;

    #[derive(Default)]
    struct RecordingObserver {
        alerts: Mutex<Vec<String>>,
        captions: Mutex<Vec<String>>,
    }

    impl StudioObserver for RecordingObserver {
        fn on_result(&self, result: &GenerationResult) {
            self.captions.lock().push(result.caption.clone());
        }

        fn on_alert(&self, message: &str) {
            self.alerts.lock().push(message.to_string());
        }
    }

    fn ambient_config() -> Config {
        Config {
            gemini_api_key: "ambient-key".to_string(),
            ..Config::default()
        }
    }

    fn studio_with(
        config: Config,
        transport: &Arc<RecordingTransport>,
    ) -> (Studio, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        let studio = Studio::new(config, transport.clone()).with_observer(observer.clone());
        (studio, observer)
    }

    fn png_response() -> Value {
        image_response("image/png", "3q2+7w==", Some("Chúc bạn một chuyến đi vui vẻ"))
    }

    #[tokio::test]
    async fn submit_without_primary_image_stays_idle() {
        let transport = Arc::new(RecordingTransport::default());
        let (studio, observer) = studio_with(ambient_config(), &transport);

        let err = studio.submit().await.unwrap_err();

        assert_eq!(err, StudioError::MissingPrimaryImage);
        assert_eq!(transport.calls(), 0);
        let state = studio.snapshot();
        assert_eq!(state.request_status.phase, SubmissionPhase::Idle);
        assert!(!state.request_status.in_flight);
        assert_eq!(observer.alerts.lock().len(), 1);
    }

    #[tokio::test]
    async fn missing_credential_fails_before_any_network_call() {
        let transport = Arc::new(RecordingTransport::with_responses([Ok(png_response())]));
        let (studio, observer) = studio_with(Config::default(), &transport);
        studio.set_primary_image(png_asset());

        let err = studio.submit().await.unwrap_err();

        assert_eq!(err, StudioError::MissingCredential);
        assert_eq!(transport.calls(), 0);
        let status = studio.snapshot().request_status;
        assert_eq!(status.phase, SubmissionPhase::Failed);
        assert_eq!(status.last_error, Some(err.to_string()));
        assert!(!status.in_flight);
        assert_eq!(*observer.alerts.lock(), vec![err.to_string()]);
    }

    #[tokio::test]
    async fn successful_submission_stores_result_and_notifies() {
        let transport = Arc::new(RecordingTransport::with_responses([Ok(png_response())]));
        let (studio, observer) = studio_with(ambient_config(), &transport);
        studio.set_primary_image(png_asset());

        let result = studio.submit().await.unwrap();

        assert_eq!(result.image.data_url(), "data:image/png;base64,3q2+7w==");
        let status = studio.snapshot().request_status;
        assert_eq!(status.phase, SubmissionPhase::Succeeded);
        assert_eq!(status.last_result, Some(result));
        assert!(status.last_error.is_none());
        assert!(!status.in_flight);
        assert_eq!(
            *observer.captions.lock(),
            vec!["Chúc bạn một chuyến đi vui vẻ".to_string()]
        );
        assert_eq!(transport.requests()[0].1, "ambient-key");
    }

    #[tokio::test]
    async fn user_key_takes_precedence_over_ambient_key() {
        let transport = Arc::new(RecordingTransport::with_responses([Ok(png_response())]));
        let (studio, _) = studio_with(ambient_config(), &transport);
        studio.set_primary_image(png_asset());
        studio.set_user_api_key(Some(" user-key "));

        studio.submit().await.unwrap();
        assert_eq!(transport.requests()[0].1, "user-key");

        studio.set_user_api_key(Some("   "));
        assert_eq!(studio.resolve_credentials().unwrap().expose(), "ambient-key");
    }

    #[tokio::test]
    async fn failure_keeps_previous_result_visible() {
        let transport = Arc::new(RecordingTransport::with_responses([
            Ok(png_response()),
            Ok(text_response("Blocked by safety filters")),
        ]));
        let (studio, observer) = studio_with(ambient_config(), &transport);
        studio.set_primary_image(png_asset());

        let first = studio.submit().await.unwrap();
        let err = studio.submit().await.unwrap_err();

        assert_eq!(err, StudioError::NoImageInResponse);
        let status = studio.snapshot().request_status;
        assert_eq!(status.phase, SubmissionPhase::Failed);
        assert_eq!(status.last_result, Some(first));
        assert_eq!(status.last_error, Some(err.to_string()));
        assert!(!status.in_flight);
        assert_eq!(observer.alerts.lock().len(), 1);
    }

    #[tokio::test]
    async fn invalid_key_is_surfaced_with_remediation_message() {
        let transport = Arc::new(RecordingTransport::with_responses([Err(invalid_key_error())]));
        let (studio, observer) = studio_with(ambient_config(), &transport);
        studio.set_primary_image(png_asset());

        let err = studio.submit().await.unwrap_err();

        assert_eq!(err, StudioError::InvalidCredential);
        assert_eq!(
            *observer.alerts.lock(),
            vec![StudioError::InvalidCredential.to_string()]
        );
    }

    #[tokio::test]
    async fn default_caption_when_provider_sends_no_text() {
        let transport = Arc::new(RecordingTransport::with_responses([Ok(image_response(
            "image/jpeg",
            "/9j/",
            None,
        ))]));
        let (studio, _) = studio_with(ambient_config(), &transport);
        studio.set_primary_image(png_asset());

        let result = studio.submit().await.unwrap();
        assert_eq!(result.caption, DEFAULT_CAPTION);
        assert_eq!(result.image.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn updates_during_flight_are_kept_but_do_not_change_the_request() {
        let gate = Arc::new(Notify::new());
        let transport = Arc::new(
            RecordingTransport::with_responses([Ok(png_response())]).gated(gate.clone()),
        );
        let (studio, _) = studio_with(ambient_config(), &transport);
        let studio = Arc::new(studio);
        studio.set_primary_image(png_asset());

        let task = tokio::spawn({
            let studio = studio.clone();
            async move { studio.submit().await }
        });
        while transport.calls() == 0 {
            tokio::task::yield_now().await;
        }

        let in_flight = studio.snapshot().request_status;
        assert!(in_flight.in_flight);
        assert_eq!(in_flight.phase, SubmissionPhase::Submitting);

        studio.toggle_feature(Feature::Pose);
        gate.notify_one();
        task.await.unwrap().unwrap();

        let (_, _, payload) = &transport.requests()[0];
        let instruction = payload
            .pointer("/contents/0/parts/0/text")
            .and_then(|value| value.as_str())
            .unwrap();
        assert!(!instruction.contains("Pose:"));

        let state = studio.snapshot();
        assert!(state.is_active(Feature::Pose));
        assert!(!state.request_status.in_flight);
        assert_eq!(state.request_status.phase, SubmissionPhase::Succeeded);
    }

    #[tokio::test]
    async fn uploaded_companion_is_sent_second() {
        let transport = Arc::new(RecordingTransport::with_responses([Ok(png_response())]));
        let (studio, _) = studio_with(ambient_config(), &transport);
        studio.set_primary_image(png_asset());
        studio.toggle_feature(Feature::Companion);
        studio.set_companion_source(CompanionSource::Uploaded);
        studio.set_companion_image(jpeg_asset());

        studio.submit().await.unwrap();

        let (_, _, payload) = &transport.requests()[0];
        let parts = payload.pointer("/contents/0/parts").unwrap().as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[2]["inlineData"]["mimeType"], "image/jpeg");
    }

    #[tokio::test]
    async fn new_primary_image_clears_result_and_revokes_old_preview() {
        let transport = Arc::new(RecordingTransport::with_responses([Ok(png_response())]));
        let (studio, _) = studio_with(ambient_config(), &transport);
        let revoker = Arc::new(RecordingRevoker::default());
        studio.set_primary_image(previewed_asset("blob:first", &revoker));
        studio.submit().await.unwrap();

        let state = studio.set_primary_image(previewed_asset("blob:second", &revoker));

        assert!(state.request_status.last_result.is_none());
        assert_eq!(revoker.revoked(), vec!["blob:first".to_string()]);
    }

    #[tokio::test]
    async fn replacing_companion_image_revokes_old_preview() {
        let transport = Arc::new(RecordingTransport::default());
        let (studio, _) = studio_with(ambient_config(), &transport);
        let revoker = Arc::new(RecordingRevoker::default());
        studio.set_companion_image(previewed_asset("blob:companion-1", &revoker));
        studio.set_companion_image(previewed_asset("blob:companion-2", &revoker));

        assert_eq!(revoker.revoked(), vec!["blob:companion-1".to_string()]);
    }

    #[tokio::test]
    async fn world_suggestions_are_cached_and_selectable() {
        let transport = Arc::new(RecordingTransport::with_responses([Ok(text_response(
            r#"["Santorini, Hy Lạp", "Petra, Jordan"]"#,
        ))]));
        let (studio, _) = studio_with(ambient_config(), &transport);

        let suggestions = studio.fetch_world_suggestions().await;
        assert_eq!(suggestions.len(), 2);
        assert_eq!(
            studio.snapshot().location_world.suggestions,
            suggestions
        );

        let state = studio.choose_world_suggestion(1);
        assert_eq!(state.location_world.place, "Petra, Jordan");
    }

    #[tokio::test]
    async fn world_suggestions_fall_back_on_transport_error_or_missing_key() {
        let transport = Arc::new(RecordingTransport::with_responses([Err(
            crate::error::TransportError::new(Some(503), "unavailable"),
        )]));
        let (studio, _) = studio_with(ambient_config(), &transport);
        assert_eq!(
            studio.fetch_world_suggestions().await,
            fallback_world_suggestions()
        );

        let transport = Arc::new(RecordingTransport::default());
        let (studio, observer) = studio_with(Config::default(), &transport);
        assert_eq!(
            studio.fetch_world_suggestions().await,
            fallback_world_suggestions()
        );
        assert_eq!(transport.calls(), 0);
        assert!(observer.alerts.lock().is_empty());
    }

    /// Reads the session from inside each callback, as a UI re-enabling
    /// its submit button would.
    #[derive(Default)]
    struct SnapshottingObserver {
        studio: Mutex<Weak<Studio>>,
        seen: Mutex<Vec<(&'static str, bool)>>,
    }

    impl SnapshottingObserver {
        fn record(&self, callback: &'static str) {
            if let Some(studio) = self.studio.lock().upgrade() {
                let in_flight = studio.snapshot().request_status.in_flight;
                self.seen.lock().push((callback, in_flight));
            }
        }
    }

    impl StudioObserver for SnapshottingObserver {
        fn on_result(&self, _result: &GenerationResult) {
            self.record("result");
        }

        fn on_alert(&self, _message: &str) {
            self.record("alert");
        }
    }

    #[tokio::test]
    async fn in_flight_is_cleared_before_observers_run() {
        let transport = Arc::new(RecordingTransport::with_responses([
            Ok(png_response()),
            Ok(text_response("Blocked by safety filters")),
        ]));
        let observer = Arc::new(SnapshottingObserver::default());
        let studio = Arc::new(
            Studio::new(ambient_config(), transport.clone()).with_observer(observer.clone()),
        );
        *observer.studio.lock() = Arc::downgrade(&studio);
        studio.set_primary_image(png_asset());

        studio.submit().await.unwrap();
        studio.submit().await.unwrap_err();

        assert_eq!(
            *observer.seen.lock(),
            vec![("result", false), ("alert", false)]
        );
    }

    #[test]
    fn pose_suggestion_fills_pose_text() {
        let transport = Arc::new(RecordingTransport::default());
        let (studio, _) = studio_with(ambient_config(), &transport);
        let state = studio.apply_pose_suggestion(5);
        assert_eq!(state.pose, "Cầm ly cà phê");
    }
}

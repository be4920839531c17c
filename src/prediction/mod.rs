//! Prediction flow
//!
//! Owns the applicant form and the single result slot. One request per
//! explicit submission; at most one in flight. A new submission clears the
//! previous result as soon as it is dispatched, and failures land in the
//! flow's own notice slot instead of escaping to the caller.

use crate::error::{ClientError, ErrorKind};
use crate::models::{FormField, FormRecord, PredictionRequest, PredictionResult};
use crate::state::{FlowLifecycle, RequestState};
use crate::transport::Transport;
use crate::Result;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};

pub mod render;

/// User-facing text for any transport failure
pub const FAILURE_NOTICE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A result (decision or service-reported error) was stored
    Completed,
    /// Transport failed; see `PredictionView::failure`
    Failed(ErrorKind),
    /// Blank fields, nothing sent
    Incomplete(Vec<FormField>),
    /// A submission is already in flight; nothing sent
    Busy,
    /// Flow was disposed; the response was dropped
    Detached,
}

/// Diagnostic record of the last failed submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub detail: String,
}

impl Failure {
    pub fn notice(&self) -> &'static str {
        FAILURE_NOTICE
    }
}

impl From<&ClientError> for Failure {
    fn from(err: &ClientError) -> Self {
        Self {
            kind: err.kind(),
            status: err.status(),
            detail: err.to_string(),
        }
    }
}

/// Render-ready copy of the prediction page
#[derive(Debug, Clone)]
pub struct PredictionView {
    pub form: FormRecord,
    pub result: Option<PredictionResult>,
    pub failure: Option<Failure>,
    pub request_state: RequestState,
}

#[derive(Default)]
struct PredictionState {
    form: FormRecord,
    result: Option<PredictionResult>,
    failure: Option<Failure>,
}

struct PredictionInner {
    transport: Arc<dyn Transport>,
    endpoint: String,
    lifecycle: FlowLifecycle,
    state: RwLock<PredictionState>,
}

#[derive(Clone)]
pub struct PredictionFlow {
    inner: Arc<PredictionInner>,
}

impl PredictionFlow {
    pub fn new(transport: Arc<dyn Transport>, endpoint: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(PredictionInner {
                transport,
                endpoint: endpoint.into(),
                lifecycle: FlowLifecycle::new(),
                state: RwLock::new(PredictionState::default()),
            }),
        }
    }

    pub async fn snapshot(&self) -> PredictionView {
        let state = self.inner.state.read().await;
        PredictionView {
            form: state.form.clone(),
            result: state.result.clone(),
            failure: state.failure.clone(),
            request_state: self.request_state(),
        }
    }

    pub fn request_state(&self) -> RequestState {
        self.inner.lifecycle.request_state()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.lifecycle.subscribe()
    }

    /// Store the raw text verbatim; validation waits for `submit`
    pub async fn update_field(&self, field: FormField, raw: impl Into<String>) {
        self.inner.state.write().await.form.set(field, raw.into());
        self.inner.lifecycle.notify();
    }

    pub async fn update_field_named(&self, name: &str, raw: impl Into<String>) -> Result<()> {
        let field: FormField = name.parse()?;
        self.update_field(field, raw).await;
        Ok(())
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let lifecycle = &self.inner.lifecycle;
        if lifecycle.is_detached() {
            return SubmitOutcome::Detached;
        }

        let Some(_pending) = lifecycle.try_begin() else {
            warn!("Prediction submit ignored: request already in flight");
            return SubmitOutcome::Busy;
        };

        let request = {
            let mut state = self.inner.state.write().await;
            let missing = state.form.missing_fields();
            if !missing.is_empty() {
                info!(missing = ?missing, "Prediction submit blocked: form incomplete");
                return SubmitOutcome::Incomplete(missing);
            }
            state.result = None;
            state.failure = None;
            state.form.to_request()
        };
        lifecycle.notify();

        info!(endpoint = %self.inner.endpoint, "Submitting prediction request");
        debug!(
            credit_score = request.avg_credit_score,
            annual_income = request.avg_annual_income,
            requested_amount = request.avg_requested_amount,
            "Prediction request body"
        );
        let result = self.exchange(request).await;

        let outcome = {
            let mut state = self.inner.state.write().await;
            // dispose() may land while waiting for the lock
            if lifecycle.is_detached() {
                debug!("Prediction view disposed mid-request; dropping response");
                return SubmitOutcome::Detached;
            }
            match result {
                Ok(prediction) => {
                    match &prediction {
                        PredictionResult::Rejected { error } => {
                            warn!("Prediction service rejected the request: {}", error)
                        }
                        PredictionResult::Decision(decision) => info!(
                            approved = decision.loan_approved,
                            confidence = decision.approval_confidence,
                            "Prediction received"
                        ),
                    }
                    state.result = Some(prediction);
                    SubmitOutcome::Completed
                }
                Err(e) => {
                    error!(status = ?e.status(), "Prediction request failed: {}", e);
                    state.failure = Some(Failure::from(&e));
                    SubmitOutcome::Failed(e.kind())
                }
            }
        };
        lifecycle.notify();

        outcome
    }

    async fn exchange(&self, request: PredictionRequest) -> Result<PredictionResult> {
        let body = serde_json::to_value(request)?;
        let reply = self.inner.transport.send(&self.inner.endpoint, body).await?;
        PredictionResult::from_value(reply)
    }

    /// Unmount: late responses are dropped instead of applied
    pub fn dispose(&self) {
        self.inner.lifecycle.detach();
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Correlation Context (C7): per-request `correlation_id`/`request_id`,
//! threaded through task-local storage so every `tracing` event emitted
//! while a request's span is entered carries both automatically.
//!
//! Grounded in the original service's `contextvars.ContextVar` usage
//! (`structured_logger.py`); `tokio::task_local!` is the idiomatic
//! replacement — no manual context plumbing through every call site.

use std::time::Duration;

use tracing::{warn, Instrument, Span};
use uuid::Uuid;

/// Response process time above which a warning is logged, per the
/// component design (§4.7).
pub const PROCESS_TIME_WARN_MS: u64 = 3000;

/// The pair of ids threaded through one request's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationIds {
    pub correlation_id: String,
    pub request_id: String,
}

tokio::task_local! {
    static CURRENT: CorrelationIds;
}

/// Generates and threads [`CorrelationIds`] through a request's handling
/// task. The transport wrapper (external collaborator, out of scope) is
/// expected to call [`CorrelationContext::run`] once per incoming request,
/// echoing `X-Correlation-ID`/`X-Request-ID`/`X-Process-Time` on the way out.
pub struct CorrelationContext;

impl CorrelationContext {
    /// Build ids for a new request: accept an incoming `X-Correlation-ID`
    /// if present and non-empty, otherwise mint a fresh one. `request_id`
    /// is always freshly generated.
    pub fn new_ids(incoming_correlation_id: Option<&str>) -> CorrelationIds {
        let correlation_id = incoming_correlation_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        CorrelationIds {
            correlation_id,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    /// Read the ids for the request currently executing, if any. Returns
    /// `None` outside of a [`CorrelationContext::run`] scope (e.g. a
    /// background task not associated with one request).
    pub fn current() -> Option<CorrelationIds> {
        CURRENT.try_with(|ids| ids.clone()).ok()
    }

    /// Run `fut` with `ids` bound as the current request's correlation
    /// context and entered into a `tracing::Span` carrying both fields,
    /// warning if the future takes longer than [`PROCESS_TIME_WARN_MS`].
    pub async fn run<F, T>(ids: CorrelationIds, fut: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        let span = tracing::info_span!(
            "request",
            correlation_id = %ids.correlation_id,
            request_id = %ids.request_id,
        );
        let started = std::time::Instant::now();
        let correlation_id = ids.correlation_id.clone();
        let request_id = ids.request_id.clone();

        let result = CURRENT.scope(ids, fut.instrument(span)).await;

        let elapsed = started.elapsed();
        if elapsed >= Duration::from_millis(PROCESS_TIME_WARN_MS) {
            warn!(
                correlation_id,
                request_id,
                elapsed_ms = elapsed.as_millis() as u64,
                "request exceeded process-time warning threshold"
            );
        }
        result
    }

    /// Milliseconds elapsed so far for display in the span, re-derived by
    /// the transport wrapper from its own timer — `run` does not expose a
    /// running clock since callers record their own start instant for the
    /// `X-Process-Time` header.
    pub fn span_for_current() -> Span {
        match Self::current() {
            Some(ids) => tracing::info_span!(
                "request",
                correlation_id = %ids.correlation_id,
                request_id = %ids.request_id,
            ),
            None => tracing::Span::none(),
        }
    }
}

//! Diagnostics sink - best-effort reporting of opaque gateway errors.
//!
//! When the gateway returns an error whose client-side representation is
//! uninformative (a bare connection failure, an empty message), a small
//! structured context is POSTed to the configured endpoint so the backend
//! team can correlate it with server logs. Delivery is fire-and-forget:
//! the caller never waits, and a failed delivery is swallowed.

use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use serde::Serialize;
use tracing::debug;

/// Structured error context shipped to the diagnostics endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsReport {
    /// Operation that failed ("start_shift", "complete_sale", ...)
    pub operation: &'static str,
    /// Stringified error value
    pub message: String,
    /// When the failure was observed
    pub occurred_at: DateTime<Utc>,
}

/// Fire-and-forget sink for diagnostics reports.
#[derive(Debug, Clone)]
pub struct DiagnosticsSink {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl DiagnosticsSink {
    /// Creates a sink. With no endpoint configured every report is a no-op.
    #[must_use]
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Heuristic for gateway errors worth reporting: connection-level
    /// failures and errors that stringify to nothing useful.
    #[must_use]
    pub fn looks_uninformative(err: &DbErr) -> bool {
        matches!(err, DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
            || err.to_string().trim().is_empty()
    }

    /// Ships a report without waiting for the outcome. Failures are logged
    /// at debug level and otherwise swallowed.
    pub fn report(&self, report: DiagnosticsReport) {
        let Some(endpoint) = self.endpoint.clone() else {
            return;
        };
        let client = self.client.clone();

        tokio::spawn(async move {
            match client.post(&endpoint).json(&report).send().await {
                Ok(response) => {
                    debug!(
                        "Diagnostics report for {} delivered ({})",
                        report.operation,
                        response.status()
                    );
                }
                Err(e) => debug!("Diagnostics report dropped: {e}"),
            }
        });
    }

    /// Reports a gateway error if it looks uninformative; informative errors
    /// are left to normal logging.
    pub fn report_gateway_error(&self, operation: &'static str, err: &DbErr) {
        if Self::looks_uninformative(err) {
            self.report(DiagnosticsReport {
                operation,
                message: err.to_string(),
                occurred_at: Utc::now(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_look_uninformative() {
        let err = DbErr::Conn(sea_orm::RuntimeErr::Internal("refused".to_string()));
        assert!(DiagnosticsSink::looks_uninformative(&err));
    }

    #[test]
    fn test_domain_errors_look_informative() {
        let err = DbErr::RecordNotFound("shift 3".to_string());
        assert!(!DiagnosticsSink::looks_uninformative(&err));
    }

    #[tokio::test]
    async fn test_report_without_endpoint_is_noop() {
        let sink = DiagnosticsSink::new(None);
        // Must not panic or block
        sink.report(DiagnosticsReport {
            operation: "test",
            message: "msg".to_string(),
            occurred_at: Utc::now(),
        });
    }
}

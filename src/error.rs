//! # error
//!
//! Typed failure kinds for a digest run.
//!
//! Only [`DigestError::ConfigurationMissing`] can stop the job, and only at
//! startup.  Everything else is caught at a component boundary and turned into
//! a degraded output: a `None` price, a diagnostic message, or a failed
//! [`DeliveryStatus`](crate::notifier::DeliveryStatus).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    /// The market-data provider answered but had nothing usable for `ticker`.
    #[error("No data available for {ticker}: {reason}")]
    DataUnavailable { ticker: String, reason: String },

    /// The generative AI call failed (transport, HTTP status or body).
    #[error("{service} call failed")]
    ExternalService {
        service: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The webhook POST failed at the transport level or was rejected.
    #[error("Webhook delivery failed")]
    Transport {
        #[source]
        source: anyhow::Error,
    },

    /// A credential, endpoint or required setting is absent.
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),
}

impl DigestError {
    /// Short, stable name of the error kind (used in diagnostics).
    pub fn kind(&self) -> &'static str {
        match self {
            DigestError::DataUnavailable { .. }   => "DataUnavailable",
            DigestError::ExternalService { .. }   => "ExternalServiceError",
            DigestError::Transport { .. }         => "TransportError",
            DigestError::ConfigurationMissing(_)  => "ConfigurationMissing",
        }
    }

    /// Renders the error and its whole `source()` chain, one cause per line.
    ///
    /// This is the "trace" attached to diagnostics sent to the chat channel.
    pub fn report(&self) -> String {
        let mut out = format!("{}: {self}", self.kind());
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            out.push_str(&format!("\n  caused by: {err}"));
            cause = err.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_includes_kind_and_causes() {
        let err = DigestError::ExternalService {
            service: "Gemini",
            source:  anyhow::anyhow!("boom").context("request failed"),
        };
        let report = err.report();
        assert!(report.starts_with("ExternalServiceError: Gemini call failed"));
        assert!(report.contains("request failed"));
        assert!(report.contains("boom"));
    }

    #[test]
    fn configuration_missing_has_no_causes() {
        let err = DigestError::ConfigurationMissing("GOOGLE_API_KEY".into());
        assert_eq!(
            err.report(),
            "ConfigurationMissing: Configuration missing: GOOGLE_API_KEY"
        );
    }
}

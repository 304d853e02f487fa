use crate::models::{Basis, DateRange, PnlRequest, WebhookBody};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to P&L webhook failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("P&L webhook returned invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("P&L webhook returned an unexpected data format")]
    UnexpectedShape,
}

#[derive(Debug, Clone, Default)]
pub struct BasisFetch {
    pub sections: Vec<Value>,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub accrual: BasisFetch,
    pub cash: BasisFetch,
}

impl FetchOutcome {
    pub fn basis(&self, basis: Basis) -> &BasisFetch {
        match basis {
            Basis::Accrual => &self.accrual,
            Basis::Cash => &self.cash,
        }
    }

    fn basis_mut(&mut self, basis: Basis) -> &mut BasisFetch {
        match basis {
            Basis::Accrual => &mut self.accrual,
            Basis::Cash => &mut self.cash,
        }
    }
}

#[derive(Clone)]
pub struct PnlClient {
    client: Client,
    webhook_url: String,
}

impl PnlClient {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }

    /// Posts one basis request. A non-200 answer counts as an empty report;
    /// transport and decoding problems are errors.
    pub async fn fetch_basis(&self, range: &DateRange, basis: Basis) -> Result<Vec<Value>, FetchError> {
        let payload = PnlRequest::new(range, basis);
        let response = self.client.post(&self.webhook_url).json(&payload).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(basis = basis.label(), %status, "P&L webhook answered without data");
            return Ok(Vec::new());
        }

        let bytes = response.bytes().await?;
        let value: Value = serde_json::from_slice(&bytes)?;
        WebhookBody::from_value(value)
            .and_then(|body| body.into_sections(basis))
            .ok_or(FetchError::UnexpectedShape)
    }

    /// Fetches accrual then cash. Each basis degrades to an empty list with a
    /// warning on failure; the other basis is unaffected.
    pub async fn fetch_both(&self, range: &DateRange) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();
        for basis in Basis::ALL {
            let slot = outcome.basis_mut(basis);
            match self.fetch_basis(range, basis).await {
                Ok(sections) => {
                    info!(basis = basis.label(), sections = sections.len(), "fetched P&L data");
                    slot.sections = sections;
                }
                Err(err) => {
                    error!(basis = basis.label(), "failed to fetch P&L data: {err}");
                    slot.warning = Some(format!("Error fetching {} data: {err}", basis.label()));
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as HttpStatus, routing::post, Json, Router};
    use chrono::NaiveDate;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn range() -> DateRange {
        DateRange {
            from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        }
    }

    async fn spawn_webhook(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/hook")
    }

    fn closed_port_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}/hook")
    }

    fn client(url: String) -> PnlClient {
        PnlClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn sends_one_payload_per_basis() {
        let seen: Arc<Mutex<Vec<Value>>> = Arc::default();
        let recorder = Arc::clone(&seen);
        let router = Router::new().route(
            "/hook",
            post(move |Json(payload): Json<Value>| {
                let recorder = Arc::clone(&recorder);
                async move {
                    recorder.lock().unwrap().push(payload);
                    Json(json!([{ "name": "Net Profit", "total": 1 }]))
                }
            }),
        );
        let pnl = client(spawn_webhook(router).await);

        let outcome = pnl.fetch_both(&range()).await;
        assert_eq!(outcome.accrual.sections.len(), 1);
        assert_eq!(outcome.cash.sections.len(), 1);
        assert!(outcome.accrual.warning.is_none());

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                json!({ "from_date": "2024-01-01", "to_date": "2024-06-30", "cash_basis": "false" }),
                json!({ "from_date": "2024-01-01", "to_date": "2024-06-30", "cash_basis": "true" }),
            ]
        );
    }

    #[tokio::test]
    async fn picks_basis_from_keyed_body() {
        let router = Router::new().route(
            "/hook",
            post(|| async {
                Json(json!({
                    "Accrual": [{ "name": "Net Profit", "total": 10 }],
                    "Cash": [{ "name": "Net Profit", "total": 20 }, { "name": "Gross Profit" }]
                }))
            }),
        );
        let pnl = client(spawn_webhook(router).await);

        let outcome = pnl.fetch_both(&range()).await;
        assert_eq!(outcome.basis(Basis::Accrual).sections.len(), 1);
        assert_eq!(outcome.basis(Basis::Cash).sections.len(), 2);
    }

    #[tokio::test]
    async fn malformed_sibling_key_only_fails_its_basis() {
        let router = Router::new().route(
            "/hook",
            post(|| async { Json(json!({ "Accrual": "x", "Cash": [{ "name": "Net Profit", "total": 20 }] })) }),
        );
        let pnl = client(spawn_webhook(router).await);

        let outcome = pnl.fetch_both(&range()).await;
        assert_eq!(outcome.cash.sections.len(), 1);
        assert!(outcome.cash.warning.is_none());
        assert!(outcome.accrual.sections.is_empty());
        assert!(outcome.accrual.warning.as_deref().unwrap().contains("unexpected data format"));
    }

    #[tokio::test]
    async fn non_ok_status_is_empty_without_warning() {
        let router = Router::new().route("/hook", post(|| async { (HttpStatus::BAD_GATEWAY, "upstream down") }));
        let pnl = client(spawn_webhook(router).await);

        let outcome = pnl.fetch_both(&range()).await;
        assert!(outcome.accrual.sections.is_empty());
        assert!(outcome.cash.sections.is_empty());
        assert!(outcome.accrual.warning.is_none());
        assert!(outcome.cash.warning.is_none());
    }

    #[tokio::test]
    async fn unexpected_shape_warns_per_basis() {
        let router = Router::new().route(
            "/hook",
            post(|Json(payload): Json<Value>| async move {
                if payload["cash_basis"] == "true" {
                    Json(json!("Accepted"))
                } else {
                    Json(json!([{ "name": "Gross Profit", "total": 3 }]))
                }
            }),
        );
        let pnl = client(spawn_webhook(router).await);

        let outcome = pnl.fetch_both(&range()).await;
        assert_eq!(outcome.accrual.sections.len(), 1);
        assert!(outcome.accrual.warning.is_none());
        assert!(outcome.cash.sections.is_empty());
        assert!(outcome.cash.warning.as_deref().unwrap().contains("unexpected data format"));
    }

    #[tokio::test]
    async fn transport_failure_yields_empty_bases() {
        let pnl = client(closed_port_url());

        let outcome = pnl.fetch_both(&range()).await;
        for basis in Basis::ALL {
            let fetched = outcome.basis(basis);
            assert!(fetched.sections.is_empty());
            assert!(fetched.warning.as_deref().unwrap().starts_with("Error fetching"));
            let report = crate::extract::extract_basis(basis, &fetched.sections);
            assert_eq!(report.metrics, crate::models::Metrics::default());
            assert!(report.expenses.is_empty());
        }
    }

    #[tokio::test]
    async fn slow_webhook_times_out_per_basis() {
        let router = Router::new().route(
            "/hook",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!([{ "name": "Net Profit", "total": 1 }]))
            }),
        );
        let pnl = PnlClient::new(spawn_webhook(router).await, Duration::from_millis(200)).unwrap();

        let outcome = pnl.fetch_both(&range()).await;
        for basis in Basis::ALL {
            let fetched = outcome.basis(basis);
            assert!(fetched.sections.is_empty());
            assert!(fetched.warning.as_deref().unwrap().starts_with("Error fetching"));
        }
    }
}

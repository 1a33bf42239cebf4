use serde::de::DeserializeOwned;

use super::{with_query, Page};
use crate::error::Result;
use crate::gate::RequestGate;

pub struct DashboardApi<'a> {
    gate: &'a RequestGate,
}

impl<'a> DashboardApi<'a> {
    pub fn new(gate: &'a RequestGate) -> Self {
        Self { gate }
    }

    /// Headline counts and totals for the landing screen.
    pub async fn summary<T: DeserializeOwned>(&self) -> Result<T> {
        self.gate.get("/dashboard/summary/").await?.deserialize()
    }
}

pub struct NewsletterApi<'a> {
    gate: &'a RequestGate,
}

impl<'a> NewsletterApi<'a> {
    pub fn new(gate: &'a RequestGate) -> Self {
        Self { gate }
    }

    pub async fn subscribers<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<Page<T>> {
        let body = self.gate.get(&with_query("/newsletter/", params)).await?;
        Page::from_body(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::test_support::signed_in_gate;
    use mockito::Server;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::Value;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Summary {
        total_invoices: u32,
        pending_quotes: u32,
    }

    #[tokio::test]
    async fn test_summary_deserializes_into_caller_type() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/dashboard/summary/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"total_invoices": 14, "pending_quotes": 3, "revenue": "5400.00"}"#)
            .create_async()
            .await;

        let gate = signed_in_gate(&server);
        let summary: Summary = DashboardApi::new(&gate).summary().await.unwrap();
        assert_eq!(
            summary,
            Summary {
                total_invoices: 14,
                pending_quotes: 3
            }
        );
    }

    #[tokio::test]
    async fn test_summary_shape_mismatch_is_decode_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/dashboard/summary/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"total_invoices": "many"}"#)
            .create_async()
            .await;

        let gate = signed_in_gate(&server);
        let err = DashboardApi::new(&gate).summary::<Summary>().await.unwrap_err();
        assert!(matches!(err, crate::error::ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_newsletter_subscribers() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/newsletter/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"count": 1, "results": [{"email": "a@b.c", "status": "active"}]}"#)
            .create_async()
            .await;

        let gate = signed_in_gate(&server);
        let page: Page<Value> = NewsletterApi::new(&gate).subscribers(&[]).await.unwrap();
        assert_eq!(page.results[0]["email"], "a@b.c");
    }
}

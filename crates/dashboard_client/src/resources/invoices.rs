use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;

use super::{Page, Resource};
use crate::error::Result;
use crate::gate::{RequestGate, RequestOptions};

const BASE: &str = "/invoices/";

pub struct InvoicesApi<'a> {
    gate: &'a RequestGate,
    resource: Resource<'a>,
}

impl<'a> InvoicesApi<'a> {
    pub fn new(gate: &'a RequestGate) -> Self {
        Self {
            gate,
            resource: Resource::new(gate, BASE),
        }
    }

    pub async fn list<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<Page<T>> {
        self.resource.list(params).await
    }

    pub async fn get<T: DeserializeOwned>(&self, id: impl Display) -> Result<T> {
        self.resource.get(id).await
    }

    pub async fn create<B, T>(&self, invoice: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.resource.create(invoice).await
    }

    pub async fn update<B, T>(&self, id: impl Display, invoice: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.resource.update(id, invoice).await
    }

    pub async fn delete(&self, id: impl Display) -> Result<()> {
        self.resource.delete(id).await
    }

    /// Approved quotes that don't have an invoice yet.
    pub async fn available_quotes<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let body = self.gate.get("/invoices/available-quotes/").await?;
        Ok(Page::from_body(body)?.results)
    }

    pub async fn mark_paid(&self, id: impl Display) -> Result<Value> {
        let path = self.resource.action_path(id, "mark-paid");
        Ok(self.gate.request(&path, RequestOptions::post()).await?.into_json())
    }

    pub async fn download_pdf(&self, id: impl Display) -> Result<Bytes> {
        self.gate.download(&self.resource.action_path(id, "download")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::test_support::signed_in_gate;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_passes_params() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/invoices/".to_string()))
            .match_query(Matcher::UrlEncoded("page_size".into(), "5".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"count": 1, "next": null, "previous": null, "results": [{"id": 1}]}"#)
            .create_async()
            .await;

        let gate = signed_in_gate(&server);
        let page: Page<Value> = InvoicesApi::new(&gate).list(&[("page_size", "5")]).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.count, Some(1));
        assert_eq!(page.results[0]["id"], 1);
    }

    #[tokio::test]
    async fn test_mark_paid_posts_to_action() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/invoices/12/mark-paid/")
            .match_header("authorization", "Bearer A1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "paid"}"#)
            .create_async()
            .await;

        let gate = signed_in_gate(&server);
        let result = InvoicesApi::new(&gate).mark_paid(12).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, json!({"status": "paid"}));
    }

    #[tokio::test]
    async fn test_available_quotes_accepts_bare_list() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/invoices/available-quotes/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 4, "name": "Kitchen refit"}]"#)
            .create_async()
            .await;

        let gate = signed_in_gate(&server);
        let quotes: Vec<Value> = InvoicesApi::new(&gate).available_quotes().await.unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0]["name"], "Kitchen refit");
    }

    #[tokio::test]
    async fn test_delete_ignores_empty_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/invoices/3/")
            .with_status(204)
            .create_async()
            .await;

        let gate = signed_in_gate(&server);
        InvoicesApi::new(&gate).delete(3).await.unwrap();
        mock.assert_async().await;
    }
}

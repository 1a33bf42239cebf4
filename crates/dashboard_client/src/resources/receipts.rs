use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;

use super::{Page, Resource};
use crate::error::Result;
use crate::gate::RequestGate;

const BASE: &str = "/receipts/";

pub struct ReceiptsApi<'a> {
    gate: &'a RequestGate,
    resource: Resource<'a>,
}

impl<'a> ReceiptsApi<'a> {
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

    pub async fn create<B, T>(&self, receipt: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.resource.create(receipt).await
    }

    pub async fn delete(&self, id: impl Display) -> Result<()> {
        self.resource.delete(id).await
    }

    /// Paid invoices that can still be receipted.
    pub async fn paid_invoices<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let body = self.gate.get("/receipts/paid-invoices/").await?;
        Ok(Page::from_body(body)?.results)
    }

    pub async fn download_pdf(&self, id: impl Display) -> Result<Bytes> {
        self.gate.download(&self.resource.action_path(id, "download")).await
    }
}

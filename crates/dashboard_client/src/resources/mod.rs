//! Per-resource method sets over [`RequestGate`].
//!
//! These stay thin on purpose: they know paths and payload shapes, while
//! auth, refresh and error mapping live in the gate.

pub mod auth;
pub mod catalog;
pub mod contacts;
pub mod dashboard;
pub mod invoices;
pub mod receipts;

pub use auth::{AuthApi, LoginResponse};
pub use catalog::{ProjectsApi, ServicesApi, TestimonialsApi};
pub use contacts::{ContactFilter, ContactsApi, QuoteStatus};
pub use dashboard::{DashboardApi, NewsletterApi};
pub use invoices::InvoicesApi;
pub use receipts::ReceiptsApi;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use url::form_urlencoded;

use crate::error::Result;
use crate::gate::{RequestGate, ResponseBody};

/// One page of a list endpoint.
///
/// The API paginates some lists and returns bare arrays for others; both
/// shapes land here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub count: Option<u64>,
    pub next: Option<String>,
    pub previous: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageShape<T> {
    Paginated {
        results: Vec<T>,
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
    },
    Bare(Vec<T>),
}

impl<T: DeserializeOwned> Page<T> {
    pub fn from_body(body: ResponseBody) -> Result<Self> {
        let page = match body.deserialize::<PageShape<T>>()? {
            PageShape::Paginated {
                results,
                count,
                next,
                previous,
            } => Page {
                results,
                count,
                next,
                previous,
            },
            PageShape::Bare(results) => Page {
                results,
                count: None,
                next: None,
                previous: None,
            },
        };
        Ok(page)
    }
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Append `params` as a query string. Empty params leave the path untouched.
pub fn with_query(path: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{path}?{query}")
}

/// Standard verbs for a collection rooted at `base` (e.g. `/invoices/`).
#[derive(Clone, Copy)]
pub struct Resource<'a> {
    gate: &'a RequestGate,
    base: &'static str,
}

impl<'a> Resource<'a> {
    pub fn new(gate: &'a RequestGate, base: &'static str) -> Self {
        Self { gate, base }
    }

    pub fn item_path(&self, id: impl Display) -> String {
        format!("{}{}/", self.base, id)
    }

    pub fn action_path(&self, id: impl Display, action: &str) -> String {
        format!("{}{}/{}/", self.base, id, action)
    }

    pub async fn list<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<Page<T>> {
        let body = self.gate.get(&with_query(self.base, params)).await?;
        Page::from_body(body)
    }

    pub async fn get<T: DeserializeOwned>(&self, id: impl Display) -> Result<T> {
        self.gate.get(&self.item_path(id)).await?.deserialize()
    }

    pub async fn create<B, T>(&self, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.gate.post(self.base, body).await?.deserialize()
    }

    pub async fn update<B, T>(&self, id: impl Display, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.gate.put(&self.item_path(id), body).await?.deserialize()
    }

    pub async fn patch<B, T>(&self, id: impl Display, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.gate.patch(&self.item_path(id), body).await?.deserialize()
    }

    pub async fn delete(&self, id: impl Display) -> Result<()> {
        self.gate.delete(&self.item_path(id)).await?;
        Ok(())
    }
}

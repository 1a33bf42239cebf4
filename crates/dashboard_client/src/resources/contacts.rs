use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::{self, Display};
use std::str::FromStr;
use tracing::debug;

use super::{Page, Resource};
use crate::error::Result;
use crate::gate::RequestGate;

const BASE: &str = "/quotes/admin/";

/// Where a quote request sits in the sales pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Pending,
    Approved,
    Rejected,
    Converted,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Pending => "pending",
            QuoteStatus::Approved => "approved",
            QuoteStatus::Rejected => "rejected",
            QuoteStatus::Converted => "converted",
        }
    }
}

impl Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(QuoteStatus::Pending),
            "approved" => Ok(QuoteStatus::Approved),
            "rejected" => Ok(QuoteStatus::Rejected),
            "converted" => Ok(QuoteStatus::Converted),
            other => Err(format!(
                "Invalid quote status '{}'. Must be pending, approved, rejected or converted",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContactFilter {
    pub status: Option<QuoteStatus>,
    pub page_size: Option<u32>,
}

/// Contact/quote requests submitted from the public site.
pub struct ContactsApi<'a> {
    resource: Resource<'a>,
}

impl<'a> ContactsApi<'a> {
    pub fn new(gate: &'a RequestGate) -> Self {
        Self {
            resource: Resource::new(gate, BASE),
        }
    }

    pub async fn list<T: DeserializeOwned>(&self, filter: &ContactFilter) -> Result<Page<T>> {
        let page_size = filter.page_size.map(|n| n.to_string());

        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(status) = filter.status {
            params.push(("status", status.as_str()));
        }
        if let Some(page_size) = page_size.as_deref() {
            params.push(("page_size", page_size));
        }

        debug!(?filter, "listing quote requests");
        self.resource.list(&params).await
    }

    pub async fn update_status<T: DeserializeOwned>(&self, id: impl Display, status: QuoteStatus) -> Result<T> {
        self.resource.patch(id, &json!({ "status": status })).await
    }
}

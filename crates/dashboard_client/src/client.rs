use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::gate::RequestGate;
use crate::resources::{
    AuthApi, ContactsApi, DashboardApi, InvoicesApi, NewsletterApi, ProjectsApi, ReceiptsApi,
    ServicesApi, TestimonialsApi,
};

/// Owns the gate and hands out per-resource clients that borrow it.
///
/// Cheap to clone; clones share tokens and the refresh queue.
#[derive(Clone, Debug)]
pub struct DashboardClient {
    gate: Arc<RequestGate>,
}

impl DashboardClient {
    pub fn new(gate: RequestGate) -> Self {
        Self { gate: Arc::new(gate) }
    }

    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Ok(Self::new(RequestGate::from_config(config)?))
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(ClientConfig::from_env()?)
    }

    pub fn gate(&self) -> &RequestGate {
        &self.gate
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(&self.gate)
    }

    pub fn dashboard(&self) -> DashboardApi<'_> {
        DashboardApi::new(&self.gate)
    }

    pub fn invoices(&self) -> InvoicesApi<'_> {
        InvoicesApi::new(&self.gate)
    }

    pub fn receipts(&self) -> ReceiptsApi<'_> {
        ReceiptsApi::new(&self.gate)
    }

    pub fn contacts(&self) -> ContactsApi<'_> {
        ContactsApi::new(&self.gate)
    }

    pub fn projects(&self) -> ProjectsApi<'_> {
        ProjectsApi::new(&self.gate)
    }

    pub fn newsletter(&self) -> NewsletterApi<'_> {
        NewsletterApi::new(&self.gate)
    }

    pub fn services(&self) -> ServicesApi<'_> {
        ServicesApi::new(&self.gate)
    }

    pub fn testimonials(&self) -> TestimonialsApi<'_> {
        TestimonialsApi::new(&self.gate)
    }
}

//! Public-facing content managed from the dashboard: projects, services and testimonials.

use serde::de::DeserializeOwned;
use serde_json::json;
use std::fmt::Display;

use super::{Page, Resource};
use crate::error::Result;
use crate::gate::RequestGate;

pub struct ProjectsApi<'a> {
    resource: Resource<'a>,
}

impl<'a> ProjectsApi<'a> {
    pub fn new(gate: &'a RequestGate) -> Self {
        Self {
            resource: Resource::new(gate, "/projects/"),
        }
    }

    /// e.g. `&[("category__slug", "residential")]`
    pub async fn list<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<Page<T>> {
        self.resource.list(params).await
    }

    /// Projects are addressed by slug rather than numeric id.
    pub async fn get<T: DeserializeOwned>(&self, slug: &str) -> Result<T> {
        self.resource.get(slug).await
    }
}

pub struct ServicesApi<'a> {
    resource: Resource<'a>,
}

impl<'a> ServicesApi<'a> {
    pub fn new(gate: &'a RequestGate) -> Self {
        Self {
            resource: Resource::new(gate, "/services/"),
        }
    }

    pub async fn list<T: DeserializeOwned>(&self) -> Result<Page<T>> {
        self.resource.list(&[]).await
    }
}

pub struct TestimonialsApi<'a> {
    resource: Resource<'a>,
}

impl<'a> TestimonialsApi<'a> {
    pub fn new(gate: &'a RequestGate) -> Self {
        Self {
            resource: Resource::new(gate, "/testimonials/"),
        }
    }

    pub async fn list<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<Page<T>> {
        self.resource.list(params).await
    }

    pub async fn approve<T: DeserializeOwned>(&self, id: impl Display) -> Result<T> {
        self.resource.patch(id, &json!({ "is_approved": true })).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::test_support::signed_in_gate;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    #[tokio::test]
    async fn test_project_lookup_by_slug() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/projects/lagos-penthouse/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"slug": "lagos-penthouse", "title": "Lagos Penthouse"}"#)
            .create_async()
            .await;

        let gate = signed_in_gate(&server);
        let project: Value = ProjectsApi::new(&gate).get("lagos-penthouse").await.unwrap();

        mock.assert_async().await;
        assert_eq!(project["title"], "Lagos Penthouse");
    }

    #[tokio::test]
    async fn test_approve_testimonial() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/testimonials/11/")
            .match_body(Matcher::Json(json!({"is_approved": true})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 11, "is_approved": true}"#)
            .create_async()
            .await;

        let gate = signed_in_gate(&server);
        let testimonial: Value = TestimonialsApi::new(&gate).approve(11).await.unwrap();

        mock.assert_async().await;
        assert_eq!(testimonial["is_approved"], true);
    }

    #[tokio::test]
    async fn test_services_list() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/services/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name": "Space planning"}, {"name": "Styling"}]"#)
            .create_async()
            .await;

        let gate = signed_in_gate(&server);
        let services: Page<Value> = ServicesApi::new(&gate).list().await.unwrap();
        assert_eq!(services.len(), 2);
    }
}

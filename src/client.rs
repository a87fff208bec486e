//! # Client — Read-only Project API Accessor
//!
//! Thin wrapper over three endpoints of the HR REST API:
//!
//! | Call | Request |
//! |------|---------|
//! | [`ProjectClient::get_all`] | `GET /projects?search=&status=&limit=` |
//! | [`ProjectClient::get_paginated`] | `GET /projects?search=&status=&page=&limit=` |
//! | [`ProjectClient::get_by_id`] | `GET /projects/{id}` |
//!
//! Filter values are sent as given. Unset values, an empty `search` and a
//! zero `page` or `limit` are left out of the query string, leaving those to
//! the server's defaults. `get_all` never sends `page`, even when the filter
//! carries one.
//!
//! ## Response shapes
//!
//! The list endpoint has answered with a bare array, with `{data: [...]}`
//! and with a paginated envelope nested under `data` (`{data: {data: [...],
//! total}}`). `get_all` accepts all three. Anything else decodes to an empty
//! list and logs a warning, since it usually means the server contract
//! changed underneath the client.
//!
//! Non-2xx statuses and transport failures are returned as errors unchanged.
//! There is no retry and no caching; one call is one request.

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{Page, Project, ProjectStatus};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default)]
pub struct ProjectFilters {
    pub search: Option<String>,
    pub status: Option<ProjectStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProjectFilters {
    /// Query pairs for a list request. `page` is included only when asked.
    pub fn query_pairs(&self, with_page: bool) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if with_page {
            if let Some(page) = self.page.filter(|&p| p > 0) {
                pairs.push(("page", page.to_string()));
            }
        }
        if let Some(limit) = self.limit.filter(|&l| l > 0) {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

pub struct ProjectClient {
    base_url: String,
    http: reqwest::Client,
}

impl ProjectClient {
    /// `base_url` is the API root, e.g. `http://localhost:3000/api`.
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::with_http(base_url, http))
    }

    pub fn with_http(base_url: &str, http: reqwest::Client) -> Self {
        ProjectClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, path: &str, query: &[(&'static str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "GET");
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// All projects matching `filters`, normalised to a flat list.
    pub async fn get_all(&self, filters: &ProjectFilters) -> Result<Vec<Project>> {
        let body = self.get_json("/projects", &filters.query_pairs(false)).await?;
        unwrap_list(body)
    }

    /// One page of projects with the envelope returned as-is.
    pub async fn get_paginated(&self, filters: &ProjectFilters) -> Result<Page<Project>> {
        let body = self.get_json("/projects", &filters.query_pairs(true)).await?;
        serde_json::from_value(body).context("unexpected paginated projects response")
    }

    /// A single project. One `data` envelope level is unwrapped.
    pub async fn get_by_id(&self, id: i32) -> Result<Project> {
        let body = self.get_json(&format!("/projects/{}", id), &[]).await?;
        serde_json::from_value(take_data(body))
            .with_context(|| format!("unexpected response for project {}", id))
    }
}

fn take_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Normalise a list response: bare array, `{data: [...]}` or
/// `{data: {data: [...]}}`. Any other shape is an empty list.
pub fn unwrap_list(body: Value) -> Result<Vec<Project>> {
    let mut value = take_data(body);
    if !value.is_array() {
        value = take_data(value);
    }
    if !value.is_array() {
        warn!(shape = %shape(&value), "projects response is not a list; returning no projects");
        return Ok(Vec::new());
    }
    serde_json::from_value(value).context("malformed project in list response")
}

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project_json(id: i32, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "status": "active",
            "priority": "high",
            "progress": 10
        })
    }

    #[test]
    fn bare_array_is_returned_unchanged() {
        let body = json!([project_json(1, "Atlas"), project_json(2, "Beacon")]);
        let projects = unwrap_list(body).unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[1].name, "Beacon");
    }

    #[test]
    fn single_envelope_is_unwrapped() {
        let body = json!({ "data": [project_json(3, "Harbor")] });
        let projects = unwrap_list(body).unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, 3);
    }

    #[test]
    fn nested_paginated_envelope_is_unwrapped() {
        let body = json!({
            "data": { "data": [project_json(4, "Nimbus")], "total": 1, "page": 1 }
        });
        let projects = unwrap_list(body).unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "Nimbus");
    }

    #[test]
    fn other_shapes_degrade_to_empty() {
        assert!(unwrap_list(json!({ "items": [] })).unwrap().is_empty());
        assert!(unwrap_list(json!({ "data": { "rows": [] } })).unwrap().is_empty());
        assert!(unwrap_list(json!("nope")).unwrap().is_empty());
        assert!(unwrap_list(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn malformed_items_are_errors() {
        let body = json!([{ "id": "not a number" }]);
        assert!(unwrap_list(body).is_err());
    }

    #[test]
    fn query_pairs_skip_page_for_list() {
        let filters = ProjectFilters {
            search: Some("crm".into()),
            status: Some(ProjectStatus::Active),
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(
            filters.query_pairs(false),
            vec![
                ("search", "crm".to_string()),
                ("status", "active".to_string()),
                ("limit", "20".to_string()),
            ]
        );
        assert!(filters.query_pairs(true).contains(&("page", "3".to_string())));
    }

    #[test]
    fn query_pairs_omit_unset_and_empty() {
        assert!(ProjectFilters::default().query_pairs(true).is_empty());
        let filters = ProjectFilters {
            search: Some(String::new()),
            page: Some(0),
            limit: Some(0),
            ..Default::default()
        };
        assert!(filters.query_pairs(true).is_empty());
    }

    #[test]
    fn query_pairs_forward_search_verbatim() {
        let filters = ProjectFilters {
            search: Some("  atlas ".into()),
            ..Default::default()
        };
        assert_eq!(filters.query_pairs(false), vec![("search", "  atlas ".to_string())]);

        let blank = ProjectFilters {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(blank.query_pairs(false), vec![("search", "   ".to_string())]);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ProjectClient::new("http://localhost:3000/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api");
    }
}

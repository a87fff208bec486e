//! ProjectClient tests against the in-process mock API.
//!
//! No database or network access required; the mock binds a random local
//! port per test.


use mock_api::MockApi;
use peoplehub::model::{ProjectPriority, ProjectStatus};
use peoplehub::{ProjectClient, ProjectFilters};
use serde_json::{json, Value};

fn project(id: i32, name: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "test project",
        "category": "Web Application",
        "b2bClient": "Globex",
        "status": status,
        "priority": "medium",
        "startDate": "2024-01-08",
        "endDate": null,
        "progress": 25
    })
}

fn client(mock: &MockApi) -> ProjectClient {
    ProjectClient::new(&mock.url()).unwrap()
}

// --- get_all: response normalisation ---

#[tokio::test]
async fn get_all_returns_bare_array() {
    let mock = MockApi::builder()
        .with_list_body(json!([project(1, "Atlas CRM", "active"), project(2, "Beacon", "planning")]))
        .start()
        .await;

    let projects = client(&mock).get_all(&ProjectFilters::default()).await.unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].name, "Atlas CRM");
    assert_eq!(projects[0].b2b_client.as_deref(), Some("Globex"));
    assert_eq!(projects[1].status, ProjectStatus::Planning);
    assert_eq!(projects[1].priority, ProjectPriority::Medium);
}

#[tokio::test]
async fn get_all_unwraps_data_envelope() {
    let mock = MockApi::builder()
        .with_list_body(json!({ "data": [project(7, "Harbor Mobile", "active")] }))
        .start()
        .await;

    let filters = ProjectFilters {
        status: Some(ProjectStatus::Active),
        ..Default::default()
    };
    let projects = client(&mock).get_all(&filters).await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].id, 7);
}

#[tokio::test]
async fn get_all_unwraps_doubly_nested_envelope() {
    let mock = MockApi::builder()
        .with_list_body(json!({
            "data": { "data": [project(3, "Nimbus", "completed")], "total": 1 }
        }))
        .start()
        .await;

    let projects = client(&mock).get_all(&ProjectFilters::default()).await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].status, ProjectStatus::Completed);
}

#[tokio::test]
async fn get_all_other_shape_is_empty() {
    let mock = MockApi::builder()
        .with_list_body(json!({ "items": [project(1, "Atlas", "active")] }))
        .start()
        .await;

    let projects = client(&mock).get_all(&ProjectFilters::default()).await.unwrap();
    assert!(projects.is_empty());
}

// --- Query strings ---

#[tokio::test]
async fn get_all_never_sends_page() {
    let mock = MockApi::start().await;
    let filters = ProjectFilters {
        search: Some("crm".into()),
        status: Some(ProjectStatus::OnHold),
        page: Some(4),
        limit: Some(25),
    };
    client(&mock).get_all(&filters).await.unwrap();

    let query = mock.last_query().unwrap();
    assert_eq!(query.get("search").map(String::as_str), Some("crm"));
    assert_eq!(query.get("status").map(String::as_str), Some("on_hold"));
    assert_eq!(query.get("limit").map(String::as_str), Some("25"));
    assert!(!query.contains_key("page"));
}

#[tokio::test]
async fn empty_filters_send_no_parameters() {
    let mock = MockApi::start().await;
    let filters = ProjectFilters {
        search: Some(String::new()),
        ..Default::default()
    };
    client(&mock).get_all(&filters).await.unwrap();
    assert!(mock.last_query().unwrap().is_empty());
}

#[tokio::test]
async fn search_is_url_encoded() {
    let mock = MockApi::start().await;
    let filters = ProjectFilters {
        search: Some("R&D / web".into()),
        ..Default::default()
    };
    client(&mock).get_all(&filters).await.unwrap();
    let query = mock.last_query().unwrap();
    assert_eq!(query.get("search").map(String::as_str), Some("R&D / web"));
}

#[tokio::test]
async fn search_is_sent_untrimmed_and_zero_limit_is_unset() {
    let mock = MockApi::start().await;
    let filters = ProjectFilters {
        search: Some(" crm ".into()),
        limit: Some(0),
        ..Default::default()
    };
    client(&mock).get_all(&filters).await.unwrap();
    let query = mock.last_query().unwrap();
    assert_eq!(query.get("search").map(String::as_str), Some(" crm "));
    assert!(!query.contains_key("limit"));
}

// --- get_paginated ---

#[tokio::test]
async fn get_paginated_returns_full_envelope() {
    let mock = MockApi::builder()
        .with_page_body(json!({
            "data": [project(11, "Atlas", "active"), project(12, "Beacon", "active")],
            "total": 12,
            "page": 2,
            "limit": 10,
            "totalPages": 2
        }))
        .start()
        .await;

    let filters = ProjectFilters {
        page: Some(2),
        limit: Some(10),
        ..Default::default()
    };
    let page = client(&mock).get_paginated(&filters).await.unwrap();
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.total, 12);
    assert_eq!(page.page, 2);
    assert_eq!(page.limit, 10);
    assert_eq!(page.total_pages, 2);

    let query = mock.last_query().unwrap();
    assert_eq!(query.get("page").map(String::as_str), Some("2"));
    assert_eq!(query.get("limit").map(String::as_str), Some("10"));
}

#[tokio::test]
async fn get_paginated_rejects_bare_array() {
    let mock = MockApi::builder().with_page_body(json!([])).start().await;
    let filters = ProjectFilters {
        page: Some(1),
        ..Default::default()
    };
    assert!(client(&mock).get_paginated(&filters).await.is_err());
}

// --- get_by_id ---

#[tokio::test]
async fn get_by_id_unwraps_one_level() {
    let mock = MockApi::builder()
        .with_project(5, project(5, "Legacy Billing Migration", "on_hold"))
        .start()
        .await;

    let p = client(&mock).get_by_id(5).await.unwrap();
    assert_eq!(p.id, 5);
    assert_eq!(p.name, "Legacy Billing Migration");
    assert_eq!(p.progress, 25);
}

#[tokio::test]
async fn get_by_id_not_found_is_an_error() {
    let mock = MockApi::start().await;
    let err = client(&mock).get_by_id(404).await.unwrap_err();
    assert!(err.to_string().contains("404"), "unexpected error: {}", err);
}

// --- Transport and status errors ---

#[tokio::test]
async fn server_errors_propagate() {
    let mock = MockApi::builder().with_error(500).start().await;
    let c = client(&mock);
    assert!(c.get_all(&ProjectFilters::default()).await.is_err());
    assert!(c.get_paginated(&ProjectFilters::default()).await.is_err());
    assert!(c.get_by_id(1).await.is_err());
}

#[tokio::test]
async fn connection_refused_propagates() {
    // Reserve a free port, then release it so nothing is listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let c = ProjectClient::new(&format!("http://{}", addr)).unwrap();
    assert!(c.get_all(&ProjectFilters::default()).await.is_err());
}

#[tokio::test]
async fn one_request_per_call() {
    let mock = MockApi::builder()
        .with_list_body(json!([project(1, "Atlas", "active")]))
        .start()
        .await;
    let c = client(&mock);
    c.get_all(&ProjectFilters::default()).await.unwrap();
    c.get_all(&ProjectFilters::default()).await.unwrap();
    assert_eq!(mock.queries().len(), 2);
}

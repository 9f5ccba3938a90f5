//! Integration tests for the wiki client against a mock HTTP server.

#![allow(clippy::unwrap_used)]

use fe_slots_core::document::{DocumentError, DocumentStore};
use fe_slots_wiki::{WikiClient, WikiError};
use serde_json::json;
use std::collections::HashMap;
use wiremock::matchers::{basic_auth, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BODY: &str = "| [FE7|Shared FE 7] | | {ticket-macro:key=} | | |\n";

const EDIT_PAGE: &str = r#"<html><body>
<form id="editpageform" method="post" action="doeditpage.action?pageId=42">
  <input type="hidden" name="atl_token" value="tok-123">
  <input type="hidden" name="originalVersion" value="7">
  <input type="submit" name="cancel" value="Cancel">
  <textarea name="content">stale body</textarea>
</form>
</body></html>"#;

fn client_at(base: &str) -> WikiClient {
    WikiClient::new(
        &format!("{base}/rest/api/content/42"),
        &format!("{base}/pages/editpage.action?pageId=42"),
        "fesbot",
        "secret",
    )
    .unwrap()
}

fn client(server: &MockServer) -> WikiClient {
    client_at(&server.uri())
}

async fn mount_edit_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/pages/editpage.action"))
        .and(basic_auth("fesbot", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EDIT_PAGE))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_body_reads_the_body_field() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/content/42"))
        .and(basic_auth("fesbot", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "42",
            "title": "FE Board",
            "body": BODY,
        })))
        .mount(&server)
        .await;

    let body = client(&server).fetch_body().await.unwrap();
    assert_eq!(body, BODY);
}

#[tokio::test]
async fn fetch_body_without_body_field_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/content/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "title": "FE Board" })))
        .mount(&server)
        .await;

    let result = client(&server).fetch_body().await;
    assert!(matches!(result, Err(DocumentError::Malformed(_))));
}

#[tokio::test]
async fn fetch_body_reports_status_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/content/42"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client(&server).body().await;
    assert!(matches!(result, Err(WikiError::ApiError { status: 401, .. })));
}

#[tokio::test]
async fn unreachable_wiki_is_a_transport_fault() {
    // Bound then closed, so nothing answers on this port
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = client_at(&format!("http://{addr}")).fetch_body().await;
    assert!(matches!(result, Err(DocumentError::Transport(_))));
}

#[tokio::test]
async fn edit_session_resolves_action_next_to_edit_page() {
    let server = MockServer::start().await;
    mount_edit_page(&server).await;

    let session = client(&server).fetch_edit_session().await.unwrap();

    assert_eq!(
        session.action_url,
        format!("{}/pages/doeditpage.action?pageId=42", server.uri())
    );
    assert_eq!(session.content(), Some("stale body"));
    assert!(!session.fields.contains_key("cancel"));
}

#[tokio::test]
async fn edit_page_without_form_is_an_edit_form_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pages/editpage.action"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>please log in</html>"))
        .mount(&server)
        .await;

    let result = client(&server).fetch_edit_session().await;
    assert!(matches!(result, Err(DocumentError::EditForm(_))));
}

#[tokio::test]
async fn submit_posts_all_fields_with_new_content() {
    let server = MockServer::start().await;
    mount_edit_page(&server).await;

    Mock::given(method("POST"))
        .and(path("/pages/doeditpage.action"))
        .and(query_param("pageId", "42"))
        .and(basic_auth("fesbot", "secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let session = client.fetch_edit_session().await.unwrap();
    let accepted = client.submit(session, BODY.to_string()).await.unwrap();
    assert!(accepted);

    let requests = server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let form: HashMap<String, String> = url::form_urlencoded::parse(&post.body)
        .into_owned()
        .collect();

    assert_eq!(form.get("content").map(String::as_str), Some(BODY));
    assert_eq!(form.get("atl_token").map(String::as_str), Some("tok-123"));
    assert_eq!(form.get("originalVersion").map(String::as_str), Some("7"));
    assert!(!form.contains_key("cancel"));
}

#[tokio::test]
async fn submit_non_200_is_not_accepted() {
    let server = MockServer::start().await;
    mount_edit_page(&server).await;

    Mock::given(method("POST"))
        .and(path("/pages/doeditpage.action"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client(&server);
    let session = client.fetch_edit_session().await.unwrap();
    assert!(!client.submit(session, BODY.to_string()).await.unwrap());
}

use std::time::Duration;

use ferry_core::{list_all, Error, SourceForge};
use ferry_forge::GogsClient;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn repo_json(id: i64, owner: &str, name: &str, host: &str) -> Value {
    json!({
        "id": id,
        "owner": {"id": 1, "login": owner, "username": owner, "full_name": ""},
        "name": name,
        "full_name": format!("{}/{}", owner, name),
        "private": true,
        "clone_url": format!("{}/{}/{}.git", host, owner, name),
    })
}

fn listing(route: &str, body: Value) -> Mock {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("Authorization", "token gogs-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
}

fn client(server: &MockServer) -> GogsClient {
    GogsClient::new(&server.uri(), "gogs-token", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn lists_user_and_org_repositories_deduplicated() {
    let server = MockServer::start().await;
    let host = server.uri();

    listing(
        "/api/v1/users/alice/repos",
        json!([repo_json(10, "alice", "tool", &host), repo_json(5, "acme", "shared", &host)]),
    )
    .mount(&server)
    .await;
    listing(
        "/api/v1/users/alice/orgs",
        json!([{"id": 3, "username": "acme", "full_name": "Acme"}]),
    )
    .mount(&server)
    .await;
    listing(
        "/api/v1/orgs/acme/repos",
        json!([repo_json(20, "acme", "widget", &host), repo_json(5, "Acme", "Shared", &host)]),
    )
    .mount(&server)
    .await;

    let repos = list_all(&client(&server), "alice").await.unwrap();
    let names: Vec<&str> = repos.iter().map(|r| r.full_name.as_str()).collect();
    assert_eq!(names, vec!["acme/widget", "alice/tool", "acme/shared"]);
    assert_eq!(repos[0].clone_url, format!("{}/acme/widget.git", host));
    assert_eq!(repos[0].owner_name, "acme");
}

#[tokio::test]
async fn org_names_come_from_username() {
    let server = MockServer::start().await;
    listing(
        "/api/v1/users/alice/orgs",
        json!([{"id": 3, "username": "acme"}, {"id": 4, "username": "umbrella"}]),
    )
    .mount(&server)
    .await;

    let orgs = client(&server).user_orgs("alice").await.unwrap();
    assert_eq!(orgs, vec!["acme", "umbrella"]);
}

#[tokio::test]
async fn listing_error_aborts_enumeration() {
    let server = MockServer::start().await;
    listing("/api/v1/users/alice/repos", json!([])).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/alice/orgs"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let err = list_all(&client(&server), "alice").await.unwrap_err();
    match err {
        Error::Api {
            forge,
            status,
            message,
        } => {
            assert_eq!(forge, "Gogs");
            assert_eq!(status, 500);
            assert_eq!(message, "internal error");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn schema_mismatch_is_parse_error() {
    let server = MockServer::start().await;
    listing(
        "/api/v1/users/alice/repos",
        json!([{"id": "not-a-number", "name": "tool"}]),
    )
    .mount(&server)
    .await;

    let err = client(&server).user_repos("alice").await.unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

//! Jira REST client against a mock server.

use branchboard::data::{Scope, StatusCategory};
use branchboard::integrations::jira::{JiraClient, NewIssue};
use branchboard::integrations::{FetchError, TicketFetcher};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{basic_auth, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> JiraClient {
    JiraClient::new(
        server.uri(),
        "me@corp.com",
        "secret",
        vec!["WEB".to_string()],
    )
    .with_retry_backoff(Duration::from_millis(1))
}

fn search_body() -> serde_json::Value {
    json!({
        "issues": [
            {
                "key": "WEB-2",
                "fields": {
                    "summary": "Fix login bug",
                    "status": { "name": "In Review", "statusCategory": { "name": "In Progress" } },
                    "issuetype": { "name": "Sub-task", "subtask": true },
                    "parent": { "key": "WEB-1" },
                    "assignee": { "displayName": "Ada Lovelace" },
                    "priority": { "name": "High" },
                    "project": { "key": "WEB" }
                }
            },
            {
                "key": "WEB-1",
                "fields": {
                    "summary": "Login epic",
                    "issuetype": { "name": "Story" }
                }
            }
        ]
    })
}

mod search {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn sends_jql_and_parses_tickets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/search/jql"))
            .and(basic_auth("me@corp.com", "secret"))
            .and(query_param(
                "jql",
                "project = WEB AND statusCategory = \"In Progress\" AND assignee = currentUser() ORDER BY updated DESC",
            ))
            .and(query_param("maxResults", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
            .expect(1)
            .mount(&server)
            .await;

        let tickets = client(&server)
            .fetch(StatusCategory::InProgress, Scope::Assigned, 50)
            .await
            .unwrap();

        assert_eq!(tickets.len(), 2);
        let sub = &tickets[0];
        assert_eq!(sub.key, "WEB-2");
        assert_eq!(sub.status, "In Review");
        assert_eq!(sub.category, Some(StatusCategory::InProgress));
        assert!(sub.is_subtask);
        assert_eq!(sub.parent_key(), Some("WEB-1"));
        assert_eq!(sub.assignee.as_deref(), Some("Ada Lovelace"));
        assert_eq!(sub.priority.as_deref(), Some("High"));

        // Missing status falls back to the requested column
        let bare = &tickets[1];
        assert_eq!(bare.status, "");
        assert_eq!(bare.category, Some(StatusCategory::InProgress));
        assert!(!bare.is_subtask);
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/search/jql"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/search/jql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "issues": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let tickets = client(&server)
            .search(StatusCategory::ToDo, Scope::Unassigned, 10)
            .await
            .unwrap();
        assert!(tickets.is_empty());
    }

    #[tokio::test]
    async fn gives_up_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(3)
            .mount(&server)
            .await;

        let err = client(&server)
            .search(StatusCategory::Done, Scope::Reported, 10)
            .await
            .unwrap_err();
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .search(StatusCategory::Done, Scope::Reported, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 401, .. }));
        assert!(err.to_string().contains("HTTP 401"));
    }

    #[tokio::test]
    async fn garbage_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .search(StatusCategory::ToDo, Scope::Assigned, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}

mod issues {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn myself_returns_account_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/myself"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "accountId": "acc-1", "displayName": "Me" })),
            )
            .mount(&server)
            .await;

        assert_eq!(client(&server).myself().await.unwrap(), "acc-1");
    }

    fn new_issue() -> NewIssue {
        NewIssue {
            project: "WEB".into(),
            summary: "Cache search results".into(),
            description: "Adds a cache.\n\nKeyed by query.".into(),
            issue_type: "Task".into(),
            assignee_account_id: Some("acc-1".into()),
        }
    }

    #[tokio::test]
    async fn create_posts_fields_and_returns_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/3/issue"))
            .and(body_partial_json(json!({
                "fields": {
                    "project": { "key": "WEB" },
                    "summary": "Cache search results",
                    "issuetype": { "name": "Task" },
                    "assignee": { "accountId": "acc-1" }
                }
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "id": "10001", "key": "WEB-77" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let key = client(&server).create_issue(&new_issue()).await.unwrap();
        assert_eq!(key, "WEB-77");
    }

    #[tokio::test]
    async fn create_rejects_anything_but_created() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).create_issue(&new_issue()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));
    }
}

use crate::data::{Scope, StatusCategory, Ticket};
use crate::integrations::{FetchError, TicketFetcher, HTTP_CLIENT};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const SEARCH_PATH: &str = "/rest/api/3/search/jql";
const MYSELF_PATH: &str = "/rest/api/3/myself";
const ISSUE_PATH: &str = "/rest/api/3/issue";
const SEARCH_FIELDS: &str = "summary,status,parent,issuetype,assignee,priority,project,description";

// Type-safe response structures for the Jira Cloud REST API
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<IssueNode>,
}

#[derive(Debug, Deserialize)]
struct IssueNode {
    key: String,
    fields: IssueFields,
}

#[derive(Debug, Deserialize)]
struct IssueFields {
    #[serde(default)]
    summary: String,
    status: Option<StatusNode>,
    parent: Option<ParentNode>,
    issuetype: Option<IssueTypeNode>,
    assignee: Option<UserNode>,
    priority: Option<NamedNode>,
    project: Option<ProjectNode>,
    description: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusNode {
    name: String,
    status_category: Option<NamedNode>,
}

#[derive(Debug, Deserialize)]
struct NamedNode {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ParentNode {
    key: String,
}

#[derive(Debug, Deserialize)]
struct IssueTypeNode {
    name: String,
    #[serde(default)]
    subtask: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectNode {
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyselfResponse {
    account_id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    key: String,
}

/// Fields for a ticket created by the `create` flow.
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub project: String,
    pub summary: String,
    pub description: String,
    pub issue_type: String,
    pub assignee_account_id: Option<String>,
}

/// Thin Jira Cloud client with basic auth and 5xx retry.
#[derive(Debug, Clone)]
pub struct JiraClient {
    base_url: String,
    email: String,
    token: String,
    projects: Vec<String>,
    client: reqwest::Client,
    max_retries: u32,
    retry_backoff: Duration,
}

/// Web page for `key` on the Jira site at `base`.
pub fn browse_url(base: &str, key: &str) -> String {
    format!("{}/browse/{}", base.trim_end_matches('/'), key)
}

impl JiraClient {
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        token: impl Into<String>,
        projects: Vec<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            email: email.into(),
            token: token.into(),
            projects,
            client: HTTP_CLIENT.clone(),
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn browse_url(&self, key: &str) -> String {
        browse_url(&self.base_url, key)
    }

    /// JQL for one column of one scope, newest first.
    pub fn build_jql(&self, category: StatusCategory, scope: Scope) -> String {
        let mut clauses = Vec::with_capacity(3);
        if let Some(project) = project_clause(&self.projects) {
            clauses.push(project);
        }
        clauses.push(format!("statusCategory = \"{}\"", category.title()));
        clauses.push(scope.jql_predicate().to_string());
        format!("{} ORDER BY updated DESC", clauses.join(" AND "))
    }

    pub async fn search(
        &self,
        category: StatusCategory,
        scope: Scope,
        max_results: u32,
    ) -> Result<Vec<Ticket>, FetchError> {
        let url = format!("{}{}", self.base_url, SEARCH_PATH);
        let jql = self.build_jql(category, scope);
        tracing::debug!(%jql, "searching tickets");

        let query = [
            ("jql", jql),
            ("maxResults", max_results.to_string()),
            ("fields", SEARCH_FIELDS.to_string()),
        ];
        let body = self
            .send_with_retry(|| self.authed(self.client.get(&url)).query(&query))
            .await?;

        parse_search_response(&body, category)
    }

    /// Account id of the authenticated user.
    pub async fn myself(&self) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base_url, MYSELF_PATH);
        let body = self
            .send_with_retry(|| self.authed(self.client.get(&url)))
            .await?;
        let me: MyselfResponse = serde_json::from_str(&body)?;
        Ok(me.account_id)
    }

    /// Create an issue and return its key. Not retried.
    pub async fn create_issue(&self, issue: &NewIssue) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base_url, ISSUE_PATH);
        let payload = create_issue_payload(issue);

        let response = self
            .authed(self.client.post(&url))
            .json(&payload)
            .send()
            .await
            .map_err(map_transport)?;
        let status = response.status();
        let body = response.text().await.map_err(map_transport)?;
        if status != reqwest::StatusCode::CREATED {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let created: CreatedIssue = serde_json::from_str(&body)?;
        tracing::info!(key = %created.key, "created issue");
        Ok(created.key)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .basic_auth(&self.email, Some(&self.token))
            .header("Accept", "application/json")
    }

    /// Send, retrying server errors and connection failures with linear backoff.
    async fn send_with_retry<F>(&self, build: F) -> Result<String, FetchError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_server_error() && attempt < self.max_retries {
                        tracing::warn!(%status, attempt, "server error, retrying");
                    } else {
                        let body = response.text().await.map_err(map_transport)?;
                        if !status.is_success() {
                            return Err(FetchError::Status {
                                status: status.as_u16(),
                                body: truncate_body(&body),
                            });
                        }
                        return Ok(body);
                    }
                }
                Err(e) if e.is_connect() && attempt < self.max_retries => {
                    tracing::warn!(attempt, "connection failed, retrying: {}", e);
                }
                Err(e) => return Err(map_transport(e)),
            }
            attempt += 1;
            tokio::time::sleep(self.retry_backoff * attempt).await;
        }
    }
}

#[async_trait]
impl TicketFetcher for JiraClient {
    async fn fetch(
        &self,
        category: StatusCategory,
        scope: Scope,
        max_results: u32,
    ) -> Result<Vec<Ticket>, FetchError> {
        self.search(category, scope, max_results).await
    }
}

fn map_transport(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Http(e)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 300;
    if body.chars().count() <= MAX {
        body.trim().to_string()
    } else {
        format!("{}…", body.chars().take(MAX).collect::<String>().trim_end())
    }
}

/// `project = X` for one project, `project in (A, B)` for several.
pub fn project_clause(projects: &[String]) -> Option<String> {
    let projects: Vec<&str> = projects
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    match projects.as_slice() {
        [] => None,
        [single] => Some(format!("project = {}", single)),
        many => Some(format!("project in ({})", many.join(", "))),
    }
}

/// Parse a search response body. `fallback` fills in a missing status category.
pub fn parse_search_response(
    body: &str,
    fallback: StatusCategory,
) -> Result<Vec<Ticket>, FetchError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .issues
        .into_iter()
        .map(|node| ticket_from_node(node, fallback))
        .collect())
}

fn ticket_from_node(node: IssueNode, fallback: StatusCategory) -> Ticket {
    let fields = node.fields;
    let (status, category) = match fields.status {
        Some(s) => {
            let category = s
                .status_category
                .and_then(|c| StatusCategory::from_name(&c.name));
            (s.name, category)
        }
        None => (String::new(), None),
    };
    let (issue_type, is_subtask) = fields
        .issuetype
        .map(|t| (t.name, t.subtask))
        .unwrap_or_default();

    Ticket {
        key: node.key,
        summary: fields.summary,
        status,
        category: category.or(Some(fallback)),
        parent: fields.parent.map(|p| p.key),
        is_subtask,
        assignee: fields
            .assignee
            .and_then(|a| a.display_name)
            .filter(|n| !n.trim().is_empty()),
        priority: fields.priority.map(|p| p.name),
        issue_type,
        project: fields.project.map(|p| p.key).unwrap_or_default(),
        description: fields.description.as_ref().and_then(flatten_description),
    }
}

/// Flatten an Atlassian Document Format value (or a plain string) to text.
/// Top-level blocks become lines.
pub fn flatten_description(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Object(_) => value
            .get("content")
            .and_then(Value::as_array)
            .map(|blocks| {
                blocks
                    .iter()
                    .map(|block| {
                        let mut line = String::new();
                        collect_text(block, &mut line);
                        line
                    })
                    .filter(|line| !line.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default(),
        _ => String::new(),
    };
    (!text.is_empty()).then_some(text)
}

fn collect_text(node: &Value, out: &mut String) {
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        out.push_str(text);
    }
    if let Some(children) = node.get("content").and_then(Value::as_array) {
        for child in children {
            collect_text(child, out);
        }
    }
}

/// ADF document with one paragraph per non-blank line.
pub fn text_to_adf(text: &str) -> Value {
    let paragraphs: Vec<Value> = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            json!({
                "type": "paragraph",
                "content": [{ "type": "text", "text": line }]
            })
        })
        .collect();
    json!({ "type": "doc", "version": 1, "content": paragraphs })
}

fn create_issue_payload(issue: &NewIssue) -> Value {
    let mut fields = json!({
        "project": { "key": issue.project },
        "summary": issue.summary,
        "issuetype": { "name": issue.issue_type },
    });
    if !issue.description.trim().is_empty() {
        fields["description"] = text_to_adf(&issue.description);
    }
    if let Some(account_id) = &issue.assignee_account_id {
        fields["assignee"] = json!({ "accountId": account_id });
    }
    json!({ "fields": fields })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(projects: &[&str]) -> JiraClient {
        JiraClient::new(
            "https://example.atlassian.net/",
            "me@example.com",
            "token",
            projects.iter().map(|p| p.to_string()).collect(),
        )
    }

    #[test]
    fn jql_single_project() {
        let jql = client(&["WEB"]).build_jql(StatusCategory::InProgress, Scope::Assigned);
        assert_eq!(
            jql,
            "project = WEB AND statusCategory = \"In Progress\" AND assignee = currentUser() ORDER BY updated DESC"
        );
    }

    #[test]
    fn jql_many_projects() {
        let jql = client(&["WEB", " API "]).build_jql(StatusCategory::ToDo, Scope::Unassigned);
        assert!(jql.starts_with("project in (WEB, API) AND statusCategory = \"To Do\""));
        assert!(jql.contains("assignee is EMPTY"));
    }

    #[test]
    fn jql_without_projects_has_no_project_clause() {
        let jql = client(&[]).build_jql(StatusCategory::Done, Scope::Reported);
        assert!(jql.starts_with("statusCategory = \"Done\""));
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let c = client(&["WEB"]);
        assert_eq!(c.base_url(), "https://example.atlassian.net");
        assert_eq!(c.browse_url("WEB-1"), "https://example.atlassian.net/browse/WEB-1");
    }

    #[test]
    fn browse_url_ignores_trailing_slash_on_base() {
        assert_eq!(
            browse_url("https://acme.atlassian.net/", "API-3"),
            "https://acme.atlassian.net/browse/API-3"
        );
    }

    #[test]
    fn adf_flattens_to_lines() {
        let doc = json!({
            "type": "doc",
            "content": [
                { "type": "paragraph", "content": [
                    { "type": "text", "text": "First " },
                    { "type": "text", "text": "line" }
                ]},
                { "type": "paragraph", "content": [] },
                { "type": "bulletList", "content": [
                    { "type": "listItem", "content": [
                        { "type": "paragraph", "content": [{ "type": "text", "text": "item" }] }
                    ]}
                ]}
            ]
        });
        assert_eq!(flatten_description(&doc).as_deref(), Some("First line\nitem"));
        assert_eq!(flatten_description(&json!(null)), None);
        assert_eq!(flatten_description(&json!("  plain ")).as_deref(), Some("plain"));
    }

    #[test]
    fn adf_round_trip_through_flatten() {
        let doc = text_to_adf("one\n\ntwo");
        assert_eq!(flatten_description(&doc).as_deref(), Some("one\ntwo"));
    }

    #[test]
    fn payload_includes_optional_fields() {
        let payload = create_issue_payload(&NewIssue {
            project: "WEB".into(),
            summary: "Add cache".into(),
            description: String::new(),
            issue_type: "Task".into(),
            assignee_account_id: Some("abc".into()),
        });
        assert_eq!(payload["fields"]["project"]["key"], "WEB");
        assert_eq!(payload["fields"]["assignee"]["accountId"], "abc");
        assert!(payload["fields"].get("description").is_none());
    }
}

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use sprintboard_client::{ApiAuth, ApiClient, AssignSprintRequest, Error, PlanningApi};
use sprintboard_core::models::{BacklogFilter, IssueType, SprintDraft, SprintStatus};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Default)]
struct Recorded {
    assignments: Vec<AssignSprintRequest>,
    backlog_queries: Vec<HashMap<String, String>>,
    started: Vec<String>,
}

type Shared = Arc<Mutex<Recorded>>;

fn issue(id: &str, issue_type: &str, sprint: Option<&str>) -> Value {
    json!({
        "id": id,
        "key": format!("PM-{}", id),
        "title": format!("Issue {}", id),
        "type": issue_type,
        "priority": "MEDIUM",
        "sprintId": sprint,
    })
}

async fn list_sprints(Path(project): Path<String>) -> Json<Value> {
    assert_eq!(project, "p1");
    Json(json!([{
        "id": "s1",
        "name": "Sprint 1",
        "startDate": "2026-03-02",
        "endDate": "2026-03-13",
        "status": "ACTIVE",
        "capacity": 20,
        "issues": [issue("3", "TASK", Some("s1"))],
    }]))
}

async fn list_backlog(
    State(state): State<Shared>,
    Path(_project): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let wanted = params.get("type").cloned();
    state.lock().unwrap().backlog_queries.push(params);

    let all = vec![issue("1", "BUG", None), issue("2", "STORY", None)];
    let filtered: Vec<Value> = all
        .into_iter()
        .filter(|i| wanted.as_deref().map_or(true, |t| i["type"] == t))
        .collect();
    Json(Value::Array(filtered))
}

async fn assign(State(state): State<Shared>, Json(body): Json<AssignSprintRequest>) -> StatusCode {
    state.lock().unwrap().assignments.push(body);
    StatusCode::NO_CONTENT
}

async fn start(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> StatusCode {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer secret") {
        return StatusCode::UNAUTHORIZED;
    }
    if id == "missing" {
        return StatusCode::NOT_FOUND;
    }
    state.lock().unwrap().started.push(id);
    StatusCode::OK
}

async fn delete_issue(Path(_id): Path<String>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"message": "database unavailable"})),
    )
}

async fn create_sprint(Path(_project): Path<String>, Json(draft): Json<Value>) -> Json<Value> {
    let mut sprint = draft;
    sprint["id"] = json!("s-new");
    sprint["status"] = json!("PLANNED");
    Json(sprint)
}

async fn spawn_backend() -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(Recorded::default()));
    let app = Router::new()
        .route("/api/projects/{project}/sprints", get(list_sprints).post(create_sprint))
        .route("/api/projects/{project}/backlog", get(list_backlog))
        .route("/api/issues/sprint", put(assign))
        .route("/api/sprints/{id}/start", post(start))
        .route("/api/issues/{id}", delete(delete_issue))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), state)
}

fn client(base: &str) -> ApiClient {
    ApiClient::new(
        base,
        Some(ApiAuth::new("secret".to_string())),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_list_sprints_with_embedded_issues() {
    let (base, _state) = spawn_backend().await;
    let sprints = client(&base).list_sprints("p1").await.unwrap();

    assert_eq!(sprints.len(), 1);
    assert_eq!(sprints[0].status, SprintStatus::Active);
    assert_eq!(sprints[0].issues[0].id, "3");
}

#[tokio::test]
async fn test_backlog_filter_sent_as_query() {
    let (base, state) = spawn_backend().await;
    let filter = BacklogFilter {
        search: Some("login".to_string()),
        issue_type: Some(IssueType::Story),
        priority: None,
    };

    let issues = client(&base).list_backlog("p1", &filter).await.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].id, "2");

    let recorded = state.lock().unwrap();
    let query = &recorded.backlog_queries[0];
    assert_eq!(query.get("search").map(String::as_str), Some("login"));
    assert_eq!(query.get("type").map(String::as_str), Some("STORY"));
    assert!(!query.contains_key("priority"));
}

#[tokio::test]
async fn test_backlog_fetch_is_repeatable() {
    let (base, _state) = spawn_backend().await;
    let client = client(&base);
    let filter = BacklogFilter::default();

    let first = client.list_backlog("p1", &filter).await.unwrap();
    let second = client.list_backlog("p1", &filter).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_assign_sprint_and_backlog() {
    let (base, state) = spawn_backend().await;
    let client = client(&base);

    client
        .assign_sprint(Some("s1"), &["1".to_string()])
        .await
        .unwrap();
    client.assign_sprint(None, &["1".to_string()]).await.unwrap();

    let recorded = state.lock().unwrap();
    assert_eq!(recorded.assignments.len(), 2);
    assert_eq!(recorded.assignments[0].sprint_id.as_deref(), Some("s1"));
    assert_eq!(recorded.assignments[1].sprint_id, None);
    assert_eq!(recorded.assignments[1].issue_ids, vec!["1".to_string()]);
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let (base, state) = spawn_backend().await;

    client(&base).start_sprint("s1").await.unwrap();
    assert_eq!(state.lock().unwrap().started, vec!["s1".to_string()]);

    let err = client(&base).start_sprint("missing").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let anonymous = ApiClient::new(&base, None, Duration::from_secs(5)).unwrap();
    let err = anonymous.start_sprint("s1").await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));

    let err = client(&base).delete_issue("1").await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_create_sprint_validates_before_sending() {
    let (base, _state) = spawn_backend().await;
    let client = client(&base);
    let date = |d| chrono::NaiveDate::from_ymd_opt(2026, 4, d).unwrap();

    let bad = SprintDraft {
        name: " ".to_string(),
        start_date: date(1),
        end_date: date(14),
        capacity: None,
        goal: None,
    };
    assert!(matches!(
        client.create_sprint("p1", &bad).await.unwrap_err(),
        Error::Core(_)
    ));

    let good = SprintDraft {
        name: "Sprint 2".to_string(),
        ..bad
    };
    let sprint = client.create_sprint("p1", &good).await.unwrap();
    assert_eq!(sprint.id, "s-new");
    assert_eq!(sprint.status, SprintStatus::Planned);
}

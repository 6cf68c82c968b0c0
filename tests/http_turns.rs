//! Integration tests for the interview REST API.
//!
//! Each test spins up an Axum server on a random port backed by a temporary
//! templates directory and a JSON file store, then drives it over HTTP.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::time::timeout;

use interview_bot::interview::{
    CatalogHandle, InterviewRouteState, NavigationEngine, SessionManager, TemplateCatalog,
    interview_routes,
};
use interview_bot::store::JsonFileStore;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const EXIT_SURVEY: &str = r#"{
    "TemplateName": "Exit Survey",
    "Sections": [
        {
            "SectionName": "Basics",
            "Questions": [
                { "Id": "q1", "QuestionText": "Role?", "ResponseType": "FreeText", "Options": [] },
                { "Id": "q2", "QuestionText": "Tenure?", "ResponseType": "FreeText", "Options": [] }
            ]
        }
    ]
}"#;

const ONBOARDING: &str = r#"{
    "TemplateName": "Onboarding",
    "Sections": [
        {
            "SectionName": "Setup",
            "Questions": [
                { "Id": "laptop", "QuestionText": "Laptop?", "ResponseType": "SingleSelect", "Options": ["Mac", "Linux"] }
            ]
        },
        {
            "SectionName": "Team",
            "Questions": [
                { "Id": "buddy", "QuestionText": "Buddy assigned?" }
            ]
        }
    ]
}"#;

struct TestServer {
    port: u16,
    templates: TempDir,
    responses: TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }
}

fn write_template(dir: &Path, file: &str, body: &str) {
    std::fs::write(dir.join(file), body).unwrap();
}

/// Start an Axum server on a random port with the two sample templates.
async fn start_server() -> TestServer {
    let templates = TempDir::new().unwrap();
    let responses = TempDir::new().unwrap();
    write_template(templates.path(), "exit_survey.json", EXIT_SURVEY);
    write_template(templates.path(), "onboarding.json", ONBOARDING);

    let load = TemplateCatalog::load_dir(templates.path()).await.unwrap();
    assert!(load.rejected.is_empty());

    let store = Arc::new(JsonFileStore::new(responses.path()));
    let engine = Arc::new(NavigationEngine::new(CatalogHandle::new(load.catalog), store));
    let app = interview_routes(InterviewRouteState {
        sessions: Arc::new(SessionManager::new(engine)),
        templates_dir: Some(templates.path().to_path_buf()),
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        port,
        templates,
        responses,
    }
}

async fn send(client: &reqwest::Client, server: &TestServer, key: &str, text: &str) -> Value {
    let resp = client
        .post(server.url("/api/messages"))
        .json(&json!({ "session_key": key, "text": text }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn rest_health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let resp = reqwest::get(server.url("/health")).await.unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "interview-bot");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn exit_survey_over_http_persists_document() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let client = reqwest::Client::new();

        let p = send(&client, &server, "user-1", "Exit Survey").await;
        assert_eq!(p["title"], "Role?");
        assert_eq!(p["subtitle"], "Basics");
        assert_eq!(p["options"], json!([]));

        let p = send(&client, &server, "user-1", "Engineer").await;
        assert_eq!(p["title"], "Tenure?");

        let p = send(&client, &server, "user-1", "3 years").await;
        assert_eq!(p["title"], "Thank you! Your responses have been recorded.");

        let on_disk: Value = serde_json::from_str(
            &std::fs::read_to_string(server.responses.path().join("Exit Survey.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(
            on_disk,
            json!({
                "TemplateName": "Exit Survey",
                "SectionResponses": [{
                    "SectionName": "Basics",
                    "QuestionResponses": [
                        { "Id": "q1", "Response": "Engineer" },
                        { "Id": "q2", "Response": "3 years" }
                    ]
                }]
            })
        );

        let raw = client
            .get(server.url("/api/responses/Exit%20Survey?format=row"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(
            raw,
            r#"{"TemplateName":"Exit Survey","Basics-q1":"Engineer","Basics-q2":"3 years"}"#
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unknown_template_lists_names() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let client = reqwest::Client::new();

        let p = send(&client, &server, "user-2", "Unknown Template").await;
        assert_eq!(p["title"], "Please select a template");
        assert_eq!(p["options"], json!(["Exit Survey", "Onboarding"]));

        let snap: Value = client
            .get(server.url("/api/sessions/user-2"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(snap["phase"], "idle");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn missing_session_key_returns_400() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(server.url("/api/messages"))
            .json(&json!({ "text": "Exit Survey" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("session key"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn session_snapshot_follows_sections() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let client = reqwest::Client::new();

        let p = send(&client, &server, "user-3", "Onboarding").await;
        assert_eq!(p["title"], "Laptop?");
        assert_eq!(p["options"], json!(["Mac", "Linux"]));

        let p = send(&client, &server, "user-3", "Linux").await;
        assert_eq!(p["title"], "Buddy assigned?");
        assert_eq!(p["subtitle"], "Team");

        let snap: Value = client
            .get(server.url("/api/sessions/user-3"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(snap["phase"], "section_active");
        assert_eq!(snap["template_name"], "Onboarding");
        assert_eq!(snap["section_index"], 1);
        assert_eq!(snap["question_index"], 0);

        let resp = client
            .delete(server.url("/api/sessions/user-3"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);

        let resp = client
            .get(server.url("/api/sessions/user-3"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn templates_list_and_reload() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let client = reqwest::Client::new();

        let body: Value = client
            .get(server.url("/api/templates"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["templates"], json!(["Exit Survey", "Onboarding"]));

        let resp = client
            .get(server.url("/api/templates/Nope"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        write_template(
            server.templates.path(),
            "pulse.json",
            r#"{"TemplateName": "Pulse", "Sections": [{"SectionName": "Mood", "Questions": [{"Id": "m", "QuestionText": "How are you?"}]}]}"#,
        );
        write_template(server.templates.path(), "broken.json", "{ not json");

        let body: Value = client
            .post(server.url("/api/templates/reload"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["templates"], json!(["Exit Survey", "Onboarding", "Pulse"]));
        assert_eq!(body["rejected"].as_array().unwrap().len(), 1);

        let template: Value = client
            .get(server.url("/api/templates/Pulse"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(template["Sections"][0]["SectionName"], "Mood");
    })
    .await
    .expect("test timed out");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sessions_finishing_one_template_together_both_persist() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let client = reqwest::Client::new();

        let keys: Vec<String> = (0..6).map(|i| format!("leaver-{i}")).collect();
        for key in &keys {
            send(&client, &server, key, "Exit Survey").await;
            send(&client, &server, key, "Engineer").await;
        }

        let finals = keys.iter().map(|key| {
            let client = client.clone();
            let url = server.url("/api/messages");
            let body = json!({ "session_key": key, "text": format!("{key} tenure") });
            async move { client.post(url).json(&body).send().await.unwrap().status() }
        });
        for status in futures::future::join_all(finals).await {
            assert_eq!(status, 200);
        }

        for key in &keys {
            let snap: Value = client
                .get(server.url(&format!("/api/sessions/{key}")))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            assert_eq!(snap["phase"], "idle");
        }

        let stored: Value = client
            .get(server.url("/api/responses/Exit%20Survey"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let tenure = stored["SectionResponses"][0]["QuestionResponses"][1]["Response"]
            .as_str()
            .unwrap();
        assert!(tenure.starts_with("leaver-") && tenure.ends_with(" tenure"));
    })
    .await
    .expect("test timed out");
}

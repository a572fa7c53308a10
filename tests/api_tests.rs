// tests/api_tests.rs

use std::{collections::HashMap, sync::Arc};

use exam_server::{
    client::{ApiClient, HttpGrader},
    config::Config,
    db, routes,
    services::question_bank::QuestionBank,
    session,
    state::AppState,
    store::SqliteCredentialStore,
    utils::jwt::{Claims, sign_claims},
};
use serde_json::{Value, json};

const SECRET: &str = "test_secret_for_integration_tests";

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // 1. Fresh in-memory credential store per test
    let pool = db::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    // 2. Create test configuration and state
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: SECRET.to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        time_limit_minutes: 30,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        rust_log: "error".to_string(),
        log_dir: "logs".to_string(),
    };

    let state = AppState {
        store: SqliteCredentialStore::shared(pool),
        bank: Arc::new(QuestionBank::builtin()),
        config,
    };

    // 3. Create the router with the app state
    let app = routes::create_router(state);

    // 4. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 5. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn unique_email() -> String {
    format!("u_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8])
}

/// Registers a fresh user and returns its token.
async fn register_user(client: &reqwest::Client, address: &str) -> String {
    let response = client
        .post(format!("{}/auth/register", address))
        .json(&json!({
            "name": "Test User",
            "email": unique_email(),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    body["token"].as_str().expect("Token not found").to_string()
}

#[tokio::test]
async fn unknown_path_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_works() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    let response = client
        .post(format!("{}/auth/register", address))
        .json(&json!({
            "name": "  Ada  ",
            "email": email.to_uppercase(),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["name"], "Ada");
    assert_eq!(body["user"]["email"], email);
    assert!(body["user"]["id"].as_str().is_some());
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn register_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let cases = [
        json!({"name": "", "email": "a@b.com", "password": "pw12345"}),
        json!({"name": "Al", "email": "a@b.com", "password": "short"}),
        json!({"email": "a@b.com", "password": "pw12345"}),
        json!({"name": "Al", "email": "not-an-email", "password": "pw12345"}),
        json!({"name": 5, "email": "a@b.com", "password": "pw12345"}),
    ];

    for payload in cases {
        let response = client
            .post(format!("{}/auth/register", address))
            .json(&payload)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 400, "payload: {}", payload);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].is_string(), "payload: {}", payload);
    }

    // No JSON content type at all.
    let response = client
        .post(format!("{}/auth/register", address))
        .body(r#"{"name":"Al","email":"a@b.com","password":"pw12345"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn register_duplicate_email_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    for (expected, candidate) in [(201, email.clone()), (400, email.to_uppercase())] {
        let response = client
            .post(format!("{}/auth/register", address))
            .json(&json!({"name": "Al", "email": candidate, "password": "pw12345"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), expected);
        if expected == 400 {
            let body: Value = response.json().await.unwrap();
            assert_eq!(body["error"], "User already exists with this email");
        }
    }
}

#[tokio::test]
async fn login_failures_look_the_same() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    client
        .post(format!("{}/auth/register", address))
        .json(&json!({"name": "Al", "email": email, "password": "pw12345"}))
        .send()
        .await
        .unwrap();

    let ok = client
        .post(format!("{}/auth/login", address))
        .json(&json!({"email": email, "password": "pw12345"}))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status().as_u16(), 200);
    let body: Value = ok.json().await.unwrap();
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["email"], email);

    let wrong_password = client
        .post(format!("{}/auth/login", address))
        .json(&json!({"email": email, "password": "wrong-password"}))
        .send()
        .await
        .unwrap();
    let unknown_email = client
        .post(format!("{}/auth/login", address))
        .json(&json!({"email": unique_email(), "password": "pw12345"}))
        .send()
        .await
        .unwrap();

    assert_eq!(wrong_password.status().as_u16(), 401);
    assert_eq!(unknown_email.status().as_u16(), 401);
    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_email.json().await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn verify_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_user(&client, &address).await;

    let response = client
        .get(format!("{}/auth/verify", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Test User");
    assert!(body["userId"].as_str().is_some());
    assert!(body["email"].as_str().is_some());

    let missing = client
        .get(format!("{}/auth/verify", address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 401);

    let garbage = client
        .get(format!("{}/auth/verify", address))
        .bearer_auth("not.a.token")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status().as_u16(), 401);
}

#[tokio::test]
async fn expired_or_orphaned_tokens_are_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let now = chrono::Utc::now().timestamp() as u64;

    let expired = sign_claims(
        &Claims {
            sub: "1".into(),
            email: "a@b.com".into(),
            iat: now - 90_000,
            exp: now - 3_600,
        },
        SECRET,
    )
    .unwrap();

    // Valid signature, but no such user.
    let orphaned = sign_claims(
        &Claims {
            sub: "4242".into(),
            email: "ghost@b.com".into(),
            iat: now,
            exp: now + 600,
        },
        SECRET,
    )
    .unwrap();

    for token in [&expired, &orphaned] {
        let response = client
            .get(format!("{}/auth/verify", address))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401);
    }

    let response = client
        .get(format!("{}/exam/questions", address))
        .bearer_auth(&expired)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn questions_require_auth() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/exam/questions", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .post(format!("{}/exam/submit", address))
        .json(&json!({"answers": {}, "questions": [{"id": 1}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn questions_are_served_without_answers() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_user(&client, &address).await;

    let response = client
        .get(format!("{}/exam/questions", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["totalQuestions"], 20);
    assert_eq!(body["timeLimit"], 30);

    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 20);
    let mut ids: Vec<u64> = questions.iter().map(|q| q["id"].as_u64().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=20).collect::<Vec<u64>>());

    for q in questions {
        assert!(q.get("correctAnswer").is_none());
        assert_eq!(q["options"].as_array().unwrap().len(), 4);
    }
}

#[tokio::test]
async fn submit_scores_against_the_bank() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_user(&client, &address).await;
    let bank = QuestionBank::builtin();

    let body: Value = client
        .get(format!("{}/exam/questions", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let questions = body["questions"].as_array().unwrap().clone();

    // Answer positions 0, 2 and 4 correctly, leave the rest blank.
    let mut answers = HashMap::new();
    for position in [0usize, 2, 4] {
        let id = questions[position]["id"].as_u64().unwrap() as u32;
        answers.insert(position, bank.get(id).unwrap().correct_option);
    }

    let response = client
        .post(format!("{}/exam/submit", address))
        .bearer_auth(&token)
        .json(&json!({"answers": answers, "questions": questions}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let result: Value = response.json().await.unwrap();
    assert_eq!(result["score"], 3);
    assert_eq!(result["totalQuestions"], 20);
    assert_eq!(result["percentage"], 15);
    assert_eq!(result["correctAnswers"], json!([0, 2, 4]));
    assert_eq!(result["userAnswers"].as_object().unwrap().len(), 3);
    assert!(result["submittedAt"].as_str().is_some());

    // The result reveals the answer key, in snapshot order.
    let returned = result["questions"].as_array().unwrap();
    assert_eq!(returned.len(), 20);
    assert_eq!(returned[0]["id"], questions[0]["id"]);
    assert!(returned[0]["correctAnswer"].as_u64().is_some());
}

#[tokio::test]
async fn submit_rejects_bad_payloads() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_user(&client, &address).await;

    let cases = [
        json!({"questions": [{"id": 1}]}),
        json!({"answers": {"0": 1}}),
        json!({"answers": {}, "questions": []}),
        json!({"answers": {"3": 1}, "questions": [{"id": 1}, {"id": 2}]}),
        json!({"answers": {}, "questions": [{"id": 999}]}),
        json!({"answers": {"0": "a"}, "questions": [{"id": 1}]}),
        json!({"answers": {"0": 300}, "questions": [{"id": 1}]}),
        json!({"answers": {}, "questions": [{"question": "x"}]}),
    ];

    for payload in cases {
        let response = client
            .post(format!("{}/exam/submit", address))
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400, "payload: {}", payload);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].is_string(), "payload: {}", payload);
    }
}

#[tokio::test]
async fn terminal_client_flow_times_out_and_submits() {
    let address = spawn_app().await;

    let mut client = ApiClient::new(&address);
    let auth = client
        .register("Grace", &unique_email(), "pw12345")
        .await
        .unwrap();
    let identity = client.verify().await.unwrap();
    assert_eq!(identity.user_id, auth.user.id);

    let exam = client.fetch_questions().await.unwrap();
    let grader = Arc::new(HttpGrader::new(client.clone()));

    // One-second countdown: the timeout submits without a manual call.
    let mut handle = session::spawn(exam.questions.clone(), 1, grader).unwrap();
    handle.select_answer(0).await.unwrap();

    let result = handle.outcome().await.unwrap();
    assert_eq!(result.total_questions, 20);
    assert!(result.score <= 1);
    assert_eq!(result.user_answers.len(), 1);
    assert!(!handle.submit().await);
}

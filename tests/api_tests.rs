// tests/api_tests.rs

use std::{sync::Arc, time::Duration};

use autotech_quiz::{
    config::{Config, QuizSettings},
    models::question::{Question, QuestionType},
    routes,
    state::AppState,
    store::MemoryStore,
    utils::jwt::{Role, sign_jwt},
};
use serde_json::{Value, json};
use uuid::Uuid;

const SECRET: &str = "test_secret_for_integration_tests";

struct TestApp {
    address: String,
    store: Arc<MemoryStore>,
    client: reqwest::Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

fn token(user_id: Uuid, role: Role) -> String {
    sign_jwt(user_id, Some("someone@autotech.test"), role, SECRET, 600).unwrap()
}

/// Helper function to spawn the app on a random port for testing.
/// Answers stay on screen for 50 ms so flows finish quickly.
async fn spawn_app() -> TestApp {
    let config = Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: SECRET.to_string(),
        jwt_audience: None,
        rust_log: "error".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        quiz: QuizSettings {
            answer_delay: Duration::from_millis(50),
            auto_submit_on_timeout: false,
        },
    };

    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), config);
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    }
}

/// Adds a category with free-text questions and returns its id.
async fn seed_category(app: &TestApp, name: &str, answers: &[&str]) -> Uuid {
    let category = app.store.add_category(name).await;
    for (i, answer) in answers.iter().enumerate() {
        app.store
            .add_question(Question {
                id: Uuid::new_v4(),
                category_id: category.id,
                question: format!("{} question {}", name, i),
                question_type: QuestionType::FreeText,
                options: vec![],
                correct_answer: answer.to_string(),
                time_limit: 30,
                points: 10,
            })
            .await;
    }
    category.id
}

async fn publish(app: &TestApp, admin: &str, student_id: Uuid, category_id: Uuid) {
    let response = app
        .client
        .put(app.url(&format!(
            "/api/admin/students/{}/categories/{}",
            student_id, category_id
        )))
        .bearer_auth(admin)
        .json(&json!({ "published": true }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
}

async fn start_quiz(app: &TestApp, student: &str, category_id: Uuid) -> reqwest::Response {
    app.client
        .post(app.url("/api/quiz/sessions"))
        .bearer_auth(student)
        .json(&json!({ "category_id": category_id }))
        .send()
        .await
        .expect("Failed to execute request")
}

/// Polls the session until its phase reaches `state`.
async fn wait_for_state(app: &TestApp, student: &str, session_id: &str, state: &str) -> Value {
    for _ in 0..100 {
        let view: Value = app
            .client
            .get(app.url(&format!("/api/quiz/sessions/{}", session_id)))
            .bearer_auth(student)
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .unwrap();
        if view["phase"]["state"] == state {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("session {} never reached {}", session_id, state);
}

#[tokio::test]
async fn unknown_path_returns_404() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn missing_token_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/categories"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let app = spawn_app().await;
    let forged = sign_jwt(Uuid::new_v4(), None, Role::Admin, "not_the_secret", 600).unwrap();

    let response = app
        .client
        .get(app.url("/api/categories"))
        .bearer_auth(forged)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn student_cannot_reach_admin_routes() {
    let app = spawn_app().await;
    let student = token(Uuid::new_v4(), Role::Student);

    let response = app
        .client
        .get(app.url("/api/admin/stats"))
        .bearer_auth(&student)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn students_only_see_published_categories() {
    // Arrange
    let app = spawn_app().await;
    let admin = token(Uuid::new_v4(), Role::Admin);
    let student_id = Uuid::new_v4();
    let student = token(student_id, Role::Student);
    let brakes = seed_category(&app, "Brakes", &["disc"]).await;
    let engines = seed_category(&app, "Engines", &["piston"]).await;
    publish(&app, &admin, student_id, brakes).await;

    // Act
    let categories: Vec<Value> = app
        .client
        .get(app.url("/api/categories"))
        .bearer_auth(&student)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["name"], "Brakes");

    let response = start_quiz(&app, &student, engines).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn full_quiz_flow_records_answers_and_statistics() {
    // Arrange
    let app = spawn_app().await;
    let admin = token(Uuid::new_v4(), Role::Admin);
    let student_id = Uuid::new_v4();
    let student = token(student_id, Role::Student);
    let category_id = seed_category(&app, "Electrics", &["ohm", "volt"]).await;
    publish(&app, &admin, student_id, category_id).await;

    // Act: start
    let response = start_quiz(&app, &student, category_id).await;
    assert_eq!(response.status().as_u16(), 201);
    let view: Value = response.json().await.unwrap();
    let session_id = view["session_id"].as_str().unwrap().to_string();
    assert_eq!(view["phase"]["state"], "presenting");
    assert_eq!(view["total_questions"], 2);
    assert!(view["question"].get("correct_answer").is_none());

    // Act: first answer, with a duplicate right behind it
    let answer_url = app.url(&format!("/api/quiz/sessions/{}/answers", session_id));
    let first: Value = app
        .client
        .post(&answer_url)
        .bearer_auth(&student)
        .json(&json!({ "answer": " OHM " }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    assert_eq!(first["outcome"], "evaluated");
    assert_eq!(first["is_correct"], true);
    assert_eq!(first["save"]["status"], "saved");

    let duplicate: Value = app
        .client
        .post(&answer_url)
        .bearer_auth(&student)
        .json(&json!({ "answer": "ohm" }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    assert_eq!(duplicate["outcome"], "ignored");

    // Act: second answer, wrong
    let view = wait_for_state(&app, &student, &session_id, "presenting").await;
    assert_eq!(view["phase"]["index"], 1);
    let second: Value = app
        .client
        .post(&answer_url)
        .bearer_auth(&student)
        .json(&json!({ "answer": "amp" }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    assert_eq!(second["is_correct"], false);
    assert_eq!(second["correct_answer"], "volt");

    // Assert
    let view = wait_for_state(&app, &student, &session_id, "finished").await;
    assert_eq!(view["results"]["correct_answers"], 1);
    assert_eq!(view["results"]["accuracy_percentage"], 50.0);
    assert_eq!(view["results"]["unsaved_answers"], 0);
    assert_eq!(app.store.answers().await.len(), 2);

    let stats: Value = app
        .client
        .get(app.url("/api/stats/me"))
        .bearer_auth(&student)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_answered"], 2);
    assert_eq!(stats["correct_answers"], 1);
    assert_eq!(stats["by_category"]["Electrics"]["accuracy_percentage"], 50.0);

    let dashboard: Value = app
        .client
        .get(app.url("/api/dashboard"))
        .bearer_auth(&student)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    assert_eq!(dashboard["categories"].as_array().unwrap().len(), 1);
    assert_eq!(dashboard["statistics"]["total_answered"], 2);
}

#[tokio::test]
async fn empty_category_returns_an_empty_session() {
    let app = spawn_app().await;
    let admin = token(Uuid::new_v4(), Role::Admin);
    let student_id = Uuid::new_v4();
    let student = token(student_id, Role::Student);
    let category_id = seed_category(&app, "Gearboxes", &[]).await;
    publish(&app, &admin, student_id, category_id).await;

    let response = start_quiz(&app, &student, category_id).await;
    assert_eq!(response.status().as_u16(), 201);
    let view: Value = response.json().await.unwrap();
    assert_eq!(view["phase"]["state"], "empty");
    assert!(view["question"].is_null());

    // Empty sessions are not kept
    let response = app
        .client
        .get(app.url(&format!("/api/quiz/sessions/{}", view["session_id"].as_str().unwrap())))
        .bearer_auth(&student)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn exited_session_is_gone() {
    let app = spawn_app().await;
    let admin = token(Uuid::new_v4(), Role::Admin);
    let student_id = Uuid::new_v4();
    let student = token(student_id, Role::Student);
    let category_id = seed_category(&app, "Tyres", &["tread"]).await;
    publish(&app, &admin, student_id, category_id).await;

    let view: Value = start_quiz(&app, &student, category_id).await.json().await.unwrap();
    let session_url = app.url(&format!(
        "/api/quiz/sessions/{}",
        view["session_id"].as_str().unwrap()
    ));

    // Another student cannot see it
    let stranger = token(Uuid::new_v4(), Role::Student);
    let response = app
        .client
        .get(&session_url)
        .bearer_auth(&stranger)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);

    let response = app
        .client
        .delete(&session_url)
        .bearer_auth(&student)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .client
        .get(&session_url)
        .bearer_auth(&student)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
    assert!(app.store.answers().await.is_empty());
}

#[tokio::test]
async fn admin_creates_questions_with_validation() {
    let app = spawn_app().await;
    let admin = token(Uuid::new_v4(), Role::Admin);
    let category_id = seed_category(&app, "Suspension", &[]).await;

    // Act: answer is not one of the options
    let response = app
        .client
        .post(app.url("/api/admin/questions"))
        .bearer_auth(&admin)
        .json(&json!({
            "category_id": category_id,
            "question": "Which part dampens oscillation?",
            "type": "multipleChoice",
            "options": ["Spring", "Shock absorber"],
            "correct_answer": "Anti-roll bar",
            "time_limit": 30,
            "points": 10
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);

    // Act: valid question with markup to strip
    let response = app
        .client
        .post(app.url("/api/admin/questions"))
        .bearer_auth(&admin)
        .json(&json!({
            "category_id": category_id,
            "question": "<b>Which part</b> dampens oscillation?<script>alert(1)</script>",
            "type": "multipleChoice",
            "options": ["Spring", "Shock absorber"],
            "correct_answer": "Shock absorber",
            "time_limit": 30,
            "points": 10
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 201);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["question"], "<b>Which part</b> dampens oscillation?");
}

#[tokio::test]
async fn admin_resets_student_answers() {
    let app = spawn_app().await;
    let admin = token(Uuid::new_v4(), Role::Admin);
    let student_id = Uuid::new_v4();
    let student = token(student_id, Role::Student);
    let category_id = seed_category(&app, "Cooling", &["radiator"]).await;
    publish(&app, &admin, student_id, category_id).await;

    let view: Value = start_quiz(&app, &student, category_id).await.json().await.unwrap();
    let session_id = view["session_id"].as_str().unwrap().to_string();
    app.client
        .post(app.url(&format!("/api/quiz/sessions/{}/answers", session_id)))
        .bearer_auth(&student)
        .json(&json!({ "answer": "radiator" }))
        .send()
        .await
        .expect("Failed to execute request");

    let overview: Value = app
        .client
        .get(app.url("/api/admin/stats"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    assert_eq!(overview["students"], 1);
    assert_eq!(overview["total_answered"], 1);

    let deleted: Value = app
        .client
        .delete(app.url(&format!("/api/admin/students/{}/answers", student_id)))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    assert_eq!(deleted["deleted"], 1);

    let stats: Value = app
        .client
        .get(app.url(&format!("/api/admin/students/{}/stats", student_id)))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_answered"], 0);
    assert_eq!(stats["accuracy_percentage"], 0.0);
}

#[tokio::test]
async fn self_assigned_metadata_role_does_not_grant_admin() {
    // Arrange: a student who set `role: admin` on their own profile
    let app = spawn_app().await;
    let claims = json!({
        "sub": Uuid::new_v4().to_string(),
        "role": "authenticated",
        "exp": 4_102_444_800u64,
        "user_metadata": { "role": "admin" }
    });
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    // Act
    let response = app
        .client
        .delete(app.url(&format!("/api/admin/students/{}/answers", Uuid::new_v4())))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 403);
}

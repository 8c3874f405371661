// tests/quiz_tests.rs

mod common;

use common::{TestApp, spawn_app, unique_email};
use serde_json::{Value, json};

/// A quiz whose questions are "Q1".."Qn", each worth `points`, with the
/// correct option "right" and the wrong option "wrong".
fn quiz_body(specialization_id: i64, questions: usize, points: i64, passing_score: f64) -> Value {
    let questions: Vec<Value> = (1..=questions)
        .map(|i| {
            json!({
                "question_text": format!("Q{}", i),
                "question_type": "multiple_choice",
                "points": points,
                "options": [
                    {"option_text": "wrong", "is_correct": false},
                    {"option_text": "right", "is_correct": true}
                ]
            })
        })
        .collect();

    json!({
        "title": "Backend Basics",
        "description": "HTTP, SQL and friends",
        "specialization_id": specialization_id,
        "difficulty_level": 2,
        "passing_score": passing_score,
        "questions": questions
    })
}

struct QuizFixture {
    quiz_id: i64,
    question_ids: Vec<i64>,
    user_id: i64,
}

async fn setup_quiz(app: &TestApp, questions: usize, points: i64, passing_score: f64) -> QuizFixture {
    let token = app.admin_token().await;
    let (_, _, specialization_id) = app.seed_taxonomy(&token, "Technology").await;
    let quiz_id = app
        .admin_create(
            &token,
            "/api/admin/quizzes",
            quiz_body(specialization_id, questions, points, passing_score),
        )
        .await;

    let quiz: Value = app
        .get(&format!("/api/quizzes/{}", quiz_id))
        .await
        .json()
        .await
        .unwrap();
    let question_ids = quiz["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect();

    let user_id = app.register(&unique_email(), "password123").await;

    QuizFixture {
        quiz_id,
        question_ids,
        user_id,
    }
}

async fn start_attempt(app: &TestApp, quiz_id: i64, user_id: i64) -> i64 {
    let response = app
        .post(
            &format!("/api/quizzes/{}/start", quiz_id),
            &json!({"user_id": user_id}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["quiz_id"], quiz_id);
    body["attempt_id"].as_i64().unwrap()
}

async fn submit(app: &TestApp, attempt_id: i64, answers: Vec<(i64, &str)>) -> reqwest::Response {
    let answers: Vec<Value> = answers
        .into_iter()
        .map(|(question_id, selected)| json!({"question_id": question_id, "selected_answer": selected}))
        .collect();

    app.post(
        &format!("/api/attempts/{}/submit", attempt_id),
        &json!({"answers": answers}),
    )
    .await
}

#[tokio::test]
async fn quiz_detail_hides_correct_answers() {
    let app = spawn_app().await;
    let fixture = setup_quiz(&app, 2, 1, 70.0).await;

    let response = app.get(&format!("/api/quizzes/{}", fixture.quiz_id)).await;
    assert_eq!(response.status().as_u16(), 200);

    let raw = response.text().await.unwrap();
    assert!(!raw.contains("is_correct"));

    let quiz: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(quiz["question_count"], 2);
    assert_eq!(quiz["passing_score"], 70.0);
    assert_eq!(quiz["questions"][0]["question"], "Q1");
    assert_eq!(quiz["questions"][0]["options"], json!(["wrong", "right"]));
}

#[tokio::test]
async fn quizzes_are_listed_with_counts() {
    let app = spawn_app().await;
    let fixture = setup_quiz(&app, 3, 1, 70.0).await;

    let quizzes: Vec<Value> = app.get("/api/quizzes").await.json().await.unwrap();
    assert_eq!(quizzes.len(), 1);
    assert_eq!(quizzes[0]["id"], fixture.quiz_id);
    assert_eq!(quizzes[0]["question_count"], 3);
    assert_eq!(quizzes[0]["difficulty"], 2);
    assert_eq!(quizzes[0]["specialization_name"], "Backend Development");

    let specialization_id = quizzes[0]["specialization_id"].as_i64().unwrap();
    let by_specialization: Vec<Value> = app
        .get(&format!("/api/specializations/{}/quizzes", specialization_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(by_specialization.len(), 1);
}

#[tokio::test]
async fn all_correct_answers_pass() {
    let app = spawn_app().await;
    let fixture = setup_quiz(&app, 2, 1, 70.0).await;
    let attempt_id = start_attempt(&app, fixture.quiz_id, fixture.user_id).await;

    let response = submit(
        &app,
        attempt_id,
        vec![
            (fixture.question_ids[0], "right"),
            (fixture.question_ids[1], "right"),
        ],
    )
    .await;
    assert_eq!(response.status().as_u16(), 200);

    let result: Value = response.json().await.unwrap();
    assert_eq!(result["attempt_id"], attempt_id);
    assert_eq!(result["score"], 2.0);
    assert_eq!(result["max_score"], 2.0);
    assert_eq!(result["percentage"], 100.0);
    assert_eq!(result["correct_count"], 2);
    assert_eq!(result["total_count"], 2);
    assert_eq!(result["passed"], true);
    assert_eq!(result["message"], "Great job!");
}

#[tokio::test]
async fn sixty_percent_does_not_pass_at_seventy() {
    let app = spawn_app().await;
    let fixture = setup_quiz(&app, 5, 1, 70.0).await;
    let attempt_id = start_attempt(&app, fixture.quiz_id, fixture.user_id).await;

    let ids = &fixture.question_ids;
    let result: Value = submit(
        &app,
        attempt_id,
        vec![
            (ids[0], "right"),
            (ids[1], "right"),
            (ids[2], "right"),
            (ids[3], "wrong"),
            (ids[4], "wrong"),
        ],
    )
    .await
    .json()
    .await
    .unwrap();

    assert_eq!(result["percentage"], 60.0);
    assert_eq!(result["correct_count"], 3);
    assert_eq!(result["passed"], false);
    assert_eq!(result["message"], "Keep practicing!");
}

#[tokio::test]
async fn unknown_question_is_skipped() {
    let app = spawn_app().await;
    let fixture = setup_quiz(&app, 2, 1, 70.0).await;
    let attempt_id = start_attempt(&app, fixture.quiz_id, fixture.user_id).await;

    let response = submit(
        &app,
        attempt_id,
        vec![(fixture.question_ids[0], "right"), (999_999, "right")],
    )
    .await;
    assert_eq!(response.status().as_u16(), 200);

    let result: Value = response.json().await.unwrap();
    assert_eq!(result["total_count"], 1);
    assert_eq!(result["correct_count"], 1);
    assert_eq!(result["percentage"], 100.0);
}

#[tokio::test]
async fn question_from_another_quiz_is_scored_by_its_own_key() {
    let app = spawn_app().await;
    let fixture = setup_quiz(&app, 1, 1, 70.0).await;

    let token = app.admin_token().await;
    let (_, _, other_specialization) = app.seed_taxonomy(&token, "Finance").await;
    let other_quiz = app
        .admin_create(
            &token,
            "/api/admin/quizzes",
            quiz_body(other_specialization, 1, 1, 70.0),
        )
        .await;
    let other: Value = app
        .get(&format!("/api/quizzes/{}", other_quiz))
        .await
        .json()
        .await
        .unwrap();
    let foreign_question = other["questions"][0]["id"].as_i64().unwrap();

    let attempt_id = start_attempt(&app, fixture.quiz_id, fixture.user_id).await;
    let result: Value = submit(
        &app,
        attempt_id,
        vec![(foreign_question, "right"), (fixture.question_ids[0], "wrong")],
    )
    .await
    .json()
    .await
    .unwrap();

    assert_eq!(result["total_count"], 2);
    assert_eq!(result["correct_count"], 1);
    assert_eq!(result["max_score"], 2.0);
    assert_eq!(result["percentage"], 50.0);
    assert_eq!(result["passed"], false);

    let alone: Value = submit(&app, attempt_id, vec![(foreign_question, "right")])
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(alone["total_count"], 1);
    assert_eq!(alone["percentage"], 100.0);
    assert_eq!(alone["passed"], true);
}

#[tokio::test]
async fn empty_submission_scores_zero() {
    let app = spawn_app().await;
    let fixture = setup_quiz(&app, 2, 1, 70.0).await;
    let attempt_id = start_attempt(&app, fixture.quiz_id, fixture.user_id).await;

    let result: Value = submit(&app, attempt_id, vec![]).await.json().await.unwrap();

    assert_eq!(result["score"], 0.0);
    assert_eq!(result["max_score"], 1.0);
    assert_eq!(result["percentage"], 0.0);
    assert_eq!(result["passed"], false);
}

#[tokio::test]
async fn weighted_points_drive_the_percentage() {
    let app = spawn_app().await;
    let fixture = setup_quiz(&app, 2, 3, 50.0).await;
    let attempt_id = start_attempt(&app, fixture.quiz_id, fixture.user_id).await;

    let result: Value = submit(
        &app,
        attempt_id,
        vec![
            (fixture.question_ids[0], "right"),
            (fixture.question_ids[1], "RIGHT"),
        ],
    )
    .await
    .json()
    .await
    .unwrap();

    assert_eq!(result["score"], 3.0);
    assert_eq!(result["max_score"], 6.0);
    assert_eq!(result["percentage"], 50.0);
    assert_eq!(result["passed"], true);
}

#[tokio::test]
async fn submitted_attempt_is_recorded() {
    let app = spawn_app().await;
    let fixture = setup_quiz(&app, 2, 1, 70.0).await;
    let attempt_id = start_attempt(&app, fixture.quiz_id, fixture.user_id).await;

    let before: Value = app
        .get(&format!("/api/attempts/{}", attempt_id))
        .await
        .json()
        .await
        .unwrap();
    assert!(before["completed_at"].is_null());
    assert!(before["percentage"].is_null());

    submit(&app, attempt_id, vec![(fixture.question_ids[0], "right")]).await;

    let after: Value = app
        .get(&format!("/api/attempts/{}", attempt_id))
        .await
        .json()
        .await
        .unwrap();
    assert!(after["completed_at"].is_string());
    assert_eq!(after["percentage"], 100.0);
    assert_eq!(after["is_passed"], true);
    assert_eq!(after["time_taken_minutes"], 0);

    let history: Vec<Value> = app
        .get(&format!("/api/users/{}/attempts", fixture.user_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], attempt_id);
    assert_eq!(history[0]["quiz_title"], "Backend Basics");
}

#[tokio::test]
async fn resubmission_overwrites_the_result() {
    let app = spawn_app().await;
    let fixture = setup_quiz(&app, 1, 1, 70.0).await;
    let attempt_id = start_attempt(&app, fixture.quiz_id, fixture.user_id).await;

    submit(&app, attempt_id, vec![(fixture.question_ids[0], "right")]).await;
    let second: Value = submit(&app, attempt_id, vec![(fixture.question_ids[0], "wrong")])
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(second["passed"], false);

    let attempt: Value = app
        .get(&format!("/api/attempts/{}", attempt_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(attempt["percentage"], 0.0);
    assert_eq!(attempt["is_passed"], false);
}

#[tokio::test]
async fn missing_attempt_user_or_quiz_is_404() {
    let app = spawn_app().await;
    let fixture = setup_quiz(&app, 1, 1, 70.0).await;

    let response = submit(&app, 424_242, vec![]).await;
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Attempt not found");

    assert_eq!(app.get("/api/attempts/424242").await.status().as_u16(), 404);

    let response = app
        .post(
            &format!("/api/quizzes/{}/start", fixture.quiz_id),
            &json!({"user_id": 424_242}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 404);

    let response = app
        .post("/api/quizzes/424242/start", &json!({"user_id": fixture.user_id}))
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn deleted_quiz_is_hidden() {
    let app = spawn_app().await;
    let fixture = setup_quiz(&app, 1, 1, 70.0).await;
    let token = app.admin_token().await;

    let response = app
        .client
        .delete(app.url(&format!("/api/admin/quizzes/{}", fixture.quiz_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let quizzes: Vec<Value> = app.get("/api/quizzes").await.json().await.unwrap();
    assert!(quizzes.is_empty());
    assert_eq!(
        app.get(&format!("/api/quizzes/{}", fixture.quiz_id))
            .await
            .status()
            .as_u16(),
        404
    );
}

#[tokio::test]
async fn invalid_quiz_is_rejected() {
    let app = spawn_app().await;
    let token = app.admin_token().await;
    let (_, _, specialization_id) = app.seed_taxonomy(&token, "Technology").await;

    let mut body = quiz_body(specialization_id, 1, 1, 70.0);
    body["difficulty_level"] = json!(9);
    let response = app.admin_post(&token, "/api/admin/quizzes", &body).await;
    assert_eq!(response.status().as_u16(), 422);

    let mut body = quiz_body(specialization_id, 1, 1, 70.0);
    body["questions"][0]["question_type"] = json!("essay");
    let response = app.admin_post(&token, "/api/admin/quizzes", &body).await;
    assert_eq!(response.status().as_u16(), 422);

    let body = quiz_body(987_654, 1, 1, 70.0);
    let response = app.admin_post(&token, "/api/admin/quizzes", &body).await;
    assert_eq!(response.status().as_u16(), 404);
}

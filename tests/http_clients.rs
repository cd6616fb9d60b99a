//! Integration tests for the HTTP-backed services.
//!
//! Each test spins up an Axum server on a random port standing in for
//! Nominatim, Ollama or Twilio, points the real client at it and checks
//! both the request on the wire and the text the service produces.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use safespace::locator::{NominatimClient, TherapistLocator, no_results_reply, unavailable_reply};
use safespace::llm::OllamaProvider;
use safespace::specialist::{GENERATION_FAILED_REPLY, MentalHealthSpecialist};
use safespace::telephony::{CallRequest, EmergencyDialer, TwilioClient};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Start an Axum server on a random port and return its base URL.
async fn start_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

// ── Nominatim ───────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct GeocoderState {
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    user_agents: Arc<Mutex<Vec<String>>>,
    /// Query prefix → (status, body).
    answers: Arc<HashMap<String, (StatusCode, Value)>>,
}

async fn nominatim_search(
    State(state): State<GeocoderState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let q = params.get("q").cloned().unwrap_or_default();
    state.queries.lock().unwrap().push(params);
    if let Some(agent) = headers.get("user-agent").and_then(|v| v.to_str().ok()) {
        state.user_agents.lock().unwrap().push(agent.to_string());
    }

    let answer = state
        .answers
        .iter()
        .find(|(prefix, _)| q.starts_with(prefix.as_str()))
        .map(|(_, answer)| answer.clone());
    match answer {
        Some((status, body)) => (status, Json(body)),
        None => (StatusCode::OK, Json(json!([]))),
    }
}

async fn start_nominatim(answers: Vec<(&str, StatusCode, Value)>) -> (String, GeocoderState) {
    let state = GeocoderState {
        answers: Arc::new(
            answers
                .into_iter()
                .map(|(prefix, status, body)| (prefix.to_string(), (status, body)))
                .collect(),
        ),
        ..GeocoderState::default()
    };
    let app = Router::new()
        .route("/search", get(nominatim_search))
        .with_state(state.clone());
    (start_server(app).await, state)
}

fn place(display_name: &str) -> Value {
    json!({
        "display_name": display_name,
        "lat": "30.2672",
        "lon": "-97.7431",
        "address": {"road": "Congress Avenue", "city": "Austin", "state": "Texas"}
    })
}

#[tokio::test]
async fn test_nominatim_request_shape() {
    timeout(TEST_TIMEOUT, async {
        let (url, state) = start_nominatim(vec![(
            "therapist",
            StatusCode::OK,
            json!([place("Serenity Counseling, Austin, Texas")]),
        )])
        .await;
        let locator = TherapistLocator::new(Arc::new(NominatimClient::new(&url, "SafeSpaceTest/1.0")));

        let listing = locator.locate("Austin").await;
        assert!(listing.contains("**Serenity Counseling**"));
        assert!(listing.contains("📍 Address: Congress Avenue, Austin, Texas"));

        let queries = state.queries.lock().unwrap();
        // One result never reaches the cap, so all four variants are searched.
        assert_eq!(queries.len(), 4);
        assert_eq!(queries[0]["q"], "therapist Austin");
        assert_eq!(queries[1]["q"], "psychologist Austin");
        assert_eq!(queries[2]["q"], "mental health clinic Austin");
        assert_eq!(queries[3]["q"], "counseling center Austin");
        for q in queries.iter() {
            assert_eq!(q["format"], "json");
            assert_eq!(q["limit"], "3");
            assert_eq!(q["addressdetails"], "1");
            assert_eq!(q["extratags"], "1");
        }
        assert!(state.user_agents.lock().unwrap().iter().all(|ua| ua == "SafeSpaceTest/1.0"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_nominatim_dedup_across_variants() {
    timeout(TEST_TIMEOUT, async {
        let (url, _) = start_nominatim(vec![
            ("therapist", StatusCode::OK, json!([place("Serenity Counseling, Austin")])),
            (
                "psychologist",
                StatusCode::OK,
                json!([place("Serenity Counseling, Austin"), place("Hill Country Psychology, Austin")]),
            ),
        ])
        .await;
        let locator = TherapistLocator::new(Arc::new(NominatimClient::new(&url, "test")));

        let listing = locator.locate("Austin").await;
        assert_eq!(listing.matches("**Serenity Counseling**").count(), 1);
        assert!(listing.contains("**Hill Country Psychology**"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_nominatim_server_error_skips_variant() {
    timeout(TEST_TIMEOUT, async {
        let (url, state) = start_nominatim(vec![
            ("therapist", StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "boom"})),
            ("psychologist", StatusCode::OK, json!([place("Mindful Path Clinic, Austin")])),
        ])
        .await;
        let locator = TherapistLocator::new(Arc::new(NominatimClient::new(&url, "test")));

        let listing = locator.locate("Austin").await;
        assert!(listing.contains("**Mindful Path Clinic**"));
        assert_eq!(state.queries.lock().unwrap().len(), 4);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_nominatim_empty_results() {
    timeout(TEST_TIMEOUT, async {
        let (url, _) = start_nominatim(vec![]).await;
        let locator = TherapistLocator::new(Arc::new(NominatimClient::new(&url, "test")));
        assert_eq!(locator.locate("Nowhere").await, no_results_reply("Nowhere"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_nominatim_unreachable() {
    timeout(TEST_TIMEOUT, async {
        // Bind then drop a listener so the port is closed.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = format!("http://127.0.0.1:{}", port);
        let locator = TherapistLocator::new(Arc::new(NominatimClient::new(&url, "test")));
        assert_eq!(locator.locate("Austin").await, unavailable_reply("Austin"));
    })
    .await
    .expect("test timed out");
}

// ── Ollama ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_specialist_over_ollama() {
    timeout(TEST_TIMEOUT, async {
        let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
        let app = Router::new()
            .route(
                "/api/chat",
                post(|State(seen): State<Arc<Mutex<Option<Value>>>>, Json(body): Json<Value>| async move {
                    *seen.lock().unwrap() = Some(body);
                    Json(json!({
                        "model": "medgemma",
                        "message": {"role": "assistant", "content": "  It sounds like a lot right now.  "},
                        "done": true,
                        "done_reason": "stop",
                        "prompt_eval_count": 120,
                        "eval_count": 12
                    }))
                }),
            )
            .with_state(Arc::clone(&seen));
        let url = start_server(app).await;

        let specialist = MentalHealthSpecialist::new(Arc::new(OllamaProvider::new(&url, "medgemma")));
        let reply = specialist.consult("I feel overwhelmed").await;
        assert_eq!(reply, "It sounds like a lot right now.");

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["model"], "medgemma");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 350);
        assert!((body["options"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert!((body["options"]["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "I feel overwhelmed");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_specialist_ollama_error_falls_back() {
    timeout(TEST_TIMEOUT, async {
        let app = Router::new().route(
            "/api/chat",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded") }),
        );
        let url = start_server(app).await;

        let specialist = MentalHealthSpecialist::new(Arc::new(OllamaProvider::new(&url, "medgemma")));
        assert_eq!(specialist.consult("hello").await, GENERATION_FAILED_REPLY);
    })
    .await
    .expect("test timed out");
}

// ── Twilio ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct TwilioState {
    calls: Arc<Mutex<Vec<(String, Option<String>, HashMap<String, String>)>>>,
}

async fn twilio_calls(
    State(state): State<TwilioState>,
    Path(sid): Path<String>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.calls.lock().unwrap().push((sid, auth.clone(), form.clone()));

    if auth.is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"code": 20003, "message": "Authenticate", "status": 401})),
        );
    }
    (
        StatusCode::CREATED,
        Json(json!({
            "sid": "CA0123456789abcdef",
            "status": "queued",
            "to": form.get("To"),
            "from": form.get("From")
        })),
    )
}

async fn start_twilio() -> (String, TwilioState) {
    let state = TwilioState::default();
    let app = Router::new()
        .route("/2010-04-01/Accounts/{sid}/Calls.json", post(twilio_calls))
        .with_state(state.clone());
    (start_server(app).await, state)
}

fn crisis_call() -> CallRequest {
    CallRequest {
        to: "+15550001111".into(),
        from: "+15559998888".into(),
        url: "http://demo.twilio.com/docs/voice.xml".into(),
    }
}

#[tokio::test]
async fn test_emergency_call_over_twilio() {
    timeout(TEST_TIMEOUT, async {
        let (url, state) = start_twilio().await;
        let client = TwilioClient::new(&url, "AC123", SecretString::from("secret"));
        let dialer = EmergencyDialer::new(Arc::new(client), crisis_call());

        let record = dialer.call_emergency().await.expect("call should be placed");
        assert_eq!(record.sid, "CA0123456789abcdef");
        assert_eq!(record.status.as_deref(), Some("queued"));

        let calls = state.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (sid, auth, form) = &calls[0];
        assert_eq!(sid, "AC123");
        assert!(auth.as_deref().unwrap().starts_with("Basic "));
        assert_eq!(form["To"], "+15550001111");
        assert_eq!(form["From"], "+15559998888");
        assert_eq!(form["Url"], "http://demo.twilio.com/docs/voice.xml");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_rejected_call_is_not_retried() {
    timeout(TEST_TIMEOUT, async {
        let state = TwilioState::default();
        let app = Router::new()
            .route(
                "/2010-04-01/Accounts/{sid}/Calls.json",
                post(|State(state): State<TwilioState>, Path(sid): Path<String>| async move {
                    state.calls.lock().unwrap().push((sid, None, HashMap::new()));
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"code": 21211, "message": "Invalid 'To' Phone Number"})),
                    )
                }),
            )
            .with_state(state.clone());
        let url = start_server(app).await;

        let client = TwilioClient::new(&url, "AC123", SecretString::from("secret"));
        let dialer = EmergencyDialer::new(Arc::new(client), crisis_call());

        assert!(dialer.call_emergency().await.is_none());
        assert_eq!(state.calls.lock().unwrap().len(), 1);
    })
    .await
    .expect("test timed out");
}

use super::*;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::post;
use canvas::doc::{BmcField, ElementKind};
use serde_json::json;

// =============================================================================
// Mock transport
// =============================================================================

struct MockFunctions {
    responses: Mutex<Vec<Result<Value, GenerationError>>>,
    calls: AtomicUsize,
}

impl MockFunctions {
    fn new(responses: Vec<Result<Value, GenerationError>>) -> Arc<Self> {
        Arc::new(Self { responses: Mutex::new(responses), calls: AtomicUsize::new(0) })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EdgeFunctions for MockFunctions {
    async fn invoke(&self, _function: &str, _body: &Value) -> Result<Value, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(GenerationError::Remote("no more mock responses".into()));
        }
        responses.remove(0)
    }
}

fn send_failure() -> Result<Value, GenerationError> {
    Err(GenerationError::Request("Failed to send a request to the Edge Function".into()))
}

fn client(mock: &Arc<MockFunctions>) -> GenerationClient {
    GenerationClient::new(mock.clone(), &GenerationConfig::new("http://unused"))
}

fn bmc_request() -> BmcRequest {
    BmcRequest { company_name: "Acme".into(), industry: "Retail".into(), description: "Sells widgets".into() }
}

// =============================================================================
// Envelope + fences
// =============================================================================

#[test]
fn envelope_success_returns_data() {
    assert_eq!(parse_envelope(r#"{"success":true,"data":{"a":1}}"#).unwrap(), json!({ "a": 1 }));
}

#[test]
fn envelope_failure_carries_error() {
    let err = parse_envelope(r#"{"success":false,"error":"quota"}"#).unwrap_err();
    assert!(matches!(err, GenerationError::Remote(ref m) if m == "quota"));
    let err = parse_envelope(r#"{"success":false}"#).unwrap_err();
    assert!(matches!(err, GenerationError::Remote(ref m) if m == "unknown error"));
}

#[test]
fn envelope_without_data_or_json_is_parse_error() {
    assert!(matches!(parse_envelope(r#"{"success":true}"#), Err(GenerationError::Parse(_))));
    assert!(matches!(parse_envelope("<html>"), Err(GenerationError::Parse(_))));
}

#[test]
fn strip_code_fences_variants() {
    assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    assert_eq!(strip_code_fences("```\n[1]\n```\n"), "[1]");
    assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    assert_eq!(strip_code_fences("```json\n{\"a\":1}"), "{\"a\":1}");
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn validation_runs_before_the_network() {
    let mock = MockFunctions::new(vec![]);
    let request = BmcRequest { company_name: "  ".into(), ..bmc_request() };
    let err = client(&mock).generate_bmc(&request).await.unwrap_err();
    assert!(matches!(err, GenerationError::Validation(ValidationError::Required { field: "company name" })));
    assert_eq!(err.user_message(), "company name is required");
    assert_eq!(mock.calls(), 0);
}

#[test]
fn long_description_is_rejected() {
    let request = StoriesRequest {
        project_name: "P".into(),
        description: "x".repeat(MAX_DESCRIPTION_CHARS + 1),
        ..Default::default()
    };
    assert!(matches!(request.validate(), Err(ValidationError::TooLong { field: "description", .. })));
    assert!(FillPdfRequest::default().validate().is_err());
}

// =============================================================================
// Decoding
// =============================================================================

#[tokio::test]
async fn bmc_from_fenced_model_text() {
    let text = "```json\n{\"valuePropositions\": \"Cheap widgets\", \"channels\": [\"web\", \"retail\"]}\n```";
    let mock = MockFunctions::new(vec![Ok(Value::String(text.into()))]);
    let bmc = client(&mock).generate_bmc(&bmc_request()).await.unwrap();
    assert_eq!(bmc.value_propositions, BmcField::Text("Cheap widgets".into()));
    assert_eq!(bmc.channels, BmcField::Items(vec!["web".into(), "retail".into()]));
}

#[tokio::test]
async fn unparseable_model_text_is_parse_error() {
    let mock = MockFunctions::new(vec![Ok(Value::String("Sure! Here is your canvas.".into()))]);
    let err = client(&mock).generate_bmc(&bmc_request()).await.unwrap_err();
    assert!(matches!(err, GenerationError::Parse(_)));
    assert_eq!(err.error_code(), "E_GENERATION_PARSE");
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn stories_accept_list_or_wrapped() {
    let story = json!({ "title": "Checkout", "asA": "buyer", "iWant": "to pay", "soThat": "I get goods" });
    let mock = MockFunctions::new(vec![Ok(json!([story.clone()])), Ok(json!({ "stories": [story, { "title": "Refund" }] }))]);
    let client = client(&mock);
    let request = StoriesRequest { project_name: "Shop".into(), description: "Online shop".into(), ..Default::default() };

    let first = client.generate_user_stories(&request).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].narrative(), "As a buyer, I want to pay, so that I get goods");

    let second = client.generate_user_stories(&request).await.unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(second[1].title, "Refund");
}

#[tokio::test]
async fn fill_pdf_decodes_base64_and_data_urls() {
    let mock = MockFunctions::new(vec![Ok(json!("JVBERi0=")), Ok(json!({ "pdf": "data:application/pdf;base64,JVBERi0=" }))]);
    let client = client(&mock);
    let request = FillPdfRequest { template: "lean-canvas".into(), fields: Map::new() };
    assert_eq!(client.fill_pdf(&request).await.unwrap(), b"%PDF-");
    assert_eq!(client.fill_pdf(&request).await.unwrap(), b"%PDF-");
}

#[tokio::test]
async fn fill_pdf_tolerates_whitespace_padding_and_url_safe_alphabet() {
    let mock = MockFunctions::new(vec![Ok(json!("JVBE\nRi0")), Ok(json!("-_8"))]);
    let client = client(&mock);
    let request = FillPdfRequest { template: "lean-canvas".into(), fields: Map::new() };
    assert_eq!(client.fill_pdf(&request).await.unwrap(), b"%PDF-");
    assert_eq!(client.fill_pdf(&request).await.unwrap(), vec![0xfb, 0xff]);
}

#[tokio::test]
async fn fill_pdf_rejects_non_base64_payload() {
    let mock = MockFunctions::new(vec![Ok(json!("not*base64"))]);
    let request = FillPdfRequest { template: "lean-canvas".into(), fields: Map::new() };
    let err = client(&mock).fill_pdf(&request).await.unwrap_err();
    assert!(matches!(err, GenerationError::Parse(_)), "{err:?}");
}

// =============================================================================
// Retry
// =============================================================================

#[tokio::test(start_paused = true)]
async fn send_failures_are_retried_twice() {
    let mock = MockFunctions::new(vec![send_failure(), send_failure(), Ok(json!({ "channels": "web" }))]);
    let started = tokio::time::Instant::now();
    let bmc = client(&mock).generate_bmc(&bmc_request()).await.unwrap();
    assert_eq!(bmc.channels, BmcField::Text("web".into()));
    assert_eq!(mock.calls(), 3);
    assert!(started.elapsed() >= Duration::from_millis(1600));
}

#[tokio::test(start_paused = true)]
async fn retries_are_bounded() {
    let mock = MockFunctions::new(vec![send_failure(), send_failure(), send_failure(), Ok(json!({}))]);
    let err = client(&mock).generate_bmc(&bmc_request()).await.unwrap_err();
    assert!(err.retryable());
    assert_eq!(err.class(), ErrorClass::Network);
    assert_eq!(mock.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn other_failures_are_not_retried() {
    let mock = MockFunctions::new(vec![Err(GenerationError::Status { status: 429, body: "slow down".into() })]);
    let err = client(&mock).generate_bmc(&bmc_request()).await.unwrap_err();
    assert_eq!(mock.calls(), 1);
    assert_eq!(err.class(), ErrorClass::RateLimit);
    assert_eq!(err.user_message(), ErrorClass::RateLimit.friendly_message());
}

#[test]
fn timeout_classifies_as_timeout() {
    let err = GenerationError::Timeout { secs: 60 };
    assert_eq!(err.class(), ErrorClass::Timeout);
    assert!(!err.retryable());
}

// =============================================================================
// HTTP transport
// =============================================================================

async fn fake_function(Path(name): Path<String>, Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    match name.as_str() {
        "generate-bmc" => Ok(Json(json!({
            "success": true,
            "data": { "customerSegments": format!("Customers of {}", body["companyName"].as_str().unwrap_or("?")) }
        }))),
        "generate-user-stories" => Ok(Json(json!({ "success": false, "error": "model overloaded" }))),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Json(json!({ "success": true, "data": null })))
        }
        _ => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn fake_server() -> String {
    let app = Router::new().route("/functions/v1/{name}", post(fake_function));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn http_generate_bmc() {
    let base = fake_server().await;
    let client = GenerationClient::from_config(&GenerationConfig::new(base)).unwrap();
    let bmc = client.generate_bmc(&bmc_request()).await.unwrap();
    assert_eq!(bmc.customer_segments, BmcField::Text("Customers of Acme".into()));
}

#[tokio::test]
async fn http_unsuccessful_envelope() {
    let base = fake_server().await;
    let client = GenerationClient::from_config(&GenerationConfig::new(base)).unwrap();
    let request = StoriesRequest { project_name: "Shop".into(), description: "Online".into(), ..Default::default() };
    let err = client.generate_user_stories(&request).await.unwrap_err();
    assert!(matches!(err, GenerationError::Remote(ref m) if m == "model overloaded"));
}

#[tokio::test]
async fn http_status_error() {
    let base = fake_server().await;
    let functions = HttpFunctions::new(&GenerationConfig::new(base)).unwrap();
    let err = functions.invoke("missing", &json!({})).await.unwrap_err();
    assert!(matches!(err, GenerationError::Status { status: 500, .. }));
}

#[tokio::test]
async fn http_timeout() {
    let base = fake_server().await;
    let config = GenerationConfig { timeout_secs: 1, ..GenerationConfig::new(base) };
    let functions = HttpFunctions::new(&config).unwrap();
    let err = functions.invoke("slow", &json!({})).await.unwrap_err();
    assert!(matches!(err, GenerationError::Timeout { secs: 1 }));
}

#[tokio::test]
async fn http_unreachable_is_a_send_failure() {
    let config = GenerationConfig { retries: 1, retry_delay_ms: 10, ..GenerationConfig::new("http://127.0.0.1:1") };
    let client = GenerationClient::from_config(&config).unwrap();
    let err = client.generate_bmc(&bmc_request()).await.unwrap_err();
    assert!(err.retryable());
    assert_eq!(err.class(), ErrorClass::Network);
}

// =============================================================================
// Placement
// =============================================================================

#[test]
fn story_cards_fill_rows_of_three() {
    let stories = vec![StoryContent::default(); 4];
    let elements = story_elements(stories, Position::new(100.0, 50.0));
    let (w, h) = STORY_SIZE;
    assert_eq!(elements.len(), 4);
    assert!(elements.iter().all(|el| el.kind() == ElementKind::Story));
    assert_eq!(elements[0].position, Position::new(100.0, 50.0));
    assert_eq!(elements[2].position, Position::new(100.0 + 2.0 * (w + STORY_GAP), 50.0));
    assert_eq!(elements[3].position, Position::new(100.0, 50.0 + h + STORY_GAP));
}

#[test]
fn bmc_element_uses_board_size() {
    let el = bmc_element(BmcData::default(), Position::new(0.0, 0.0));
    assert_eq!(el.kind(), ElementKind::Bmc);
    assert_eq!(el.size, ElementKind::Bmc.default_size());
}

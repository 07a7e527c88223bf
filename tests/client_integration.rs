//! JSON endpoint tests against a wiremock backend.

use chrono::{TimeZone, Utc};
use serde_json::json;
use studykit::client::StudyClient;
use studykit::model::{ChatRequest, ExamScheduleRequest, ExamType, PdfRequest, Pyqs};
use studykit::options::TransportOptions;
use studykit::sessions::SessionRecord;
use studykit::ClientError;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> StudyClient {
    StudyClient::new(TransportOptions::new(format!("{}/", server.uri()))).unwrap()
}

#[tokio::test]
async fn get_pyqs_grouped_by_exam() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/get-pyqs"))
        .and(query_param("subject_code", "CS301"))
        .and(query_param("exam_type", "semester"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "subject_name": "Operating Systems",
            "pyqs": {
                "semester": [
                    {"year": 2023, "questions": ["Explain thrashing."]},
                    {"year": "2022", "questions": []}
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .get_pyqs(" cs301 ", Some(ExamType::Semester))
        .await
        .unwrap();

    assert_eq!(response.subject_name, "Operating Systems");
    let Some(Pyqs::ByExam(groups)) = response.pyqs else {
        panic!("expected grouped pyqs");
    };
    let years: Vec<&str> = groups["semester"].iter().map(|y| y.year.as_str()).collect();
    assert_eq!(years, ["2023", "2022"]);
}

#[tokio::test]
async fn failure_envelope_with_ok_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Please provide a message"
        })))
        .mount(&server)
        .await;

    let request = ChatRequest {
        message: String::new(),
        context: String::new(),
        chat_history: String::new(),
    };
    let result = client(&server).chat(&request).await;

    assert!(matches!(result, Err(ClientError::Api(ref m)) if m == "Please provide a message"));
}

#[tokio::test]
async fn chat_and_exam_schedule_replies() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "response": "A semaphore is a counter."
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/create-schedule"))
        .and(body_json(json!({
            "subjects": "OS",
            "exam_date": "2026-12-01",
            "hours_per_day": 4
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "schedule": "Day 1: processes"
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let reply = client
        .chat(&ChatRequest {
            message: "What is a semaphore?".to_string(),
            context: String::new(),
            chat_history: String::new(),
        })
        .await
        .unwrap();
    assert_eq!(reply, "A semaphore is a counter.");

    let schedule = client
        .create_schedule(&ExamScheduleRequest {
            subjects: "OS".to_string(),
            exam_date: "2026-12-01".to_string(),
            hours_per_day: 4,
        })
        .await
        .unwrap();
    assert_eq!(schedule, "Day 1: processes");
}

#[tokio::test]
async fn save_and_list_sessions() {
    let server = MockServer::start().await;
    let record = SessionRecord::new(25, Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap(), None);

    Mock::given(method("POST"))
        .and(path("/api/save-session"))
        .and(body_json(json!({
            "duration": 25,
            "timestamp": "2026-10-16T09:00:00Z",
            "subject": "General Study"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "session": {
                "duration": 25,
                "timestamp": "2026-10-16T09:00:00Z",
                "subject": "General Study"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/get-sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(client.save_session(&record).await.unwrap(), record);
    assert!(client.get_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn resources_and_subjects() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/get-resources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "resources": {
                "links": [{"title": "OSTEP", "url": "https://pages.cs.wisc.edu/~remzi/OSTEP/", "category": "Books"}],
                "certifications": []
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/subjects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "subjects": [{"code": "CS301", "name": "Operating Systems"}]
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let resources = client.get_resources().await.unwrap();
    assert_eq!(resources.links[0].title, "OSTEP");
    assert!(resources.certifications.is_empty());

    let subjects = client.get_subjects().await.unwrap();
    assert_eq!(subjects[0].code, "CS301");
}

fn pdf_request() -> PdfRequest {
    PdfRequest {
        notes: "# Paging".to_string(),
        subject_name: "Operating Systems".to_string(),
        subject_code: "CS301".to_string(),
        exam_type: ExamType::Semester,
        mindmap: None,
    }
}

#[tokio::test]
async fn download_pdf_returns_bytes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/download-pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(&b"%PDF-1.4 fake"[..], "application/pdf"))
        .mount(&server)
        .await;

    let bytes = client(&server).download_pdf(&pdf_request()).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn download_pdf_json_body_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/download-pdf"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "error": "PDF generation failed"
        })))
        .mount(&server)
        .await;

    let result = client(&server).download_pdf(&pdf_request()).await;
    assert!(matches!(result, Err(ClientError::Api(ref m)) if m == "PDF generation failed"));
}

#[tokio::test]
async fn extra_headers_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/subjects"))
        .and(header("x-client", "studykit-tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "subjects": []})))
        .expect(1)
        .mount(&server)
        .await;

    let options = TransportOptions::new(server.uri())
        .with_header("X-Client".to_string(), "studykit-tests".to_string());
    let client = StudyClient::new(options).unwrap();

    assert!(client.get_subjects().await.unwrap().is_empty());
}

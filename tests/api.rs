//! API endpoint integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use persona_voice::api::ApiServerBuilder;
use persona_voice::prompt::Role;
use persona_voice::{Error, Message, PersonaDefinition};
use tower::ServiceExt;

mod common;
use common::{
    BOUNDARY, Calls, Script, build_router, json_body, mock_pipeline, multipart_body,
    test_persona, upload_request,
};

#[tokio::test]
async fn test_health_endpoint() {
    let calls = Calls::default();
    let app = build_router(mock_pipeline(test_persona(), Script::default(), &calls));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_persona_endpoint() {
    let calls = Calls::default();
    let app = build_router(mock_pipeline(test_persona(), Script::default(), &calls));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/persona")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["id"], "tester");
    assert_eq!(json["name"], "Test Persona");
    assert_eq!(json["examples"], 2);
    assert_eq!(json["audio_mime"], "audio/mpeg");
}

#[tokio::test]
async fn test_persona_endpoint_reports_configured_audio_mime() {
    let calls = Calls::default();
    let pipeline = mock_pipeline(test_persona(), Script::default(), &calls);
    let app = ApiServerBuilder::new(Arc::new(pipeline), 0)
        .audio_mime("audio/ogg")
        .build()
        .router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/persona")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = json_body(response).await;
    assert_eq!(json["audio_mime"], "audio/ogg");
}

#[tokio::test]
async fn test_process_audio_end_to_end() {
    let persona = PersonaDefinition::embedded("aarya").unwrap();
    let few_shot = persona.few_shot_len();
    let calls = Calls::default();
    let app = build_router(mock_pipeline(persona, Script::default(), &calls));

    let response = app
        .oneshot(upload_request(multipart_body(
            "audio_data",
            "recording.ogg",
            b"OggS-fake-audio",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(
        json,
        serde_json::json!({
            "transcript": "What is your superpower?",
            "response_text": "Adaptability.",
            "audio_base64": "T2dn"
        })
    );

    assert_eq!(calls.counts(), (1, 1, 1));
    assert_eq!(*calls.audio.lock().unwrap(), b"OggS-fake-audio".to_vec());

    let conversation = calls.conversation.lock().unwrap();
    assert_eq!(conversation.len(), 1 + 12 + 1);
    assert_eq!(few_shot, 12);
    assert_eq!(conversation[0].role, Role::System);
    assert_eq!(
        conversation.last(),
        Some(&Message::user("What is your superpower?"))
    );
}

#[tokio::test]
async fn test_process_audio_skips_other_fields() {
    let calls = Calls::default();
    let app = build_router(mock_pipeline(test_persona(), Script::default(), &calls));

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n");
    body.extend_from_slice(&multipart_body("audio_data", "recording.ogg", b"audio"));

    let response = app.oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*calls.audio.lock().unwrap(), b"audio".to_vec());
}

#[tokio::test]
async fn test_process_audio_missing_field() {
    let calls = Calls::default();
    let app = build_router(mock_pipeline(test_persona(), Script::default(), &calls));

    let response = app
        .oneshot(upload_request(multipart_body(
            "recording",
            "recording.ogg",
            b"audio",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "No audio data provided.");

    // No adapter runs for a rejected request
    assert_eq!(calls.counts(), (0, 0, 0));
}

#[tokio::test]
async fn test_process_audio_rejects_plain_form_value() {
    let calls = Calls::default();
    let app = build_router(mock_pipeline(test_persona(), Script::default(), &calls));

    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"audio_data\"\r\n\r\nnot a file\r\n--{BOUNDARY}--\r\n"
    );
    let response = app
        .oneshot(upload_request(body.into_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "No audio data provided.");
    assert_eq!(calls.counts(), (0, 0, 0));
}

#[tokio::test]
async fn test_process_audio_not_multipart() {
    let calls = Calls::default();
    let app = build_router(mock_pipeline(test_persona(), Script::default(), &calls));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/process_audio")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"audio_data": "x"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "No audio data provided.");
    assert_eq!(calls.counts(), (0, 0, 0));
}

#[tokio::test]
async fn test_process_audio_transcription_failure() {
    let calls = Calls::default();
    let script = Script {
        transcript: Err(Error::Transcription("401 Invalid API Key".to_string())),
        ..Script::default()
    };
    let app = build_router(mock_pipeline(test_persona(), script, &calls));

    let response = app
        .oneshot(upload_request(multipart_body(
            "audio_data",
            "recording.ogg",
            b"audio",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_body(response).await;
    assert!(json["error"].is_string());
    assert!(json.get("transcript").is_none());

    // Later stages never run
    assert_eq!(calls.counts(), (1, 0, 0));
}

#[tokio::test]
async fn test_process_audio_completion_failure() {
    let calls = Calls::default();
    let script = Script {
        reply: Err(Error::Completion("503".to_string())),
        ..Script::default()
    };
    let app = build_router(mock_pipeline(test_persona(), script, &calls));

    let response = app
        .oneshot(upload_request(multipart_body(
            "audio_data",
            "recording.ogg",
            b"audio",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_body(response).await;
    assert!(json["error"].is_string());
    assert!(json.get("response_text").is_none());
    assert_eq!(calls.counts(), (1, 1, 0));
}

#[tokio::test]
async fn test_process_audio_synthesis_failure() {
    let calls = Calls::default();
    let script = Script {
        audio: Err(Error::Synthesis("quota exceeded".to_string())),
        ..Script::default()
    };
    let app = build_router(mock_pipeline(test_persona(), script, &calls));

    let response = app
        .oneshot(upload_request(multipart_body(
            "audio_data",
            "recording.ogg",
            b"audio",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Error payload only, never a partial reply
    let json = json_body(response).await;
    assert_eq!(json.as_object().unwrap().len(), 1);
    assert!(json["error"].is_string());
    assert_eq!(calls.counts(), (1, 1, 1));
}

#[tokio::test]
async fn test_process_audio_empty_reply_yields_empty_audio() {
    let calls = Calls::default();
    let script = Script {
        reply: Ok(String::new()),
        audio: Ok(String::new()),
        ..Script::default()
    };
    let app = build_router(mock_pipeline(test_persona(), script, &calls));

    let response = app
        .oneshot(upload_request(multipart_body(
            "audio_data",
            "recording.ogg",
            b"audio",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["response_text"], "");
    assert_eq!(json["audio_base64"], "");
}

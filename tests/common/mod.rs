//! Shared test utilities

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use posture_guardian::api::AppState;
use posture_guardian::detector::Detector;
use posture_guardian::records::RecordStore;
use posture_guardian::tts::SpeechBackend;
use posture_guardian::vision::VisionBackend;
use posture_guardian::{Error, Result};
use serde_json::{json, Value};

/// Smallest payload that decodes as base64 and starts like a JPEG
pub const JPEG_B64: &str = "/9j/4AAQSkZJRgABAQ==";

/// Vision backend that always returns the same reply (or fails when `None`)
pub struct MockVision(pub Option<Value>);

#[async_trait]
impl VisionBackend for MockVision {
    async fn analyze(&self, _image_base64: &str) -> Result<Value> {
        self.0
            .clone()
            .ok_or_else(|| Error::Vision("mock vision offline".into()))
    }
}

/// Speech backend that counts calls and returns fixed audio
#[derive(Default)]
pub struct MockSpeech {
    pub calls: AtomicUsize,
}

impl MockSpeech {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechBackend for MockSpeech {
    async fn synthesize(&self, text: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (!text.trim().is_empty()).then(|| "SUQzBAAAAAAA".to_string())
    }
}

/// Wrap an analysis answer the way the responses API returns it
pub fn responses_reply(answer: &Value) -> Value {
    json!({
        "id": "resp_test",
        "object": "response",
        "output": [
            {"type": "reasoning", "summary": [{"type": "summary_text", "text": "检查背部和头部"}]},
            {"type": "message", "role": "assistant", "content": [
                {"type": "output_text", "text": answer.to_string()}
            ]}
        ]
    })
}

pub fn answer(status: &str, score: u8, is_qualified: bool, suggestion: &str) -> Value {
    json!({
        "status": status,
        "score": score,
        "is_qualified": is_qualified,
        "issues": if is_qualified { vec![] } else { vec!["背部前倾"] },
        "suggestion": suggestion
    })
}

/// App state backed by mocks and a store rooted in `dir`
pub fn test_state(
    vision: Option<Value>,
    dir: &std::path::Path,
) -> (AppState, Arc<MockSpeech>) {
    let store = Arc::new(RecordStore::open(dir.join("logs")).expect("failed to open test store"));
    let speech = Arc::new(MockSpeech::default());
    let detector = Detector::new(Arc::new(MockVision(vision)), speech.clone(), store.clone());

    let state = AppState {
        detector: Arc::new(detector),
        store,
        static_dir: dir.join("static"),
    };
    (state, speech)
}

/// Serve `app` on an ephemeral local port
pub async fn spawn_server(app: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test server");
    let addr = listener.local_addr().expect("no local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });
    addr
}

use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use crpt_client::ClientError;
use crpt_client::Document;
use crpt_client::DocumentClient;
use crpt_client::Envelope;
use crpt_client::RawResponse;
use crpt_client::Transport;
use gate_limit::CancelToken;
use gate_limit::GateError;
use gate_limit::SlidingWindowLimiter;
use more_asserts::assert_ge;

const DOCUMENT: &str = r#"{
    "description": { "participantInn": "7700000000" },
    "doc_id": "doc-42",
    "doc_status": "DRAFT",
    "doc_type": "LP_INTRODUCE_GOODS",
    "importRequest": true,
    "owner_inn": "7700000000",
    "participant_inn": "7700000000",
    "producer_inn": "7700000001",
    "production_date": "2024-02-01",
    "production_type": "OWN_PRODUCTION",
    "products": [
        {
            "owner_inn": "7700000000",
            "producer_inn": "7700000001",
            "production_date": "2024-02-01",
            "tnved_code": "6401100000",
            "uitu_code": "046000012345678901"
        }
    ],
    "reg_date": "2024-02-02T10:00:00",
    "reg_number": "R-42"
}"#;

fn document() -> Document {
    serde_json::from_str(DOCUMENT).unwrap()
}

/// Records what would have gone over the wire and answers with a fixed status.
#[derive(Debug)]
struct RecordingTransport {
    status: u16,
    sent: Mutex<Vec<(Instant, Envelope)>>,
}

impl RecordingTransport {
    fn answering(status: u16) -> Self {
        Self {
            status,
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<(Instant, Envelope)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, envelope: &Envelope) -> Result<RawResponse, ClientError> {
        self.sent
            .lock()
            .unwrap()
            .push((Instant::now(), envelope.clone()));
        Ok(RawResponse {
            status: self.status,
            body: format!("{{\"status\":{}}}", self.status),
        })
    }
}

fn client(limit: usize, window: Duration, status: u16) -> DocumentClient<RecordingTransport> {
    DocumentClient::new(
        SlidingWindowLimiter::new(limit, window).unwrap(),
        RecordingTransport::answering(status),
    )
}

#[test]
fn it_sends_the_wrapped_document() {
    let client = client(5, Duration::from_secs(1), 201);

    let accepted = client.create_document(&document(), "sig").unwrap();
    assert_eq!(accepted.status, 201);

    let sent = client.transport().sent();
    assert_eq!(sent.len(), 1);
    let envelope = &sent[0].1;
    assert_eq!(envelope.document_format, "MANUAL");
    assert_eq!(envelope.document_type, "LP_INTRODUCE_GOODS");
    assert_eq!(envelope.signature, "sig");
    assert_eq!(envelope.document().unwrap(), document());
}

#[test]
fn it_surfaces_rejections_with_status_and_body() {
    let client = client(5, Duration::from_secs(1), 403);

    match client.create_document(&document(), "sig") {
        Err(ClientError::Http { status, body }) => {
            assert_eq!(status, 403);
            assert_eq!(body, "{\"status\":403}");
        }
        other => panic!("expected an HTTP failure, got {other:?}"),
    }
}

#[test]
fn it_spaces_sends_across_threads() {
    let window = Duration::from_millis(200);
    let client = client(2, window, 200);

    thread::scope(|scope| {
        for _ in 0..5 {
            scope.spawn(|| client.create_document(&document(), "sig").unwrap());
        }
    });

    let mut sent: Vec<Instant> = client
        .transport()
        .sent()
        .into_iter()
        .map(|(at, _)| at)
        .collect();
    sent.sort();

    assert_eq!(sent.len(), 5);
    let jitter = Duration::from_millis(10);
    assert_ge!(sent[2] - sent[0], window - jitter);
    assert_ge!(sent[3] - sent[1], window - jitter);
    assert_ge!(sent[4] - sent[2], window - jitter);
}

#[test]
fn a_cancelled_call_never_reaches_the_transport() {
    let client = client(1, Duration::from_secs(60), 200);
    client.create_document(&document(), "sig").unwrap();

    let token = CancelToken::new();
    let outcome = thread::scope(|scope| {
        let waiter =
            scope.spawn(|| client.create_document_cancellable(&document(), "sig", &token));
        thread::sleep(Duration::from_millis(30));
        token.cancel();
        waiter.join().unwrap()
    });

    assert!(matches!(outcome, Err(ClientError::Gate(GateError::Cancelled))));
    assert_eq!(client.transport().sent().len(), 1);
}

#[test]
fn a_timed_out_call_never_reaches_the_transport() {
    let client = client(1, Duration::from_secs(60), 200);
    client.create_document(&document(), "sig").unwrap();

    let outcome = client.create_document_timeout(&document(), "sig", Duration::from_millis(30));

    assert!(matches!(outcome, Err(ClientError::Gate(GateError::Timeout))));
    assert_eq!(client.transport().sent().len(), 1);
}

//! Integration tests for the gateway HTTP surface.
//!
//! Each test binds its own listener on an ephemeral port and, where the
//! token route is involved, stands up a test double on the service bus.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use onboarding_gateway::bus::{Address, ServiceBus};
use onboarding_gateway::config::GatewayConfig;
use onboarding_gateway::http::HttpServer;
use onboarding_gateway::lifecycle::Shutdown;
use onboarding_gateway::token::{TokenService, TOKEN_ADDRESS};

struct TestGateway {
    addr: SocketAddr,
    bus: ServiceBus,
    shutdown: Shutdown,
}

impl TestGateway {
    fn url(&self, suffix: &str) -> String {
        format!("http://{}/dx/v1/{}", self.addr, suffix)
    }
}

async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let bus = ServiceBus::new();
    let tokens = TokenService::create_proxy(
        &bus,
        Address::new(TOKEN_ADDRESS),
        Duration::from_millis(config.timeouts.proxy_reply_ms),
    );

    // Bind before spawning so requests can connect immediately.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, tokens).unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestGateway {
        addr,
        bus,
        shutdown,
    }
}

/// Register a token responder double that counts invocations, records the
/// last payload, and replies after `delay`.
fn spawn_token_responder(
    bus: &ServiceBus,
    delay: Duration,
) -> (Arc<AtomicU32>, Arc<Mutex<Option<Value>>>) {
    let mut inbox = bus.register(Address::new(TOKEN_ADDRESS), 8);
    let calls = Arc::new(AtomicU32::new(0));
    let last_payload = Arc::new(Mutex::new(None));

    let c = calls.clone();
    let p = last_payload.clone();
    tokio::spawn(async move {
        while let Some(envelope) = inbox.recv().await {
            c.fetch_add(1, Ordering::SeqCst);
            *p.lock().await = Some(envelope.payload.clone());
            tokio::time::sleep(delay).await;
            let _ = envelope
                .reply
                .send(json!({ "accessToken": "tok-xyz", "request": envelope.payload }));
        }
    });

    (calls, last_payload)
}

#[tokio::test]
async fn common_headers_on_every_response() {
    let gw = start_gateway(GatewayConfig::default()).await;
    let client = reqwest::Client::new();

    // An error response from an unmatched route.
    let res = client
        .get(format!("http://{}/definitely/missing", gw.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(
        res.headers()["cache-control"],
        "no-cache, no-store, must-revalidate, max-age=0"
    );
    assert_eq!(res.headers()["pragma"], "no-cache");
    assert_eq!(res.headers()["expires"], "0");
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");

    // And a handler response.
    let res = client
        .post(gw.url("onboarding"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(
        res.headers()["cache-control"],
        "no-cache, no-store, must-revalidate, max-age=0"
    );
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");

    gw.shutdown.trigger();
}

#[tokio::test]
async fn unmatched_route_yields_canonical_404() {
    let gw = start_gateway(GatewayConfig::default()).await;

    let res = reqwest::get(format!("http://{}/nowhere", gw.addr))
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(
        res.headers()["content-type"],
        "application/json"
    );
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["type"], "urn:dx:onb:resourceNotFound");
    assert_eq!(body["title"], "Not Found");

    gw.shutdown.trigger();
}

#[tokio::test]
async fn wrong_method_yields_canonical_405() {
    let gw = start_gateway(GatewayConfig::default()).await;

    let res = reqwest::get(gw.url("token")).await.unwrap();
    assert_eq!(res.status(), 405);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["type"], "urn:dx:onb:methodNotAllowed");

    gw.shutdown.trigger();
}

#[tokio::test]
async fn preflight_answers_without_reaching_handler() {
    let gw = start_gateway(GatewayConfig::default()).await;
    let (calls, _) = spawn_token_responder(&gw.bus, Duration::ZERO);

    let client = reqwest::Client::new();
    let res = client
        .request(reqwest::Method::OPTIONS, gw.url("token"))
        .header("Origin", "https://catalogue.example.org")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .unwrap();

    assert!(res.status().is_success());
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    let allow_methods = res.headers()["access-control-allow-methods"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(allow_methods.contains("POST"));
    let allow_headers = res.headers()["access-control-allow-headers"]
        .to_str()
        .unwrap()
        .to_lowercase();
    assert!(allow_headers.contains("content-type"));

    assert_eq!(calls.load(Ordering::SeqCst), 0, "preflight must not dispatch");

    gw.shutdown.trigger();
}

#[tokio::test]
async fn token_request_forwards_payload_exactly_once() {
    let gw = start_gateway(GatewayConfig::default()).await;
    let (calls, last_payload) = spawn_token_responder(&gw.bus, Duration::ZERO);

    let payload = json!({ "clientId": "prov-42", "role": "provider" });
    let client = reqwest::Client::new();
    let res = client
        .post(gw.url("token"))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["accessToken"], "tok-xyz");
    assert_eq!(body["request"], payload);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(last_payload.lock().await.as_ref().unwrap(), &payload);

    gw.shutdown.trigger();
}

#[tokio::test]
async fn token_without_responder_fails_fast_with_503() {
    let mut config = GatewayConfig::default();
    // Generous gateway deadline so a hang would be obvious.
    config.timeouts.request_ms = 10_000;
    let gw = start_gateway(config).await;

    let start = std::time::Instant::now();
    let client = reqwest::Client::new();
    let res = client
        .post(gw.url("token"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 503);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["type"], "urn:dx:onb:serviceUnavailable");
    assert!(
        start.elapsed() < Duration::from_secs(2),
        "no-responder must not hang"
    );

    gw.shutdown.trigger();
}

#[tokio::test]
async fn slow_reply_yields_504_distinct_from_request_timeout() {
    let mut config = GatewayConfig::default();
    config.timeouts.request_ms = 10_000;
    config.timeouts.proxy_reply_ms = 100;
    let gw = start_gateway(config).await;
    let (_, _) = spawn_token_responder(&gw.bus, Duration::from_secs(2));

    let client = reqwest::Client::new();
    let res = client
        .post(gw.url("token"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 504);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["type"], "urn:dx:onb:gatewayTimeout");

    gw.shutdown.trigger();
}

#[tokio::test]
async fn request_deadline_yields_408_and_no_later_write() {
    let mut config = GatewayConfig::default();
    config.timeouts.request_ms = 300;
    config.timeouts.proxy_reply_ms = 5_000;
    let gw = start_gateway(config).await;
    // Responder is slower than the gateway deadline but faster than the
    // proxy reply bound: the 408 path wins the race.
    let (calls, _) = spawn_token_responder(&gw.bus, Duration::from_secs(1));

    let client = reqwest::Client::new();
    let res = client
        .post(gw.url("token"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 408);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["type"], "urn:dx:onb:requestTimeout");

    // The handler future was dropped at the deadline; the responder's late
    // completion must have no further effect.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    gw.shutdown.trigger();
}

#[tokio::test]
async fn oversized_body_yields_canonical_413() {
    let mut config = GatewayConfig::default();
    config.limits.max_body_bytes = 64;
    let gw = start_gateway(config).await;

    let big = json!({ "filler": "x".repeat(1024) });
    let client = reqwest::Client::new();
    let res = client
        .post(gw.url("onboarding"))
        .json(&big)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 413);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["type"], "urn:dx:onb:payloadTooLarge");

    gw.shutdown.trigger();
}

#[tokio::test]
async fn malformed_json_yields_canonical_400() {
    let gw = start_gateway(GatewayConfig::default()).await;

    let client = reqwest::Client::new();
    let res = client
        .post(gw.url("token"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["type"], "urn:dx:onb:badRequest");

    gw.shutdown.trigger();
}

#[tokio::test]
async fn non_json_content_type_yields_canonical_415() {
    let gw = start_gateway(GatewayConfig::default()).await;

    let client = reqwest::Client::new();
    let res = client
        .post(gw.url("token"))
        .header("content-type", "text/plain")
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 415);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["type"], "urn:dx:onb:invalidContentType");

    gw.shutdown.trigger();
}

#[tokio::test]
async fn unimplemented_slots_answer_501() {
    let gw = start_gateway(GatewayConfig::default()).await;
    let client = reqwest::Client::new();

    for suffix in ["onboarding", "ingestion"] {
        let res = client
            .post(gw.url(suffix))
            .json(&json!({ "id": "item-1" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 501, "{suffix} slot");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["type"], "urn:dx:onb:notImplemented");
    }

    gw.shutdown.trigger();
}

#[tokio::test]
async fn second_bind_on_same_port_fails_without_disturbing_first() {
    let gw = start_gateway(GatewayConfig::default()).await;

    let second = TcpListener::bind(gw.addr).await;
    assert!(second.is_err(), "second bind must fail");

    // First instance is still serving.
    let res = reqwest::get(format!("http://{}/still/up", gw.addr))
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    gw.shutdown.trigger();
}

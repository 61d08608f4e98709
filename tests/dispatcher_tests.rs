mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pubsub_mock::domain::{
    AddChannelsResult, GrantResult, ListGroupsResult, Method, Status, StatusCategory, Stub,
};
use pubsub_mock::error::HarnessError;
use pubsub_mock::harness::fixture::{AUTH_KEY, TIMESTAMP, UUID};
use pubsub_mock::harness::{Fixture, Probe, DEFAULT_WAIT};
use pubsub_mock::port::channel;

use support::{expected_signature, grant_path, groups_path, list_groups_body};

const GRANT_BODY: &str = r#"{
    "status": 200,
    "message": "Success",
    "payload": {
        "level": "channel-group+auth",
        "subscribe_key": "sub-c-mock",
        "ttl": 20,
        "channel-groups": {
            "hello_my_group": { "r": 1, "w": 1, "m": 1 }
        }
    },
    "service": "Access Manager",
    "error": false
}"#;

fn expected_grant_signature() -> String {
    expected_signature(
        &grant_path(),
        &[
            ("channel-group", "hello_my_group"),
            ("m", "1"),
            ("r", "1"),
            ("ttl", "20"),
            ("w", "1"),
        ],
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn signed_grant_matches_precomputed_signature() {
    let fixture = Fixture::start().await.unwrap();
    fixture
        .mount(
            Stub::builder()
                .method(Method::Get)
                .path(&grant_path())
                .param("signature", expected_grant_signature())
                .param("timestamp", TIMESTAMP.to_string())
                .param("uuid", UUID)
                .response(GRANT_BODY),
        )
        .unwrap();

    let client = fixture.client_with(fixture.signed_config()).unwrap();
    let probe = Probe::<GrantResult>::new("grant");
    client
        .grant()
        .channel_groups(["hello_my_group"])
        .auth_keys([AUTH_KEY])
        .read(true)
        .write(true)
        .manage(true)
        .ttl(20)
        .execute(probe.expect_success());

    assert!(probe.wait(DEFAULT_WAIT).await.unwrap());
    let result = probe.outcome().unwrap().result.unwrap();
    assert_eq!(result.ttl, 20);
    assert_eq!(result.level, "channel-group+auth");
    let perms = result.channel_groups["hello_my_group"];
    assert!(perms.read && perms.write && perms.manage);

    fixture.teardown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn grant_without_secret_is_rejected_locally() {
    let fixture = Fixture::start().await.unwrap();
    let client = fixture.client().unwrap();
    let probe = Probe::<GrantResult>::new("grant");

    client
        .grant()
        .channel_groups(["g"])
        .read(true)
        .execute(probe.callback(|_, status| status.category == StatusCategory::BadRequest));

    assert!(probe.wait(DEFAULT_WAIT).await.unwrap());
    assert!(fixture.server().received_requests().is_empty());
    fixture.teardown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn end_pending_requests_resolves_each_callback_once() {
    let fixture = Fixture::start().await.unwrap();
    // Point at a listener that accepts but never answers.
    let silent = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = fixture.config();
    config.origin = format!("http://{}", silent.local_addr().unwrap());
    config.http.timeout_ms = 60_000;
    let client = fixture.client_with(config).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let (last_tx, last_rx) = tokio::sync::oneshot::channel::<Status>();
    let mut last_tx = Some(last_tx);
    for i in 0..3 {
        let calls = Arc::clone(&calls);
        let tx = if i == 2 { last_tx.take() } else { None };
        client
            .list_channel_groups()
            .execute(move |_result: Option<ListGroupsResult>, status: Status| {
                calls.fetch_add(1, Ordering::SeqCst);
                if let Some(tx) = tx {
                    let _ = tx.send(status);
                }
            });
    }
    assert_eq!(client.pending_count(), 3);

    assert_eq!(client.end_pending_requests(), 3);
    let status = tokio::time::timeout(DEFAULT_WAIT, last_rx).await.unwrap().unwrap();
    assert_eq!(status.category, StatusCategory::Cancelled);
    assert_eq!(status.status_code, 0);
    assert!(status.error);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(client.pending_count(), 0);
    assert_eq!(client.end_pending_requests(), 0);

    drop(silent);
    fixture.teardown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_callback_does_not_break_the_client() {
    let fixture = Fixture::start().await.unwrap();
    fixture
        .mount(
            Stub::builder()
                .method(Method::Get)
                .path(&groups_path())
                .response(list_groups_body(&["g"])),
        )
        .unwrap();
    let client = fixture.client().unwrap();

    client
        .list_channel_groups()
        .execute(|_: Option<ListGroupsResult>, _: Status| panic!("callback blew up"));

    let (callback, rx) = channel::<ListGroupsResult>();
    client.list_channel_groups().execute(callback);
    let (result, status) = tokio::time::timeout(DEFAULT_WAIT, rx).await.unwrap().unwrap();
    assert!(!status.error);
    assert_eq!(result.unwrap().groups, vec!["g".to_string()]);

    fixture.teardown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn stopped_server_surfaces_network_error() {
    let fixture = Fixture::start().await.unwrap();
    let client = fixture.client().unwrap();
    fixture.teardown().await.unwrap();

    let probe = Probe::<AddChannelsResult>::new("add channel to group");
    client
        .add_channels_to_channel_group()
        .channels(["c"])
        .channel_group("g")
        .execute(probe.callback(|_, status| status.category == StatusCategory::Network));

    assert!(probe.wait(DEFAULT_WAIT).await.unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn wait_reports_which_operation_never_completed() {
    let fixture = Fixture::start().await.unwrap();
    let client = fixture.client().unwrap();
    let probe = Probe::<ListGroupsResult>::new("list channel groups");

    // Keep the callback alive and unused so nothing ever signals.
    let parked = probe.expect_success();
    let err = probe.wait(Duration::from_millis(50)).await.unwrap_err();
    match err {
        HarnessError::Timeout { operation, waited } => {
            assert_eq!(operation, "list channel groups");
            assert_eq!(waited, Duration::from_millis(50));
        }
    }

    probe.reset();
    client.list_channel_groups().execute(parked);
    assert!(!probe.wait(DEFAULT_WAIT).await.unwrap());

    fixture.teardown().await.unwrap();
}

#[test]
fn blocking_probe_waits_on_runtime_driven_dispatch() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let fixture = runtime.block_on(Fixture::start()).unwrap();
    fixture
        .mount(
            Stub::builder()
                .method(Method::Get)
                .path(&groups_path())
                .response(list_groups_body(&["a", "b"])),
        )
        .unwrap();

    let client = {
        let _guard = runtime.enter();
        fixture.client().unwrap()
    };
    let probe = Probe::<ListGroupsResult>::new("list channel groups");
    client.list_channel_groups().execute(probe.expect_success());

    assert!(probe.wait_blocking(DEFAULT_WAIT).unwrap());
    runtime.block_on(fixture.teardown()).unwrap();
}

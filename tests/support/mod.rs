#![allow(dead_code)]

use std::collections::BTreeMap;

use pubsub_mock::client::SDK_NAME;
use pubsub_mock::domain::{sign, Method, SigningInput};
use pubsub_mock::harness::fixture::{
    AUTH_KEY, PUBLISH_KEY, REQUEST_ID, SECRET_KEY, SUBSCRIBE_KEY, TIMESTAMP, UUID,
};

pub const ACK_BODY: &str =
    r#"{"status": 200, "message": "OK", "service": "channel-registry", "error": false}"#;

pub fn groups_path() -> String {
    format!("/v1/channel-registration/sub-key/{SUBSCRIBE_KEY}/channel-group")
}

pub fn group_path(group: &str) -> String {
    format!("{}/{group}", groups_path())
}

pub fn grant_path() -> String {
    format!("/v1/auth/grant/sub-key/{SUBSCRIBE_KEY}")
}

pub fn list_groups_body(groups: &[&str]) -> String {
    serde_json::json!({
        "status": 200,
        "payload": { "groups": groups, "namespace": "" },
        "service": "channel-registry",
        "error": false
    })
    .to_string()
}

pub fn list_channels_body(group: &str, channels: &[&str]) -> String {
    serde_json::json!({
        "status": 200,
        "payload": { "channels": channels, "group": group },
        "service": "channel-registry",
        "error": false
    })
    .to_string()
}

/// Signature a client built from `Fixture::signed_config` sends for a GET to
/// `path` carrying `extra` on top of the common parameters.
pub fn expected_signature(path: &str, extra: &[(&str, &str)]) -> String {
    let timestamp = TIMESTAMP.to_string();
    let params: BTreeMap<String, String> = [
        ("auth", AUTH_KEY),
        ("pnsdk", SDK_NAME),
        ("requestid", REQUEST_ID),
        ("timestamp", timestamp.as_str()),
        ("uuid", UUID),
    ]
    .iter()
    .chain(extra)
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    sign(
        SECRET_KEY,
        &SigningInput {
            subscribe_key: SUBSCRIBE_KEY,
            publish_key: PUBLISH_KEY,
            method: Method::Get,
            path,
            params: &params,
        },
    )
    .unwrap()
}

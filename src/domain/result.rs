//! Typed operation results parsed from response envelopes.
//!
//! Every service response is wrapped in the same envelope
//! (`status`, `message`, `service`, `error`, `payload`). Each operation picks
//! the fields it needs; a result that cannot be built from the envelope is
//! reported as absent, which is independent of the status flag.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Common response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub payload: Option<Value>,
}

impl Envelope {
    /// Parse a body, returning `None` for anything that is not an envelope.
    #[must_use]
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

/// Inputs from the original request that results echo back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub channel_group: Option<String>,
    pub channels: Vec<String>,
}

/// A result type that can be built from an envelope.
pub trait OperationResult: Sized + Send + 'static {
    fn from_envelope(envelope: &Envelope, request: &RequestContext) -> Option<Self>;
}

/// Result of adding channels to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddChannelsResult {
    pub channel_group: String,
    pub channels: Vec<String>,
    pub message: String,
    pub service: String,
}

/// Result of removing channels from a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoveChannelsResult {
    pub channel_group: String,
    pub channels: Vec<String>,
    pub message: String,
    pub service: String,
}

/// Result of deleting a whole group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteGroupResult {
    pub channel_group: String,
    pub message: String,
    pub service: String,
}

/// Channels registered in one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListChannelsResult {
    pub channel_group: String,
    pub channels: Vec<String>,
}

/// All groups under the subscribe key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListGroupsResult {
    pub groups: Vec<String>,
    pub namespace: Option<String>,
}

/// Read/write/manage flags for one resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
    pub manage: bool,
}

/// Access granted by the access manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantResult {
    pub level: String,
    pub subscribe_key: String,
    pub ttl: u64,
    pub channel_groups: BTreeMap<String, Permissions>,
    pub channels: BTreeMap<String, Permissions>,
    pub message: String,
}

fn ack_fields(envelope: &Envelope, request: &RequestContext) -> Option<(String, String, String)> {
    let message = envelope.message.clone()?;
    let service = envelope.service.clone().unwrap_or_default();
    let group = request.channel_group.clone().unwrap_or_default();
    Some((group, message, service))
}

impl OperationResult for AddChannelsResult {
    fn from_envelope(envelope: &Envelope, request: &RequestContext) -> Option<Self> {
        let (channel_group, message, service) = ack_fields(envelope, request)?;
        Some(Self {
            channel_group,
            channels: request.channels.clone(),
            message,
            service,
        })
    }
}

impl OperationResult for RemoveChannelsResult {
    fn from_envelope(envelope: &Envelope, request: &RequestContext) -> Option<Self> {
        let (channel_group, message, service) = ack_fields(envelope, request)?;
        Some(Self {
            channel_group,
            channels: request.channels.clone(),
            message,
            service,
        })
    }
}

impl OperationResult for DeleteGroupResult {
    fn from_envelope(envelope: &Envelope, request: &RequestContext) -> Option<Self> {
        let (channel_group, message, service) = ack_fields(envelope, request)?;
        Some(Self {
            channel_group,
            message,
            service,
        })
    }
}

#[derive(Deserialize)]
struct ChannelsPayload {
    channels: Vec<String>,
    #[serde(default)]
    group: Option<String>,
}

impl OperationResult for ListChannelsResult {
    fn from_envelope(envelope: &Envelope, request: &RequestContext) -> Option<Self> {
        let payload: ChannelsPayload = serde_json::from_value(envelope.payload.clone()?).ok()?;
        Some(Self {
            channel_group: payload
                .group
                .or_else(|| request.channel_group.clone())
                .unwrap_or_default(),
            channels: payload.channels,
        })
    }
}

#[derive(Deserialize)]
struct GroupsPayload {
    groups: Vec<String>,
    #[serde(default)]
    namespace: Option<String>,
}

impl OperationResult for ListGroupsResult {
    fn from_envelope(envelope: &Envelope, _request: &RequestContext) -> Option<Self> {
        let payload: GroupsPayload = serde_json::from_value(envelope.payload.clone()?).ok()?;
        Some(Self {
            groups: payload.groups,
            namespace: payload.namespace.filter(|ns| !ns.is_empty()),
        })
    }
}

#[derive(Deserialize, Default)]
struct RawPermissions {
    #[serde(default)]
    r: u8,
    #[serde(default)]
    w: u8,
    #[serde(default)]
    m: u8,
}

impl From<RawPermissions> for Permissions {
    fn from(raw: RawPermissions) -> Self {
        Self {
            read: raw.r == 1,
            write: raw.w == 1,
            manage: raw.m == 1,
        }
    }
}

#[derive(Deserialize)]
struct GrantPayload {
    #[serde(default)]
    level: String,
    #[serde(default)]
    subscribe_key: String,
    #[serde(default)]
    ttl: u64,
    #[serde(default, rename = "channel-groups")]
    channel_groups: BTreeMap<String, RawPermissions>,
    #[serde(default)]
    channels: BTreeMap<String, RawPermissions>,
}

impl OperationResult for GrantResult {
    fn from_envelope(envelope: &Envelope, _request: &RequestContext) -> Option<Self> {
        let payload: GrantPayload = serde_json::from_value(envelope.payload.clone()?).ok()?;
        Some(Self {
            level: payload.level,
            subscribe_key: payload.subscribe_key,
            ttl: payload.ttl,
            channel_groups: convert(payload.channel_groups),
            channels: convert(payload.channels),
            message: envelope.message.clone().unwrap_or_default(),
        })
    }
}

fn convert(raw: BTreeMap<String, RawPermissions>) -> BTreeMap<String, Permissions> {
    raw.into_iter().map(|(k, v)| (k, v.into())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_ctx() -> RequestContext {
        RequestContext {
            channel_group: Some("hello_my_group".into()),
            channels: vec!["hello_my_channel".into()],
        }
    }

    #[test]
    fn add_result_echoes_request_and_reads_message() {
        let envelope = Envelope::parse(
            r#"{"status": 200, "message": "OK", "service": "channel-registry", "error": false}"#,
        )
        .unwrap();
        let result = AddChannelsResult::from_envelope(&envelope, &group_ctx()).unwrap();
        assert_eq!(result.channel_group, "hello_my_group");
        assert_eq!(result.channels, vec!["hello_my_channel".to_string()]);
        assert_eq!(result.message, "OK");
        assert_eq!(result.service, "channel-registry");
    }

    #[test]
    fn ack_without_message_has_no_result() {
        let envelope = Envelope::parse(r#"{"status": 200}"#).unwrap();
        assert!(RemoveChannelsResult::from_envelope(&envelope, &group_ctx()).is_none());
    }

    #[test]
    fn list_channels_reads_payload() {
        let envelope = Envelope::parse(
            r#"{"status": 200, "payload": {"channels": ["a", "b"], "group": "g"}, "service": "channel-registry", "error": false}"#,
        )
        .unwrap();
        let result = ListChannelsResult::from_envelope(&envelope, &RequestContext::default()).unwrap();
        assert_eq!(result.channel_group, "g");
        assert_eq!(result.channels, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn list_groups_drops_empty_namespace() {
        let envelope = Envelope::parse(
            r#"{"status": 200, "payload": {"namespace": "", "groups": ["g1", "g2"]}, "service": "channel-registry", "error": false}"#,
        )
        .unwrap();
        let result = ListGroupsResult::from_envelope(&envelope, &RequestContext::default()).unwrap();
        assert_eq!(result.groups, vec!["g1".to_string(), "g2".to_string()]);
        assert_eq!(result.namespace, None);
    }

    #[test]
    fn grant_reads_permission_flags() {
        let envelope = Envelope::parse(
            r#"{"message":"Success","payload":{"level":"channel-group","subscribe_key":"pam","ttl":20,"channel-groups":{"hello_my_group":{"r":1,"w":0,"m":1}}},"service":"Access Manager","status":200}"#,
        )
        .unwrap();
        let result = GrantResult::from_envelope(&envelope, &RequestContext::default()).unwrap();
        assert_eq!(result.level, "channel-group");
        assert_eq!(result.ttl, 20);
        assert_eq!(
            result.channel_groups.get("hello_my_group"),
            Some(&Permissions {
                read: true,
                write: false,
                manage: true
            })
        );
        assert!(result.channels.is_empty());
    }

    #[test]
    fn non_json_body_is_not_an_envelope() {
        assert!(Envelope::parse("<html>oops</html>").is_none());
    }
}

//! Operation builders for channel groups and access grants.
//!
//! Each builder collects its inputs, validates them in `execute`, and hands
//! a [`RequestSpec`] to the client. Validation failures still resolve the
//! callback, with a `BadRequest` status.

use std::collections::BTreeMap;

use super::PubSubClient;
use crate::domain::encoding::encode_component;
use crate::domain::{
    AddChannelsResult, DeleteGroupResult, DomainError, GrantResult, ListChannelsResult,
    ListGroupsResult, Method, Operation, RemoveChannelsResult, RequestContext,
};
use crate::port::Callback;

/// Operation-specific part of a request; the client adds the common
/// parameters and the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub operation: Operation,
    pub method: Method,
    pub path: String,
    pub params: BTreeMap<String, String>,
    pub context: RequestContext,
}

impl RequestSpec {
    fn get(operation: Operation, path: String) -> Self {
        Self {
            operation,
            method: Method::Get,
            path,
            params: BTreeMap::new(),
            context: RequestContext::default(),
        }
    }

    fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

fn groups_path(subscribe_key: &str) -> String {
    format!(
        "/v1/channel-registration/sub-key/{}/channel-group",
        encode_component(subscribe_key)
    )
}

fn group_path(subscribe_key: &str, group: &str) -> String {
    format!("{}/{}", groups_path(subscribe_key), encode_component(group))
}

fn require_group(group: Option<&String>) -> Result<&str, DomainError> {
    match group.map(|g| g.trim()) {
        Some(g) if !g.is_empty() => Ok(g),
        _ => Err(DomainError::InvalidParameter(
            "channel group is required".into(),
        )),
    }
}

fn require_channels(channels: &[String]) -> Result<String, DomainError> {
    if channels.is_empty() || channels.iter().any(|c| c.trim().is_empty()) {
        return Err(DomainError::InvalidParameter(
            "at least one non-empty channel is required".into(),
        ));
    }
    Ok(channels.join(","))
}

fn collect<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

/// `add_channels_to_channel_group()`
#[must_use = "operations do nothing until `execute` is called"]
pub struct AddChannelsToGroup<'a> {
    client: &'a PubSubClient,
    channels: Vec<String>,
    channel_group: Option<String>,
}

impl<'a> AddChannelsToGroup<'a> {
    pub(super) fn new(client: &'a PubSubClient) -> Self {
        Self {
            client,
            channels: Vec::new(),
            channel_group: None,
        }
    }

    pub fn channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = collect(channels);
        self
    }

    pub fn channel_group(mut self, group: impl Into<String>) -> Self {
        self.channel_group = Some(group.into());
        self
    }

    fn spec(&self) -> Result<RequestSpec, DomainError> {
        let group = require_group(self.channel_group.as_ref())?;
        let add = require_channels(&self.channels)?;
        let mut spec = RequestSpec::get(
            Operation::AddChannelsToGroup,
            group_path(self.client.subscribe_key(), group),
        )
        .param("add", add);
        spec.context = RequestContext {
            channel_group: Some(group.to_string()),
            channels: self.channels.clone(),
        };
        Ok(spec)
    }

    /// Dispatch and return immediately.
    pub fn execute<C: Callback<AddChannelsResult>>(self, callback: C) {
        self.client
            .submit(Operation::AddChannelsToGroup, self.spec(), callback);
    }
}

/// `remove_channels_from_channel_group()`
#[must_use = "operations do nothing until `execute` is called"]
pub struct RemoveChannelsFromGroup<'a> {
    client: &'a PubSubClient,
    channels: Vec<String>,
    channel_group: Option<String>,
}

impl<'a> RemoveChannelsFromGroup<'a> {
    pub(super) fn new(client: &'a PubSubClient) -> Self {
        Self {
            client,
            channels: Vec::new(),
            channel_group: None,
        }
    }

    pub fn channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = collect(channels);
        self
    }

    pub fn channel_group(mut self, group: impl Into<String>) -> Self {
        self.channel_group = Some(group.into());
        self
    }

    fn spec(&self) -> Result<RequestSpec, DomainError> {
        let group = require_group(self.channel_group.as_ref())?;
        let remove = require_channels(&self.channels)?;
        let mut spec = RequestSpec::get(
            Operation::RemoveChannelsFromGroup,
            group_path(self.client.subscribe_key(), group),
        )
        .param("remove", remove);
        spec.context = RequestContext {
            channel_group: Some(group.to_string()),
            channels: self.channels.clone(),
        };
        Ok(spec)
    }

    pub fn execute<C: Callback<RemoveChannelsResult>>(self, callback: C) {
        self.client
            .submit(Operation::RemoveChannelsFromGroup, self.spec(), callback);
    }
}

/// `list_channels_for_channel_group()`
#[must_use = "operations do nothing until `execute` is called"]
pub struct ListChannelsForGroup<'a> {
    client: &'a PubSubClient,
    channel_group: Option<String>,
}

impl<'a> ListChannelsForGroup<'a> {
    pub(super) fn new(client: &'a PubSubClient) -> Self {
        Self {
            client,
            channel_group: None,
        }
    }

    pub fn channel_group(mut self, group: impl Into<String>) -> Self {
        self.channel_group = Some(group.into());
        self
    }

    fn spec(&self) -> Result<RequestSpec, DomainError> {
        let group = require_group(self.channel_group.as_ref())?;
        let mut spec = RequestSpec::get(
            Operation::ListChannelsForGroup,
            group_path(self.client.subscribe_key(), group),
        );
        spec.context.channel_group = Some(group.to_string());
        Ok(spec)
    }

    pub fn execute<C: Callback<ListChannelsResult>>(self, callback: C) {
        self.client
            .submit(Operation::ListChannelsForGroup, self.spec(), callback);
    }
}

/// `list_channel_groups()`
#[must_use = "operations do nothing until `execute` is called"]
pub struct ListChannelGroups<'a> {
    client: &'a PubSubClient,
}

impl<'a> ListChannelGroups<'a> {
    pub(super) fn new(client: &'a PubSubClient) -> Self {
        Self { client }
    }

    fn spec(&self) -> RequestSpec {
        RequestSpec::get(
            Operation::ListChannelGroups,
            groups_path(self.client.subscribe_key()),
        )
    }

    pub fn execute<C: Callback<ListGroupsResult>>(self, callback: C) {
        self.client
            .submit(Operation::ListChannelGroups, Ok(self.spec()), callback);
    }
}

/// `delete_channel_group()`
#[must_use = "operations do nothing until `execute` is called"]
pub struct DeleteChannelGroup<'a> {
    client: &'a PubSubClient,
    channel_group: Option<String>,
}

impl<'a> DeleteChannelGroup<'a> {
    pub(super) fn new(client: &'a PubSubClient) -> Self {
        Self {
            client,
            channel_group: None,
        }
    }

    pub fn channel_group(mut self, group: impl Into<String>) -> Self {
        self.channel_group = Some(group.into());
        self
    }

    fn spec(&self) -> Result<RequestSpec, DomainError> {
        let group = require_group(self.channel_group.as_ref())?;
        let mut spec = RequestSpec::get(
            Operation::DeleteChannelGroup,
            format!("{}/remove", group_path(self.client.subscribe_key(), group)),
        );
        spec.context.channel_group = Some(group.to_string());
        Ok(spec)
    }

    pub fn execute<C: Callback<DeleteGroupResult>>(self, callback: C) {
        self.client
            .submit(Operation::DeleteChannelGroup, self.spec(), callback);
    }
}

/// `grant()`: access manager permissions for channel groups, channels and
/// auth keys. Requires a secret key.
#[must_use = "operations do nothing until `execute` is called"]
pub struct Grant<'a> {
    client: &'a PubSubClient,
    channel_groups: Vec<String>,
    channels: Vec<String>,
    auth_keys: Vec<String>,
    read: bool,
    write: bool,
    manage: bool,
    ttl: Option<u32>,
}

impl<'a> Grant<'a> {
    pub(super) fn new(client: &'a PubSubClient) -> Self {
        Self {
            client,
            channel_groups: Vec::new(),
            channels: Vec::new(),
            auth_keys: Vec::new(),
            read: false,
            write: false,
            manage: false,
            ttl: None,
        }
    }

    pub fn channel_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channel_groups = collect(groups);
        self
    }

    pub fn channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = collect(channels);
        self
    }

    pub fn auth_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auth_keys = collect(keys);
        self
    }

    pub fn read(mut self, allow: bool) -> Self {
        self.read = allow;
        self
    }

    pub fn write(mut self, allow: bool) -> Self {
        self.write = allow;
        self
    }

    pub fn manage(mut self, allow: bool) -> Self {
        self.manage = allow;
        self
    }

    /// Minutes the grant stays valid.
    pub fn ttl(mut self, minutes: u32) -> Self {
        self.ttl = Some(minutes);
        self
    }

    fn spec(&self) -> Result<RequestSpec, DomainError> {
        if !self.client.signs_requests() {
            return Err(DomainError::InvalidParameter(
                "grant requires a secret key".into(),
            ));
        }

        let flag = |on: bool| if on { "1" } else { "0" };
        let mut spec = RequestSpec::get(
            Operation::Grant,
            format!(
                "/v1/auth/grant/sub-key/{}",
                encode_component(self.client.subscribe_key())
            ),
        )
        .param("r", flag(self.read))
        .param("w", flag(self.write))
        .param("m", flag(self.manage));

        if !self.channel_groups.is_empty() {
            spec = spec.param("channel-group", self.channel_groups.join(","));
        }
        if !self.channels.is_empty() {
            spec = spec.param("channel", self.channels.join(","));
        }
        if !self.auth_keys.is_empty() {
            spec = spec.param("auth", self.auth_keys.join(","));
        }
        if let Some(ttl) = self.ttl {
            spec = spec.param("ttl", ttl.to_string());
        }

        spec.context = RequestContext {
            channel_group: self.channel_groups.first().cloned(),
            channels: self.channels.clone(),
        };
        Ok(spec)
    }

    pub fn execute<C: Callback<GrantResult>>(self, callback: C) {
        self.client.submit(Operation::Grant, self.spec(), callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn client(secret: Option<&str>) -> PubSubClient {
        let mut config = ClientConfig::new("SK", "PK", "mytestuuid", "http://127.0.0.1:1");
        config.secret_key = secret.map(str::to_string);
        PubSubClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn add_spec_targets_group_path() {
        let client = client(None);
        let spec = client
            .add_channels_to_channel_group()
            .channels(["a", "b"])
            .channel_group("G")
            .spec()
            .unwrap();

        assert_eq!(spec.path, "/v1/channel-registration/sub-key/SK/channel-group/G");
        assert_eq!(spec.params.get("add").map(String::as_str), Some("a,b"));
        assert_eq!(spec.context.channel_group.as_deref(), Some("G"));
    }

    #[tokio::test]
    async fn remove_spec_uses_remove_param() {
        let client = client(None);
        let spec = client
            .remove_channels_from_channel_group()
            .channels(["a"])
            .channel_group("G")
            .spec()
            .unwrap();

        assert_eq!(spec.params.get("remove").map(String::as_str), Some("a"));
        assert!(!spec.params.contains_key("add"));
    }

    #[tokio::test]
    async fn missing_group_is_rejected() {
        let client = client(None);
        let err = client
            .add_channels_to_channel_group()
            .channels(["a"])
            .spec()
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn empty_channel_list_is_rejected() {
        let client = client(None);
        let result = client
            .remove_channels_from_channel_group()
            .channel_group("G")
            .spec();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn delete_spec_appends_remove_segment() {
        let client = client(None);
        let spec = client.delete_channel_group().channel_group("G").spec().unwrap();
        assert_eq!(
            spec.path,
            "/v1/channel-registration/sub-key/SK/channel-group/G/remove"
        );
    }

    #[tokio::test]
    async fn list_groups_has_no_group_segment() {
        let client = client(None);
        let spec = client.list_channel_groups().spec();
        assert_eq!(spec.path, "/v1/channel-registration/sub-key/SK/channel-group");
        assert!(spec.params.is_empty());
    }

    #[tokio::test]
    async fn grant_requires_secret_key() {
        assert!(client(None).grant().read(true).spec().is_err());
    }

    #[tokio::test]
    async fn grant_encodes_flags_and_targets() {
        let client = client(Some("secret"));
        let spec = client
            .grant()
            .channel_groups(["hello_my_group"])
            .auth_keys(["myAuth"])
            .read(true)
            .write(false)
            .manage(true)
            .ttl(20)
            .spec()
            .unwrap();

        assert_eq!(spec.path, "/v1/auth/grant/sub-key/SK");
        let get = |k: &str| spec.params.get(k).map(String::as_str);
        assert_eq!(get("r"), Some("1"));
        assert_eq!(get("w"), Some("0"));
        assert_eq!(get("m"), Some("1"));
        assert_eq!(get("ttl"), Some("20"));
        assert_eq!(get("channel-group"), Some("hello_my_group"));
        assert_eq!(get("auth"), Some("myAuth"));
        assert_eq!(get("channel"), None);
    }
}

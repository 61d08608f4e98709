//! Completion status delivered to every callback.

use std::fmt;

use serde::Serialize;

/// Client operation a status belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    AddChannelsToGroup,
    RemoveChannelsFromGroup,
    ListChannelsForGroup,
    ListChannelGroups,
    DeleteChannelGroup,
    Grant,
}

impl Operation {
    /// Service name used when the response does not carry one.
    #[must_use]
    pub const fn default_service(self) -> &'static str {
        match self {
            Self::Grant => "Access Manager",
            _ => "channel-registry",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddChannelsToGroup => "add_channels_to_group",
            Self::RemoveChannelsFromGroup => "remove_channels_from_group",
            Self::ListChannelsForGroup => "list_channels_for_group",
            Self::ListChannelGroups => "list_channel_groups",
            Self::DeleteChannelGroup => "delete_channel_group",
            Self::Grant => "grant",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of how an operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    Acknowledgment,
    BadRequest,
    AccessDenied,
    NotFound,
    ServerError,
    Timeout,
    Network,
    MalformedResponse,
    Cancelled,
}

impl StatusCategory {
    /// Category for an HTTP status code.
    #[must_use]
    pub const fn from_status_code(code: u16) -> Self {
        match code {
            200..=299 => Self::Acknowledgment,
            403 => Self::AccessDenied,
            404 => Self::NotFound,
            400..=499 => Self::BadRequest,
            _ => Self::ServerError,
        }
    }
}

/// Outcome of one dispatched operation.
///
/// Independent of the typed result: an error status may still come with a
/// parsed result, and a success may come without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub error: bool,
    /// HTTP status code, or 0 when no response was received.
    pub status_code: u16,
    pub service: String,
    pub operation: Operation,
    pub category: StatusCategory,
    pub error_message: Option<String>,
}

impl Status {
    /// Status for a received HTTP response.
    #[must_use]
    pub fn from_response(
        operation: Operation,
        status_code: u16,
        service: Option<String>,
        envelope_error: bool,
    ) -> Self {
        let category = StatusCategory::from_status_code(status_code);
        let error = envelope_error || category != StatusCategory::Acknowledgment;
        Self {
            error,
            status_code,
            service: service.unwrap_or_else(|| operation.default_service().to_string()),
            operation,
            category,
            error_message: None,
        }
    }

    /// Status for an operation that never got a usable response.
    #[must_use]
    pub fn failure(operation: Operation, category: StatusCategory, message: impl Into<String>) -> Self {
        Self {
            error: true,
            status_code: 0,
            service: operation.default_service().to_string(),
            operation,
            category,
            error_message: Some(message.into()),
        }
    }

    #[must_use]
    pub fn cancelled(operation: Operation) -> Self {
        Self::failure(operation, StatusCategory::Cancelled, "request cancelled")
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.error
    }
}

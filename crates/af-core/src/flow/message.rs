//! Messages posted by the hosted IdP page.
//!
//! The page talks in `{method: "...", ...payload}` objects. Decoding turns
//! them into the closed [`PageMessage`] union; anything outside it is a
//! decode error the caller logs and drops.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::security::{deserialize_optional_secret, SecretString};

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("message origin {origin:?} is not the identity provider")]
    ForeignOrigin { origin: String },

    #[error("message payload is not an object with a method")]
    MissingMethod,

    #[error("unrecognized message method {method:?}: {source}")]
    Unrecognized {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A message as delivered by the message channel, before decoding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageEnvelope {
    pub origin: String,
    pub data: Value,
}

impl PageEnvelope {
    pub fn new(origin: impl Into<String>, data: Value) -> Self {
        Self {
            origin: origin.into(),
            data,
        }
    }

    /// Decode the payload if it was posted by `expected_origin`.
    pub fn decode(self, expected_origin: &str) -> Result<PageMessage, MessageError> {
        if self.origin != expected_origin {
            return Err(MessageError::ForeignOrigin {
                origin: self.origin,
            });
        }
        PageMessage::from_value(self.data)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum PageMessage {
    #[serde(rename_all = "camelCase")]
    AttemptLogin {
        #[serde(default)]
        email: String,
        #[serde(default, deserialize_with = "deserialize_optional_secret")]
        password: Option<SecretString>,
        #[serde(default, deserialize_with = "deserialize_lenient_bool")]
        choose_what_to_sync: Option<bool>,
    },
    DialogShown,
    DialogHidden,
    BackButton {
        #[serde(default)]
        show: bool,
    },
    ShowView,
    MenuItemClicked {
        #[serde(default)]
        item: Value,
    },
    #[serde(rename_all = "camelCase")]
    IdentifierEntered {
        #[serde(default)]
        account_identifier: String,
    },
    UserInfo {
        #[serde(default)]
        services: Option<Value>,
    },
    ShowIncognito,
}

/// A non-boolean flag reads as absent instead of rejecting the message.
fn deserialize_lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_bool())
}

impl PageMessage {
    pub fn from_value(data: Value) -> Result<Self, MessageError> {
        let method = match data.get("method").and_then(Value::as_str) {
            Some(method) => method.to_string(),
            None => return Err(MessageError::MissingMethod),
        };
        serde_json::from_value(data)
            .map_err(|source| MessageError::Unrecognized { method, source })
    }

    /// Wire name of the message, for logging.
    pub fn method(&self) -> &'static str {
        match self {
            PageMessage::AttemptLogin { .. } => "attemptLogin",
            PageMessage::DialogShown => "dialogShown",
            PageMessage::DialogHidden => "dialogHidden",
            PageMessage::BackButton { .. } => "backButton",
            PageMessage::ShowView => "showView",
            PageMessage::MenuItemClicked { .. } => "menuItemClicked",
            PageMessage::IdentifierEntered { .. } => "identifierEntered",
            PageMessage::UserInfo { .. } => "userInfo",
            PageMessage::ShowIncognito => "showIncognito",
        }
    }
}

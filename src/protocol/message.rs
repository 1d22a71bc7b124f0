use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;

use super::present;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawText {
    Text(String),
    Other(Value),
}

/// Body of `POST /message`.
#[derive(Debug, Default, Deserialize)]
pub struct MessageInput {
    #[serde(default, deserialize_with = "present")]
    pub message: Option<RawText>,
}

impl MessageInput {
    pub fn validate(self) -> Result<String, AppError> {
        match self.message {
            None => Err(AppError::FieldNotFound("message")),
            Some(RawText::Text(message)) => Ok(message),
            Some(RawText::Other(_)) => Err(AppError::FieldTypeInvalid(Some("message"))),
        }
    }
}

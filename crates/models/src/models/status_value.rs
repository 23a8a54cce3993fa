use crate::models;
use serde::{Deserialize, Serialize};

/// StatusValue : A status given either by its numeric code or by its name
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Code(u8),
    Name(String),
}

impl Default for StatusValue {
    fn default() -> StatusValue {
        Self::Code(0)
    }
}

impl std::fmt::Display for StatusValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{}", code),
            Self::Name(name) => write!(f, "{}", name),
        }
    }
}

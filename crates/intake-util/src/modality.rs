//! Interview modality

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an interview slot is conducted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    InPerson,
    Virtual,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InPerson => "in_person",
            Self::Virtual => "virtual",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_person" => Ok(Self::InPerson),
            "virtual" => Ok(Self::Virtual),
            other => Err(format!("unknown modality '{other}'")),
        }
    }
}

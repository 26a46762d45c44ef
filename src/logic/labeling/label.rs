use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Weak labels, in cascade precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FileLabel {
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "netcdf")]
    Netcdf,
    #[serde(rename = "json/xml")]
    JsonXml,
    #[serde(rename = "tabular")]
    Tabular,
    #[serde(rename = "freetext")]
    FreeText,
    #[serde(rename = "unknown")]
    Unknown,
}

impl FileLabel {
    pub const ALL: [FileLabel; 6] = [
        FileLabel::Image,
        FileLabel::Netcdf,
        FileLabel::JsonXml,
        FileLabel::Tabular,
        FileLabel::FreeText,
        FileLabel::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileLabel::Image => "image",
            FileLabel::Netcdf => "netcdf",
            FileLabel::JsonXml => "json/xml",
            FileLabel::Tabular => "tabular",
            FileLabel::FreeText => "freetext",
            FileLabel::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FileLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileLabel::ALL
            .iter()
            .find(|l| l.as_str() == s.trim())
            .copied()
            .ok_or_else(|| format!("unrecognized label {:?}", s))
    }
}

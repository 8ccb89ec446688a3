//! Link-list responses.
//!
//! Collection endpoints answer with a list of link entries, each carrying its
//! fields as a `[{name, value}]` attribute list rather than as object keys.

use serde::{Deserialize, Serialize};

/// One `{name, value}` pair from a link entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// A single entry of a link collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub rel: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl LinkEntry {
    /// Value of the first attribute with the given name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .and_then(|attribute| attribute.value.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCollection {
    #[serde(default)]
    pub link: Vec<LinkEntry>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl LinkCollection {
    /// Number of matches reported by the server, falling back to the entries present.
    pub fn match_count(&self) -> u64 {
        self.total.unwrap_or(self.link.len() as u64)
    }
}

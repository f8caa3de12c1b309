//! Content
//!
//! Immutable, content-addressed payloads. A content object carries an opaque payload and
//! an ordered list of named links to other content objects; the link names form the paths
//! that merges reason about.

pub mod storage;

pub use storage::ContentStore;

use crate::types::Address;
use serde::{Deserialize, Serialize};

/// Named reference to another content object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    pub address: Address,
}

impl Link {
    pub fn new(name: impl Into<String>, address: impl Into<Address>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Payload plus outgoing links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub payload: Vec<u8>,
    pub links: Vec<Link>,
}

impl Content {
    pub fn new(payload: Vec<u8>, links: Vec<Link>) -> Self {
        Self { payload, links }
    }

    /// Content with a payload and no links
    pub fn leaf(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            links: Vec::new(),
        }
    }

    pub fn with_link(mut self, name: impl Into<String>, address: impl Into<Address>) -> Self {
        self.links.push(Link::new(name, address));
        self
    }

    /// First link with the given name
    pub fn link(&self, name: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.name == name)
    }
}

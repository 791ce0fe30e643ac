//! Candidate OS images
//!
//! The image service of a cloud reports images with an id, a name, a
//! visibility, and free-form metadata properties. Catalog versions select
//! among these, and a cloud's exclude filter hides some of them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Image visibility as reported by the image service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageVisibility {
    Public,
    Private,
    Shared,
    Community,
}

impl ImageVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageVisibility::Public => "public",
            ImageVisibility::Private => "private",
            ImageVisibility::Shared => "shared",
            ImageVisibility::Community => "community",
        }
    }
}

impl fmt::Display for ImageVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageVisibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "shared" => Ok(Self::Shared),
            "community" => Ok(Self::Community),
            other => Err(other.to_string()),
        }
    }
}

/// An image offered by a cloud
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub id: String,
    pub name: String,
    pub visibility: ImageVisibility,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ImageMetadata {
    pub fn new(id: impl Into<String>, name: impl Into<String>, visibility: ImageVisibility) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            visibility,
            properties: BTreeMap::new(),
        }
    }

    /// Attach a metadata property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Look up a metadata property
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

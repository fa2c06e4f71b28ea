// ABOUTME: Rust models for a decoded OPDS 1.x catalog feed.
// ABOUTME: Feed owns its entries and links; entries own authors, categories, links, and series.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OPDS link relation values.
pub mod rel {
    pub const ACQUISITION: &str = "http://opds-spec.org/acquisition";
    pub const IMAGE: &str = "http://opds-spec.org/image";
    pub const THUMBNAIL: &str = "http://opds-spec.org/image/thumbnail";
}

/// OPDS catalog MIME types.
pub mod mime {
    pub const ACQUISITION_FEED: &str =
        "application/atom+xml;profile=opds-catalog;kind=acquisition";
    pub const NAVIGATION_FEED: &str = "application/atom+xml;profile=opds-catalog;kind=navigation";
}

/// Whether a feed lists sub-catalogs or obtainable items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Navigation,
    Acquisition,
}

/// Image relation kinds that can be looked up on a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRel {
    /// `http://opds-spec.org/image/thumbnail`
    Thumbnail,
    /// `http://opds-spec.org/image`
    Image,
}

impl ImageRel {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageRel::Thumbnail => rel::THUMBNAIL,
            ImageRel::Image => rel::IMAGE,
        }
    }
}

/// Price attached to a buy or borrow link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub currency_code: String,
    pub value: f64,
}

/// One step of a chained acquisition ("buy here, then download as EPUB").
/// Nesting follows the XML nesting, so the tree is finite and acyclic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndirectAcquisition {
    pub acquisition_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<IndirectAcquisition>,
}

/// A typed reference to another resource (sub-catalog, download, image, facet).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    pub link_type: String,
    pub title: String,
    pub facet_group: String,
    pub count: u64,
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indirect_acquisitions: Vec<IndirectAcquisition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub uri: String,
}

/// Category with a scheme and term for machine handling plus a display label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub scheme: String,
    pub term: String,
    pub label: String,
}

/// Series information from schema.org (`<schema:Series name=".." position="3.5"/>`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Serie {
    pub name: String,
    pub url: String,
    pub position: f32,
}

/// Summary or content body. `content` is the inner markup exactly as it
/// appeared in the document; `content_type` is the `type` attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub content: String,
    pub content_type: String,
}

/// A single catalog entry: a publication, or a pointer to a sub-catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub title: String,
    pub id: String,
    pub identifier: String,
    pub updated: Option<DateTime<Utc>>,
    pub rights: String,
    pub publisher: String,
    pub authors: Vec<Author>,
    pub language: String,
    /// Publication date as written; formats vary too much to parse reliably.
    pub issued: String,
    pub published: Option<DateTime<Utc>>,
    pub categories: Vec<Category>,
    pub links: Vec<Link>,
    pub summary: Content,
    pub content: Content,
    pub series: Vec<Serie>,
    /// Vendor metadata. Empty until `parse_calibre_metadata` runs.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub app_meta: HashMap<String, String>,
}

/// Root of a navigation or acquisition feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub id: String,
    pub title: String,
    pub updated: Option<DateTime<Utc>>,
    pub entries: Vec<Entry>,
    pub links: Vec<Link>,
    pub total_results: u64,
    pub items_per_page: u64,
}

// ABOUTME: OPDS 1.x catalog feed library.
// ABOUTME: Provides feed decoding, navigation/acquisition classification, Calibre metadata, and HTTP fetch.

pub mod calibre;
pub mod classify;
pub mod client;
pub mod error;
pub mod models;
pub mod options;
pub mod parser;
pub mod time_parse;

pub use calibre::{extract_calibre_fields, split_series, CALIBRE_KEYWORDS};
pub use client::{parse_response, parse_url, Client};
pub use error::FeedError;
pub use models::{
    mime, rel, Author, Category, Content, Entry, Feed, FeedKind, ImageRel, IndirectAcquisition,
    Link, Price, Serie,
};
pub use options::{ClientBuilder, DecodeMode, Options};
pub use parser::{parse_feed_bytes, parse_feed_bytes_with, parse_feed_reader};
pub use time_parse::parse_timestamp;

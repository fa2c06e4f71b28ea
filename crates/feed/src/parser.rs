// ABOUTME: OPDS 1.x feed decoding on top of the quick-xml event reader.
// ABOUTME: Maps Atom/OPDS elements onto the Feed model, leniently or strictly per DecodeMode.

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::{debug, warn};

use crate::error::FeedError;
use crate::models::{
    Author, Category, Content, Entry, Feed, IndirectAcquisition, Link, Price, Serie,
};
use crate::options::DecodeMode;
use crate::time_parse::parse_timestamp;

/// Deepest `indirectAcquisition` chain that is decoded; anything below is skipped.
pub const MAX_INDIRECT_DEPTH: usize = 32;

/// Decodes feed bytes leniently (malformed input yields a partial feed, never an error).
pub fn parse_feed_bytes(data: &[u8]) -> Result<Feed, FeedError> {
    parse_feed_bytes_with(data, DecodeMode::Lenient)
}

/// Decodes feed bytes using the given error policy.
///
/// # Returns
/// * `Ok(Feed)` - In lenient mode, always; the feed holds everything decoded
///   before the first structural error.
/// * `Err(FeedError::Decode)` - Strict mode only: malformed XML, a root other
///   than `<feed>`, or a value that failed type conversion.
pub fn parse_feed_bytes_with(data: &[u8], mode: DecodeMode) -> Result<Feed, FeedError> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    let mut feed = Feed::default();
    let mut decoder = Decoder::new(data, mode);

    match decoder.document(&mut feed) {
        Ok(()) => {}
        Err(err) if mode == DecodeMode::Lenient => {
            warn!(
                error = %err,
                entries = feed.entries.len(),
                "feed decoding stopped early, returning partial feed"
            );
        }
        Err(err) => return Err(err),
    }

    debug!(
        id = %feed.id,
        entries = feed.entries.len(),
        links = feed.links.len(),
        "decoded OPDS feed"
    );
    Ok(feed)
}

/// Reads the whole stream, then decodes it. A failing reader is a `Read` error.
pub fn parse_feed_reader<R: Read>(mut reader: R, mode: DecodeMode) -> Result<Feed, FeedError> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).map_err(FeedError::read)?;
    parse_feed_bytes_with(&buf, mode)
}

struct Decoder<'a> {
    reader: Reader<&'a [u8]>,
    data: &'a [u8],
    mode: DecodeMode,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8], mode: DecodeMode) -> Self {
        let mut reader = Reader::from_reader(data);
        // `<link .../>` arrives as Start + End, so every element is handled the same way
        reader.config_mut().expand_empty_elements = true;
        Self { reader, data, mode }
    }

    fn next(&mut self) -> Result<Event<'a>, FeedError> {
        self.reader.read_event().map_err(|err| {
            FeedError::Decode(format!("{} at byte {}", err, self.reader.error_position()))
        })
    }

    /// Strict mode turns the problem into an error; lenient mode logs it and carries on.
    fn tolerate(&self, what: &str, cause: impl fmt::Display) -> Result<(), FeedError> {
        match self.mode {
            DecodeMode::Strict => Err(FeedError::Decode(format!("{what}: {cause}"))),
            DecodeMode::Lenient => {
                warn!(problem = what, cause = %cause, "ignoring malformed feed data");
                Ok(())
            }
        }
    }

    fn document(&mut self, feed: &mut Feed) -> Result<(), FeedError> {
        loop {
            match self.next()? {
                Event::Start(root) => {
                    if root.local_name().as_ref() != b"feed" {
                        self.tolerate(
                            "unexpected root element",
                            format!("expected <feed>, found <{}>", local_name(&root)),
                        )?;
                    }
                    return self.feed(&root, feed);
                }
                Event::Eof => return self.tolerate("empty document", "no root element"),
                _ => {}
            }
        }
    }

    fn feed(&mut self, start: &BytesStart<'a>, feed: &mut Feed) -> Result<(), FeedError> {
        loop {
            match self.next()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"id" => feed.id = self.text(&e)?,
                    b"title" => feed.title = self.text(&e)?,
                    b"updated" => feed.updated = self.timestamp(&e)?,
                    b"totalResults" => feed.total_results = self.number(&e)?,
                    b"itemsPerPage" => feed.items_per_page = self.number(&e)?,
                    b"entry" => {
                        let entry = self.entry(&e)?;
                        feed.entries.push(entry);
                    }
                    b"link" => {
                        let link = self.link(&e)?;
                        feed.links.push(link);
                    }
                    _ => self.skip(&e)?,
                },
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(unexpected_eof(start)),
                _ => {}
            }
        }
    }

    fn entry(&mut self, start: &BytesStart<'a>) -> Result<Entry, FeedError> {
        let mut entry = Entry::default();
        loop {
            match self.next()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"title" => entry.title = self.text(&e)?,
                    b"id" => entry.id = self.text(&e)?,
                    b"identifier" => entry.identifier = self.text(&e)?,
                    b"updated" => entry.updated = self.timestamp(&e)?,
                    b"published" => entry.published = self.timestamp(&e)?,
                    b"rights" => entry.rights = self.text(&e)?,
                    b"publisher" => entry.publisher = self.text(&e)?,
                    b"language" => entry.language = self.text(&e)?,
                    b"issued" => entry.issued = self.text(&e)?,
                    b"author" => {
                        let author = self.author(&e)?;
                        entry.authors.push(author);
                    }
                    b"category" => {
                        let category = self.category(&e)?;
                        entry.categories.push(category);
                    }
                    b"link" => {
                        let link = self.link(&e)?;
                        entry.links.push(link);
                    }
                    b"summary" => entry.summary = self.content(&e)?,
                    b"content" => entry.content = self.content(&e)?,
                    b"Series" => {
                        let serie = self.serie(&e)?;
                        entry.series.push(serie);
                    }
                    _ => self.skip(&e)?,
                },
                Event::End(_) => return Ok(entry),
                Event::Eof => return Err(unexpected_eof(start)),
                _ => {}
            }
        }
    }

    fn author(&mut self, start: &BytesStart<'a>) -> Result<Author, FeedError> {
        let mut author = Author::default();
        loop {
            match self.next()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"name" => author.name = self.text(&e)?,
                    b"uri" => author.uri = self.text(&e)?,
                    _ => self.skip(&e)?,
                },
                Event::End(_) => return Ok(author),
                Event::Eof => return Err(unexpected_eof(start)),
                _ => {}
            }
        }
    }

    fn category(&mut self, start: &BytesStart<'a>) -> Result<Category, FeedError> {
        let mut category = Category::default();
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "scheme" => category.scheme = value,
                "term" => category.term = value,
                "label" => category.label = value,
                _ => {}
            }
        }
        self.skip(start)?;
        Ok(category)
    }

    fn serie(&mut self, start: &BytesStart<'a>) -> Result<Serie, FeedError> {
        let mut serie = Serie::default();
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "name" => serie.name = value,
                "url" => serie.url = value,
                "position" => serie.position = self.convert("Series position", &value)?,
                _ => {}
            }
        }
        self.skip(start)?;
        Ok(serie)
    }

    fn link(&mut self, start: &BytesStart<'a>) -> Result<Link, FeedError> {
        let mut link = Link::default();
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "rel" => link.rel = value,
                "href" => link.href = value,
                "type" => link.link_type = value,
                "title" => link.title = value,
                "facetGroup" => link.facet_group = value,
                "count" => link.count = self.convert("link count", &value)?,
                _ => {}
            }
        }

        loop {
            match self.next()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"price" => link.price = Some(self.price(&e)?),
                    b"indirectAcquisition" => {
                        let node = self.indirect_acquisition(&e, 1)?;
                        link.indirect_acquisitions.push(node);
                    }
                    _ => self.skip(&e)?,
                },
                Event::End(_) => return Ok(link),
                Event::Eof => return Err(unexpected_eof(start)),
                _ => {}
            }
        }
    }

    fn price(&mut self, start: &BytesStart<'a>) -> Result<Price, FeedError> {
        let mut price = Price::default();
        for (key, value) in self.attributes(start)? {
            if key == "currencycode" {
                price.currency_code = value;
            }
        }
        let body = self.text(start)?;
        price.value = self.convert("price", &body)?;
        Ok(price)
    }

    fn indirect_acquisition(
        &mut self,
        start: &BytesStart<'a>,
        depth: usize,
    ) -> Result<IndirectAcquisition, FeedError> {
        let mut node = IndirectAcquisition::default();
        for (key, value) in self.attributes(start)? {
            if key == "type" {
                node.acquisition_type = value;
            }
        }

        loop {
            match self.next()? {
                Event::Start(e) if e.local_name().as_ref() == b"indirectAcquisition" => {
                    if depth >= MAX_INDIRECT_DEPTH {
                        self.tolerate(
                            "indirectAcquisition nesting too deep",
                            format!("limit is {MAX_INDIRECT_DEPTH}"),
                        )?;
                        self.skip(&e)?;
                        continue;
                    }
                    let child = self.indirect_acquisition(&e, depth + 1)?;
                    node.children.push(child);
                }
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => return Ok(node),
                Event::Eof => return Err(unexpected_eof(start)),
                _ => {}
            }
        }
    }

    /// Keeps the inner markup verbatim, the way Calibre's metadata lines need it.
    fn content(&mut self, start: &BytesStart<'a>) -> Result<Content, FeedError> {
        let mut content = Content::default();
        for (key, value) in self.attributes(start)? {
            if key == "type" {
                content.content_type = value;
            }
        }
        let span = self
            .reader
            .read_to_end(start.name())
            .map_err(FeedError::decode)?;
        let inner = &self.data[span.start as usize..span.end as usize];
        content.content = String::from_utf8_lossy(inner).into_owned();
        Ok(content)
    }

    /// Collects the element's own character data; nested elements are skipped.
    fn text(&mut self, start: &BytesStart<'a>) -> Result<String, FeedError> {
        let mut out = String::new();
        loop {
            match self.next()? {
                Event::Text(t) => match t.decode() {
                    Ok(text) => out.push_str(&text),
                    Err(err) => self.tolerate("undecodable text", err)?,
                },
                Event::CData(c) => out.push_str(&String::from_utf8_lossy(&c)),
                Event::GeneralRef(r) => self.push_reference(&mut out, &r)?,
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => return Ok(out),
                Event::Eof => return Err(unexpected_eof(start)),
                _ => {}
            }
        }
    }

    fn push_reference(&self, out: &mut String, reference: &BytesRef<'_>) -> Result<(), FeedError> {
        match reference.resolve_char_ref() {
            Ok(Some(ch)) => {
                out.push(ch);
                return Ok(());
            }
            Ok(None) => {}
            Err(err) => return self.tolerate("invalid character reference", err),
        }

        let name = match reference.decode() {
            Ok(name) => name.into_owned(),
            Err(err) => return self.tolerate("undecodable entity reference", err),
        };
        match resolve_predefined_entity(&name) {
            Some(resolved) => out.push_str(resolved),
            None => {
                self.tolerate("unknown entity", format!("&{name};"))?;
                out.push('&');
                out.push_str(&name);
                out.push(';');
            }
        }
        Ok(())
    }

    fn timestamp(&mut self, start: &BytesStart<'a>) -> Result<Option<DateTime<Utc>>, FeedError> {
        let text = self.text(start)?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        match parse_timestamp(&text) {
            Some(dt) => Ok(Some(dt)),
            None => {
                self.tolerate(
                    &format!("invalid timestamp in <{}>", local_name(start)),
                    text.trim(),
                )?;
                Ok(None)
            }
        }
    }

    fn number<T>(&mut self, start: &BytesStart<'a>) -> Result<T, FeedError>
    where
        T: FromStr + Default,
        T::Err: fmt::Display,
    {
        let text = self.text(start)?;
        self.convert(&local_name(start), &text)
    }

    /// Converts a scalar, treating blank text as the type's zero value.
    fn convert<T>(&self, field: &str, raw: &str) -> Result<T, FeedError>
    where
        T: FromStr + Default,
        T::Err: fmt::Display,
    {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(T::default());
        }
        match trimmed.parse::<T>() {
            Ok(value) => Ok(value),
            Err(err) => {
                self.tolerate(&format!("invalid {field} {trimmed:?}"), err)?;
                Ok(T::default())
            }
        }
    }

    /// Attribute (local name, unescaped value) pairs in document order.
    fn attributes(&self, start: &BytesStart<'_>) -> Result<Vec<(String, String)>, FeedError> {
        let mut pairs = Vec::new();
        for attr in start.attributes() {
            let attr = match attr {
                Ok(attr) => attr,
                Err(err) => {
                    self.tolerate("malformed attribute", err)?;
                    continue;
                }
            };
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = match attr.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(err) => {
                    self.tolerate("malformed attribute value", err)?;
                    String::from_utf8_lossy(&attr.value).into_owned()
                }
            };
            pairs.push((key, value));
        }
        Ok(pairs)
    }

    fn skip(&mut self, start: &BytesStart<'a>) -> Result<(), FeedError> {
        self.reader
            .read_to_end(start.name())
            .map(|_| ())
            .map_err(FeedError::decode)
    }
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn unexpected_eof(start: &BytesStart<'_>) -> FeedError {
    FeedError::Decode(format!(
        "unexpected end of document inside <{}>",
        local_name(start)
    ))
}

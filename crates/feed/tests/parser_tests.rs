// ABOUTME: Integration tests for OPDS feed decoding.
// ABOUTME: Covers the element mapping, verbatim content, and lenient vs strict error handling.

use chrono::{TimeZone, Utc};
use opds_feed::{
    parse_feed_bytes, parse_feed_bytes_with, Author, Category, DecodeMode, FeedKind,
    IndirectAcquisition, Price, Serie,
};
use pretty_assertions::assert_eq;

const ACQUISITION_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"
      xmlns:dc="http://purl.org/dc/terms/"
      xmlns:opds="http://opds-spec.org/2010/catalog"
      xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/"
      xmlns:schema="http://schema.org/">
  <id>urn:uuid:433a5d6a-0b8c-4933-af65-4ca4f02763eb</id>
  <title>Unpopular Publications</title>
  <updated>2010-01-10T10:01:11Z</updated>
  <opensearch:totalResults>1</opensearch:totalResults>
  <opensearch:itemsPerPage>50</opensearch:itemsPerPage>
  <link rel="self" href="/opds-catalogs/unpopular.xml"
        type="application/atom+xml;profile=opds-catalog;kind=acquisition"/>
  <link rel="http://opds-spec.org/facet" href="/sci-fi" title="Science-Fiction"
        opds:facetGroup="Categories" thr:count="600" xmlns:thr="http://purl.org/syndication/thread/1.0"/>
  <link rel="http://opds-spec.org/image/thumbnail" href="/covers/feed-thumb.png" type="image/png"/>
  <link rel="http://opds-spec.org/image" href="/covers/feed.jpg" type="image/jpeg"/>
  <entry>
    <title>Bob, Son of Bob</title>
    <id>urn:uuid:6409a00b-7bf2-405e-826c-3fdff0fd0734</id>
    <dc:identifier>urn:isbn:978-3-16-148410-0</dc:identifier>
    <updated>2010-01-10T10:01:11Z</updated>
    <published>2009-05-01T08:00:00+02:00</published>
    <rights>Copyright (c) 2009, Bob &amp; Co.</rights>
    <dc:publisher>Ghost Press</dc:publisher>
    <dc:language>en</dc:language>
    <dc:issued>1917</dc:issued>
    <author>
      <name>Bob the Recursive</name>
      <uri>http://opds-spec.org/authors/1285</uri>
    </author>
    <author>
      <name>Bob Jr.</name>
    </author>
    <category scheme="http://www.bisg.org/standards/bisac_subject/" term="FIC020000" label="General"/>
    <schema:Series name="Bob Saga" url="http://example.com/series/bob" position="3.5"/>
    <summary type="text">The story of the son of the Bob.</summary>
    <content type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml">RATING: ★★★★<br/>
TAGS: Fantasy, Recursion<br/>
SERIES: Bob Saga [3.50]<br/>
<p>The <em>story</em> &amp; more.</p></div></content>
    <link rel="http://opds-spec.org/image" href="/covers/4561.lrg.png" type="image/png"/>
    <link rel="http://opds-spec.org/acquisition/buy" href="/content/buy/11241.epub" type="text/html">
      <opds:price currencycode="USD">18.99</opds:price>
      <opds:indirectAcquisition type="application/vnd.adobe.adept+xml">
        <opds:indirectAcquisition type="application/epub+zip"/>
      </opds:indirectAcquisition>
    </link>
  </entry>
</feed>"#;

const NAVIGATION_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <id>urn:uuid:2853dacf-ed79-42f5-8e8a-a7bb3d1ae6a2</id>
  <title>OPDS Catalog Root Example</title>
  <updated>2010-01-10T10:03:10Z</updated>
  <link rel="http://opds-spec.org/image/thumbnail" href="/root-thumb.png"/>
  <entry>
    <title>Popular Publications</title>
    <link rel="http://opds-spec.org/sort/popular" href="/opds-catalogs/popular.xml"
          type="application/atom+xml;profile=opds-catalog;kind=navigation"/>
    <id>urn:uuid:d49e8018-a0e0-499e-9423-7c175fa0c56e</id>
    <content type="text">Popular publications from this catalog.</content>
  </entry>
  <entry>
    <title>New Publications</title>
    <link rel="http://opds-spec.org/sort/new" href="/opds-catalogs/new.xml"
          type="application/atom+xml;profile=opds-catalog;kind=navigation"/>
    <id>urn:uuid:d49e8018-a0e0-499e-9423-7c175fa0c56c</id>
    <content type="text">RATING: ★<br/> ignored outside acquisition feeds</content>
  </entry>
</feed>"#;

/// Every mapped element and attribute comes back with its literal text.
#[test]
fn test_acquisition_feed_field_mapping() {
    let feed = parse_feed_bytes(ACQUISITION_FEED.as_bytes()).unwrap();

    assert_eq!(feed.id, "urn:uuid:433a5d6a-0b8c-4933-af65-4ca4f02763eb");
    assert_eq!(feed.title, "Unpopular Publications");
    assert_eq!(
        feed.updated,
        Some(Utc.with_ymd_and_hms(2010, 1, 10, 10, 1, 11).unwrap())
    );
    assert_eq!(feed.total_results, 1);
    assert_eq!(feed.items_per_page, 50);
    assert_eq!(feed.links.len(), 4, "feed-level links in document order");

    let facet = &feed.links[1];
    assert_eq!(facet.rel, "http://opds-spec.org/facet");
    assert_eq!(facet.title, "Science-Fiction");
    assert_eq!(facet.facet_group, "Categories");
    assert_eq!(facet.count, 600);

    assert_eq!(feed.entries.len(), 1);
    let entry = &feed.entries[0];
    assert_eq!(entry.title, "Bob, Son of Bob");
    assert_eq!(entry.id, "urn:uuid:6409a00b-7bf2-405e-826c-3fdff0fd0734");
    assert_eq!(entry.identifier, "urn:isbn:978-3-16-148410-0");
    assert_eq!(entry.rights, "Copyright (c) 2009, Bob & Co.");
    assert_eq!(entry.publisher, "Ghost Press");
    assert_eq!(entry.language, "en");
    assert_eq!(entry.issued, "1917");
    assert_eq!(
        entry.published,
        Some(Utc.with_ymd_and_hms(2009, 5, 1, 6, 0, 0).unwrap())
    );
    assert_eq!(
        entry.authors,
        vec![
            Author {
                name: "Bob the Recursive".to_string(),
                uri: "http://opds-spec.org/authors/1285".to_string(),
            },
            Author {
                name: "Bob Jr.".to_string(),
                uri: String::new(),
            },
        ]
    );
    assert_eq!(
        entry.categories,
        vec![Category {
            scheme: "http://www.bisg.org/standards/bisac_subject/".to_string(),
            term: "FIC020000".to_string(),
            label: "General".to_string(),
        }]
    );
    assert_eq!(
        entry.series,
        vec![Serie {
            name: "Bob Saga".to_string(),
            url: "http://example.com/series/bob".to_string(),
            position: 3.5,
        }]
    );
    assert_eq!(entry.summary.content, "The story of the son of the Bob.");
    assert_eq!(entry.summary.content_type, "text");
    assert!(
        entry.app_meta.is_empty(),
        "decoding never populates app_meta"
    );
}

#[test]
fn test_acquisition_link_price_and_indirect_chain() {
    let feed = parse_feed_bytes(ACQUISITION_FEED.as_bytes()).unwrap();
    let buy = &feed.entries[0].links[1];

    assert_eq!(buy.rel, "http://opds-spec.org/acquisition/buy");
    assert_eq!(buy.href, "/content/buy/11241.epub");
    assert_eq!(buy.link_type, "text/html");
    assert_eq!(
        buy.price,
        Some(Price {
            currency_code: "USD".to_string(),
            value: 18.99,
        })
    );
    assert_eq!(
        buy.indirect_acquisitions,
        vec![IndirectAcquisition {
            acquisition_type: "application/vnd.adobe.adept+xml".to_string(),
            children: vec![IndirectAcquisition {
                acquisition_type: "application/epub+zip".to_string(),
                children: vec![],
            }],
        }]
    );
    assert_eq!(feed.entries[0].links[0].price, None);
}

/// Content keeps its inner markup byte for byte, entities included.
#[test]
fn test_content_inner_markup_is_verbatim() {
    let feed = parse_feed_bytes(ACQUISITION_FEED.as_bytes()).unwrap();
    let content = &feed.entries[0].content;

    assert_eq!(content.content_type, "xhtml");
    assert_eq!(
        content.content,
        "<div xmlns=\"http://www.w3.org/1999/xhtml\">RATING: ★★★★<br/>\n\
         TAGS: Fantasy, Recursion<br/>\n\
         SERIES: Bob Saga [3.50]<br/>\n\
         <p>The <em>story</em> &amp; more.</p></div>"
    );
}

#[test]
fn test_navigation_feed_decodes() {
    let feed = parse_feed_bytes(NAVIGATION_FEED.as_bytes()).unwrap();

    assert_eq!(feed.entries.len(), 2);
    assert_eq!(feed.kind(), FeedKind::Navigation);
    assert_eq!(
        feed.entries[1].links[0].link_type,
        "application/atom+xml;profile=opds-catalog;kind=navigation"
    );
}

/// Lenient mode keeps the entries that closed before the document broke off.
#[test]
fn test_truncated_document_lenient_returns_partial_feed() {
    let cut = NAVIGATION_FEED
        .find("<title>New Publications</title>")
        .unwrap();
    let truncated = &NAVIGATION_FEED[..cut];

    let feed = parse_feed_bytes(truncated.as_bytes()).unwrap();
    assert_eq!(feed.title, "OPDS Catalog Root Example");
    assert_eq!(feed.links.len(), 1);
    assert_eq!(feed.entries.len(), 1, "only the completed entry is kept");
    assert_eq!(feed.entries[0].title, "Popular Publications");
}

#[test]
fn test_truncated_document_strict_is_decode_error() {
    let truncated = &NAVIGATION_FEED[..NAVIGATION_FEED.len() / 2];
    let err = parse_feed_bytes_with(truncated.as_bytes(), DecodeMode::Strict).unwrap_err();
    assert!(err.is_decode(), "expected Decode error, got {err:?}");
}

#[test]
fn test_mismatched_end_tag() {
    let xml = "<feed><id>a</id><entry><title>x</entry></feed>";

    let feed = parse_feed_bytes(xml.as_bytes()).unwrap();
    assert_eq!(feed.id, "a");
    assert!(feed.entries.is_empty());

    assert!(parse_feed_bytes_with(xml.as_bytes(), DecodeMode::Strict)
        .unwrap_err()
        .is_decode());
}

/// A bad value only blanks its own field in lenient mode.
#[test]
fn test_bad_values_lenient_vs_strict() {
    let xml = r#"<feed>
        <updated>last tuesday</updated>
        <totalResults>many</totalResults>
        <entry>
            <title>Still here</title>
            <link rel="http://opds-spec.org/acquisition" href="/b.epub" count="-3">
                <price currencycode="EUR">free</price>
            </link>
        </entry>
    </feed>"#;

    let feed = parse_feed_bytes(xml.as_bytes()).unwrap();
    assert_eq!(feed.updated, None);
    assert_eq!(feed.total_results, 0);
    assert_eq!(feed.entries[0].title, "Still here");
    let link = &feed.entries[0].links[0];
    assert_eq!(link.count, 0);
    assert_eq!(
        link.price,
        Some(Price {
            currency_code: "EUR".to_string(),
            value: 0.0,
        })
    );

    let err = parse_feed_bytes_with(xml.as_bytes(), DecodeMode::Strict).unwrap_err();
    assert!(
        err.to_string().contains("invalid timestamp"),
        "first bad value should be reported, got: {err}"
    );
}

#[test]
fn test_non_feed_root() {
    let xml = "<catalog><title>Not Atom</title></catalog>";

    let feed = parse_feed_bytes(xml.as_bytes()).unwrap();
    assert_eq!(feed.title, "Not Atom");

    let err = parse_feed_bytes_with(xml.as_bytes(), DecodeMode::Strict).unwrap_err();
    assert!(err.to_string().contains("expected <feed>"));
}

#[test]
fn test_empty_input() {
    let feed = parse_feed_bytes(b"").unwrap();
    assert!(feed.entries.is_empty());
    assert!(feed.is_navigation());

    assert!(parse_feed_bytes_with(b"", DecodeMode::Strict)
        .unwrap_err()
        .is_decode());
}

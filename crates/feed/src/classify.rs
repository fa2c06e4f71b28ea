// ABOUTME: Navigation vs acquisition classification and image link lookup for decoded feeds.
// ABOUTME: Classification is recomputed from entry links on every call; nothing is cached on the Feed.

use crate::models::{mime, rel, Feed, FeedKind, ImageRel, Link};

impl Link {
    /// True if this link obtains the publication: any `http://opds-spec.org/acquisition*`
    /// relation, or a link to an acquisition feed.
    pub fn is_acquisition(&self) -> bool {
        self.rel.starts_with(rel::ACQUISITION) || self.link_type == mime::ACQUISITION_FEED
    }
}

impl Feed {
    /// Classifies the feed. A feed is acquisition iff some entry carries an
    /// acquisition link; a feed without entries is navigation.
    pub fn kind(&self) -> FeedKind {
        let acquisition = self
            .entries
            .iter()
            .flat_map(|entry| entry.links.iter())
            .any(Link::is_acquisition);

        if acquisition {
            FeedKind::Acquisition
        } else {
            FeedKind::Navigation
        }
    }

    pub fn is_navigation(&self) -> bool {
        self.kind() == FeedKind::Navigation
    }

    pub fn is_acquisition(&self) -> bool {
        self.kind() == FeedKind::Acquisition
    }

    /// First feed-level link whose relation is exactly `image_rel`.
    /// Navigation feeds never yield an image link.
    pub fn image_link_for(&self, image_rel: ImageRel) -> Option<&Link> {
        if !self.is_acquisition() {
            return None;
        }
        self.links.iter().find(|link| link.rel == image_rel.as_str())
    }

    pub fn thumbnail_link(&self) -> Option<&Link> {
        self.image_link_for(ImageRel::Thumbnail)
    }

    pub fn image_link(&self) -> Option<&Link> {
        self.image_link_for(ImageRel::Image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Entry;

    fn link(rel: &str, link_type: &str) -> Link {
        Link {
            rel: rel.to_string(),
            href: format!("/{}", rel.len()),
            link_type: link_type.to_string(),
            ..Default::default()
        }
    }

    fn feed_with_entry_links(links: Vec<Link>) -> Feed {
        Feed {
            entries: vec![Entry {
                links,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn empty_feed_is_navigation() {
        let feed = Feed::default();
        assert_eq!(feed.kind(), FeedKind::Navigation);
        assert!(feed.is_navigation());
        assert!(!feed.is_acquisition());
    }

    #[test]
    fn acquisition_subtypes_match_by_prefix() {
        for rel in [
            "http://opds-spec.org/acquisition",
            "http://opds-spec.org/acquisition/open-access",
            "http://opds-spec.org/acquisition/buy",
            "http://opds-spec.org/acquisition/borrow",
        ] {
            let feed = feed_with_entry_links(vec![link(rel, "application/epub+zip")]);
            assert!(feed.is_acquisition(), "{rel} should classify as acquisition");
        }
    }

    #[test]
    fn acquisition_feed_mime_type_matches_exactly() {
        let feed = feed_with_entry_links(vec![link("subsection", mime::ACQUISITION_FEED)]);
        assert!(feed.is_acquisition());

        let feed = feed_with_entry_links(vec![link(
            "subsection",
            "application/atom+xml; profile=opds-catalog; kind=acquisition",
        )]);
        assert!(feed.is_navigation());
    }

    #[test]
    fn navigation_links_only() {
        let feed = feed_with_entry_links(vec![
            link("subsection", mime::NAVIGATION_FEED),
            link("http://opds-spec.org/sort/new", mime::NAVIGATION_FEED),
            link(rel::THUMBNAIL, "image/png"),
        ]);
        assert!(feed.is_navigation());
    }

    #[test]
    fn feed_level_acquisition_links_do_not_count() {
        let feed = Feed {
            links: vec![link(rel::ACQUISITION, "application/epub+zip")],
            ..Default::default()
        };
        assert!(feed.is_navigation());
    }

    #[test]
    fn image_lookup_respects_exact_relation() {
        let mut feed = feed_with_entry_links(vec![link(rel::ACQUISITION, "")]);
        feed.links = vec![
            link(rel::IMAGE, "image/jpeg"),
            link(rel::THUMBNAIL, "image/png"),
            link(rel::THUMBNAIL, "image/gif"),
        ];

        assert_eq!(feed.thumbnail_link().unwrap().link_type, "image/png");
        assert_eq!(feed.image_link().unwrap().link_type, "image/jpeg");
    }

    #[test]
    fn image_lookup_is_none_for_navigation_feeds() {
        let feed = Feed {
            links: vec![link(rel::IMAGE, "image/jpeg")],
            ..Default::default()
        };
        assert!(feed.image_link().is_none());
        assert!(feed.thumbnail_link().is_none());
    }
}

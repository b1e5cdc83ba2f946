//! Card descriptors and the ingestion rules that turn a channel export into
//! the fixed, ordered card list the ring is built from.

use crate::geometry::Size;
use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use std::collections::HashSet;
use strum::{Display as StrumDisplay, EnumString};

const BLOCK_PAGE_BASE: &str = "https://www.are.na/block";

/// Hosts whose links point at a raw image file rather than a page worth
/// visiting.
const CDN_HOSTS: &[&str] = &["cdninstagram.com", "i.pinimg.com/originals"];

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct SourceUrl(String);

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct MediaRef(String);

crate::impl_string_newtype!(SourceUrl, MediaRef);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    DeserializeFromStr,
    EnumString,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    #[strum(serialize = "image", serialize = "img")]
    Image,
    #[strum(serialize = "video", serialize = "vid")]
    Video,
}

/// What the ingestion side hands over for each card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardDescriptor {
    pub title: String,
    pub media: MediaRef,
    /// Still shown for video cards until playback starts.
    pub poster: Option<MediaRef>,
    pub source: SourceUrl,
    pub kind: MediaKind,
    /// Intrinsic media size, when known. Drives the visual anchor.
    pub natural_size: Option<Size>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub index: usize,
    pub angular_offset: f64,
    pub title: String,
    pub media: MediaRef,
    pub poster: Option<MediaRef>,
    pub source: SourceUrl,
    pub kind: MediaKind,
    pub natural_size: Option<Size>,
}

impl Card {
    pub fn build(descriptors: Vec<CardDescriptor>) -> Vec<Card> {
        let count = descriptors.len();
        descriptors
            .into_iter()
            .enumerate()
            .map(|(index, d)| Card {
                index,
                angular_offset: 360.0 / count as f64 * index as f64,
                title: d.title,
                media: d.media,
                poster: d.poster,
                source: d.source,
                kind: d.kind,
                natural_size: d.natural_size,
            })
            .collect()
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageVersion {
    pub src: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockImage {
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub large: Option<ImageVersion>,
    #[serde(default)]
    pub medium: Option<ImageVersion>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl BlockImage {
    fn best_src(&self) -> Option<&str> {
        self.large
            .as_ref()
            .and_then(|v| v.src.as_deref())
            .or_else(|| self.medium.as_ref().and_then(|v| v.src.as_deref()))
            .or(self.src.as_deref())
    }

    fn size(&self) -> Option<Size> {
        let size = Size::new(self.width?, self.height?);
        (!size.is_degenerate()).then_some(size)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockSource {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockAttachment {
    pub content_type: Option<String>,
    pub url: Option<String>,
}

/// One entry of a channel export.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaBlock {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image: Option<BlockImage>,
    #[serde(default)]
    pub source: Option<BlockSource>,
    #[serde(default)]
    pub attachment: Option<BlockAttachment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelExport {
    #[serde(default)]
    pub data: Vec<MediaBlock>,
}

impl MediaBlock {
    /// The block's own link unless it only points at a CDN file, in which
    /// case the block page.
    pub fn source_url(&self) -> SourceUrl {
        self.source
            .as_ref()
            .and_then(|s| s.url.as_deref())
            .filter(|url| !CDN_HOSTS.iter().any(|host| url.contains(host)))
            .map(SourceUrl::new)
            .unwrap_or_else(|| SourceUrl::new(format!("{BLOCK_PAGE_BASE}/{}", self.id)))
    }

    pub fn kind(&self) -> MediaKind {
        let is_video = self
            .attachment
            .as_ref()
            .and_then(|a| a.content_type.as_deref())
            .is_some_and(|t| t.starts_with("video/"));
        if is_video && self.video_url().is_some() {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    fn video_url(&self) -> Option<&str> {
        self.attachment.as_ref().and_then(|a| a.url.as_deref())
    }

    fn descriptor(&self) -> Option<CardDescriptor> {
        let image = self.image.as_ref()?;
        let still = MediaRef::new(image.best_src()?);
        let kind = self.kind();
        let (media, poster) = match (kind, self.video_url()) {
            (MediaKind::Video, Some(url)) => (MediaRef::new(url), Some(still)),
            _ => (still, None),
        };
        Some(CardDescriptor {
            title: self.title.clone().unwrap_or_default(),
            media,
            poster,
            source: self.source_url(),
            kind,
            natural_size: image.size(),
        })
    }
}

/// Blocks without an image are skipped, repeats of an id are dropped and the
/// result is newest first.
pub fn ingest(blocks: &[MediaBlock]) -> Vec<CardDescriptor> {
    let mut seen = HashSet::new();
    let mut cards: Vec<CardDescriptor> = blocks
        .iter()
        .filter(|b| b.image.is_some())
        .filter(|b| seen.insert(b.id))
        .filter_map(MediaBlock::descriptor)
        .collect();
    cards.reverse();
    cards
}

pub fn parse_export(json: &str) -> Result<Vec<CardDescriptor>, crate::error::IngestError> {
    let export: ChannelExport = serde_json::from_str(json)?;
    let cards = ingest(&export.data);
    log::info!(
        "ingested {} cards from {} blocks",
        cards.len(),
        export.data.len()
    );
    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"{
        "data": [
            { "id": 1, "title": "first", "image": { "src": "a.jpg", "width": 800, "height": 600 },
              "source": { "url": "https://example.com/post" } },
            { "id": 2, "title": "text only" },
            { "id": 3, "image": { "medium": { "src": "c.jpg" } },
              "source": { "url": "https://scontent.cdninstagram.com/x.jpg" } },
            { "id": 1, "title": "dupe", "image": { "src": "dupe.jpg" } },
            { "id": 4, "image": { "large": { "src": "poster.jpg" } },
              "attachment": { "content_type": "video/mp4", "url": "clip.mp4" } }
        ]
    }"#;

    #[test]
    fn test_ingest_filters_dedupes_and_reverses() {
        let cards = parse_export(EXPORT).unwrap();
        let media: Vec<&str> = cards.iter().map(|c| c.media.as_str()).collect();
        assert_eq!(media, vec!["clip.mp4", "c.jpg", "a.jpg"]);
        assert_eq!(cards[2].title, "first");
        assert_eq!(cards[2].natural_size, Some(Size::new(800.0, 600.0)));
    }

    #[test]
    fn test_source_url_falls_back_for_cdn_links() {
        let cards = parse_export(EXPORT).unwrap();
        assert_eq!(cards[2].source.as_str(), "https://example.com/post");
        assert_eq!(cards[1].source.as_str(), "https://www.are.na/block/3");
        assert_eq!(cards[0].source.as_str(), "https://www.are.na/block/4");
    }

    #[test]
    fn test_video_blocks_keep_poster() {
        let cards = parse_export(EXPORT).unwrap();
        assert_eq!(cards[0].kind, MediaKind::Video);
        assert_eq!(cards[0].poster.as_ref().map(MediaRef::as_str), Some("poster.jpg"));
        assert_eq!(cards[1].kind, MediaKind::Image);
    }

    #[test]
    fn test_card_offsets_are_evenly_spaced() {
        let cards = Card::build(parse_export(EXPORT).unwrap());
        let offsets: Vec<f64> = cards.iter().map(|c| c.angular_offset).collect();
        assert_eq!(offsets, vec![0.0, 120.0, 240.0]);
    }

    #[test]
    fn test_media_kind_parsing() {
        let cases = vec![
            ("\"image\"", MediaKind::Image),
            ("\"IMAGE\"", MediaKind::Image),
            ("\"vid\"", MediaKind::Video),
            ("\"Video\"", MediaKind::Video),
        ];
        for (json, expected) in cases {
            let parsed: MediaKind = serde_json::from_str(json).unwrap();
            assert_eq!(parsed, expected);
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{PipelineResult, SummarizerError};

/// Length of a YouTube video identifier
pub const VIDEO_ID_LEN: usize = 11;

/// Canonical 11-character YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    /// Validate a bare identifier against the `[A-Za-z0-9_-]{11}` grammar
    pub fn parse(raw: &str) -> PipelineResult<Self> {
        if raw.len() == VIDEO_ID_LEN && raw.bytes().all(is_id_byte) {
            Ok(Self(raw.to_string()))
        } else {
            Err(SummarizerError::MalformedReference(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video
    pub fn watch_url(&self) -> String {
        format!("https://youtube.com/watch?v={}", self.0)
    }

    /// File name the summary artifact for this video is stored under
    pub fn artifact_file_name(&self) -> String {
        format!("{}_summary.md", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VideoId {
    type Error = SummarizerError;

    fn try_from(value: String) -> PipelineResult<Self> {
        Self::parse(&value)
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

/// URL layouts a video identifier can be embedded in, tried in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlShape {
    /// youtube.com/watch?v=ID
    Watch,
    /// youtu.be/ID
    ShortLink,
    /// youtube.com/embed/ID
    Embed,
    /// youtube.com/v/ID
    LegacyEmbed,
    /// youtube.com/<anything>?...&v=ID
    QueryParam,
    /// youtube.com/user/NAME/SECTION/ID
    UserScoped,
    /// youtube.com/SEGMENT/SEGMENT/ID
    GenericPath,
}

impl UrlShape {
    pub const ALL: [UrlShape; 7] = [
        UrlShape::Watch,
        UrlShape::ShortLink,
        UrlShape::Embed,
        UrlShape::LegacyEmbed,
        UrlShape::QueryParam,
        UrlShape::UserScoped,
        UrlShape::GenericPath,
    ];

    /// Return the identifier if `input` contains this shape anywhere
    pub fn capture<'a>(&self, input: &'a str) -> Option<&'a str> {
        match self {
            UrlShape::Watch => after_marker(input, "youtube.com/watch?v="),
            UrlShape::ShortLink => after_marker(input, "youtu.be/"),
            UrlShape::Embed => after_marker(input, "youtube.com/embed/"),
            UrlShape::LegacyEmbed => after_marker(input, "youtube.com/v/"),
            UrlShape::QueryParam => tails(input, "youtube.com/").find_map(|tail| {
                tail.match_indices(['?', '&'])
                    .filter_map(|(i, _)| tail[i + 1..].strip_prefix("v="))
                    .find_map(take_id)
            }),
            UrlShape::UserScoped => {
                tails(input, "youtube.com/user/").find_map(|tail| nested_id(tail, 2))
            }
            UrlShape::GenericPath => {
                tails(input, "youtube.com/").find_map(|tail| nested_id(tail, 2))
            }
        }
    }
}

/// Resolve a free-form link or bare token into a canonical video identifier
pub fn resolve(raw: &str) -> PipelineResult<VideoId> {
    for shape in UrlShape::ALL {
        if let Some(id) = shape.capture(raw) {
            tracing::debug!(?shape, video_id = id, "Matched URL shape");
            return Ok(VideoId(id.to_string()));
        }
    }

    VideoId::parse(raw)
}

fn is_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Every suffix of `input` that directly follows an occurrence of `marker`
fn tails<'a>(input: &'a str, marker: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    input
        .match_indices(marker)
        .map(move |(i, _)| &input[i + marker.len()..])
}

fn after_marker<'a>(input: &'a str, marker: &'a str) -> Option<&'a str> {
    tails(input, marker).find_map(take_id)
}

/// Leading 11 identifier characters of `s`; trailing text is ignored
fn take_id(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    if bytes.len() >= VIDEO_ID_LEN && bytes[..VIDEO_ID_LEN].iter().all(|&b| is_id_byte(b)) {
        Some(&s[..VIDEO_ID_LEN])
    } else {
        None
    }
}

/// Skip `segments` word-only path segments, each followed by `/`, then take the identifier
fn nested_id(mut tail: &str, segments: usize) -> Option<&str> {
    for _ in 0..segments {
        let word_len = tail.bytes().take_while(|&b| is_word_byte(b)).count();
        if word_len == 0 {
            return None;
        }
        tail = tail[word_len..].strip_prefix('/')?;
    }
    take_id(tail)
}

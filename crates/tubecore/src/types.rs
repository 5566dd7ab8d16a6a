use serde::{Deserialize, Serialize};

/// One stream descriptor as emitted by `yt-dlp --dump-single-json`.
///
/// Only the fields the normalizer reads are modelled; everything else in the
/// engine output is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StreamFormat {
    pub format_id: Option<String>,
    pub format_note: Option<String>,
    pub ext: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    /// Exact size in bytes. yt-dlp emits an integer, some extractors a float.
    pub filesize: Option<f64>,
    pub fps: Option<f64>,
    pub url: Option<String>,
}

/// Top-level metadata for a single media item.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawVideoInfo {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub formats: Vec<StreamFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Audio,
}

/// Public projection of a [`StreamFormat`].
///
/// Field names on the wire keep the shape clients of the API already parse
/// (`itag`, `size`, `type`, `vcodec`, `acodec`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFormat {
    #[serde(rename = "itag")]
    pub id: Option<String>,
    #[serde(rename = "qualityLabel")]
    pub quality_label: String,
    pub container: String,
    #[serde(rename = "size")]
    pub size_label: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    #[serde(rename = "is60fps")]
    pub is_60fps: bool,
    pub url: Option<String>,
    #[serde(rename = "vcodec")]
    pub video_codec: String,
    #[serde(rename = "acodec")]
    pub audio_codec: String,
}

/// Response payload of a successful extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    pub thumbnail: String,
    pub formats: Vec<NormalizedFormat>,
}

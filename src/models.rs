//! Metadata records extracted from post pages.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything harvested from one post page.
///
/// Only `post_id` and `post_url` are guaranteed; every other field mirrors
/// what the page actually carried. Optional statistics are omitted from the
/// serialized record entirely when the page lacks them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostMetadata {
    /// Numeric post identifier.
    pub post_id: u64,
    /// URL the page was fetched from.
    pub post_url: String,
    /// Href of the high-res image anchor, null when the page has none.
    pub image_url: Option<String>,
    /// Tag category -> tag names, in sidebar order.
    #[serde(default)]
    pub tags: BTreeMap<String, Vec<String>>,
    /// Source link from the stats block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Posting time exactly as displayed on the page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted: Option<String>,
    /// `posted` re-rendered as ISO-8601 (`YYYY-MM-DDTHH:MM:SS`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Image width in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Image height in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// `width * height`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixels: Option<u64>,
    /// Users who favorited the post.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorited_by: Option<Vec<String>>,
    /// Length of `favorited_by`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite_count: Option<usize>,
    /// Raw status-notice banner texts, in page order.
    #[serde(default)]
    pub status_notice: Vec<String>,
    /// Best-effort structured view of the status notices.
    #[serde(default)]
    pub status_notice_parsed: StatusNoticeParsed,
    /// Remaining label:value statistics, keys in lowercase_underscore form.
    #[serde(flatten)]
    pub stats: BTreeMap<String, String>,
}

/// Structured sub-fields parsed out of the status-notice banners.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusNoticeParsed {
    /// ID of the parent post, when the post is parented.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_post_id: Option<String>,
    /// Reason the post was flagged for deletion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_reason: Option<String>,
    /// Who flagged the post.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flagged_by: Option<String>,
}

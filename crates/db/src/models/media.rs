//! Media upload model and DTOs.

use classiklust_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `media_uploads` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUpload {
    pub id: DbId,
    pub character_id: String,
    pub url: String,
    #[serde(skip_serializing)]
    pub file_path: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub unlock_level: i32,
    pub categories: Vec<String>,
    pub poses: Vec<String>,
    pub is_hidden: bool,
    pub is_nsfw: bool,
    pub is_vip: bool,
    pub is_event: bool,
    pub enabled_for_chat: bool,
    pub chat_send_percent: i32,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a media row after the file has been written.
#[derive(Debug, Clone)]
pub struct CreateMedia {
    pub character_id: String,
    pub url: String,
    pub file_path: String,
    pub media_type: String,
    pub unlock_level: i32,
    pub categories: Vec<String>,
    pub poses: Vec<String>,
    pub is_hidden: bool,
    pub is_nsfw: bool,
    pub is_vip: bool,
    pub is_event: bool,
    pub enabled_for_chat: bool,
    pub chat_send_percent: i32,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// Metadata edits. `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMedia {
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub unlock_level: Option<i32>,
    pub categories: Option<Vec<String>>,
    pub poses: Option<Vec<String>>,
    pub is_hidden: Option<bool>,
    pub is_nsfw: Option<bool>,
    pub is_vip: Option<bool>,
    pub is_event: Option<bool>,
    pub enabled_for_chat: Option<bool>,
    pub chat_send_percent: Option<i32>,
}

/// Filters for listing media.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFilter {
    pub character_id: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub include_hidden: bool,
}

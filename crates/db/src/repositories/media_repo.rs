//! Repository for the `media_uploads` table.

use classiklust_core::types::DbId;
use sqlx::PgPool;

use crate::models::media::{CreateMedia, MediaFilter, MediaUpload, UpdateMedia};

const COLUMNS: &str = "id, character_id, url, file_path, media_type, unlock_level, categories, \
                       poses, is_hidden, is_nsfw, is_vip, is_event, enabled_for_chat, \
                       chat_send_percent, width, height, created_at, updated_at";

pub struct MediaRepo;

impl MediaRepo {
    /// Insert a media row, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateMedia) -> Result<MediaUpload, sqlx::Error> {
        let query = format!(
            "INSERT INTO media_uploads
                (character_id, url, file_path, media_type, unlock_level, categories, poses,
                 is_hidden, is_nsfw, is_vip, is_event, enabled_for_chat, chat_send_percent,
                 width, height)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MediaUpload>(&query)
            .bind(&input.character_id)
            .bind(&input.url)
            .bind(&input.file_path)
            .bind(&input.media_type)
            .bind(input.unlock_level)
            .bind(&input.categories)
            .bind(&input.poses)
            .bind(input.is_hidden)
            .bind(input.is_nsfw)
            .bind(input.is_vip)
            .bind(input.is_event)
            .bind(input.enabled_for_chat)
            .bind(input.chat_send_percent)
            .bind(input.width)
            .bind(input.height)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MediaUpload>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media_uploads WHERE id = $1");
        sqlx::query_as::<_, MediaUpload>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List media matching `filter`, newest first. Hidden rows are excluded
    /// unless `filter.include_hidden` is set.
    pub async fn list(pool: &PgPool, filter: &MediaFilter) -> Result<Vec<MediaUpload>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM media_uploads
             WHERE ($1::TEXT IS NULL OR character_id = $1)
               AND ($2::TEXT IS NULL OR media_type = $2)
               AND ($3 OR is_hidden = false)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, MediaUpload>(&query)
            .bind(&filter.character_id)
            .bind(&filter.media_type)
            .bind(filter.include_hidden)
            .fetch_all(pool)
            .await
    }

    /// Update metadata. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMedia,
    ) -> Result<Option<MediaUpload>, sqlx::Error> {
        let query = format!(
            "UPDATE media_uploads SET
                media_type = COALESCE($2, media_type),
                unlock_level = COALESCE($3, unlock_level),
                categories = COALESCE($4, categories),
                poses = COALESCE($5, poses),
                is_hidden = COALESCE($6, is_hidden),
                is_nsfw = COALESCE($7, is_nsfw),
                is_vip = COALESCE($8, is_vip),
                is_event = COALESCE($9, is_event),
                enabled_for_chat = COALESCE($10, enabled_for_chat),
                chat_send_percent = COALESCE($11, chat_send_percent)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MediaUpload>(&query)
            .bind(id)
            .bind(&input.media_type)
            .bind(input.unlock_level)
            .bind(&input.categories)
            .bind(&input.poses)
            .bind(input.is_hidden)
            .bind(input.is_nsfw)
            .bind(input.is_vip)
            .bind(input.is_event)
            .bind(input.enabled_for_chat)
            .bind(input.chat_send_percent)
            .fetch_optional(pool)
            .await
    }

    /// Delete a media row, returning it so the caller can remove the file.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<MediaUpload>, sqlx::Error> {
        let query = format!("DELETE FROM media_uploads WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, MediaUpload>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

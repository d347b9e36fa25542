//! Handlers for the `/media` resource: character image uploads.
//!
//! Files land at `<uploads_dir>/<characterId>/<type>/<uuid>.<ext>` and are
//! served statically under `/uploads`.

use std::io::Cursor;
use std::path::Path as FsPath;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use classiklust_core::catalog::Character;
use classiklust_core::error::CoreError;
use classiklust_core::media::{
    parse_tag_list, public_url, storage_relative_path, validate_chat_send_percent,
    validate_extension, validate_path_segment, DEFAULT_MEDIA_TYPE, MAX_UPLOAD_BYTES,
};
use classiklust_core::types::DbId;
use classiklust_db::models::media::{CreateMedia, MediaFilter, MediaUpload, UpdateMedia};
use classiklust_db::repositories::MediaRepo;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Multipart fields collected before anything is written.
#[derive(Default)]
struct UploadForm {
    file_name: Option<String>,
    bytes: Option<Vec<u8>>,
    character_id: Option<String>,
    media_type: Option<String>,
    unlock_level: Option<i32>,
    categories: Vec<String>,
    poses: Vec<String>,
    is_hidden: bool,
    is_nsfw: bool,
    is_vip: bool,
    is_event: bool,
    enabled_for_chat: bool,
    chat_send_percent: Option<i32>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                form.file_name = field.file_name().map(str::to_string);
                form.bytes = Some(field.bytes().await.map_err(bad_multipart)?.to_vec());
                continue;
            }

            let value = field.text().await.map_err(bad_multipart)?;
            let value = value.trim();
            match name.as_str() {
                "characterId" => form.character_id = Some(value.to_string()),
                "type" => form.media_type = Some(value.to_string()).filter(|v| !v.is_empty()),
                "unlockLevel" => form.unlock_level = Some(parse_int("unlockLevel", value)?),
                "categories" => form.categories = parse_tag_list(value),
                "poses" => form.poses = parse_tag_list(value),
                "isHidden" => form.is_hidden = parse_flag(value),
                "isNsfw" => form.is_nsfw = parse_flag(value),
                "isVip" => form.is_vip = parse_flag(value),
                "isEvent" => form.is_event = parse_flag(value),
                "enabledForChat" => form.enabled_for_chat = parse_flag(value),
                "chatSendPercent" => {
                    form.chat_send_percent = Some(parse_int("chatSendPercent", value)?)
                }
                other => tracing::debug!(field = other, "Ignoring unknown upload field"),
            }
        }
        Ok(form)
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/media?characterId=&type=
///
/// Public listing; hidden media is never included here.
pub async fn list(
    State(state): State<AppState>,
    Query(mut filter): Query<MediaFilter>,
) -> AppResult<Json<DataResponse<Vec<MediaUpload>>>> {
    filter.include_hidden = false;
    let items = MediaRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: items }))
}

/// POST /api/media (multipart)
pub async fn upload(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<MediaUpload>>)> {
    let form = UploadForm::read(multipart).await?;

    let character_id = form
        .character_id
        .ok_or_else(|| validation("characterId is required"))?;
    validate_path_segment("characterId", &character_id)?;
    if state.game_data.get::<Character>(&character_id).await.is_none() {
        return Err(AppError::Core(CoreError::not_found("Character", &character_id)));
    }

    let media_type = form.media_type.unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());
    validate_path_segment("type", &media_type)?;

    let chat_send_percent = form.chat_send_percent.unwrap_or(0);
    validate_chat_send_percent(chat_send_percent)?;

    let unlock_level = form.unlock_level.unwrap_or(1);
    if unlock_level < 1 {
        return Err(validation("unlockLevel must be at least 1"));
    }

    let file_name = form.file_name.ok_or_else(|| validation("file is required"))?;
    let ext = validate_extension(&file_name)?;
    let bytes = form.bytes.filter(|b| !b.is_empty()).ok_or_else(|| validation("file is empty"))?;
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(validation("file exceeds the 20 MiB upload limit"));
    }
    let (width, height) = image_dimensions(&bytes)?;

    let relative = storage_relative_path(&character_id, &media_type, &Uuid::new_v4().to_string(), &ext);
    let absolute = state.config.uploads_dir.join(&relative);
    write_upload(&absolute, &bytes).await?;

    let input = CreateMedia {
        character_id,
        url: public_url(&relative),
        file_path: relative,
        media_type,
        unlock_level,
        categories: form.categories,
        poses: form.poses,
        is_hidden: form.is_hidden,
        is_nsfw: form.is_nsfw,
        is_vip: form.is_vip,
        is_event: form.is_event,
        enabled_for_chat: form.enabled_for_chat,
        chat_send_percent,
        width: Some(width),
        height: Some(height),
    };

    let media = match MediaRepo::create(&state.pool, &input).await {
        Ok(media) => media,
        Err(e) => {
            remove_upload(&absolute).await;
            return Err(e.into());
        }
    };
    tracing::info!(media_id = media.id, path = %media.file_path, width, height, "Stored media upload");

    Ok((StatusCode::CREATED, Json(DataResponse { data: media })))
}

/// PATCH /api/media/{id}
pub async fn update(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMedia>,
) -> AppResult<Json<DataResponse<MediaUpload>>> {
    if let Some(percent) = input.chat_send_percent {
        validate_chat_send_percent(percent)?;
    }
    if let Some(level) = input.unlock_level {
        if level < 1 {
            return Err(validation("unlockLevel must be at least 1"));
        }
    }
    // The type is stored in the path of existing files; changing it only
    // relabels the row.
    if let Some(media_type) = input.media_type.as_deref() {
        validate_path_segment("type", media_type)?;
    }

    let media = MediaRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Media", id)))?;
    Ok(Json(DataResponse { data: media }))
}

/// DELETE /api/media/{id}
pub async fn delete(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let media = MediaRepo::delete(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Media", id)))?;
    remove_upload(&state.config.uploads_dir.join(&media.file_path)).await;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Width and height from the image header.
fn image_dimensions(bytes: &[u8]) -> AppResult<(i32, i32)> {
    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AppError::BadRequest(format!("Unreadable image: {e}")))?
        .into_dimensions()
        .map_err(|e| AppError::BadRequest(format!("Unreadable image: {e}")))?;
    let width = i32::try_from(width).map_err(|_| AppError::BadRequest("Image too wide".into()))?;
    let height = i32::try_from(height).map_err(|_| AppError::BadRequest("Image too tall".into()))?;
    Ok((width, height))
}

async fn write_upload(path: &FsPath, bytes: &[u8]) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::InternalError(format!("create {}: {e}", parent.display())))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("write {}: {e}", path.display())))
}

async fn remove_upload(path: &FsPath) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove media file");
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "on" | "yes")
}

fn parse_int(field: &str, value: &str) -> AppResult<i32> {
    value
        .parse()
        .map_err(|_| validation(&format!("{field} must be an integer")))
}

fn validation(msg: &str) -> AppError {
    AppError::Core(CoreError::Validation(msg.into()))
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid multipart body: {err}"))
}

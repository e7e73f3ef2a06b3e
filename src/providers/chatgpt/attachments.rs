// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Attachment resolution for ChatGPT exports
//!
//! Images are referenced from message parts through `image_asset_pointer`
//! entries and live next to `conversations.json`, generated ones under
//! `dalle-generations/`. User uploads are inlined as base64 data URLs;
//! generated images are referenced by upload URL and copied into the
//! service later. Attachments never referenced by a part are documents the
//! export does not include.

use base64::Engine;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::export::{is_truthy, ExportMessage};
use crate::models::{AttachmentStats, DocumentKind, FileDescriptor};

/// Folder holding generated images inside the export
pub const GENERATED_DIR: &str = "dalle-generations";

/// Note attached to documents whose content is not exported
pub const DOCUMENT_NOTE: &str = "File content not available - ChatGPT only exports image assets";

const ASSET_POINTER_PREFIX: &str = "file-service://file-";

/// Extract the file id (`file-XXXX`) from an asset pointer
pub fn extract_file_id(asset_pointer: &str) -> Option<String> {
    asset_pointer
        .strip_prefix(ASSET_POINTER_PREFIX)
        .filter(|rest| !rest.is_empty())
        .map(|rest| format!("file-{}", rest))
}

/// First regular file in `dir` whose name starts with `file_id`
fn find_in_dir(file_id: &str, dir: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                log::warn!("Error searching for file {} in {}: {}", file_id, dir.display(), e);
            }
            return None;
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(file_id))
        .collect();
    names.sort();

    names
        .into_iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Locate the image for `file_id`, first in `data_dir`, then in its
/// generated-images folder
pub fn find_image_file(file_id: &str, data_dir: &Path) -> Option<PathBuf> {
    if file_id.is_empty() {
        return None;
    }
    find_in_dir(file_id, data_dir).or_else(|| find_in_dir(file_id, &data_dir.join(GENERATED_DIR)))
}

/// MIME type for an image path, always `image/*`
pub fn image_mime_type(path: &Path) -> String {
    if let Some(mime) = mime_guess::from_path(path).first() {
        if mime.type_() == mime_guess::mime::IMAGE {
            return mime.essence_str().to_string();
        }
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "tiff" | "tif" => "image/tiff",
        _ => "image/jpeg",
    }
    .to_string()
}

/// Read an image and encode it as a `data:` URL
pub fn encode_image(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", image_mime_type(path), encoded))
}

fn attachment_str<'a>(attachment: &'a Value, key: &str) -> Option<&'a str> {
    attachment.get(key).and_then(Value::as_str)
}

fn attachment_size(attachment: &Value) -> u64 {
    attachment.get("size").and_then(Value::as_u64).unwrap_or(0)
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Outcome of resolving one referenced image
enum ImageStatus {
    Found(FileDescriptor),
    Missing,
    Failed,
}

/// Resolves message attachments against an export folder
#[derive(Debug, Clone)]
pub struct AttachmentResolver {
    data_dir: PathBuf,
}

impl AttachmentResolver {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn generated_dir(&self) -> PathBuf {
        self.data_dir.join(GENERATED_DIR)
    }

    /// Whether an image came from the generation tool
    pub fn is_ai_generated(&self, attachment: &Value, metadata: &Value, path: &Path) -> bool {
        if metadata.get("dalle").is_some_and(is_truthy) {
            return true;
        }

        let attachment_id = attachment_str(attachment, "id").unwrap_or("");
        if attachment_id.to_lowercase().contains("dalle") {
            return true;
        }

        if path
            .components()
            .any(|c| c.as_os_str() == std::ffi::OsStr::new(GENERATED_DIR))
        {
            return true;
        }

        if attachment_id.is_empty() {
            return false;
        }
        fs::read_dir(self.generated_dir())
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .any(|entry| entry.file_name().to_string_lossy().starts_with(attachment_id))
            })
            .unwrap_or(false)
    }

    fn resolve_image(&self, attachment: &Value, file_id: &str, metadata: &Value) -> ImageStatus {
        let Some(path) = find_image_file(file_id, &self.data_dir) else {
            log::warn!("Image file not found for ID: {}", file_id);
            return ImageStatus::Missing;
        };

        let file_name = basename(&path);
        let name = attachment_str(attachment, "name")
            .map(String::from)
            .unwrap_or_else(|| file_name.clone());
        let size = attachment_size(attachment);

        if self.is_ai_generated(attachment, metadata, &path) {
            return ImageStatus::Found(FileDescriptor::GeneratedImage {
                url: format!("uploads/{}", file_name),
                name,
                size,
                source_path: Some(path),
            });
        }

        match encode_image(&path) {
            Ok(url) => ImageStatus::Found(FileDescriptor::InlineImage { url, name, size }),
            Err(e) => {
                log::error!("Failed to encode image {}: {}", path.display(), e);
                ImageStatus::Failed
            }
        }
    }

    fn document(attachment: &Value) -> FileDescriptor {
        let mime_type = attachment_str(attachment, "mime_type")
            .unwrap_or("application/octet-stream")
            .to_string();
        let descriptor = FileDescriptor::Document {
            kind: DocumentKind::from_mime(&mime_type),
            name: attachment_str(attachment, "name")
                .unwrap_or("unknown")
                .to_string(),
            size: attachment_size(attachment),
            mime_type,
            note: Some(DOCUMENT_NOTE.to_string()),
            original_id: attachment_str(attachment, "id").map(String::from),
        };
        log::info!(
            "Non-image file detected: {} - content not available in export",
            descriptor.name()
        );
        descriptor
    }

    /// Resolve the attachments of one message
    ///
    /// `attachments` come from the message metadata, `parts` from its
    /// content. Images referenced by a part come first, in part order,
    /// followed by documents in attachment order.
    pub fn resolve(
        &self,
        attachments: &[Value],
        parts: &[Value],
        metadata: &Value,
    ) -> (Vec<FileDescriptor>, AttachmentStats) {
        let mut files = Vec::new();
        let mut stats = AttachmentStats::default();

        if attachments.is_empty() {
            return (files, stats);
        }

        // Attachments keyed by id, first occurrence wins the position
        let mut keyed: Vec<(&str, &Value)> = Vec::new();
        for attachment in attachments {
            let Some(id) = attachment_str(attachment, "id").filter(|id| !id.is_empty()) else {
                continue;
            };
            match keyed.iter_mut().find(|(known, _)| *known == id) {
                Some(entry) => entry.1 = attachment,
                None => keyed.push((id, attachment)),
            }
        }

        let mut referenced: HashSet<String> = HashSet::new();
        for part in parts {
            if part.get("content_type").and_then(Value::as_str) != Some("image_asset_pointer") {
                continue;
            }
            let pointer = part.get("asset_pointer").and_then(Value::as_str).unwrap_or("");
            let Some(file_id) = extract_file_id(pointer) else {
                continue;
            };
            referenced.insert(file_id.clone());

            let Some((_, attachment)) = keyed.iter().find(|(id, _)| *id == file_id) else {
                log::warn!("No attachment found for file ID: {}", file_id);
                continue;
            };

            match self.resolve_image(attachment, &file_id, metadata) {
                ImageStatus::Found(descriptor) => {
                    stats.images_found += 1;
                    if descriptor.is_ai_generated() {
                        stats.ai_generated += 1;
                    } else {
                        stats.user_uploaded += 1;
                    }
                    files.push(descriptor);
                }
                ImageStatus::Missing => stats.images_missing += 1,
                ImageStatus::Failed => stats.images_failed += 1,
            }
        }

        for (id, attachment) in &keyed {
            if referenced.contains(*id) {
                continue;
            }
            files.push(Self::document(attachment));
            stats.non_images += 1;
        }

        (files, stats)
    }

    /// Resolve the attachments of an export message
    pub fn resolve_message(&self, message: &ExportMessage) -> (Vec<FileDescriptor>, AttachmentStats) {
        self.resolve(message.attachments(), message.parts(), message.metadata())
    }
}

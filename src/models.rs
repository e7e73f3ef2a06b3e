// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Data models shared by the converters
//!
//! Two families live here: the intermediate form produced while walking a
//! provider export ([`ParsedConversation`], [`ParsedMessage`]) and the Open
//! WebUI chat record built from it ([`TargetConversation`]).

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::path::{Path, PathBuf};

/// A target model id paired with its display name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRef {
    pub id: String,
    pub name: String,
}

impl ModelRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Map a provider author role; unknown roles (`tool`, ...) answer as assistant
    pub fn from_author(role: &str) -> Self {
        match role {
            "user" => Self::User,
            "system" => Self::System,
            _ => Self::Assistant,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// File descriptors
// =============================================================================

/// Category of a non-image attachment, derived from its MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
    Code,
    File,
}

impl DocumentKind {
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("application/pdf") {
            Self::Pdf
        } else if mime_type.starts_with("text/") {
            Self::Text
        } else if matches!(mime_type, "application/json" | "application/xml") {
            Self::Code
        } else {
            Self::File
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Text => "text",
            Self::Code => "code",
            Self::File => "file",
        }
    }
}

/// One attachment in Open WebUI format
///
/// Some fields only exist for the migration itself (the local source path of
/// a generated image, the note and id of an unavailable document). They are
/// dropped by [`FileDescriptor::stripped`] before a descriptor is embedded in
/// a chat record.
#[derive(Debug, Clone, PartialEq)]
pub enum FileDescriptor {
    /// User upload, inlined as a base64 data URL
    InlineImage { url: String, name: String, size: u64 },
    /// Image produced by the provider's generation tool, copied later
    GeneratedImage {
        url: String,
        name: String,
        size: u64,
        source_path: Option<PathBuf>,
    },
    /// Non-image attachment whose bytes are not part of the export
    Document {
        kind: DocumentKind,
        name: String,
        size: u64,
        mime_type: String,
        note: Option<String>,
        original_id: Option<String>,
    },
}

impl FileDescriptor {
    pub fn name(&self) -> &str {
        match self {
            Self::InlineImage { name, .. }
            | Self::GeneratedImage { name, .. }
            | Self::Document { name, .. } => name,
        }
    }

    pub fn is_ai_generated(&self) -> bool {
        matches!(self, Self::GeneratedImage { .. })
    }

    /// Local file backing a generated image, if still attached
    pub fn source_path(&self) -> Option<&Path> {
        match self {
            Self::GeneratedImage { source_path, .. } => source_path.as_deref(),
            _ => None,
        }
    }

    /// Copy without migration-only fields
    pub fn stripped(&self) -> Self {
        match self {
            Self::InlineImage { .. } => self.clone(),
            Self::GeneratedImage {
                url, name, size, ..
            } => Self::GeneratedImage {
                url: url.clone(),
                name: name.clone(),
                size: *size,
                source_path: None,
            },
            Self::Document {
                kind,
                name,
                size,
                mime_type,
                ..
            } => Self::Document {
                kind: *kind,
                name: name.clone(),
                size: *size,
                mime_type: mime_type.clone(),
                note: None,
                original_id: None,
            },
        }
    }
}

impl Serialize for FileDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Self::InlineImage { url, name, size } => {
                map.serialize_entry("type", "image")?;
                map.serialize_entry("url", url)?;
                map.serialize_entry("name", name)?;
                map.serialize_entry("size", size)?;
            }
            Self::GeneratedImage {
                url,
                name,
                size,
                source_path,
            } => {
                map.serialize_entry("type", "image")?;
                map.serialize_entry("url", url)?;
                map.serialize_entry("name", name)?;
                map.serialize_entry("size", size)?;
                map.serialize_entry("ai_generated", &true)?;
                if let Some(path) = source_path {
                    map.serialize_entry("source_path", path)?;
                }
            }
            Self::Document {
                kind,
                name,
                size,
                mime_type,
                note,
                original_id,
            } => {
                map.serialize_entry("type", kind.as_str())?;
                map.serialize_entry("name", name)?;
                map.serialize_entry("size", size)?;
                map.serialize_entry("mime_type", mime_type)?;
                if let Some(note) = note {
                    map.serialize_entry("_migration_note", note)?;
                }
                if let Some(id) = original_id {
                    map.serialize_entry("_original_id", id)?;
                }
            }
        }
        map.end()
    }
}

/// A generated image to copy into the service's upload storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaCopy {
    pub source: PathBuf,
    pub dest_name: String,
}

// =============================================================================
// Intermediate form
// =============================================================================

/// One message in conversation order
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMessage {
    pub role: Role,
    pub content: String,
    /// Seconds since the epoch
    pub timestamp: f64,
    pub model: ModelRef,
    pub files: Vec<FileDescriptor>,
}

/// A provider conversation linearized root to leaf
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedConversation {
    pub title: String,
    /// Seconds since the epoch
    pub timestamp: f64,
    pub messages: Vec<ParsedMessage>,
    pub conversation_id: Option<String>,
    pub default_model: ModelRef,
    /// Files from turns that produced no message
    pub orphaned_files: Vec<FileDescriptor>,
}

// =============================================================================
// Open WebUI chat record
// =============================================================================

/// Token counters; exports carry none, so they stay zero
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Fields carried by non-user messages
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseFields {
    pub model: String,
    pub model_name: String,
    pub model_idx: u32,
    pub user_context: Option<serde_json::Value>,
    pub last_sentence: String,
    pub usage: Usage,
    pub done: bool,
}

/// Role-dependent part of a chat message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum MessageBody {
    User { models: Vec<String> },
    Assistant(ResponseFields),
    System(ResponseFields),
}

impl MessageBody {
    pub fn role(&self) -> Role {
        match self {
            Self::User { .. } => Role::User,
            Self::Assistant(_) => Role::Assistant,
            Self::System(_) => Role::System,
        }
    }
}

/// A message in an Open WebUI chat
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetMessage {
    pub id: String,
    pub parent_id: Option<String>,
    pub children_ids: Vec<String>,
    pub content: String,
    /// Seconds since the epoch
    pub timestamp: i64,
    #[serde(flatten)]
    pub body: MessageBody,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileDescriptor>,
}

/// Message graph of a chat
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    /// Serialized messages keyed by id, in chain order
    pub messages: serde_json::Map<String, serde_json::Value>,
    pub current_id: Option<String>,
}

/// An Open WebUI chat record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetConversation {
    pub id: String,
    pub title: String,
    pub models: Vec<String>,
    pub params: serde_json::Map<String, serde_json::Value>,
    pub history: History,
    pub messages: Vec<TargetMessage>,
    pub tags: Vec<String>,
    /// Milliseconds since the epoch
    pub timestamp: i64,
    pub files: Vec<FileDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Builder output: the record plus what the media sync still needs
#[derive(Debug, Clone)]
pub struct BuiltConversation {
    pub record: TargetConversation,
    /// Fresh per-build uuid, used to disambiguate file names
    pub conversation_uuid: String,
    /// Every file with its migration-only fields intact
    pub files_with_metadata: Vec<FileDescriptor>,
}

// =============================================================================
// Statistics
// =============================================================================

/// Outcome counters for the attachments of one message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachmentStats {
    pub images_found: usize,
    pub images_missing: usize,
    pub images_failed: usize,
    pub user_uploaded: usize,
    pub ai_generated: usize,
    pub non_images: usize,
}

impl AttachmentStats {
    pub fn merge(&mut self, other: &AttachmentStats) {
        self.images_found += other.images_found;
        self.images_missing += other.images_missing;
        self.images_failed += other.images_failed;
        self.user_uploaded += other.user_uploaded;
        self.ai_generated += other.ai_generated;
        self.non_images += other.non_images;
    }

    /// Descriptors produced (found images plus documents)
    pub fn total_files(&self) -> usize {
        self.user_uploaded + self.ai_generated + self.non_images
    }
}

/// Counters for one export file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub total_conversations: usize,
    pub conversations_with_assets: usize,
    pub skipped_conversations: usize,
    pub assets: AttachmentStats,
}

impl ConversionStats {
    pub fn merge(&mut self, other: &ConversionStats) {
        self.total_conversations += other.total_conversations;
        self.conversations_with_assets += other.conversations_with_assets;
        self.skipped_conversations += other.skipped_conversations;
        self.assets.merge(&other.assets);
    }

    pub fn total_assets(&self) -> usize {
        self.assets.total_files()
    }

    pub fn total_images(&self) -> usize {
        self.assets.user_uploaded + self.assets.ai_generated
    }

    /// Write the summary to the log
    pub fn log_summary(&self) {
        log::info!("Parsed {} conversations", self.total_conversations);
        log::info!(
            "Found {} conversations with assets",
            self.conversations_with_assets
        );
        log::info!(
            "Total assets: {} (Images: {}, Non-images: {})",
            self.total_assets(),
            self.total_images(),
            self.assets.non_images
        );
        log::info!("  - User-uploaded images: {}", self.assets.user_uploaded);
        log::info!("  - AI-generated images: {}", self.assets.ai_generated);
        log::info!(
            "  - Non-image files (PDFs, JSON, etc.): {}",
            self.assets.non_images
        );
        if self.assets.images_missing + self.assets.images_failed > 0 {
            log::warn!(
                "  - Images missing on disk: {}, failed to read: {}",
                self.assets.images_missing,
                self.assets.images_failed
            );
        }
        if self.assets.non_images > 0 {
            log::info!("  Note: non-image file content is not available in ChatGPT exports");
        }
    }
}

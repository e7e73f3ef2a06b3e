// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Open WebUI chat record construction
//!
//! Messages arrive already linearized, so the record is a single chain:
//! every message is the only child of the one before it.

use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{MigratorError, Result};
use crate::models::{
    BuiltConversation, FileDescriptor, History, MediaCopy, MessageBody, ParsedConversation,
    ParsedMessage, ResponseFields, Role, TargetConversation, TargetMessage, Usage,
};
use crate::text::{extract_last_sentence, sanitize_text};

fn build_message(parsed: &ParsedMessage, id: String, parent_id: Option<String>) -> TargetMessage {
    let content = sanitize_text(&parsed.content);

    let body = match parsed.role {
        Role::User => MessageBody::User {
            models: vec![parsed.model.id.clone()],
        },
        role => {
            let fields = ResponseFields {
                model: parsed.model.id.clone(),
                model_name: parsed.model.name.clone(),
                model_idx: 0,
                user_context: None,
                last_sentence: extract_last_sentence(&content),
                usage: Usage::default(),
                done: true,
            };
            if role == Role::System {
                MessageBody::System(fields)
            } else {
                MessageBody::Assistant(fields)
            }
        }
    };

    TargetMessage {
        id,
        parent_id,
        children_ids: Vec::new(),
        content,
        timestamp: parsed.timestamp as i64,
        body,
        files: parsed.files.iter().map(FileDescriptor::stripped).collect(),
    }
}

/// Resolve the record id: the provider id, else the generated uuid
fn resolve_conversation_id(conversation: &ParsedConversation, generated: &str) -> Result<String> {
    match conversation.conversation_id.as_deref() {
        Some(id) if id.trim().is_empty() => Err(MigratorError::MissingConversationId(
            conversation.title.clone(),
        )),
        Some(id) => Ok(id.to_string()),
        None => Ok(generated.to_string()),
    }
}

/// Build the Open WebUI record for one parsed conversation
///
/// `user_id`, when given and non-empty, is stored as the record owner.
pub fn build_conversation(
    conversation: &ParsedConversation,
    user_id: Option<&str>,
) -> Result<BuiltConversation> {
    let conversation_uuid = Uuid::new_v4().to_string();
    let id = resolve_conversation_id(conversation, &conversation_uuid)?;

    let mut messages: Vec<TargetMessage> = Vec::with_capacity(conversation.messages.len());
    let mut models: Vec<String> = Vec::new();
    let mut files_with_metadata: Vec<FileDescriptor> = Vec::new();

    for parsed in &conversation.messages {
        let message_id = Uuid::new_v4().to_string();
        let parent_id = messages.last().map(|m| m.id.clone());
        if let Some(parent) = messages.last_mut() {
            parent.children_ids.push(message_id.clone());
        }

        if !models.contains(&parsed.model.id) {
            models.push(parsed.model.id.clone());
        }
        files_with_metadata.extend(parsed.files.iter().cloned());

        messages.push(build_message(parsed, message_id, parent_id));
    }
    files_with_metadata.extend(conversation.orphaned_files.iter().cloned());

    if models.is_empty() {
        models.push(conversation.default_model.id.clone());
    }

    let current_id = messages.last().map(|m| m.id.clone());
    let mut history_messages = serde_json::Map::with_capacity(messages.len());
    for message in &messages {
        history_messages.insert(message.id.clone(), serde_json::to_value(message)?);
    }
    let history = History {
        messages: history_messages,
        current_id,
    };

    let record = TargetConversation {
        id,
        title: conversation.title.clone(),
        models,
        params: serde_json::Map::new(),
        history,
        messages,
        tags: Vec::new(),
        timestamp: (conversation.timestamp * 1000.0) as i64,
        files: files_with_metadata
            .iter()
            .map(FileDescriptor::stripped)
            .collect(),
        user_id: user_id.filter(|u| !u.is_empty()).map(String::from),
    };

    Ok(BuiltConversation {
        record,
        conversation_uuid,
        files_with_metadata,
    })
}

/// Generated images still to copy into the service, de-duplicated
pub fn media_to_copy<'a, I>(files: I) -> Vec<MediaCopy>
where
    I: IntoIterator<Item = &'a FileDescriptor>,
{
    let mut seen = HashSet::new();
    files
        .into_iter()
        .filter(|f| f.is_ai_generated())
        .filter_map(|f| f.source_path())
        .filter_map(|source| {
            let dest_name = source.file_name()?.to_string_lossy().into_owned();
            Some(MediaCopy {
                source: source.to_path_buf(),
                dest_name,
            })
        })
        .filter(|copy| seen.insert(copy.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelRef;
    use std::path::PathBuf;

    fn parsed(role: Role, content: &str, model: &str) -> ParsedMessage {
        ParsedMessage {
            role,
            content: content.to_string(),
            timestamp: 1700000000.9,
            model: ModelRef::new(model, model.to_uppercase()),
            files: Vec::new(),
        }
    }

    fn conversation(messages: Vec<ParsedMessage>) -> ParsedConversation {
        ParsedConversation {
            title: "Test".to_string(),
            timestamp: 1700000000.25,
            messages,
            conversation_id: Some("conv-1".to_string()),
            default_model: ModelRef::new("default-model", "Default"),
            orphaned_files: Vec::new(),
        }
    }

    #[test]
    fn test_timestamps_truncate() {
        let built = build_conversation(&conversation(vec![parsed(Role::User, "hi", "m")]), None)
            .unwrap();
        assert_eq!(built.record.timestamp, 1700000000250);
        assert_eq!(built.record.messages[0].timestamp, 1700000000);
        assert!(built.record.user_id.is_none());
    }

    #[test]
    fn test_models_first_seen_order() {
        let conv = conversation(vec![
            parsed(Role::User, "q", "b"),
            parsed(Role::Assistant, "a.", "a"),
            parsed(Role::User, "q", "b"),
        ]);
        let built = build_conversation(&conv, Some("user-1")).unwrap();
        assert_eq!(built.record.models, vec!["b", "a"]);
        assert_eq!(built.record.user_id.as_deref(), Some("user-1"));
    }

    #[test]
    fn test_whitespace_id_is_fatal() {
        let mut conv = conversation(vec![]);
        conv.conversation_id = Some("  ".to_string());
        let err = build_conversation(&conv, None).unwrap_err();
        assert!(matches!(err, MigratorError::MissingConversationId(title) if title == "Test"));
    }

    #[test]
    fn test_media_to_copy_dedup() {
        let image = FileDescriptor::GeneratedImage {
            url: "uploads/file-a.webp".to_string(),
            name: "a".to_string(),
            size: 1,
            source_path: Some(PathBuf::from("data/chatgpt/dalle-generations/file-a.webp")),
        };
        let stripped = image.stripped();
        let files = vec![image.clone(), image, stripped];
        let copies = media_to_copy(&files);
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].dest_name, "file-a.webp");
    }
}

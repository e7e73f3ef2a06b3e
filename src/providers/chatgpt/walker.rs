// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Conversation linearization
//!
//! A mapping export is a tree: edits and regenerations add sibling branches.
//! The conversation the user last saw is the path from `current_node` back
//! to the root, so that walk is tried first. When it yields nothing, the
//! tree is walked forward from its root along first children instead.

use serde_json::Value;
use std::collections::HashSet;

use super::attachments::AttachmentResolver;
use super::content::{extract_canvas, flat_entry_text, message_text};
use super::export::{ConversationGraph, ExportBody, ExportConversation, ExportMessage};
use super::models::normalize_model;
use crate::models::{
    AttachmentStats, ConversionStats, FileDescriptor, ModelRef, ParsedConversation, ParsedMessage,
    Role,
};

/// Per-conversation values every message falls back to
#[derive(Debug, Clone)]
struct MessageScope {
    default_model: ModelRef,
    timestamp: f64,
}

/// Messages and files gathered by one traversal
#[derive(Debug, Default)]
struct WalkOutput {
    messages: Vec<ParsedMessage>,
    orphaned: Vec<FileDescriptor>,
    has_assets: bool,
    stats: AttachmentStats,
}

impl WalkOutput {
    fn record_files(&mut self, files: &[FileDescriptor], stats: &AttachmentStats) {
        if !files.is_empty() {
            self.has_assets = true;
        }
        self.stats.merge(stats);
    }
}

/// Parses `conversations.json` payloads into linear conversations
#[derive(Debug, Clone)]
pub struct ExportParser {
    resolver: AttachmentResolver,
    default_model: ModelRef,
}

impl ExportParser {
    pub fn new(resolver: AttachmentResolver, default_model: ModelRef) -> Self {
        Self {
            resolver,
            default_model,
        }
    }

    /// Parse a whole export: one conversation object or an array of them
    pub fn parse_export(&self, data: &Value) -> (Vec<ParsedConversation>, ConversionStats) {
        let items: Vec<&Value> = match data {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };

        let mut stats = ConversionStats {
            total_conversations: items.len(),
            ..Default::default()
        };
        let mut conversations = Vec::with_capacity(items.len());

        for item in items {
            match ExportConversation::from_value(item) {
                Some(conversation) => {
                    conversations.push(self.parse_conversation(&conversation, &mut stats));
                }
                None => {
                    log::warn!("Skipping export entry that is not an object");
                    stats.skipped_conversations += 1;
                }
            }
        }

        stats.log_summary();
        (conversations, stats)
    }

    /// Linearize one conversation, accumulating its counters into `stats`
    pub fn parse_conversation(
        &self,
        conversation: &ExportConversation,
        stats: &mut ConversionStats,
    ) -> ParsedConversation {
        let default_model = conversation
            .default_model_slug
            .as_deref()
            .map(|slug| normalize_model(slug, &self.default_model))
            .unwrap_or_else(|| self.default_model.clone());

        let scope = MessageScope {
            default_model: default_model.clone(),
            timestamp: conversation.timestamp,
        };

        let output = match &conversation.body {
            ExportBody::Flat(entries) => self.walk_flat(entries, &scope),
            ExportBody::Graph(graph) => {
                let primary = self.walk_primary(graph, conversation.current_node.as_deref(), &scope);
                if primary.messages.is_empty() {
                    // An empty conversation and a wrong traversal look alike here
                    log::debug!(
                        "No messages on the current path of '{}', walking from the root",
                        conversation.title
                    );
                    self.walk_fallback(graph, &scope)
                } else {
                    primary
                }
            }
            ExportBody::Unstructured => WalkOutput {
                messages: vec![placeholder_message(&conversation.title, &scope)],
                ..Default::default()
            },
        };

        if output.has_assets {
            stats.conversations_with_assets += 1;
        }
        stats.assets.merge(&output.stats);

        ParsedConversation {
            title: conversation.title.clone(),
            timestamp: conversation.timestamp,
            messages: output.messages,
            conversation_id: conversation.conversation_id.clone(),
            default_model,
            orphaned_files: output.orphaned,
        }
    }

    /// Model for a non-user message, from its slug or the conversation default
    fn message_model(&self, role: Role, message: &ExportMessage, scope: &MessageScope) -> ModelRef {
        if role == Role::User {
            return scope.default_model.clone();
        }
        message
            .model_slug()
            .map(|slug| normalize_model(slug, &self.default_model))
            .unwrap_or_else(|| scope.default_model.clone())
    }

    /// Turn one node payload into at most one message
    ///
    /// Canvas content wins over plain text. Plain text is only kept for
    /// user and assistant turns. Files of a payload that yields no message
    /// are kept as orphans.
    fn process_message(
        &self,
        message: &ExportMessage,
        scope: &MessageScope,
        out: &mut WalkOutput,
    ) -> Option<ParsedMessage> {
        let (files, file_stats) = self.resolver.resolve_message(message);
        out.record_files(&files, &file_stats);

        let author = message.role();
        let role = Role::from_author(author);
        let timestamp = message.timestamp_or(scope.timestamp);
        let model = self.message_model(role, message, scope);

        let content = match extract_canvas(message) {
            Some(canvas) => Some(canvas),
            None => {
                let text = message_text(message);
                let conversational = matches!(author, "user" | "assistant");
                (conversational && !text.trim().is_empty()).then_some(text)
            }
        };

        match content {
            Some(content) => Some(ParsedMessage {
                role,
                content,
                timestamp,
                model,
                files,
            }),
            None => {
                out.orphaned.extend(files);
                None
            }
        }
    }

    /// Walk parent links from the current leaf, then reverse
    fn walk_primary(
        &self,
        graph: &ConversationGraph,
        current: Option<&str>,
        scope: &MessageScope,
    ) -> WalkOutput {
        let mut out = WalkOutput::default();
        let Some(mut id) = current.filter(|id| graph.get(id).is_some()) else {
            return out;
        };

        let mut visited: HashSet<&str> = HashSet::with_capacity(graph.len());
        loop {
            if !visited.insert(id) {
                log::warn!("Parent chain loops back to node {}, stopping", id);
                break;
            }
            let Some(node) = graph.get(id) else {
                break;
            };
            if let Some(message) = &node.message {
                if let Some(parsed) = self.process_message(message, scope, &mut out) {
                    out.messages.push(parsed);
                }
            }
            match node.parent.as_deref() {
                Some(parent) => id = parent,
                None => break,
            }
        }

        out.messages.reverse();
        out.orphaned.reverse();
        out
    }

    /// Walk first children from the inferred root
    fn walk_fallback(&self, graph: &ConversationGraph, scope: &MessageScope) -> WalkOutput {
        let mut out = WalkOutput::default();
        let Some(mut id) = graph.root() else {
            return out;
        };

        let mut visited: HashSet<&str> = HashSet::with_capacity(graph.len());
        loop {
            if !visited.insert(id) {
                log::warn!("Child chain loops back to node {}, stopping", id);
                break;
            }
            let Some(node) = graph.get(id) else {
                break;
            };
            if let Some(message) = &node.message {
                if let Some(parsed) = self.process_message(message, scope, &mut out) {
                    out.messages.push(parsed);
                }
            }
            match node.children.first() {
                Some(child) => id = child,
                None => break,
            }
        }
        out
    }

    /// Flat `chat_messages` list: roles alternate user/assistant by position
    fn walk_flat(&self, entries: &[Value], scope: &MessageScope) -> WalkOutput {
        let mut out = WalkOutput::default();

        for (idx, entry) in entries.iter().enumerate() {
            let Some(message) = ExportMessage::from_value(entry) else {
                log::warn!("Skipping chat message {} that is not an object", idx);
                continue;
            };

            let (files, file_stats) = self.resolver.resolve_message(&message);
            out.record_files(&files, &file_stats);

            let text = flat_entry_text(&message);
            if text.is_empty() {
                out.orphaned.extend(files);
                continue;
            }

            let role = if idx % 2 == 0 {
                Role::User
            } else {
                Role::Assistant
            };
            out.messages.push(ParsedMessage {
                role,
                content: text,
                timestamp: scope.timestamp,
                model: self.message_model(role, &message, scope),
                files,
            });
        }
        out
    }
}

/// Single user message carrying the title, for entries with no message data
fn placeholder_message(title: &str, scope: &MessageScope) -> ParsedMessage {
    ParsedMessage {
        role: Role::User,
        content: title.to_string(),
        timestamp: scope.timestamp,
        model: scope.default_model.clone(),
        files: Vec::new(),
    }
}

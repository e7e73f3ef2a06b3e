// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! ChatGPT export file structures
//!
//! `conversations.json` is an array of conversations. Most carry a `mapping`
//! of node id to node, where each node points at its parent and children;
//! older or third-party exports carry a flat `chat_messages` list instead.
//! Fields are read leniently: exports seen in the wild mix strings, numbers
//! and nulls in most positions.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Node id the web client uses for the synthetic root of every mapping
pub const SYNTHETIC_ROOT_ID: &str = "client-created-root";

/// Python-style truthiness used throughout the export format
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// First truthy value among `keys` of an object
pub fn first_truthy<'a>(object: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(key))
        .find(|value| is_truthy(value))
}

/// Parse an export timestamp into seconds since the epoch
///
/// Numbers are taken as-is. Strings are read as ISO 8601, with a trailing
/// `Z` and naive forms accepted (naive values are taken as UTC). Anything
/// else, including unparseable strings, yields `default`.
pub fn parse_timestamp(value: &Value, default: f64) -> f64 {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TimestampFormat {
        Float(f64),
        String(String),
    }

    match TimestampFormat::deserialize(value) {
        Ok(TimestampFormat::Float(f)) => f,
        Ok(TimestampFormat::String(s)) => parse_iso_timestamp(&s).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_iso_timestamp(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(to_seconds(dt.with_timezone(&Utc)));
    }
    if let Ok(dt) = s.parse::<DateTime<Utc>>() {
        return Some(to_seconds(dt));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(to_seconds(naive.and_utc()));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| to_seconds(naive.and_utc()))
}

fn to_seconds(dt: DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_micros()) / 1_000_000.0
}

/// Current time in seconds since the epoch
pub fn now_seconds() -> f64 {
    to_seconds(Utc::now())
}

// =============================================================================
// Messages
// =============================================================================

/// A message payload, from a mapping node or a flat list entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportMessage {
    #[serde(default)]
    pub author: Option<Value>,
    #[serde(default)]
    pub create_time: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub metadata: Option<Value>,
    /// Only present in flat lists
    #[serde(default)]
    pub text: Option<Value>,
}

static EMPTY_OBJECT: once_cell::sync::Lazy<Value> =
    once_cell::sync::Lazy::new(|| Value::Object(Map::new()));

impl ExportMessage {
    /// Read a message from JSON; non-objects yield `None`
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Author role, `assistant` when the author is missing
    pub fn role(&self) -> &str {
        self.author
            .as_ref()
            .and_then(|author| author.get("role"))
            .and_then(Value::as_str)
            .unwrap_or("assistant")
    }

    /// `content` object, or an empty object
    pub fn content(&self) -> &Value {
        self.content
            .as_ref()
            .filter(|c| c.is_object())
            .unwrap_or(&EMPTY_OBJECT)
    }

    /// `metadata` object, or an empty object
    pub fn metadata(&self) -> &Value {
        self.metadata
            .as_ref()
            .filter(|m| m.is_object())
            .unwrap_or(&EMPTY_OBJECT)
    }

    /// `content.parts`, empty when absent or not a list
    pub fn parts(&self) -> &[Value] {
        self.content()
            .get("parts")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `metadata.attachments`, empty when absent or not a list
    pub fn attachments(&self) -> &[Value] {
        self.metadata()
            .get("attachments")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `metadata.model_slug` when it is a non-empty string
    pub fn model_slug(&self) -> Option<&str> {
        self.metadata()
            .get("model_slug")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Message time: `create_time`, then `timestamp`, then `fallback`
    pub fn timestamp_or(&self, fallback: f64) -> f64 {
        [&self.create_time, &self.timestamp]
            .into_iter()
            .flatten()
            .find(|value| is_truthy(value))
            .map(|value| parse_timestamp(value, fallback))
            .unwrap_or(fallback)
    }
}

// =============================================================================
// Mapping graph
// =============================================================================

/// One node of a conversation mapping
#[derive(Debug, Clone, Default)]
pub struct ExportNode {
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub message: Option<ExportMessage>,
}

impl ExportNode {
    /// Read a node; non-object nodes yield `None`
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let parent = object
            .get("parent")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .map(String::from);
        let children = object
            .get("children")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let message = object.get("message").and_then(ExportMessage::from_value);

        Some(Self {
            parent,
            children,
            message,
        })
    }
}

/// Conversation mapping with its original key order
#[derive(Debug, Clone, Default)]
pub struct ConversationGraph {
    nodes: HashMap<String, ExportNode>,
    order: Vec<String>,
}

impl ConversationGraph {
    pub fn from_mapping(mapping: &Map<String, Value>) -> Self {
        let mut graph = Self::default();
        for (id, value) in mapping {
            match ExportNode::from_value(value) {
                Some(node) => {
                    graph.order.push(id.clone());
                    graph.nodes.insert(id.clone(), node);
                }
                None => log::warn!("Skipping malformed mapping node {}", id),
            }
        }
        graph
    }

    pub fn get(&self, id: &str) -> Option<&ExportNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Traversal root: the synthetic root if present, else the first
    /// parentless node in key order
    pub fn root(&self) -> Option<&str> {
        if self.nodes.contains_key(SYNTHETIC_ROOT_ID) {
            return Some(SYNTHETIC_ROOT_ID);
        }
        self.order
            .iter()
            .find(|id| self.nodes.get(*id).is_some_and(|n| n.parent.is_none()))
            .map(String::as_str)
    }
}

// =============================================================================
// Conversations
// =============================================================================

/// How a conversation stores its messages
#[derive(Debug, Clone)]
pub enum ExportBody {
    /// `chat_messages` list
    Flat(Vec<Value>),
    /// `mapping` tree
    Graph(ConversationGraph),
    /// Neither; only the title survives
    Unstructured,
}

/// One entry of `conversations.json`
#[derive(Debug, Clone)]
pub struct ExportConversation {
    pub title: String,
    /// Seconds since the epoch
    pub timestamp: f64,
    pub conversation_id: Option<String>,
    pub default_model_slug: Option<String>,
    pub current_node: Option<String>,
    pub body: ExportBody,
}

impl ExportConversation {
    /// Read a conversation entry; non-objects yield `None`
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let title = first_truthy(value, &["title", "name"])
            .and_then(Value::as_str)
            .unwrap_or("Untitled")
            .to_string();

        let timestamp = first_truthy(value, &["create_time", "update_time"])
            .map(|ts| parse_timestamp(ts, now_seconds()))
            .unwrap_or_else(now_seconds);

        let conversation_id = first_truthy(value, &["conversation_id", "id"]).and_then(id_string);

        let default_model_slug = object
            .get("default_model_slug")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let current_node = object
            .get("current_node")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let body = if let Some(list) = object.get("chat_messages").and_then(Value::as_array) {
            ExportBody::Flat(list.clone())
        } else if let Some(mapping) = object.get("mapping").and_then(Value::as_object) {
            ExportBody::Graph(ConversationGraph::from_mapping(mapping))
        } else {
            ExportBody::Unstructured
        };

        Some(Self {
            title,
            timestamp,
            conversation_id,
            default_model_slug,
            current_node,
            body,
        })
    }
}

/// Conversation ids are strings; numeric ids are rendered as text
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

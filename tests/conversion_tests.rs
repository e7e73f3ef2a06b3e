//! Tests for export parsing and chat record construction
//!
//! Covers:
//! - Flat and mapping exports
//! - Traversal order and the root-first fallback
//! - Canvas handling and role filtering
//! - Record invariants (chain links, models, ids, timestamps)

use migrator::builder::build_conversation;
use migrator::config::{DEFAULT_MODEL_ID, DEFAULT_MODEL_NAME};
use migrator::models::{MessageBody, ModelRef, ParsedConversation, Role, TargetConversation};
use migrator::providers::chatgpt::{AttachmentResolver, ExportParser};
use migrator::MigratorError;
use serde_json::{json, Value};

fn parser() -> ExportParser {
    ExportParser::new(
        AttachmentResolver::new("missing-export-dir"),
        ModelRef::new(DEFAULT_MODEL_ID, DEFAULT_MODEL_NAME),
    )
}

fn parse_one(data: Value) -> ParsedConversation {
    let (mut conversations, _) = parser().parse_export(&data);
    assert_eq!(conversations.len(), 1);
    conversations.remove(0)
}

fn node(id: &str, parent: Option<&str>, children: &[&str], message: Option<Value>) -> Value {
    json!({
        "id": id,
        "parent": parent,
        "children": children,
        "message": message,
    })
}

fn text_message(role: &str, text: &str, create_time: f64) -> Value {
    json!({
        "author": {"role": role},
        "create_time": create_time,
        "content": {"content_type": "text", "parts": [text]},
        "metadata": {},
    })
}

fn build(conversation: &ParsedConversation) -> TargetConversation {
    build_conversation(conversation, Some("user-1")).unwrap().record
}

// ============================================================================
// Flat Export Tests
// ============================================================================

mod flat_export_tests {
    use super::*;

    #[test]
    fn test_flat_roles_alternate_and_chain() {
        let conversation = parse_one(json!({
            "name": "Flat chat",
            "create_time": "2024-03-01T12:00:00Z",
            "chat_messages": [
                {"text": "hi"},
                {"text": "hello"},
                {"text": ""},
                {"text": "bye"}
            ]
        }));

        assert_eq!(conversation.title, "Flat chat");
        let roles: Vec<Role> = conversation.messages.iter().map(|m| m.role).collect();
        // Index parity decides the role, even after a skipped entry
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Assistant]);
        assert!(conversation
            .messages
            .iter()
            .all(|m| m.timestamp == conversation.timestamp));

        let record = build(&conversation);
        assert_eq!(record.messages.len(), 3);
        assert_eq!(record.messages[0].parent_id, None);
        for pair in record.messages.windows(2) {
            assert_eq!(pair[1].parent_id.as_deref(), Some(pair[0].id.as_str()));
            assert_eq!(pair[0].children_ids, vec![pair[1].id.clone()]);
        }
        assert!(record.messages[2].children_ids.is_empty());
        assert_eq!(
            record.history.current_id.as_deref(),
            Some(record.messages[2].id.as_str())
        );
        assert_eq!(record.history.messages.len(), 3);

        // History keys follow the chain, also once written out
        let history_ids: Vec<&String> = record.history.messages.keys().collect();
        let chain_ids: Vec<&String> = record.messages.iter().map(|m| &m.id).collect();
        assert_eq!(history_ids, chain_ids);
        let written = serde_json::to_string(&record).unwrap();
        let positions: Vec<usize> = chain_ids
            .iter()
            .map(|id| written.find(&format!("\"{}\":{{", id)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_flat_content_list_is_used_without_text() {
        let conversation = parse_one(json!({
            "title": "List content",
            "chat_messages": [
                {"content": ["part one ", {"text": "part two"}]}
            ]
        }));
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].content, "part one part two");
    }
}

// ============================================================================
// Mapping Traversal Tests
// ============================================================================

mod traversal_tests {
    use super::*;

    #[test]
    fn test_current_path_is_root_to_leaf() {
        let conversation = parse_one(json!({
            "title": "Tree",
            "create_time": 1700000000.0,
            "current_node": "leaf",
            "mapping": {
                "root": node("root", None, &["mid"], None),
                "mid": node("mid", Some("root"), &["leaf", "alt"], Some(text_message("user", "question", 1700000001.0))),
                "leaf": node("leaf", Some("mid"), &[], Some(text_message("assistant", "answer", 1700000002.0))),
                "alt": node("alt", Some("mid"), &[], Some(text_message("assistant", "discarded", 1700000003.0)))
            }
        }));

        let contents: Vec<&str> = conversation
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["question", "answer"]);
        assert_eq!(conversation.messages[0].timestamp, 1700000001.0);
    }

    #[test]
    fn test_fallback_walks_first_children_from_root() {
        let conversation = parse_one(json!({
            "title": "No current node",
            "mapping": {
                "a": node("a", None, &["b"], Some(text_message("user", "first", 1.0))),
                "b": node("b", Some("a"), &["c", "d"], Some(text_message("assistant", "second", 2.0))),
                "c": node("c", Some("b"), &[], Some(text_message("user", "third", 3.0))),
                "d": node("d", Some("b"), &[], Some(text_message("user", "other", 4.0)))
            }
        }));

        let contents: Vec<&str> = conversation
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_fallback_prefers_synthetic_root() {
        let conversation = parse_one(json!({
            "title": "Synthetic root",
            "current_node": "unknown",
            "mapping": {
                "stray": node("stray", None, &[], Some(text_message("user", "stray", 1.0))),
                "client-created-root": node("client-created-root", None, &["x"], None),
                "x": node("x", Some("client-created-root"), &[], Some(text_message("user", "kept", 2.0)))
            }
        }));

        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].content, "kept");
    }

    #[test]
    fn test_system_and_blank_messages_dropped() {
        let conversation = parse_one(json!({
            "title": "Filtering",
            "current_node": "c",
            "mapping": {
                "a": node("a", None, &["b"], Some(text_message("system", "be helpful", 1.0))),
                "b": node("b", Some("a"), &["c"], Some(text_message("user", "   ", 2.0))),
                "c": node("c", Some("b"), &[], Some(text_message("assistant", "reply", 3.0)))
            }
        }));

        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].role, Role::Assistant);
    }

    #[test]
    fn test_unstructured_entry_becomes_placeholder() {
        let conversation = parse_one(json!({"title": "Only a title"}));
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].role, Role::User);
        assert_eq!(conversation.messages[0].content, "Only a title");
    }

    #[test]
    fn test_missing_title_defaults() {
        let conversation = parse_one(json!({"title": "", "chat_messages": [{"text": "x"}]}));
        assert_eq!(conversation.title, "Untitled");
    }
}

// ============================================================================
// Canvas Tests
// ============================================================================

mod canvas_tests {
    use super::*;

    #[test]
    fn test_canvas_replaces_text() {
        let canvas = json!({
            "author": {"role": "assistant"},
            "create_time": 5.0,
            "content": {
                "content_type": "text",
                "parts": [
                    "Here is your draft",
                    {
                        "content_type": "code",
                        "language": "json",
                        "text": "{\"name\": \"draft\", \"content\": \"# Title\\nBody\"}"
                    }
                ]
            },
            "metadata": {}
        });

        let conversation = parse_one(json!({
            "title": "Canvas",
            "current_node": "b",
            "mapping": {
                "a": node("a", None, &["b"], Some(text_message("user", "write it", 4.0))),
                "b": node("b", Some("a"), &[], Some(canvas))
            }
        }));

        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(
            conversation.messages[1].content,
            "```markdown\n# Title\nBody\n```"
        );
    }

    #[test]
    fn test_tool_canvas_is_kept_as_assistant() {
        let canvas = json!({
            "author": {"role": "tool"},
            "content": {
                "content_type": "code",
                "language": "json",
                "text": "{\"content\": \"notes\"}"
            },
            "metadata": {}
        });

        let conversation = parse_one(json!({
            "title": "Tool canvas",
            "current_node": "t",
            "mapping": {"t": node("t", None, &[], Some(canvas))}
        }));

        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].role, Role::Assistant);
        assert_eq!(conversation.messages[0].content, "```markdown\nnotes\n```");
    }
}

// ============================================================================
// Record Builder Tests
// ============================================================================

mod builder_tests {
    use super::*;

    #[test]
    fn test_models_and_default_model() {
        let mut assistant = text_message("assistant", "answer", 2.0);
        assistant["metadata"] = json!({"model_slug": "gpt-4o"});

        let conversation = parse_one(json!({
            "title": "Models",
            "id": "conv-1",
            "create_time": 1700000000.5,
            "default_model_slug": "o3-mini",
            "current_node": "b",
            "mapping": {
                "a": node("a", None, &["b"], Some(text_message("user", "question", 1.0))),
                "b": node("b", Some("a"), &[], Some(assistant))
            }
        }));
        assert_eq!(conversation.default_model.id, "openai-o3-mini");

        let record = build(&conversation);
        assert_eq!(record.id, "conv-1");
        assert_eq!(record.models, vec!["openai-o3-mini", "openai-gpt-4o"]);
        assert_eq!(record.timestamp, 1700000000500);
        assert_eq!(record.user_id.as_deref(), Some("user-1"));

        match &record.messages[0].body {
            MessageBody::User { models } => assert_eq!(models, &vec!["openai-o3-mini".to_string()]),
            other => panic!("unexpected body {:?}", other),
        }
        match &record.messages[1].body {
            MessageBody::Assistant(fields) => {
                assert_eq!(fields.model, "openai-gpt-4o");
                assert_eq!(fields.model_name, "GPT-4o");
                assert!(fields.done);
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_record_json_shape() {
        let conversation = parse_one(json!({
            "title": "Shape",
            "conversation_id": "abc",
            "chat_messages": [{"text": "hi"}, {"text": "hello"}]
        }));
        let value = serde_json::to_value(build(&conversation)).unwrap();

        assert_eq!(value["id"], "abc");
        assert_eq!(value["userId"], "user-1");
        assert!(value["params"].as_object().unwrap().is_empty());
        assert_eq!(value["tags"], json!([]));
        let current = value["history"]["currentId"].as_str().unwrap();
        assert_eq!(value["history"]["messages"][current]["role"], "assistant");
        assert_eq!(value["messages"][0]["role"], "user");
        assert!(value["messages"][0].get("files").is_none());
        assert_eq!(value["messages"][1]["modelName"], DEFAULT_MODEL_NAME);
    }

    #[test]
    fn test_blank_conversation_id_is_rejected() {
        let conversation = parse_one(json!({
            "title": "Bad id",
            "conversation_id": "   ",
            "chat_messages": [{"text": "hi"}]
        }));
        match build_conversation(&conversation, None) {
            Err(MigratorError::MissingConversationId(title)) => assert_eq!(title, "Bad id"),
            other => panic!("expected missing id error, got {:?}", other.map(|b| b.record.id)),
        }
    }

    #[test]
    fn test_generated_id_when_export_has_none() {
        let conversation = parse_one(json!({
            "title": "No id",
            "chat_messages": [{"text": "hi"}]
        }));
        let built = build_conversation(&conversation, None).unwrap();
        assert_eq!(built.record.id, built.conversation_uuid);
        assert!(built.record.user_id.is_none());
    }
}

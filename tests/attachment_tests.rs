//! Tests for attachment resolution against an export folder
//!
//! Covers:
//! - Inline user uploads
//! - Generated image detection
//! - Missing images and non-image documents
//! - Orphaned files and the media copy list

use migrator::builder::{build_conversation, media_to_copy};
use migrator::config::{DEFAULT_MODEL_ID, DEFAULT_MODEL_NAME};
use migrator::models::{FileDescriptor, ModelRef};
use migrator::providers::chatgpt::attachments::{DOCUMENT_NOTE, GENERATED_DIR};
use migrator::providers::chatgpt::{AttachmentResolver, ExportParser};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn image_part(file_id: &str) -> Value {
    json!({
        "content_type": "image_asset_pointer",
        "asset_pointer": format!("file-service://{}", file_id),
    })
}

fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, bytes).unwrap();
}

// ============================================================================
// Image Resolution Tests
// ============================================================================

mod image_tests {
    use super::*;

    #[test]
    fn test_user_upload_is_inlined() {
        let dir = TempDir::new().unwrap();
        write_file(&dir.path().join("file-abc123-photo.png"), b"png-bytes");

        let resolver = AttachmentResolver::new(dir.path());
        let attachments = vec![json!({"id": "file-abc123", "name": "photo.png", "size": 9})];
        let parts = vec![image_part("file-abc123")];

        let (files, stats) = resolver.resolve(&attachments, &parts, &json!({}));

        assert_eq!(files.len(), 1);
        match &files[0] {
            FileDescriptor::InlineImage { url, name, size } => {
                assert!(url.starts_with("data:image/png;base64,"));
                assert_eq!(name, "photo.png");
                assert_eq!(*size, 9);
            }
            other => panic!("expected inline image, got {:?}", other),
        }
        assert_eq!(stats.user_uploaded, 1);
        assert_eq!(stats.ai_generated, 0);
        assert_eq!(stats.images_found, 1);
    }

    #[test]
    fn test_generated_folder_marks_ai_image() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir.path().join(GENERATED_DIR).join("file-gen1-0001.webp"),
            b"webp",
        );

        let resolver = AttachmentResolver::new(dir.path());
        let attachments = vec![json!({"id": "file-gen1", "name": "cat.webp"})];
        let (files, stats) = resolver.resolve(&attachments, &[image_part("file-gen1")], &json!({}));

        assert_eq!(files.len(), 1);
        assert!(files[0].is_ai_generated());
        match &files[0] {
            FileDescriptor::GeneratedImage {
                url, source_path, ..
            } => {
                assert_eq!(url, "uploads/file-gen1-0001.webp");
                assert!(source_path.as_ref().unwrap().ends_with("file-gen1-0001.webp"));
            }
            other => panic!("expected generated image, got {:?}", other),
        }
        assert_eq!(stats.ai_generated, 1);
    }

    #[test]
    fn test_dalle_metadata_marks_ai_image() {
        let dir = TempDir::new().unwrap();
        write_file(&dir.path().join("file-xyz.png"), b"png");

        let resolver = AttachmentResolver::new(dir.path());
        let attachments = vec![json!({"id": "file-xyz"})];
        let metadata = json!({"dalle": {"prompt": "a cat"}});
        let (files, _) = resolver.resolve(&attachments, &[image_part("file-xyz")], &metadata);

        assert!(files[0].is_ai_generated());
        // Name falls back to the file on disk
        assert_eq!(files[0].name(), "file-xyz.png");
    }

    #[test]
    fn test_dalle_marker_in_id_marks_ai_image() {
        let dir = TempDir::new().unwrap();
        write_file(&dir.path().join("file-DallE-77.png"), b"png");

        let resolver = AttachmentResolver::new(dir.path());
        let attachments = vec![json!({"id": "file-DallE-77", "name": "robot.png"})];
        let (files, stats) =
            resolver.resolve(&attachments, &[image_part("file-DallE-77")], &json!({}));

        assert_eq!(files.len(), 1);
        assert!(files[0].is_ai_generated());
        assert_eq!(stats.ai_generated, 1);
        assert_eq!(stats.user_uploaded, 0);
    }

    #[test]
    fn test_sibling_in_generated_folder_marks_root_image() {
        let dir = TempDir::new().unwrap();
        write_file(&dir.path().join("file-sib9-render.png"), b"png");

        let resolver = AttachmentResolver::new(dir.path());
        let attachments = vec![json!({"id": "file-sib9", "name": "render.png"})];
        let parts = [image_part("file-sib9")];

        // Without a generated sibling the root image is a user upload
        let (files, _) = resolver.resolve(&attachments, &parts, &json!({}));
        assert!(!files[0].is_ai_generated());

        write_file(
            &dir.path().join(GENERATED_DIR).join("file-sib9-0001.webp"),
            b"webp",
        );
        let (files, stats) = resolver.resolve(&attachments, &parts, &json!({}));

        assert_eq!(files.len(), 1);
        match &files[0] {
            FileDescriptor::GeneratedImage { url, .. } => {
                assert_eq!(url, "uploads/file-sib9-render.png")
            }
            other => panic!("expected generated image, got {:?}", other),
        }
        assert_eq!(stats.ai_generated, 1);
    }

    #[test]
    fn test_missing_image_is_counted_not_fatal() {
        let dir = TempDir::new().unwrap();
        let resolver = AttachmentResolver::new(dir.path());
        let attachments = vec![json!({"id": "file-gone", "name": "gone.jpg"})];

        let (files, stats) = resolver.resolve(&attachments, &[image_part("file-gone")], &json!({}));

        assert!(files.is_empty());
        assert_eq!(stats.images_missing, 1);
        assert_eq!(stats.total_files(), 0);
    }
}

// ============================================================================
// Document Tests
// ============================================================================

mod document_tests {
    use super::*;

    #[test]
    fn test_unreferenced_attachment_becomes_document() {
        let dir = TempDir::new().unwrap();
        let resolver = AttachmentResolver::new(dir.path());
        let attachments = vec![json!({
            "id": "file-doc",
            "name": "report.pdf",
            "size": 2048,
            "mime_type": "application/pdf"
        })];

        let (files, stats) = resolver.resolve(&attachments, &[json!("see attached")], &json!({}));

        assert_eq!(stats.non_images, 1);
        let value = serde_json::to_value(&files[0]).unwrap();
        assert_eq!(value["type"], "pdf");
        assert_eq!(value["name"], "report.pdf");
        assert_eq!(value["size"], 2048);
        assert_eq!(value["_migration_note"], DOCUMENT_NOTE);
        assert_eq!(value["_original_id"], "file-doc");

        let stripped = serde_json::to_value(files[0].stripped()).unwrap();
        assert!(stripped.get("_migration_note").is_none());
        assert!(stripped.get("_original_id").is_none());
    }

    #[test]
    fn test_duplicate_attachment_ids_resolve_once() {
        let dir = TempDir::new().unwrap();
        let resolver = AttachmentResolver::new(dir.path());
        let attachments = vec![
            json!({"id": "file-a", "name": "old.txt", "mime_type": "text/plain"}),
            json!({"id": "file-a", "name": "new.txt", "mime_type": "text/plain"}),
        ];

        let (files, stats) = resolver.resolve(&attachments, &[], &json!({}));
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name(), "new.txt");
        assert_eq!(stats.non_images, 1);
    }
}

// ============================================================================
// Conversation-Level Tests
// ============================================================================

mod conversation_files_tests {
    use super::*;

    #[test]
    fn test_image_only_turn_keeps_files_as_orphans() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir.path().join(GENERATED_DIR).join("file-img-1.png"),
            b"png",
        );

        let tool_turn = json!({
            "author": {"role": "tool"},
            "content": {
                "content_type": "multimodal_text",
                "parts": [image_part("file-img")]
            },
            "metadata": {"attachments": [{"id": "file-img", "name": "art.png"}]}
        });
        let export = json!([{
            "title": "Art",
            "current_node": "b",
            "mapping": {
                "a": {"parent": null, "children": ["b"], "message": {
                    "author": {"role": "user"},
                    "content": {"content_type": "text", "parts": ["draw a cat"]}
                }},
                "b": {"parent": "a", "children": [], "message": tool_turn}
            }
        }]);

        let parser = ExportParser::new(
            AttachmentResolver::new(dir.path()),
            ModelRef::new(DEFAULT_MODEL_ID, DEFAULT_MODEL_NAME),
        );
        let (conversations, stats) = parser.parse_export(&export);

        assert_eq!(stats.conversations_with_assets, 1);
        assert_eq!(stats.assets.ai_generated, 1);
        let conversation = &conversations[0];
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.orphaned_files.len(), 1);

        let built = build_conversation(conversation, None).unwrap();
        assert_eq!(built.record.files.len(), 1);
        assert_eq!(built.record.files[0].source_path(), None);

        let media = media_to_copy(built.files_with_metadata.iter());
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].dest_name, "file-img-1.png");
    }

    #[test]
    fn test_media_list_is_deduplicated() {
        let file = FileDescriptor::GeneratedImage {
            url: "uploads/a.png".to_string(),
            name: "a.png".to_string(),
            size: 1,
            source_path: Some("data/chatgpt/dalle-generations/a.png".into()),
        };
        let inline = FileDescriptor::InlineImage {
            url: "data:image/png;base64,AA==".to_string(),
            name: "b.png".to_string(),
            size: 1,
        };

        let media = media_to_copy([&file, &inline, &file]);
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].dest_name, "a.png");
    }
}

//! MCP tool definitions for Glimt.

use super::protocol::Tool;
use serde_json::{json, Value};

fn tool(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn page_property() -> Value {
    json!({
        "type": "integer",
        "minimum": 0,
        "description": "Zero-based page index",
        "default": 0
    })
}

fn date_property(description: &str) -> Value {
    json!({
        "type": "string",
        "pattern": "^\\d{4}-\\d{2}-\\d{2}$",
        "description": description
    })
}

fn search_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "collection_id": {
                "type": "string",
                "description": "Collection to search"
            },
            "query": {
                "type": "string",
                "description": "Natural language search query"
            },
            "limit": {
                "type": "integer",
                "minimum": 1,
                "maximum": 100,
                "description": "Maximum number of results",
                "default": 10
            }
        },
        "required": ["collection_id", "query"]
    })
}

/// Get all available tools.
pub fn get_tools() -> Vec<Tool> {
    vec![
        tool(
            "list_collections",
            "List video collections. Each collection has a type (entities, rich-transcripts \
             or media-descriptions) that decides which tools can read it. Paged, 25 per page.",
            json!({
                "type": "object",
                "properties": {
                    "page": page_property(),
                    "collection_type": {
                        "type": "string",
                        "enum": ["entities", "rich-transcripts", "media-descriptions"],
                        "description": "Only list collections of this type"
                    }
                },
                "required": []
            }),
        ),
        tool(
            "list_videos",
            "List uploaded videos, or the videos in one collection. Paged, 25 per page. \
             Dates are YYYY-MM-DD in UTC.",
            json!({
                "type": "object",
                "properties": {
                    "page": page_property(),
                    "collection_id": {
                        "type": "string",
                        "description": "Only list videos in this collection"
                    },
                    "created_after": date_property("Only videos created after this day"),
                    "created_before": date_property("Only videos created before the end of this day")
                },
                "required": []
            }),
        ),
        tool(
            "describe_video",
            "Get a detailed description of a video (speech, on-screen text, visual scenes). \
             Long videos are returned in 5-minute pages. Reuses stored descriptions when \
             possible and only starts a new description job when none exists.",
            json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "cloudglue://files/<id>, YouTube or TikTok URL, direct media URL, or storage URI (s3://, gs://, dropbox://, gdrive://, zoom://)"
                    },
                    "collection_id": {
                        "type": "string",
                        "description": "media-descriptions or rich-transcripts collection holding the file (cloudglue:// URLs only)"
                    },
                    "page": page_property(),
                    "start_time_seconds": {
                        "type": "number",
                        "minimum": 0,
                        "description": "Offset where page 0 starts",
                        "default": 0
                    }
                },
                "required": ["url"]
            }),
        ),
        tool(
            "extract_video_entities",
            "Extract structured entities from a video using a prompt, or read entities \
             stored in an entities collection. Segment-level entities are paged, 25 per page.",
            json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Video reference, as for describe_video"
                    },
                    "prompt": {
                        "type": "string",
                        "description": "What to extract. Required unless collection_id is given"
                    },
                    "collection_id": {
                        "type": "string",
                        "description": "entities collection holding the file (cloudglue:// URLs only)"
                    },
                    "page": page_property()
                },
                "required": ["url"]
            }),
        ),
        tool(
            "get_video_metadata",
            "Get technical metadata for an uploaded file: status, duration, resolution, \
             size and age.",
            json!({
                "type": "object",
                "properties": {
                    "file_id": {
                        "type": "string",
                        "description": "File ID or cloudglue://files/<id> URI"
                    }
                },
                "required": ["file_id"]
            }),
        ),
        tool(
            "segment_video_camera_shots",
            "Split a video into camera shots with timestamps. YouTube and TikTok URLs are \
             not supported.",
            json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "cloudglue://files/<id>, direct media URL, or storage URI"
                    }
                },
                "required": ["url"]
            }),
        ),
        tool(
            "segment_video_chapters",
            "Split a video into narrative chapters with titles and timestamps.",
            json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Video reference, as for describe_video"
                    },
                    "prompt": {
                        "type": "string",
                        "description": "Optional guidance for how to split chapters"
                    }
                },
                "required": ["url"]
            }),
        ),
        tool(
            "retrieve_summaries",
            "List the stored summaries of videos in a media-descriptions or rich-transcripts \
             collection. Paged, 25 per page.",
            json!({
                "type": "object",
                "properties": {
                    "collection_id": {
                        "type": "string",
                        "description": "Collection to read"
                    },
                    "page": page_property(),
                    "created_after": date_property("Only videos added after this day"),
                    "created_before": date_property("Only videos added before the end of this day")
                },
                "required": ["collection_id"]
            }),
        ),
        tool(
            "search_video_moments",
            "Find the moments (time ranges) inside a collection's videos that match a query.",
            search_schema(),
        ),
        tool(
            "search_video_summaries",
            "Find whole videos in a collection whose content matches a query.",
            search_schema(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::TOOL_NAMES;

    #[test]
    fn test_definitions_match_dispatch() {
        let names: Vec<String> = get_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, TOOL_NAMES.map(String::from).to_vec());
    }

    #[test]
    fn test_required_fields() {
        for tool in get_tools() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(tool.input_schema["required"].is_array(), "{}", tool.name);
        }
    }
}

//! MCP tool definitions for Memvault

use serde_json::json;

use super::protocol::ToolDefinition;

/// All tool definitions for Memvault
pub const TOOL_DEFINITIONS: &[(&str, &str, &str)] = &[
    // Writes
    (
        "add_memory",
        "Store a piece of text as a memory. Re-using a doc_id overwrites the previous memory.",
        r#"{
            "type": "object",
            "properties": {
                "text": {"type": "string", "description": "The text to remember"},
                "doc_id": {"type": "string", "description": "Document id. A UUID is generated when omitted."},
                "metadata": {"type": "object", "description": "Flat key-value pairs; values must be strings, numbers or booleans"},
                "collection_name": {"type": "string", "description": "Target collection (created if missing)"}
            },
            "required": ["text"]
        }"#,
    ),
    (
        "update_memory_metadata",
        "Merge keys into a memory's metadata. Existing keys not named are kept; text and embedding are unchanged.",
        r#"{
            "type": "object",
            "properties": {
                "doc_id": {"type": "string", "description": "Document id"},
                "metadata": {"type": "object", "description": "Keys to set; values must be strings, numbers or booleans"},
                "collection_name": {"type": "string"}
            },
            "required": ["doc_id", "metadata"]
        }"#,
    ),
    (
        "delete_memory",
        "Delete a memory by doc_id. Fails if the memory does not exist.",
        r#"{
            "type": "object",
            "properties": {
                "doc_id": {"type": "string", "description": "Document id"},
                "collection_name": {"type": "string"}
            },
            "required": ["doc_id"]
        }"#,
    ),
    // Retrieval
    (
        "recall_memory",
        "Recall the memories most similar to a query",
        r#"{
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "What to look for"},
                "top_k": {"type": "integer", "minimum": 1, "default": 3, "description": "Maximum results"},
                "filter": {"type": "object", "description": "Metadata filter, e.g. {\"author\": \"X\"} or {\"priority\": {\"$gte\": 2}}"},
                "collection_name": {"type": "string"}
            },
            "required": ["query"]
        }"#,
    ),
    (
        "recall_memory_with_distance",
        "Recall similar memories together with their distance to the query (lower is closer)",
        r#"{
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "top_k": {"type": "integer", "minimum": 1, "default": 3},
                "filter": {"type": "object", "description": "Metadata filter"},
                "collection_name": {"type": "string"}
            },
            "required": ["query"]
        }"#,
    ),
    (
        "recall_memory_hybrid",
        "Recall memories by similarity combined with a case-insensitive keyword match over text and metadata. Memories matching both rank first.",
        r#"{
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "keyword": {"type": "string", "description": "Substring to match; omit for plain similarity recall"},
                "top_k": {"type": "integer", "minimum": 1, "default": 3},
                "filter": {"type": "object", "description": "Metadata filter"},
                "collection_name": {"type": "string"}
            },
            "required": ["query"]
        }"#,
    ),
    (
        "check_memory",
        "Check whether a memory about a topic already exists",
        r#"{
            "type": "object",
            "properties": {
                "topic": {"type": "string"},
                "filter": {"type": "object", "description": "Metadata filter"},
                "collection_name": {"type": "string"}
            },
            "required": ["topic"]
        }"#,
    ),
    (
        "get_memory_by_id",
        "Fetch a single memory by doc_id",
        r#"{
            "type": "object",
            "properties": {
                "doc_id": {"type": "string"},
                "collection_name": {"type": "string"}
            },
            "required": ["doc_id"]
        }"#,
    ),
    // Summarization
    (
        "summarize_memory",
        "Summarize the memories most relevant to a query",
        r#"{
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "top_k": {"type": "integer", "minimum": 1, "default": 5},
                "filter": {"type": "object", "description": "Metadata filter"},
                "collection_name": {"type": "string"}
            },
            "required": ["query"]
        }"#,
    ),
    (
        "summarize_collection",
        "Summarize the contents of a collection, optionally focused on a query",
        r#"{
            "type": "object",
            "properties": {
                "collection_name": {"type": "string"},
                "query": {"type": "string", "description": "Optional focus"}
            },
            "required": ["collection_name"]
        }"#,
    ),
    // Collections
    (
        "list_collections",
        "List all collection names",
        r#"{
            "type": "object",
            "properties": {}
        }"#,
    ),
    (
        "list_collection_ids",
        "List every doc_id in a collection, in insertion order",
        r#"{
            "type": "object",
            "properties": {
                "collection_name": {"type": "string"}
            },
            "required": ["collection_name"]
        }"#,
    ),
    (
        "delete_collection",
        "Delete a collection and all of its memories. Irreversible.",
        r#"{
            "type": "object",
            "properties": {
                "collection_name": {"type": "string"}
            },
            "required": ["collection_name"]
        }"#,
    ),
    (
        "grant_privilege",
        "Allow the next privileged operation (delete_collection, list_collections) when the server requires privilege",
        r#"{
            "type": "object",
            "properties": {}
        }"#,
    ),
];

/// Get all tool definitions as ToolDefinition structs
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    TOOL_DEFINITIONS
        .iter()
        .map(|(name, description, schema)| ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: serde_json::from_str(schema).unwrap_or(json!({})),
        })
        .collect()
}

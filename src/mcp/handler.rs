//! Tool handler
//!
//! Maps `tools/call` arguments onto [`MemoryEngine`] methods and engine
//! results onto tool result bodies. Argument presence and shape are checked
//! here; everything else is the engine's job.

use std::sync::Arc;

use serde_json::{json, Value};

use super::protocol::{
    methods, InitializeResult, McpHandler, McpRequest, McpResponse, ToolCallResult,
};
use super::tools::get_tool_definitions;
use crate::error::{ErrorKind, MemvaultError, Result};
use crate::memory::normalize::{metadata_from_json, normalize};
use crate::memory::{MemoryEngine, NewMemory};
use crate::storage::WhereFilter;
use crate::types::{RecallRequest, RetrievalHit};

/// MCP handler exposing the memory tools
pub struct MemoryToolHandler {
    engine: Arc<MemoryEngine>,
}

impl MemoryToolHandler {
    pub fn new(engine: Arc<MemoryEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &MemoryEngine {
        &self.engine
    }

    /// Run one tool and wrap the outcome as a tool result
    pub fn call_tool(&self, name: &str, params: &Value) -> ToolCallResult {
        tracing::debug!(tool = name, "Tool call");
        match self.handle_tool_call(name, params) {
            Ok(value) => ToolCallResult::json(&value),
            Err(e) => {
                match e.kind() {
                    ErrorKind::StoreUnavailable
                    | ErrorKind::EmbeddingError
                    | ErrorKind::SummarizationError => {
                        tracing::error!(tool = name, error = %e, "Tool call failed")
                    }
                    _ => tracing::debug!(tool = name, error = %e, "Tool call rejected"),
                }
                ToolCallResult::from_error(&e)
            }
        }
    }

    fn handle_tool_call(&self, name: &str, params: &Value) -> Result<Value> {
        match name {
            "add_memory" => self.tool_add_memory(params),
            "recall_memory" => self.tool_recall_memory(params),
            "recall_memory_with_distance" => self.tool_recall_memory_with_distance(params),
            "recall_memory_hybrid" => self.tool_recall_memory_hybrid(params),
            "delete_memory" => self.tool_delete_memory(params),
            "summarize_memory" => self.tool_summarize_memory(params),
            "summarize_collection" => self.tool_summarize_collection(params),
            "check_memory" => self.tool_check_memory(params),
            "update_memory_metadata" => self.tool_update_memory_metadata(params),
            "get_memory_by_id" => self.tool_get_memory_by_id(params),
            "delete_collection" => self.tool_delete_collection(params),
            "list_collections" => self.tool_list_collections(),
            "list_collection_ids" => self.tool_list_collection_ids(params),
            "grant_privilege" => self.tool_grant_privilege(),
            _ => Err(MemvaultError::InvalidArgument(format!(
                "Unknown tool: {}",
                name
            ))),
        }
    }

    fn tool_add_memory(&self, params: &Value) -> Result<Value> {
        let text = required_str(params, "text")?;
        let (doc_id, metadata) =
            normalize(optional_str(params, "doc_id")?, params.get("metadata"))?;

        let mut input = NewMemory::new(text).doc_id(doc_id).metadata(metadata);
        if let Some(collection) = collection_name(params)? {
            input = input.collection(collection);
        }

        let added = self.engine.add_memory(input)?;
        Ok(json!(added))
    }

    fn tool_recall_memory(&self, params: &Value) -> Result<Value> {
        let hits = self.engine.recall_memory(&recall_request(params)?)?;
        let results: Vec<Value> = hits
            .into_iter()
            .map(|h| json!({"doc_id": h.doc_id, "text": h.text, "metadata": h.metadata}))
            .collect();
        Ok(json!({ "results": results }))
    }

    fn tool_recall_memory_with_distance(&self, params: &Value) -> Result<Value> {
        let hits = self
            .engine
            .recall_memory_with_distance(&recall_request(params)?)?;
        Ok(results_with_distance(hits))
    }

    fn tool_recall_memory_hybrid(&self, params: &Value) -> Result<Value> {
        let mut request = recall_request(params)?;
        request.keyword = optional_str(params, "keyword")?.map(str::to_string);

        let hits = self.engine.recall_memory_hybrid(&request)?;
        Ok(results_with_distance(hits))
    }

    fn tool_delete_memory(&self, params: &Value) -> Result<Value> {
        let doc_id = required_str(params, "doc_id")?;
        let collection = self.engine.delete_memory(doc_id, collection_name(params)?)?;
        Ok(json!({
            "deleted": true,
            "doc_id": doc_id,
            "collection": collection,
        }))
    }

    fn tool_summarize_memory(&self, params: &Value) -> Result<Value> {
        let query = required_str(params, "query")?;
        let top_k = optional_top_k(params)?;
        let filter = optional_filter(params)?;

        let summary =
            self.engine
                .summarize_memory(query, top_k, filter.as_ref(), collection_name(params)?)?;
        Ok(json!(summary))
    }

    fn tool_summarize_collection(&self, params: &Value) -> Result<Value> {
        let collection = required_str(params, "collection_name")?;
        let query = optional_str(params, "query")?;

        let summary = self.engine.summarize_collection(collection, query)?;
        Ok(json!(summary))
    }

    fn tool_check_memory(&self, params: &Value) -> Result<Value> {
        let topic = required_str(params, "topic")?;
        let filter = optional_filter(params)?;

        let check = self
            .engine
            .check_memory(topic, filter.as_ref(), collection_name(params)?)?;
        Ok(json!(check))
    }

    fn tool_update_memory_metadata(&self, params: &Value) -> Result<Value> {
        let doc_id = required_str(params, "doc_id")?;
        let metadata = match params.get("metadata") {
            Some(value) if !value.is_null() => metadata_from_json(Some(value))?,
            _ => {
                return Err(MemvaultError::InvalidArgument(
                    "metadata is required".to_string(),
                ))
            }
        };

        let merged = self
            .engine
            .update_memory_metadata(doc_id, metadata, collection_name(params)?)?;
        Ok(json!({
            "updated": true,
            "doc_id": doc_id,
            "metadata": merged,
        }))
    }

    fn tool_get_memory_by_id(&self, params: &Value) -> Result<Value> {
        let doc_id = required_str(params, "doc_id")?;
        let record = self
            .engine
            .get_memory_by_id(doc_id, collection_name(params)?)?;
        Ok(json!(record))
    }

    fn tool_delete_collection(&self, params: &Value) -> Result<Value> {
        let collection = required_str(params, "collection_name")?;
        self.engine.delete_collection(collection)?;
        Ok(json!({
            "deleted": true,
            "collection": collection.trim(),
        }))
    }

    fn tool_list_collections(&self) -> Result<Value> {
        let collections = self.engine.list_collections()?;
        Ok(json!({ "collections": collections }))
    }

    fn tool_list_collection_ids(&self, params: &Value) -> Result<Value> {
        let collection = required_str(params, "collection_name")?;
        let ids = self.engine.list_collection_ids(collection)?;
        Ok(json!({ "ids": ids }))
    }

    fn tool_grant_privilege(&self) -> Result<Value> {
        self.engine.grant_privilege();
        Ok(json!({ "granted": true }))
    }
}

impl McpHandler for MemoryToolHandler {
    fn handle_request(&self, request: McpRequest) -> McpResponse {
        match request.method.as_str() {
            methods::INITIALIZE => {
                let result = InitializeResult::default();
                McpResponse::success(request.id, json!(result))
            }
            methods::INITIALIZED | methods::PING => McpResponse::success(request.id, json!({})),
            methods::LIST_TOOLS => {
                let tools = get_tool_definitions();
                McpResponse::success(request.id, json!({ "tools": tools }))
            }
            methods::CALL_TOOL => {
                let name = request
                    .params
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                let arguments = request
                    .params
                    .get("arguments")
                    .cloned()
                    .unwrap_or(json!({}));

                let result = self.call_tool(name, &arguments);
                McpResponse::success(request.id, json!(result))
            }
            _ => McpResponse::error(
                request.id,
                -32601,
                format!("Method not found: {}", request.method),
            ),
        }
    }
}

fn results_with_distance(hits: Vec<RetrievalHit>) -> Value {
    json!({ "results": hits })
}

fn recall_request(params: &Value) -> Result<RecallRequest> {
    Ok(RecallRequest {
        query: required_str(params, "query")?.to_string(),
        top_k: optional_top_k(params)?,
        filter: optional_filter(params)?,
        keyword: None,
        collection: collection_name(params)?.map(str::to_string),
    })
}

fn required_str<'a>(params: &'a Value, field: &str) -> Result<&'a str> {
    optional_str(params, field)?
        .ok_or_else(|| MemvaultError::InvalidArgument(format!("{} is required", field)))
}

fn optional_str<'a>(params: &'a Value, field: &str) -> Result<Option<&'a str>> {
    match params.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(MemvaultError::InvalidArgument(format!(
            "{} must be a string, got {}",
            field, other
        ))),
    }
}

fn collection_name(params: &Value) -> Result<Option<&str>> {
    optional_str(params, "collection_name")
}

fn optional_top_k(params: &Value) -> Result<Option<usize>> {
    match params.get("top_k") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .filter(|k| *k > 0)
            .map(|k| Some(k as usize))
            .ok_or_else(|| {
                MemvaultError::InvalidArgument(format!(
                    "top_k must be a positive integer, got {}",
                    value
                ))
            }),
    }
}

fn optional_filter(params: &Value) -> Result<Option<WhereFilter>> {
    match params.get("filter") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value) => WhereFilter::from_json(value).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::TfIdfEmbedder;
    use crate::storage::SqliteBackend;
    use crate::types::EngineConfig;

    fn handler() -> MemoryToolHandler {
        let engine = MemoryEngine::new(
            Arc::new(SqliteBackend::in_memory().unwrap()),
            Arc::new(TfIdfEmbedder::new(128)),
            None,
            EngineConfig::default(),
        )
        .unwrap();
        MemoryToolHandler::new(Arc::new(engine))
    }

    fn body(result: &ToolCallResult) -> Value {
        serde_json::from_str(result.first_text().unwrap()).unwrap()
    }

    fn error_kind(result: &ToolCallResult) -> String {
        assert_eq!(result.is_error, Some(true));
        body(result)["error"]["kind"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_add_then_recall() {
        let h = handler();
        let added = h.call_tool(
            "add_memory",
            &json!({"text": "The sky is blue", "doc_id": "m1", "metadata": {"source": "obs"}}),
        );
        assert_eq!(added.is_error, None);
        assert_eq!(body(&added), json!({"doc_id": "m1", "collection": "agent_memory"}));

        let recalled = h.call_tool("recall_memory", &json!({"query": "sky color", "top_k": 1}));
        let value = body(&recalled);
        let results = value["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["doc_id"], "m1");
        assert_eq!(results[0]["metadata"]["source"], "obs");
        assert!(results[0].get("distance").is_none());

        let with_distance =
            h.call_tool("recall_memory_with_distance", &json!({"query": "sky color"}));
        assert!(body(&with_distance)["results"][0]["distance"].is_number());
    }

    #[test]
    fn test_missing_required_field() {
        let h = handler();
        assert_eq!(error_kind(&h.call_tool("recall_memory", &json!({}))), "InvalidArgument");
        assert_eq!(
            error_kind(&h.call_tool("update_memory_metadata", &json!({"doc_id": "m1"}))),
            "InvalidArgument"
        );
        assert_eq!(
            error_kind(&h.call_tool("delete_collection", &json!({}))),
            "InvalidArgument"
        );
    }

    #[test]
    fn test_bad_top_k_and_filter() {
        let h = handler();
        h.call_tool("add_memory", &json!({"text": "alpha"}));

        for top_k in [json!(0), json!(-2), json!(1.5), json!("3")] {
            let result = h.call_tool("recall_memory", &json!({"query": "alpha", "top_k": top_k}));
            assert_eq!(error_kind(&result), "InvalidArgument");
        }

        let result = h.call_tool(
            "recall_memory",
            &json!({"query": "alpha", "filter": {"k": {"$regex": "x"}}}),
        );
        assert_eq!(error_kind(&result), "InvalidArgument");
    }

    #[test]
    fn test_add_with_blank_doc_id_mints_one() {
        let h = handler();
        let added = body(&h.call_tool("add_memory", &json!({"text": "alpha", "doc_id": "   "})));
        let doc_id = added["doc_id"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(doc_id).is_ok());

        let kept = body(&h.call_tool("add_memory", &json!({"text": "beta", "doc_id": " m2 "})));
        assert_eq!(kept["doc_id"], "m2");
    }

    #[test]
    fn test_delete_echoes_resolved_collection() {
        let h = handler();
        h.call_tool("add_memory", &json!({"text": "alpha", "doc_id": "m1"}));

        let deleted = h.call_tool(
            "delete_memory",
            &json!({"doc_id": "m1", "collection_name": "   "}),
        );
        assert_eq!(
            body(&deleted),
            json!({"deleted": true, "doc_id": "m1", "collection": "agent_memory"})
        );
    }

    #[test]
    fn test_nested_metadata_rejected() {
        let h = handler();
        let result = h.call_tool(
            "add_memory",
            &json!({"text": "alpha", "metadata": {"nested": {"a": 1}}}),
        );
        assert_eq!(error_kind(&result), "InvalidMetadata");
    }

    #[test]
    fn test_not_found_kinds() {
        let h = handler();
        let result = h.call_tool("get_memory_by_id", &json!({"doc_id": "x"}));
        assert_eq!(error_kind(&result), "CollectionNotFound");

        h.call_tool("add_memory", &json!({"text": "alpha", "doc_id": "a"}));
        let result = h.call_tool("delete_memory", &json!({"doc_id": "missing"}));
        assert_eq!(error_kind(&result), "DocumentNotFound");
    }

    #[test]
    fn test_summarize_without_generator() {
        let h = handler();
        h.call_tool("add_memory", &json!({"text": "alpha"}));
        let result = h.call_tool("summarize_memory", &json!({"query": "alpha"}));
        assert_eq!(error_kind(&result), "SummarizationError");
    }

    #[test]
    fn test_update_and_list_shapes() {
        let h = handler();
        h.call_tool(
            "add_memory",
            &json!({"text": "alpha", "doc_id": "m1", "metadata": {"a": 1}, "collection_name": "notes"}),
        );

        let updated = h.call_tool(
            "update_memory_metadata",
            &json!({"doc_id": "m1", "metadata": {"b": true}, "collection_name": "notes"}),
        );
        assert_eq!(
            body(&updated),
            json!({"updated": true, "doc_id": "m1", "metadata": {"a": 1, "b": true}})
        );

        let ids = h.call_tool("list_collection_ids", &json!({"collection_name": "notes"}));
        assert_eq!(body(&ids), json!({"ids": ["m1"]}));

        let collections = h.call_tool("list_collections", &json!({}));
        assert_eq!(body(&collections), json!({"collections": ["notes"]}));
    }

    #[test]
    fn test_unknown_tool_and_method() {
        let h = handler();
        assert_eq!(error_kind(&h.call_tool("nope", &json!({}))), "InvalidArgument");

        let response = h.handle_request(McpRequest {
            jsonrpc: "2.0".into(),
            id: Some(json!(1)),
            method: "resources/list".into(),
            params: Value::Null,
        });
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[test]
    fn test_tools_list_over_rpc() {
        let h = handler();
        let response = h.handle_request(McpRequest {
            jsonrpc: "2.0".into(),
            id: Some(json!(1)),
            method: methods::LIST_TOOLS.into(),
            params: Value::Null,
        });
        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 14);
    }
}

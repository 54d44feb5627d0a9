use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, JsonObject, ListToolsResult,
    PaginatedRequestParams, ProgressNotificationParam, ProgressToken, ServerCapabilities,
    ServerInfo, Tool,
};
use rmcp::service::{Peer, RequestContext};
use rmcp::transport::stdio;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, ServiceExt};
use serde_json::json;

use crate::config::Config;
use crate::format::format_search_result;
use crate::progress::{NoopProgress, ProgressSink};
use crate::search::{SearchClient, SearchError};

const SEARCH_TOOL: &str = "search";

/// Progress sink that relays events to the MCP peer as
/// `notifications/progress`, correlated by the caller's progress token.
///
/// Delivery failures are logged and swallowed: progress is telemetry, and a
/// host that stopped listening must not fail the search.
struct PeerProgress {
    peer: Peer<RoleServer>,
    token: ProgressToken,
}

#[async_trait::async_trait]
impl ProgressSink for PeerProgress {
    async fn emit(&self, progress: f64, total: f64, message: &str) {
        let notification = ProgressNotificationParam {
            progress_token: self.token.clone(),
            progress,
            total: Some(total),
            message: Some(message.to_string()),
        };
        if let Err(e) = self.peer.notify_progress(notification).await {
            tracing::warn!(error = %e, "failed to deliver progress notification");
        }
    }
}

/// The MCP surface: exactly one tool, `search`.
#[derive(Clone)]
pub struct DeepSearchServer {
    invoker: Arc<SearchClient>,
}

impl DeepSearchServer {
    pub fn new(config: &Config) -> Self {
        Self {
            invoker: Arc::new(SearchClient::new(config)),
        }
    }

    #[doc(hidden)]
    pub fn with_invoker(invoker: SearchClient) -> Self {
        Self {
            invoker: Arc::new(invoker),
        }
    }
}

fn search_tool() -> Tool {
    let schema = match json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "The search query. DeepSearch runs a multi-provider web search \
                                and synthesizes an answer with cited sources."
            }
        },
        "required": ["query"]
    }) {
        serde_json::Value::Object(map) => map,
        _ => JsonObject::default(),
    };

    Tool {
        name: Cow::Borrowed(SEARCH_TOOL),
        title: Some("DeepSearch".to_string()),
        description: Some(Cow::Borrowed(
            "Search the web via the DeepSearch API and return a synthesized \
             answer with sources. Long-running: progress notifications are \
             emitted while the search executes.",
        )),
        input_schema: Arc::new(schema),
        output_schema: None,
        annotations: None,
        icons: None,
        meta: None,
    }
}

/// Check the `query` argument: present, a string, non-empty after trimming.
///
/// Violations become caller-visible error results, never protocol faults.
pub fn validate_query(arguments: Option<&JsonObject>) -> Result<String, SearchError> {
    let value = arguments
        .and_then(|args| args.get("query"))
        .ok_or_else(|| SearchError::InvalidQuery("missing required argument 'query'".to_string()))?;

    let raw = value
        .as_str()
        .ok_or_else(|| SearchError::InvalidQuery("'query' must be a string".to_string()))?;

    let query = raw.trim();
    if query.is_empty() {
        return Err(SearchError::InvalidQuery(
            "'query' must not be empty".to_string(),
        ));
    }

    Ok(query.to_string())
}

impl ServerHandler for DeepSearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Bridge to the DeepSearch web search API. Call the 'search' tool with a \
                 query string to get a synthesized answer with cited sources."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move { Ok(ListToolsResult::with_all_items(vec![search_tool()])) }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let invoker = Arc::clone(&self.invoker);
        async move {
            if request.name.as_ref() != SEARCH_TOOL {
                return Err(McpError::invalid_params(
                    format!("unknown tool: {}", request.name),
                    None,
                ));
            }

            let query = match validate_query(request.arguments.as_ref()) {
                Ok(query) => query,
                Err(e) => {
                    tracing::debug!(error = %e, "rejected search invocation");
                    return Ok(CallToolResult::error(vec![Content::text(e.to_string())]));
                }
            };

            let progress: Arc<dyn ProgressSink> = match context.meta.get_progress_token() {
                Some(token) => Arc::new(PeerProgress {
                    peer: context.peer.clone(),
                    token,
                }),
                None => Arc::new(NoopProgress),
            };

            tracing::info!(query = %query, "search invoked");

            match invoker.execute(&query, progress).await {
                Ok(result) => Ok(CallToolResult::success(vec![Content::text(
                    format_search_result(&result),
                )])),
                Err(e) => {
                    tracing::warn!(error = %e, "search failed");
                    Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
                }
            }
        }
    }
}

/// Serve the bridge over stdio until the host closes the channel.
pub async fn serve_stdio(config: &Config) -> anyhow::Result<()> {
    let server = DeepSearchServer::new(config);
    let running = server.serve(stdio()).await?;
    running.waiting().await?;
    Ok(())
}

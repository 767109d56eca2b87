use utoipa::OpenApi;
use worldview_types::{AgentEvent, ChatMessage, Role};

use crate::handlers::stream::{self, AgentRequest};
use crate::routes::health::{self, HealthResponse};
use crate::routes::threads::{self, ThreadResponse, ThreadSummary};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Worldview Assistant API",
        description = "Streaming agent invocation for NASA Worldview questions"
    ),
    paths(
        health::health_check,
        stream::stream_agent,
        stream::invoke_agent,
        threads::list_threads,
        threads::get_thread,
        threads::delete_thread,
    ),
    components(schemas(
        AgentEvent,
        AgentRequest,
        ChatMessage,
        Role,
        HealthResponse,
        ThreadResponse,
        ThreadSummary,
    )),
    tags(
        (name = "agent", description = "Run assistant turns"),
        (name = "threads", description = "Server-owned thread history"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

//! A2A HTTP server — serves the agent card and runs chat tasks

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use parley_core::env::{non_empty, process_lookup};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::autonomy::config::{AGENT_NAME_ENV, DEFAULT_AGENT_NAME, local_base_url};
use crate::directory::normalize_url;
use crate::executor::ChatExecutor;
use crate::protocol::*;

pub const AGENT_DESCRIPTION_ENV: &str = "PARLEY_AGENT_DESCRIPTION";
pub const PUBLIC_URL_ENV: &str = "PARLEY_PUBLIC_URL";

const DEFAULT_DESCRIPTION: &str = "A simple A2A-compatible chat agent";

/// Maximum number of tasks kept for status queries
const MAX_TASKS: usize = 1000;

/// Build this agent's card from the environment
pub fn build_agent_card(host: &str, port: u16) -> AgentCard {
    agent_card_from_lookup(process_lookup, host, port)
}

pub fn agent_card_from_lookup<F>(lookup: F, host: &str, port: u16) -> AgentCard
where
    F: Fn(&str) -> Option<String>,
{
    let url = lookup(PUBLIC_URL_ENV)
        .as_deref()
        .and_then(normalize_url)
        .or_else(|| local_base_url(host, &port.to_string()))
        .unwrap_or_default();

    AgentCard {
        name: non_empty(lookup(AGENT_NAME_ENV)).unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string()),
        description: non_empty(lookup(AGENT_DESCRIPTION_ENV))
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        url,
        version: env!("CARGO_PKG_VERSION").to_string(),
        capabilities: vec!["chat".to_string(), "autonomous_outreach".to_string()],
        authentication: AuthConfig::default(),
    }
}

/// Bounded in-memory task store
#[derive(Clone, Default)]
pub struct TaskStore {
    tasks: Arc<RwLock<HashMap<String, TaskResponse>>>,
}

impl TaskStore {
    pub async fn insert(&self, task: TaskResponse) {
        let mut tasks = self.tasks.write().await;
        if tasks.len() >= MAX_TASKS {
            let oldest = tasks
                .values()
                .min_by_key(|t| t.created_at)
                .map(|t| t.task_id.clone());
            if let Some(id) = oldest {
                tasks.remove(&id);
            }
        }
        tasks.insert(task.task_id.clone(), task);
    }

    pub async fn get(&self, task_id: &str) -> Option<TaskResponse> {
        self.tasks.read().await.get(task_id).cloned()
    }

    /// Cancel a task that has not finished; finished tasks are returned as-is
    pub async fn cancel(&self, task_id: &str) -> Option<TaskResponse> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(task_id)?;
        if !task.status.is_terminal() {
            task.status = TaskStatus::Cancelled;
            task.completed_at = Some(Utc::now());
        }
        Some(task.clone())
    }
}

#[derive(Clone)]
struct ServerState {
    card: Arc<AgentCard>,
    executor: Arc<ChatExecutor>,
    tasks: TaskStore,
}

/// A2A server exposing one agent
pub struct A2aServer {
    state: ServerState,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn not_found(task_id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Task {} not found", task_id),
        }),
    )
}

impl A2aServer {
    pub fn new(card: AgentCard, executor: Arc<ChatExecutor>) -> Self {
        Self {
            state: ServerState {
                card: Arc::new(card),
                executor,
                tasks: TaskStore::default(),
            },
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(AGENT_CARD_PATH, get(agent_card))
            .route(TASKS_PATH, post(create_task))
            .route("/a2a/tasks/{id}", get(get_task).delete(cancel_task))
            .with_state(self.state.clone())
    }

    /// Bind and serve until the process exits
    pub async fn serve(&self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind A2A server to {}", addr))?;
        self.serve_listener(listener).await
    }

    pub async fn serve_listener(&self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        info!(
            "A2A server '{}' listening on {} (card url {})",
            self.state.card.name, addr, self.state.card.url
        );
        axum::serve(listener, self.router())
            .await
            .context("A2A server terminated")
    }
}

async fn agent_card(State(state): State<ServerState>) -> Json<AgentCard> {
    Json(state.card.as_ref().clone())
}

async fn create_task(
    State(state): State<ServerState>,
    Json(request): Json<TaskRequest>,
) -> Json<TaskResponse> {
    let task = match state.executor.execute(&request.prompt).await {
        Ok(text) => TaskResponse::finished(TaskStatus::Completed, text),
        Err(e) => {
            warn!("Task failed: {}", e);
            TaskResponse::finished(TaskStatus::Failed, e.to_string())
        }
    };
    info!("Task {} finished with status {}", task.task_id, task.status);
    state.tasks.insert(task.clone()).await;
    Json(task)
}

async fn get_task(
    State(state): State<ServerState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    state.tasks.get(&task_id).await.map(Json).ok_or_else(|| not_found(&task_id))
}

async fn cancel_task(
    State(state): State<ServerState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    state.tasks.cancel(&task_id).await.map(Json).ok_or_else(|| not_found(&task_id))
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::AppState;
use crate::remote::{dispatch_all, StrategySource};
use crate::strategy::{compute_changes, select_rows, NodeStore, ParamFilter, Scope};
use crate::types::NodeRef;

type ApiResponse = (StatusCode, Json<Value>);

fn ok(body: Value) -> ApiResponse {
    (StatusCode::OK, Json(body))
}

fn err(status: StatusCode, message: impl Into<String>) -> ApiResponse {
    (status, Json(json!({ "error": message.into() })))
}

fn no_document() -> ApiResponse {
    err(StatusCode::NOT_FOUND, "no strategy document loaded")
}

pub async fn health_check() -> ApiResponse {
    ok(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
pub struct LoadRequest {
    /// Raw strategy export text, pasted by the operator.
    pub text: Option<String>,
    /// Or the name of a configured server to fetch the export from.
    pub server: Option<String>,
}

pub async fn post_load(State(state): State<AppState>, Json(request): Json<LoadRequest>) -> ApiResponse {
    let text = match (request.text, request.server) {
        (Some(text), _) => text,
        (None, Some(name)) => {
            let Some(server) = state.config.server(&name) else {
                return err(StatusCode::NOT_FOUND, format!("unknown server '{}'", name));
            };
            match server.client().fetch_strategy_text().await {
                Ok(text) => text,
                Err(e) => {
                    error!("strategy fetch from '{}' failed: {:#}", name, e);
                    return err(StatusCode::BAD_GATEWAY, e.to_string());
                }
            }
        }
        (None, None) => return err(StatusCode::BAD_REQUEST, "provide either text or server"),
    };

    let store = NodeStore::from_text(&text);
    if store.is_empty() {
        return err(StatusCode::UNPROCESSABLE_ENTITY, "nothing parsed");
    }

    let summary = json!({
        "folders": store.folder_count(),
        "strategies": store.strategy_count(),
        "catalogue": store.catalogue(),
    });
    info!(
        "loaded strategy document: {} folders, {} strategies",
        store.folder_count(),
        store.strategy_count()
    );

    let mut workspace = state.workspace.write().await;
    workspace.store = Some(store);
    ok(summary)
}

pub async fn get_tree(State(state): State<AppState>) -> ApiResponse {
    let workspace = state.workspace.read().await;
    match &workspace.store {
        Some(store) => ok(json!({
            "nodes": store.nodes(),
            "catalogue": store.catalogue(),
        })),
        None => no_document(),
    }
}

pub async fn get_catalogue(State(state): State<AppState>) -> ApiResponse {
    let workspace = state.workspace.read().await;
    match &workspace.store {
        Some(store) => ok(json!({ "catalogue": store.catalogue() })),
        None => no_document(),
    }
}

#[derive(Deserialize)]
pub struct RowsRequest {
    #[serde(flatten)]
    pub scope: Scope,
    /// Exact parameter name to filter on; absent means all parameters.
    pub param: Option<String>,
}

pub async fn post_rows(State(state): State<AppState>, Json(request): Json<RowsRequest>) -> ApiResponse {
    let mut workspace = state.workspace.write().await;
    match workspace.store.as_mut() {
        Some(store) => {
            let filter = ParamFilter::from_option(request.param);
            let rows = select_rows(store, &request.scope, &filter);
            ok(json!({ "rows": rows }))
        }
        None => no_document(),
    }
}

#[derive(Deserialize)]
pub struct ParamUpdate {
    pub node: usize,
    pub child: Option<usize>,
    pub name: String,
    pub value: String,
}

pub async fn put_param(State(state): State<AppState>, Json(update): Json<ParamUpdate>) -> ApiResponse {
    let mut workspace = state.workspace.write().await;
    let Some(store) = workspace.store.as_mut() else {
        return no_document();
    };
    let node_ref = NodeRef {
        node: update.node,
        child: update.child,
    };
    if store.set_param(node_ref, &update.name, &update.value) {
        ok(json!({ "updated": true }))
    } else {
        err(StatusCode::NOT_FOUND, "no strategy at that address")
    }
}

pub async fn get_changes(State(state): State<AppState>) -> ApiResponse {
    let workspace = state.workspace.read().await;
    match &workspace.store {
        Some(store) => ok(json!({ "changes": compute_changes(store) })),
        None => no_document(),
    }
}

pub async fn post_clear(State(state): State<AppState>) -> ApiResponse {
    let mut workspace = state.workspace.write().await;
    match workspace.store.as_mut() {
        Some(store) => {
            store.clear_changes();
            ok(json!({ "cleared": true }))
        }
        None => no_document(),
    }
}

pub async fn post_commit(State(state): State<AppState>) -> ApiResponse {
    let response = {
        let mut workspace = state.workspace.write().await;
        let Some(store) = workspace.store.as_ref() else {
            return no_document();
        };
        let changes = compute_changes(store);
        match workspace.ledger.commit(changes) {
            Some(entry) => json!({ "committed": true, "entry": entry }),
            None => return ok(json!({ "committed": false, "reason": "no changes" })),
        }
    };

    if let Err(e) = state.persist_history().await {
        error!("failed to persist history: {:#}", e);
        return err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }
    ok(response)
}

pub async fn get_history(State(state): State<AppState>) -> ApiResponse {
    let workspace = state.workspace.read().await;
    ok(json!({ "entries": workspace.ledger.entries() }))
}

pub async fn delete_history_record(
    State(state): State<AppState>,
    Path((entry, record)): Path<(usize, usize)>,
) -> ApiResponse {
    {
        let mut workspace = state.workspace.write().await;
        if let Err(e) = workspace.ledger.remove_record(entry, record) {
            return err(StatusCode::NOT_FOUND, e.to_string());
        }
    }

    if let Err(e) = state.persist_history().await {
        error!("failed to persist history: {:#}", e);
        return err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }
    ok(json!({ "removed": true }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Revert,
}

#[derive(Deserialize)]
pub struct DispatchRequest {
    pub entry: usize,
    pub direction: Direction,
    pub server: String,
}

/// Send a committed entry's forward or revert commands to a bot, in record
/// order, stopping at the first failure.
pub async fn post_dispatch(State(state): State<AppState>, Json(request): Json<DispatchRequest>) -> ApiResponse {
    let commands = {
        let workspace = state.workspace.read().await;
        let Some(entry) = workspace.ledger.entries().get(request.entry) else {
            return err(StatusCode::NOT_FOUND, format!("no history entry at index {}", request.entry));
        };
        match request.direction {
            Direction::Forward => entry.forward_commands(),
            Direction::Revert => entry.revert_commands(),
        }
    };

    let Some(server) = state.config.server(&request.server) else {
        return err(StatusCode::NOT_FOUND, format!("unknown server '{}'", request.server));
    };

    match dispatch_all(&server.client(), &commands).await {
        Ok(replies) => ok(json!({ "dispatched": commands.len(), "replies": replies })),
        Err(e) => {
            error!("dispatch to '{}' failed: {:#}", request.server, e);
            err(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

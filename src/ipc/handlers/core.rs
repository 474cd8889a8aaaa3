use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_id, get_str, require_admin, Reply};
use crate::ipc::types::{AppState, Request};
use crate::store::{Role, SessionUser, UserId};
use serde_json::{json, Value};
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> Reply<Value> {
    Ok(ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "session": state.session,
        }),
    ))
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> Reply<Value> {
    let path = PathBuf::from(get_str(req, "path")?);
    if let Err(e) = state.open_workspace(&path) {
        log::error!("workspace open failed: {e:#}");
        return Err(err(&req.id, "db_open_failed", format!("{e:#}"), None));
    }
    Ok(ok(
        &req.id,
        json!({
            "workspacePath": path.to_string_lossy(),
            "counts": {
                "users": state.store.users().len(),
                "classes": state.store.classes().len(),
                "words": state.store.words().len(),
            }
        }),
    ))
}

/// Installs the caller identity handed over by the UI. Nothing is authenticated here.
fn handle_session_set(state: &mut AppState, req: &Request) -> Reply<Value> {
    let id: UserId = get_id(req, "id")?;
    let role = get_str(req, "role")?
        .parse::<Role>()
        .map_err(|e| err(&req.id, "bad_params", e, None))?;
    let username = req
        .params
        .get("username")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let session = SessionUser { id, role, username };
    log::debug!("session set to user {} ({})", session.id, session.role);
    state.session = Some(session.clone());
    Ok(ok(&req.id, json!({ "session": session })))
}

fn handle_session_clear(state: &mut AppState, req: &Request) -> Reply<Value> {
    state.session = None;
    Ok(ok(&req.id, json!({})))
}

fn handle_snapshot_get(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    Ok(ok(&req.id, json!({ "snapshot": state.store.to_snapshot() })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let handler: fn(&mut AppState, &Request) -> Reply<Value> = match req.method.as_str() {
        "health" => handle_health,
        "workspace.select" => handle_workspace_select,
        "session.set" => handle_session_set,
        "session.clear" => handle_session_clear,
        "snapshot.get" => handle_snapshot_get,
        _ => return None,
    };
    Some(handler(state, req).unwrap_or_else(|resp| resp))
}

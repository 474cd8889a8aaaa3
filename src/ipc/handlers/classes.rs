use crate::ipc::error::{commit_err, ok};
use crate::ipc::helpers::{get_id, get_str, opt_str, require_admin, require_session, Reply};
use crate::ipc::types::{AppState, Request};
use crate::store::{ClassId, ClassPatch};
use serde_json::{json, Value};

fn handle_classes_list(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_session(state, req)?;
    Ok(ok(
        &req.id,
        json!({ "classes": state.store.class_summaries() }),
    ))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let name = get_str(req, "name")?;
    let description = opt_str(req, "description")?.unwrap_or_default();

    let class_id = state
        .commit(|s| s.create_class(name, description))
        .map_err(|e| commit_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "classId": class_id, "name": name.trim() })))
}

fn handle_classes_update(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let class_id: ClassId = get_id(req, "classId")?;
    let patch = ClassPatch {
        name: opt_str(req, "name")?.map(str::to_string),
        description: opt_str(req, "description")?.map(str::to_string),
    };
    state
        .commit(|s| s.update_class(class_id, patch))
        .map_err(|e| commit_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "class": state.store.class(class_id) })))
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let class_id: ClassId = get_id(req, "classId")?;
    state
        .commit(|s| s.delete_class(class_id))
        .map_err(|e| commit_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "deleted": class_id })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let handler: fn(&mut AppState, &Request) -> Reply<Value> = match req.method.as_str() {
        "classes.list" => handle_classes_list,
        "classes.create" => handle_classes_create,
        "classes.update" => handle_classes_update,
        "classes.delete" => handle_classes_delete,
        _ => return None,
    };
    Some(handler(state, req).unwrap_or_else(|resp| resp))
}

use crate::credential::Credential;
use crate::ipc::error::{commit_err, err, ok, store_err};
use crate::ipc::helpers::{get_id, get_str, opt_role, opt_str, require_admin, user_json, Reply};
use crate::ipc::types::{AppState, Request};
use crate::store::{StoreError, UserId, UserPatch};
use serde_json::{json, Value};

pub(super) fn hash_password(req: &Request, password: &str) -> Reply<Credential> {
    if password.is_empty() {
        return Err(err(&req.id, "bad_params", "password must not be empty", None));
    }
    Credential::hash(password).map_err(|e| err(&req.id, "hash_failed", format!("{e:#}"), None))
}

fn handle_users_list(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let role = opt_role(req, "role")?;
    let users: Vec<Value> = state
        .store
        .users_with_role(role)
        .into_iter()
        .map(user_json)
        .collect();
    Ok(ok(&req.id, json!({ "users": users })))
}

fn handle_users_create(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let username = get_str(req, "username")?;
    let Some(role) = opt_role(req, "role")? else {
        return Err(err(&req.id, "bad_params", "missing role", None));
    };
    let credential = hash_password(req, get_str(req, "password")?)?;

    let user_id = state
        .commit(|s| s.create_user(username, role, credential))
        .map_err(|e| commit_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "userId": user_id })))
}

fn handle_users_update(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let user_id: UserId = get_id(req, "userId")?;
    let password_hash = match opt_str(req, "password")? {
        // The edit form leaves the password blank to keep the current one.
        None | Some("") => None,
        Some(p) => Some(hash_password(req, p)?),
    };
    let patch = UserPatch {
        username: opt_str(req, "username")?.map(str::to_string),
        role: opt_role(req, "role")?,
        password_hash,
    };

    state
        .commit(|s| s.update_user(user_id, patch))
        .map_err(|e| commit_err(&req.id, e))?;
    let user = state.store.user(user_id).map(user_json);
    Ok(ok(&req.id, json!({ "user": user })))
}

fn handle_users_delete(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let user_id: UserId = get_id(req, "userId")?;
    state
        .commit(|s| s.delete_user(user_id))
        .map_err(|e| commit_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "deleted": user_id })))
}

/// Checks a password against the stored credential without changing anything.
fn handle_users_verify_password(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let user_id: UserId = get_id(req, "userId")?;
    let password = get_str(req, "password")?;
    let user = state.store.user(user_id).ok_or_else(|| {
        store_err(
            &req.id,
            &StoreError::NotFound {
                entity: "user",
                id: user_id.get(),
            },
        )
    })?;
    Ok(ok(&req.id, json!({ "valid": user.verify_password(password) })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let handler: fn(&mut AppState, &Request) -> Reply<Value> = match req.method.as_str() {
        "users.list" => handle_users_list,
        "users.create" => handle_users_create,
        "users.update" => handle_users_update,
        "users.delete" => handle_users_delete,
        "users.verifyPassword" => handle_users_verify_password,
        _ => return None,
    };
    Some(handler(state, req).unwrap_or_else(|resp| resp))
}

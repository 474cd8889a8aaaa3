use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::store::{can_manage_roster, Role, SessionUser, User};
use serde_json::{json, Value};

/// Handler-local result: the error side is a ready-to-send response.
pub type Reply<T> = Result<T, Value>;

fn bad_params(req: &Request, message: impl Into<String>) -> Value {
    err(&req.id, "bad_params", message, None)
}

pub fn get_str<'a>(req: &'a Request, key: &str) -> Reply<&'a str> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| bad_params(req, format!("missing {key}")))
}

pub fn opt_str<'a>(req: &'a Request, key: &str) -> Reply<Option<&'a str>> {
    match req.params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(bad_params(req, format!("{key} must be a string"))),
    }
}

/// Ids arrive as numbers or as the numeric strings HTML selects produce.
fn parse_id(v: &Value) -> Option<u32> {
    let n = match v {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    n.filter(|n| *n > 0)
}

pub fn get_id<T: From<u32>>(req: &Request, key: &str) -> Reply<T> {
    match opt_id(req, key)? {
        Some(id) => Ok(id),
        None => Err(bad_params(req, format!("missing {key}"))),
    }
}

/// Absent, null and "" (an "All" filter option) all mean no id.
pub fn opt_id<T: From<u32>>(req: &Request, key: &str) -> Reply<Option<T>> {
    match req.params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(v) => parse_id(v)
            .map(|n| Some(T::from(n)))
            .ok_or_else(|| bad_params(req, format!("{key} must be a positive integer"))),
    }
}

/// Small counts such as a word's difficulty. Absent, null and "" mean unset.
pub fn opt_u8(req: &Request, key: &str) -> Reply<Option<u8>> {
    let parsed = match req.params.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse::<u8>().ok(),
        Some(_) => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| bad_params(req, format!("{key} must be a small non-negative integer")))
}

pub fn opt_role(req: &Request, key: &str) -> Reply<Option<Role>> {
    match opt_str(req, key)? {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<Role>()
            .map(Some)
            .map_err(|e| bad_params(req, e)),
    }
}

pub fn require_session(state: &AppState, req: &Request) -> Reply<SessionUser> {
    state
        .session
        .clone()
        .ok_or_else(|| err(&req.id, "no_session", "set a session first", None))
}

pub fn require_admin(state: &AppState, req: &Request) -> Reply<SessionUser> {
    let session = require_session(state, req)?;
    if !can_manage_roster(session.role) {
        return Err(forbidden(req, session.role));
    }
    Ok(session)
}

pub fn forbidden(req: &Request, role: Role) -> Value {
    err(
        &req.id,
        "forbidden",
        format!("role {role} may not perform {}", req.method),
        None,
    )
}

pub fn no_workspace(req: &Request) -> Value {
    err(&req.id, "no_workspace", "select a workspace first", None)
}

/// List view of a user, without the credential.
pub fn user_json(u: &User) -> Value {
    json!({
        "id": u.id,
        "username": u.username,
        "role": u.role,
    })
}

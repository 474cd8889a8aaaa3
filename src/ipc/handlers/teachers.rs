use crate::ipc::error::{commit_err, ok};
use crate::ipc::helpers::{
    forbidden, get_id, opt_id, require_admin, require_session, user_json, Reply,
};
use crate::ipc::types::{AppState, Request};
use crate::store::{can_manage_roster, ClassId, UserId};
use serde_json::{json, Value};

fn handle_teachers_list(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_session(state, req)?;
    let class_id: Option<ClassId> = opt_id(req, "classId")?;
    let store = &state.store;
    let assignments: Vec<Value> = store
        .teacher_assignments_for(class_id)
        .into_iter()
        .map(|a| {
            json!({
                "teacherId": a.teacher_id,
                "classId": a.class_id,
                "teacherName": store.user(a.teacher_id).map(|u| u.username.as_str()),
                "className": store.class(a.class_id).map(|c| c.name.as_str()),
            })
        })
        .collect();
    let teachers: Vec<Value> = match class_id {
        Some(c) => store.teachers_of(c).into_iter().map(user_json).collect(),
        None => Vec::new(),
    };
    Ok(ok(
        &req.id,
        json!({ "assignments": assignments, "teachers": teachers }),
    ))
}

fn handle_teachers_assign(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let teacher_id: UserId = get_id(req, "teacherId")?;
    let class_id: ClassId = get_id(req, "classId")?;
    state
        .commit(|s| s.assign_teacher(teacher_id, class_id))
        .map_err(|e| commit_err(&req.id, e))?;
    Ok(ok(
        &req.id,
        json!({ "teacherId": teacher_id, "classId": class_id }),
    ))
}

fn handle_teachers_unassign(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let teacher_id: UserId = get_id(req, "teacherId")?;
    let class_id: ClassId = get_id(req, "classId")?;
    state
        .commit(|s| s.unassign_teacher(teacher_id, class_id))
        .map_err(|e| commit_err(&req.id, e))?;
    Ok(ok(&req.id, json!({})))
}

/// Classes a teacher is assigned to; defaults to the session user. Only an admin may
/// ask about someone else.
fn handle_teachers_classes(state: &mut AppState, req: &Request) -> Reply<Value> {
    let session = require_session(state, req)?;
    let teacher_id: UserId = opt_id(req, "teacherId")?.unwrap_or(session.id);
    if teacher_id != session.id && !can_manage_roster(session.role) {
        return Err(forbidden(req, session.role));
    }
    Ok(ok(
        &req.id,
        json!({ "teacherId": teacher_id, "classes": state.store.classes_of(teacher_id) }),
    ))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let handler: fn(&mut AppState, &Request) -> Reply<Value> = match req.method.as_str() {
        "teachers.list" => handle_teachers_list,
        "teachers.assign" => handle_teachers_assign,
        "teachers.unassign" => handle_teachers_unassign,
        "teachers.classes" => handle_teachers_classes,
        _ => return None,
    };
    Some(handler(state, req).unwrap_or_else(|resp| resp))
}

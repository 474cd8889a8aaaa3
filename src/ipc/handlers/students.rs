use super::users::hash_password;
use crate::ipc::error::{commit_err, ok};
use crate::ipc::helpers::{get_id, get_str, opt_id, require_admin, Reply};
use crate::ipc::types::{AppState, Request};
use crate::store::{ClassId, UserId};
use serde_json::{json, Value};

fn handle_students_list(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let class_id: Option<ClassId> = opt_id(req, "classId")?;
    let teacher_id: Option<UserId> = opt_id(req, "teacherId")?;
    Ok(ok(
        &req.id,
        json!({ "students": state.store.roster(class_id, teacher_id) }),
    ))
}

fn handle_students_register(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let username = get_str(req, "username")?;
    let class_id: ClassId = get_id(req, "classId")?;
    let teacher_id: UserId = get_id(req, "teacherId")?;
    let credential = hash_password(req, get_str(req, "password")?)?;

    let student_id = state
        .commit(|s| s.register_student(username, credential, class_id, teacher_id))
        .map_err(|e| commit_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "studentId": student_id })))
}

fn handle_students_assign(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let student_id: UserId = get_id(req, "studentId")?;
    let class_id: ClassId = get_id(req, "classId")?;
    let teacher_id: UserId = get_id(req, "teacherId")?;
    state
        .commit(|s| s.assign_student(student_id, class_id, teacher_id))
        .map_err(|e| commit_err(&req.id, e))?;
    Ok(ok(
        &req.id,
        json!({ "assignment": state.store.student_assignment(student_id) }),
    ))
}

fn handle_students_unassign(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let student_id: UserId = get_id(req, "studentId")?;
    let removed = state
        .commit(|s| s.unassign_student(student_id))
        .map_err(|e| commit_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "removed": removed })))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let student_id: UserId = get_id(req, "studentId")?;
    state
        .commit(|s| s.delete_student(student_id))
        .map_err(|e| commit_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "deleted": student_id })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let handler: fn(&mut AppState, &Request) -> Reply<Value> = match req.method.as_str() {
        "students.list" => handle_students_list,
        "students.register" => handle_students_register,
        "students.assign" => handle_students_assign,
        "students.unassign" => handle_students_unassign,
        "students.delete" => handle_students_delete,
        _ => return None,
    };
    Some(handler(state, req).unwrap_or_else(|resp| resp))
}

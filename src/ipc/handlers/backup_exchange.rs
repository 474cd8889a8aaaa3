use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_str, no_workspace, require_admin, Reply};
use crate::ipc::types::{AppState, Request};
use crate::store::Store;
use serde_json::{json, Value};
use std::path::PathBuf;

fn non_blank_path(req: &Request, key: &str) -> Reply<PathBuf> {
    match get_str(req, key)?.trim() {
        "" => Err(err(&req.id, "bad_params", format!("missing {key}"), None)),
        v => Ok(PathBuf::from(v)),
    }
}

fn handle_backup_export(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let out = non_blank_path(req, "outPath")?;

    let export = backup::export_snapshot_bundle(&state.store.to_snapshot(), &out).map_err(|e| {
        err(
            &req.id,
            "backup_failed",
            format!("{e:#}"),
            Some(json!({ "path": out.to_string_lossy() })),
        )
    })?;
    log::info!("exported snapshot bundle to {}", out.to_string_lossy());

    Ok(ok(
        &req.id,
        json!({
            "path": out.to_string_lossy(),
            "bundleFormat": export.bundle_format,
            "entryCount": export.entry_count,
            "sha256": export.sha256,
        }),
    ))
}

/// Replaces the whole dataset with the bundle's contents. Rows that break the
/// integrity rules are pruned on the way in, as on workspace load.
fn handle_backup_import(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    if state.workspace.is_none() {
        return Err(no_workspace(req));
    }
    let src = non_blank_path(req, "inPath")?;
    if !src.is_file() {
        return Err(err(
            &req.id,
            "not_found",
            "bundle file not found",
            Some(json!({ "path": src.to_string_lossy() })),
        ));
    }

    let (snapshot, import) = backup::import_snapshot_bundle(&src).map_err(|e| {
        err(
            &req.id,
            "backup_failed",
            format!("{e:#}"),
            Some(json!({ "path": src.to_string_lossy() })),
        )
    })?;
    let (store, report) = Store::from_snapshot(&snapshot);
    state
        .replace_store(store)
        .map_err(|e| err(&req.id, "db_update_failed", format!("{e:#}"), None))?;
    log::info!(
        "imported {} bundle from {} ({} rows dropped)",
        import.bundle_format_detected,
        src.to_string_lossy(),
        report.dropped_rows
    );

    Ok(ok(
        &req.id,
        json!({
            "bundleFormatDetected": import.bundle_format_detected,
            "droppedRows": report.dropped_rows,
            "corruptKeys": report.corrupt_keys,
            "counts": {
                "users": state.store.users().len(),
                "classes": state.store.classes().len(),
                "words": state.store.words().len(),
            }
        }),
    ))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let handler: fn(&mut AppState, &Request) -> Reply<Value> = match req.method.as_str() {
        "backup.export" => handle_backup_export,
        "backup.import" => handle_backup_import,
        _ => return None,
    };
    Some(handler(state, req).unwrap_or_else(|resp| resp))
}

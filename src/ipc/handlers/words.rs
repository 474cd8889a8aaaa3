use crate::ipc::error::{commit_err, ok, store_err};
use crate::ipc::helpers::{
    forbidden, get_id, get_str, opt_id, opt_str, opt_u8, require_admin, require_session, Reply,
};
use crate::ipc::types::{AppState, Request};
use crate::store::{
    can_edit_word, category_summaries, ClassId, StoreError, UserId, WordDetails, WordFilter,
    WordId, WordPatch,
};
use serde_json::{json, Value};

fn word_filter(req: &Request) -> Reply<WordFilter> {
    Ok(WordFilter {
        class_id: opt_id(req, "classId")?,
        mentor_id: opt_id(req, "mentorId")?,
        keyword: opt_str(req, "keyword")?.map(str::to_string),
        category: opt_str(req, "category")?.map(str::to_string),
        difficulty: opt_u8(req, "difficulty")?,
    })
}

fn handle_words_list(state: &mut AppState, req: &Request) -> Reply<Value> {
    require_admin(state, req)?;
    let filter = word_filter(req)?;
    Ok(ok(
        &req.id,
        json!({ "words": state.store.words_filtered(&filter) }),
    ))
}

/// Words the session may see, narrowed by the same filters as `words.list`.
fn handle_words_visible(state: &mut AppState, req: &Request) -> Reply<Value> {
    let session = require_session(state, req)?;
    let filter = word_filter(req)?;
    let words: Vec<_> = state
        .store
        .words_visible_to(&session)
        .into_iter()
        .filter(|w| filter.matches(w))
        .collect();
    Ok(ok(&req.id, json!({ "words": words })))
}

/// Category statistics over the words the session may see.
fn handle_words_categories(state: &mut AppState, req: &Request) -> Reply<Value> {
    let session = require_session(state, req)?;
    let filter = WordFilter {
        mentor_id: opt_id(req, "mentorId")?,
        class_id: opt_id(req, "classId")?,
        ..WordFilter::default()
    };
    let categories = category_summaries(
        state
            .store
            .words_visible_to(&session)
            .into_iter()
            .filter(|w| filter.matches(w)),
    );
    Ok(ok(&req.id, json!({ "categories": categories })))
}

fn handle_words_create(state: &mut AppState, req: &Request) -> Reply<Value> {
    let session = require_session(state, req)?;
    let word = get_str(req, "word")?;
    let class_id: ClassId = get_id(req, "classId")?;
    let mentor_id: UserId = opt_id(req, "mentorId")?.unwrap_or(session.id);
    if !can_edit_word(&session, mentor_id) {
        return Err(forbidden(req, session.role));
    }
    let details = WordDetails {
        category: opt_str(req, "category")?.map(str::to_string),
        difficulty: opt_u8(req, "difficulty")?,
    };

    let word_id = state
        .commit(|s| s.create_word_with(word, class_id, mentor_id, details))
        .map_err(|e| commit_err(&req.id, e))?;
    Ok(ok(
        &req.id,
        json!({ "wordId": word_id, "word": state.store.word(word_id) }),
    ))
}

fn handle_words_update(state: &mut AppState, req: &Request) -> Reply<Value> {
    let session = require_session(state, req)?;
    let word_id: WordId = get_id(req, "wordId")?;
    let Some(current) = state.store.word(word_id) else {
        return Err(store_err(
            &req.id,
            &StoreError::NotFound {
                entity: "word",
                id: word_id.get(),
            },
        ));
    };
    let patch = WordPatch {
        word: opt_str(req, "word")?.map(str::to_string),
        class_id: opt_id(req, "classId")?,
        mentor_id: opt_id(req, "mentorId")?,
        category: opt_str(req, "category")?.map(str::to_string),
        difficulty: opt_u8(req, "difficulty")?,
    };
    let next_mentor = patch.mentor_id.unwrap_or(current.mentor_id);
    if !can_edit_word(&session, current.mentor_id) || !can_edit_word(&session, next_mentor) {
        return Err(forbidden(req, session.role));
    }

    state
        .commit(|s| s.update_word(word_id, patch))
        .map_err(|e| commit_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "word": state.store.word(word_id) })))
}

fn handle_words_delete(state: &mut AppState, req: &Request) -> Reply<Value> {
    let session = require_session(state, req)?;
    let word_id: WordId = get_id(req, "wordId")?;
    if let Some(current) = state.store.word(word_id) {
        if !can_edit_word(&session, current.mentor_id) {
            return Err(forbidden(req, session.role));
        }
    }
    state
        .commit(|s| s.delete_word(word_id))
        .map_err(|e| commit_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "deleted": word_id })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let handler: fn(&mut AppState, &Request) -> Reply<Value> = match req.method.as_str() {
        "words.list" => handle_words_list,
        "words.visible" => handle_words_visible,
        "words.categories" => handle_words_categories,
        "words.create" => handle_words_create,
        "words.update" => handle_words_update,
        "words.delete" => handle_words_delete,
        _ => return None,
    };
    Some(handler(state, req).unwrap_or_else(|resp| resp))
}

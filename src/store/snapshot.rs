use super::model::{Class, Role, StudentAssignment, TeacherAssignment, User, Word};
use super::{check_difficulty, normalize_category, normalize_word, Store};
use crate::credential::Credential;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};

pub const CLASSES_KEY: &str = "classesData";
pub const TEACHER_ASSIGNMENTS_KEY: &str = "teacherAssignments";
pub const USERS_KEY: &str = "usersData";
pub const WORDS_KEY: &str = "wordsData";
pub const STUDENT_ASSIGNMENTS_KEY: &str = "studentAssignments";

pub const SNAPSHOT_KEYS: [&str; 5] = [
    CLASSES_KEY,
    TEACHER_ASSIGNMENTS_KEY,
    USERS_KEY,
    WORDS_KEY,
    STUDENT_ASSIGNMENTS_KEY,
];

/// Flat key/value form of the whole dataset; each value is a JSON array of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, Value>);

impl Snapshot {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// True if none of the collection keys is present.
    pub fn is_blank(&self) -> bool {
        SNAPSHOT_KEYS.iter().all(|k| !self.0.contains_key(*k))
    }
}

/// Where snapshots live between runs. The store itself never calls this.
pub trait SnapshotStore {
    fn load(&self) -> anyhow::Result<Option<Snapshot>>;
    fn save(&self, snapshot: &Snapshot) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub corrupt_keys: Vec<&'static str>,
    pub dropped_rows: usize,
    pub rehashed_credentials: usize,
}

fn decode<T: DeserializeOwned>(snapshot: &Snapshot, key: &'static str, report: &mut LoadReport) -> Vec<T> {
    let Some(raw) = snapshot.get(key) else {
        return Vec::new();
    };
    // The panels keep each collection as a JSON-encoded string in localStorage.
    let raw = match raw {
        Value::String(text) => serde_json::from_str(text).unwrap_or_else(|_| raw.clone()),
        other => other.clone(),
    };
    match serde_json::from_value::<Vec<T>>(raw) {
        Ok(rows) => rows,
        Err(e) => {
            log::warn!("snapshot key {key} is malformed, loading it as empty: {e}");
            report.corrupt_keys.push(key);
            Vec::new()
        }
    }
}

impl Store {
    pub fn to_snapshot(&self) -> Snapshot {
        let mut snap = Snapshot::default();
        snap.insert(CLASSES_KEY, json!(self.classes));
        snap.insert(TEACHER_ASSIGNMENTS_KEY, json!(self.teacher_assignments));
        snap.insert(USERS_KEY, json!(self.users));
        snap.insert(WORDS_KEY, json!(self.words));
        snap.insert(STUDENT_ASSIGNMENTS_KEY, json!(self.student_assignments));
        snap
    }

    /// Rebuilds a store from a snapshot.
    ///
    /// Missing or malformed keys load as empty collections. Rows that would break an
    /// invariant are dropped in dependency order (users and classes first, then the
    /// assignments, then words), so the result is always consistent. Credentials that
    /// are not PHC strings are treated as legacy clear text and hashed on the way in.
    pub fn from_snapshot(snapshot: &Snapshot) -> (Store, LoadReport) {
        let mut report = LoadReport::default();
        let mut store = Store::new();

        let users: Vec<User> = decode(snapshot, USERS_KEY, &mut report);
        let classes: Vec<Class> = decode(snapshot, CLASSES_KEY, &mut report);
        let teacher_assignments: Vec<TeacherAssignment> =
            decode(snapshot, TEACHER_ASSIGNMENTS_KEY, &mut report);
        let student_assignments: Vec<StudentAssignment> =
            decode(snapshot, STUDENT_ASSIGNMENTS_KEY, &mut report);
        let words: Vec<Word> = decode(snapshot, WORDS_KEY, &mut report);
        let total = users.len()
            + classes.len()
            + teacher_assignments.len()
            + student_assignments.len()
            + words.len();

        let mut names = HashSet::new();
        for mut user in users {
            let name = user.username.trim().to_string();
            if user.id.get() == 0 || store.user(user.id).is_some() || name.is_empty() {
                continue;
            }
            if !names.insert(name.clone()) {
                continue;
            }
            if !user.password_hash.is_well_formed() {
                match Credential::hash(user.password_hash.as_str()) {
                    Ok(c) => {
                        user.password_hash = c;
                        report.rehashed_credentials += 1;
                    }
                    Err(e) => {
                        log::warn!("dropping user {}: {e}", user.id);
                        continue;
                    }
                }
            }
            user.username = name;
            store.users.push(user);
        }

        for class in classes {
            if class.id.get() == 0 || store.class(class.id).is_some() || class.name.trim().is_empty() {
                continue;
            }
            store.classes.push(class);
        }

        for a in teacher_assignments {
            let manager = store.user(a.teacher_id).map(|u| u.role) == Some(Role::Manager);
            if !manager || store.class(a.class_id).is_none() || store.is_assigned(a.teacher_id, a.class_id) {
                continue;
            }
            store.teacher_assignments.push(a);
        }

        for a in student_assignments {
            let student = store.user(a.student_id).map(|u| u.role) == Some(Role::Student);
            if !student
                || !store.is_assigned(a.teacher_id, a.class_id)
                || store.student_assignment(a.student_id).is_some()
            {
                continue;
            }
            store.student_assignments.push(a);
        }

        for mut word in words {
            if word.id.get() == 0 || store.word(word.id).is_some() {
                continue;
            }
            if !store.is_assigned(word.mentor_id, word.class_id) {
                continue;
            }
            let Ok(text) = normalize_word(&word.word) else {
                continue;
            };
            word.word = text;
            word.category = normalize_category(word.category.as_deref());
            if check_difficulty(word.difficulty).is_err() {
                word.difficulty = None;
            }
            store.words.push(word);
        }

        let kept = store.users.len()
            + store.classes.len()
            + store.teacher_assignments.len()
            + store.student_assignments.len()
            + store.words.len();
        report.dropped_rows = total - kept;
        if report.dropped_rows > 0 {
            log::warn!(
                "dropped {} inconsistent snapshot row(s) while loading",
                report.dropped_rows
            );
        }
        (store, report)
    }
}

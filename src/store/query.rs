use super::ids::{ClassId, UserId};
use super::model::{Class, Role, TeacherAssignment, User, Word};
use super::Store;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub id: ClassId,
    pub name: String,
    pub description: String,
    pub teacher_ids: Vec<UserId>,
    pub teacher_names: Vec<String>,
    pub student_count: usize,
    pub word_count: usize,
}

/// One student row of the admin roster. Placement fields are empty for unplaced students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub student_id: UserId,
    pub username: String,
    pub class_id: Option<ClassId>,
    pub class_name: Option<String>,
    pub teacher_id: Option<UserId>,
    pub teacher_name: Option<String>,
}

/// Word count and mean difficulty of one category. Uncategorized words group under `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: Option<String>,
    pub word_count: usize,
    /// Mean over the words that have a difficulty.
    pub average_difficulty: Option<f64>,
}

/// Word search criteria; every unset field matches everything.
#[derive(Debug, Clone, Default)]
pub struct WordFilter {
    pub class_id: Option<ClassId>,
    pub mentor_id: Option<UserId>,
    /// Case-insensitive substring of the word.
    pub keyword: Option<String>,
    /// Case-insensitive category name.
    pub category: Option<String>,
    pub difficulty: Option<u8>,
}

impl WordFilter {
    pub fn matches(&self, w: &Word) -> bool {
        let keyword = self.keyword.as_deref().map(str::trim).unwrap_or("");
        let category = self.category.as_deref().map(str::trim).unwrap_or("");
        self.class_id.map_or(true, |c| w.class_id == c)
            && self.mentor_id.map_or(true, |m| w.mentor_id == m)
            && self.difficulty.map_or(true, |d| w.difficulty == Some(d))
            && (keyword.is_empty() || w.word.contains(&keyword.to_ascii_uppercase()))
            && (category.is_empty()
                || w
                    .category
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(category)))
    }
}

pub fn category_summaries<'a>(words: impl IntoIterator<Item = &'a Word>) -> Vec<CategorySummary> {
    let mut groups: BTreeMap<Option<&str>, Vec<&Word>> = BTreeMap::new();
    for w in words {
        groups.entry(w.category.as_deref()).or_default().push(w);
    }
    groups
        .into_iter()
        .map(|(category, words)| {
            let rated: Vec<f64> = words
                .iter()
                .filter_map(|w| w.difficulty)
                .map(f64::from)
                .collect();
            CategorySummary {
                category: category.map(str::to_string),
                word_count: words.len(),
                average_difficulty: (!rated.is_empty())
                    .then(|| rated.iter().sum::<f64>() / rated.len() as f64),
            }
        })
        .collect()
}

impl Store {
    pub fn users_with_role(&self, role: Option<Role>) -> Vec<&User> {
        self.users()
            .iter()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .collect()
    }

    pub fn teacher_assignments_for(&self, class_id: Option<ClassId>) -> Vec<&TeacherAssignment> {
        self.teacher_assignments()
            .iter()
            .filter(|a| class_id.map_or(true, |c| a.class_id == c))
            .collect()
    }

    pub fn teachers_of(&self, class_id: ClassId) -> Vec<&User> {
        self.teacher_assignments()
            .iter()
            .filter(|a| a.class_id == class_id)
            .filter_map(|a| self.user(a.teacher_id))
            .collect()
    }

    pub fn classes_of(&self, teacher_id: UserId) -> Vec<&Class> {
        self.classes()
            .iter()
            .filter(|c| self.is_assigned(teacher_id, c.id))
            .collect()
    }

    pub fn class_summaries(&self) -> Vec<ClassSummary> {
        self.classes()
            .iter()
            .map(|c| {
                let teachers = self.teachers_of(c.id);
                ClassSummary {
                    id: c.id,
                    name: c.name.clone(),
                    description: c.description.clone(),
                    teacher_ids: teachers.iter().map(|t| t.id).collect(),
                    teacher_names: teachers.iter().map(|t| t.username.clone()).collect(),
                    student_count: self
                        .student_assignments()
                        .iter()
                        .filter(|a| a.class_id == c.id)
                        .count(),
                    word_count: self.words().iter().filter(|w| w.class_id == c.id).count(),
                }
            })
            .collect()
    }

    /// Students with their placement. A filter excludes unplaced students.
    pub fn roster(&self, class_id: Option<ClassId>, teacher_id: Option<UserId>) -> Vec<RosterEntry> {
        self.users()
            .iter()
            .filter(|u| u.role == Role::Student)
            .filter_map(|u| {
                let placement = self.student_assignment(u.id);
                if let Some(c) = class_id {
                    if placement.map(|a| a.class_id) != Some(c) {
                        return None;
                    }
                }
                if let Some(t) = teacher_id {
                    if placement.map(|a| a.teacher_id) != Some(t) {
                        return None;
                    }
                }
                Some(RosterEntry {
                    student_id: u.id,
                    username: u.username.clone(),
                    class_id: placement.map(|a| a.class_id),
                    class_name: placement
                        .and_then(|a| self.class(a.class_id))
                        .map(|c| c.name.clone()),
                    teacher_id: placement.map(|a| a.teacher_id),
                    teacher_name: placement
                        .and_then(|a| self.user(a.teacher_id))
                        .map(|t| t.username.clone()),
                })
            })
            .collect()
    }

    pub fn words_filtered(&self, filter: &WordFilter) -> Vec<&Word> {
        self.words().iter().filter(|w| filter.matches(w)).collect()
    }
}

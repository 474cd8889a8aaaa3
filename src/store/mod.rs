//! In-memory relational store behind the hangman panels.
//!
//! Five collections: users, classes, teacher assignments, student assignments and
//! words. Every mutation validates first and only then touches a collection, so a
//! rejected call leaves the store exactly as it was. Foreign keys:
//!
//! - teacher assignment -> user (MANAGER), class
//! - student assignment -> user (USER), teacher assignment (teacherId, classId)
//! - word -> teacher assignment (mentorId, classId)

mod access;
mod error;
mod ids;
mod model;
mod query;
mod seed;
mod snapshot;

pub use access::{can_edit_word, can_manage_roster};
pub use error::StoreError;
pub use ids::{ClassId, UserId, WordId};
pub use model::{
    Class, ClassPatch, Role, SessionUser, StudentAssignment, TeacherAssignment, User, UserPatch,
    Word, WordDetails, WordPatch,
};
pub use query::{category_summaries, CategorySummary, ClassSummary, RosterEntry, WordFilter};
pub use snapshot::{Snapshot, SnapshotStore};

use crate::credential::Credential;
use chrono::Utc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Store {
    users: Vec<User>,
    classes: Vec<Class>,
    teacher_assignments: Vec<TeacherAssignment>,
    student_assignments: Vec<StudentAssignment>,
    words: Vec<Word>,
}

fn non_blank(value: &str, what: &str) -> Result<String, StoreError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(StoreError::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(v.to_string())
}

/// Uppercases a guessable word. Surrounding whitespace is dropped; the rest must be
/// ASCII letters, the only keys the game board offers.
pub fn normalize_word(raw: &str) -> Result<String, StoreError> {
    let w = raw.trim();
    if w.is_empty() {
        return Err(StoreError::InvalidInput("word must not be empty".into()));
    }
    if !w.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(StoreError::InvalidInput(format!(
            "word must use the letters A-Z only: {w}"
        )));
    }
    Ok(w.to_ascii_uppercase())
}

pub const MAX_DIFFICULTY: u8 = 5;

fn check_difficulty(difficulty: Option<u8>) -> Result<Option<u8>, StoreError> {
    match difficulty {
        Some(d) if !(1..=MAX_DIFFICULTY).contains(&d) => Err(StoreError::InvalidInput(format!(
            "difficulty must be between 1 and {MAX_DIFFICULTY}, got {d}"
        ))),
        d => Ok(d),
    }
}

/// Blank categories are stored as no category.
fn normalize_category(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|c| !c.is_empty()).map(str::to_string)
}

fn id_space_exhausted(entity: &str) -> StoreError {
    StoreError::InvalidInput(format!("{entity} id space exhausted"))
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    pub fn teacher_assignments(&self) -> &[TeacherAssignment] {
        &self.teacher_assignments
    }

    pub fn student_assignments(&self) -> &[StudentAssignment] {
        &self.student_assignments
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn class(&self, id: ClassId) -> Option<&Class> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn word(&self, id: WordId) -> Option<&Word> {
        self.words.iter().find(|w| w.id == id)
    }

    pub fn student_assignment(&self, student_id: UserId) -> Option<&StudentAssignment> {
        self.student_assignments
            .iter()
            .find(|a| a.student_id == student_id)
    }

    pub fn is_assigned(&self, teacher_id: UserId, class_id: ClassId) -> bool {
        self.teacher_assignments
            .iter()
            .any(|a| a.teacher_id == teacher_id && a.class_id == class_id)
    }

    fn require_user(&self, id: UserId) -> Result<&User, StoreError> {
        self.user(id).ok_or(StoreError::NotFound {
            entity: "user",
            id: id.get(),
        })
    }

    fn require_class(&self, id: ClassId) -> Result<&Class, StoreError> {
        self.class(id).ok_or(StoreError::NotFound {
            entity: "class",
            id: id.get(),
        })
    }

    fn require_role(&self, id: UserId, expected: Role) -> Result<&User, StoreError> {
        let user = self.require_user(id)?;
        if user.role != expected {
            return Err(StoreError::RoleMismatch {
                id: id.get(),
                expected: expected.as_str(),
                actual: user.role.as_str(),
            });
        }
        Ok(user)
    }

    fn require_mentor(&self, mentor_id: UserId, class_id: ClassId) -> Result<(), StoreError> {
        if !self.is_assigned(mentor_id, class_id) {
            return Err(StoreError::UnassignedMentor {
                mentor_id: mentor_id.get(),
                class_id: class_id.get(),
            });
        }
        Ok(())
    }

    fn ensure_username_free(&self, username: &str, except: Option<UserId>) -> Result<(), StoreError> {
        let taken = self
            .users
            .iter()
            .any(|u| u.username == username && Some(u.id) != except);
        if taken {
            return Err(StoreError::DuplicateKey(format!("username {username}")));
        }
        Ok(())
    }

    /// Which relation, if any, still points at `user_id`.
    fn user_referenced_by(&self, user_id: UserId) -> Option<&'static str> {
        if self.teacher_assignments.iter().any(|a| a.teacher_id == user_id) {
            return Some("teacher assignment");
        }
        if self
            .student_assignments
            .iter()
            .any(|a| a.student_id == user_id || a.teacher_id == user_id)
        {
            return Some("student assignment");
        }
        None
    }

    // ---- users ----

    pub fn create_user(
        &mut self,
        username: &str,
        role: Role,
        credential: Credential,
    ) -> Result<UserId, StoreError> {
        let username = non_blank(username, "username")?;
        self.ensure_username_free(&username, None)?;

        let id = UserId::next_after(self.users.iter().map(|u| u.id))
            .ok_or_else(|| id_space_exhausted("user"))?;
        self.users.push(User {
            id,
            username,
            role,
            password_hash: credential,
        });
        log::debug!("created user {id} ({role})");
        Ok(id)
    }

    pub fn update_user(&mut self, id: UserId, patch: UserPatch) -> Result<(), StoreError> {
        let current = self.require_user(id)?.clone();

        let username = match patch.username.as_deref() {
            Some(raw) => {
                let v = non_blank(raw, "username")?;
                self.ensure_username_free(&v, Some(id))?;
                v
            }
            None => current.username,
        };

        let role = patch.role.unwrap_or(current.role);
        if role != current.role {
            // Assignments pin the role they were made under.
            if self.teacher_assignments.iter().any(|a| a.teacher_id == id)
                || self.student_assignments.iter().any(|a| a.teacher_id == id)
            {
                return Err(StoreError::ReferentialIntegrityViolation {
                    entity: "user",
                    id: id.get(),
                    referenced_by: "teacher assignment",
                });
            }
            if self.student_assignments.iter().any(|a| a.student_id == id) {
                return Err(StoreError::ReferentialIntegrityViolation {
                    entity: "user",
                    id: id.get(),
                    referenced_by: "student assignment",
                });
            }
        }

        let Some(user) = self.users.iter_mut().find(|u| u.id == id) else {
            return Err(StoreError::NotFound {
                entity: "user",
                id: id.get(),
            });
        };
        user.username = username;
        user.role = role;
        if let Some(credential) = patch.password_hash {
            user.password_hash = credential;
        }
        log::debug!("updated user {id}");
        Ok(())
    }

    pub fn delete_user(&mut self, id: UserId) -> Result<User, StoreError> {
        self.require_user(id)?;
        if let Some(referenced_by) = self.user_referenced_by(id) {
            return Err(StoreError::ReferentialIntegrityViolation {
                entity: "user",
                id: id.get(),
                referenced_by,
            });
        }
        let pos = self
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or(StoreError::NotFound {
                entity: "user",
                id: id.get(),
            })?;
        log::debug!("deleted user {id}");
        Ok(self.users.remove(pos))
    }

    // ---- classes ----

    pub fn create_class(&mut self, name: &str, description: &str) -> Result<ClassId, StoreError> {
        let name = non_blank(name, "class name")?;
        let id = ClassId::next_after(self.classes.iter().map(|c| c.id))
            .ok_or_else(|| id_space_exhausted("class"))?;
        self.classes.push(Class {
            id,
            name,
            description: description.trim().to_string(),
        });
        log::debug!("created class {id}");
        Ok(id)
    }

    pub fn update_class(&mut self, id: ClassId, patch: ClassPatch) -> Result<(), StoreError> {
        self.require_class(id)?;
        let name = patch
            .name
            .as_deref()
            .map(|raw| non_blank(raw, "class name"))
            .transpose()?;

        let Some(class) = self.classes.iter_mut().find(|c| c.id == id) else {
            return Err(StoreError::NotFound {
                entity: "class",
                id: id.get(),
            });
        };
        if let Some(name) = name {
            class.name = name;
        }
        if let Some(description) = patch.description {
            class.description = description.trim().to_string();
        }
        Ok(())
    }

    pub fn delete_class(&mut self, id: ClassId) -> Result<Class, StoreError> {
        self.require_class(id)?;
        let referenced_by = if self.teacher_assignments.iter().any(|a| a.class_id == id) {
            Some("teacher assignment")
        } else if self.student_assignments.iter().any(|a| a.class_id == id) {
            Some("student assignment")
        } else if self.words.iter().any(|w| w.class_id == id) {
            Some("word")
        } else {
            None
        };
        if let Some(referenced_by) = referenced_by {
            return Err(StoreError::ReferentialIntegrityViolation {
                entity: "class",
                id: id.get(),
                referenced_by,
            });
        }
        let pos = self
            .classes
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreError::NotFound {
                entity: "class",
                id: id.get(),
            })?;
        log::debug!("deleted class {id}");
        Ok(self.classes.remove(pos))
    }

    // ---- teacher assignments ----

    pub fn assign_teacher(&mut self, teacher_id: UserId, class_id: ClassId) -> Result<(), StoreError> {
        self.require_role(teacher_id, Role::Manager)?;
        self.require_class(class_id)?;
        if self.is_assigned(teacher_id, class_id) {
            return Err(StoreError::DuplicateAssignment {
                teacher_id: teacher_id.get(),
                class_id: class_id.get(),
            });
        }
        self.teacher_assignments.push(TeacherAssignment {
            teacher_id,
            class_id,
        });
        log::debug!("assigned teacher {teacher_id} to class {class_id}");
        Ok(())
    }

    pub fn unassign_teacher(
        &mut self,
        teacher_id: UserId,
        class_id: ClassId,
    ) -> Result<(), StoreError> {
        let Some(pos) = self
            .teacher_assignments
            .iter()
            .position(|a| a.teacher_id == teacher_id && a.class_id == class_id)
        else {
            return Err(StoreError::NotFound {
                entity: "teacher assignment for teacher",
                id: teacher_id.get(),
            });
        };
        let referenced_by = if self
            .student_assignments
            .iter()
            .any(|a| a.teacher_id == teacher_id && a.class_id == class_id)
        {
            Some("student assignment")
        } else if self
            .words
            .iter()
            .any(|w| w.mentor_id == teacher_id && w.class_id == class_id)
        {
            Some("word")
        } else {
            None
        };
        if let Some(referenced_by) = referenced_by {
            return Err(StoreError::ReferentialIntegrityViolation {
                entity: "teacher assignment for teacher",
                id: teacher_id.get(),
                referenced_by,
            });
        }
        self.teacher_assignments.remove(pos);
        log::debug!("unassigned teacher {teacher_id} from class {class_id}");
        Ok(())
    }

    // ---- student assignments ----

    /// Puts a student in a class under a teacher, replacing any previous placement.
    pub fn assign_student(
        &mut self,
        student_id: UserId,
        class_id: ClassId,
        teacher_id: UserId,
    ) -> Result<(), StoreError> {
        self.require_role(student_id, Role::Student)?;
        self.require_mentor(teacher_id, class_id)?;

        let row = StudentAssignment {
            student_id,
            class_id,
            teacher_id,
        };
        match self
            .student_assignments
            .iter_mut()
            .find(|a| a.student_id == student_id)
        {
            Some(existing) => *existing = row,
            None => self.student_assignments.push(row),
        }
        log::debug!("assigned student {student_id} to class {class_id} / teacher {teacher_id}");
        Ok(())
    }

    pub fn unassign_student(&mut self, student_id: UserId) -> Result<StudentAssignment, StoreError> {
        let pos = self
            .student_assignments
            .iter()
            .position(|a| a.student_id == student_id)
            .ok_or(StoreError::NotFound {
                entity: "student assignment for student",
                id: student_id.get(),
            })?;
        Ok(self.student_assignments.remove(pos))
    }

    /// Creates a student account and places it in one step.
    pub fn register_student(
        &mut self,
        username: &str,
        credential: Credential,
        class_id: ClassId,
        teacher_id: UserId,
    ) -> Result<UserId, StoreError> {
        let username = non_blank(username, "username")?;
        self.ensure_username_free(&username, None)?;
        self.require_mentor(teacher_id, class_id)?;

        let id = self.create_user(&username, Role::Student, credential)?;
        self.student_assignments.push(StudentAssignment {
            student_id: id,
            class_id,
            teacher_id,
        });
        Ok(id)
    }

    /// Removes a student together with their placement.
    pub fn delete_student(&mut self, student_id: UserId) -> Result<User, StoreError> {
        self.require_role(student_id, Role::Student)?;
        self.student_assignments.retain(|a| a.student_id != student_id);
        self.delete_user(student_id)
    }

    // ---- words ----

    pub fn create_word(
        &mut self,
        word: &str,
        class_id: ClassId,
        mentor_id: UserId,
    ) -> Result<WordId, StoreError> {
        self.create_word_with(word, class_id, mentor_id, WordDetails::default())
    }

    pub fn create_word_with(
        &mut self,
        word: &str,
        class_id: ClassId,
        mentor_id: UserId,
        details: WordDetails,
    ) -> Result<WordId, StoreError> {
        self.require_mentor(mentor_id, class_id)?;
        let word = normalize_word(word)?;
        let difficulty = check_difficulty(details.difficulty)?;

        let id = WordId::next_after(self.words.iter().map(|w| w.id))
            .ok_or_else(|| id_space_exhausted("word"))?;
        let now = Utc::now();
        self.words.push(Word {
            id,
            word,
            class_id,
            mentor_id,
            category: normalize_category(details.category.as_deref()),
            difficulty,
            created_at: Some(now),
            updated_at: Some(now),
        });
        log::debug!("created word {id} in class {class_id}");
        Ok(id)
    }

    pub fn update_word(&mut self, id: WordId, patch: WordPatch) -> Result<(), StoreError> {
        let current = self.word(id).cloned().ok_or(StoreError::NotFound {
            entity: "word",
            id: id.get(),
        })?;
        let class_id = patch.class_id.unwrap_or(current.class_id);
        let mentor_id = patch.mentor_id.unwrap_or(current.mentor_id);
        self.require_mentor(mentor_id, class_id)?;
        let text = match patch.word.as_deref() {
            Some(raw) => normalize_word(raw)?,
            None => current.word,
        };
        let difficulty = match patch.difficulty {
            Some(d) => check_difficulty(Some(d))?,
            None => current.difficulty,
        };
        let category = match patch.category.as_deref() {
            Some(raw) => normalize_category(Some(raw)),
            None => current.category,
        };

        let Some(word) = self.words.iter_mut().find(|w| w.id == id) else {
            return Err(StoreError::NotFound {
                entity: "word",
                id: id.get(),
            });
        };
        word.word = text;
        word.class_id = class_id;
        word.mentor_id = mentor_id;
        word.category = category;
        word.difficulty = difficulty;
        word.updated_at = Some(Utc::now());
        Ok(())
    }

    pub fn delete_word(&mut self, id: WordId) -> Result<Word, StoreError> {
        let pos = self
            .words
            .iter()
            .position(|w| w.id == id)
            .ok_or(StoreError::NotFound {
                entity: "word",
                id: id.get(),
            })?;
        Ok(self.words.remove(pos))
    }
}

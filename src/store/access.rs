use super::ids::UserId;
use super::model::{Role, SessionUser, Word};
use super::Store;

/// Users, classes, assignments and backups are admin-only.
pub fn can_manage_roster(role: Role) -> bool {
    match role {
        Role::Admin => true,
        Role::Manager | Role::Student => false,
    }
}

/// Managers may only write words attributed to themselves.
pub fn can_edit_word(actor: &SessionUser, mentor_id: UserId) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Manager => actor.id == mentor_id,
        Role::Student => false,
    }
}

impl Store {
    /// Words the given session may read, in insertion order.
    ///
    /// A manager sees only words they mentor; a student sees only words of their
    /// own (class, teacher) placement, and nothing when unplaced.
    pub fn words_visible_to(&self, user: &SessionUser) -> Vec<&Word> {
        match user.role {
            Role::Admin => self.words().iter().collect(),
            Role::Manager => self
                .words()
                .iter()
                .filter(|w| w.mentor_id == user.id)
                .collect(),
            Role::Student => match self.student_assignment(user.id) {
                Some(a) => self
                    .words()
                    .iter()
                    .filter(|w| w.class_id == a.class_id && w.mentor_id == a.teacher_id)
                    .collect(),
                None => Vec::new(),
            },
        }
    }
}

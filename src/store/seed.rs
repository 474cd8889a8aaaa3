use super::model::Role;
use super::Store;
use crate::credential::Credential;

const CLASSES: [(&str, &str); 3] = [
    ("Class A", "Advanced Level"),
    ("Class B", "Intermediate Level"),
    ("Class C", "Beginner Level"),
];

const USERS: [(&str, Role); 4] = [
    ("teacher1", Role::Manager),
    ("teacher2", Role::Manager),
    ("student1", Role::Student),
    ("admin", Role::Admin),
];

impl Store {
    /// The bootstrap dataset a fresh workspace starts from. Every seeded account gets
    /// `bootstrap_password`.
    pub fn seeded(bootstrap_password: &str) -> anyhow::Result<Store> {
        let mut s = Store::new();

        let mut class_ids = Vec::new();
        for (name, description) in CLASSES {
            class_ids.push(s.create_class(name, description)?);
        }
        let mut user_ids = Vec::new();
        for (username, role) in USERS {
            user_ids.push(s.create_user(username, role, Credential::hash(bootstrap_password)?)?);
        }

        let (teacher1, teacher2, student1) = (user_ids[0], user_ids[1], user_ids[2]);
        let (class_a, class_b) = (class_ids[0], class_ids[1]);
        s.assign_teacher(teacher1, class_a)?;
        s.assign_teacher(teacher2, class_a)?;
        s.assign_teacher(teacher1, class_b)?;

        s.create_word("ADVENTURE", class_a, teacher1)?;
        s.create_word("CHALLENGE", class_a, teacher2)?;

        s.assign_student(student1, class_a, teacher1)?;
        Ok(s)
    }
}

pub mod backup_exchange;
pub mod classes;
pub mod core;
pub mod students;
pub mod teachers;
pub mod users;
pub mod words;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} already exists")]
    DuplicateKey(String),
    #[error("teacher {teacher_id} is already assigned to class {class_id}")]
    DuplicateAssignment { teacher_id: u32, class_id: u32 },
    #[error("{entity} {id} is still referenced by {referenced_by}")]
    ReferentialIntegrityViolation {
        entity: &'static str,
        id: u32,
        referenced_by: &'static str,
    },
    #[error("teacher {mentor_id} is not assigned to class {class_id}")]
    UnassignedMentor { mentor_id: u32, class_id: u32 },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u32 },
    #[error("user {id} has role {actual}, expected {expected}")]
    RoleMismatch {
        id: u32,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl StoreError {
    /// Stable machine-readable code used on the IPC surface.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::DuplicateKey(_) => "duplicate_key",
            StoreError::DuplicateAssignment { .. } => "duplicate_assignment",
            StoreError::ReferentialIntegrityViolation { .. } => "referential_integrity",
            StoreError::UnassignedMentor { .. } => "unassigned_mentor",
            StoreError::NotFound { .. } => "not_found",
            StoreError::RoleMismatch { .. } => "role_mismatch",
            StoreError::InvalidInput(_) => "bad_params",
        }
    }
}

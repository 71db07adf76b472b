use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStats {
    pub user_count: usize,
    pub doctor_count: usize,
    pub appointment_count: usize,
    pub review_count: usize,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AdminError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

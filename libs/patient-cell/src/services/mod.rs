pub mod consultation;
pub mod history;
pub mod stats;

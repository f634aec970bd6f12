pub mod admin_repo;
pub use admin_repo::{AdminRepository, AdminStore};
pub mod student_repo;
pub use student_repo::{StudentRegistry, StudentRepository};
pub mod override_repo;
pub use override_repo::{FileOverrideStore, SeatOverrideStore};
pub mod memory;
pub use memory::{InMemoryAdminStore, InMemoryOverrideStore, InMemoryRegistry};

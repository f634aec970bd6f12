pub mod admin_service;
pub use admin_service::{AdminService, AdminVerifier};
pub mod seat_lifecycle;
pub mod seat_service;
pub use seat_service::{HallLocks, SeatService};
pub mod student_service;
pub use student_service::StudentService;

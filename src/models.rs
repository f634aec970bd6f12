pub mod admin;
pub mod hall;
pub mod seat;
pub mod student;

// src/lib.rs

//! Backend de matrículas de um salão de estudos: ciclo de vida dos assentos,
//! disponibilidade por salão e varredura de matrículas expiradas.

pub mod background;
pub mod common;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

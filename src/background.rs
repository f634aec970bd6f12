// src/background.rs

//! Tarefas de longa duração, disparadas com `tokio::spawn`.
//! Todas recebem um `CancellationToken` para desligar com calma.

pub mod expiry_sweep;

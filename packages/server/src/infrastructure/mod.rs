//! Infrastructure layer: in-memory repositories, wire DTOs and the metrics recorder.

pub mod dto;
pub mod metrics;
pub mod repository;

//! Nursery use-case services.
//!
//! # Responsibility
//! - Run each use case inside one unit-of-work scope with explicit commit.
//! - Translate missing references into named domain failures.
//!
//! # See also
//! - `crate::uow` for commit/rollback guarantees.

pub mod nursery_service;

pub use nursery_service::{NurseryService, ServiceError, ServiceResult, MAX_STOCK_QUANTITY};

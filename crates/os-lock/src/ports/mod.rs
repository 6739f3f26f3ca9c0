//! # Ports Layer
//!
//! ## Hexagonal Architecture
//!
//! - `inbound.rs` - Driving port (the lock API offered to callers)
//! - `outbound.rs` - Driven port (the native lock primitive the service needs)

pub mod inbound;
pub mod outbound;

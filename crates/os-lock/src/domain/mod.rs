//! # Domain Module
//!
//! Core types for lock requests: values, argument resolution, errors and
//! configuration. Nothing here touches the OS.

pub mod config;
pub mod errors;
pub mod request;
pub mod value_objects;

pub use config::*;
pub use errors::*;
pub use request::*;
pub use value_objects::*;

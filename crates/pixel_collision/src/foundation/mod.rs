//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types (vectors, world and pixel rectangles)
//! - Logging utilities

pub mod math;
pub mod logging;

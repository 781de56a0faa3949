/// Core Module for oralab
///
/// This module contains the fundamental components that form the backbone of
/// the application: the database gateway abstraction, the output drain
/// protocol, the script/query executors and the shared error type.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{OralabError, Result};

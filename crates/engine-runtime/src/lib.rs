pub mod actor;
pub mod error;
pub mod mirror;
pub mod service;

#[cfg(test)]
mod tests;

pub use mirror::CursorMirror;
pub use service::{BookService, CursorHandle};

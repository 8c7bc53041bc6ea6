//! Chat session domain.
//!
//! - [`entities::SessionMessage`]: a user or assistant message, possibly still streaming
//! - [`entities::Sender`]: author of a message

pub mod entities;

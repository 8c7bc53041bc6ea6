//! Terminal rendering of assistant replies

pub mod console;

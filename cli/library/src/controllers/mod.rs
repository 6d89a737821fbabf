//! State machines behind the `library` commands.
//!
//! Each controller owns a plain state value and a borrowed catalog client.
//! The state transitions are pure functions and tested without a client,
//! the controllers only sequence them around catalog calls.

pub mod detail;
pub mod form;
pub mod list;

//! Rendering helpers behind the `blogdesk` binary.

pub mod utils;

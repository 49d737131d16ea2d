//! Domain types for pollwatch.
//!
//! - [`kind`] - File event categories
//! - [`state`] - Watched root lifecycle states
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use pw_core::{FileEventKind, RootState};
//! ```

mod kind;
mod state;

pub use kind::{FileEventKind, ParseKindError};
pub use state::RootState;

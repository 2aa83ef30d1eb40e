//! System wiring, startup, and shutdown logic.

pub mod form_system;
pub mod tracing;

pub use self::form_system::*;
pub use self::tracing::*;

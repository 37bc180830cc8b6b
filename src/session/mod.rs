//! Session pairing subsystem.
//!
//! A viewer creates a session and shows its code; a controller joins with
//! the code. Sessions live only in process memory and close when the viewer
//! leaves or an hour after creation.

pub mod code;
pub mod registry;

pub use code::{SessionCode, CODE_LENGTH};
pub use registry::{Departure, Joined, Role, Session, SessionError, SessionRegistry, SessionState};

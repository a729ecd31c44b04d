/*!
 * Control Module
 * The published read/write entries and the socket that serves them
 */

pub mod parse;
pub mod server;
pub mod surface;
pub mod types;

pub use parse::parse_u64;
pub use server::{handle_request, respond, serve, Reply};
pub use surface::ControlSurface;
pub use types::{Access, ControlError, ControlResult, Entry};

//! Shared data models for AMS backends

mod action;
mod ams_type;
mod capability;
mod device;
mod path;
mod slot;
mod system;

pub use action::*;
pub use ams_type::*;
pub use capability::*;
pub use device::*;
pub use path::*;
pub use slot::*;
pub use system::*;

//!
//!
//!
//!
mod loader;
mod pack;

pub use loader::{Driver, LoadReport, MemberFileName};
pub use pack::{PackError, load_pack, pack_program};

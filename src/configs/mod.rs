pub mod audio;
pub mod base;
pub mod logging;
pub mod server;

pub use audio::*;
pub use base::*;
pub use logging::*;
pub use server::*;

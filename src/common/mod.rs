pub mod banner;
pub mod errors;
pub mod logger;
pub mod types;

pub use errors::*;
pub use logger::*;
pub use types::*;

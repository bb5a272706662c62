pub mod audio;
pub mod common;
pub mod configs;
pub mod scheduler;
pub mod server;
pub mod sounds;
pub mod transport;
pub mod voice;

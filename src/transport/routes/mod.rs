pub mod info;
pub mod playback;
pub mod voice_states;

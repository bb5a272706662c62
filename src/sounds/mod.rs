//! The sound library seen from the audio core: "which clip greets this
//! member in this guild?"

pub mod library;
pub mod tags;

pub use library::SoundLibrary;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::common::{Guild, LookupError, Member};

/// A ready-to-play clip and its selection weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundAsset {
    pub path: PathBuf,
    pub weight: u32,
}

#[async_trait]
pub trait AssetLookup: Send + Sync {
    /// Picks one of the member's clips for `guild`, or `None` if they have
    /// nothing registered there.
    async fn lookup(&self, member: &Member, guild: &Guild) -> Result<Option<SoundAsset>, LookupError>;
}

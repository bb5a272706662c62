use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::{Rng, seq::SliceRandom};
use tracing::{debug, warn};

use super::{AssetLookup, SoundAsset, tags::read_weight};
use crate::{
    common::{Guild, LookupError, Member},
    configs::SoundsConfig,
};

/// Clips stored as `<root>/<member name>/<guild name>/<clip>`, each weighted
/// by its `weight` metadata tag.
#[derive(Debug, Clone)]
pub struct SoundLibrary {
    root: PathBuf,
    default_weight: u32,
}

impl SoundLibrary {
    pub fn new(config: &SoundsConfig) -> Self {
        Self {
            root: config.root.clone(),
            default_weight: config.default_weight,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding `member`'s clips for `guild`, if the names are
    /// usable as single path components.
    pub fn clip_dir(&self, member: &Member, guild: &Guild) -> Option<PathBuf> {
        let usable = |name: &str| {
            !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
        };
        if !usable(&member.name) || !usable(&guild.name) {
            return None;
        }
        Some(self.root.join(&member.name).join(&guild.name))
    }

    /// Every clip in `dir` with its effective weight. Files that do not
    /// probe as audio are skipped, unless nothing in `dir` probes at all.
    pub fn candidates(&self, dir: &Path) -> Result<Vec<SoundAsset>, LookupError> {
        let mut out = Vec::new();
        let mut last_failure = None;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let weight = match read_weight(&path) {
                Ok(Some(weight)) => weight,
                Ok(None) => self.default_weight,
                Err(e) => {
                    warn!("Ignoring {}: {}", path.display(), e);
                    last_failure = Some(e);
                    continue;
                }
            };
            out.push(SoundAsset { path, weight });
        }
        if out.is_empty() {
            if let Some(reason) = last_failure {
                return Err(LookupError::Metadata {
                    path: dir.to_path_buf(),
                    reason,
                });
            }
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }
}

/// Picks one asset with probability proportional to its weight. Zero-weight
/// assets are never chosen.
pub fn pick_weighted<'a, R: Rng + ?Sized>(
    candidates: &'a [SoundAsset],
    rng: &mut R,
) -> Option<&'a SoundAsset> {
    candidates.choose_weighted(rng, |c| c.weight).ok()
}

#[async_trait]
impl AssetLookup for SoundLibrary {
    async fn lookup(
        &self,
        member: &Member,
        guild: &Guild,
    ) -> Result<Option<SoundAsset>, LookupError> {
        let Some(dir) = self.clip_dir(member, guild) else {
            warn!("Unusable sound directory name for {} in {}", member.name, guild.name);
            return Ok(None);
        };

        let library = self.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<SoundAsset>, LookupError> {
            if !dir.is_dir() {
                debug!("No sounds at {}", dir.display());
                return Ok(None);
            }
            let candidates = library.candidates(&dir)?;
            Ok(pick_weighted(&candidates, &mut rand::thread_rng()).cloned())
        })
        .await
        .map_err(|e| LookupError::Join(e.to_string()))?
    }
}

use serde::Serialize;
use tracing::info;

macro_rules! env_or {
    ($key:literal, $default:literal) => {
        option_env!($key).unwrap_or($default)
    };
}

/// Build metadata baked in by `build.rs`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub commit_short: &'static str,
    /// Unix milliseconds.
    pub build_time: &'static str,
    pub dirty: bool,
    pub profile: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: env_or!("GIT_COMMIT", "unknown"),
            commit_short: env_or!("GIT_COMMIT_SHORT", "unknown"),
            build_time: env_or!("BUILD_TIME", "unknown"),
            dirty: matches!(option_env!("GIT_DIRTY"), Some("true")),
            profile: if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            },
        }
    }
}

pub fn log_banner(build: &BuildInfo) {
    let commit = if build.dirty {
        format!("{} (dirty)", build.commit_short)
    } else {
        build.commit_short.to_string()
    };
    info!("chimebot {} ({}, {})", build.version, commit, build.profile);
    info!("Built at {}", build.build_time);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_comes_from_the_package() {
        let build = BuildInfo::default();
        assert_eq!(build.version, env!("CARGO_PKG_VERSION"));
        let json = serde_json::to_value(&build).unwrap();
        assert!(json.get("commitShort").is_some());
    }
}

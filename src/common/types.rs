use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::Mutex;

/// A thread-safe, mutually exclusive shared component.
pub type Shared<T> = Arc<Mutex<T>>;

/// A generic boxed error type.
pub type AnyError = Box<dyn std::error::Error + Send + Sync>;

/// A convenient Result alias returning `AnyError`.
pub type AnyResult<T> = std::result::Result<T, AnyError>;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl From<u64> for $name {
            fn from(u: u64) -> Self {
                Self(u)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake_id!(
    /// Destination group (a server). One voice connection per guild.
    GuildId
);
snowflake_id!(
    /// Voice channel inside a guild.
    ChannelId
);
snowflake_id!(UserId);

/// The member that triggered an event. The sound library is keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Member {
    pub id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Guild {
    pub id: GuildId,
    pub name: String,
}

static NEXT_CLIP_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Identifies one playing instance of a clip. The same asset added twice gets
/// two handles and plays twice, overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipHandle(u64);

impl ClipHandle {
    pub fn next() -> Self {
        Self(NEXT_CLIP_HANDLE.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ClipHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "clip#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_handles_are_unique() {
        let a = ClipHandle::next();
        let b = ClipHandle::next();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&GuildId(42)).unwrap();
        assert_eq!(json, "42");
        let back: ChannelId = serde_json::from_str("7").unwrap();
        assert_eq!(back, ChannelId(7));
    }
}

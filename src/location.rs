//! Key -> rclone location mapping.
//!
//! A location is the rclone directory an object lives in; the object itself
//! is `<location><key>`. Sharding hashes always come from git-annex, never
//! computed here.

use crate::annex::{Annex, HashKind};
use crate::config::{Layout, RemoteConfig};
use crate::error::Result;

/// Resolve the rclone directory holding `key` under `config`.
pub async fn resolve(annex: &mut dyn Annex, key: &str, config: &RemoteConfig) -> Result<String> {
    let hash = match config.layout {
        Layout::Lower | Layout::Directory => annex.dirhash(key, HashKind::Lower).await?,
        Layout::Mixed => annex.dirhash(key, HashKind::Mixed).await?,
        Layout::Frankencase => annex.dirhash(key, HashKind::Mixed).await?.to_lowercase(),
        Layout::NoDir => String::new(),
    };
    Ok(location_for(config, key, &hash))
}

/// Build a location from an already-fetched hash.
pub fn location_for(config: &RemoteConfig, key: &str, hash: &str) -> String {
    match config.layout {
        Layout::Directory => format!("{}/{}{}/", config.root(), hash, key),
        Layout::NoDir => format!("{}/", config.root()),
        Layout::Lower | Layout::Mixed | Layout::Frankencase => {
            format!("{}/{}", config.root(), hash)
        }
    }
}

/// Full rclone path of the object for `key` inside `location`.
pub fn object_path(location: &str, key: &str) -> String {
    format!("{}{}", location, key)
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Asset references produced by generation backends and consumed by the compositor.
//!
//! An asset is either something a backend materialized (a local file or a remote
//! URL) or a synthetic stand-in the compositor can render on its own. Synthetic
//! assets are how fallbacks work: a placeholder image, a stretch of silence or a
//! still-hold of an earlier image never needs a backend round trip.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Colour used for placeholder cards when no better image exists.
pub const PLACEHOLDER_COLOR: &str = "0x1f2933";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetRef {
    File { path: PathBuf },
    Remote { url: String },
    Synthetic { asset: SyntheticAsset },
}

/// Media the compositor can synthesize without any input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyntheticAsset {
    /// Solid colour frame, used as a placeholder image.
    ColorCard { color: String },
    /// Silent audio of the given length.
    Silence { duration_secs: f64 },
    /// A still image held on screen for the given length.
    StillHold {
        image: Box<AssetRef>,
        duration_secs: f64,
    },
}

impl AssetRef {
    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        AssetRef::File { path: path.into() }
    }

    pub fn remote<S: Into<String>>(url: S) -> Self {
        AssetRef::Remote { url: url.into() }
    }

    pub fn color_card<S: Into<String>>(color: S) -> Self {
        AssetRef::Synthetic {
            asset: SyntheticAsset::ColorCard {
                color: color.into(),
            },
        }
    }

    pub fn placeholder_image() -> Self {
        Self::color_card(PLACEHOLDER_COLOR)
    }

    pub fn silence(duration_secs: f64) -> Self {
        AssetRef::Synthetic {
            asset: SyntheticAsset::Silence { duration_secs },
        }
    }

    pub fn still_hold(image: AssetRef, duration_secs: f64) -> Self {
        AssetRef::Synthetic {
            asset: SyntheticAsset::StillHold {
                image: Box::new(image),
                duration_secs,
            },
        }
    }

    /// True when the compositor has to synthesize this asset itself.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, AssetRef::Synthetic { .. })
    }

    /// Location an external tool can open directly, if there is one.
    pub fn locator(&self) -> Option<String> {
        match self {
            AssetRef::File { path } => Some(path.to_string_lossy().into_owned()),
            AssetRef::Remote { url } => Some(url.clone()),
            AssetRef::Synthetic { .. } => None,
        }
    }

    /// Path on the local filesystem, for file-backed assets only.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            AssetRef::File { path } => Some(path.as_path()),
            _ => None,
        }
    }
}

impl Display for AssetRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetRef::File { path } => write!(f, "{}", path.display()),
            AssetRef::Remote { url } => write!(f, "{}", url),
            AssetRef::Synthetic { asset } => match asset {
                SyntheticAsset::ColorCard { color } => write!(f, "synthetic:color_card({})", color),
                SyntheticAsset::Silence { duration_secs } => {
                    write!(f, "synthetic:silence({:.2}s)", duration_secs)
                }
                SyntheticAsset::StillHold {
                    image,
                    duration_secs,
                } => write!(f, "synthetic:still_hold({}, {:.2}s)", image, duration_secs),
            },
        }
    }
}

/// One stage's output for one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSlot {
    pub asset: AssetRef,
    pub is_fallback: bool,
}

impl AssetSlot {
    pub fn generated(asset: AssetRef) -> Self {
        Self {
            asset,
            is_fallback: false,
        }
    }

    pub fn fallback(asset: AssetRef) -> Self {
        Self {
            asset,
            is_fallback: true,
        }
    }
}

// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Loaded feature data.

use std::fmt;
use std::path::Path;

use log::info;
use sha2::{Digest, Sha256};

use crate::geometry::{self, FeatureCollection};
use crate::palette::{ColorPolicy, Palette};
use crate::Error;

/// Digest of the bytes a dataset was loaded from.
///
/// The first eight bytes of their SHA-256 hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataVersion(u64);

impl DataVersion {
    /// Version of the given source bytes.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        Self(u64::from_be_bytes(prefix))
    }

    /// Wrap an already computed digest prefix.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for DataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Features, their colors and the version they were loaded as.
///
/// Immutable after construction; share it between threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: FeatureCollection,
    palette: Palette,
    version: DataVersion,
}

impl Dataset {
    /// Read and parse a FeatureCollection file.
    pub fn load(path: &Path, policy: ColorPolicy) -> Result<Self, Error> {
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_bytes(&bytes, policy)?;
        info!(
            "loaded {} feature(s) from {} (version {})",
            dataset.features.len(),
            path.display(),
            dataset.version
        );
        Ok(dataset)
    }

    /// Parse FeatureCollection bytes and build a palette for them.
    pub fn from_bytes(bytes: &[u8], policy: ColorPolicy) -> Result<Self, Error> {
        let features = geometry::extract(bytes)?;
        let palette = Palette::for_policy(features.len(), policy);
        Ok(Self {
            features,
            palette,
            version: DataVersion::of(bytes),
        })
    }

    /// Assemble a dataset from parts.
    ///
    /// # Panics
    ///
    /// Panics if the palette does not hold exactly one color per feature.
    #[must_use]
    pub fn with_palette(features: FeatureCollection, palette: Palette, version: DataVersion) -> Self {
        assert_eq!(
            features.len(),
            palette.len(),
            "palette must hold one color per feature"
        );
        Self {
            features,
            palette,
            version,
        }
    }

    /// The extracted features, in document order.
    #[must_use]
    pub fn features(&self) -> &FeatureCollection {
        &self.features
    }

    /// One color per feature.
    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Digest of the bytes this dataset was parsed from.
    #[must_use]
    pub fn version(&self) -> DataVersion {
        self.version
    }
}

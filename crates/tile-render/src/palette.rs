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

//! Per-feature fill colors.
//!
//! A [`Palette`] holds exactly one [`Rgb`] per feature of the collection it
//! was built for. It is computed once per data load and shared read-only by
//! every render of that data.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// RGB color with float channels in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Rgb {
    /// Color from channels in `[0, 1)`.
    #[must_use]
    pub const fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }

    /// Opaque 8-bit RGBA, truncating each channel.
    #[must_use]
    pub fn to_rgba8(self) -> [u8; 4] {
        [
            channel_to_u8(self.red),
            channel_to_u8(self.green),
            channel_to_u8(self.blue),
            u8::MAX,
        ]
    }

    fn random(rng: &mut impl Rng) -> Self {
        Self {
            red: rng.random(),
            green: rng.random(),
            blue: rng.random(),
        }
    }
}

fn channel_to_u8(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// How a palette is generated when a dataset is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorPolicy {
    /// Fresh random colors on every load.
    #[default]
    Random,
    /// Colors drawn from a seeded generator, identical across runs.
    Seeded(u64),
}

/// One color per feature, indexed by feature position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Draw `count` colors from the thread-local generator.
    #[must_use]
    pub fn random(count: usize) -> Self {
        Self::generate(count, &mut rand::rng())
    }

    /// Draw `count` colors from a generator seeded with `seed`.
    #[must_use]
    pub fn seeded(count: usize, seed: u64) -> Self {
        Self::generate(count, &mut StdRng::seed_from_u64(seed))
    }

    /// Build a palette the way `policy` asks for.
    #[must_use]
    pub fn for_policy(count: usize, policy: ColorPolicy) -> Self {
        match policy {
            ColorPolicy::Random => Self::random(count),
            ColorPolicy::Seeded(seed) => Self::seeded(count, seed),
        }
    }

    /// Use an explicit list of colors, one per feature.
    #[must_use]
    pub fn from_colors(colors: Vec<Rgb>) -> Self {
        Self { colors }
    }

    fn generate(count: usize, rng: &mut impl Rng) -> Self {
        Self {
            colors: (0..count).map(|_| Rgb::random(rng)).collect(),
        }
    }

    /// Color of the feature at `index`.
    ///
    /// Panics when `index` is out of range: the palette is always built from
    /// the same collection that is being rendered.
    #[must_use]
    pub fn color(&self, index: usize) -> Rgb {
        self.colors[index]
    }

    /// Number of colors, equal to the feature count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[must_use]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }
}

//! The handwritten-digit corpus.
//!
//! Each split is two files in one directory:
//!
//! - pictures: 784 unsigned bytes (28x28, row-major) per image
//! - answers: two 4-bit labels per byte, the even-indexed image in the high
//!   nibble and the odd-indexed image in the low nibble

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::data::{Examples, one_hot};
use crate::{Error, Result, Vector};

pub const IMAGE_WIDTH: usize = 28;
pub const IMAGE_HEIGHT: usize = 28;
/// Pixels per image, the network's input layer size.
pub const PIXELS_PER_IMAGE: usize = IMAGE_WIDTH * IMAGE_HEIGHT;
/// Number of digit classes, the network's output layer size.
pub const NUM_CLASSES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub fn pictures_file(self) -> &'static str {
        match self {
            Split::Train => "trainingPictures.sb",
            Split::Test => "testingPictures.sb",
        }
    }

    pub fn answers_file(self) -> &'static str {
        match self {
            Split::Train => "trainingAnswers.sb",
            Split::Test => "testingAnswers.sb",
        }
    }

    /// Number of images in the full corpus split.
    pub fn image_count(self) -> usize {
        match self {
            Split::Train => 60_000,
            Split::Test => 10_000,
        }
    }
}

/// Images and labels of one split, held in memory.
#[derive(Debug, Clone)]
pub struct DigitSet {
    /// `len * PIXELS_PER_IMAGE` bytes.
    pixels: Vec<u8>,
    labels: Vec<u8>,
}

impl DigitSet {
    /// Load a full split from `dir`.
    pub fn load<P: AsRef<Path>>(dir: P, split: Split) -> Result<Self> {
        Self::load_first(dir, split, split.image_count())
    }

    /// Load the first `len` images of a split from `dir`.
    pub fn load_first<P: AsRef<Path>>(dir: P, split: Split, len: usize) -> Result<Self> {
        let dir = dir.as_ref();
        let pictures_path = dir.join(split.pictures_file());
        let answers_path = dir.join(split.answers_file());

        let mut pixels = fs::read(&pictures_path).map_err(|e| {
            Error::InvalidData(format!("failed to read {}: {e}", pictures_path.display()))
        })?;
        let packed = fs::read(&answers_path).map_err(|e| {
            Error::InvalidData(format!("failed to read {}: {e}", answers_path.display()))
        })?;

        let needed = len.checked_mul(PIXELS_PER_IMAGE).ok_or_else(|| {
            Error::InvalidData(format!("{len} images of {PIXELS_PER_IMAGE} bytes overflow usize"))
        })?;
        if pixels.len() < needed {
            return Err(Error::InvalidData(format!(
                "{} holds {} bytes, expected {} images of {PIXELS_PER_IMAGE} bytes",
                pictures_path.display(),
                pixels.len(),
                len
            )));
        }
        pixels.truncate(needed);
        let labels = unpack_labels(&packed, len)?;

        debug!(?split, len, dir = %dir.display(), "loaded digit set");
        Self::from_parts(pixels, labels)
    }

    /// Build from raw pixel bytes and unpacked labels (one byte per image).
    pub fn from_parts(pixels: Vec<u8>, labels: Vec<u8>) -> Result<Self> {
        if pixels.len() != labels.len() * PIXELS_PER_IMAGE {
            return Err(Error::InvalidData(format!(
                "{} pixel bytes do not match {} labels of {PIXELS_PER_IMAGE} pixels",
                pixels.len(),
                labels.len()
            )));
        }
        if let Some((i, &l)) = labels
            .iter()
            .enumerate()
            .find(|&(_, &l)| l as usize >= NUM_CLASSES)
        {
            return Err(Error::InvalidData(format!("label {i} is {l}, expected 0-9")));
        }
        Ok(Self { pixels, labels })
    }

    /// Raw pixel bytes of image `idx`.
    ///
    /// Panics if `idx >= len`.
    pub fn pixels(&self, idx: usize) -> &[u8] {
        let start = idx * PIXELS_PER_IMAGE;
        &self.pixels[start..start + PIXELS_PER_IMAGE]
    }

    /// Panics if `idx >= len`.
    pub fn label(&self, idx: usize) -> usize {
        self.labels[idx] as usize
    }
}

impl Examples for DigitSet {
    #[inline]
    fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    fn input_dim(&self) -> usize {
        PIXELS_PER_IMAGE
    }

    #[inline]
    fn target_dim(&self) -> usize {
        NUM_CLASSES
    }

    fn input(&self, idx: usize) -> Vector {
        Vector::from_vec(self.pixels(idx).iter().map(|&p| f64::from(p)).collect())
    }

    fn desired_output(&self, idx: usize) -> Vector {
        one_hot(self.label(idx), NUM_CLASSES)
    }
}

/// Unpack `count` nibble-packed labels.
pub fn unpack_labels(packed: &[u8], count: usize) -> Result<Vec<u8>> {
    let needed = count.div_ceil(2);
    if packed.len() < needed {
        return Err(Error::InvalidData(format!(
            "answers hold {} bytes, need {needed} for {count} labels",
            packed.len()
        )));
    }
    Ok((0..count)
        .map(|i| {
            let byte = packed[i / 2];
            if i % 2 == 0 { byte >> 4 } else { byte & 0x0F }
        })
        .collect())
}

/// Inverse of [`unpack_labels`]; an odd trailing label leaves the low nibble zero.
pub fn pack_labels(labels: &[u8]) -> Vec<u8> {
    labels
        .chunks(2)
        .map(|pair| {
            let hi = pair[0] & 0x0F;
            let lo = pair.get(1).map_or(0, |l| l & 0x0F);
            (hi << 4) | lo
        })
        .collect()
}

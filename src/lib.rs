//! A from-scratch feedforward neural network for handwritten digits.
//!
//! `digit-mlp` implements a dense multi-layer perceptron with hand-written
//! backpropagation on top of its own [`Vector`] and [`Matrix`] types.
//!
//! # Layers of API
//!
//! - Linear algebra: [`Vector`], [`Matrix`]. Shape mismatches return
//!   [`Error::ShapeMismatch`].
//! - The network: [`Network::forwardprop`] records every layer's raw and
//!   activated values in a [`NetworkActivation`], [`Network::backprop`] turns
//!   one record into a [`GradientUpdate`], and [`Network::update_network`]
//!   applies the mean of a batch of updates.
//! - Training driver: [`Network::train`], [`Network::evaluate`] and
//!   [`Network::predict`] over any [`Examples`] source.
//! - Persistence: the binary `.sb` format and [`SaveDir`] in [`persist`],
//!   plus JSON with the `serde` feature.
//!
//! # Conventions
//!
//! - Scalars are `f64`.
//! - Layer 0 is the input layer. It has no weights; its activation is the
//!   input divided by [`network::PIXEL_MAX`].
//! - `weights[l]` has shape `(layer_sizes[l + 1], layer_sizes[l])`, stored
//!   row-major.
//!
//! # Quick start
//!
//! ```rust
//! use digit_mlp::{ActivationFunction, Dataset, Network, Shuffle, TrainConfig, Vector, one_hot};
//!
//! # fn main() -> digit_mlp::Result<()> {
//! let pairs = vec![
//!     (Vector::from_vec(vec![255.0, 0.0]), one_hot(0, 2)),
//!     (Vector::from_vec(vec![0.0, 255.0]), one_hot(1, 2)),
//! ];
//! let data = Dataset::from_pairs(&pairs)?;
//!
//! let mut net = Network::new_with_seed(
//!     &[2, 4, 2],
//!     &[ActivationFunction::Sigmoid, ActivationFunction::Sigmoid],
//!     0,
//! )?;
//! net.train(
//!     &data,
//!     &TrainConfig {
//!         epochs: 50,
//!         batch_size: 2,
//!         learning_rate: 3.0,
//!         shuffle: Shuffle::Seeded(0),
//!     },
//! )?;
//! let report = net.evaluate(&data)?;
//! assert!(report.mean_error.is_finite());
//! # Ok(())
//! # }
//! ```
//!
//! # Driving the low-level API
//!
//! ```rust
//! use digit_mlp::{ActivationFunction, Network, Vector};
//!
//! # fn main() -> digit_mlp::Result<()> {
//! let mut net = Network::new_with_seed(
//!     &[3, 5, 2],
//!     &[ActivationFunction::Tanh, ActivationFunction::Sigmoid],
//!     7,
//! )?;
//! let x = Vector::from_vec(vec![12.0, 200.0, 0.0]);
//! let y = Vector::from_vec(vec![0.0, 1.0]);
//!
//! let record = net.forwardprop(&x)?;
//! let update = net.backprop(&record, &y)?;
//! net.update_network(&[update], 0.5)?;
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod data;
pub mod digits;
pub mod error;
pub mod loss;
pub(crate) mod matmul;
pub mod matrix;
pub mod network;
pub mod persist;
pub mod record;
pub mod train;
pub mod vector;

#[cfg(feature = "serde")]
pub mod serde_model;

pub use activation::ActivationFunction;
pub use data::{Dataset, Examples, one_hot};
pub use digits::{DigitSet, Split};
pub use error::{Error, Result};
pub use matrix::Matrix;
pub use network::Network;
pub use persist::SaveDir;
pub use record::{GradientUpdate, NetworkActivation};
pub use train::{EpochReport, EvalReport, Shuffle, TrainConfig, TrainReport};
pub use vector::Vector;

//! Mini-batch training and evaluation.
//!
//! `Network::train` drives the low-level API: per epoch it shuffles the
//! example order, splits it into full mini-batches, computes one
//! `GradientUpdate` per example and applies each batch with a single
//! `update_network` call. Gradient computation is pure, so with the `rayon`
//! feature the examples of a batch are processed in parallel and only the
//! update is serialized.

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::data::Examples;
use crate::{Error, GradientUpdate, Network, Result, Vector, loss};

/// Example order within each epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shuffle {
    /// Keep dataset order.
    None,
    /// Deterministic shuffling from a seed.
    Seeded(u64),
    /// Shuffle from OS entropy.
    #[default]
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub shuffle: Shuffle,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 30,
            batch_size: 20,
            learning_rate: 3.0,
            shuffle: Shuffle::Random,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    pub epoch: usize,
    /// Mean squared error over the whole dataset after this epoch's updates.
    pub mean_error: f64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub epochs: Vec<EpochReport>,
    /// Examples used per epoch (the trailing partial batch is dropped).
    pub examples_per_epoch: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalReport {
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
    pub mean_error: f64,
}

impl Network {
    /// Train with mini-batch gradient descent.
    pub fn train<E>(&mut self, data: &E, cfg: &TrainConfig) -> Result<TrainReport>
    where
        E: Examples + Sync + ?Sized,
    {
        cfg.validate()?;
        self.check_examples(data)?;
        if cfg.batch_size > data.len() {
            return Err(Error::InvalidConfig(format!(
                "batch_size {} exceeds dataset length {}",
                cfg.batch_size,
                data.len()
            )));
        }

        let mut rng = match cfg.shuffle {
            Shuffle::Seeded(seed) => Some(StdRng::seed_from_u64(seed)),
            Shuffle::Random => Some(StdRng::from_entropy()),
            Shuffle::None => None,
        };

        let num_batches = data.len() / cfg.batch_size;
        let examples_per_epoch = num_batches * cfg.batch_size;
        let mut order: Vec<usize> = (0..data.len()).collect();
        let mut epochs = Vec::with_capacity(cfg.epochs);

        for epoch in 0..cfg.epochs {
            let start = Instant::now();
            if let Some(rng) = rng.as_mut() {
                order.shuffle(rng);
            }

            for batch in order.chunks_exact(cfg.batch_size) {
                let updates = self.batch_gradients(data, batch)?;
                self.update_network(&updates, cfg.learning_rate)?;
            }

            let report = EpochReport {
                epoch,
                mean_error: self.mean_error(data)?,
                elapsed: start.elapsed(),
            };
            info!(
                epoch = report.epoch + 1,
                epochs = cfg.epochs,
                mean_error = report.mean_error,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "epoch complete"
            );
            epochs.push(report);
        }

        Ok(TrainReport {
            epochs,
            examples_per_epoch,
        })
    }

    /// Classification accuracy and mean squared error over `data`.
    ///
    /// An example counts as correct when the output's `index_of_max` equals the
    /// desired output's.
    pub fn evaluate<E>(&self, data: &E) -> Result<EvalReport>
    where
        E: Examples + ?Sized,
    {
        self.check_examples(data)?;

        let mut correct = 0;
        let mut total_error = 0.0_f64;
        for idx in 0..data.len() {
            let desired = data.desired_output(idx);
            let rec = self.forwardprop(&data.input(idx))?;
            total_error += loss::squared_error(rec.output(), &desired)?;
            if rec.output().index_of_max() == desired.index_of_max() {
                correct += 1;
            }
        }

        let total = data.len();
        let report = EvalReport {
            correct,
            total,
            accuracy: correct as f64 / total as f64,
            mean_error: total_error / total as f64,
        };
        debug!(correct, total, mean_error = report.mean_error, "evaluated network");
        Ok(report)
    }

    /// Predicted class: the index of the largest output activation.
    pub fn predict(&self, input: &Vector) -> Result<usize> {
        let rec = self.forwardprop(input)?;
        rec.output()
            .index_of_max()
            .ok_or_else(|| Error::ShapeMismatch("network output is empty".to_owned()))
    }

    /// Mean squared error over every example in `data`.
    pub fn mean_error<E>(&self, data: &E) -> Result<f64>
    where
        E: Examples + Sync + ?Sized,
    {
        self.check_examples(data)?;
        let example = |idx: usize| -> Result<f64> {
            let rec = self.forwardprop(&data.input(idx))?;
            loss::squared_error(rec.output(), &data.desired_output(idx))
        };

        #[cfg(feature = "rayon")]
        let indices = (0..data.len()).into_par_iter();
        #[cfg(not(feature = "rayon"))]
        let indices = 0..data.len();

        let errors: Vec<f64> = indices.map(example).collect::<Result<_>>()?;
        Ok(errors.iter().sum::<f64>() / data.len() as f64)
    }

    /// One gradient per example in `batch`.
    fn batch_gradients<E>(&self, data: &E, batch: &[usize]) -> Result<Vec<GradientUpdate>>
    where
        E: Examples + Sync + ?Sized,
    {
        let example = |&idx: &usize| -> Result<GradientUpdate> {
            let desired = data.desired_output(idx);
            let rec = self.forwardprop(&data.input(idx))?;
            self.backprop(&rec, &desired)
        };

        #[cfg(feature = "rayon")]
        let batch = batch.par_iter();
        #[cfg(not(feature = "rayon"))]
        let batch = batch.iter();

        batch.map(example).collect()
    }

    fn check_examples<E>(&self, data: &E) -> Result<()>
    where
        E: Examples + ?Sized,
    {
        if data.is_empty() {
            return Err(Error::InvalidData("dataset must not be empty".to_owned()));
        }
        if data.input_dim() != self.input_size() {
            return Err(Error::ShapeMismatch(format!(
                "dataset input_dim {} does not match input layer size {}",
                data.input_dim(),
                self.input_size()
            )));
        }
        if data.target_dim() != self.output_size() {
            return Err(Error::ShapeMismatch(format!(
                "dataset target_dim {} does not match output layer size {}",
                data.target_dim(),
                self.output_size()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActivationFunction::{Sigmoid, Tanh};
    use crate::data::{Dataset, one_hot};

    fn two_blobs() -> Dataset {
        // Class 0 is bright on the left, class 1 on the right.
        let mut pairs = Vec::new();
        for i in 0..8 {
            let jitter = (i * 10) as f64;
            pairs.push((
                Vector::from_vec(vec![220.0 - jitter, 20.0 + jitter]),
                one_hot(0, 2),
            ));
            pairs.push((
                Vector::from_vec(vec![20.0 + jitter, 220.0 - jitter]),
                one_hot(1, 2),
            ));
        }
        Dataset::from_pairs(&pairs).unwrap()
    }

    #[test]
    fn config_validation() {
        assert!(TrainConfig::default().validate().is_ok());
        let bad = [
            TrainConfig {
                epochs: 0,
                ..TrainConfig::default()
            },
            TrainConfig {
                batch_size: 0,
                ..TrainConfig::default()
            },
            TrainConfig {
                learning_rate: f64::NAN,
                ..TrainConfig::default()
            },
            TrainConfig {
                learning_rate: -1.0,
                ..TrainConfig::default()
            },
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))), "{cfg:?}");
        }
    }

    #[test]
    fn train_rejects_mismatched_data() {
        let mut net = Network::new_with_seed(&[3, 4, 2], &[Sigmoid, Sigmoid], 0).unwrap();
        let err = net.train(&two_blobs(), &TrainConfig::default()).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));

        let mut net = Network::new_with_seed(&[2, 4, 2], &[Sigmoid, Sigmoid], 0).unwrap();
        let cfg = TrainConfig {
            batch_size: 100,
            ..TrainConfig::default()
        };
        assert!(matches!(
            net.train(&two_blobs(), &cfg),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn training_separates_two_blobs() {
        let data = two_blobs();
        let mut net = Network::new_with_seed(&[2, 6, 2], &[Tanh, Sigmoid], 5).unwrap();
        let before = net.evaluate(&data).unwrap();

        let cfg = TrainConfig {
            epochs: 200,
            batch_size: 4,
            learning_rate: 1.0,
            shuffle: Shuffle::Seeded(0),
        };
        let report = net.train(&data, &cfg).unwrap();
        assert_eq!(report.epochs.len(), 200);
        assert_eq!(report.examples_per_epoch, 16);

        let after = net.evaluate(&data).unwrap();
        assert!(after.mean_error < before.mean_error, "{before:?} -> {after:?}");
        assert_eq!(after.correct, after.total, "{after:?}");
        assert_eq!(net.predict(&Vector::from_vec(vec![250.0, 0.0])).unwrap(), 0);
    }

    #[test]
    fn seeded_training_is_reproducible() {
        let data = two_blobs();
        let cfg = TrainConfig {
            epochs: 3,
            batch_size: 5,
            learning_rate: 0.5,
            shuffle: Shuffle::Seeded(17),
        };

        let mut a = Network::new_with_seed(&[2, 3, 2], &[Sigmoid, Sigmoid], 1).unwrap();
        let mut b = a.clone();
        let ra = a.train(&data, &cfg).unwrap();
        let rb = b.train(&data, &cfg).unwrap();

        assert_eq!(a, b);
        // 16 examples in batches of 5: the last one is dropped.
        assert_eq!(ra.examples_per_epoch, 15);
        let errs = |r: &TrainReport| r.epochs.iter().map(|e| e.mean_error).collect::<Vec<_>>();
        assert_eq!(errs(&ra), errs(&rb));
    }

    #[test]
    fn evaluate_counts_argmax_matches() {
        let net = Network::new_with_seed(&[2, 3, 2], &[Sigmoid, Sigmoid], 2).unwrap();
        let data = two_blobs();
        let report = net.evaluate(&data).unwrap();
        assert_eq!(report.total, 16);
        assert!(report.correct <= 16);
        assert!((report.accuracy - report.correct as f64 / 16.0).abs() < 1e-12);
        assert!(report.mean_error >= 0.0);
    }
}

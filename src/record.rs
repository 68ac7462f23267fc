//! Per-pass records exchanged between forward propagation, backpropagation
//! and the update step.

use std::fmt;

use crate::{Matrix, Vector};

/// Per-layer raw (`z`) and activated (`a`) values of one forward pass.
///
/// Both sequences hold one vector per layer, input layer included.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkActivation {
    raw_activations: Vec<Vector>,
    activations: Vec<Vector>,
}

impl NetworkActivation {
    pub(crate) fn new(raw_activations: Vec<Vector>, activations: Vec<Vector>) -> Self {
        debug_assert_eq!(raw_activations.len(), activations.len());
        Self {
            raw_activations,
            activations,
        }
    }

    #[inline]
    pub fn raw_activations(&self) -> &[Vector] {
        &self.raw_activations
    }

    #[inline]
    pub fn activations(&self) -> &[Vector] {
        &self.activations
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.activations.len()
    }

    /// Activated values of the output layer.
    #[inline]
    pub fn output(&self) -> &Vector {
        &self.activations[self.activations.len() - 1]
    }
}

impl fmt::Display for NetworkActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (raw, act)) in self
            .raw_activations
            .iter()
            .zip(&self.activations)
            .enumerate()
        {
            writeln!(f, "Layer {i}\n========")?;
            writeln!(f, "Raw activations:\n{raw}")?;
            writeln!(f, "Activations:\n{act}")?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Weight and bias gradients of one backpropagation call.
///
/// Entry `i` belongs to the transition from layer `i` to layer `i + 1`, so the
/// shapes mirror `Network::weights()` and `Network::biases()`.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientUpdate {
    weight_gradients: Vec<Matrix>,
    bias_gradients: Vec<Vector>,
}

impl GradientUpdate {
    pub(crate) fn new(weight_gradients: Vec<Matrix>, bias_gradients: Vec<Vector>) -> Self {
        debug_assert_eq!(weight_gradients.len(), bias_gradients.len());
        Self {
            weight_gradients,
            bias_gradients,
        }
    }

    /// All-zero gradients shaped like the given layer sizes.
    pub fn zeros(layer_sizes: &[usize]) -> Self {
        let weight_gradients = layer_sizes
            .windows(2)
            .map(|w| Matrix::zeros(w[1], w[0]))
            .collect();
        let bias_gradients = layer_sizes.iter().skip(1).map(|&n| Vector::zeros(n)).collect();
        Self {
            weight_gradients,
            bias_gradients,
        }
    }

    #[inline]
    pub fn weight_gradients(&self) -> &[Matrix] {
        &self.weight_gradients
    }

    #[inline]
    pub fn bias_gradients(&self) -> &[Vector] {
        &self.bias_gradients
    }
}

impl fmt::Display for GradientUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (w, b)) in self
            .weight_gradients
            .iter()
            .zip(&self.bias_gradients)
            .enumerate()
        {
            writeln!(f, "Layer {}\n========", i + 1)?;
            writeln!(f, "Weights:\n{w}")?;
            writeln!(f, "Biases:\n{b}")?;
            writeln!(f)?;
        }
        Ok(())
    }
}

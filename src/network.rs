use std::fmt;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::{
    ActivationFunction, Error, GradientUpdate, Matrix, NetworkActivation, Result, Vector, loss,
};

/// Inputs are 8-bit pixel intensities; forward propagation divides by this.
pub const PIXEL_MAX: f64 = 255.0;

/// Initial weights and biases are resampled until their magnitude exceeds this.
pub const MIN_INIT_MAGNITUDE: f64 = 0.1;

const WEIGHT_INIT_RANGE: f64 = 2.0;
const BIAS_INIT_RANGE: f64 = 1.0;

/// A fully connected feed-forward network.
///
/// Layer `0` is the input layer. For `L` layers the network holds `L - 1`
/// weight matrices (`weights[i]` has shape `(layer_sizes[i + 1], layer_sizes[i])`),
/// `L - 1` bias vectors and `L` activation functions, where `functions[0]` is
/// always `Identity`.
#[derive(Debug, Clone)]
pub struct Network {
    name: Option<String>,
    layer_sizes: Vec<usize>,
    weights: Vec<Matrix>,
    biases: Vec<Vector>,
    functions: Vec<ActivationFunction>,
}

impl Network {
    pub fn new_with_seed(
        layer_sizes: &[usize],
        functions: &[ActivationFunction],
        seed: u64,
    ) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new_with_rng(layer_sizes, functions, &mut rng)
    }

    /// Build a randomly initialized network.
    ///
    /// `functions` holds one activation per non-input layer, so its length must be
    /// `layer_sizes.len() - 1`. Weights are drawn from `[-2, 2)` and biases from
    /// `[-1, 1)`, each resampled until its magnitude exceeds `MIN_INIT_MAGNITUDE`.
    pub fn new_with_rng<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        functions: &[ActivationFunction],
        rng: &mut R,
    ) -> Result<Self> {
        validate_layer_sizes(layer_sizes)?;
        if functions.len() != layer_sizes.len() - 1 {
            return Err(Error::Construction(format!(
                "expected {} activation functions (one per non-input layer), got {}",
                layer_sizes.len() - 1,
                functions.len()
            )));
        }

        let weight_dist = Uniform::new(-WEIGHT_INIT_RANGE, WEIGHT_INIT_RANGE);
        let bias_dist = Uniform::new(-BIAS_INIT_RANGE, BIAS_INIT_RANGE);

        let mut weights = Vec::with_capacity(layer_sizes.len() - 1);
        for w in layer_sizes.windows(2) {
            let mut m = Matrix::zeros(w[1], w[0]);
            for v in m.as_mut_slice() {
                *v = sample_away_from_zero(&weight_dist, rng);
            }
            weights.push(m);
        }

        let mut biases = Vec::with_capacity(layer_sizes.len() - 1);
        for &n in &layer_sizes[1..] {
            let mut b = Vector::zeros(n);
            for v in b.as_mut_slice() {
                *v = sample_away_from_zero(&bias_dist, rng);
            }
            biases.push(b);
        }

        let mut all_functions = Vec::with_capacity(layer_sizes.len());
        all_functions.push(ActivationFunction::Identity);
        all_functions.extend_from_slice(functions);

        debug!(?layer_sizes, ?functions, "initialized network");

        Ok(Self {
            name: None,
            layer_sizes: layer_sizes.to_vec(),
            weights,
            biases,
            functions: all_functions,
        })
    }

    /// Rebuild a network from already computed parameters (e.g. a save file).
    ///
    /// `functions` covers every layer including the input layer, whose function
    /// must be `Identity`. All shapes are validated.
    pub fn from_parts(
        name: Option<String>,
        layer_sizes: Vec<usize>,
        functions: Vec<ActivationFunction>,
        weights: Vec<Matrix>,
        biases: Vec<Vector>,
    ) -> Result<Self> {
        validate_layer_sizes(&layer_sizes)?;
        let n = layer_sizes.len();

        if functions.len() != n {
            return Err(Error::Construction(format!(
                "expected {n} activation functions (one per layer), got {}",
                functions.len()
            )));
        }
        if functions[0] != ActivationFunction::Identity {
            return Err(Error::Construction(format!(
                "input layer activation must be Identity, got {}",
                functions[0]
            )));
        }
        if weights.len() != n - 1 || biases.len() != n - 1 {
            return Err(Error::Construction(format!(
                "expected {} weight matrices and bias vectors, got {} and {}",
                n - 1,
                weights.len(),
                biases.len()
            )));
        }

        for (i, w) in layer_sizes.windows(2).enumerate() {
            let expected = (w[1], w[0]);
            if weights[i].shape() != expected {
                return Err(Error::Construction(format!(
                    "layer {} weights have shape {:?}, expected {expected:?}",
                    i + 1,
                    weights[i].shape()
                )));
            }
            if biases[i].len() != w[1] {
                return Err(Error::Construction(format!(
                    "layer {} biases have len {}, expected {}",
                    i + 1,
                    biases[i].len(),
                    w[1]
                )));
            }
        }

        Ok(Self {
            name,
            layer_sizes,
            weights,
            biases,
            functions,
        })
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layer_sizes.len()
    }

    #[inline]
    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.layer_sizes[0]
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    /// One function per layer; entry `0` is the input layer's `Identity`.
    #[inline]
    pub fn activation_functions(&self) -> &[ActivationFunction] {
        &self.functions
    }

    #[inline]
    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &[Vector] {
        &self.biases
    }

    /// Forward pass for a single input of raw pixel intensities.
    ///
    /// The input layer's activation is `input / 255`; every later layer computes
    /// `z = W a + b` and `a = f(z)`. The input layer's raw activation is the
    /// input as given.
    pub fn forwardprop(&self, input: &Vector) -> Result<NetworkActivation> {
        if input.len() != self.input_size() {
            return Err(Error::ShapeMismatch(format!(
                "input len {} does not match input layer size {}",
                input.len(),
                self.input_size()
            )));
        }

        let n = self.num_layers();
        let mut raw = Vec::with_capacity(n);
        let mut act: Vec<Vector> = Vec::with_capacity(n);

        let f0 = self.functions[0];
        act.push(input.apply(|x| f0.apply(x / PIXEL_MAX)));
        raw.push(input.clone());

        for i in 1..n {
            let z = self.weights[i - 1]
                .multiply_vector(&act[i - 1])?
                .add(&self.biases[i - 1])?;
            let f = self.functions[i];
            act.push(z.apply(|x| f.apply(x)));
            raw.push(z);
        }

        Ok(NetworkActivation::new(raw, act))
    }

    /// Gradients of the squared error `sum (a - y)^2` for one example.
    ///
    /// `record` must come from `forwardprop` on this network. Layers are walked
    /// from the output back to layer 1; each layer's error signal `dE/dz` becomes
    /// its bias gradient, its outer product with the previous activations becomes
    /// the weight gradient, and `W^T dE/dz` is the previous layer's `dE/da`.
    pub fn backprop(
        &self,
        record: &NetworkActivation,
        desired_output: &Vector,
    ) -> Result<GradientUpdate> {
        if desired_output.len() != self.output_size() {
            return Err(Error::ShapeMismatch(format!(
                "desired output len {} does not match output layer size {}",
                desired_output.len(),
                self.output_size()
            )));
        }
        self.check_record(record)?;

        let n = self.num_layers();
        let a = record.activations();
        let z = record.raw_activations();

        let mut weight_gradients = Vec::with_capacity(n - 1);
        let mut bias_gradients = Vec::with_capacity(n - 1);

        let mut d_a = loss::squared_error_gradient(&a[n - 1], desired_output)?;
        for layer in (1..n).rev() {
            let f = self.functions[layer];
            let d_z = d_a.hadamard(&z[layer].apply(|x| f.differentiate(x)))?;

            weight_gradients.push(Matrix::outer(&d_z, &a[layer - 1]));
            if layer > 1 {
                d_a = self.weights[layer - 1].transpose_multiply_vector(&d_z)?;
            }
            bias_gradients.push(d_z);
        }

        weight_gradients.reverse();
        bias_gradients.reverse();
        Ok(GradientUpdate::new(weight_gradients, bias_gradients))
    }

    /// Apply one mini-batch of gradients.
    ///
    /// Every parameter moves by `-(learning_rate / updates.len()) * gradient`,
    /// summed over the batch. The whole batch is shape-checked before any
    /// parameter changes.
    pub fn update_network(&mut self, updates: &[GradientUpdate], learning_rate: f64) -> Result<()> {
        if updates.is_empty() {
            return Err(Error::InvalidConfig(
                "update batch must not be empty".to_owned(),
            ));
        }
        if !learning_rate.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite, got {learning_rate}"
            )));
        }
        for (idx, update) in updates.iter().enumerate() {
            self.check_update(update)
                .map_err(|e| Error::ShapeMismatch(format!("update {idx}: {e}")))?;
        }

        let factor = -learning_rate / updates.len() as f64;
        for update in updates {
            for (w, g) in self.weights.iter_mut().zip(update.weight_gradients()) {
                w.add_scaled_in_place(g, factor);
            }
            for (b, g) in self.biases.iter_mut().zip(update.bias_gradients()) {
                for (v, &d) in b.as_mut_slice().iter_mut().zip(g.iter()) {
                    *v += factor * d;
                }
            }
        }

        Ok(())
    }

    fn check_record(&self, record: &NetworkActivation) -> Result<()> {
        if record.num_layers() != self.num_layers()
            || record.raw_activations().len() != self.num_layers()
        {
            return Err(Error::ShapeMismatch(format!(
                "activation record has {} layers, network has {}",
                record.num_layers(),
                self.num_layers()
            )));
        }
        for (i, &size) in self.layer_sizes.iter().enumerate() {
            let a_len = record.activations()[i].len();
            let z_len = record.raw_activations()[i].len();
            if a_len != size || z_len != size {
                return Err(Error::ShapeMismatch(format!(
                    "activation record layer {i} has len {a_len}/{z_len}, expected {size}"
                )));
            }
        }
        Ok(())
    }

    fn check_update(&self, update: &GradientUpdate) -> Result<()> {
        let dw = update.weight_gradients();
        let db = update.bias_gradients();
        if dw.len() != self.weights.len() || db.len() != self.biases.len() {
            return Err(Error::ShapeMismatch(format!(
                "gradient update covers {}/{} layers, network has {}",
                dw.len(),
                db.len(),
                self.weights.len()
            )));
        }
        for i in 0..self.weights.len() {
            if dw[i].shape() != self.weights[i].shape() || db[i].len() != self.biases[i].len() {
                return Err(Error::ShapeMismatch(format!(
                    "layer {} gradient shape {:?}/{} does not match parameters {:?}/{}",
                    i + 1,
                    dw[i].shape(),
                    db[i].len(),
                    self.weights[i].shape(),
                    self.biases[i].len()
                )));
            }
        }
        Ok(())
    }
}

/// Exact equality of layer sizes, weights and biases. Name and activation
/// functions are not compared.
impl PartialEq for Network {
    fn eq(&self, other: &Self) -> bool {
        self.layer_sizes == other.layer_sizes
            && self.weights == other.weights
            && self.biases == other.biases
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (w, b)) in self.weights.iter().zip(&self.biases).enumerate() {
            writeln!(f, "Layer {}\n========", i + 1)?;
            writeln!(f, "Weights:\n{w}")?;
            writeln!(f, "Biases:\n{b}")?;
            writeln!(f)?;
        }
        Ok(())
    }
}

fn validate_layer_sizes(layer_sizes: &[usize]) -> Result<()> {
    if layer_sizes.len() < 3 {
        return Err(Error::Construction(format!(
            "network must have at least one hidden layer (got {} layers)",
            layer_sizes.len()
        )));
    }
    if let Some(i) = layer_sizes.iter().position(|&n| n == 0) {
        return Err(Error::Construction(format!(
            "layer {i} must have at least one neuron"
        )));
    }
    Ok(())
}

#[inline]
fn sample_away_from_zero<R: Rng + ?Sized>(dist: &Uniform<f64>, rng: &mut R) -> f64 {
    loop {
        let v = dist.sample(rng);
        if v.abs() > MIN_INIT_MAGNITUDE {
            return v;
        }
    }
}

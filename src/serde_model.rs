//! JSON model format (feature: `serde`).
//!
//! The JSON form mirrors the network's parameters layer by layer instead of
//! serializing `Network` directly, so the format stays fixed if the in-memory
//! representation changes. Deserialization validates the version, every
//! shape, and that all parameters are finite.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ActivationFunction, Error, Matrix, Network, Result, Vector};

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNetwork {
    pub format_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub input_size: usize,
    /// Every non-input layer, in order.
    pub layers: Vec<SerializedLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedLayer {
    pub in_dim: usize,
    pub out_dim: usize,
    pub activation: SerializedActivation,
    /// Row-major (out_dim, in_dim).
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SerializedActivation {
    Sigmoid,
    Relu,
    LeakyRelu,
    Tanh,
    Step,
    Identity,
}

impl From<ActivationFunction> for SerializedActivation {
    fn from(value: ActivationFunction) -> Self {
        match value {
            ActivationFunction::Sigmoid => SerializedActivation::Sigmoid,
            ActivationFunction::ReLU => SerializedActivation::Relu,
            ActivationFunction::LeakyReLU => SerializedActivation::LeakyRelu,
            ActivationFunction::Tanh => SerializedActivation::Tanh,
            ActivationFunction::Step => SerializedActivation::Step,
            ActivationFunction::Identity => SerializedActivation::Identity,
        }
    }
}

impl From<SerializedActivation> for ActivationFunction {
    fn from(value: SerializedActivation) -> Self {
        match value {
            SerializedActivation::Sigmoid => ActivationFunction::Sigmoid,
            SerializedActivation::Relu => ActivationFunction::ReLU,
            SerializedActivation::LeakyRelu => ActivationFunction::LeakyReLU,
            SerializedActivation::Tanh => ActivationFunction::Tanh,
            SerializedActivation::Step => ActivationFunction::Step,
            SerializedActivation::Identity => ActivationFunction::Identity,
        }
    }
}

impl SerializedNetwork {
    pub fn validate(&self) -> Result<()> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(Error::InvalidData(format!(
                "unsupported model format_version {}; expected {}",
                self.format_version, MODEL_FORMAT_VERSION
            )));
        }
        if self.layers.len() < 2 {
            return Err(Error::InvalidData(format!(
                "serialized network needs at least 2 non-input layers, got {}",
                self.layers.len()
            )));
        }

        let mut prev_out = self.input_size;
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.in_dim != prev_out {
                return Err(Error::InvalidData(format!(
                    "layer {} in_dim {} does not match previous size {prev_out}",
                    i + 1,
                    layer.in_dim
                )));
            }
            layer
                .validate()
                .map_err(|e| Error::InvalidData(format!("layer {} invalid: {e}", i + 1)))?;
            prev_out = layer.out_dim;
        }
        Ok(())
    }
}

impl SerializedLayer {
    fn validate(&self) -> Result<()> {
        if self.in_dim == 0 || self.out_dim == 0 {
            return Err(Error::InvalidData(format!(
                "layer dims must be > 0, got in_dim={} out_dim={}",
                self.in_dim, self.out_dim
            )));
        }
        let expected_w = self
            .in_dim
            .checked_mul(self.out_dim)
            .ok_or_else(|| Error::InvalidData("layer weight shape overflow".to_owned()))?;
        if self.weights.len() != expected_w {
            return Err(Error::InvalidData(format!(
                "weights length {} does not match out_dim * in_dim ({} * {})",
                self.weights.len(),
                self.out_dim,
                self.in_dim
            )));
        }
        if self.biases.len() != self.out_dim {
            return Err(Error::InvalidData(format!(
                "biases length {} does not match out_dim {}",
                self.biases.len(),
                self.out_dim
            )));
        }
        if self
            .weights
            .iter()
            .chain(&self.biases)
            .any(|v| !v.is_finite())
        {
            return Err(Error::InvalidData(
                "parameters must contain only finite values".to_owned(),
            ));
        }
        Ok(())
    }
}

impl From<&Network> for SerializedNetwork {
    fn from(network: &Network) -> Self {
        let layers = network
            .weights()
            .iter()
            .zip(network.biases())
            .zip(&network.activation_functions()[1..])
            .map(|((w, b), &f)| SerializedLayer {
                in_dim: w.cols(),
                out_dim: w.rows(),
                activation: f.into(),
                weights: w.as_slice().to_vec(),
                biases: b.as_slice().to_vec(),
            })
            .collect();

        Self {
            format_version: MODEL_FORMAT_VERSION,
            name: network.name().map(str::to_owned),
            input_size: network.input_size(),
            layers,
        }
    }
}

impl TryFrom<SerializedNetwork> for Network {
    type Error = Error;

    fn try_from(value: SerializedNetwork) -> std::result::Result<Self, Self::Error> {
        value.validate()?;

        let mut layer_sizes = Vec::with_capacity(value.layers.len() + 1);
        let mut functions = Vec::with_capacity(value.layers.len() + 1);
        let mut weights = Vec::with_capacity(value.layers.len());
        let mut biases = Vec::with_capacity(value.layers.len());
        layer_sizes.push(value.input_size);
        functions.push(ActivationFunction::Identity);

        for layer in value.layers {
            layer_sizes.push(layer.out_dim);
            functions.push(layer.activation.into());
            weights.push(Matrix::from_flat(layer.out_dim, layer.in_dim, layer.weights)?);
            biases.push(Vector::from_vec(layer.biases));
        }

        Network::from_parts(value.name, layer_sizes, functions, weights, biases)
            .map_err(|e| Error::InvalidData(format!("serialized network is invalid: {e}")))
    }
}

impl Network {
    /// Serialize the network to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&SerializedNetwork::from(self))
            .map_err(|e| Error::InvalidData(format!("failed to serialize network: {e}")))
    }

    /// Serialize the network to a compact JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&SerializedNetwork::from(self))
            .map_err(|e| Error::InvalidData(format!("failed to serialize network: {e}")))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let ser: SerializedNetwork = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse network json: {e}")))?;
        ser.try_into()
    }

    /// Save the network to a JSON file (pretty-printed).
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json_string_pretty()?)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path.as_ref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ActivationFunction::*;

    fn small() -> Network {
        let mut net = Network::new_with_seed(&[2, 3, 1], &[Tanh, LeakyReLU], 3).unwrap();
        net.set_name("json_net");
        net
    }

    #[test]
    fn json_roundtrip_keeps_everything() {
        let net = small();
        let json = net.to_json_string_pretty().unwrap();
        let loaded = Network::from_json_str(&json).unwrap();

        assert_eq!(loaded, net);
        assert_eq!(loaded.name(), Some("json_net"));
        assert_eq!(loaded.activation_functions(), net.activation_functions());
    }

    #[test]
    fn json_keeps_every_bit_of_the_parameters() {
        let tricky = [
            -1.0378481758737461,
            0.1 + 0.2,
            f64::MIN_POSITIVE,
            1.0 / 3.0,
            -2.0_f64.sqrt(),
            1e-300,
        ];
        let net = Network::from_parts(
            None,
            vec![2, 2, 1],
            vec![Identity, Sigmoid, Sigmoid],
            vec![
                Matrix::from_flat(2, 2, tricky[..4].to_vec()).unwrap(),
                Matrix::from_flat(1, 2, tricky[4..].to_vec()).unwrap(),
            ],
            vec![Vector::from_vec(vec![tricky[5], tricky[0]]), Vector::from_vec(vec![tricky[3]])],
        )
        .unwrap();

        let loaded = Network::from_json_str(&net.to_json_string().unwrap()).unwrap();
        let bits = |n: &Network| -> Vec<u64> {
            n.weights()
                .iter()
                .flat_map(|w| w.as_slice().to_vec())
                .chain(n.biases().iter().flat_map(|b| b.as_slice().to_vec()))
                .map(f64::to_bits)
                .collect()
        };
        assert_eq!(bits(&loaded), bits(&net));
    }

    #[test]
    fn json_layout_names_activations() {
        let value: serde_json::Value = serde_json::from_str(&small().to_json_string().unwrap()).unwrap();
        assert_eq!(value["format_version"], 1);
        assert_eq!(value["input_size"], 2);
        assert_eq!(value["layers"][0]["activation"]["kind"], "tanh");
        assert_eq!(value["layers"][1]["activation"]["kind"], "leaky_relu");
        assert_eq!(value["layers"][0]["weights"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn rejects_unknown_version_and_bad_shapes() {
        let err = Network::from_json_str(r#"{"format_version":999,"input_size":2,"layers":[]}"#)
            .unwrap_err();
        assert!(format!("{err}").contains("format_version"));

        let mut ser = SerializedNetwork::from(&small());
        ser.layers[1].in_dim = 4;
        assert!(Network::try_from(ser).is_err());

        let mut ser = SerializedNetwork::from(&small());
        ser.layers[0].biases.pop();
        assert!(Network::try_from(ser).is_err());
    }
}

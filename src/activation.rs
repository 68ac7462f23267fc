//! Activation functions.
//!
//! A dense layer computes a raw activation `z = W a + b` and then applies an
//! activation function element-wise: `a' = f(z)`.
//!
//! The catalog is closed. Each variant carries a stable integer code used by the
//! `.sb` save format, and derivatives are evaluated from the cached raw value `z`.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Slope of `LeakyReLU` for non-positive inputs.
pub const LEAKY_RELU_SLOPE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Element-wise activation function.
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    LeakyReLU,
    Tanh,
    Step,
    Identity,
}

impl ActivationFunction {
    /// Every variant, in code order.
    pub const ALL: [ActivationFunction; 6] = [
        ActivationFunction::Sigmoid,
        ActivationFunction::ReLU,
        ActivationFunction::LeakyReLU,
        ActivationFunction::Tanh,
        ActivationFunction::Step,
        ActivationFunction::Identity,
    ];

    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => sigmoid(x),
            ActivationFunction::ReLU => {
                if x > 0.0 {
                    x
                } else {
                    0.0
                }
            }
            ActivationFunction::LeakyReLU => {
                if x > 0.0 {
                    x
                } else {
                    LEAKY_RELU_SLOPE * x
                }
            }
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::Step => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            ActivationFunction::Identity => x,
        }
    }

    /// Derivative with respect to the raw activation `x`.
    #[inline]
    pub fn differentiate(self, x: f64) -> f64 {
        match self {
            // e^-x / (1 + e^-x)^2 == s(x) * (1 - s(x))
            ActivationFunction::Sigmoid => {
                let s = sigmoid(x);
                s * (1.0 - s)
            }
            ActivationFunction::ReLU => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            ActivationFunction::LeakyReLU => {
                if x > 0.0 {
                    1.0
                } else {
                    LEAKY_RELU_SLOPE
                }
            }
            ActivationFunction::Tanh => {
                let c = x.cosh();
                1.0 / (c * c)
            }
            ActivationFunction::Step => 0.0,
            ActivationFunction::Identity => 1.0,
        }
    }

    /// Stable code persisted in save files.
    pub fn code(self) -> i32 {
        match self {
            ActivationFunction::Sigmoid => 1,
            ActivationFunction::ReLU => 2,
            ActivationFunction::LeakyReLU => 3,
            ActivationFunction::Tanh => 4,
            ActivationFunction::Step => 5,
            ActivationFunction::Identity => 6,
        }
    }

    pub fn from_code(code: i32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.code() == code)
            .ok_or_else(|| Error::InvalidData(format!("unknown activation code {code}")))
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            ActivationFunction::Sigmoid => "Sigmoid",
            ActivationFunction::ReLU => "ReLU",
            ActivationFunction::LeakyReLU => "Leaky ReLU",
            ActivationFunction::Tanh => "TanH",
            ActivationFunction::Step => "Step Function",
            ActivationFunction::Identity => "Identity Function",
        }
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses a code (`"1"`..`"6"`) or a name, ignoring case, spaces, `-` and `_`
/// (`"leaky_relu"`, `"Leaky ReLU"`, `"tanh"`).
impl FromStr for ActivationFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Ok(code) = s.trim().parse::<i32>() {
            return Self::from_code(code);
        }
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "sigmoid" => Ok(ActivationFunction::Sigmoid),
            "relu" => Ok(ActivationFunction::ReLU),
            "leakyrelu" => Ok(ActivationFunction::LeakyReLU),
            "tanh" => Ok(ActivationFunction::Tanh),
            "step" | "stepfunction" => Ok(ActivationFunction::Step),
            "identity" | "identityfunction" => Ok(ActivationFunction::Identity),
            _ => Err(Error::InvalidConfig(format!("unknown activation function {s:?}"))),
        }
    }
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

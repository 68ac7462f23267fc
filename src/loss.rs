//! Squared-error loss.
//!
//! The network trains against `E = sum_i (a_i - y_i)^2`, whose gradient with
//! respect to the output activations is `dE/da_i = 2 (a_i - y_i)`. Backprop
//! seeds the output layer with that gradient.

use crate::{Error, Result, Vector};

/// Sum of squared differences between `output` and `desired`.
pub fn squared_error(output: &Vector, desired: &Vector) -> Result<f64> {
    check_lengths(output, desired)?;
    Ok(output
        .iter()
        .zip(desired.iter())
        .map(|(&a, &y)| {
            let diff = a - y;
            diff * diff
        })
        .sum())
}

/// Gradient `dE/da = 2 (a - y)` of [`squared_error`].
pub fn squared_error_gradient(output: &Vector, desired: &Vector) -> Result<Vector> {
    check_lengths(output, desired)?;
    let grad = output
        .iter()
        .zip(desired.iter())
        .map(|(&a, &y)| 2.0 * (a - y))
        .collect();
    Ok(Vector::from_vec(grad))
}

fn check_lengths(output: &Vector, desired: &Vector) -> Result<()> {
    if output.len() != desired.len() {
        return Err(Error::ShapeMismatch(format!(
            "output len {} does not match desired output len {}",
            output.len(),
            desired.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_error_and_gradient() {
        let a = Vector::from_vec(vec![0.5, 1.0, 0.0]);
        let y = Vector::from_vec(vec![0.0, 1.0, 1.0]);
        assert_eq!(squared_error(&a, &y).unwrap(), 1.25);
        assert_eq!(
            squared_error_gradient(&a, &y).unwrap().as_slice(),
            &[1.0, 0.0, -2.0]
        );
    }

    #[test]
    fn rejects_length_mismatch() {
        let a = Vector::zeros(2);
        let y = Vector::zeros(3);
        assert!(matches!(squared_error(&a, &y), Err(Error::ShapeMismatch(_))));
        assert!(squared_error_gradient(&a, &y).is_err());
    }
}

//! Strided GEMM kernel behind `Matrix::multiply`.

/// `c = alpha * a * b + beta * c` over strided `f64` buffers.
///
/// `a` is `(m, k)`, `b` is `(k, n)`, `c` is `(m, n)`; `rs*`/`cs*` are row and
/// column strides.
#[allow(clippy::too_many_arguments)]
#[inline]
pub(crate) fn gemm_f64(
    m: usize,
    n: usize,
    k: usize,
    alpha: f64,
    a: &[f64],
    rsa: usize,
    csa: usize,
    b: &[f64],
    rsb: usize,
    csb: usize,
    beta: f64,
    c: &mut [f64],
    rsc: usize,
    csc: usize,
) {
    if m == 0 || n == 0 {
        return;
    }
    debug_assert!(c.len() > (m - 1) * rsc + (n - 1) * csc);

    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0_f64;
            let a0 = i * rsa;
            let b0 = j * csb;

            for p in 0..k {
                acc += a[a0 + p * csa] * b[p * rsb + b0];
            }

            let idx = i * rsc + j * csc;
            c[idx] = alpha * acc + beta * c[idx];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemm_matches_hand_product() {
        // [1 2 3]   [7  8]   [ 58  64]
        // [4 5 6] x [9 10] = [139 154]
        //           [11 12]
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let mut c = [0.0; 4];
        gemm_f64(2, 2, 3, 1.0, &a, 3, 1, &b, 2, 1, 0.0, &mut c, 2, 1);
        assert_eq!(c, [58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn gemm_handles_transposed_strides() {
        // a^T where a is stored (3, 2) row-major, times a column vector.
        let a = [1.0, 4.0, 2.0, 5.0, 3.0, 6.0];
        let b = [1.0, 1.0, 1.0];
        let mut c = [0.0; 2];
        gemm_f64(2, 1, 3, 1.0, &a, 1, 2, &b, 1, 1, 0.0, &mut c, 1, 1);
        assert_eq!(c, [6.0, 15.0]);
    }
}

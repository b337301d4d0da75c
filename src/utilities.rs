//! Numerical helpers for tabulated distributions

/// Linear interpolation on a linear scale.
///
/// Given arrays of x and y values, interpolate to find the y value at x_new.
/// If x_new is outside the range of x, returns the first or last y value.
/// `x` must be non-decreasing; flat segments return their left end.
pub fn interpolate_linear(x: &[f64], y: &[f64], x_new: f64) -> f64 {
    // Edge cases
    if x.is_empty() {
        return f64::NAN;
    }
    if x.len() == 1 {
        return y[0];
    }
    if x_new <= x[0] {
        return y[0];
    }
    if x_new >= x[x.len() - 1] {
        return y[y.len() - 1];
    }

    // Binary search for interval: find largest i with x[i] <= x_new
    let mut low = 0usize;
    let mut high = x.len() - 1; // invariant: target interval within (low, high]
    while high - low > 1 {
        let mid = (low + high) >> 1;
        if x[mid] <= x_new {
            low = mid;
        } else {
            high = mid;
        }
    }
    let x1 = x[low];
    let x2 = x[low + 1];
    let y1 = y[low];
    let y2 = y[low + 1];
    if x2 == x1 {
        return y1;
    }
    y1 + (x_new - x1) * (y2 - y1) / (x2 - x1)
}

/// Running trapezoidal integral of `y(x)`, starting from zero.
pub fn cumulative_trapezoid(x: &[f64], y: &[f64]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(x.len());
    let mut total = 0.0;
    for i in 0..x.len() {
        if i > 0 {
            total += 0.5 * (y[i] + y[i - 1]) * (x[i] - x[i - 1]);
        }
        cumulative.push(total);
    }
    cumulative
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_linear_inside() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 10.0, 30.0];
        assert_eq!(interpolate_linear(&x, &y, 0.5), 5.0);
        assert_eq!(interpolate_linear(&x, &y, 1.5), 20.0);
        assert_eq!(interpolate_linear(&x, &y, 1.0), 10.0);
    }

    #[test]
    fn test_interpolate_linear_clamps() {
        let x = [1.0, 2.0];
        let y = [3.0, 4.0];
        assert_eq!(interpolate_linear(&x, &y, -5.0), 3.0);
        assert_eq!(interpolate_linear(&x, &y, 9.0), 4.0);
        assert!(interpolate_linear(&[], &[], 1.0).is_nan());
        assert_eq!(interpolate_linear(&[1.0], &[7.0], 3.0), 7.0);
    }

    #[test]
    fn test_interpolate_linear_flat_segment() {
        let x = [0.0, 0.5, 0.5, 1.0];
        let y = [0.0, 1.0, 2.0, 3.0];
        let v = interpolate_linear(&x, &y, 0.5);
        assert!(v.is_finite());
    }

    #[test]
    fn test_cumulative_trapezoid() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 1.0, 1.0, 1.0];
        assert_eq!(cumulative_trapezoid(&x, &y), vec![0.0, 1.0, 2.0, 3.0]);

        let y = [0.0, 1.0, 2.0, 3.0];
        let c = cumulative_trapezoid(&x, &y);
        assert!((c[3] - 4.5).abs() < 1e-12);
    }
}

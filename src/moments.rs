use num_traits::Float;

use crate::helper::cast;

/// Running count, mean and unbiased sample variance of one numeric stream
///
/// Values are folded in one at a time with a Welford-style recurrence that keeps
/// the sample variance itself, rescaled by the change in degrees of freedom on
/// every step, instead of accumulating a raw sum of squares. Raw inputs are never
/// stored, so the state is three plain numbers regardless of how many values have
/// been seen.
///
/// Two `Moments` computed on disjoint parts of a stream can be combined with
/// [`Moments::merge`] using the parallel variance formula. The combination is
/// exact up to floating point rounding, so partial results may be merged in any
/// grouping or order.
///
/// NaN and infinite inputs are not rejected. They propagate arithmetically and
/// leave the mean and variance non-finite.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments<T> {
    /// Number of observations
    count: u64,
    /// Running mean, zero while empty
    mean: T,
    /// Unbiased sample variance, zero while fewer than two observations
    variance: T,
}

impl<T: Float> Default for Moments<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> Moments<T> {
    /// Creates an empty `Moments`
    ///
    /// # Returns
    ///
    /// * `Self` - Moments with a count of zero
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: T::zero(),
            variance: T::zero(),
        }
    }

    /// Rebuilds `Moments` from previously exported fields
    ///
    /// Used on the receiving side of a partial aggregate. The fields are taken as
    /// is; an empty count resets mean and variance to zero.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of observations
    /// * `mean` - Mean of the observations
    /// * `variance` - Unbiased sample variance of the observations
    ///
    /// # Returns
    ///
    /// * `Self` - The moments
    pub fn from_parts(count: u64, mean: T, variance: T) -> Self {
        if count == 0 {
            return Self::new();
        }
        Self {
            count,
            mean,
            variance,
        }
    }

    /// Resets to the empty state
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The moments object
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::new();
        self
    }

    /// Folds a new observation into the running moments
    ///
    /// # Arguments
    ///
    /// * `value` - The observation
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The moments object
    ///
    /// # Examples
    ///
    /// ```
    /// use udaf_statistics::Moments;
    /// use assert_approx_eq::assert_approx_eq;
    ///
    /// let mut moments = Moments::<f64>::new();
    /// for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
    ///     moments.next(v);
    /// }
    ///
    /// assert_eq!(moments.count(), 5);
    /// assert_approx_eq!(moments.mean().unwrap(), 3.0, 1e-12);
    /// assert_approx_eq!(moments.variance().unwrap(), 2.5, 1e-12);
    /// ```
    pub fn next(&mut self, value: T) -> &mut Self {
        self.count += 1;
        let n: T = cast(self.count);
        let delta = value - self.mean;
        self.mean = self.mean + delta / n;

        if self.count > 1 {
            let two: T = cast(2);
            let dof = n - T::one();
            self.variance = self.variance * ((n - two) / dof) + (value - self.mean) * delta / dof;
        }
        self
    }

    /// Combines another independently computed `Moments` into this one
    ///
    /// When either side is empty the other side is taken unchanged, which also
    /// keeps the `n - 1` denominators below away from zero.
    ///
    /// # Arguments
    ///
    /// * `other` - The moments of a disjoint set of observations
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The moments object
    ///
    /// # Examples
    ///
    /// ```
    /// use udaf_statistics::Moments;
    /// use assert_approx_eq::assert_approx_eq;
    ///
    /// let mut left = Moments::<f64>::new();
    /// let mut right = Moments::<f64>::new();
    /// [1.0, 2.0].iter().for_each(|v| { left.next(*v); });
    /// [3.0, 4.0, 5.0].iter().for_each(|v| { right.next(*v); });
    ///
    /// left.merge(&right);
    ///
    /// assert_eq!(left.count(), 5);
    /// assert_approx_eq!(left.mean().unwrap(), 3.0, 1e-12);
    /// assert_approx_eq!(left.variance().unwrap(), 2.5, 1e-12);
    /// ```
    pub fn merge(&mut self, other: &Self) -> &mut Self {
        if other.count == 0 {
            return self;
        }
        if self.count == 0 {
            *self = *other;
            return self;
        }

        let n_a: T = cast(self.count);
        let n_b: T = cast(other.count);
        let count = self.count + other.count;
        let n: T = cast(count);
        let dof = n - T::one();
        let diff = self.mean - other.mean;

        self.mean = self.mean * (n_a / n) + other.mean * (n_b / n);
        self.variance = self.variance * ((n_a - T::one()) / dof)
            + other.variance * ((n_b - T::one()) / dof)
            + diff * diff * (n_a / n) * (n_b / dof);
        self.count = count;
        self
    }

    /// Returns the number of observations
    ///
    /// # Returns
    ///
    /// * `u64` - The number of observations
    #[inline]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Returns `true` if no observation has been seen
    ///
    /// # Returns
    ///
    /// * `bool` - True if the count is zero
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the mean of the observations
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The mean, or `None` if empty
    #[inline]
    pub fn mean(&self) -> Option<T> {
        (self.count > 0).then_some(self.mean)
    }

    /// Returns the unbiased sample variance of the observations
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The sample variance, or `None` with fewer than two observations
    #[inline]
    pub fn variance(&self) -> Option<T> {
        (self.count > 1).then_some(self.variance)
    }

    /// Returns the sample standard deviation of the observations
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The sample standard deviation, or `None` with fewer than two
    ///   observations or a negative variance
    #[inline]
    pub fn stddev(&self) -> Option<T> {
        self.variance()
            .and_then(|var| (var >= T::zero()).then(|| var.sqrt()))
    }

    /// Returns the raw `(count, mean, variance)` fields, with zero placeholders
    /// for the undefined ones
    ///
    /// # Returns
    ///
    /// * `(u64, T, T)` - The exported fields
    #[inline]
    pub const fn parts(&self) -> (u64, T, T) {
        (self.count, self.mean, self.variance)
    }
}

impl<T: Float> Extend<T> for Moments<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        iter.into_iter().for_each(|v| {
            self.next(v);
        });
    }
}

impl<T: Float> FromIterator<T> for Moments<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut moments = Self::new();
        moments.extend(iter);
        moments
    }
}

/// Combines two independently computed `Moments`
///
/// # Arguments
///
/// * `a` - Moments of the first set of observations
/// * `b` - Moments of a disjoint second set of observations
///
/// # Returns
///
/// * `Moments<T>` - Moments of the union of both sets
pub fn merge_moments<T: Float>(a: &Moments<T>, b: &Moments<T>) -> Moments<T> {
    let mut merged = *a;
    merged.merge(b);
    merged
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use assert_approx_eq::assert_approx_eq;

    use super::*;

    fn two_pass(values: &[f64]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
        (mean, var)
    }

    #[test]
    fn empty_moments_have_no_statistics() {
        let moments = Moments::<f64>::new();
        assert!(moments.is_empty());
        assert_eq!(moments.mean(), None);
        assert_eq!(moments.variance(), None);
        assert_eq!(moments.parts(), (0, 0.0, 0.0));
    }

    #[test]
    fn single_observation_has_mean_but_no_variance() {
        let mut moments = Moments::new();
        moments.next(4.2);
        assert_eq!(moments.mean(), Some(4.2));
        assert_eq!(moments.variance(), None);
        assert_eq!(moments.parts().2, 0.0);
    }

    #[test]
    fn running_variance_matches_two_pass_at_every_step() {
        let inputs = [25.4, 26.2, 26.0, 26.1, 25.8, 25.9, 26.3, 26.2, 26.5];
        let mut moments = Moments::new();
        for (i, v) in inputs.iter().enumerate() {
            moments.next(*v);
            if i > 0 {
                let (mean, var) = two_pass(&inputs[..=i]);
                assert_approx_eq!(moments.mean().unwrap(), mean, 1e-12);
                assert_approx_eq!(moments.variance().unwrap(), var, 1e-12);
            }
        }
    }

    #[test]
    fn large_offset_stays_stable() {
        let inputs = [
            1_000_000_000.1,
            1_000_000_000.2,
            1_000_000_000.3,
            1_000_000_000.4,
            1_000_000_000.5,
        ];
        let moments: Moments<f64> = inputs.iter().copied().collect();
        assert_approx_eq!(moments.variance().unwrap(), 0.025, 1e-6);
    }

    #[test]
    fn merge_matches_single_pass() {
        let inputs: Vec<f64> = (0..50).map(|i| ((i * 37) % 11) as f64 * 0.75 - 2.0).collect();
        let whole: Moments<f64> = inputs.iter().copied().collect();

        for split in [1, 7, 25, 49] {
            let left: Moments<f64> = inputs[..split].iter().copied().collect();
            let right: Moments<f64> = inputs[split..].iter().copied().collect();
            let merged = merge_moments(&left, &right);

            assert_eq!(merged.count(), whole.count());
            assert_approx_eq!(merged.mean().unwrap(), whole.mean().unwrap(), 1e-12);
            assert_approx_eq!(merged.variance().unwrap(), whole.variance().unwrap(), 1e-12);
        }
    }

    #[test]
    fn merge_is_commutative() {
        let a: Moments<f64> = [1.0, 9.0, 4.0].into_iter().collect();
        let b: Moments<f64> = [2.5, 3.5].into_iter().collect();
        let ab = merge_moments(&a, &b);
        let ba = merge_moments(&b, &a);
        assert_eq!(ab.count(), ba.count());
        assert_approx_eq!(ab.mean().unwrap(), ba.mean().unwrap(), 1e-12);
        assert_approx_eq!(ab.variance().unwrap(), ba.variance().unwrap(), 1e-12);
    }

    #[test]
    fn merge_is_associative() {
        let a: Moments<f64> = [0.5, 1.5, -2.0].into_iter().collect();
        let b: Moments<f64> = [10.0].into_iter().collect();
        let c: Moments<f64> = [3.0, 3.0, 7.25, 8.0].into_iter().collect();

        let left = merge_moments(&merge_moments(&a, &b), &c);
        let right = merge_moments(&a, &merge_moments(&b, &c));
        assert_eq!(left.count(), 8);
        assert_approx_eq!(left.mean().unwrap(), right.mean().unwrap(), 1e-12);
        assert_approx_eq!(left.variance().unwrap(), right.variance().unwrap(), 1e-12);
    }

    #[test]
    fn merge_with_empty_is_identity() {
        let a: Moments<f64> = [2.0, 4.0, 9.0].into_iter().collect();
        let empty = Moments::new();
        assert_eq!(merge_moments(&a, &empty), a);
        assert_eq!(merge_moments(&empty, &a), a);
        assert_eq!(merge_moments(&empty, &empty), empty);
    }

    #[test]
    fn merging_two_singletons_yields_their_variance() {
        let a: Moments<f64> = [1.0].into_iter().collect();
        let b: Moments<f64> = [3.0].into_iter().collect();
        let merged = merge_moments(&a, &b);
        assert_eq!(merged.count(), 2);
        assert_approx_eq!(merged.mean().unwrap(), 2.0, 1e-12);
        assert_approx_eq!(merged.variance().unwrap(), 2.0, 1e-12);
    }

    #[test]
    fn from_parts_normalizes_empty() {
        let moments = Moments::from_parts(0, 5.0, 3.0);
        assert_eq!(moments, Moments::new());
        let moments = Moments::from_parts(3, 5.0, 3.0);
        assert_eq!(moments.parts(), (3, 5.0, 3.0));
    }

    #[test]
    fn non_finite_input_propagates() {
        let mut moments = Moments::new();
        moments.next(1.0).next(f64::NAN).next(2.0);
        assert!(moments.mean().unwrap().is_nan());
        assert!(moments.variance().unwrap().is_nan());
    }

    #[test]
    fn reset_clears_state() {
        let mut moments: Moments<f64> = [1.0, 2.0].into_iter().collect();
        moments.reset();
        assert!(moments.is_empty());
    }
}

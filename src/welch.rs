use num_traits::Float;

use crate::{Moments, StudentsT, helper::cast};

/// Alternative hypothesis of the two-sample test
///
/// The default is the two-sided alternative, where the p-value is the
/// probability of a difference in means at least as large in either direction.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Alternative {
    /// The means differ
    #[default]
    TwoSided,
    /// The mean of `x` is less than the mean of `y`
    Less,
    /// The mean of `x` is greater than the mean of `y`
    Greater,
}

/// Outcome of Welch's unequal variances t-test
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTestResult<T> {
    /// Absolute value of the t statistic
    statistic: T,
    /// Probability of the observed statistic under the null hypothesis
    pvalue: T,
    /// Welch–Satterthwaite degrees of freedom
    df: T,
}

impl<T: Float> TTestResult<T> {
    /// Returns the t statistic, always non-negative
    ///
    /// # Returns
    ///
    /// * `T` - The absolute t statistic
    #[inline]
    pub const fn statistic(&self) -> T {
        self.statistic
    }

    /// Returns the p-value
    ///
    /// # Returns
    ///
    /// * `T` - The p-value in `[0, 1]` for finite inputs
    #[inline]
    pub const fn pvalue(&self) -> T {
        self.pvalue
    }

    /// Returns the Welch–Satterthwaite degrees of freedom, not rounded
    ///
    /// # Returns
    ///
    /// * `T` - The degrees of freedom
    #[inline]
    pub const fn df(&self) -> T {
        self.df
    }
}

impl<T> From<TTestResult<T>> for (T, T) {
    fn from(result: TTestResult<T>) -> Self {
        (result.statistic, result.pvalue)
    }
}

/// Runs Welch's t-test on the moments of two samples
///
/// With `se² = var_x / n_x + var_y / n_y` the statistic is
/// `t = |mean_x - mean_y| / se` and the degrees of freedom follow the
/// Welch–Satterthwaite approximation
/// `df = se⁴ / ((var_x / n_x)² / (n_x - 1) + (var_y / n_y)² / (n_y - 1))`,
/// which is fed into a continuous Student's t distribution unrounded.
///
/// A sample that is empty, holds a single observation or has a variance that is
/// not positive makes the test undefined. This is an expected outcome for small
/// groups and is reported as `None`, never as an error or a NaN result.
///
/// # Arguments
///
/// * `x` - Moments of the first sample
/// * `y` - Moments of the second sample
/// * `alternative` - The alternative hypothesis
///
/// # Returns
///
/// * `Option<TTestResult<T>>` - The test result, or `None` when undefined
///
/// # Examples
///
/// ```
/// use udaf_statistics::{Alternative, Moments, welch_t_test};
/// use assert_approx_eq::assert_approx_eq;
///
/// let x: Moments<f64> = [1.0, 2.0, 3.0, 4.0, 5.0].into_iter().collect();
/// let y: Moments<f64> = [2.0, 4.0, 6.0, 8.0, 10.0].into_iter().collect();
///
/// let result = welch_t_test(&x, &y, Alternative::TwoSided).unwrap();
/// assert_approx_eq!(result.statistic(), 1.8973665961, 1e-9);
/// assert_approx_eq!(result.df(), 5.8823529412, 1e-9);
/// assert_approx_eq!(result.pvalue(), 0.1075311949, 1e-9);
///
/// let single: Moments<f64> = [1.0].into_iter().collect();
/// assert!(welch_t_test(&single, &y, Alternative::TwoSided).is_none());
/// ```
pub fn welch_t_test<T: Float>(
    x: &Moments<T>,
    y: &Moments<T>,
    alternative: Alternative,
) -> Option<TTestResult<T>> {
    let (n_x, mean_x, var_x) = x.parts();
    let (n_y, mean_y, var_y) = y.parts();

    if n_x < 2 || n_y < 2 || var_x <= T::zero() || var_y <= T::zero() {
        return None;
    }

    let n_x: T = cast(n_x);
    let n_y: T = cast(n_y);
    let se2_x = var_x / n_x;
    let se2_y = var_y / n_y;
    let se2 = se2_x + se2_y;

    let diff = (mean_x - mean_y) / se2.sqrt();
    let df = se2 * se2 / (se2_x * se2_x / (n_x - T::one()) + se2_y * se2_y / (n_y - T::one()));

    let pvalue = match StudentsT::new(df) {
        Some(dist) => match alternative {
            Alternative::TwoSided => cast::<T, _>(2) * dist.cdf(-diff.abs()),
            Alternative::Less => dist.cdf(diff),
            Alternative::Greater => dist.sf(diff),
        },
        // non-finite moments, let NaN through instead of hiding it
        None => T::nan(),
    };

    Some(TTestResult {
        statistic: diff.abs(),
        pvalue,
        df,
    })
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    fn moments(values: &[f64]) -> Moments<f64> {
        values.iter().copied().collect()
    }

    #[test]
    fn reference_example() {
        let x = moments(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let y = moments(&[2.0, 4.0, 6.0, 8.0, 10.0]);
        let result = welch_t_test(&x, &y, Alternative::TwoSided).unwrap();

        assert_approx_eq!(result.statistic(), 1.897_366_596_101_027_5, 1e-12);
        assert_approx_eq!(result.df(), 5.882_352_941_176_471, 1e-12);
        assert_approx_eq!(result.pvalue(), 0.107_531_194_930_627_25, 1e-12);

        let (statistic, pvalue): (f64, f64) = result.into();
        assert_eq!(statistic, result.statistic());
        assert_eq!(pvalue, result.pvalue());
    }

    #[test]
    fn unequal_sizes() {
        let x = moments(&[19.1, 21.4, 18.7, 22.3, 20.0, 19.5, 23.1]);
        let y = moments(&[24.2, 25.0, 22.9, 26.4]);
        let result = welch_t_test(&x, &y, Alternative::TwoSided).unwrap();

        assert_approx_eq!(result.statistic(), 4.150_735_883_097_441_5, 1e-9);
        assert_approx_eq!(result.df(), 7.220_579_406_183_006, 1e-9);
        assert_approx_eq!(result.pvalue(), 0.004_009_861_614_341_197, 1e-9);
    }

    #[test]
    fn statistic_is_never_negative_and_symmetric() {
        let x = moments(&[3.0, 5.0, 4.0, 8.0]);
        let y = moments(&[1.0, 2.0, 2.5, 1.5, 0.5]);
        let xy = welch_t_test(&x, &y, Alternative::TwoSided).unwrap();
        let yx = welch_t_test(&y, &x, Alternative::TwoSided).unwrap();

        assert!(xy.statistic() >= 0.0);
        assert_eq!(xy.statistic(), yx.statistic());
        assert_approx_eq!(xy.pvalue(), yx.pvalue(), 1e-15);
        assert_approx_eq!(xy.df(), yx.df(), 1e-12);
    }

    #[test]
    fn one_sided_alternatives() {
        let x = moments(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let y = moments(&[2.0, 4.0, 6.0, 8.0, 10.0]);
        let two_sided = welch_t_test(&x, &y, Alternative::TwoSided).unwrap();
        let less = welch_t_test(&x, &y, Alternative::Less).unwrap();
        let greater = welch_t_test(&x, &y, Alternative::Greater).unwrap();

        // mean_x < mean_y so the evidence is in the lower tail
        assert_approx_eq!(less.pvalue(), two_sided.pvalue() / 2.0, 1e-15);
        assert_approx_eq!(less.pvalue() + greater.pvalue(), 1.0, 1e-15);
        assert_eq!(less.statistic(), greater.statistic());
    }

    #[test]
    fn degenerate_samples_have_no_result() {
        let empty = Moments::new();
        let single = moments(&[1.0]);
        let constant = moments(&[2.0, 2.0, 2.0]);
        let regular = moments(&[1.0, 2.0, 4.0]);

        for alternative in [Alternative::TwoSided, Alternative::Less, Alternative::Greater] {
            assert!(welch_t_test(&empty, &regular, alternative).is_none());
            assert!(welch_t_test(&regular, &empty, alternative).is_none());
            assert!(welch_t_test(&single, &regular, alternative).is_none());
            assert!(welch_t_test(&constant, &regular, alternative).is_none());
            assert!(welch_t_test(&regular, &constant, alternative).is_none());
        }
    }

    #[test]
    fn foreign_partial_with_single_count_has_no_result() {
        let forged = Moments::from_parts(1, 4.0, 2.0);
        let regular = moments(&[1.0, 2.0, 4.0]);
        assert!(welch_t_test(&forged, &regular, Alternative::TwoSided).is_none());
    }

    #[test]
    fn negative_variance_from_rounding_has_no_result() {
        let rounded = Moments::from_parts(4, 3.0, -1.0e-18);
        let regular = moments(&[1.0, 2.0, 4.0]);
        assert!(welch_t_test(&rounded, &regular, Alternative::TwoSided).is_none());
        assert!(welch_t_test(&regular, &rounded, Alternative::Less).is_none());
    }

    #[test]
    fn non_finite_input_propagates_nan() {
        let x = moments(&[1.0, f64::NAN, 3.0]);
        let y = moments(&[1.0, 2.0, 4.0]);
        let result = welch_t_test(&x, &y, Alternative::TwoSided).unwrap();
        assert!(result.statistic().is_nan());
        assert!(result.pvalue().is_nan());
    }

    #[test]
    fn identical_means_give_pvalue_of_one() {
        let x = moments(&[1.0, 2.0, 3.0]);
        let y = moments(&[0.0, 2.0, 4.0]);
        let result = welch_t_test(&x, &y, Alternative::TwoSided).unwrap();
        assert_eq!(result.statistic(), 0.0);
        assert_approx_eq!(result.pvalue(), 1.0, 1e-15);
    }
}

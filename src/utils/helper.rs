use num_traits::{Float, ToPrimitive};

/// Converts a primitive number into the working float type
///
/// Every float type this crate is instantiated with can represent the counts and
/// constants it converts, so a failed cast only happens for exotic `Float` impls.
/// Such a failure yields NaN, which then propagates through the arithmetic the
/// same way a non-finite input would.
///
/// # Arguments
///
/// * `value` - The primitive number to convert
///
/// # Returns
///
/// * `T` - The converted value, or NaN if it is not representable
#[inline]
pub fn cast<T: Float, N: ToPrimitive>(value: N) -> T {
    T::from(value).unwrap_or_else(T::nan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_converts_counts() {
        let n: f64 = cast(42_u64);
        assert_eq!(n, 42.0);
        let half: f32 = cast(0.5_f64);
        assert_eq!(half, 0.5);
    }
}

use ahash::RandomState;
use hashbrown::HashMap;
use num_traits::Float;

use core::hash::Hash;

use crate::ValueMap;

/// Multiplies every value of a mapping by a factor
///
/// Null markers stay null. When either the mapping or the factor is absent the
/// result is an empty mapping.
///
/// # Arguments
///
/// * `entries` - The key/value pairs to scale, or `None` for a null mapping
/// * `factor` - The scale factor, or `None` for a null factor
///
/// # Returns
///
/// * `ValueMap<K, T>` - The scaled mapping
///
/// # Examples
///
/// ```
/// use udaf_statistics::scale_map;
///
/// let scaled = scale_map(Some([("a", Some(2.0)), ("b", None)]), Some(1.5));
/// assert_eq!(scaled.get("a"), Some(&Some(3.0)));
/// assert_eq!(scaled.get("b"), Some(&None));
///
/// assert!(scale_map(Some([("a", Some(2.0))]), None).is_empty());
/// ```
pub fn scale_map<K, T, I>(entries: Option<I>, factor: Option<T>) -> ValueMap<K, T>
where
    K: Eq + Hash,
    T: Float,
    I: IntoIterator<Item = (K, Option<T>)>,
{
    match (entries, factor) {
        (Some(entries), Some(factor)) => entries
            .into_iter()
            .map(|(key, value)| (key, value.map(|v| v * factor)))
            .collect(),
        _ => HashMap::with_hasher(RandomState::default()),
    }
}

//! Fallback resolution of vendor-specific sensor names.
//!
//! Sensor naming differs between vendors and firmware, so lookups walk an
//! ordered list of acceptable names and take the first live match.

use std::collections::BTreeMap;

/// A named reading that may or may not currently carry a value.
pub trait NamedReading {
    /// Returns the sensor name or label.
    fn name(&self) -> &str;

    /// Returns the current value, if the sensor reported one.
    fn value(&self) -> Option<f64>;
}

/// Returns the first live reading whose name starts with one of `prefixes`.
///
/// Prefixes are tried in priority order; within a prefix, enumeration order
/// decides.
pub fn first_by_prefix<'a, R, I>(readings: I, prefixes: &[&str]) -> Option<&'a R>
where
    R: NamedReading + 'a,
    I: IntoIterator<Item = &'a R>,
    I::IntoIter: Clone,
{
    let readings = readings.into_iter();
    prefixes.iter().find_map(|prefix| {
        readings
            .clone()
            .find(|r| r.value().is_some() && r.name().starts_with(prefix))
    })
}

/// Returns the first chip in `chain` present in `table`, with its name.
pub fn first_chip<'a, T>(
    table: &'a BTreeMap<String, T>,
    chain: &[&'a str],
) -> Option<(&'a str, &'a T)> {
    chain
        .iter()
        .find_map(|chip| table.get(*chip).map(|entry| (*chip, entry)))
}

use indexmap::IndexMap;
use mlexp_core::ExpError;

use crate::configuration::Configuration;
use crate::property::PropertySet;

/// Expands a property set into the Cartesian product of its domains.
///
/// Properties vary in insertion order with the first property as the slowest
/// moving axis. Fails with [`ExpError::InvalidPropertySet`] on an empty set
/// and with [`ExpError::UnsupportedValueType`] on a NaN or infinite real.
/// Calling again, or cloning the iterator before use, restarts generation.
pub fn generate(properties: &PropertySet) -> Result<Configurations<'_>, ExpError> {
    properties.validate()?;
    let remaining = properties
        .iter()
        .try_fold(1usize, |acc, (_, domain)| acc.checked_mul(domain.len()))
        .unwrap_or(usize::MAX);
    Ok(Configurations {
        properties,
        cursor: vec![0; properties.len()],
        remaining,
    })
}

/// Lazy odometer over the configurations of a [`PropertySet`].
#[derive(Debug, Clone)]
pub struct Configurations<'a> {
    properties: &'a PropertySet,
    cursor: Vec<usize>,
    remaining: usize,
}

impl Configurations<'_> {
    fn current(&self) -> Configuration {
        let values: IndexMap<_, _> = self
            .properties
            .iter()
            .zip(&self.cursor)
            .filter_map(|((key, domain), &idx)| {
                domain.get_index(idx).map(|value| (key.clone(), value.clone()))
            })
            .collect();
        Configuration { id: None, values }
    }

    fn advance(&mut self) {
        for (slot, (_, domain)) in self
            .cursor
            .iter_mut()
            .zip(self.properties.iter())
            .rev()
        {
            *slot += 1;
            if *slot < domain.len() {
                return;
            }
            *slot = 0;
        }
    }
}

impl Iterator for Configurations<'_> {
    type Item = Configuration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let configuration = self.current();
        self.remaining -= 1;
        self.advance();
        Some(configuration)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Configurations<'_> {}

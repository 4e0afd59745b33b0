//! Named counters (entities spawned, commands applied, events dispatched, ...)

use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct Counter {
    counters: BTreeMap<String, usize>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, value: usize) {
        match self.counters.get_mut(name) {
            Some(total) => *total += value,
            None => {
                self.counters.insert(name.to_string(), value);
            }
        }
    }

    pub fn get(&self, name: &str) -> usize {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn reset_all(&mut self) {
        self.counters.clear();
    }

    /// Name-sorted copy of every counter.
    pub fn snapshot(&self) -> Vec<(String, usize)> {
        self.counters
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect()
    }
}

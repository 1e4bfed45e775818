//! Evaluation cache
//!
//! Computed values keyed by cell. An entry is written once and stays until
//! the whole cache is cleared; any change to an input invalidates everything.

use std::fmt;

use ahash::AHashMap;
use gridcalc_core::CellAddress;

use crate::error::{FormulaError, FormulaResult};
use crate::value::FormulaValue;

/// Identifies a cell within a workbook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    /// Sheet index
    pub sheet: usize,
    pub row: u32,
    pub col: u16,
}

impl CellKey {
    pub fn new(sheet: usize, row: u32, col: u16) -> Self {
        Self { sheet, row, col }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sheet {} {}", self.sheet, CellAddress::new(self.row, self.col))
    }
}

/// Per-evaluator map from cell to computed value
///
/// Mutation takes `&mut self`; share across threads only behind a lock.
#[derive(Debug, Default)]
pub struct EvaluationCache {
    entries: AHashMap<CellKey, FormulaValue>,
}

impl EvaluationCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached value
    pub fn get(&self, key: &CellKey) -> Option<&FormulaValue> {
        let hit = self.entries.get(key);
        log::trace!("cache {} for {}", if hit.is_some() { "hit" } else { "miss" }, key);
        hit
    }

    /// Store a value. Storing a second value for the same key is a bug in
    /// the caller and fails with [`FormulaError::CacheConflict`].
    pub fn set(&mut self, key: CellKey, value: FormulaValue) -> FormulaResult<()> {
        if self.entries.contains_key(&key) {
            return Err(FormulaError::CacheConflict(key));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            log::debug!("clearing {} cached values", self.entries.len());
        }
        self.entries.clear();
    }

    pub fn contains(&self, key: &CellKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_and_get() {
        let mut cache = EvaluationCache::new();
        let key = CellKey::new(0, 1, 0);
        assert!(cache.get(&key).is_none());

        cache.set(key, FormulaValue::Number(5.0)).unwrap();
        assert_eq!(cache.get(&key), Some(&FormulaValue::Number(5.0)));
        assert!(cache.contains(&key));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_double_set_conflicts() {
        let mut cache = EvaluationCache::new();
        let key = CellKey::new(2, 0, 3);
        cache.set(key, FormulaValue::Boolean(true)).unwrap();

        let err = cache.set(key, FormulaValue::Boolean(false)).unwrap_err();
        assert!(matches!(err, FormulaError::CacheConflict(k) if k == key));
        assert_eq!(cache.get(&key), Some(&FormulaValue::Boolean(true)));
    }

    #[test]
    fn test_clear() {
        let mut cache = EvaluationCache::new();
        let key = CellKey::new(0, 0, 0);
        cache.set(key, FormulaValue::Blank).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&key).is_none());
        cache.set(key, FormulaValue::Number(1.0)).unwrap();
    }

    #[test]
    fn test_key_display() {
        assert_eq!(CellKey::new(1, 4, 2).to_string(), "sheet 1 C5");
    }
}

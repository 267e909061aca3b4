//! Thread-safe cache of precomputed convolution tables.
//!
//! Twiddle factors and bit-reversal indices depend only on the transform size,
//! so kernels of equal precision share one copy through an [`Arc`].

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::debug;

/// Twiddles and bit-reversal permutation for one transform size.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvolutionTables {
    /// Real transform length (a power of two).
    pub size: usize,
    /// `exp(-2*pi*i*k/size)` for `k < size/2`, interleaved as `re, im`.
    pub twiddles: Vec<f64>,
    /// Bit-reversal of `k` over `log2(size/2)` bits, for `k < size/2`.
    pub bit_reverse: Vec<usize>,
}

impl ConvolutionTables {
    /// Compute the tables for a power-of-two `size >= 4`.
    ///
    /// Callers validate the size; [`crate::Convolution::new`] does so before
    /// reaching the cache.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build(size: usize) -> Self {
        let half = size / 2;
        let mut twiddles = Vec::with_capacity(size);
        for k in 0..half {
            let angle = -2.0 * PI * (k as f64) / (size as f64);
            let (s, c) = angle.sin_cos();
            twiddles.push(c);
            twiddles.push(s);
        }
        let bits = half.trailing_zeros();
        let bit_reverse = (0..half)
            .map(|k| if bits == 0 { 0 } else { k.reverse_bits() >> (usize::BITS - bits) })
            .collect();
        Self {
            size,
            twiddles,
            bit_reverse,
        }
    }
}

/// Size-keyed cache of shared tables.
pub struct TableCache {
    tables: Mutex<HashMap<usize, Arc<ConvolutionTables>>>,
    max_entries: usize,
}

impl TableCache {
    /// Create a cache holding at most `max_entries` sizes.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            max_entries,
        }
    }

    /// Get cached tables for `size`, if available.
    pub fn get(&self, size: usize) -> Option<Arc<ConvolutionTables>> {
        self.tables.lock().get(&size).cloned()
    }

    /// Store tables under their size.
    pub fn put(&self, tables: Arc<ConvolutionTables>) {
        let mut map = self.tables.lock();
        if map.len() >= self.max_entries && !map.contains_key(&tables.size) {
            // Simple eviction: clear all
            map.clear();
        }
        map.insert(tables.size, tables);
    }

    /// Get the tables for `size`, building and caching them on a miss.
    pub fn get_or_build(&self, size: usize) -> Arc<ConvolutionTables> {
        if let Some(tables) = self.get(size) {
            return tables;
        }
        debug!(size, "building convolution tables");
        let tables = Arc::new(ConvolutionTables::build(size));
        self.put(Arc::clone(&tables));
        tables
    }

    /// Number of cached sizes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.lock().len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.lock().is_empty()
    }

    /// Drop every cached table. Engines keep their own `Arc`.
    pub fn clear(&self) {
        self.tables.lock().clear();
    }
}

impl Default for TableCache {
    fn default() -> Self {
        Self::new(16)
    }
}

/// Process-wide cache used by [`crate::Convolution::new`].
pub fn shared() -> &'static TableCache {
    static CACHE: OnceLock<TableCache> = OnceLock::new();
    CACHE.get_or_init(TableCache::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_for_size_8() {
        let t = ConvolutionTables::build(8);
        assert_eq!(t.twiddles.len(), 8);
        assert_eq!(t.bit_reverse, vec![0, 2, 1, 3]);
        // k = 0 -> 1, k = 2 -> -i
        assert!((t.twiddles[0] - 1.0).abs() < 1e-15);
        assert!(t.twiddles[1].abs() < 1e-15);
        assert!(t.twiddles[4].abs() < 1e-15);
        assert!((t.twiddles[5] + 1.0).abs() < 1e-15);
    }

    #[test]
    fn bit_reverse_is_involution() {
        let t = ConvolutionTables::build(256);
        for (k, &r) in t.bit_reverse.iter().enumerate() {
            assert_eq!(t.bit_reverse[r], k);
        }
    }

    #[test]
    fn cache_get_or_build_shares() {
        let cache = TableCache::new(4);
        let a = cache.get_or_build(64);
        let b = cache.get_or_build(64);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_miss() {
        let cache = TableCache::new(4);
        assert!(cache.get(32).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_eviction() {
        let cache = TableCache::new(2);
        for size in [16, 32, 64] {
            cache.get_or_build(size);
        }
        assert!(cache.len() <= 2);
        assert!(cache.get(64).is_some());
    }

    #[test]
    fn cache_clear_keeps_outstanding_arcs() {
        let cache = TableCache::default();
        let t = cache.get_or_build(16);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(t.size, 16);
    }

    #[test]
    fn shared_cache_is_global() {
        let a = shared().get_or_build(128);
        let b = shared().get_or_build(128);
        assert!(Arc::ptr_eq(&a, &b));
    }
}

//! Bounded per-body memo of positions keyed by exact ephemeris time

use log::debug;
use nalgebra::Vector3;
use std::collections::{HashMap, VecDeque};

/// FIFO cache of parentocentric positions.
///
/// Keys are the bit pattern of the JDE, so a lookup only ever hits for the
/// very same instant.
#[derive(Debug, Clone)]
pub struct PositionCache {
    capacity: usize,
    entries: HashMap<u64, Vector3<f64>>,
    order: VecDeque<u64>,
}

impl PositionCache {
    pub const DEFAULT_CAPACITY: usize = 64;
    /// Largest capacity accepted from configuration
    pub const MAX_CAPACITY: usize = 1 << 16;

    /// Storage is reserved up to the default size and grows on demand after
    pub fn new(capacity: usize) -> Self {
        let reserve = capacity.min(Self::DEFAULT_CAPACITY);
        Self {
            capacity,
            entries: HashMap::with_capacity(reserve),
            order: VecDeque::with_capacity(reserve),
        }
    }

    fn key(jde: f64) -> Option<u64> {
        if jde.is_nan() {
            None
        } else if jde == 0.0 {
            // +0 and -0 are the same instant
            Some(0.0f64.to_bits())
        } else {
            Some(jde.to_bits())
        }
    }

    pub fn get(&self, jde: f64) -> Option<Vector3<f64>> {
        Self::key(jde).and_then(|k| self.entries.get(&k).copied())
    }

    pub fn store(&mut self, jde: f64, position: Vector3<f64>) {
        let Some(key) = Self::key(jde) else {
            return;
        };
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key, position).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                debug!("position cache evicted JDE {}", f64::from_bits(oldest));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

impl Default for PositionCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_only_for_same_time() {
        let mut cache = PositionCache::new(4);
        cache.store(2_451_545.0, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(cache.get(2_451_545.0), Some(Vector3::new(1.0, 0.0, 0.0)));
        assert_eq!(cache.get(2_451_545.000_000_1), None);
    }

    #[test]
    fn test_oldest_evicted_first() {
        let mut cache = PositionCache::new(2);
        cache.store(1.0, Vector3::x());
        cache.store(2.0, Vector3::y());
        cache.store(3.0, Vector3::z());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(1.0), None);
        assert_eq!(cache.get(2.0), Some(Vector3::y()));
        assert_eq!(cache.get(3.0), Some(Vector3::z()));
    }

    #[test]
    fn test_signed_zero_and_nan() {
        let mut cache = PositionCache::new(2);
        cache.store(-0.0, Vector3::x());
        assert_eq!(cache.get(0.0), Some(Vector3::x()));
        cache.store(f64::NAN, Vector3::y());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(f64::NAN), None);
    }

    #[test]
    fn test_huge_capacity_reserves_lazily() {
        let mut cache = PositionCache::new(usize::MAX);
        assert_eq!(cache.capacity(), usize::MAX);
        for i in 0..100 {
            cache.store(i as f64, Vector3::x());
        }
        assert_eq!(cache.len(), 100);
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut cache = PositionCache::new(0);
        cache.store(1.0, Vector3::x());
        assert!(cache.is_empty());
    }
}

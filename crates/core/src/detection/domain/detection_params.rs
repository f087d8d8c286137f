use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::shared::constants::{DEFAULT_MIN_NEIGHBORS, DEFAULT_MIN_SIZE, DEFAULT_SCALE_FACTOR};

/// The three tunable scalars that control detection sensitivity and the
/// smallest face size considered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionParameters {
    /// Pyramid step between detection scales. Must be greater than 1.0.
    pub scale_factor: f64,
    /// Sensitivity threshold; higher values keep fewer, stronger hits.
    pub min_neighbors: u32,
    /// Minimum face width and height in pixels.
    pub min_size: u32,
}

impl Default for DetectionParameters {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            min_size: DEFAULT_MIN_SIZE,
        }
    }
}

impl DetectionParameters {
    pub fn is_valid_scale_factor(value: f64) -> bool {
        value.is_finite() && value > 1.0
    }

    pub fn is_valid(&self) -> bool {
        Self::is_valid_scale_factor(self.scale_factor)
    }
}

/// Detection parameters shared between the UI and the pipeline worker.
///
/// Each field is its own atomic: readers see the latest value of every
/// field, writers never block, and there is no cross-field consistency.
#[derive(Debug)]
pub struct SharedParameters {
    scale_factor: AtomicU64,
    min_neighbors: AtomicU32,
    min_size: AtomicU32,
}

impl SharedParameters {
    pub fn new(params: DetectionParameters) -> Self {
        Self {
            scale_factor: AtomicU64::new(params.scale_factor.to_bits()),
            min_neighbors: AtomicU32::new(params.min_neighbors),
            min_size: AtomicU32::new(params.min_size),
        }
    }

    pub fn snapshot(&self) -> DetectionParameters {
        DetectionParameters {
            scale_factor: f64::from_bits(self.scale_factor.load(Ordering::Relaxed)),
            min_neighbors: self.min_neighbors.load(Ordering::Relaxed),
            min_size: self.min_size.load(Ordering::Relaxed),
        }
    }

    pub fn set_scale_factor(&self, value: f64) {
        self.scale_factor.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn set_min_neighbors(&self, value: u32) {
        self.min_neighbors.store(value, Ordering::Relaxed);
    }

    pub fn set_min_size(&self, value: u32) {
        self.min_size.store(value, Ordering::Relaxed);
    }

    pub fn replace(&self, params: DetectionParameters) {
        self.set_scale_factor(params.scale_factor);
        self.set_min_neighbors(params.min_neighbors);
        self.set_min_size(params.min_size);
    }
}

impl Default for SharedParameters {
    fn default() -> Self {
        Self::new(DetectionParameters::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_defaults() {
        let p = DetectionParameters::default();
        assert_relative_eq!(p.scale_factor, 1.1);
        assert_eq!(p.min_neighbors, 5);
        assert_eq!(p.min_size, 30);
        assert!(p.is_valid());
    }

    #[rstest]
    #[case(1.01, true)]
    #[case(2.0, true)]
    #[case(1.0, false)]
    #[case(0.5, false)]
    #[case(f64::NAN, false)]
    #[case(f64::INFINITY, false)]
    fn test_scale_factor_validity(#[case] value: f64, #[case] valid: bool) {
        assert_eq!(DetectionParameters::is_valid_scale_factor(value), valid);
    }

    #[test]
    fn test_shared_snapshot_reflects_each_setter() {
        let shared = SharedParameters::default();
        shared.set_scale_factor(1.25);
        shared.set_min_neighbors(10);
        shared.set_min_size(48);
        let snap = shared.snapshot();
        assert_relative_eq!(snap.scale_factor, 1.25);
        assert_eq!(snap.min_neighbors, 10);
        assert_eq!(snap.min_size, 48);
    }

    #[test]
    fn test_shared_replace() {
        let shared = SharedParameters::default();
        let params = DetectionParameters {
            scale_factor: 1.3,
            min_neighbors: 2,
            min_size: 60,
        };
        shared.replace(params);
        assert_eq!(shared.snapshot(), params);
    }

    #[test]
    fn test_write_from_other_thread_is_visible() {
        let shared = Arc::new(SharedParameters::default());
        let writer = shared.clone();
        thread::spawn(move || writer.set_min_neighbors(10))
            .join()
            .unwrap();
        assert_eq!(shared.snapshot().min_neighbors, 10);
    }
}

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use facefinder_core::detection::domain::face_detector::FaceDetector;
use facefinder_core::detection::infrastructure::rustface_detector::RustfaceDetector;
use facefinder_core::shared::constants::{SEETA_MODEL_NAME, SEETA_MODEL_URL};
use facefinder_core::shared::model_resolver::{self, ProgressFn};

type LoadResult = Result<Arc<dyn FaceDetector>, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelStatus {
    Loading { downloaded: u64, total: u64 },
    Ready,
    Failed(String),
}

/// Resolves and loads the face detector on a background thread at startup.
/// The UI polls [`DetectorCache::status`] and picks the detector up once ready.
pub struct DetectorCache {
    slot: Arc<Slot>,
}

#[derive(Default)]
struct Slot {
    result: Mutex<Option<LoadResult>>,
    progress: Mutex<(u64, u64)>,
}

impl DetectorCache {
    pub fn new() -> Self {
        Self::spawn(load_seeta_detector)
    }

    /// Runs `loader` on a new thread; the loader reports download progress
    /// through the callback it is given.
    pub fn spawn<F>(loader: F) -> Self
    where
        F: FnOnce(ProgressFn) -> LoadResult + Send + 'static,
    {
        let slot = Arc::new(Slot::default());
        let worker_slot = Arc::clone(&slot);
        thread::spawn(move || {
            let progress_slot = Arc::clone(&worker_slot);
            let result = loader(Box::new(move |downloaded, total| {
                *lock(&progress_slot.progress) = (downloaded, total);
            }));
            if let Err(ref e) = result {
                log::error!("Face detector unavailable: {e}");
            }
            *lock(&worker_slot.result) = Some(result);
        });
        Self { slot }
    }

    pub fn detector(&self) -> Option<Arc<dyn FaceDetector>> {
        match &*lock(&self.slot.result) {
            Some(Ok(detector)) => Some(Arc::clone(detector)),
            _ => None,
        }
    }

    pub fn status(&self) -> ModelStatus {
        match &*lock(&self.slot.result) {
            Some(Ok(_)) => ModelStatus::Ready,
            Some(Err(e)) => ModelStatus::Failed(e.clone()),
            None => {
                let (downloaded, total) = *lock(&self.slot.progress);
                ModelStatus::Loading { downloaded, total }
            }
        }
    }
}

fn load_seeta_detector(progress: ProgressFn) -> LoadResult {
    let path = model_resolver::resolve(SEETA_MODEL_NAME, SEETA_MODEL_URL, None, Some(progress))
        .map_err(|e| e.to_string())?;
    let detector = RustfaceDetector::from_path(&path).map_err(|e| e.to_string())?;
    Ok(Arc::new(detector))
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

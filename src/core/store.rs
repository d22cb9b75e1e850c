//! # Session Image Store
//!
//! Uploaded pictures live here, decoded, under short-lived [`ImageId`]s, so a
//! browser can ask for progressively smaller versions without re-uploading.
//!
//! ## Overview
//!
//! - **Bounded**: at most `max_images` entries. Inserting into a full store
//!   evicts exactly one entry first, so `len() <= capacity()` holds before
//!   and after every [`SessionImageStore::put`].
//! - **Deterministic eviction**: entries leave in insertion order (oldest
//!   first). Nothing outside the store depends on which entry goes.
//! - **No ID reuse**: IDs of evicted entries are remembered (up to
//!   [`RETIRED_ID_MEMORY`] of them) and never handed out again, so a stale
//!   link fails with `NotFound` instead of showing someone else's picture.
//! - **Thread-safe**: one mutex guards the map, the eviction queue and the
//!   capacity check. Every put (evict + generate ID + insert) is a single
//!   critical section.
//!
//! ## Ownership
//!
//! The store holds the only long-lived handle to each image. `get` hands out
//! an `Arc` for the duration of one request; once an entry is evicted and the
//! last in-flight request finishes, the pixels are freed.
//!
//! ## Example
//!
//! ```rust
//! use pixel_guess::core::SessionImageStore;
//! use image::RgbaImage;
//!
//! let store = SessionImageStore::new(2);
//! let a = store.put(RgbaImage::new(4, 4));
//! let b = store.put(RgbaImage::new(8, 8));
//! let c = store.put(RgbaImage::new(2, 2)); // evicts `a`
//!
//! assert_eq!(store.len(), 2);
//! assert!(store.get(a.as_str()).is_err());
//! assert_eq!(store.get(b.as_str()).unwrap().width(), 8);
//! assert_eq!(store.get(c.as_str()).unwrap().width(), 2);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::RgbaImage;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info};

use super::image_id::ImageId;
use crate::error::{GuessError, GuessResult};

/// How many evicted IDs are remembered to keep them from being reissued.
pub const RETIRED_ID_MEMORY: usize = 4096;

/// Point-in-time view of the store, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub entries: usize,
    pub capacity: usize,
    /// Raw pixel bytes held by live entries.
    pub bytes: usize,
}

impl StoreStats {
    pub fn mebibytes(&self) -> usize {
        self.bytes / 1024 / 1024
    }
}

/// Bounded, thread-safe map from [`ImageId`] to decoded image.
pub struct SessionImageStore {
    inner: Mutex<StoreInner>,
    max_images: usize,
}

struct StoreInner {
    images: HashMap<ImageId, Arc<RgbaImage>>,
    /// Live IDs, oldest at the front.
    order: VecDeque<ImageId>,
    retired: HashSet<ImageId>,
    retired_order: VecDeque<ImageId>,
    bytes: usize,
    rng: Box<dyn RngCore + Send>,
}

impl SessionImageStore {
    /// Creates a store holding at most `max_images` entries (minimum 1).
    pub fn new(max_images: usize) -> Self {
        Self::with_rng(max_images, StdRng::from_os_rng())
    }

    /// Creates a store drawing IDs from the given random source.
    pub fn with_rng(max_images: usize, rng: impl RngCore + Send + 'static) -> Self {
        let max_images = max_images.max(1);
        Self {
            inner: Mutex::new(StoreInner {
                images: HashMap::with_capacity(max_images),
                order: VecDeque::with_capacity(max_images),
                retired: HashSet::new(),
                retired_order: VecDeque::new(),
                bytes: 0,
                rng: Box::new(rng),
            }),
            max_images,
        }
    }

    /// Stores `img` and returns its new ID, evicting the oldest entry first
    /// if the store is full. Never fails.
    pub fn put(&self, img: RgbaImage) -> ImageId {
        let (id, evicted, stats) = {
            let mut inner = self.lock();

            let mut evicted = Vec::new();
            while inner.images.len() >= self.max_images {
                match inner.evict_oldest() {
                    Some(old) => evicted.push(old),
                    None => break,
                }
            }

            let id = inner.fresh_id();
            inner.bytes += img.as_raw().len();
            inner.images.insert(id.clone(), Arc::new(img));
            inner.order.push_back(id.clone());

            (id, evicted, inner.stats(self.max_images))
        };

        for old in &evicted {
            info!(image_id = %old, "Deleting stored image");
        }
        info!(image_id = %id, "Storing image");
        info!(
            entries = stats.entries,
            capacity = stats.capacity,
            mib = stats.mebibytes(),
            "Session store usage"
        );
        id
    }

    /// Looks up a live entry.
    ///
    /// # Errors
    /// [`GuessError::NotFound`] if the ID was never issued or has been evicted.
    pub fn get(&self, id: &str) -> GuessResult<Arc<RgbaImage>> {
        let found = self.lock().images.get(id).cloned();
        match found {
            Some(img) => {
                debug!(image_id = id, "Found stored image");
                Ok(img)
            }
            None => {
                info!(image_id = id, "Could not find stored image");
                Err(GuessError::not_found(id))
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().images.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.max_images
    }

    pub fn stats(&self) -> StoreStats {
        self.lock().stats(self.max_images)
    }

    // Critical sections never panic halfway through an update, so a poisoned
    // lock still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StoreInner {
    fn evict_oldest(&mut self) -> Option<ImageId> {
        let id = self.order.pop_front()?;
        if let Some(img) = self.images.remove(&id) {
            self.bytes -= img.as_raw().len();
        }
        self.retire(id.clone());
        Some(id)
    }

    fn retire(&mut self, id: ImageId) {
        if self.retired_order.len() >= RETIRED_ID_MEMORY {
            if let Some(forgotten) = self.retired_order.pop_front() {
                self.retired.remove(&forgotten);
            }
        }
        self.retired.insert(id.clone());
        self.retired_order.push_back(id);
    }

    /// Draws IDs until one is neither live nor recently retired.
    fn fresh_id(&mut self) -> ImageId {
        loop {
            let candidate = ImageId::random(&mut *self.rng);
            if !self.images.contains_key(&candidate) && !self.retired.contains(&candidate) {
                return candidate;
            }
            debug!(image_id = %candidate, "Image ID collision, drawing again");
        }
    }

    fn stats(&self, capacity: usize) -> StoreStats {
        StoreStats {
            entries: self.images.len(),
            capacity,
            bytes: self.bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, shade: u8) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([shade, shade, shade, 255]))
    }

    /// Replays a fixed cycle of words. Two leading runs of zeros make the
    /// first two ID draws identical.
    struct CyclingRng {
        words: Vec<u64>,
        pos: usize,
    }

    impl CyclingRng {
        fn colliding() -> Self {
            let mut words = vec![0; 8];
            words.extend([
                0x9E37_79B9_7F4A_7C15,
                0x3C6E_F372_FE94_F82A,
                0xDAA6_6D2C_7DDF_743F,
                0x78DD_E6E5_FD29_F054,
            ]);
            Self { words, pos: 0 }
        }
    }

    impl RngCore for CyclingRng {
        fn next_u32(&mut self) -> u32 {
            (self.next_u64() >> 32) as u32
        }

        fn next_u64(&mut self) -> u64 {
            let word = self.words[self.pos % self.words.len()];
            self.pos += 1;
            word
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            for chunk in dst.chunks_mut(8) {
                let bytes = self.next_u64().to_le_bytes();
                chunk.copy_from_slice(&bytes[..chunk.len()]);
            }
        }
    }

    #[test]
    fn test_put_and_get_below_capacity() {
        let store = SessionImageStore::new(5);
        let ids: Vec<_> = (0..5).map(|i| store.put(solid(3, 2, i * 10))).collect();

        assert_eq!(store.len(), 5);
        for (i, id) in ids.iter().enumerate() {
            let img = store.get(id.as_str()).unwrap();
            assert_eq!(*img, solid(3, 2, i as u8 * 10));
        }
    }

    #[test]
    fn test_eviction_is_oldest_first() {
        let store = SessionImageStore::new(3);
        let ids: Vec<_> = (0..5).map(|i| store.put(solid(1, 1, i))).collect();

        assert_eq!(store.len(), 3);
        assert!(store.get(ids[0].as_str()).is_err());
        assert!(store.get(ids[1].as_str()).is_err());
        for id in &ids[2..] {
            assert!(store.contains(id.as_str()));
        }
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let store = SessionImageStore::new(2);
        store.put(solid(1, 1, 0));
        let err = store.get("doesnotexist").unwrap_err();
        assert_eq!(err.category(), "not_found");
    }

    #[test]
    fn test_colliding_ids_are_redrawn() {
        let store = SessionImageStore::with_rng(4, CyclingRng::colliding());
        let a = store.put(solid(1, 1, 1));
        let b = store.put(solid(1, 1, 2));
        assert_ne!(a, b);
        assert_eq!(store.get(a.as_str()).unwrap().get_pixel(0, 0)[0], 1);
        assert_eq!(store.get(b.as_str()).unwrap().get_pixel(0, 0)[0], 2);
    }

    #[test]
    fn test_evicted_ids_are_not_reissued() {
        // The second draw repeats the first, so the evicted ID would come
        // straight back without the retired set.
        let store = SessionImageStore::with_rng(1, CyclingRng::colliding());
        let first = store.put(solid(1, 1, 1));
        let second = store.put(solid(1, 1, 2));
        assert_ne!(first, second);
        assert!(store.get(first.as_str()).is_err());
    }

    #[test]
    fn test_stats_track_pixel_bytes() {
        let store = SessionImageStore::new(2);
        store.put(solid(10, 10, 0));
        store.put(solid(20, 10, 0));
        assert_eq!(store.stats().bytes, (100 + 200) * 4);

        store.put(solid(5, 5, 0)); // evicts the 10x10
        let stats = store.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.capacity, 2);
        assert_eq!(stats.bytes, (200 + 25) * 4);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let store = SessionImageStore::new(0);
        assert_eq!(store.capacity(), 1);
        let id = store.put(solid(1, 1, 0));
        assert!(store.contains(id.as_str()));
    }
}

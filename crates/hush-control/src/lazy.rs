// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Lazy map and image loading coordination.

use std::collections::HashSet;

use hush_core::{MapDataStore, MapId, SpriteId, SpriteRefresher};

use crate::guard::guarded;

/// Releases the previous map's data when a different map starts loading.
pub struct LazyMapTracker {
    store: Box<dyn MapDataStore>,
    last_map: Option<MapId>,
}

impl LazyMapTracker {
    /// Creates a tracker releasing data through `store`.
    pub fn new(store: Box<dyn MapDataStore>) -> Self {
        Self {
            store,
            last_map: None,
        }
    }

    /// Handles a map load. Returns true if the previous map was released.
    pub fn on_map_loading(&mut self, map_id: MapId) -> bool {
        let previous = self.last_map.replace(map_id);
        let Some(previous) = previous.filter(|prev| *prev != map_id) else {
            return false;
        };

        let store = &mut self.store;
        match guarded(|| store.release_map(previous)) {
            Ok(Ok(())) => {
                log::debug!("Released data for map {}", previous.0);
                true
            }
            Ok(Err(e)) => {
                log::warn!("Failed to release map {}: {e:#}", previous.0);
                false
            }
            Err(message) => {
                log::warn!("Releasing map {} panicked: {message}", previous.0);
                false
            }
        }
    }

    /// The map most recently loaded.
    pub fn last_map(&self) -> Option<MapId> {
        self.last_map
    }
}

/// Sprites waiting for their bitmap to finish loading.
pub struct DeferredRefreshQueue {
    refresher: Box<dyn SpriteRefresher>,
    pending: HashSet<SpriteId>,
}

impl DeferredRefreshQueue {
    /// Creates an empty queue refreshing through `refresher`.
    pub fn new(refresher: Box<dyn SpriteRefresher>) -> Self {
        Self {
            refresher,
            pending: HashSet::new(),
        }
    }

    /// Queues `sprite` if its bitmap is not decoded yet.
    pub fn on_bitmap_assigned(&mut self, sprite: SpriteId, ready: bool) {
        if ready {
            self.pending.remove(&sprite);
        } else {
            self.pending.insert(sprite);
        }
    }

    /// Refreshes `sprite` once if it was waiting. Returns true if a refresh
    /// was issued.
    pub fn on_bitmap_loaded(&mut self, sprite: SpriteId) -> bool {
        if !self.pending.remove(&sprite) {
            return false;
        }

        let refresher = &mut self.refresher;
        match guarded(|| refresher.refresh(sprite)) {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                log::warn!("Failed to refresh sprite {}: {e:#}", sprite.0);
                false
            }
            Err(message) => {
                log::warn!("Refreshing sprite {} panicked: {message}", sprite.0);
                false
            }
        }
    }

    /// Drops `sprite` without refreshing it. Returns true if it was waiting.
    pub fn forget(&mut self, sprite: SpriteId) -> bool {
        self.pending.remove(&sprite)
    }

    /// Drops every waiting sprite, returning how many there were.
    ///
    /// Called when a scene is torn down, since its sprites go with it.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        if dropped > 0 {
            log::debug!("Dropped {dropped} pending sprite refreshes");
        }
        dropped
    }

    /// Number of sprites still waiting.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Released(Arc<Mutex<Vec<u32>>>);

    impl MapDataStore for Released {
        fn release_map(&mut self, map_id: MapId) -> Result<()> {
            self.0.lock().unwrap().push(map_id.0);
            if map_id.0 == 13 {
                bail!("map 13 is pinned");
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Refreshed(Arc<Mutex<Vec<u64>>>);

    impl SpriteRefresher for Refreshed {
        fn refresh(&mut self, sprite: SpriteId) -> Result<()> {
            self.0.lock().unwrap().push(sprite.0);
            Ok(())
        }
    }

    #[test]
    fn releases_previous_map_on_change() {
        let released = Released::default();
        let mut tracker = LazyMapTracker::new(Box::new(released.clone()));

        assert!(!tracker.on_map_loading(MapId(1)));
        assert!(!tracker.on_map_loading(MapId(1)));
        assert!(tracker.on_map_loading(MapId(2)));
        assert_eq!(tracker.last_map(), Some(MapId(2)));
        assert_eq!(*released.0.lock().unwrap(), vec![1]);
    }

    #[test]
    fn release_failure_is_contained() {
        let released = Released::default();
        let mut tracker = LazyMapTracker::new(Box::new(released.clone()));
        tracker.on_map_loading(MapId(13));
        assert!(!tracker.on_map_loading(MapId(14)));
        assert_eq!(tracker.last_map(), Some(MapId(14)));
    }

    #[test]
    fn refreshes_pending_sprites_once() {
        let refreshed = Refreshed::default();
        let mut queue = DeferredRefreshQueue::new(Box::new(refreshed.clone()));

        queue.on_bitmap_assigned(SpriteId(7), false);
        queue.on_bitmap_assigned(SpriteId(8), true);
        assert_eq!(queue.pending(), 1);

        assert!(queue.on_bitmap_loaded(SpriteId(7)));
        assert!(!queue.on_bitmap_loaded(SpriteId(7)));
        assert!(!queue.on_bitmap_loaded(SpriteId(8)));
        assert_eq!(*refreshed.0.lock().unwrap(), vec![7]);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn ready_reassignment_cancels_refresh() {
        let refreshed = Refreshed::default();
        let mut queue = DeferredRefreshQueue::new(Box::new(refreshed.clone()));
        queue.on_bitmap_assigned(SpriteId(3), false);
        queue.on_bitmap_assigned(SpriteId(3), true);
        assert!(!queue.on_bitmap_loaded(SpriteId(3)));
        assert!(refreshed.0.lock().unwrap().is_empty());
    }

    #[test]
    fn disposed_sprites_leave_the_queue() {
        let refreshed = Refreshed::default();
        let mut queue = DeferredRefreshQueue::new(Box::new(refreshed.clone()));
        queue.on_bitmap_assigned(SpriteId(1), false);
        queue.on_bitmap_assigned(SpriteId(2), false);
        queue.on_bitmap_assigned(SpriteId(3), false);

        assert!(queue.forget(SpriteId(1)));
        assert!(!queue.forget(SpriteId(1)));
        assert!(!queue.on_bitmap_loaded(SpriteId(1)));

        assert_eq!(queue.clear(), 2);
        assert_eq!(queue.pending(), 0);
        assert!(!queue.on_bitmap_loaded(SpriteId(2)));
        assert!(refreshed.0.lock().unwrap().is_empty());
    }
}

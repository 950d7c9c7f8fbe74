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

//! Rolling history of heap readings.

use std::sync::{Arc, Mutex};

use hush_core::MemoryInfo;

/// Number of heap readings kept by a [`HeapSampler`].
pub const HEAP_SAMPLE_WINDOW: usize = 64;

/// A fixed-size circular buffer for storing numerical samples.
#[derive(Debug, Clone)]
pub struct RingBuffer<T, const N: usize> {
    data: [T; N],
    index: usize,
    count: usize,
}

impl<T: Default + Copy, const N: usize> RingBuffer<T, N> {
    /// Creates a new, empty ring buffer.
    pub fn new() -> Self {
        Self {
            data: [T::default(); N],
            index: 0,
            count: 0,
        }
    }

    /// Pushes a new value, overwriting the oldest one when full.
    pub fn push(&mut self, value: T) {
        self.data[self.index] = value;
        self.index = (self.index + 1) % N;
        if self.count < N {
            self.count += 1;
        }
    }

    /// Number of values currently stored.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The most recently pushed value.
    pub fn latest(&self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        Some(self.data[(self.index + N - 1) % N])
    }

    /// Values from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (older, newer) = if self.count < N {
            (&self.data[..0], &self.data[..self.count])
        } else {
            let (head, tail) = self.data.split_at(self.index);
            (tail, head)
        };
        older.iter().chain(newer.iter())
    }
}

impl<T: Default + Copy, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<f64, N> {
    /// Arithmetic mean, or 0.0 when empty.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.iter().sum::<f64>() / self.count as f64
    }

    /// Difference between the mean of the newer half and the older half.
    /// Positive while usage is growing.
    pub fn trend(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        let half = self.count / 2;
        let older: f64 = self.iter().take(half).sum::<f64>() / half as f64;
        let newer: f64 = self.iter().skip(self.count - half).sum::<f64>() / half as f64;
        newer - older
    }

    /// Largest stored value, if any.
    pub fn max(&self) -> Option<f64> {
        self.iter().copied().reduce(f64::max)
    }
}

/// Shared, read-only view of the readings collected by a [`HeapSampler`].
#[derive(Debug, Clone, Default)]
pub struct HeapHistory {
    samples: Arc<Mutex<RingBuffer<f64, HEAP_SAMPLE_WINDOW>>>,
}

impl HeapHistory {
    fn record(&self, mb: f64) {
        if let Ok(mut samples) = self.samples.lock() {
            samples.push(mb);
        }
    }

    fn read<R>(&self, f: impl FnOnce(&RingBuffer<f64, HEAP_SAMPLE_WINDOW>) -> R) -> Option<R> {
        self.samples.lock().ok().map(|samples| f(&samples))
    }

    /// Number of readings in the window.
    pub fn sample_count(&self) -> usize {
        self.read(|s| s.count()).unwrap_or(0)
    }

    /// Latest reading in MB.
    pub fn latest_mb(&self) -> Option<f64> {
        self.read(|s| s.latest()).flatten()
    }

    /// Mean reading over the window in MB.
    pub fn average_mb(&self) -> f64 {
        self.read(|s| s.average()).unwrap_or(0.0)
    }

    /// Highest reading over the window in MB.
    pub fn peak_mb(&self) -> Option<f64> {
        self.read(|s| s.max()).flatten()
    }

    /// Growth between the older and newer half of the window in MB.
    pub fn trend_mb(&self) -> f64 {
        self.read(|s| s.trend()).unwrap_or(0.0)
    }
}

/// Wraps a [`MemoryInfo`] and remembers every reading it returns.
///
/// The sampler is handed to the controller; keep a [`HeapHistory`] from
/// [`HeapSampler::history`] to inspect the readings afterwards.
#[derive(Debug)]
pub struct HeapSampler<M> {
    inner: M,
    history: HeapHistory,
}

impl<M: MemoryInfo> HeapSampler<M> {
    /// Wraps `inner`.
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            history: HeapHistory::default(),
        }
    }

    /// Returns a handle onto the collected readings.
    pub fn history(&self) -> HeapHistory {
        self.history.clone()
    }
}

impl<M: MemoryInfo> MemoryInfo for HeapSampler<M> {
    fn used_heap_mb(&self) -> Option<f64> {
        let reading = self.inner.used_heap_mb()?;
        if reading.is_finite() {
            self.history.record(reading);
        }
        Some(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn ring_buffer_overwrites_oldest() {
        let mut rb = RingBuffer::<f64, 3>::new();
        rb.push(1.0);
        rb.push(2.0);
        rb.push(3.0);
        rb.push(4.0);

        let values: Vec<f64> = rb.iter().copied().collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(rb.count(), 3);
        assert_eq!(rb.latest(), Some(4.0));
    }

    #[test]
    fn ring_buffer_partial_fill_iterates_in_order() {
        let mut rb = RingBuffer::<f64, 4>::new();
        rb.push(5.0);
        rb.push(6.0);
        let values: Vec<f64> = rb.iter().copied().collect();
        assert_eq!(values, vec![5.0, 6.0]);
    }

    #[test]
    fn ring_buffer_statistics() {
        let mut rb = RingBuffer::<f64, 4>::new();
        rb.push(100.0);
        rb.push(110.0);
        rb.push(200.0);
        rb.push(210.0);
        assert_relative_eq!(rb.average(), 155.0);
        assert_relative_eq!(rb.trend(), 100.0);
        assert_eq!(rb.max(), Some(210.0));
    }

    #[test]
    fn empty_ring_buffer() {
        let rb = RingBuffer::<f64, 4>::new();
        assert_eq!(rb.average(), 0.0);
        assert_eq!(rb.trend(), 0.0);
        assert_eq!(rb.max(), None);
        assert_eq!(rb.latest(), None);
    }

    struct Scripted {
        readings: Vec<Option<f64>>,
        cursor: AtomicUsize,
    }

    impl MemoryInfo for Scripted {
        fn used_heap_mb(&self) -> Option<f64> {
            let i = self.cursor.fetch_add(1, Ordering::SeqCst);
            self.readings.get(i).copied().flatten()
        }
    }

    #[test]
    fn sampler_records_only_real_readings() {
        let sampler = HeapSampler::new(Scripted {
            readings: vec![Some(512.0), None, Some(f64::NAN), Some(768.0)],
            cursor: AtomicUsize::new(0),
        });
        let history = sampler.history();

        assert_eq!(sampler.used_heap_mb(), Some(512.0));
        assert_eq!(sampler.used_heap_mb(), None);
        assert!(sampler.used_heap_mb().unwrap().is_nan());
        assert_eq!(sampler.used_heap_mb(), Some(768.0));

        assert_eq!(history.sample_count(), 2);
        assert_eq!(history.latest_mb(), Some(768.0));
        assert_eq!(history.peak_mb(), Some(768.0));
        assert_relative_eq!(history.average_mb(), 640.0);
        assert_relative_eq!(history.trend_mb(), 256.0);
    }
}

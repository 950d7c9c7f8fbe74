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

//! A thread-safe, non-blocking event channel.

/// The publishing half handed out to the host.
pub type EventSender<T> = flume::Sender<T>;

/// An unbounded event channel drained by its owner.
///
/// The owner keeps the bus and hands out [`EventSender`]s; events published
/// from any thread are queued until the owner calls [`EventBus::drain`].
///
/// # Example
///
/// ```rust
/// use hush_core::{EventBus, HostEvent, SceneKind};
///
/// let bus = EventBus::new();
/// let sender = bus.sender();
/// bus.publish(HostEvent::BootComplete);
/// sender.send(HostEvent::SceneTerminated(SceneKind::Map)).unwrap();
///
/// assert_eq!(
///     bus.drain(),
///     vec![HostEvent::BootComplete, HostEvent::SceneTerminated(SceneKind::Map)]
/// );
/// assert!(bus.drain().is_empty());
/// ```
#[derive(Debug)]
pub struct EventBus<T: Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Send + 'static> EventBus<T> {
    /// Creates a bus with an unbounded channel.
    ///
    /// ## Returns
    /// An empty bus ready to hand out senders.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }

    /// Queues an event. Cannot fail while the bus itself is alive.
    ///
    /// ## Arguments
    /// * `event` - The event to queue for the next [`EventBus::drain`].
    pub fn publish(&self, event: T) {
        if let Err(e) = self.sender.send(event) {
            log::error!("Failed to queue event: {e}");
        }
    }

    /// Returns a new publishing handle.
    ///
    /// ## Returns
    /// A clone of the sending end, usable from any thread.
    pub fn sender(&self) -> EventSender<T> {
        self.sender.clone()
    }

    /// Takes every event queued so far, in publication order, without blocking.
    ///
    /// ## Returns
    /// The drained events; empty when nothing was queued.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of queued events.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl<T: Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{HostEvent, SceneKind};
    use crate::host::MapId;
    use std::thread;

    #[test]
    fn drain_on_empty_bus_is_empty() {
        let bus = EventBus::<HostEvent>::new();
        assert!(bus.drain().is_empty());
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn drain_preserves_publication_order() {
        let bus = EventBus::<HostEvent>::new();
        let sender = bus.sender();

        bus.publish(HostEvent::BootComplete);
        sender
            .send(HostEvent::SceneTerminated(SceneKind::Map))
            .expect("Send should succeed");
        sender
            .send(HostEvent::MapLoading { map_id: MapId(3) })
            .expect("Send should succeed");
        assert_eq!(bus.pending(), 3);

        assert_eq!(
            bus.drain(),
            vec![
                HostEvent::BootComplete,
                HostEvent::SceneTerminated(SceneKind::Map),
                HostEvent::MapLoading { map_id: MapId(3) },
            ]
        );
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn publish_from_another_thread() {
        let bus = EventBus::<HostEvent>::new();
        let sender = bus.sender();

        let handle = thread::spawn(move || {
            sender
                .send(HostEvent::SceneTerminated(SceneKind::Battle))
                .expect("Send from thread failed");
        });
        handle.join().expect("Thread join failed");

        assert_eq!(
            bus.drain(),
            vec![HostEvent::SceneTerminated(SceneKind::Battle)]
        );
    }

    #[test]
    fn sender_fails_once_bus_is_dropped() {
        let bus = EventBus::<HostEvent>::new();
        let sender = bus.sender();
        drop(bus);

        assert!(sender.send(HostEvent::BootComplete).is_err());
    }
}

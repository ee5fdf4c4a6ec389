use crate::core::map::{MapId, Mode};
use crate::core::view_state::ViewPosition;
use crate::prelude::HashMap;
use std::collections::VecDeque;

/// Events emitted by the host while driving map instances
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Initial layers are on the map and the first view is placed
    Ready { map: MapId },
    /// The view of a map was placed or moved
    ViewChanged { map: MapId, position: ViewPosition },
    /// The responsive controller switched interaction mode
    ModeChanged { map: MapId, mode: Mode },
    /// A data layer was drawn
    LayerAdded { map: MapId, group_id: String },
    /// A full-screen dialog finished opening
    FullScreenOpened { map: MapId },
    /// A full-screen dialog was closed
    FullScreenClosed { map: MapId },
    /// All interactive maps of the current content, published once per cycle
    MapsHook { maps: Vec<MapId> },
}

impl MapEvent {
    /// Listener key for this event
    pub fn event_type(&self) -> &'static str {
        match self {
            MapEvent::Ready { .. } => "ready",
            MapEvent::ViewChanged { .. } => "viewchanged",
            MapEvent::ModeChanged { .. } => "modechanged",
            MapEvent::LayerAdded { .. } => "layeradd",
            MapEvent::FullScreenOpened { .. } => "fullscreenopen",
            MapEvent::FullScreenClosed { .. } => "fullscreenclose",
            MapEvent::MapsHook { .. } => "maps",
        }
    }
}

/// Event callback type
pub type EventCallback = Box<dyn Fn(&MapEvent)>;

/// Queues events and dispatches them to listeners by type
#[derive(Default)]
pub struct EventManager {
    listeners: HashMap<String, Vec<EventCallback>>,
    event_queue: VecDeque<MapEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event listener
    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + 'static,
    {
        self.listeners
            .entry(event_type.to_string())
            .or_default()
            .push(Box::new(callback));
    }

    /// Emit an event to the queue
    pub fn emit(&mut self, event: MapEvent) {
        log::trace!("queued {} event", event.event_type());
        self.event_queue.push_back(event);
    }

    /// Process all queued events
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        let events: Vec<_> = self.event_queue.drain(..).collect();

        for event in &events {
            if let Some(callbacks) = self.listeners.get(event.event_type()) {
                for callback in callbacks {
                    callback(event);
                }
            }
        }

        events
    }

    /// Clear all events from the queue
    pub fn clear_events(&mut self) {
        self.event_queue.clear();
    }

    /// Get number of pending events
    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("listeners", &self.listeners.keys().collect::<Vec<_>>())
            .field("pending", &self.event_queue.len())
            .finish()
    }
}

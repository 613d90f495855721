use std::sync::{Arc, Mutex};

use event_emitter_rs::EventEmitter;

use super::{EventKind, WidgetEvents};
use crate::engine::MapEngine;
use crate::locks::lock;

/// Forwards widget events to an [`EventEmitter`] for in-process subscribers.
///
/// Each event is emitted under its framework name (`onItemRender`, ...) with
/// the JSON-encoded payload as a `String`. `EventEmitter` delivers on spawned
/// threads, so subscribers observe events asynchronously.
pub struct EmitterBridge {
    emitter: Arc<Mutex<EventEmitter>>,
}

impl EmitterBridge {
    pub fn attach<E: MapEngine>(events: &WidgetEvents<E>, emitter: EventEmitter) -> Self {
        let emitter = Arc::new(Mutex::new(emitter));

        for kind in EventKind::ALL {
            let target = Arc::clone(&emitter);
            events.on(kind, move |event| {
                let payload = event.payload().to_string();
                lock(&target).emit(kind.name(), payload);
            });
        }

        EmitterBridge { emitter }
    }

    /// Subscribe to a forwarded event by name.
    pub fn on<F>(&self, event: &str, listener: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        lock(&self.emitter).on(event, listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RecordingEngine;
    use crate::events::MapEvent;
    use crate::item::MapItem;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn forwards_payload_under_event_name() {
        let events: WidgetEvents<RecordingEngine> = WidgetEvents::new();
        let bridge = EmitterBridge::attach(&events, EventEmitter::new());

        let (tx, rx) = mpsc::channel::<String>();
        let tx = Mutex::new(tx);
        bridge.on("onAfterDrop", move |payload: String| {
            tx.lock().unwrap().send(payload).unwrap();
        });

        events.emit(&MapEvent::AfterDrop {
            id: "m".into(),
            item: MapItem::new("m", 11.0, 21.0),
        });

        let payload = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        let decoded: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(decoded["id"], "m");
        assert_eq!(decoded["item"]["lat"], 11.0);
    }
}

//! Typed publish/subscribe event bus.
//!
//! The bus decouples engine-internal state changes from external
//! observers (UI, logging). The event set is closed: every key is tied
//! to exactly one payload shape through [`EventPayload`], so a
//! mismatched key/payload pair cannot be constructed, let alone
//! published.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

/// Keys for the closed set of viewer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// A scene object changed; carries an ordered list of change records.
    ObjectUpdated,
    /// An asynchronously loaded resource became available.
    ObjectLoaded,
    /// An asynchronous failure (e.g. a texture load) occurred.
    ObjectError,
}

/// Error descriptor carried by events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub message: String,
}

/// One field-level change on a scene object.
///
/// Whether a trailing error record should trigger a user-visible
/// notification is host policy; the engine only reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub field: String,
    pub value: String,
    pub error: Option<ErrorRecord>,
}

/// Identity of a loaded scene object or resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    pub id: Uuid,
    pub name: String,
}

/// Event payloads, one variant per [`EventKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    ObjectUpdated(Vec<ChangeRecord>),
    ObjectLoaded(ObjectRecord),
    ObjectError(ErrorRecord),
}

impl EventPayload {
    /// The key this payload is published under.
    pub fn key(&self) -> EventKey {
        match self {
            EventPayload::ObjectUpdated(_) => EventKey::ObjectUpdated,
            EventPayload::ObjectLoaded(_) => EventKey::ObjectLoaded,
            EventPayload::ObjectError(_) => EventKey::ObjectError,
        }
    }
}

/// Callback registered with the bus.
///
/// Identity is the allocation behind the `Arc`: subscribing the same
/// `Arc` twice occupies one slot, and `unsubscribe` only removes the
/// callback it is handed the original `Arc` (or a clone of it) for.
pub type EventCallback = Arc<dyn Fn(&EventPayload) + Send + Sync>;

/// Cancellation handle returned by [`EventBus::subscribe`].
pub struct Subscription {
    key: EventKey,
    callback: EventCallback,
}

impl Subscription {
    /// The key this subscription was registered under.
    pub fn key(&self) -> EventKey {
        self.key
    }
}

/// Synchronous, registration-ordered publish/subscribe bus.
pub struct EventBus {
    listeners: Mutex<HashMap<EventKey, Vec<EventCallback>>>,
}

/// Compares callback identity by the data pointer of the allocation.
fn same_callback(a: &EventCallback, b: &EventCallback) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
        }
    }

    /// Registers `callback` for `key` and returns a cancellation handle.
    ///
    /// Registering the same callback object twice under the same key is
    /// idempotent: it occupies one slot and receives one delivery per
    /// publish.
    pub fn subscribe(&self, key: EventKey, callback: EventCallback) -> Subscription {
        let mut listeners = self.listeners.lock();
        let slot = listeners.entry(key).or_default();
        if !slot.iter().any(|cb| same_callback(cb, &callback)) {
            slot.push(callback.clone());
        }
        Subscription { key, callback }
    }

    /// Removes `callback` from `key`.
    ///
    /// Returns whether a registration was actually removed, so a caller
    /// passing a wrong (freshly constructed) callback reference can
    /// detect that nothing happened instead of silently leaking the
    /// original listener.
    pub fn unsubscribe(&self, key: EventKey, callback: &EventCallback) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(slot) = listeners.get_mut(&key) else {
            return false;
        };
        let before = slot.len();
        slot.retain(|cb| !same_callback(cb, callback));
        slot.len() != before
    }

    /// Cancels a subscription through its handle.
    pub fn cancel(&self, subscription: &Subscription) -> bool {
        self.unsubscribe(subscription.key, &subscription.callback)
    }

    /// Delivers `payload` synchronously, in registration order, to every
    /// subscriber of the payload's key.
    ///
    /// The subscriber list is snapshotted before delivery: callbacks that
    /// subscribe or unsubscribe during the pass do not affect it.
    pub fn publish(&self, payload: EventPayload) {
        let snapshot: Vec<EventCallback> = {
            let listeners = self.listeners.lock();
            listeners.get(&payload.key()).cloned().unwrap_or_default()
        };
        for callback in &snapshot {
            callback(&payload);
        }
    }

    /// Number of subscribers currently registered for `key`.
    pub fn subscriber_count(&self, key: EventKey) -> usize {
        self.listeners.lock().get(&key).map_or(0, Vec::len)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recording_callback(log: Arc<Mutex<Vec<String>>>, tag: &str) -> EventCallback {
        let tag = tag.to_string();
        Arc::new(move |payload| {
            let text = match payload {
                EventPayload::ObjectError(e) => e.message.clone(),
                other => format!("{other:?}"),
            };
            log.lock().push(format!("{tag}:{text}"));
        })
    }

    #[test]
    fn publish_delivers_in_registration_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe(EventKey::ObjectError, recording_callback(log.clone(), "a"));
        bus.subscribe(EventKey::ObjectError, recording_callback(log.clone(), "b"));
        bus.subscribe(EventKey::ObjectError, recording_callback(log.clone(), "c"));

        bus.publish(EventPayload::ObjectError(ErrorRecord {
            message: "boom".into(),
        }));

        assert_eq!(&*log.lock(), &["a:boom", "b:boom", "c:boom"]);
    }

    #[test]
    fn duplicate_subscribe_delivers_once() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let cb = recording_callback(log.clone(), "dup");

        bus.subscribe(EventKey::ObjectError, cb.clone());
        bus.subscribe(EventKey::ObjectError, cb.clone());
        assert_eq!(bus.subscriber_count(EventKey::ObjectError), 1);

        bus.publish(EventPayload::ObjectError(ErrorRecord {
            message: "once".into(),
        }));
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn unsubscribe_reports_whether_anything_was_removed() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let original = recording_callback(log.clone(), "orig");
        let stranger = recording_callback(log.clone(), "stranger");

        bus.subscribe(EventKey::ObjectUpdated, original.clone());

        // A freshly constructed callback is a different object and must
        // not silently "succeed".
        assert!(!bus.unsubscribe(EventKey::ObjectUpdated, &stranger));
        assert_eq!(bus.subscriber_count(EventKey::ObjectUpdated), 1);

        assert!(bus.unsubscribe(EventKey::ObjectUpdated, &original));
        assert_eq!(bus.subscriber_count(EventKey::ObjectUpdated), 0);
    }

    #[test]
    fn publish_after_unsubscribe_delivers_to_nobody() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let cb = recording_callback(log.clone(), "x");

        let sub = bus.subscribe(EventKey::ObjectError, cb);
        bus.publish(EventPayload::ObjectError(ErrorRecord {
            message: "bad input".into(),
        }));
        assert_eq!(&*log.lock(), &["x:bad input"]);

        assert!(bus.cancel(&sub));
        bus.publish(EventPayload::ObjectError(ErrorRecord {
            message: "bad input".into(),
        }));
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn cancel_twice_is_a_detectable_noop() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let sub = bus.subscribe(EventKey::ObjectLoaded, recording_callback(log, "x"));

        assert!(bus.cancel(&sub));
        assert!(!bus.cancel(&sub));
    }

    #[test]
    fn subscribers_added_during_delivery_do_not_receive_it() {
        let bus = Arc::new(EventBus::new());
        let log = Arc::new(Mutex::new(Vec::<String>::new()));

        let bus2 = bus.clone();
        let log2 = log.clone();
        let adder: EventCallback = Arc::new(move |_payload| {
            log2.lock().push("adder".into());
            let log3 = log2.clone();
            bus2.subscribe(
                EventKey::ObjectError,
                Arc::new(move |_| log3.lock().push("late".into())),
            );
        });
        bus.subscribe(EventKey::ObjectError, adder);

        bus.publish(EventPayload::ObjectError(ErrorRecord {
            message: "first".into(),
        }));
        // The late subscriber was registered mid-delivery and must not
        // have seen the in-flight event.
        assert_eq!(&*log.lock(), &["adder"]);

        bus.publish(EventPayload::ObjectError(ErrorRecord {
            message: "second".into(),
        }));
        assert_eq!(&*log.lock(), &["adder", "adder", "late"]);
    }

    #[test]
    fn subscribers_removed_during_delivery_still_receive_it() {
        let bus = Arc::new(EventBus::new());
        let log = Arc::new(Mutex::new(Vec::<String>::new()));

        let log_b = log.clone();
        let b: EventCallback = Arc::new(move |_| log_b.lock().push("b".into()));

        let bus2 = bus.clone();
        let log_a = log.clone();
        let b_handle = b.clone();
        let a: EventCallback = Arc::new(move |_| {
            log_a.lock().push("a".into());
            bus2.unsubscribe(EventKey::ObjectError, &b_handle);
        });

        bus.subscribe(EventKey::ObjectError, a);
        bus.subscribe(EventKey::ObjectError, b);

        // "a" unsubscribes "b" mid-delivery; the in-flight pass was
        // snapshotted first, so "b" still sees this event.
        bus.publish(EventPayload::ObjectError(ErrorRecord {
            message: "first".into(),
        }));
        assert_eq!(&*log.lock(), &["a", "b"]);

        bus.publish(EventPayload::ObjectError(ErrorRecord {
            message: "second".into(),
        }));
        assert_eq!(&*log.lock(), &["a", "b", "a"]);
    }

    #[test]
    fn payload_key_pairing_is_fixed() {
        let updated = EventPayload::ObjectUpdated(vec![ChangeRecord {
            field: "height".into(),
            value: "12".into(),
            error: None,
        }]);
        assert_eq!(updated.key(), EventKey::ObjectUpdated);

        let errored = EventPayload::ObjectError(ErrorRecord {
            message: "nope".into(),
        });
        assert_eq!(errored.key(), EventKey::ObjectError);
    }
}

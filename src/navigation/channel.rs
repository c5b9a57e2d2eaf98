use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::NavigationEvent;

pub type Listener = Rc<dyn Fn(&NavigationEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct ChannelInner {
    listeners: RefCell<HashMap<String, Vec<(ListenerId, Listener)>>>,
    next_id: Cell<u64>,
}

/// Publish/subscribe channel between the search and whatever renders it.
///
/// One channel is created per view session and handed to the navigation
/// controller. Cloning yields another handle to the same channel. Listeners
/// for an event name run in subscription order.
#[derive(Clone, Default)]
pub struct EventChannel {
    inner: Rc<ChannelInner>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for events named `name`. Subscribing the same
    /// listener twice to one name keeps a single registration.
    pub fn subscribe(&self, name: &str, listener: Listener) -> ListenerId {
        let mut listeners = self.inner.listeners.borrow_mut();
        let entries = listeners.entry(name.to_string()).or_default();

        if let Some((id, _)) = entries.iter().find(|(_, l)| Rc::ptr_eq(l, &listener)) {
            return *id;
        }

        let id = ListenerId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        entries.push((id, listener));
        id
    }

    pub fn unsubscribe(&self, name: &str, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let Some(entries) = listeners.get_mut(name) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(listener_id, _)| *listener_id != id);
        before != entries.len()
    }

    /// Deliver `event` to every listener of its name. Returns how many ran.
    pub fn publish(&self, event: &NavigationEvent) -> usize {
        // Snapshot first so listeners may (un)subscribe while being called
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .get(event.name())
            .map(|entries| entries.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();

        log::debug!(
            "Publishing {} event to {} listener(s)",
            event.name(),
            listeners.len()
        );
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    pub fn publish_all(&self, events: &[NavigationEvent]) {
        for event in events {
            self.publish(event);
        }
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.inner
            .listeners
            .borrow()
            .get(name)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.inner.listeners.borrow();
        let mut names: Vec<_> = listeners.keys().collect();
        names.sort();
        f.debug_struct("EventChannel").field("events", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{HIGHLIGHT_EVENT, HighlightRole, ZOOM_EVENT, ZoomMode};
    use crate::profile::{Frame, FrameId, Subject};

    fn zoom() -> NavigationEvent {
        NavigationEvent::Zoom {
            target: Subject::Frame(Frame::new("main", 0.0, 1.0, 0, FrameId(1))),
            mode: ZoomMode::Min,
        }
    }

    fn highlight() -> NavigationEvent {
        NavigationEvent::Highlight {
            target: Subject::Frame(Frame::new("main", 0.0, 1.0, 0, FrameId(1))),
            role: HighlightRole::Selected,
        }
    }

    #[test]
    fn test_delivers_by_name_in_order() {
        let channel = EventChannel::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = seen.clone();
            channel.subscribe(
                ZOOM_EVENT,
                Rc::new(move |event: &NavigationEvent| seen.borrow_mut().push((tag, event.name()))),
            );
        }

        assert_eq!(channel.publish(&zoom()), 2);
        assert_eq!(channel.publish(&highlight()), 0);
        assert_eq!(*seen.borrow(), vec![("first", ZOOM_EVENT), ("second", ZOOM_EVENT)]);
    }

    #[test]
    fn test_duplicate_subscription_is_ignored() {
        let channel = EventChannel::new();
        let listener: Listener = Rc::new(|_: &NavigationEvent| {});

        let a = channel.subscribe(HIGHLIGHT_EVENT, listener.clone());
        let b = channel.subscribe(HIGHLIGHT_EVENT, listener);
        assert_eq!(a, b);
        assert_eq!(channel.listener_count(HIGHLIGHT_EVENT), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let channel = EventChannel::new();
        let id = channel.subscribe(ZOOM_EVENT, Rc::new(|_: &NavigationEvent| {}));

        assert!(channel.unsubscribe(ZOOM_EVENT, id));
        assert!(!channel.unsubscribe(ZOOM_EVENT, id));
        assert_eq!(channel.publish(&zoom()), 0);
    }

    #[test]
    fn test_listener_may_subscribe_during_publish() {
        let channel = EventChannel::new();
        let inner = channel.clone();
        let id = channel.subscribe(
            ZOOM_EVENT,
            Rc::new(move |_: &NavigationEvent| {
                inner.subscribe(HIGHLIGHT_EVENT, Rc::new(|_: &NavigationEvent| {}));
            }),
        );

        channel.publish(&zoom());
        assert_eq!(channel.listener_count(HIGHLIGHT_EVENT), 1);

        // The listener owns a handle to its own channel
        assert!(channel.unsubscribe(ZOOM_EVENT, id));
        assert_eq!(channel.listener_count(ZOOM_EVENT), 0);
    }

    #[test]
    fn test_channels_are_independent() {
        let a = EventChannel::new();
        let b = EventChannel::new();
        a.subscribe(ZOOM_EVENT, Rc::new(|_: &NavigationEvent| {}));
        assert_eq!(b.listener_count(ZOOM_EVENT), 0);
    }
}

//! Typed publish/subscribe event bus.
//!
//! Multi-producer, multi-subscriber fan-out with bounded queues throughout.
//! `publish` enqueues into a single bounded inbound queue and never blocks;
//! a dispatch pump drains it and fans each event out to every subscriber of
//! its type. Fan-out is lossy: a full subscriber queue drops the event for
//! that subscriber only, so a slow consumer can never back-pressure the
//! simulation.
//!
//! Ordering guarantee: events of one type reach a given subscriber in
//! publication order, modulo drops. No ordering across types.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use log::debug;

use strafe_core::constants::{INBOUND_QUEUE_CAPACITY, SUBSCRIBER_QUEUE_CAPACITY};
use strafe_core::error::EngineError;
use strafe_core::events::{Event, EventPayload, EventType};

use crate::shutdown::ShutdownSignal;
use crate::subsystem::Subsystem;

struct SubscriberSlot {
    token: u64,
    tx: Sender<Event>,
    closed: Arc<AtomicBool>,
}

impl Drop for SubscriberSlot {
    // The slot holds the only non-transient sender; dropping it closes the
    // queue, and the flag lets the read side observe that without a
    // destructive `try_recv`.
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

struct BusInner {
    inbound_tx: Sender<Event>,
    /// Cloned by the pump thread and by `dispatch_pending`; crossbeam
    /// receivers share the queue, so each event is drained exactly once.
    inbound_rx: Receiver<Event>,
    subscribers: RwLock<HashMap<EventType, Vec<SubscriberSlot>>>,
    closed: AtomicBool,
    next_token: AtomicU64,
    pump: Mutex<Option<JoinHandle<()>>>,
    /// Dropped on shutdown so the pump wakes even without root cancellation.
    pump_stop: Mutex<Option<Sender<()>>>,
}

/// Cheaply cloneable bus handle.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

/// Read handle for one subscriber queue.
pub struct Subscription {
    event_type: EventType,
    token: u64,
    rx: Receiver<Event>,
    closed: Arc<AtomicBool>,
}

impl Subscription {
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Next pending event, if any. Never blocks.
    pub fn try_recv(&self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// True once the queue has been closed (unsubscribe or bus shutdown)
    /// and fully drained. Never consumes a pending event.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) && self.rx.is_empty()
    }

    /// Shared receiver for workers that park in `select!`.
    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = bounded(INBOUND_QUEUE_CAPACITY);
        Self {
            inner: Arc::new(BusInner {
                inbound_tx,
                inbound_rx,
                subscribers: RwLock::new(HashMap::new()),
                closed: AtomicBool::new(false),
                next_token: AtomicU64::new(1),
                pump: Mutex::new(None),
                pump_stop: Mutex::new(None),
            }),
        }
    }

    /// Enqueue one event. Never blocks: a full inbound queue is reported as
    /// [`EngineError::QueueFull`] and the publisher decides what to do
    /// (default policy everywhere in the engine: drop).
    pub fn publish(&self, event_type: EventType, payload: EventPayload) -> Result<(), EngineError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(EngineError::Cancelled);
        }
        match self.inner.inbound_tx.try_send(Event::new(event_type, payload)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                debug!("bus: inbound queue full, rejecting {:?}", event_type);
                Err(EngineError::QueueFull { event_type })
            }
            Err(TrySendError::Disconnected(_)) => Err(EngineError::Cancelled),
        }
    }

    /// Create a bounded outbound queue for `event_type` and return its
    /// read handle.
    pub fn subscribe(&self, event_type: EventType) -> Result<Subscription, EngineError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(EngineError::Cancelled);
        }
        let (tx, rx) = bounded(SUBSCRIBER_QUEUE_CAPACITY);
        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        let closed = Arc::new(AtomicBool::new(false));
        let mut map = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner());
        map.entry(event_type).or_default().push(SubscriberSlot {
            token,
            tx,
            closed: Arc::clone(&closed),
        });
        Ok(Subscription {
            event_type,
            token,
            rx,
            closed,
        })
    }

    /// Remove and close a subscriber queue. Idempotent.
    pub fn unsubscribe(&self, subscription: &Subscription) {
        let mut map = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(slots) = map.get_mut(&subscription.event_type) {
            // Dropping the slot drops the only sender, closing the queue.
            slots.retain(|slot| slot.token != subscription.token);
        }
    }

    /// Close the inbound queue and every outbound queue. After this no
    /// `publish` or `subscribe` succeeds. Idempotent.
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        if let Ok(mut stop) = self.inner.pump_stop.lock() {
            stop.take();
        }
        let pump = {
            let mut pump = self.inner.pump.lock().unwrap_or_else(|e| e.into_inner());
            pump.take()
        };
        if let Some(handle) = pump {
            let _ = handle.join();
        }
        let mut map = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner());
        map.clear();
    }

    /// Synchronously drain the inbound queue on the caller's thread,
    /// fanning out every pending event. Returns the number dispatched.
    ///
    /// This is the drain-now primitive tests use instead of racing the
    /// pump thread.
    pub fn dispatch_pending(&self) -> usize {
        let mut dispatched = 0;
        while let Ok(event) = self.inner.inbound_rx.try_recv() {
            self.dispatch(event);
            dispatched += 1;
        }
        dispatched
    }

    /// Fan one event out to every subscriber of its type. Holds the read
    /// lock only long enough to snapshot the senders.
    fn dispatch(&self, event: Event) {
        let targets: Vec<Sender<Event>> = {
            let map = self
                .inner
                .subscribers
                .read()
                .unwrap_or_else(|e| e.into_inner());
            match map.get(&event.event_type) {
                Some(slots) => slots.iter().map(|slot| slot.tx.clone()).collect(),
                None => return,
            }
        };
        for tx in targets {
            match tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    // Lossy slow-consumer policy: drop for this subscriber only.
                    debug!("bus: subscriber queue full, dropping {:?}", event.event_type);
                }
                Err(TrySendError::Disconnected(_)) => {}
            }
        }
    }

    fn spawn_pump(&self, signal: ShutdownSignal) -> Result<(), EngineError> {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        {
            let mut stop = self
                .inner
                .pump_stop
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            *stop = Some(stop_tx);
        }
        let bus = self.clone();
        let inbound = self.inner.inbound_rx.clone();
        let handle = std::thread::Builder::new()
            .name("strafe-bus-pump".into())
            .spawn(move || loop {
                select! {
                    recv(signal.done()) -> _ => return,
                    recv(stop_rx) -> _ => return,
                    recv(inbound) -> msg => match msg {
                        Ok(event) => bus.dispatch(event),
                        Err(_) => return,
                    },
                }
            })
            .map_err(|e| EngineError::Init {
                subsystem: "event-bus",
                reason: format!("failed to spawn dispatch pump: {e}"),
            })?;
        let mut pump = self.inner.pump.lock().unwrap_or_else(|e| e.into_inner());
        *pump = Some(handle);
        Ok(())
    }

    /// Subscriber count for one type; diagnostics only.
    pub fn subscriber_count(&self, event_type: EventType) -> usize {
        let map = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner());
        map.get(&event_type).map_or(0, |slots| slots.len())
    }
}

/// The bus participates in the ordinary subsystem lifecycle: `initialize`
/// starts the dispatch pump, `update` is only a cancellation check.
pub struct EventBusSystem {
    bus: EventBus,
    signal: Option<ShutdownSignal>,
}

impl EventBusSystem {
    pub fn new(bus: EventBus) -> Self {
        Self { bus, signal: None }
    }
}

impl Subsystem for EventBusSystem {
    fn name(&self) -> &'static str {
        "event-bus"
    }

    fn initialize(&mut self, signal: ShutdownSignal) -> Result<(), EngineError> {
        self.bus.spawn_pump(signal.clone())?;
        self.signal = Some(signal);
        Ok(())
    }

    fn update(&mut self, _dt: f64) -> Result<(), EngineError> {
        crate::subsystem::check_cancelled(&self.signal)
    }

    fn shutdown(&mut self) {
        self.bus.shutdown();
    }
}

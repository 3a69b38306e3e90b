use {
    crate::view::{
        channel::{queue_channel, ChannelReceiver, ChannelSender},
        View,
    },
    std::sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, RwLock, Weak,
    },
};

                    /*\
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                 Observer
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    \*/
pub trait Observer<V: View + ?Sized>: Send + Sync {
    fn notify(&self, msg: &V::Msg);
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

impl<V: View + ?Sized, O: Observer<V> + ?Sized> Observer<V> for Arc<O> {
    fn notify(&self, msg: &V::Msg) {
        (**self).notify(msg);
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

pub trait ObserverExt<V: View + ?Sized>: Observer<V> {
    fn notify_each(&self, it: impl IntoIterator<Item = V::Msg>);
}

impl<V: View + ?Sized, T: Observer<V> + ?Sized> ObserverExt<V> for T {
    fn notify_each(&self, it: impl IntoIterator<Item = V::Msg>) {
        for msg in it {
            self.notify(&msg);
        }
    }
}

                    /*\
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
               Subscriptions
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    \*/

/// Handle returned by [`Observable::subscribe`], used to unsubscribe again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Change-notification capability.
///
/// Observers are held weakly: whoever subscribes keeps the `Arc` alive,
/// dropping it is as good as unsubscribing.
pub trait Observable<V: View + ?Sized>: Send + Sync {
    fn subscribe(&self, observer: Weak<dyn Observer<V>>) -> Subscription;

    /// Returns `false` if the subscription was not (or no longer) registered.
    fn unsubscribe(&self, subscription: Subscription) -> bool;
}

                    /*\
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                 Broadcast
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    \*/

/// Fans messages out to every subscribed observer.
///
/// Messages go through a queue and are delivered strictly in the order they
/// were sent. A message sent while a delivery is already running (e.g. an
/// observer mutating the source it observes) is appended to the queue and
/// delivered by the outermost sender before it returns.
pub struct ObserverBroadcast<V: View + ?Sized> {
    rx: ChannelReceiver<V::Msg>,
    tx: ChannelSender<V::Msg>,
    observers: RwLock<Vec<(Subscription, Weak<dyn Observer<V>>)>>,
    next_id: AtomicU64,
    delivering: AtomicBool,
}

impl<V: View + ?Sized> ObserverBroadcast<V> {
    pub fn new() -> Self {
        let (tx, rx) = queue_channel::<V::Msg>();
        ObserverBroadcast {
            rx,
            tx,
            observers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
            delivering: AtomicBool::new(false),
        }
    }

    fn cleanup(&self) {
        self.observers
            .write()
            .unwrap()
            .retain(|(_, o)| o.strong_count() > 0);
    }

    fn snapshot(&self) -> Vec<Arc<dyn Observer<V>>> {
        self.observers
            .read()
            .unwrap()
            .iter()
            .filter_map(|(_, o)| o.upgrade())
            .collect()
    }

    /// Number of observers that are still alive.
    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap()
            .iter()
            .filter(|(_, o)| o.strong_count() > 0)
            .count()
    }

    /// Queue a whole batch before delivering any of it, so that messages
    /// produced by observers of this batch can only ever come after it.
    pub fn send_all(&self, msgs: impl IntoIterator<Item = V::Msg>) {
        self.enqueue(msgs);
        self.update();
    }

    /// Queue messages without delivering them. Callers that enqueue under
    /// their own lock fix the delivery order to their locking order, and
    /// call [`ObserverBroadcast::update`] once the lock is released.
    pub fn enqueue(&self, msgs: impl IntoIterator<Item = V::Msg>) {
        for msg in msgs {
            self.tx.send(msg);
        }
    }

    /// Deliver everything queued so far, unless a delivery is already running.
    pub fn update(&self) {
        loop {
            if self.delivering.swap(true, Ordering::AcqRel) {
                return;
            }

            while let Some(batch) = self.rx.try_recv() {
                for msg in batch {
                    for o in self.snapshot() {
                        o.notify(&msg);
                    }
                }
            }

            self.delivering.store(false, Ordering::Release);

            // another thread may have queued between our last poll and the store
            if self.rx.is_empty() {
                break;
            }
        }
    }
}

impl<V: View + ?Sized> Default for ObserverBroadcast<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: View + ?Sized> Observer<V> for ObserverBroadcast<V> {
    fn notify(&self, msg: &V::Msg) {
        self.tx.send(msg.clone());
        self.update();
    }
}

impl<V: View + ?Sized> Observable<V> for ObserverBroadcast<V> {
    fn subscribe(&self, observer: Weak<dyn Observer<V>>) -> Subscription {
        self.cleanup();
        let subscription = Subscription(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().unwrap().push((subscription, observer));
        subscription
    }

    fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut observers = self.observers.write().unwrap();
        let before = observers.len();
        observers.retain(|(s, _)| *s != subscription);
        observers.len() != before
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

pub struct NotifyFnObserver<V, F>
where
    V: View + ?Sized,
    F: Fn(&V::Msg) + Send + Sync,
{
    f: F,
    _phantom: std::marker::PhantomData<fn(&V)>,
}

impl<V, F> NotifyFnObserver<V, F>
where
    V: View + ?Sized,
    F: Fn(&V::Msg) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        NotifyFnObserver {
            f,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<V, F> Observer<V> for NotifyFnObserver<V, F>
where
    V: View + ?Sized,
    F: Fn(&V::Msg) + Send + Sync,
{
    fn notify(&self, msg: &V::Msg) {
        (self.f)(msg);
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

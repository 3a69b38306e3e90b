//! Filtered, mapped, sorted and windowed projection of an observable list,
//! kept up to date with the smallest sequence of add/remove diffs.
//!
//! Every diff a [`DerivedView`] emits is valid against the output as it stood
//! right after the previous diff, so observers can mirror the view without
//! ever re-reading it.

pub mod options;
mod state;

pub use options::{CompareFn, FilterFn, MapFn, ViewConfig, ViewOptions};

use {
    self::state::{ItemSink, ViewState},
    crate::{
        error::ViewError,
        view::{
            channel::{queue_channel, ChannelReceiver},
            item::SourceItem,
            list::{ListDiff, ListView},
            NotifyFnObserver, Observable, Observer, ObserverBroadcast, Scheduler, Subscription,
            UpdateTask, View,
        },
    },
    std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicU64, Ordering},
            Arc, Mutex, Weak,
        },
        time::Duration,
    },
};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

struct ViewInner<S: SourceItem, M>
where
    M: Clone + Send + Sync + 'static,
{
    me: Weak<ViewInner<S, M>>,
    state: Mutex<ViewState<S, M>>,
    cast: ObserverBroadcast<dyn ListView<M>>,

    coalesce: Option<Arc<dyn Scheduler>>,
    idle_after: Option<Duration>,
    idle_generation: AtomicU64,

    /// observers registered through `add_observer` and friends
    keepalive: Mutex<HashMap<Subscription, Arc<dyn Observer<dyn ListView<M>>>>>,
}

impl<S, M> ViewInner<S, M>
where
    S: SourceItem,
    M: Clone + PartialEq + Send + Sync + 'static,
{
    /// Runs `f` on the state unless the view is disposed, then delivers
    /// whatever it emitted. Events are queued while the state lock is held,
    /// so concurrent writers queue them in the order they were computed.
    /// The lock is released before observers run.
    fn update(&self, f: impl FnOnce(&mut ViewState<S, M>, &mut Vec<ListDiff<M>>)) {
        {
            let mut state = self.state.lock().unwrap();
            if state.disposed {
                return;
            }
            let mut events = Vec::new();
            f(&mut state, &mut events);
            self.cast.enqueue(events);
        }
        self.cast.update();
    }

    fn resync(&self, everything: bool) {
        self.update(|state, events| state.resync(everything, events));
    }

    fn arm_idle_timer(&self) {
        let after = match self.idle_after {
            Some(after) => after,
            None => return,
        };

        let generation = self.idle_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let view = self.me.clone();
        async_std::task::spawn(async move {
            async_std::task::sleep(after).await;
            if let Some(inner) = view.upgrade() {
                if inner.idle_generation.load(Ordering::SeqCst) == generation
                    && inner.cast.observer_count() == 0
                {
                    log::debug!("view idle for {:?}, disposing", after);
                    inner.dispose();
                }
            }
        });
    }

    fn dispose(&self) {
        {
            let mut state = self.state.lock().unwrap();
            if state.disposed {
                return;
            }
            state.unsubscribe_all();
            state.disposed = true;
        }
        self.idle_generation.fetch_add(1, Ordering::SeqCst);
        self.keepalive.lock().unwrap().clear();
        log::debug!("view disposed");
    }
}

impl<S, M> Observer<dyn ListView<S>> for ViewInner<S, M>
where
    S: SourceItem,
    M: Clone + PartialEq + Send + Sync + 'static,
{
    fn notify(&self, diff: &ListDiff<S>) {
        self.update(|state, events| match diff {
            ListDiff::Add { item, idx } => state.source_added(item.clone(), *idx, events),
            ListDiff::Remove { item, idx } => state.source_removed(item, *idx, events),
        });
    }
}

impl<S, M> ItemSink<S::Id> for ViewInner<S, M>
where
    S: SourceItem,
    M: Clone + PartialEq + Send + Sync + 'static,
{
    fn item_changed(&self, id: &S::Id) {
        match &self.coalesce {
            Some(scheduler) => {
                let schedule = {
                    let mut state = self.state.lock().unwrap();
                    !state.disposed && state.mark_dirty(id.clone())
                };
                if schedule {
                    scheduler.schedule(Arc::new(ResyncTask {
                        view: self.me.clone(),
                    }));
                }
            }
            None => self.update(|state, events| state.item_changed(id, events)),
        }
    }
}

impl<S, M> Observable<dyn ListView<M>> for ViewInner<S, M>
where
    S: SourceItem,
    M: Clone + PartialEq + Send + Sync + 'static,
{
    fn subscribe(&self, observer: Weak<dyn Observer<dyn ListView<M>>>) -> Subscription {
        // cancels a running idle timer
        self.idle_generation.fetch_add(1, Ordering::SeqCst);
        self.cast.subscribe(observer)
    }

    fn unsubscribe(&self, subscription: Subscription) -> bool {
        let removed = self.cast.unsubscribe(subscription);
        if removed && self.cast.observer_count() == 0 {
            self.arm_idle_timer();
        }
        removed
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

struct ResyncTask<S: SourceItem, M>
where
    M: Clone + Send + Sync + 'static,
{
    view: Weak<ViewInner<S, M>>,
}

impl<S, M> UpdateTask for ResyncTask<S, M>
where
    S: SourceItem,
    M: Clone + PartialEq + Send + Sync + 'static,
{
    fn update(&self) {
        if let Some(inner) = self.view.upgrade() {
            inner.resync(false);
        }
    }
}

                    /*\
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                Derived View
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    \*/

/// Live projection of a source list.
///
/// Clones are handles to the same view. The view holds its source and every
/// observable item only through subscriptions, which [`DerivedView::dispose`]
/// releases.
pub struct DerivedView<S: SourceItem, M = S>
where
    M: Clone + PartialEq + Send + Sync + 'static,
{
    inner: Arc<ViewInner<S, M>>,
}

impl<S, M> Clone for DerivedView<S, M>
where
    S: SourceItem,
    M: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        DerivedView {
            inner: self.inner.clone(),
        }
    }
}

impl<S, M> DerivedView<S, M>
where
    S: SourceItem,
    M: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(source: Arc<dyn ListView<S>>, opts: ViewOptions<S, M>) -> Result<Self, ViewError> {
        opts.validate()?;

        let coalesce = opts.coalesce.clone();
        let idle_after = opts.auto_dispose_after;
        let inner = Arc::new_cyclic(|me: &Weak<ViewInner<S, M>>| {
            let sink: Weak<dyn ItemSink<S::Id>> = me.clone();
            let observer: Weak<dyn Observer<dyn ListView<S>>> = me.clone();
            ViewInner {
                me: me.clone(),
                state: Mutex::new(ViewState::new(opts, sink, observer)),
                cast: ObserverBroadcast::new(),
                coalesce,
                idle_after,
                idle_generation: AtomicU64::new(0),
                keepalive: Mutex::new(HashMap::new()),
            }
        });

        inner.state.lock().unwrap().attach(source);
        inner.arm_idle_timer();

        let view = DerivedView { inner };
        log::debug!("derived view created with {} items", view.len());
        Ok(view)
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn at(&self, idx: usize) -> Option<M> {
        self.inner.state.lock().unwrap().at(idx)
    }

    /// Window-relative position of the first output equal to `value`.
    pub fn index_of(&self, value: &M) -> Option<usize> {
        self.inner.state.lock().unwrap().index_of(value)
    }

    /// Window-relative position of the source item with `item`'s identity.
    pub fn index_of_item(&self, item: &S) -> Option<usize> {
        self.inner.state.lock().unwrap().index_of_item(item)
    }

    pub fn to_array(&self) -> Vec<M> {
        self.inner.state.lock().unwrap().to_vec()
    }

    /// Snapshot of the current output.
    pub fn iter(&self) -> std::vec::IntoIter<M> {
        self.to_array().into_iter()
    }

    /// Switches to another source, announcing the difference between the old
    /// and the new output.
    pub fn set_source(&self, source: Arc<dyn ListView<S>>) {
        self.inner
            .update(move |state, events| state.set_source(source, events));
    }

    /// Re-evaluates filter, map and order for the item `id`, or for every item.
    pub fn refresh(&self, id: Option<&S::Id>) {
        match id {
            Some(id) => self.inner.update(|state, events| state.item_changed(id, events)),
            None => self.inner.resync(true),
        }
    }

    /// Releases the source and item subscriptions and every observer added
    /// through this handle. The output stays readable but no longer changes.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().unwrap().disposed
    }

    /// Number of observable items this view is subscribed to.
    pub fn tracked_items(&self) -> usize {
        self.inner.state.lock().unwrap().tracked_len()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.cast.observer_count()
    }

    /*\
    <<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                     Observers
    <<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
    \*/

    /// Subscribes `observer` and keeps it alive until it is removed or the
    /// view is disposed.
    pub fn add_observer(&self, observer: Arc<dyn Observer<dyn ListView<M>>>) -> Subscription {
        let subscription = self.inner.subscribe(Arc::downgrade(&observer));
        self.inner
            .keepalive
            .lock()
            .unwrap()
            .insert(subscription, observer);
        subscription
    }

    pub fn remove_observer(&self, subscription: Subscription) -> bool {
        self.inner.keepalive.lock().unwrap().remove(&subscription);
        self.inner.unsubscribe(subscription)
    }

    pub fn on_add(&self, f: impl Fn(&M, usize) + Send + Sync + 'static) -> Subscription {
        self.add_observer(Arc::new(NotifyFnObserver::<dyn ListView<M>, _>::new(
            move |diff: &ListDiff<M>| {
                if let ListDiff::Add { item, idx } = diff {
                    f(item, *idx);
                }
            },
        )))
    }

    pub fn on_remove(&self, f: impl Fn(&M, usize) + Send + Sync + 'static) -> Subscription {
        self.add_observer(Arc::new(NotifyFnObserver::<dyn ListView<M>, _>::new(
            move |diff: &ListDiff<M>| {
                if let ListDiff::Remove { item, idx } = diff {
                    f(item, *idx);
                }
            },
        )))
    }

    /// Every diff from now on, as an async stream that ends when the view is
    /// disposed.
    pub fn event_stream(&self) -> ChannelReceiver<ListDiff<M>> {
        let (tx, rx) = queue_channel::<ListDiff<M>>();
        let tx: Arc<dyn Observer<dyn ListView<M>>> = Arc::new(tx);
        self.add_observer(tx);
        rx
    }
}

impl<S, M> View for DerivedView<S, M>
where
    S: SourceItem,
    M: Clone + PartialEq + Send + Sync + 'static,
{
    type Msg = ListDiff<M>;
}

impl<S, M> ListView<M> for DerivedView<S, M>
where
    S: SourceItem,
    M: Clone + PartialEq + Send + Sync + 'static,
{
    fn len(&self) -> usize {
        DerivedView::len(self)
    }

    fn get(&self, idx: usize) -> Option<M> {
        self.at(idx)
    }

    fn changes(&self) -> Option<&dyn Observable<dyn ListView<M>>> {
        Some(&*self.inner)
    }
}

impl<S, M> std::fmt::Debug for DerivedView<S, M>
where
    S: SourceItem,
    M: Clone + PartialEq + Send + Sync + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedView")
            .field("items", &self.to_array())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        buffer::{item::ItemCell, vec::VecBuffer},
        view::TaskQueue,
    };

    const FRUITS: [&str; 4] = ["banana", "pineapple", "orange", "apple"];

    /// Collects every diff and checks it against a mirror of the output.
    fn record<S, M>(view: &DerivedView<S, M>) -> Arc<Mutex<(Vec<M>, Vec<ListDiff<M>>)>>
    where
        S: SourceItem,
        M: Clone + PartialEq + Send + Sync + std::fmt::Debug + 'static,
    {
        let log = Arc::new(Mutex::new((view.to_array(), Vec::new())));
        view.add_observer(Arc::new(NotifyFnObserver::<dyn ListView<M>, _>::new({
            let log = log.clone();
            move |diff: &ListDiff<M>| {
                let mut log = log.lock().unwrap();
                diff.apply_to(&mut log.0).unwrap();
                log.1.push(diff.clone());
            }
        })));
        log
    }

    #[test]
    fn sorted_insert_lands_in_order() {
        let buffer: VecBuffer<&'static str> = FRUITS.into_iter().collect();
        let view = DerivedView::new(buffer.get_view(), ViewOptions::<&str>::new().compare(|a, b| a.cmp(b))).unwrap();
        assert_eq!(view.to_array(), vec!["apple", "banana", "orange", "pineapple"]);

        let log = record(&view);
        buffer.push("passionfruit");

        assert_eq!(
            log.lock().unwrap().1,
            vec![ListDiff::Add { item: "passionfruit", idx: 3 }]
        );
        assert_eq!(log.lock().unwrap().0, view.to_array());
    }

    #[test]
    fn filtered_remove() {
        let buffer: VecBuffer<&'static str> = FRUITS.into_iter().collect();
        let view = DerivedView::new(buffer.get_view(), ViewOptions::<&str>::new().filter(|s| s.len() <= 6)).unwrap();
        assert_eq!(view.to_array(), vec!["banana", "orange", "apple"]);

        let log = record(&view);
        buffer.remove(2);

        assert_eq!(
            log.lock().unwrap().1,
            vec![ListDiff::Remove { item: "orange", idx: 1 }]
        );
        assert_eq!(view.to_array(), vec!["banana", "apple"]);
    }

    #[test]
    fn window_shifts_on_insert_before_it() {
        let buffer: VecBuffer<&'static str> = FRUITS.into_iter().collect();
        let view = DerivedView::new(buffer.get_view(), ViewOptions::<&str>::new().begin(1).end(3)).unwrap();
        assert_eq!(view.to_array(), vec!["pineapple", "orange"]);

        let log = record(&view);
        buffer.insert(0, "kiwi");

        assert_eq!(view.to_array(), vec!["banana", "pineapple"]);
        assert_eq!(log.lock().unwrap().0, view.to_array());
        assert_eq!(log.lock().unwrap().1.len(), 2);
    }

    #[test]
    fn item_changes_move_and_toggle() {
        let cells: Vec<ItemCell<u32>> = [5, 1, 9, 3].into_iter().map(ItemCell::new).collect();
        let buffer: VecBuffer<ItemCell<u32>> = cells.iter().cloned().collect();
        let view = DerivedView::new(
            buffer.get_view(),
            ViewOptions::mapped(|c: &ItemCell<u32>| c.get())
                .filter(|c| c.get() < 100)
                .compare(|a, b| a.cmp(b)),
        )
        .unwrap();
        assert_eq!(view.to_array(), vec![1, 3, 5, 9]);
        assert_eq!(view.tracked_items(), 4);

        let log = record(&view);

        cells[0].set(2);
        assert_eq!(view.to_array(), vec![1, 2, 3, 9]);

        cells[2].set(200);
        assert_eq!(view.to_array(), vec![1, 2, 3]);

        cells[2].set(0);
        assert_eq!(view.to_array(), vec![0, 1, 2, 3]);

        // unchanged value, nothing to announce
        let n = log.lock().unwrap().1.len();
        cells[1].set(1);
        assert_eq!(log.lock().unwrap().1.len(), n);

        assert_eq!(log.lock().unwrap().0, view.to_array());
    }

    #[test]
    fn coalesced_changes_resync_once() {
        let queue = Arc::new(TaskQueue::new());
        let cells: Vec<ItemCell<i32>> = (0..5).map(ItemCell::new).collect();
        let buffer: VecBuffer<ItemCell<i32>> = cells.iter().cloned().collect();
        let view = DerivedView::new(
            buffer.get_view(),
            ViewOptions::mapped(|c: &ItemCell<i32>| c.get())
                .compare(|a, b| a.cmp(b))
                .coalesce(queue.clone()),
        )
        .unwrap();
        let log = record(&view);

        for cell in &cells {
            cell.modify(|v| *v = -*v);
        }
        assert_eq!(queue.len(), 1);
        assert!(log.lock().unwrap().1.is_empty());
        assert_eq!(view.to_array(), vec![0, 1, 2, 3, 4]);

        assert_eq!(queue.flush(), 1);
        assert_eq!(view.to_array(), vec![-4, -3, -2, -1, 0]);
        assert_eq!(log.lock().unwrap().0, view.to_array());
    }

    #[test]
    fn coalesced_change_of_an_unknown_item_schedules_nothing() {
        let queue = Arc::new(TaskQueue::new());
        let cells: Vec<ItemCell<i32>> = (0..3).map(ItemCell::new).collect();
        let buffer: VecBuffer<ItemCell<i32>> = cells.iter().cloned().collect();
        let view = DerivedView::new(
            buffer.get_view(),
            ViewOptions::mapped(|c: &ItemCell<i32>| c.get()).coalesce(queue.clone()),
        )
        .unwrap();

        let stranger = ItemCell::new(7);
        ItemSink::item_changed(&*view.inner, &stranger.id());
        assert!(queue.is_empty());

        cells[1].set(10);
        assert_eq!(queue.len(), 1);
        queue.flush();
        assert_eq!(view.to_array(), vec![0, 10, 2]);
    }

    #[test]
    fn concurrent_writers_deliver_in_state_order() {
        let cells: Vec<ItemCell<i32>> = (0..8).map(ItemCell::new).collect();
        let buffer: VecBuffer<ItemCell<i32>> = cells.iter().cloned().collect();
        let view = DerivedView::new(
            buffer.get_view(),
            ViewOptions::mapped(|c: &ItemCell<i32>| c.get())
                .compare(|a, b| a.cmp(b))
                .end(4),
        )
        .unwrap();
        let log = record(&view);

        std::thread::scope(|scope| {
            for (t, cell) in cells.iter().enumerate() {
                scope.spawn(move || {
                    for round in 0..50 {
                        cell.set((round * 7 + t as i32 * 3) % 41 - 20);
                    }
                });
            }
        });

        assert_eq!(log.lock().unwrap().0, view.to_array());
        let mut values: Vec<i32> = cells.iter().map(|c| c.get()).collect();
        values.sort();
        assert_eq!(view.to_array(), values[..4].to_vec());
    }

    #[test]
    fn set_source_announces_the_difference() {
        let a: VecBuffer<char> = "abcd".chars().collect();
        let b: VecBuffer<char> = "xbcy".chars().collect();
        let view = DerivedView::new(a.get_view(), ViewOptions::new()).unwrap();
        let log = record(&view);

        view.set_source(b.get_view());
        assert_eq!(view.to_array(), vec!['x', 'b', 'c', 'y']);
        assert_eq!(log.lock().unwrap().0, view.to_array());
        assert_eq!(log.lock().unwrap().1.len(), 4);

        // the old source is no longer observed
        a.push('z');
        b.push('w');
        assert_eq!(view.to_array(), vec!['x', 'b', 'c', 'y', 'w']);
    }

    #[test]
    fn dispose_is_idempotent_and_silences_the_view() {
        let cell = ItemCell::new(1);
        let buffer: VecBuffer<ItemCell<i32>> = vec![cell.clone(), cell.clone()].into_iter().collect();
        let view = DerivedView::new(buffer.get_view(), ViewOptions::mapped(|c: &ItemCell<i32>| c.get())).unwrap();
        assert_eq!(view.tracked_items(), 1);
        assert_eq!(cell.watcher_count(), 1);

        let stream = view.event_stream();
        view.dispose();
        view.dispose();
        assert!(view.is_disposed());
        assert_eq!(cell.watcher_count(), 0);
        assert_eq!(view.observer_count(), 0);

        buffer.push(ItemCell::new(7));
        cell.set(5);
        assert_eq!(view.to_array(), vec![1, 1]);
        assert_eq!(async_std::task::block_on(stream.recv()), None);
    }
}

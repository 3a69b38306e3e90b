use {
    super::options::ViewOptions,
    crate::{
        projection::{
            diff::{diff_by, DiffOp},
            sorted_index::{insertion_point, locate, sort_stable},
            window::{Slot, WindowEdit},
        },
        view::{
            item::{ItemChange, ItemSignal, SourceItem},
            list::{ListDiff, ListView},
            Observer, Subscription,
        },
    },
    std::{
        cmp::Ordering,
        collections::{hash_map::Entry, HashMap, HashSet},
        ops::Range,
        sync::{Arc, Weak},
    },
};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Receives the identity of an item that announced a change.
pub(super) trait ItemSink<Id>: Send + Sync {
    fn item_changed(&self, id: &Id);
}

/// Per-identity subscription to an item's change notifications.
struct ItemWatch<Id> {
    id: Id,
    sink: Weak<dyn ItemSink<Id>>,
}

impl<Id: Send + Sync> Observer<ItemSignal> for ItemWatch<Id> {
    fn notify(&self, _: &ItemChange) {
        if let Some(sink) = self.sink.upgrade() {
            sink.item_changed(&self.id);
        }
    }
}

struct Tracked<S: SourceItem> {
    refs: usize,
    item: S,
    _watch: Arc<dyn Observer<ItemSignal>>,
    subscription: Subscription,
}

struct SourceLink<S: SourceItem> {
    view: Arc<dyn ListView<S>>,
    subscription: Option<Subscription>,
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

struct Container<S, M> {
    key: u64,
    rev: u64,
    item: S,
    mapped: M,
    visible: bool,
}

pub(super) struct ViewState<S: SourceItem, M> {
    opts: ViewOptions<S, M>,

    /// every tracked item, visible or not, in output order
    list: Vec<Container<S, M>>,
    visible: usize,

    tracked: HashMap<S::Id, Tracked<S>>,
    dirty: HashSet<S::Id>,
    resync_pending: bool,
    next_key: u64,

    sink: Weak<dyn ItemSink<S::Id>>,
    observer: Weak<dyn Observer<dyn ListView<S>>>,
    source: Option<SourceLink<S>>,

    pub(super) disposed: bool,
}

impl<S, M> ViewState<S, M>
where
    S: SourceItem,
    M: Clone + PartialEq + Send + Sync + 'static,
{
    pub(super) fn new(
        opts: ViewOptions<S, M>,
        sink: Weak<dyn ItemSink<S::Id>>,
        observer: Weak<dyn Observer<dyn ListView<S>>>,
    ) -> Self {
        ViewState {
            opts,
            list: Vec::new(),
            visible: 0,
            tracked: HashMap::new(),
            dirty: HashSet::new(),
            resync_pending: false,
            next_key: 0,
            sink,
            observer,
            source: None,
            disposed: false,
        }
    }

    /*\
    <<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                      Reading
    <<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
    \*/

    fn window(&self) -> Range<usize> {
        self.opts.window.resolve(self.visible)
    }

    pub(super) fn len(&self) -> usize {
        self.window().len()
    }

    /// Number of visible containers before list index `i`.
    fn rank(&self, i: usize) -> usize {
        if self.opts.filter.is_none() {
            i
        } else {
            self.list[..i].iter().filter(|c| c.visible).count()
        }
    }

    fn nth_visible(&self, j: usize) -> Option<&Container<S, M>> {
        if self.opts.filter.is_none() {
            self.list.get(j)
        } else {
            self.list.iter().filter(|c| c.visible).nth(j)
        }
    }

    fn windowed(&self) -> impl Iterator<Item = &Container<S, M>> {
        let window = self.window();
        self.list
            .iter()
            .filter(|c| c.visible)
            .skip(window.start)
            .take(window.len())
    }

    pub(super) fn at(&self, idx: usize) -> Option<M> {
        let window = self.window();
        if idx < window.len() {
            self.nth_visible(window.start + idx).map(|c| c.mapped.clone())
        } else {
            None
        }
    }

    pub(super) fn index_of(&self, value: &M) -> Option<usize> {
        self.windowed().position(|c| c.mapped == *value)
    }

    pub(super) fn index_of_item(&self, item: &S) -> Option<usize> {
        let id = item.id();
        self.windowed().position(|c| c.item.id() == id)
    }

    pub(super) fn to_vec(&self) -> Vec<M> {
        self.windowed().map(|c| c.mapped.clone()).collect()
    }

    pub(super) fn tracked_len(&self) -> usize {
        self.tracked.len()
    }

    /*\
    <<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                     Bookkeeping
    <<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
    \*/

    fn derive(&self, item: &S) -> (M, bool) {
        let mapped = (self.opts.map)(item);
        let visible = self.opts.filter.as_ref().map_or(true, |f| f(item));
        (mapped, visible)
    }

    fn container(&mut self, item: S) -> Container<S, M> {
        let (mapped, visible) = self.derive(&item);
        self.next_key += 1;
        Container {
            key: self.next_key,
            rev: 0,
            item,
            mapped,
            visible,
        }
    }

    fn in_order(&self, left: &M, right: &M) -> bool {
        match &self.opts.compare {
            Some(cmp) => cmp(left, right) != Ordering::Greater,
            None => true,
        }
    }

    fn track(&mut self, item: &S) {
        let changes = match item.changes() {
            Some(changes) => changes,
            None => return,
        };

        match self.tracked.entry(item.id()) {
            Entry::Occupied(mut e) => e.get_mut().refs += 1,
            Entry::Vacant(e) => {
                let watch: Arc<dyn Observer<ItemSignal>> = Arc::new(ItemWatch {
                    id: item.id(),
                    sink: self.sink.clone(),
                });
                let subscription = changes.subscribe(Arc::downgrade(&watch));
                e.insert(Tracked {
                    refs: 1,
                    item: item.clone(),
                    _watch: watch,
                    subscription,
                });
            }
        }
    }

    fn untrack(&mut self, item: &S) {
        if let Entry::Occupied(mut e) = self.tracked.entry(item.id()) {
            e.get_mut().refs -= 1;
            if e.get().refs == 0 {
                let tracked = e.remove();
                if let Some(changes) = tracked.item.changes() {
                    changes.unsubscribe(tracked.subscription);
                }
            }
        }
    }

    /// Drops every subscription this view holds, keeping its contents.
    pub(super) fn unsubscribe_all(&mut self) {
        if let Some(link) = self.source.take() {
            if let (Some(changes), Some(subscription)) = (link.view.changes(), link.subscription) {
                changes.unsubscribe(subscription);
            }
        }

        for (_, tracked) in self.tracked.drain() {
            if let Some(changes) = tracked.item.changes() {
                changes.unsubscribe(tracked.subscription);
            }
        }
    }

    /// Turns window edits into list diffs. `gone` is the subject's old
    /// output value, `came` its new one; `Slot::At` refers to the list as it
    /// is now.
    fn render(
        &self,
        edits: Vec<WindowEdit>,
        gone: Option<&M>,
        came: Option<&M>,
        events: &mut Vec<ListDiff<M>>,
    ) {
        for edit in edits {
            let (add, idx, slot) = match edit {
                WindowEdit::Add { at, slot } => (true, at, slot),
                WindowEdit::Remove { at, slot } => (false, at, slot),
            };
            let item = match slot {
                Slot::Subject if add => came.cloned(),
                Slot::Subject => gone.cloned(),
                Slot::At(j) => self.nth_visible(j).map(|c| c.mapped.clone()),
            };

            match item {
                Some(item) if add => events.push(ListDiff::Add { item, idx }),
                Some(item) => events.push(ListDiff::Remove { item, idx }),
                None => log::warn!("window edit {:?} points past the visible list", edit),
            }
        }
    }

    /*\
    <<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                  Source Attachment
    <<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
    \*/

    /// Seeds the list from `source` and subscribes to it. Emits nothing.
    pub(super) fn attach(&mut self, source: Arc<dyn ListView<S>>) {
        let len = source.len();
        for idx in 0..len {
            if let Some(item) = source.get(idx) {
                self.track(&item);
                let container = self.container(item);
                self.list.push(container);
            }
        }
        self.visible = self.list.iter().filter(|c| c.visible).count();

        if let Some(cmp) = &self.opts.compare {
            sort_stable(&mut self.list, |a, b| cmp(&a.mapped, &b.mapped));
        }

        let subscription = source
            .changes()
            .map(|changes| changes.subscribe(self.observer.clone()));
        self.source = Some(SourceLink {
            view: source,
            subscription,
        });
    }

    pub(super) fn set_source(&mut self, source: Arc<dyn ListView<S>>, events: &mut Vec<ListDiff<M>>) {
        let before: Vec<(S::Id, M)> = self
            .windowed()
            .map(|c| (c.item.id(), c.mapped.clone()))
            .collect();

        self.unsubscribe_all();
        self.list.clear();
        self.visible = 0;
        self.dirty.clear();

        self.attach(source);

        let after: Vec<(S::Id, M)> = self
            .windowed()
            .map(|c| (c.item.id(), c.mapped.clone()))
            .collect();

        let n = events.len();
        diff_by(&before, &after, |a, b| a == b, |op| {
            events.push(match op {
                DiffOp::Remove { item, at, .. } => ListDiff::Remove {
                    item: item.1.clone(),
                    idx: at,
                },
                DiffOp::Add { item, at, .. } => ListDiff::Add {
                    item: item.1.clone(),
                    idx: at,
                },
            })
        });
        log::debug!(
            "source replaced: {} -> {} items, {} events",
            before.len(),
            after.len(),
            events.len() - n
        );
    }

    /*\
    <<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                   Source Changes
    <<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
    \*/

    pub(super) fn source_added(&mut self, item: S, idx: usize, events: &mut Vec<ListDiff<M>>) {
        self.track(&item);
        let container = self.container(item);

        let i = match &self.opts.compare {
            Some(cmp) => insertion_point(&self.list, &container.mapped, |c, m| cmp(&c.mapped, m)),
            None => {
                if idx > self.list.len() {
                    log::warn!(
                        "source insert at {} past the end of {} tracked items",
                        idx,
                        self.list.len()
                    );
                }
                idx.min(self.list.len())
            }
        };

        let len = self.visible;
        let p = self.rank(i);
        let came = container.visible.then(|| container.mapped.clone());
        self.list.insert(i, container);

        if let Some(came) = came {
            self.visible += 1;
            let edits = self.opts.window.on_insert(len, p);
            self.render(edits, None, Some(&came), events);
        }
    }

    fn find(&self, item: &S, hint: usize) -> Option<usize> {
        let id = item.id();
        match &self.opts.compare {
            Some(cmp) => {
                let key = (self.opts.map)(item);
                locate(&self.list, &key, |c, k| cmp(&c.mapped, k), |c| c.item.id() == id)
            }
            None => match self.list.get(hint) {
                Some(c) if c.item.id() == id => Some(hint),
                _ => self.list.iter().position(|c| c.item.id() == id),
            },
        }
    }

    pub(super) fn source_removed(&mut self, item: &S, idx: usize, events: &mut Vec<ListDiff<M>>) {
        let i = match self.find(item, idx) {
            Some(i) => i,
            None => {
                log::warn!("source removed {:?}, which this view does not track", item.id());
                return;
            }
        };

        let len = self.visible;
        let p = self.rank(i);
        let gone = self.list.remove(i);
        self.untrack(&gone.item);

        if gone.visible {
            self.visible -= 1;
            let edits = self.opts.window.on_remove(len, p);
            self.render(edits, Some(&gone.mapped), None, events);
        }
    }

    /*\
    <<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    Item Changes
    <<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
    \*/

    /// Re-evaluates every container holding the item `id`.
    pub(super) fn item_changed(&mut self, id: &S::Id, events: &mut Vec<ListDiff<M>>) {
        let keys: Vec<u64> = self
            .list
            .iter()
            .filter(|c| c.item.id() == *id)
            .map(|c| c.key)
            .collect();

        if keys.is_empty() {
            log::warn!("change of {:?}, which this view does not track", id);
        }
        for key in keys {
            self.reevaluate(key, events);
        }
    }

    fn reevaluate(&mut self, key: u64, events: &mut Vec<ListDiff<M>>) {
        let i = match self.list.iter().position(|c| c.key == key) {
            Some(i) => i,
            None => return,
        };

        let (mapped, visible) = self.derive(&self.list[i].item);
        let was_visible = self.list[i].visible;
        let changed = mapped != self.list[i].mapped;
        if !changed && visible == was_visible {
            return;
        }

        let len = self.visible;
        let p = self.rank(i);

        let mut c = self.list.remove(i);
        let old = std::mem::replace(&mut c.mapped, mapped);
        if changed {
            c.rev += 1;
        }
        c.visible = visible;

        let left_ok = i == 0 || self.in_order(&self.list[i - 1].mapped, &c.mapped);
        let right_ok = i == self.list.len() || self.in_order(&c.mapped, &self.list[i].mapped);
        let k = match &self.opts.compare {
            Some(cmp) if !(left_ok && right_ok) => {
                insertion_point(&self.list, &c.mapped, |x, m| cmp(&x.mapped, m))
            }
            _ => i,
        };
        let came = c.mapped.clone();
        self.list.insert(k, c);

        let edits = match (was_visible, visible) {
            (true, false) => {
                self.visible -= 1;
                self.opts.window.on_remove(len, p)
            }
            (false, true) => {
                self.visible += 1;
                self.opts.window.on_insert(len, self.rank(k))
            }
            (true, true) => self.opts.window.on_move(len, p, self.rank(k)),
            (false, false) => Vec::new(),
        };
        self.render(edits, Some(&old), Some(&came), events);
    }

    /*\
    <<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                   Resynchronization
    <<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
    \*/

    /// Marks `id` for the next resync. Returns `true` if no resync is
    /// pending yet, i.e. the caller has to schedule one.
    pub(super) fn mark_dirty(&mut self, id: S::Id) -> bool {
        if !self.tracked.contains_key(&id) {
            log::warn!("change of {:?}, which this view does not track", id);
            return false;
        }
        self.dirty.insert(id);
        !std::mem::replace(&mut self.resync_pending, true)
    }

    /// Re-derives the dirty containers (or all of them), restores the order
    /// and emits the difference of the windowed output in one pass.
    pub(super) fn resync(&mut self, everything: bool, events: &mut Vec<ListDiff<M>>) {
        self.resync_pending = false;
        let dirty = std::mem::take(&mut self.dirty);

        let before: Vec<(u64, u64, M)> = self
            .windowed()
            .map(|c| (c.key, c.rev, c.mapped.clone()))
            .collect();

        let ViewState { opts, list, .. } = self;
        for c in list.iter_mut() {
            if everything || dirty.contains(&c.item.id()) {
                let mapped = (opts.map)(&c.item);
                if mapped != c.mapped {
                    c.mapped = mapped;
                    c.rev += 1;
                }
                c.visible = opts.filter.as_ref().map_or(true, |f| f(&c.item));
            }
        }
        self.visible = self.list.iter().filter(|c| c.visible).count();

        if let Some(cmp) = &self.opts.compare {
            sort_stable(&mut self.list, |a, b| cmp(&a.mapped, &b.mapped));
        }

        let after: Vec<(u64, u64, M)> = self
            .windowed()
            .map(|c| (c.key, c.rev, c.mapped.clone()))
            .collect();

        let n = events.len();
        diff_by(&before, &after, |a, b| a.0 == b.0 && a.1 == b.1, |op| {
            events.push(match op {
                DiffOp::Remove { item, at, .. } => ListDiff::Remove {
                    item: item.2.clone(),
                    idx: at,
                },
                DiffOp::Add { item, at, .. } => ListDiff::Add {
                    item: item.2.clone(),
                    idx: at,
                },
            })
        });
        log::debug!(
            "resync of {} items: {} events",
            if everything { self.list.len() } else { dirty.len() },
            events.len() - n
        );
    }
}

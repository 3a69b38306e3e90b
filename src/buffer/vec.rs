use {
    crate::view::{
        list::{ListDiff, ListView},
        Observable, ObserverBroadcast, View,
    },
    std::sync::{Arc, RwLock},
};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

struct VecView<T>
where
    T: Clone + Send + Sync + 'static,
{
    data: RwLock<Vec<T>>,
    cast: ObserverBroadcast<dyn ListView<T>>,
}

impl<T> View for VecView<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Msg = ListDiff<T>;
}

impl<T> ListView<T> for VecView<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn len(&self) -> usize {
        self.data.read().unwrap().len()
    }

    fn get(&self, idx: usize) -> Option<T> {
        self.data.read().unwrap().get(idx).cloned()
    }

    fn changes(&self) -> Option<&dyn Observable<dyn ListView<T>>> {
        Some(&self.cast)
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Mutable, observable list. Every mutation is announced to the observers of
/// [`VecBuffer::get_view`] as add/remove diffs.
#[derive(Clone)]
pub struct VecBuffer<T>
where
    T: Clone + Send + Sync + 'static,
{
    view: Arc<VecView<T>>,
}

impl<T> VecBuffer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn with_data(data: Vec<T>) -> Self {
        VecBuffer {
            view: Arc::new(VecView {
                data: RwLock::new(data),
                cast: ObserverBroadcast::new(),
            }),
        }
    }

    pub fn new() -> Self {
        VecBuffer::with_data(Vec::new())
    }

    pub fn get_view(&self) -> Arc<dyn ListView<T>> {
        self.view.clone()
    }

    pub fn apply_diff(&self, diff: ListDiff<T>) {
        self.apply_with(|_| Some(diff));
    }

    /// Builds a diff from the current data and applies it, both under the
    /// write lock. The diff is queued for the observers before the lock is
    /// released, so concurrent mutations are announced in the order they
    /// were applied.
    fn apply_with(&self, make_diff: impl FnOnce(&Vec<T>) -> Option<ListDiff<T>>) {
        let mut data = self.view.data.write().unwrap();
        let diff = match make_diff(&data) {
            Some(diff) => diff,
            None => return,
        };
        if let Err(err) = diff.apply_to(&mut data) {
            log::warn!("dropping list diff: {}", err);
            return;
        }
        self.view.cast.enqueue(Some(diff));
        drop(data);

        self.view.cast.update();
    }

    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, idx: usize) -> Option<T> {
        self.view.get(idx)
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.view.data.read().unwrap().clone()
    }

    pub fn push(&self, item: T) {
        self.apply_with(|data| Some(ListDiff::Add { item, idx: data.len() }));
    }

    pub fn insert(&self, idx: usize, item: T) {
        self.apply_diff(ListDiff::Add { item, idx });
    }

    pub fn remove(&self, idx: usize) -> Option<T> {
        let mut removed = None;
        self.apply_with(|data| {
            let item = data.get(idx)?.clone();
            removed = Some(item.clone());
            Some(ListDiff::Remove { item, idx })
        });
        removed
    }

    /// Replaces the element at `idx`, announced as a remove followed by an add.
    pub fn update(&self, idx: usize, item: T) {
        if self.remove(idx).is_some() {
            self.insert(idx, item);
        }
    }

    pub fn clear(&self) {
        while let Some(idx) = self.len().checked_sub(1) {
            self.remove(idx);
        }
    }
}

impl<T> Default for VecBuffer<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        VecBuffer::new()
    }
}

impl<T> FromIterator<T> for VecBuffer<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        VecBuffer::with_data(iter.into_iter().collect())
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

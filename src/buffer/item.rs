use {
    crate::view::{
        item::{ItemChange, ItemSignal, SourceItem},
        Observable, Observer, ObserverBroadcast,
    },
    std::{
        ops::{Deref, DerefMut},
        sync::{
            atomic::{AtomicU64, Ordering},
            Arc, RwLock,
        },
    },
};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Shared, observable value.
///
/// Clones are handles to the same value and compare equal; each mutation
/// announces one [`ItemChange`] to everyone watching the cell.
pub struct ItemCell<T> {
    id: ItemId,
    value: Arc<RwLock<T>>,
    cast: Arc<ObserverBroadcast<ItemSignal>>,
}

impl<T> ItemCell<T> {
    pub fn new(value: T) -> Self {
        ItemCell {
            id: ItemId(NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed)),
            value: Arc::new(RwLock::new(value)),
            cast: Arc::new(ObserverBroadcast::new()),
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Number of live subscriptions to this cell's changes.
    pub fn watcher_count(&self) -> usize {
        self.cast.observer_count()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read().unwrap())
    }

    pub fn set(&self, new_value: T) {
        let mut v = self.value.write().unwrap();
        *v = new_value;
        drop(v);
        self.cast.notify(&ItemChange);
    }

    /// Applies any number of field changes and announces them once.
    pub fn modify<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut v = self.value.write().unwrap();
        let result = f(&mut v);
        drop(v);
        self.cast.notify(&ItemChange);
        result
    }
}

impl<T: Clone> ItemCell<T> {
    pub fn get(&self) -> T {
        self.value.read().unwrap().clone()
    }

    pub fn get_mut(&self) -> MutableItemAccess<T> {
        MutableItemAccess {
            cell: self.clone(),
            val: self.get(),
        }
    }
}

impl<T> Clone for ItemCell<T> {
    fn clone(&self) -> Self {
        ItemCell {
            id: self.id,
            value: self.value.clone(),
            cast: self.cast.clone(),
        }
    }
}

impl<T> PartialEq for ItemCell<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ItemCell<T> {}

impl<T: std::fmt::Debug> std::fmt::Debug for ItemCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemCell")
            .field("id", &self.id.0)
            .field("value", &*self.value.read().unwrap())
            .finish()
    }
}

impl<T: Send + Sync + 'static> SourceItem for ItemCell<T> {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }

    fn changes(&self) -> Option<&dyn Observable<ItemSignal>> {
        Some(&*self.cast)
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Edits a copy of the value and writes it back, with one notification,
/// when dropped.
pub struct MutableItemAccess<T: Clone> {
    cell: ItemCell<T>,
    val: T,
}

impl<T: Clone> Deref for MutableItemAccess<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.val
    }
}

impl<T: Clone> DerefMut for MutableItemAccess<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.val
    }
}

impl<T: Clone> Drop for MutableItemAccess<T> {
    fn drop(&mut self) {
        self.cell.set(self.val.clone());
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

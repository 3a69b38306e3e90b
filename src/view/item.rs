use {
    crate::view::{Observable, View},
    serde::{Deserialize, Serialize},
    std::{fmt::Debug, hash::Hash},
};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Opaque notification that an item changed in place.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChange;

/// The view type of per-item change notifications.
pub struct ItemSignal;

impl View for ItemSignal {
    type Msg = ItemChange;
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// An element of a source list.
///
/// `id` must be stable for the lifetime of the item, it is how derived views
/// find their bookkeeping for an item again. Items that can change in place
/// return their notification capability from `changes`; plain values keep the
/// default and are never re-evaluated on their own.
pub trait SourceItem: Clone + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    fn id(&self) -> Self::Id;

    fn changes(&self) -> Option<&dyn Observable<ItemSignal>> {
        None
    }
}

macro_rules! plain_source_items {
    ($($t:ty),*) => {
        $(
            impl SourceItem for $t {
                type Id = $t;

                fn id(&self) -> Self::Id {
                    self.clone()
                }
            }
        )*
    };
}

plain_source_items!(
    &'static str, String, char, bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize
);

use {
    crate::{
        error::ViewError,
        view::{Observable, View},
    },
    serde::{Deserialize, Serialize},
};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Positional change of a list, addressed against the list as it was right
/// before this change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListDiff<T> {
    Add { item: T, idx: usize },
    Remove { item: T, idx: usize },
}

impl<T> ListDiff<T> {
    pub fn item(&self) -> &T {
        match self {
            ListDiff::Add { item, .. } | ListDiff::Remove { item, .. } => item,
        }
    }

    pub fn idx(&self) -> usize {
        match self {
            ListDiff::Add { idx, .. } | ListDiff::Remove { idx, .. } => *idx,
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, ListDiff::Add { .. })
    }
}

impl<T: Clone> ListDiff<T> {
    /// Replays this change onto a mirror of the observed list.
    pub fn apply_to(&self, mirror: &mut Vec<T>) -> Result<(), ViewError> {
        match self {
            ListDiff::Add { item, idx } if *idx <= mirror.len() => {
                mirror.insert(*idx, item.clone());
                Ok(())
            }
            ListDiff::Remove { idx, .. } if *idx < mirror.len() => {
                mirror.remove(*idx);
                Ok(())
            }
            _ => Err(ViewError::DiffOutOfRange {
                idx: self.idx(),
                len: mirror.len(),
            }),
        }
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

pub trait ListView<Item>: View<Msg = ListDiff<Item>>
where
    Item: Clone + Send + Sync + 'static,
{
    fn len(&self) -> usize;
    fn get(&self, idx: usize) -> Option<Item>;

    /// Add/remove notifications, if this list can change at all.
    fn changes(&self) -> Option<&dyn Observable<dyn ListView<Item>>> {
        None
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

pub trait ListViewExt<T>: ListView<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn iter(&self) -> ListViewIter<'_, T, Self> {
        ListViewIter {
            _phantom: std::marker::PhantomData,
            view: self,
            cur: 0,
        }
    }
}

impl<T, V: ListView<T> + ?Sized> ListViewExt<T> for V where T: Clone + Send + Sync + 'static {}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

pub struct ListViewIter<'a, T, V>
where
    T: Clone + Send + Sync + 'static,
    V: ListView<T> + ?Sized,
{
    _phantom: std::marker::PhantomData<T>,
    view: &'a V,
    cur: usize,
}

impl<'a, T, V> Iterator for ListViewIter<'a, T, V>
where
    T: Clone + Send + Sync + 'static,
    V: ListView<T> + ?Sized,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.cur;
        self.cur += 1;
        self.view.get(i)
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

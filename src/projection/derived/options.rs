use {
    crate::{
        error::ViewError,
        projection::window::Window,
        view::{item::SourceItem, Scheduler},
    },
    serde::{Deserialize, Serialize},
    std::{cmp::Ordering, sync::Arc, time::Duration},
};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

pub type MapFn<S, M> = Arc<dyn Fn(&S) -> M + Send + Sync>;
pub type FilterFn<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;
pub type CompareFn<M> = Arc<dyn Fn(&M, &M) -> Ordering + Send + Sync>;

/// How a [`DerivedView`](super::DerivedView) derives its output from the
/// source.
///
/// `map` produces the output value, which is also what `compare` orders by.
/// `filter` looks at the source item.
pub struct ViewOptions<S, M = S> {
    pub map: MapFn<S, M>,
    pub filter: Option<FilterFn<S>>,
    pub compare: Option<CompareFn<M>>,
    pub window: Window,
    pub auto_dispose_after: Option<Duration>,
    pub coalesce: Option<Arc<dyn Scheduler>>,
}

impl<S: SourceItem> ViewOptions<S, S> {
    pub fn new() -> Self {
        ViewOptions::mapped(S::clone)
    }
}

impl<S: SourceItem> Default for ViewOptions<S, S> {
    fn default() -> Self {
        ViewOptions::new()
    }
}

impl<S, M> ViewOptions<S, M> {
    pub fn mapped(f: impl Fn(&S) -> M + Send + Sync + 'static) -> Self {
        ViewOptions {
            map: Arc::new(f),
            filter: None,
            compare: None,
            window: Window::unbounded(),
            auto_dispose_after: None,
            coalesce: None,
        }
    }

    pub fn filter(mut self, f: impl Fn(&S) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(f));
        self
    }

    pub fn compare(mut self, f: impl Fn(&M, &M) -> Ordering + Send + Sync + 'static) -> Self {
        self.compare = Some(Arc::new(f));
        self
    }

    pub fn begin(mut self, begin: isize) -> Self {
        self.window.begin = begin;
        self
    }

    pub fn end(mut self, end: isize) -> Self {
        self.window.end = Some(end);
        self
    }

    pub fn window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    pub fn auto_dispose_after(mut self, timeout: Duration) -> Self {
        self.auto_dispose_after = Some(timeout);
        self
    }

    /// Defer item changes into one resynchronization pass run by `scheduler`.
    pub fn coalesce(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.coalesce = Some(scheduler);
        self
    }

    /// Takes over the window and idle timeout from a plain-data config.
    pub fn with_config(mut self, config: &ViewConfig) -> Self {
        self.window = Window::new(config.begin, config.end);
        self.auto_dispose_after = config.auto_dispose_after_ms.map(Duration::from_millis);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ViewError> {
        match self.auto_dispose_after {
            Some(timeout) if timeout.is_zero() => Err(ViewError::ZeroIdleTimeout),
            _ => Ok(()),
        }
    }
}

impl<S, M> Clone for ViewOptions<S, M> {
    fn clone(&self) -> Self {
        ViewOptions {
            map: self.map.clone(),
            filter: self.filter.clone(),
            compare: self.compare.clone(),
            window: self.window,
            auto_dispose_after: self.auto_dispose_after,
            coalesce: self.coalesce.clone(),
        }
    }
}

impl<S, M> std::fmt::Debug for ViewOptions<S, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewOptions")
            .field("filter", &self.filter.is_some())
            .field("compare", &self.compare.is_some())
            .field("window", &self.window)
            .field("auto_dispose_after", &self.auto_dispose_after)
            .field("coalesce", &self.coalesce.is_some())
            .finish()
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// The serializable part of [`ViewOptions`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    pub begin: isize,
    pub end: Option<isize>,
    pub auto_dispose_after_ms: Option<u64>,
}

impl ViewConfig {
    pub fn from_json(json: &str) -> Result<Self, ViewError> {
        serde_json::from_str(json).map_err(ViewError::InvalidConfig)
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>


                    /*\
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                   View
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    \*/
pub trait View: Send + Sync {
    /// Notification message for the observers
    type Msg: Clone + Send + Sync;
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

use std::sync::Arc;

impl<V: View + ?Sized> View for Arc<V> {
    type Msg = V::Msg;
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

pub mod channel;
pub mod item;
pub mod list;
pub mod observer;
pub mod task;

pub use {
    channel::{queue_channel, ChannelReceiver, ChannelSender},
    item::{ItemChange, ItemSignal, SourceItem},
    list::{ListDiff, ListView, ListViewExt},
    observer::{NotifyFnObserver, Observable, Observer, ObserverBroadcast, ObserverExt, Subscription},
    task::{Scheduler, SpawnScheduler, TaskQueue, UpdateTask},
};

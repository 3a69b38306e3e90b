//! Incrementally synchronized views over observable lists
//!
//! A [`DerivedView`](projection::DerivedView) observes a source list and keeps a
//! *filtered*, *mapped*, *sorted* and *windowed* projection of it up to date.
//! Every change of the source, or of an observable item inside it, is turned
//! into the smallest sequence of positional add/remove diffs, each of them valid
//! against the output as it stood right before.
//!
//! *Views* are accessor-interfaces that also define their update protocol (the diff).
//! *Observers* register with a view and are notified with every diff-message.
//! Derived views are views themselves, so they can be chained.
//!
//!# Examples
//!
//! ```
//! use r3vi_derived::{
//!     buffer::vec::VecBuffer,
//!     projection::{DerivedView, ViewOptions},
//! };
//! use std::sync::{Arc, Mutex};
//!
//! let buffer: VecBuffer<&'static str> =
//!     vec!["banana", "pineapple", "orange", "apple"].into_iter().collect();
//!
//! let view = DerivedView::new(
//!     buffer.get_view(),
//!     ViewOptions::<&str>::new()
//!         .filter(|s| s.len() <= 6)
//!         .compare(|a, b| a.cmp(b)),
//! )
//! .unwrap();
//!
//! assert_eq!(view.to_array(), vec!["apple", "banana", "orange"]);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! view.on_add({
//!     let seen = seen.clone();
//!     move |item, idx| seen.lock().unwrap().push((*item, idx))
//! });
//!
//! buffer.push("kiwi");          // sorts in between banana and orange
//! buffer.push("passionfruit");  // is eliminated by the filter
//!
//! assert_eq!(*seen.lock().unwrap(), vec![("kiwi", 2)]);
//! assert_eq!(view.at(2), Some("kiwi"));
//! ```

pub mod error;
pub mod view;
pub mod buffer;
pub mod projection;

pub use error::ViewError;

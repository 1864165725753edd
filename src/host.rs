//! The host resource bag: shared, type-keyed state handed to systems at
//! `init` time (render targets, asset registries, anything a system needs
//! beyond its own component tables).
//!
//! The teacher's own `resource.rs` keeps this bag with a hand-rolled
//! `unsafe` transmute behind a `TODO` acknowledging it's a stopgap. This
//! version keeps the same shape — a `TypeId`-keyed map of boxed values —
//! but gets the downcast from `downcast-rs`, which the workspace already
//! depends on, instead of rolling it by hand.

use std::any::TypeId;

use downcast_rs::{impl_downcast, DowncastSync};
use fxhash::FxHashMap;

/// Marker for anything storable in a [`Host`]. Blanket-implemented for
/// every `'static + Send + Sync` type.
pub trait Resource: DowncastSync {}
impl_downcast!(sync Resource);
impl<T: 'static + Send + Sync> Resource for T {}

/// A type-keyed bag of shared resources, handed to systems via
/// [`crate::system::System::init`].
#[derive(Default)]
pub struct Host {
    resources: FxHashMap<TypeId, Box<dyn Resource>>,
}

impl Host {
    pub fn new() -> Self {
        Host::default()
    }

    /// Insert a resource, replacing any prior value of the same type.
    pub fn insert<T: 'static + Send + Sync>(&mut self, value: T) {
        self.resources.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn remove<T: 'static + Send + Sync>(&mut self) -> Option<T> {
        self.resources
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.into_any().downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    pub fn get<T: 'static + Send + Sync>(&self) -> Option<&T> {
        self.resources
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any().downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static + Send + Sync>(&mut self) -> Option<&mut T> {
        self.resources
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any_mut().downcast_mut::<T>())
    }

    pub fn contains<T: 'static + Send + Sync>(&self) -> bool {
        self.resources.contains_key(&TypeId::of::<T>())
    }
}

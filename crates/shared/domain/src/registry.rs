//! Type-erased registry for feature slice state.
//!
//! Each vertical slice initializes once at startup and hands its state over
//! as an [`InitializedSlice`]; handlers later borrow it back by concrete
//! type. Slice names ride along for startup diagnostics.

use std::any::{Any, TypeId};
use std::fmt::Debug;

/// Shared, immutable state a feature slice exposes to its handlers.
pub trait FeatureSlice: Any + Debug + Send + Sync {
    /// Helper to allow downcasting from the trait object.
    fn as_any(&self) -> &dyn Any;

    /// Short name used in registration logs.
    fn name(&self) -> &'static str;
}

/// A slice ready to be registered with the server state.
#[derive(Debug)]
pub struct InitializedSlice {
    pub id: TypeId,
    pub name: &'static str,
    pub state: Box<dyn FeatureSlice>,
}

impl InitializedSlice {
    /// Wraps a concrete slice state for registration.
    pub fn new<T: FeatureSlice>(state: T) -> Self {
        let name = state.name();
        Self { id: TypeId::of::<T>(), name, state: Box::new(state) }
    }

    /// Borrow the state back as its concrete type.
    pub fn downcast_ref<T: FeatureSlice>(&self) -> Option<&T> {
        self.state.as_any().downcast_ref()
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use petgraph::graph::NodeIndex;

use crate::bases::CharacteristicBasis;
use crate::cover::MinimalImage;
use crate::invariant::Invariant;
use crate::morphism::Morphism;
use crate::periodic::Component;
use crate::placement::Placement;

/// A memoised value tagged with the graph version it was computed for
pub(crate) struct Slot<T>(RefCell<Option<(u64, Rc<T>)>>);

impl<T> Slot<T> {
    pub(crate) fn get(&self, version: u64) -> Option<Rc<T>> {
        match &*self.0.borrow() {
            Some((v, value)) if *v == version => Some(Rc::clone(value)),
            _ => None,
        }
    }

    pub(crate) fn put(&self, version: u64, value: T) -> Rc<T> {
        let value = Rc::new(value);
        *self.0.borrow_mut() = Some((version, Rc::clone(&value)));
        value
    }

    /// Looks up the value or computes it. Failed computations
    /// leave the slot untouched.
    pub(crate) fn get_or_try_init<E>(
        &self,
        version: u64,
        init: impl FnOnce() -> Result<T, E>,
    ) -> Result<Rc<T>, E> {
        if let Some(value) = self.get(version) {
            return Ok(value);
        }
        let value = init()?;
        Ok(self.put(version, value))
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self(RefCell::new(None))
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self(RefCell::new(self.0.borrow().clone()))
    }
}

/// Derived data of a periodic graph
#[derive(Clone, Default)]
pub(crate) struct Cache {
    pub(crate) components: Slot<Vec<Component>>,
    pub(crate) placement: Slot<Placement>,
    pub(crate) locally_stable: Slot<bool>,
    pub(crate) stable: Slot<bool>,
    pub(crate) ladder: Slot<bool>,
    pub(crate) bases: Slot<Vec<CharacteristicBasis>>,
    pub(crate) symmetries: Slot<Vec<Morphism>>,
    pub(crate) invariant: Slot<Invariant>,
    pub(crate) translational: Slot<Vec<Vec<NodeIndex>>>,
    pub(crate) minimal_image: Slot<MinimalImage>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Cache")
    }
}

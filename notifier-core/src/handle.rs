//!
//! Counted Notifier Handles
//!
//! A [`Handle`] is the only way a notifier is ever held.  Building a handle
//! takes the first reference, cloning a handle takes another one and dropping
//! a handle gives its reference back.  The notifier is destroyed exactly when
//! the last reference is given back, so nothing holding a handle ever frees a
//! notifier itself.
//!
//! Counting is per notifier and atomic, so handles can be cloned and dropped
//! from any number of threads at once.
//!

use std::sync::Arc;

use crate::id::NotifierId;
use crate::notifier::Notifier;

/// A counted reference to a [`Notifier`].
///
/// A handle may be empty.  Every accessor on an empty handle returns `None`
/// (or zero) instead of touching a notifier.
#[derive(Clone, Debug, Default)]
pub struct Handle {
    /// The shared notifier, `None` for an empty handle
    notifier: Option<Arc<Notifier>>,
}

impl Handle {
    /// Wrap a freshly built notifier, taking the first reference to it
    pub fn new(notifier: Notifier) -> Self {
        Self {
            notifier: Some(Arc::new(notifier)),
        }
    }

    /// A handle that refers to nothing
    pub const fn empty() -> Self {
        Self { notifier: None }
    }

    /// Whether this handle refers to nothing
    pub fn is_empty(&self) -> bool {
        self.notifier.is_none()
    }

    /// The notifier this handle refers to
    pub fn get(&self) -> Option<&Notifier> {
        self.notifier.as_deref()
    }

    /// Mutable access to the notifier.
    ///
    /// This only succeeds while this handle holds the sole reference, which
    /// is how a producer fills in a typed value before sharing the notifier.
    pub fn get_mut(&mut self) -> Option<&mut Notifier> {
        self.notifier.as_mut().and_then(Arc::get_mut)
    }

    /// The id of the referenced notifier
    pub fn id(&self) -> Option<NotifierId> {
        self.get().map(Notifier::id)
    }

    /// The number of handles (including this one) referring to the same
    /// notifier, or 0 for an empty handle
    pub fn ref_count(&self) -> usize {
        self.notifier.as_ref().map_or(0, Arc::strong_count)
    }

    /// Whether two handles refer to the same notifier.
    ///
    /// Two empty handles are considered equal.
    pub fn ptr_eq(&self, other: &Handle) -> bool {
        match (&self.notifier, &other.notifier) {
            (Some(left), Some(right)) => Arc::ptr_eq(left, right),
            (None, None) => true,
            _ => false,
        }
    }

    /// Move the reference out of this handle, leaving it empty
    pub fn take(&mut self) -> Handle {
        Handle {
            notifier: self.notifier.take(),
        }
    }

    /// Give this handle's reference back, leaving it empty
    pub fn release(&mut self) {
        self.notifier = None;
    }
}

impl From<Notifier> for Handle {
    fn from(notifier: Notifier) -> Self {
        Handle::new(notifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::notifier::{Handling, ProducerId};

    /// Counts its own destruction
    struct Tracked(Arc<AtomicUsize>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn tracked_handle(drops: &Arc<AtomicUsize>) -> Handle {
        Handle::new(Notifier::with_value(
            NotifierId::Diagnostics,
            ProducerId(9),
            Handling::Normal,
            Tracked(drops.clone()),
        ))
    }

    #[test]
    fn test_single_handle_destroys_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        {
            let handle = tracked_handle(&drops);
            assert_eq!(handle.ref_count(), 1);
            assert_eq!(drops.load(Ordering::SeqCst), 0);
        }
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clones_share_one_notifier() {
        let drops = Arc::new(AtomicUsize::new(0));
        let handle = tracked_handle(&drops);
        let copy = handle.clone();
        let another = copy.clone();

        assert_eq!(handle.ref_count(), 3);
        assert!(handle.ptr_eq(&another));

        drop(handle);
        drop(copy);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        assert_eq!(another.ref_count(), 1);

        drop(another);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_assignment_counts_both_sides() {
        let first_drops = Arc::new(AtomicUsize::new(0));
        let second_drops = Arc::new(AtomicUsize::new(0));

        let mut target = tracked_handle(&first_drops);
        let source = tracked_handle(&second_drops);
        assert_eq!(target.ref_count(), 1);

        target = source.clone();
        assert_eq!(first_drops.load(Ordering::SeqCst), 1);
        assert_eq!(second_drops.load(Ordering::SeqCst), 0);
        assert_eq!(source.ref_count(), 2);

        target = target.clone();
        assert_eq!(target.ref_count(), 2);
        assert_eq!(second_drops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_handle_is_guarded() {
        let mut handle = Handle::empty();
        assert!(handle.is_empty());
        assert!(handle.get().is_none());
        assert!(handle.get_mut().is_none());
        assert_eq!(handle.id(), None);
        assert_eq!(handle.ref_count(), 0);
        assert!(handle.ptr_eq(&Handle::default()));
        assert!(handle.take().is_empty());
    }

    #[test]
    fn test_get_mut_only_while_unique() {
        let mut handle = Handle::new(Notifier::signal(NotifierId::Heading, ProducerId(2)));
        handle.get_mut().unwrap().set_value(270i16);

        let shared = handle.clone();
        assert!(handle.get_mut().is_none());
        assert_eq!(shared.get().unwrap().value::<i16>(), Some(&270));
    }

    #[test]
    fn test_take_and_release_move_the_reference() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut handle = tracked_handle(&drops);

        let mut moved = handle.take();
        assert!(handle.is_empty());
        assert_eq!(moved.ref_count(), 1);

        moved.release();
        assert!(moved.is_empty());
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}

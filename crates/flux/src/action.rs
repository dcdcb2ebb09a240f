//! Actions
//!
//! An action is an immutable value describing "something happened". Any
//! `'static` type that is `Debug + Send + Sync` can become an action by
//! implementing the [`Action`] marker trait:
//!
//! ```rust
//! use flux::Action;
//!
//! #[derive(Debug)]
//! struct ChangeValue(String);
//!
//! impl Action for ChangeValue {}
//! ```
//!
//! Handlers are selected by the concrete type of the action (its "shape"),
//! never by a shared field. Inside the dispatch chain actions travel as
//! [`AnyAction`], a cheap-to-clone type-erased handle.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Type-erasure helper implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;

    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Marker trait for values that can be dispatched.
pub trait Action: AsAny + fmt::Debug + Send + Sync {}

impl dyn Action {
    /// Returns true if the concrete type of this action is `A`
    pub fn is<A: Action>(&self) -> bool {
        AsAny::as_any(self).is::<A>()
    }

    /// Borrow the action as its concrete type
    pub fn downcast_ref<A: Action>(&self) -> Option<&A> {
        AsAny::as_any(self).downcast_ref::<A>()
    }
}

/// Identifier of an action's concrete type
pub type ActionShape = TypeId;

/// Returns the shape identifier of action type `A`
pub fn shape_of<A: Action>() -> ActionShape {
    TypeId::of::<A>()
}

/// A type-erased, shareable action travelling through the pipeline
#[derive(Clone)]
pub struct AnyAction(Arc<dyn Action>);

impl AnyAction {
    pub fn new<A: Action>(action: A) -> Self {
        Self(Arc::new(action))
    }

    /// The shape (concrete type) of the wrapped action
    pub fn shape(&self) -> ActionShape {
        AsAny::as_any(&*self.0).type_id()
    }

    /// The Rust type name of the wrapped action, for logging
    pub fn shape_name(&self) -> &'static str {
        AsAny::type_name(&*self.0)
    }

    pub fn is<A: Action>(&self) -> bool {
        self.0.is::<A>()
    }

    pub fn downcast_ref<A: Action>(&self) -> Option<&A> {
        self.0.downcast_ref::<A>()
    }

    /// Returns true if both handles point to the very same action value
    pub fn ptr_eq(&self, other: &AnyAction) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for AnyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl<A: Action> From<A> for AnyAction {
    fn from(action: A) -> Self {
        Self::new(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct ChangeValue(String);
    impl Action for ChangeValue {}

    #[derive(Debug)]
    struct ChangeNumber(i64);
    impl Action for ChangeNumber {}

    #[test]
    fn test_shape_matches_concrete_type() {
        let action = AnyAction::new(ChangeValue("test".into()));
        assert_eq!(action.shape(), shape_of::<ChangeValue>());
        assert_ne!(action.shape(), shape_of::<ChangeNumber>());
        assert!(action.is::<ChangeValue>());
        assert!(!action.is::<ChangeNumber>());
    }

    #[test]
    fn test_downcast_ref() {
        let action = AnyAction::new(ChangeNumber(42));
        assert_eq!(action.downcast_ref::<ChangeNumber>().map(|a| a.0), Some(42));
        assert!(action.downcast_ref::<ChangeValue>().is_none());
    }

    #[test]
    fn test_clone_shares_value() {
        let action = AnyAction::new(ChangeValue("shared".into()));
        let copy = action.clone();
        assert!(action.ptr_eq(&copy));
        assert!(!action.ptr_eq(&AnyAction::new(ChangeValue("shared".into()))));
    }

    #[test]
    fn test_debug_and_name_use_inner_action() {
        let action = AnyAction::from(ChangeNumber(7));
        assert_eq!(format!("{:?}", action), "ChangeNumber(7)");
        assert!(action.shape_name().ends_with("ChangeNumber"));
    }
}

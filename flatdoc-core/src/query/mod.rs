//! The Predicate Builder: translates a user-supplied query document into a
//! [`crate::predicate::Predicate`] tree.

mod builder;

pub use builder::build_predicate;

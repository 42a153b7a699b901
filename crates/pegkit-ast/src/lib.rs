//! AST projection for pegkit match trees.
//!
//! The engine reports what it recognized as a tree of
//! [`Match`](pegkit_engine::Match)es. This crate projects that tree into an
//! [`AstNode`] tree of identical shape, attaching parent back-references as
//! it goes, optionally through a caller-supplied [`NodeFactory`] keyed on
//! the match id.
//!
//! Ownership follows the usual parent-strong/child-weak discipline in
//! reverse: each node strongly owns its children and holds a weak reference
//! to its parent, so dropping the roots drops the whole tree.

pub mod node;

pub use node::{project, project_with, AstNode, DefaultNodeFactory, NodeFactory};

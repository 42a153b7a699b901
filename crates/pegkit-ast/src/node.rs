//! AST nodes and the match-tree projection.

use pegkit_engine::{Match, ParseDefs};
use pegkit_span::Span;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// A node in the projected syntax tree.
///
/// Shape mirrors the match it was projected from: same id, children in the
/// same order. The span is the union of the children's spans when children
/// exist, otherwise the match's own span, so inner nodes always cover
/// exactly what their subtree covers.
pub struct AstNode<D: ParseDefs> {
    id: D::MatchId,
    span: Span,
    parent: RefCell<Weak<AstNode<D>>>,
    children: RefCell<Vec<Rc<AstNode<D>>>>,
}

impl<D: ParseDefs> AstNode<D> {
    /// Creates a detached leaf node.
    ///
    /// Factories call this (or build on it); projection wires up children
    /// and parents afterwards.
    pub fn new(id: D::MatchId, span: Span) -> Rc<Self> {
        Rc::new(Self {
            id,
            span,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
        })
    }

    /// The match id this node was projected from.
    #[inline]
    pub fn id(&self) -> D::MatchId {
        self.id
    }

    /// The covered source range.
    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    /// The parent node, unless this is a root (or the parent was dropped).
    pub fn parent(&self) -> Option<Rc<AstNode<D>>> {
        self.parent.borrow().upgrade()
    }

    /// The child nodes, in source order.
    pub fn children(&self) -> Vec<Rc<AstNode<D>>> {
        self.children.borrow().clone()
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.children.borrow().len()
    }

    /// The `i`-th child, if present.
    pub fn child(&self, i: usize) -> Option<Rc<AstNode<D>>> {
        self.children.borrow().get(i).cloned()
    }

    /// Visits this node and its descendants depth-first.
    pub fn visit<V: FnMut(&Rc<AstNode<D>>, usize)>(self: &Rc<Self>, visitor: &mut V) {
        self.visit_at(visitor, 0);
    }

    fn visit_at<V: FnMut(&Rc<AstNode<D>>, usize)>(self: &Rc<Self>, visitor: &mut V, depth: usize) {
        visitor(self, depth);
        for child in self.children.borrow().iter() {
            child.visit_at(visitor, depth + 1);
        }
    }
}

impl<D: ParseDefs> fmt::Debug for AstNode<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AstNode")
            .field("id", &self.id)
            .field("span", &self.span)
            .field("children", &*self.children.borrow())
            .finish()
    }
}

/// Creates nodes during projection, keyed on the match id.
///
/// The default factory produces plain [`AstNode`]s. Supply your own to
/// intern ids, collect side tables, or reject unexpected ids; the factory
/// sees every match in projection order, children before parents.
pub trait NodeFactory<D: ParseDefs> {
    /// Creates the node for a match with the given id and span.
    fn make(&self, id: D::MatchId, span: Span) -> Rc<AstNode<D>>;
}

/// The factory used by [`project`]: plain nodes, nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultNodeFactory;

impl<D: ParseDefs> NodeFactory<D> for DefaultNodeFactory {
    fn make(&self, id: D::MatchId, span: Span) -> Rc<AstNode<D>> {
        AstNode::new(id, span)
    }
}

/// Projects matches into AST nodes with the default factory.
pub fn project<D: ParseDefs>(matches: &[Match<D>]) -> Vec<Rc<AstNode<D>>> {
    project_with(matches, &DefaultNodeFactory)
}

/// Projects matches into AST nodes through `factory`.
///
/// Walks the matches in order, building children first, then the parent
/// with a span covering its children (or the match's own span for leaves),
/// and finally wiring each child's parent reference.
pub fn project_with<D: ParseDefs, F: NodeFactory<D>>(
    matches: &[Match<D>],
    factory: &F,
) -> Vec<Rc<AstNode<D>>> {
    matches.iter().map(|m| project_match(m, factory)).collect()
}

fn project_match<D: ParseDefs, F: NodeFactory<D>>(m: &Match<D>, factory: &F) -> Rc<AstNode<D>> {
    let children: Vec<Rc<AstNode<D>>> =
        m.children().iter().map(|child| project_match(child, factory)).collect();

    let span = match children.as_slice() {
        [] => m.span(),
        [first, rest @ ..] => {
            rest.iter().fold(first.span(), |acc, child| acc.union(child.span()))
        }
    };

    let node = factory.make(m.id(), span);
    for child in &children {
        *child.parent.borrow_mut() = Rc::downgrade(&node);
    }
    *node.children.borrow_mut() = children;
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use pegkit_engine::{parse, range, terminal, CharDefs, Rule};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum M {
        Num,
        Add,
    }
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum E {}

    type D = CharDefs<M, E>;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn sum_grammar() -> Rule<D> {
        let add = Rule::named("add");
        let num = range::<D>('0', '9').one_or_more().matched(M::Num);
        add.define((add.parser() >> terminal('+') >> num.clone()).matched(M::Add) | num);
        add
    }

    #[test]
    fn projection_mirrors_match_shape() {
        let add = sum_grammar();
        let source = chars("1+2");
        let output = parse(&source, &add.parser()).unwrap();
        assert!(output.is_clean());

        let roots = project(&output.matches);
        assert_eq!(roots.len(), 1);
        let root = &roots[0];
        assert_eq!(root.id(), M::Add);
        assert_eq!(root.child_count(), 2);
        assert_eq!(root.child(0).unwrap().id(), M::Num);
        assert_eq!(root.child(1).unwrap().id(), M::Num);
    }

    #[test]
    fn parent_links_point_up() {
        let add = sum_grammar();
        let source = chars("1+2");
        let output = parse(&source, &add.parser()).unwrap();
        let roots = project(&output.matches);

        let root = &roots[0];
        assert!(root.parent().is_none());
        let left = root.child(0).unwrap();
        let up = left.parent().unwrap();
        assert!(Rc::ptr_eq(&up, root));
    }

    #[test]
    fn inner_span_is_union_of_children() {
        let add = sum_grammar();
        let source = chars("12+345");
        let output = parse(&source, &add.parser()).unwrap();
        let roots = project(&output.matches);

        let root = &roots[0];
        assert_eq!(root.span().begin.index, 0);
        assert_eq!(root.span().end.index, 6);
        let right = root.child(1).unwrap();
        assert_eq!(right.span().begin.index, 3);
        assert_eq!(right.span().end.index, 6);
    }

    #[test]
    fn leaf_span_is_match_span() {
        let num = range::<D>('0', '9').one_or_more().matched(M::Num);
        let source = chars("42");
        let output = parse(&source, &num).unwrap();
        let roots = project(&output.matches);
        assert_eq!(roots[0].span().begin.index, 0);
        assert_eq!(roots[0].span().end.index, 2);
        assert_eq!(roots[0].child_count(), 0);
    }

    #[test]
    fn visit_walks_depth_first() {
        let add = sum_grammar();
        let source = chars("1+2+3");
        let output = parse(&source, &add.parser()).unwrap();
        let roots = project(&output.matches);

        let mut ids = Vec::new();
        roots[0].visit(&mut |node, depth| ids.push((node.id(), depth)));
        // Left-associative: ((1+2)+3)
        assert_eq!(
            ids,
            vec![(M::Add, 0), (M::Add, 1), (M::Num, 2), (M::Num, 2), (M::Num, 1)]
        );
    }

    #[test]
    fn custom_factory_sees_every_match() {
        struct Counting(std::cell::Cell<usize>);
        impl NodeFactory<D> for Counting {
            fn make(&self, id: M, span: Span) -> Rc<AstNode<D>> {
                self.0.set(self.0.get() + 1);
                AstNode::new(id, span)
            }
        }

        let add = sum_grammar();
        let source = chars("1+2");
        let output = parse(&source, &add.parser()).unwrap();
        let factory = Counting(std::cell::Cell::new(0));
        let roots = project_with(&output.matches, &factory);
        assert_eq!(roots.len(), 1);
        assert_eq!(factory.0.get(), 3);
    }
}

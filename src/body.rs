// Layer bodies
//
//  Copyright (C) 2014-2023 Ryan Specialty Group, LLC.
//
//  This file is part of Weaver.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Already-parsed bodies contributed by aspect layers.
//!
//! Template parsing happens upstream;
//!   by the time a body reaches the linker it is a flat sequence of
//!   [`Node`]s,
//!     each of which is either opaque host-language code or a symbolic
//!     [`CallSite`].
//! The linker never inspects [`Node::Code`];
//!   its only job is to bind each call site to a concrete target.

use crate::{decl::Accessor, span::Span};
use std::fmt::{self, Display};

/// The four symbolic call targets that a layer body may reference.
///
/// See [`crate::ld::resolve`] for how each is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// The untouched implementation at the bottom of the chain.
    Original,
    /// The chain element immediately preceding the referencing layer.
    Base,
    /// The referencing layer's own body.
    Self_,
    /// The last element of the chain.
    Final,
}

impl RefKind {
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "original" => Some(Self::Original),
            "base" => Some(Self::Base),
            "self" => Some(Self::Self_),
            "final" => Some(Self::Final),
            _ => None,
        }
    }
}

impl Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => write!(f, "original"),
            Self::Base => write!(f, "base"),
            Self::Self_ => write!(f, "self"),
            Self::Final => write!(f, "final"),
        }
    }
}

/// Arguments of a call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Args {
    /// The caller's own parameters,
    ///   threaded through unchanged.
    Forward,
    /// An explicit argument list in host-language syntax.
    Explicit(String),
}

impl Display for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, ".."),
            Self::Explicit(args) => write!(f, "{args}"),
        }
    }
}

/// A symbolic reference to some element of an override chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSite {
    pub kind: RefKind,
    pub args: Args,
    /// Accessor named explicitly by the reference,
    ///   if any.
    ///
    /// A reference may only ever name the accessor of the chain that it
    ///   appears in.
    pub accessor: Option<Accessor>,
    pub span: Span,
}

impl CallSite {
    /// A call that forwards the caller's parameters unchanged.
    pub fn forward(kind: RefKind, span: Span) -> Self {
        Self {
            kind,
            args: Args::Forward,
            accessor: None,
            span,
        }
    }

    pub fn with_args(kind: RefKind, args: String, span: Span) -> Self {
        Self {
            kind,
            args: Args::Explicit(args),
            accessor: None,
            span,
        }
    }
}

/// A single element of a [`Body`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// Opaque host-language code.
    Code(String),
    Call(CallSite),
}

/// An already-parsed body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Body(Vec<Node>);

impl Body {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self(nodes)
    }

    /// A body consisting of nothing but opaque code.
    pub fn code<S: Into<String>>(code: S) -> Self {
        Self(vec![Node::Code(code.into())])
    }

    /// A body that does nothing but forward to `kind`.
    pub fn forward(kind: RefKind, span: Span) -> Self {
        Self(vec![Node::Call(CallSite::forward(kind, span))])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.0
    }

    pub fn push(&mut self, node: Node) {
        self.0.push(node)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Symbolic call sites in the order in which they appear.
    pub fn call_sites(&self) -> impl Iterator<Item = &CallSite> {
        self.0.iter().filter_map(|node| match node {
            Node::Call(site) => Some(site),
            Node::Code(_) => None,
        })
    }

    /// The single call site of a body that adds no behavior of its own.
    ///
    /// A body is a _pure forward_ if it consists of exactly one call site
    ///   with [`Args::Forward`],
    ///     ignoring whitespace-only code.
    /// Any other code may have side effects and so disqualifies the body.
    pub fn pure_forward(&self) -> Option<&CallSite> {
        let mut found = None;

        for node in self.0.iter() {
            match node {
                Node::Code(code) if code.trim().is_empty() => (),
                Node::Code(_) => return None,
                Node::Call(site) if site.args != Args::Forward => return None,
                Node::Call(_) if found.is_some() => return None,
                Node::Call(site) => found = Some(site),
            }
        }

        found
    }
}

impl From<Vec<Node>> for Body {
    fn from(nodes: Vec<Node>) -> Self {
        Self(nodes)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::span::dummy::*;

    #[test]
    fn pure_forward_single_call() {
        let sut = Body::forward(RefKind::Base, S1);

        assert_eq!(
            Some(&CallSite::forward(RefKind::Base, S1)),
            sut.pure_forward()
        );
    }

    #[test]
    fn pure_forward_ignores_whitespace() {
        let sut = Body::new(vec![
            Node::Code("  \n".into()),
            Node::Call(CallSite::forward(RefKind::Final, S1)),
            Node::Code("\t".into()),
        ]);

        assert!(sut.pure_forward().is_some());
    }

    #[test]
    fn not_pure_forward_with_code() {
        let sut = Body::new(vec![
            Node::Code("log();".into()),
            Node::Call(CallSite::forward(RefKind::Base, S1)),
        ]);

        assert_eq!(None, sut.pure_forward());
    }

    #[test]
    fn not_pure_forward_with_explicit_args() {
        let sut = Body::new(vec![Node::Call(CallSite::with_args(
            RefKind::Base,
            "value * 2".into(),
            S1,
        ))]);

        assert_eq!(None, sut.pure_forward());
    }

    #[test]
    fn not_pure_forward_with_two_calls() {
        let sut = Body::new(vec![
            Node::Call(CallSite::forward(RefKind::Base, S1)),
            Node::Call(CallSite::forward(RefKind::Base, S2)),
        ]);

        assert_eq!(None, sut.pure_forward());
    }

    #[test]
    fn empty_body_is_not_forward() {
        assert_eq!(None, Body::default().pure_forward());
        assert_eq!(None, Body::code("").pure_forward());
    }

    #[test]
    fn call_sites_in_order() {
        let sut = Body::new(vec![
            Node::Call(CallSite::forward(RefKind::Original, S1)),
            Node::Code("x".into()),
            Node::Call(CallSite::forward(RefKind::Final, S2)),
        ]);

        assert_eq!(
            vec![RefKind::Original, RefKind::Final],
            sut.call_sites().map(|s| s.kind).collect::<Vec<_>>()
        );
    }
}

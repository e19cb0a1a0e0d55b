// Layer registry
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

//! Registry of every layer contributed to each declaration.
//!
//! The registry is pure bookkeeping:
//!   layers may be registered in any order and are only sorted when they
//!   are requested for a declaration.
//! Its lifetime is that of a single linking pass;
//!   it is constructed by the caller,
//!     frozen by sharing it immutably with [`link_pass`](super::link_pass),
//!     and dropped afterward.

use super::{error::LinkRef, LinkError, LinkResult};
use crate::{
    body::{Body, RefKind},
    decl::{Accessor, DeclId},
    global::{self, LayerRank},
    span::{Span, UNKNOWN_SPAN},
    sym::Name,
};
use fxhash::FxHashMap;


/// How a layer relates to the member it is contributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Replaces an existing member,
    ///   possibly calling through to it.
    Override,

    /// Provides a member that did not previously exist.
    ///
    /// An introduction must be the first implementation of its member.
    Introduction,
}

/// One aspect's contribution to one declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub name: Name,
    pub aspect: Name,
    /// Rank assigned upstream by the aspect ordering resolver.
    pub order: LayerRank,
    pub body: Body,
    pub discardable: bool,
    pub inlineable: bool,
    pub relation: Relation,
    pub span: Span,
}

impl Layer {
    /// An override layer with neither optimization flag set.
    pub fn new(name: Name, aspect: Name, order: LayerRank, body: Body) -> Self {
        Self {
            name,
            aspect,
            order,
            body,
            discardable: false,
            inlineable: false,
            relation: Relation::Override,
            span: UNKNOWN_SPAN,
        }
    }

    pub fn introduction(self) -> Self {
        Self {
            relation: Relation::Introduction,
            ..self
        }
    }

    pub fn with_discardable(self, discardable: bool) -> Self {
        Self {
            discardable,
            ..self
        }
    }

    pub fn with_inlineable(self, inlineable: bool) -> Self {
        Self { inlineable, ..self }
    }

    pub fn with_span(self, span: Span) -> Self {
        Self { span, ..self }
    }

    /// Reference to this layer for use in diagnostics.
    pub fn link_ref(&self) -> LinkRef {
        LinkRef {
            name: self.name,
            aspect: Some(self.aspect),
            span: self.span,
        }
    }
}

/// What is known of a member before any aspect touches it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Member {
    /// Pre-existing implementation,
    ///   if the member is not introduced by an aspect.
    pub existing: Option<Body>,

    /// Base type from which the member is inherited,
    ///   if any.
    pub base: Option<Name>,

    /// Parameter names,
    ///   used by synthesized accessor bodies.
    pub params: Vec<Name>,

    pub span: Option<Span>,
}

impl Member {
    pub fn existing(body: Body) -> Self {
        Self {
            existing: Some(body),
            ..Default::default()
        }
    }

    pub fn inherited(base: Name) -> Self {
        Self {
            base: Some(base),
            ..Default::default()
        }
    }

    pub fn with_span(self, span: Span) -> Self {
        Self {
            span: Some(span),
            ..self
        }
    }

    /// Name of the value parameter of a setter or event accessor.
    fn value_param(&self) -> Name {
        self.params
            .first()
            .copied()
            .unwrap_or(Name::st("value"))
    }
}

/// The implementation at the bottom of a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// The member's untouched user-written body.
    Existing(Body),

    /// A trivial body synthesized for a member that has no implementation
    ///   of its own.
    Synthesized(Body),
}

impl Source {
    pub fn body(&self) -> &Body {
        match self {
            Self::Existing(body) | Self::Synthesized(body) => body,
        }
    }

    pub fn into_body(self) -> Body {
        match self {
            Self::Existing(body) | Self::Synthesized(body) => body,
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self, Self::Existing(_))
    }
}

/// Layers and member metadata for every declaration of a pass.
#[derive(Debug)]
pub struct Registry {
    layers: FxHashMap<DeclId, Vec<Layer>>,
    members: FxHashMap<DeclId, Member>,

    /// Declarations in the order in which they first received a layer.
    order: Vec<DeclId>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_capacity(global::REGISTRY_INIT_CAPACITY)
    }
}

impl Registry {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            layers: FxHashMap::with_capacity_and_hasher(
                capacity,
                Default::default(),
            ),
            members: FxHashMap::with_capacity_and_hasher(
                capacity,
                Default::default(),
            ),
            order: Vec::with_capacity(capacity),
        }
    }

    /// Record what is known of a member prior to linking.
    ///
    /// Declarations that are never declared are treated as having no
    ///   existing body and no base type.
    /// Declaring a member a second time replaces its previous metadata.
    pub fn declare(&mut self, decl: DeclId, member: Member) {
        self.members.insert(decl, member);
    }

    /// Accumulate a layer for `decl`.
    ///
    /// Layers may arrive in any order;
    ///   see [`Registry::layers_for`].
    pub fn register(&mut self, decl: DeclId, layer: Layer) {
        let layers = self.layers.entry(decl).or_insert_with(|| {
            self.order.push(decl);
            Vec::new()
        });

        layers.push(layer);
    }

    /// Layers of `decl` sorted by rank.
    ///
    /// Two layers sharing a rank yield [`LinkError::AmbiguousOrder`];
    ///   the linker never breaks ties itself.
    pub fn layers_for(&self, decl: DeclId) -> LinkResult<Vec<&Layer>> {
        let mut layers = self
            .layers
            .get(&decl)
            .map(|layers| layers.iter().collect::<Vec<_>>())
            .unwrap_or_default();

        // Stable,
        //   so that the earlier registration is reported first.
        layers.sort_by_key(|layer| layer.order);

        match layers.windows(2).find(|w| w[0].order == w[1].order) {
            Some(w) => Err(LinkError::AmbiguousOrder {
                decl,
                rank: w[0].order,
                first: w[0].link_ref(),
                second: w[1].link_ref(),
            }),
            None => Ok(layers),
        }
    }

    /// Whether any layer has been registered for `decl`.
    pub fn has_layers(&self, decl: DeclId) -> bool {
        self.layers.get(&decl).map_or(false, |l| !l.is_empty())
    }

    pub fn member(&self, decl: DeclId) -> Option<&Member> {
        self.members.get(&decl)
    }

    /// The declaration of the same accessor on the base type,
    ///   if the member is inherited.
    pub fn base_of(&self, decl: DeclId) -> Option<DeclId> {
        self.member(decl)
            .and_then(|member| member.base)
            .map(|base| decl.on_type(base))
    }

    /// The implementation at the bottom of the chain of `decl`.
    ///
    /// A member without an existing body receives a trivial synthesized
    ///   one:
    ///     an inherited member forwards to its base;
    ///     property and event accessors operate on a backing field
    ///       named after the member;
    ///     and a method does nothing.
    pub fn source_for(&self, decl: DeclId) -> Source {
        let member = self.member(decl);

        if let Some(body) = member.and_then(|m| m.existing.as_ref()) {
            return Source::Existing(body.clone());
        }

        let span = member.and_then(|m| m.span).unwrap_or(UNKNOWN_SPAN);
        let value = member.map_or(Name::st("value"), Member::value_param);
        let field =
            format!("this.{}{}", decl.member, global::BACKING_FIELD_SUFFIX);

        Source::Synthesized(match decl.accessor {
            _ if self.base_of(decl).is_some() => {
                Body::forward(RefKind::Base, span)
            }
            Accessor::Method => Body::default(),
            Accessor::Get => Body::code(format!("return {field};")),
            Accessor::Set => Body::code(format!("{field} = {value};")),
            Accessor::Add => Body::code(format!("{field} += {value};")),
            Accessor::Remove => Body::code(format!("{field} -= {value};")),
        })
    }

    /// Declarations that received at least one layer,
    ///   in the order in which each first received one.
    pub fn decls(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

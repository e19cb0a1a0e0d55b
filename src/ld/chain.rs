// Override chain builder
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

//! Explicit override chains.
//!
//! A [`Chain`] is the statically-built replacement for what would
//!   otherwise be runtime virtual dispatch through each layer:
//!     position `0` holds the implementation at the bottom of the chain
//!       (the [`Source`](super::Source),
//!         or an introduction layer in its place),
//!     and each following position holds the next-ranked layer.
//! The last position is the implementation that callers of the member
//!   actually observe.

use super::{
    error::{IntroductionConflict, LinkRef},
    registry::{Layer, Registry, Relation},
    LinkError, LinkResult,
};
use crate::{
    body::Body,
    decl::DeclId,
    global,
    span::{Span, UNKNOWN_SPAN},
    sym::{GlobalSymbolIntern, Name},
};
use fxhash::FxHashMap;
use tracing::debug;


/// Position of a link within its chain.
pub type Pos = usize;

/// Where a link came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOrigin {
    /// The member's pre-existing or synthesized implementation.
    Source,

    /// An introduction layer occupying the bottom of the chain.
    Introduction(Name),

    /// An override layer contributed by the named aspect.
    Override(Name),
}

/// A single element of a [`Chain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub name: Name,
    pub origin: LinkOrigin,
    pub body: Body,
    pub discardable: bool,
    pub inlineable: bool,
    pub span: Span,
}

impl Link {
    fn from_layer(layer: &Layer) -> Self {
        let origin = match layer.relation {
            Relation::Override => LinkOrigin::Override(layer.aspect),
            Relation::Introduction => LinkOrigin::Introduction(layer.aspect),
        };

        Self {
            name: layer.name,
            origin,
            body: layer.body.clone(),
            discardable: layer.discardable,
            inlineable: layer.inlineable,
            span: layer.span,
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self.origin, LinkOrigin::Source)
    }

    /// Reference to this link for use in diagnostics.
    pub fn link_ref(&self) -> LinkRef {
        let aspect = match self.origin {
            LinkOrigin::Source => None,
            LinkOrigin::Introduction(aspect) | LinkOrigin::Override(aspect) => {
                Some(aspect)
            }
        };

        LinkRef {
            name: self.name,
            aspect,
            span: self.span,
        }
    }
}

/// Handle to the final element of an inherited member's chain.
///
/// This is all that a derived type ever sees of its base type's chain;
///   it is called through by name and never inlined across types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaseLink {
    /// Declaration of the inherited accessor on the base type.
    pub decl: DeclId,

    /// Name of the link at the end of the base chain.
    pub final_link: Name,
}

/// The ordered override chain of a single declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub decl: DeclId,
    links: Vec<Link>,

    /// The inherited member,
    ///   if the declaration overrides one whose chain is available.
    pub base: Option<BaseLink>,
}

impl Chain {
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, pos: Pos) -> Option<&Link> {
        self.links.get(pos)
    }

    /// Position of the last link.
    ///
    /// A chain always has at least its source link.
    pub fn final_pos(&self) -> Pos {
        self.links.len() - 1
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Handle used by derived types to call through to this chain.
    pub fn as_base_link(&self) -> BaseLink {
        BaseLink {
            decl: self.decl,
            final_link: self.links[self.final_pos()].name,
        }
    }
}

/// Lookup of already-frozen chains of base types.
///
/// This is the only capability the chain builder has to cross an
///   inheritance boundary.
/// Implementations must never build a chain reentrantly;
///   they only ever expose chains that are already frozen.
pub trait BaseChains {
    fn base_chain_for(&self, decl: DeclId) -> Option<&Chain>;
}

impl BaseChains for FxHashMap<DeclId, Chain> {
    fn base_chain_for(&self, decl: DeclId) -> Option<&Chain> {
        self.get(&decl)
    }
}

/// No base chains are available.
impl BaseChains for () {
    fn base_chain_for(&self, _decl: DeclId) -> Option<&Chain> {
        None
    }
}

impl<B: BaseChains> BaseChains for &B {
    fn base_chain_for(&self, decl: DeclId) -> Option<&Chain> {
        (*self).base_chain_for(decl)
    }
}

/// Build the override chain of `decl`.
///
/// Building is deterministic and has no side effects;
///   building the same declaration twice against the same registry yields
///   identical chains.
///
/// An introduction layer must be the lowest-ranked layer of a member that
///   has no existing body,
///     in which case it occupies position `0` in place of the source.
pub fn build<B: BaseChains>(
    registry: &Registry,
    decl: DeclId,
    bases: &B,
) -> LinkResult<Chain> {
    let layers = registry.layers_for(decl)?;
    let member = registry.member(decl);

    for (i, layer) in layers.iter().enumerate() {
        if layer.relation != Relation::Introduction {
            continue;
        }

        let conflict = match (i, member.and_then(|m| m.existing.as_ref())) {
            (0, None) => continue,
            (0, Some(_)) => IntroductionConflict::ExistingMember(
                member.and_then(|m| m.span).unwrap_or(UNKNOWN_SPAN),
            ),
            (i, _) => {
                IntroductionConflict::PrecededBy(layers[i - 1].link_ref())
            }
        };

        return Err(LinkError::InvalidIntroductionPosition {
            decl,
            layer: layer.link_ref(),
            conflict,
        });
    }

    let mut links = Vec::with_capacity(layers.len() + 1);

    match layers.first() {
        Some(first) if first.relation == Relation::Introduction => (),
        _ => links.push(Link {
            name: format!("{}{}", decl.member, global::SOURCE_LINK_SUFFIX)
                .intern(),
            origin: LinkOrigin::Source,
            body: registry.source_for(decl).into_body(),
            discardable: false,
            inlineable: false,
            span: member.and_then(|m| m.span).unwrap_or(UNKNOWN_SPAN),
        }),
    }

    links.extend(layers.into_iter().map(Link::from_layer));

    let base = registry.base_of(decl).and_then(|base_decl| {
        match bases.base_chain_for(base_decl) {
            Some(chain) => Some(chain.as_base_link()),

            // A base member that no aspect touched is its own final
            //   implementation.
            None if !registry.has_layers(base_decl) => Some(BaseLink {
                decl: base_decl,
                final_link: base_decl.member,
            }),

            None => None,
        }
    });

    debug!(
        decl = %decl,
        links = links.len(),
        inherited = base.is_some(),
        "built chain",
    );

    Ok(Chain { decl, links, base })
}

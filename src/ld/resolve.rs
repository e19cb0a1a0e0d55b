// Symbolic reference resolver
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

//! Binding of symbolic call sites to chain positions.
//!
//! Every call site of every link is bound against the _logical_ chain,
//!   before any link is discarded or inlined,
//!     since `original`,
//!     `base`,
//!     and `final` are defined in terms of logical position.
//! With `n` the position of the final link:
//!
//! | Reference  | From position `0`   | From position `i ≥ 1` |
//! |------------|---------------------|-----------------------|
//! | `original` | inherited final     | `0`                   |
//! | `base`     | inherited final     | `i - 1`               |
//! | `self`     | `0`                 | `i`                   |
//! | `final`    | `n`                 | `n`                   |
//!
//! A reference from position `0` to an inherited member that does not
//!   exist is an error
//!     ([`LinkError::DanglingBaseReference`]),
//!     never a no-op.
//! `final` always resolves within the declaration's own chain;
//!   it is never forward-resolved into the chains of derived types.

use super::{
    chain::{BaseLink, Chain, Pos},
    LinkError, LinkResult,
};
use crate::body::{CallSite, RefKind};
use tracing::debug;

#[cfg(test)]
mod test;

/// Concrete target of a resolved call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    /// A link of the same chain.
    Link(Pos),

    /// The final element of the inherited member's chain.
    Inherited(BaseLink),
}

/// A chain with every call site bound.
///
/// Bindings are held per link,
///   in the order in which call sites appear in its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChain {
    chain: Chain,
    bindings: Vec<Vec<Binding>>,
}

impl ResolvedChain {
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Bindings of the call sites of the link at `pos`.
    pub fn bindings(&self, pos: Pos) -> &[Binding] {
        self.bindings.get(pos).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn into_parts(self) -> (Chain, Vec<Vec<Binding>>) {
        (self.chain, self.bindings)
    }
}

/// Bind a reference of the given kind made from position `from`.
///
/// This yields [`None`] only for `base` or `original` from position `0`
///   when there is no inherited member.
pub fn bind(chain: &Chain, from: Pos, kind: RefKind) -> Option<Binding> {
    match (kind, from) {
        (RefKind::Original | RefKind::Base, 0) => {
            chain.base.map(Binding::Inherited)
        }
        (RefKind::Original, _) => Some(Binding::Link(0)),
        (RefKind::Base, i) => Some(Binding::Link(i - 1)),
        (RefKind::Self_, i) => Some(Binding::Link(i)),
        (RefKind::Final, _) => Some(Binding::Link(chain.final_pos())),
    }
}

/// Bind every call site of every link of `chain`.
///
/// A chain with any unresolvable call site fails as a unit;
///   the first failure in chain order is reported.
pub fn resolve(chain: Chain) -> LinkResult<ResolvedChain> {
    let decl = chain.decl;

    let bindings = chain
        .links()
        .iter()
        .enumerate()
        .map(|(pos, link)| {
            link.body
                .call_sites()
                .map(|site| bind_site(&chain, pos, site))
                .collect::<LinkResult<Vec<_>>>()
        })
        .collect::<LinkResult<Vec<_>>>()?;

    debug!(
        decl = %decl,
        sites = bindings.iter().map(Vec::len).sum::<usize>(),
        "resolved chain",
    );

    Ok(ResolvedChain { chain, bindings })
}

fn bind_site(chain: &Chain, pos: Pos, site: &CallSite) -> LinkResult<Binding> {
    let link = &chain.links()[pos];

    match site.accessor {
        Some(accessor) if accessor != chain.decl.accessor => {
            return Err(LinkError::CrossAccessorReference {
                decl: chain.decl,
                layer: link.link_ref(),
                accessor,
                span: site.span,
            })
        }
        _ => (),
    }

    bind(chain, pos, site.kind).ok_or_else(|| {
        LinkError::DanglingBaseReference {
            decl: chain.decl,
            layer: link.link_ref(),
            kind: site.kind,
            span: site.span,
        }
    })
}

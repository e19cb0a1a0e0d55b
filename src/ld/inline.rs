// Inlining analyzer
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

//! Removal and inlining of chain links.
//!
//! The analyzer decides,
//!   for each link of a resolved chain,
//!   how the transition into that link is realized in the physical
//!     layout:
//!       by a call to a real member ([`Classification::Opaque`]),
//!       by substituting its body at its only call site
//!         ([`Classification::Inlined`]),
//!       or not at all,
//!         because the link adds no behavior of its own
//!           ([`Classification::Discarded`])
//!         or nothing calls it ([`Classification::Dropped`]).
//! The relative execution order of layers is never changed.
//!
//! Analysis happens in two steps:
//!
//!   1. Discard first,
//!        across the whole chain:
//!          a link other than the source or the final link is discarded
//!          if it is flagged discardable and its body is a pure forward to
//!          some other link.
//!        Every call site bound to a discarded link is rebound to that
//!          link's own target,
//!            transitively.
//!   2. Then count,
//!        on the rebound chain,
//!        the call sites that target each link.
//!        A link flagged inlineable that is not discarded,
//!          does not reference itself,
//!          and is targeted by at most one call site
//!          is inlined into that call site
//!            (or dropped if there is none).
//!
//! A link eligible for both optimizations is therefore discarded,
//!   and a link targeted by more than one call site always remains
//!   addressable.
//! The source and final links are always opaque.
//! So is any link that would otherwise be inlined more than
//!   [`MAX_INLINE_DEPTH`] bodies deep.

use super::{
    chain::{Chain, Pos},
    error::EmissionFailureReason,
    resolve::{Binding, ResolvedChain},
    LinkError, LinkResult,
};
use crate::global::MAX_INLINE_DEPTH;
use fixedbitset::FixedBitSet;
use tracing::debug;


/// How a link is realized in the physical layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Emitted as a real member and called through.
    Opaque,

    /// Removed from the chain;
    ///   its callers were rebound to its target.
    Discarded,

    /// Substituted at its only call site.
    Inlined,

    /// Inlineable but never called,
    ///   and so not emitted at all.
    Dropped,
}

/// A resolved chain with its physical layout decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedChain {
    chain: Chain,

    /// Bindings after rebinding through discarded links.
    bindings: Vec<Vec<Binding>>,

    discarded: FixedBitSet,
    refcounts: Vec<usize>,
    classes: Vec<Classification>,
}

impl OptimizedChain {
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Rebound bindings of the call sites of the link at `pos`.
    pub fn bindings(&self, pos: Pos) -> &[Binding] {
        self.bindings.get(pos).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn classification(&self, pos: Pos) -> Classification {
        self.classes[pos]
    }

    pub fn is_discarded(&self, pos: Pos) -> bool {
        self.discarded.contains(pos)
    }

    /// Number of call sites of surviving links that target `pos`.
    pub fn refcount(&self, pos: Pos) -> usize {
        self.refcounts.get(pos).copied().unwrap_or(0)
    }

    /// Positions of links that are emitted as real members,
    ///   in chain order.
    pub fn survivors(&self) -> impl Iterator<Item = Pos> + '_ {
        self.classes
            .iter()
            .enumerate()
            .filter(|(_, class)| **class == Classification::Opaque)
            .map(|(pos, _)| pos)
    }
}

#[cfg(test)]
impl OptimizedChain {
    /// Force the classification of the link at `pos`,
    ///   producing layouts that analysis itself never would.
    pub(crate) fn reclassify(
        mut self,
        pos: Pos,
        class: Classification,
    ) -> Self {
        self.classes[pos] = class;
        self
    }
}

/// Decide the physical layout of a resolved chain.
pub fn analyze(resolved: ResolvedChain) -> LinkResult<OptimizedChain> {
    let (chain, mut bindings) = resolved.into_parts();
    let len = chain.len();
    let n = chain.final_pos();

    let mut discarded = FixedBitSet::with_capacity(len);

    for pos in 1..n {
        let link = &chain.links()[pos];

        let forwards_elsewhere = link.body.pure_forward().is_some()
            && bindings[pos].first() != Some(&Binding::Link(pos));

        if link.discardable && forwards_elsewhere {
            discarded.insert(pos);
        }
    }

    // Targets of discarded links are computed before any rebinding so that
    //   every caller sees the same original forward.
    let forwards = (0..len)
        .map(|pos| {
            discarded
                .contains(pos)
                .then(|| bindings[pos][0])
        })
        .collect::<Vec<_>>();

    for pos in (0..len).filter(|pos| !discarded.contains(*pos)) {
        for binding in bindings[pos].iter_mut() {
            *binding = rebind(&chain, &forwards, *binding)?;
        }
    }

    let mut refcounts = vec![0; len];
    let mut callers = vec![None; len];

    for pos in (0..len).filter(|pos| !discarded.contains(*pos)) {
        for binding in bindings[pos].iter() {
            if let Binding::Link(target) = binding {
                refcounts[*target] += 1;
                callers[*target] = Some(pos);
            }
        }
    }

    let mut classes = (0..len)
        .map(|pos| {
            let link = &chain.links()[pos];
            let self_ref = bindings[pos].contains(&Binding::Link(pos));

            match pos {
                _ if discarded.contains(pos) => Classification::Discarded,
                0 => Classification::Opaque,
                _ if pos == n => Classification::Opaque,
                _ if !link.inlineable || self_ref => Classification::Opaque,
                _ => match refcounts[pos] {
                    0 => Classification::Dropped,
                    1 => Classification::Inlined,
                    _ => Classification::Opaque,
                },
            }
        })
        .collect::<Vec<_>>();

    cap_inline_depth(&mut classes, &callers);

    debug!(
        decl = %chain.decl,
        discarded = discarded.count_ones(..),
        inlined = classes
            .iter()
            .filter(|c| **c == Classification::Inlined)
            .count(),
        "optimized chain",
    );

    Ok(OptimizedChain {
        chain,
        bindings,
        discarded,
        refcounts,
        classes,
    })
}

/// Leave opaque any inlined link that would nest more than
///   [`MAX_INLINE_DEPTH`] bodies deep,
///     so that the links it calls nest within it instead.
///
/// An inlined link has exactly one caller,
///   and that caller is always later in the chain,
///   so the depth of the caller is known by the time the link is visited.
fn cap_inline_depth(classes: &mut [Classification], callers: &[Option<Pos>]) {
    let mut depths = vec![0; classes.len()];

    for pos in (0..classes.len()).rev() {
        if classes[pos] != Classification::Inlined {
            continue;
        }

        let depth = match callers[pos] {
            Some(caller) if classes[caller] == Classification::Inlined => {
                depths[caller] + 1
            }
            _ => 1,
        };

        if depth > MAX_INLINE_DEPTH {
            classes[pos] = Classification::Opaque;
        } else {
            depths[pos] = depth;
        }
    }
}

/// Follow a binding through discarded links until it reaches one that
///   survives.
fn rebind(
    chain: &Chain,
    forwards: &[Option<Binding>],
    binding: Binding,
) -> LinkResult<Binding> {
    let mut current = binding;

    // Each step visits a distinct discarded link unless there is a cycle.
    for _ in 0..=forwards.len() {
        match current {
            Binding::Link(pos) => match forwards[pos] {
                Some(next) => current = next,
                None => return Ok(current),
            },
            Binding::Inherited(_) => return Ok(current),
        }
    }

    let culprit = match binding {
        Binding::Link(pos) => pos,
        Binding::Inherited(_) => 0,
    };
    let link = &chain.links()[culprit];

    Err(LinkError::EmissionFailure {
        decl: chain.decl,
        layer: link.link_ref(),
        reason: EmissionFailureReason::ForwardCycle(link.name),
    })
}

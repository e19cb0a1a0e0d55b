// Linker pass driver
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

//! Linking of every declaration of a registry.
//!
//! Declarations are independent of one another except across inheritance:
//!   the chain of an inherited member cannot be built until the chain of
//!   the same member on the base type is frozen.
//! The pass therefore arranges declarations into a graph with an edge from
//!   each base declaration to each declaration that inherits it,
//!     and links in _waves_:
//!       every declaration of a wave has all of its in-pass bases frozen by
//!       earlier waves,
//!         and so the declarations of a wave can be linked in parallel.
//! Each chain is built exactly once and,
//!   once built successfully,
//!   frozen for the remainder of the pass.
//!
//! A genuine inheritance cycle can never be ordered;
//!   every declaration on one fails with [`LinkError::InheritanceCycle`]
//!   rather than blocking the pass.

use super::{
    chain::{self, BaseChains, Chain},
    emit::EmittedChain,
    link_chain, LinkError, LinkResult, Registry,
};
use crate::{decl::DeclId, span::UNKNOWN_SPAN, sym::Name};
use fixedbitset::FixedBitSet;
use fxhash::FxHashMap;
use petgraph::{
    algo::tarjan_scc,
    graph::{DiGraph, NodeIndex},
    Direction,
};
use rayon::prelude::*;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, info, warn};


/// Options affecting how (but never what) a pass links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkOptions {
    /// Link the declarations of each wave in parallel.
    ///
    /// Output is identical either way;
    ///   sequential linking is useful when debugging.
    pub parallel: bool,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Cooperative cancellation of a pass.
///
/// Cancellation is checked before each declaration is linked;
///   a declaration is never abandoned midway.
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Results of a pass.
#[derive(Debug, Default)]
pub struct PassOutput {
    /// Result of each declaration that was linked,
    ///   in registration order.
    pub results: Vec<(DeclId, LinkResult<EmittedChain>)>,

    /// Declarations skipped due to cancellation,
    ///   in registration order.
    pub cancelled: Vec<DeclId>,
}

impl PassOutput {
    pub fn linked(&self) -> impl Iterator<Item = &EmittedChain> {
        self.results.iter().filter_map(|(_, r)| r.as_ref().ok())
    }

    pub fn errors(&self) -> impl Iterator<Item = &LinkError> {
        self.results.iter().filter_map(|(_, r)| r.as_ref().err())
    }

    pub fn result(&self, decl: DeclId) -> Option<&LinkResult<EmittedChain>> {
        self.results.iter().find(|(d, _)| *d == decl).map(|(_, r)| r)
    }

    pub fn linked_count(&self) -> usize {
        self.linked().count()
    }

    pub fn failed_count(&self) -> usize {
        self.errors().count()
    }

    /// Whether every declaration was linked without error.
    pub fn is_complete(&self) -> bool {
        self.cancelled.is_empty() && self.failed_count() == 0
    }
}

/// Chains available to the declarations of a wave:
///   those frozen by earlier waves,
///   followed by those provided by the caller.
struct PassBases<'a, B> {
    frozen: &'a FxHashMap<DeclId, Chain>,
    external: &'a B,
}

impl<'a, B: BaseChains> BaseChains for PassBases<'a, B> {
    fn base_chain_for(&self, decl: DeclId) -> Option<&Chain> {
        self.frozen
            .get(&decl)
            .or_else(|| self.external.base_chain_for(decl))
    }
}

enum Outcome {
    Linked(Chain, EmittedChain),
    Failed(LinkError),
    Cancelled,
}

/// Link every declaration of `registry` that received at least one layer.
///
/// `external` provides the frozen chains of base types that are not part
///   of this pass;
///     use `&()` if there are none.
/// Failures are per-declaration and never stop the pass.
pub fn link_pass<B: BaseChains + Sync>(
    registry: &Registry,
    external: &B,
    options: LinkOptions,
    cancel: &CancelToken,
) -> PassOutput {
    let decls = registry.decls().collect::<Vec<_>>();
    let n = decls.len();

    // Node indexes coincide with registration order.
    let mut graph = DiGraph::<DeclId, ()>::with_capacity(n, n);
    let index = decls
        .iter()
        .map(|decl| (*decl, graph.add_node(*decl)))
        .collect::<FxHashMap<_, _>>();

    for (i, decl) in decls.iter().enumerate() {
        if let Some(base) = registry.base_of(*decl).and_then(|b| index.get(&b))
        {
            graph.add_edge(*base, NodeIndex::new(i), ());
        }
    }

    let mut results = (0..n).map(|_| None).collect::<Vec<_>>();
    let mut done = FixedBitSet::with_capacity(n);

    for (decl, err) in check_cycles(registry, &graph) {
        let i = index[&decl].index();

        warn!(decl = %decl, code = %err.code(), "{err}");
        results[i] = Some(Err(err));
        done.insert(i);
    }

    let mut indegree = (0..n)
        .map(|i| {
            graph
                .neighbors_directed(NodeIndex::new(i), Direction::Incoming)
                .filter(|nx| !done.contains(nx.index()))
                .count()
        })
        .collect::<Vec<_>>();

    let mut frozen = FxHashMap::<DeclId, Chain>::default();
    let mut wave_count = 0;

    loop {
        let wave = (0..n)
            .filter(|i| !done.contains(*i) && indegree[*i] == 0)
            .collect::<Vec<_>>();

        if wave.is_empty() {
            break;
        }

        wave_count += 1;
        debug!(wave = wave_count, decls = wave.len(), "linking wave");

        let bases = PassBases {
            frozen: &frozen,
            external,
        };

        let link = |i: &usize| {
            let decl = decls[*i];

            if cancel.is_cancelled() {
                return (*i, Outcome::Cancelled);
            }

            let outcome = match link_one(registry, decl, &bases) {
                Ok((chain, emitted)) => Outcome::Linked(chain, emitted),
                Err(e) => Outcome::Failed(e),
            };

            (*i, outcome)
        };

        let outcomes = if options.parallel {
            wave.par_iter().map(link).collect::<Vec<_>>()
        } else {
            wave.iter().map(link).collect::<Vec<_>>()
        };

        for (i, outcome) in outcomes {
            let decl = decls[i];
            done.insert(i);

            match outcome {
                Outcome::Linked(chain, emitted) => {
                    frozen.insert(decl, chain);
                    results[i] = Some(Ok(emitted));
                }
                Outcome::Failed(e) => {
                    warn!(decl = %decl, code = %e.code(), "{e}");
                    results[i] = Some(Err(e));
                }
                Outcome::Cancelled => (),
            }

            let succs = graph
                .neighbors_directed(NodeIndex::new(i), Direction::Outgoing);

            for succ in succs {
                indegree[succ.index()] -= 1;
            }
        }
    }

    let mut output = PassOutput::default();

    for (decl, result) in decls.into_iter().zip(results) {
        match result {
            Some(result) => output.results.push((decl, result)),
            None => output.cancelled.push(decl),
        }
    }

    info!(
        linked = output.linked_count(),
        failed = output.failed_count(),
        cancelled = output.cancelled.len(),
        waves = wave_count,
        "link pass complete",
    );

    output
}

fn link_one<B: BaseChains>(
    registry: &Registry,
    decl: DeclId,
    bases: &B,
) -> LinkResult<(Chain, EmittedChain)> {
    let chain = chain::build(registry, decl, bases)?;
    let emitted = link_chain(chain.clone())?;

    Ok((chain, emitted))
}

/// Fail every declaration that is part of an inheritance cycle.
///
/// A single declaration is cyclic only if it is its own base.
fn check_cycles(
    registry: &Registry,
    graph: &DiGraph<DeclId, ()>,
) -> Vec<(DeclId, LinkError)> {
    tarjan_scc(graph)
        .into_iter()
        .filter(|scc| {
            scc.len() > 1 || graph.neighbors(scc[0]).any(|nx| nx == scc[0])
        })
        .flat_map(|mut scc| {
            scc.sort();

            let cycle =
                scc.iter().map(|nx| graph[*nx].ty).collect::<Vec<Name>>();

            scc.into_iter()
                .map(|nx| {
                    let decl = graph[nx];
                    let span = registry
                        .member(decl)
                        .and_then(|m| m.span)
                        .unwrap_or(UNKNOWN_SPAN);

                    (
                        decl,
                        LinkError::InheritanceCycle {
                            decl,
                            cycle: cycle.clone(),
                            span,
                        },
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

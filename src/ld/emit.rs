// Chain emitter
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

//! Conversion of optimized chains into concrete members.
//!
//! Each [`Classification::Opaque`] link becomes one [`EmittedMember`]
//!   whose body has every symbolic reference replaced by either a direct
//!   call to another member or the inlined body of the target link.
//! The final link is emitted under the name of the member itself,
//!   so that callers outside of the chain observe the fully-composed
//!   implementation;
//!     every other link keeps a name of its own.
//!
//! Emission is deterministic and produces only fragments;
//!   rendering them into host-language text is the job of downstream
//!   code generation.
//! The [`Display`] implementations here are a plain-text rendering used by
//!   `weaveld` and in tests.

use super::{
    chain::{LinkOrigin, Pos},
    error::EmissionFailureReason,
    inline::{Classification, OptimizedChain},
    resolve::Binding,
    LinkError, LinkResult,
};
use crate::{
    body::{Args, Node},
    decl::DeclId,
    global,
    sym::{GlobalSymbolIntern, Name},
};
use fixedbitset::FixedBitSet;
use std::fmt::{self, Display, Write};
use tracing::debug;


/// Target of an emitted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberRef {
    /// A member emitted for the same chain.
    Local(Name),

    /// The member as seen on the base type.
    Inherited(DeclId),
}

impl Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(name) => write!(f, "this.{name}"),
            Self::Inherited(decl) => write!(f, "base.{}", decl.member),
        }
    }
}

/// A piece of an emitted member body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Opaque host-language code,
    ///   copied verbatim from the contributing body.
    Code(String),

    /// Direct call to another member.
    Call { callee: MemberRef, args: Args },

    /// Body of an inlined link,
    ///   substituted at its call site.
    Inline {
        link: Name,
        args: Args,
        body: Vec<Fragment>,
    },
}

/// A concrete member produced from a single chain link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedMember {
    pub name: Name,
    pub origin: LinkOrigin,
    pub body: Vec<Fragment>,
}

/// Every member emitted for a single declaration,
///   in chain order.
///
/// The last member is always the final link,
///   named after the declared member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedChain {
    pub decl: DeclId,
    pub members: Vec<EmittedMember>,
}

impl EmittedChain {
    pub fn member(&self, name: Name) -> Option<&EmittedMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// Emit every surviving link of an optimized chain.
pub fn emit(optimized: &OptimizedChain) -> LinkResult<EmittedChain> {
    let chain = optimized.chain();
    let mut emitter = Emitter {
        optimized,
        active: FixedBitSet::with_capacity(chain.len()),
    };

    let members = optimized
        .survivors()
        .map(|pos| {
            Ok(EmittedMember {
                name: physical_name(optimized, pos),
                origin: chain.links()[pos].origin,
                body: emitter.expand(pos, 0)?,
            })
        })
        .collect::<LinkResult<Vec<_>>>()?;

    debug!(decl = %chain.decl, members = members.len(), "emitted chain");

    Ok(EmittedChain {
        decl: chain.decl,
        members,
    })
}

/// Name of the physical member emitted for the link at `pos`.
fn physical_name(optimized: &OptimizedChain, pos: Pos) -> Name {
    let chain = optimized.chain();
    let link = &chain.links()[pos];

    match link.origin {
        _ if pos == chain.final_pos() => chain.decl.member,
        LinkOrigin::Source => format!(
            "{}{}",
            chain.decl.member,
            global::SOURCE_LINK_SUFFIX
        )
        .intern(),
        LinkOrigin::Introduction(_) | LinkOrigin::Override(_) => link.name,
    }
}

struct Emitter<'a> {
    optimized: &'a OptimizedChain,

    /// Links currently being expanded,
    ///   for detecting inlining cycles.
    active: FixedBitSet,
}

impl<'a> Emitter<'a> {
    fn expand(&mut self, pos: Pos, depth: usize) -> LinkResult<Vec<Fragment>> {
        let optimized = self.optimized;
        let link = &optimized.chain().links()[pos];
        let bindings = optimized.bindings(pos);

        self.active.insert(pos);

        let mut sites = 0;
        let mut frags = Vec::with_capacity(link.body.nodes().len());

        for node in link.body.nodes() {
            match node {
                Node::Code(code) => frags.push(Fragment::Code(code.clone())),

                Node::Call(site) => {
                    let binding = bindings
                        .get(sites)
                        .copied()
                        .ok_or_else(|| self.fail(pos, pos, Missing))?;
                    sites += 1;

                    frags.push(self.realize(
                        pos,
                        binding,
                        site.args.clone(),
                        depth,
                    )?);
                }
            }
        }

        self.active.set(pos, false);

        Ok(frags)
    }

    fn realize(
        &mut self,
        from: Pos,
        binding: Binding,
        args: Args,
        depth: usize,
    ) -> LinkResult<Fragment> {
        let target = match binding {
            Binding::Inherited(base) => {
                return Ok(Fragment::Call {
                    callee: MemberRef::Inherited(base.decl),
                    args,
                })
            }
            Binding::Link(target) => target,
        };

        match self.optimized.classification(target) {
            Classification::Opaque => Ok(Fragment::Call {
                callee: MemberRef::Local(physical_name(self.optimized, target)),
                args,
            }),

            // `inline::analyze` never inlines a link that references
            //   itself and never nests inlines past the cap;
            //     these two guard chains that did not come from it.
            Classification::Inlined if self.active.contains(target) => {
                Err(self.fail(from, target, Cycle))
            }

            Classification::Inlined if depth >= global::MAX_INLINE_DEPTH => {
                Err(self.fail(from, target, Depth))
            }

            Classification::Inlined => Ok(Fragment::Inline {
                link: self.optimized.chain().links()[target].name,
                args,
                body: self.expand(target, depth + 1)?,
            }),

            // Callers are rebound past discarded links,
            //   and dropped links have no callers.
            Classification::Discarded | Classification::Dropped => {
                Err(self.fail(from, target, Missing))
            }
        }
    }

    fn fail(&self, from: Pos, target: Pos, kind: FailKind) -> LinkError {
        let chain = self.optimized.chain();
        let target_name = chain.links()[target].name;

        LinkError::EmissionFailure {
            decl: chain.decl,
            layer: chain.links()[from].link_ref(),
            reason: match kind {
                Missing => EmissionFailureReason::MissingTarget(target_name),
                Cycle => EmissionFailureReason::InlineCycle(target_name),
                Depth => {
                    EmissionFailureReason::InlineDepthExceeded(target_name)
                }
            },
        }
    }
}

#[derive(Clone, Copy)]
enum FailKind {
    Missing,
    Cycle,
    Depth,
}

use FailKind::*;

impl Display for EmittedChain {
    /// Render each member as a block headed by its name and origin.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "// {}", self.decl)?;

        for member in self.members.iter() {
            let origin = match member.origin {
                LinkOrigin::Source => "source".to_string(),
                LinkOrigin::Introduction(aspect) => {
                    format!("introduced by {aspect}")
                }
                LinkOrigin::Override(aspect) => format!("override by {aspect}"),
            };

            writeln!(f, "{} {{ // {origin}", member.name)?;
            write_fragments(f, &member.body, 1)?;
            writeln!(f, "}}")?;
        }

        Ok(())
    }
}

fn write_fragments<W: Write>(
    f: &mut W,
    frags: &[Fragment],
    indent: usize,
) -> fmt::Result {
    let pad = "    ".repeat(indent);

    for frag in frags {
        match frag {
            Fragment::Code(code) if code.trim().is_empty() => (),
            Fragment::Code(code) => writeln!(f, "{pad}{}", code.trim())?,
            Fragment::Call { callee, args } => {
                writeln!(f, "{pad}{callee}({args});")?
            }
            Fragment::Inline { link, args, body } => {
                writeln!(f, "{pad}{{ // inline {link}({args})")?;
                write_fragments(f, body, indent + 1)?;
                writeln!(f, "{pad}}}")?;
            }
        }
    }

    Ok(())
}

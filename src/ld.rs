// Override-chain linker
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

//! The override-chain linker composes the layers contributed by many
//!   independent aspects to the same declaration into a single final
//!   implementation.
//!
//! Its user-facing binary is [`weaveld`][weaveld].
//!
//! [weaveld]: ../../weaveld
//!
//! Linking a declaration proceeds in stages,
//!   each in its own module:
//!
//!   1. The [`registry`] holds every layer contributed to each
//!        declaration,
//!        along with the untouched original implementation;
//!   2. the [`chain`] builder orders those layers into an explicit
//!        override chain `[Source, Layer₁, …, Layerₙ]`;
//!   3. the [`resolve`]r binds every symbolic call site
//!        (`original`, `base`, `self`, `final`)
//!        to a concrete chain position against the _logical_ chain;
//!   4. the [`inline`] analyzer decides which links are discarded,
//!        which are inlined into their only caller,
//!        and which remain opaque members,
//!        rebinding call sites as links disappear; and
//!   5. the [`emit`]ter produces one physical member per surviving link.
//!
//! The [`pass`] driver runs these stages for every declaration in a
//!   [`Registry`],
//!     in parallel,
//!     while respecting the one ordering constraint between declarations:
//!       a derived type's chain is built only after its base type's chain
//!       is frozen.
//!
//! Every failure is local to a single declaration
//!   (see [`LinkError`]);
//!   the pass never aborts because one declaration failed to link.

pub mod chain;
pub mod emit;
pub mod error;
pub mod inline;
pub mod pass;
pub mod registry;
pub mod resolve;

pub use chain::{BaseChains, BaseLink, Chain, Link, LinkOrigin, Pos};
pub use emit::{EmittedChain, EmittedMember, Fragment, MemberRef};
pub use error::{
    EmissionFailureReason, IntroductionConflict, LinkError, LinkErrorCode,
    LinkRef,
};
pub use inline::{Classification, OptimizedChain};
pub use pass::{link_pass, CancelToken, LinkOptions, PassOutput};
pub use registry::{Layer, Member, Registry, Relation, Source};
pub use resolve::{Binding, ResolvedChain};

/// Result of linking a single declaration.
pub type LinkResult<T> = Result<T, LinkError>;

/// Link a single declaration from start to finish.
///
/// This is the sequential composition of every stage of the linker for
///   one declaration;
///     see the [module-level documentation](self).
/// [`link_pass`] uses this same composition for every declaration of a
///   registry.
pub fn link_decl<B: BaseChains>(
    registry: &Registry,
    decl: crate::decl::DeclId,
    bases: &B,
) -> LinkResult<EmittedChain> {
    link_chain(chain::build(registry, decl, bases)?)
}

/// Resolve,
///   optimize,
///   and emit an already-built chain.
pub fn link_chain(chain: Chain) -> LinkResult<EmittedChain> {
    let resolved = resolve::resolve(chain)?;
    let optimized = inline::analyze(resolved)?;

    emit::emit(&optimized)
}

// Link errors
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

//! Errors resulting from linking a declaration.
//!
//! All link errors are _local_:
//!   they cause the link of a single declaration to fail,
//!     and are reported alongside the results of every other declaration
//!     of the pass.
//! Each error names the declaration that failed and,
//!   where one is responsible,
//!   the link (and so the aspect layer) that caused it.

use std::{
    error::Error,
    fmt::{self, Display},
};

use crate::{
    body::RefKind,
    decl::{Accessor, DeclId},
    diagnose::{Annotate, AnnotatedSpan, Diagnostic},
    global::LayerRank,
    span::Span,
    sym::Name,
};

/// Reference to the chain link responsible for an error.
///
/// Links contributed by aspect layers carry the name of the aspect;
///   links synthesized by the linker itself do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkRef {
    pub name: Name,
    pub aspect: Option<Name>,
    pub span: Span,
}

impl Display for LinkRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.aspect {
            Some(aspect) => write!(f, "`{}` (aspect `{}`)", self.name, aspect),
            None => write!(f, "`{}`", self.name),
        }
    }
}

/// Taxonomy code of a [`LinkError`].
///
/// This allows callers to classify errors without matching on (and
///   depending upon) the data carried by each variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkErrorCode {
    AmbiguousOrder,
    InvalidIntroductionPosition,
    DanglingBaseReference,
    EmissionFailure,
    CrossAccessorReference,
    InheritanceCycle,
}

impl Display for LinkErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use LinkErrorCode::*;

        match self {
            AmbiguousOrder => write!(f, "AmbiguousOrder"),
            InvalidIntroductionPosition => {
                write!(f, "InvalidIntroductionPosition")
            }
            DanglingBaseReference => write!(f, "DanglingBaseReference"),
            EmissionFailure => write!(f, "EmissionFailure"),
            CrossAccessorReference => write!(f, "CrossAccessorReference"),
            InheritanceCycle => write!(f, "InheritanceCycle"),
        }
    }
}

/// Why an introduction layer could not occupy the bottom of its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroductionConflict {
    /// The member already has an implementation at the given span.
    ExistingMember(Span),

    /// A lower-ranked layer precedes the introduction.
    PrecededBy(LinkRef),
}

/// Why an optimized chain could not be converted into concrete members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmissionFailureReason {
    /// A call site is bound to a link that has no physical member and
    ///   cannot be inlined.
    MissingTarget(Name),

    /// Rebinding call sites through discarded links never reached a
    ///   surviving link.
    ForwardCycle(Name),

    /// Inlining a link would require inlining it into itself.
    InlineCycle(Name),

    /// Inlined bodies nest deeper than
    ///   [`MAX_INLINE_DEPTH`](crate::global::MAX_INLINE_DEPTH).
    InlineDepthExceeded(Name),
}

impl Display for EmissionFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use EmissionFailureReason::*;

        match self {
            MissingTarget(name) => {
                write!(f, "call target `{name}` has no physical member")
            }
            ForwardCycle(name) => {
                write!(f, "discarded link `{name}` forwards into a cycle")
            }
            InlineCycle(name) => {
                write!(f, "link `{name}` would be inlined into itself")
            }
            InlineDepthExceeded(name) => {
                write!(f, "inlining `{name}` exceeds the maximum inline depth")
            }
        }
    }
}

/// An error from linking a single declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Two layers on one declaration share a rank.
    ///
    /// The linker performs no tie-breaking of its own;
    ///   ranks are expected to have been made unique upstream.
    AmbiguousOrder {
        decl: DeclId,
        rank: LayerRank,
        first: LinkRef,
        second: LinkRef,
    },

    /// An introduction layer is somewhere other than the bottom of its
    ///   chain,
    ///     or is introducing a member that already exists.
    InvalidIntroductionPosition {
        decl: DeclId,
        layer: LinkRef,
        conflict: IntroductionConflict,
    },

    /// A `base` or `original` reference from the bottom of a chain could
    ///   not be bound because there is no inherited member to bind it to.
    ///
    /// This indicates a misconfigured aspect dependency upstream;
    ///   it is never silently treated as a no-op.
    DanglingBaseReference {
        decl: DeclId,
        layer: LinkRef,
        kind: RefKind,
        span: Span,
    },

    /// A resolved and optimized chain could not be converted into concrete
    ///   members.
    EmissionFailure {
        decl: DeclId,
        layer: LinkRef,
        reason: EmissionFailureReason,
    },

    /// A reference names an accessor other than that of the chain it
    ///   appears in.
    ///
    /// Paired accessors are linked independently and can never reference
    ///   one another's chains.
    CrossAccessorReference {
        decl: DeclId,
        layer: LinkRef,
        accessor: Accessor,
        span: Span,
    },

    /// The declaration's type participates in an inheritance cycle,
    ///   and so the base chain it depends upon can never be frozen.
    InheritanceCycle {
        decl: DeclId,
        cycle: Vec<Name>,
        span: Span,
    },
}

impl LinkError {
    /// Taxonomy code of this error.
    pub fn code(&self) -> LinkErrorCode {
        use LinkError::*;

        match self {
            AmbiguousOrder { .. } => LinkErrorCode::AmbiguousOrder,
            InvalidIntroductionPosition { .. } => {
                LinkErrorCode::InvalidIntroductionPosition
            }
            DanglingBaseReference { .. } => {
                LinkErrorCode::DanglingBaseReference
            }
            EmissionFailure { .. } => LinkErrorCode::EmissionFailure,
            CrossAccessorReference { .. } => {
                LinkErrorCode::CrossAccessorReference
            }
            InheritanceCycle { .. } => LinkErrorCode::InheritanceCycle,
        }
    }

    /// Declaration that failed to link.
    pub fn decl(&self) -> DeclId {
        use LinkError::*;

        match self {
            AmbiguousOrder { decl, .. }
            | InvalidIntroductionPosition { decl, .. }
            | DanglingBaseReference { decl, .. }
            | EmissionFailure { decl, .. }
            | CrossAccessorReference { decl, .. }
            | InheritanceCycle { decl, .. } => *decl,
        }
    }

    /// The link held responsible for the error,
    ///   if any single link is.
    ///
    /// For [`LinkError::AmbiguousOrder`],
    ///   this is the second of the two layers to claim the rank.
    pub fn layer(&self) -> Option<&LinkRef> {
        use LinkError::*;

        match self {
            AmbiguousOrder { second, .. } => Some(second),
            InvalidIntroductionPosition { layer, .. }
            | DanglingBaseReference { layer, .. }
            | EmissionFailure { layer, .. }
            | CrossAccessorReference { layer, .. } => Some(layer),
            InheritanceCycle { .. } => None,
        }
    }
}

impl Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use LinkError::*;

        match self {
            AmbiguousOrder {
                decl,
                rank,
                first,
                second,
            } => write!(
                f,
                "layers {first} and {second} share rank {rank} on `{decl}`",
            ),

            InvalidIntroductionPosition { decl, layer, .. } => write!(
                f,
                "introduction {layer} must be the first implementation \
                    of `{decl}`",
            ),

            DanglingBaseReference {
                decl, layer, kind, ..
            } => write!(
                f,
                "`{kind}` reference in {layer} has no base to bind to \
                    on `{decl}`",
            ),

            EmissionFailure {
                decl,
                layer,
                reason,
            } => write!(
                f,
                "failed to emit {layer} of `{decl}`: {reason}",
            ),

            CrossAccessorReference {
                decl,
                layer,
                accessor,
                ..
            } => write!(
                f,
                "reference in {layer} of `{decl}` names accessor \
                    `{accessor}`",
            ),

            InheritanceCycle { decl, cycle, .. } => {
                write!(f, "cyclic inheritance while linking `{decl}`: ")?;

                let mut names = cycle.iter();
                if let Some(first) = names.next() {
                    write!(f, "{first}")?;
                    for name in names {
                        write!(f, " -> {name}")?;
                    }
                    write!(f, " -> {first}")?;
                }

                Ok(())
            }
        }
    }
}

impl Error for LinkError {}

impl Diagnostic for LinkError {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        use LinkError::*;

        match self {
            AmbiguousOrder {
                rank,
                first,
                second,
                ..
            } => vec![
                first.span.note(format!("rank {rank} first claimed here")),
                second.span.error(format!(
                    "layer `{}` also claims rank {rank}",
                    second.name
                )),
                second.span.help(
                    "the linker does not break ties between layers; \
                        declare an order between these aspects",
                ),
            ],

            InvalidIntroductionPosition {
                layer, conflict, ..
            } => match conflict {
                IntroductionConflict::ExistingMember(existing) => vec![
                    (*existing).note("member is already implemented here"),
                    layer.span.error("cannot introduce an existing member"),
                    layer.span.help(
                        "use an override layer to modify an existing member",
                    ),
                ],
                IntroductionConflict::PrecededBy(prev) => vec![
                    prev.span.note(format!(
                        "layer `{}` is ordered before the introduction",
                        prev.name
                    )),
                    layer
                        .span
                        .error("introduction must be the lowest-ranked layer"),
                ],
            },

            DanglingBaseReference {
                layer, kind, span, ..
            } => vec![
                (*span).error(format!("`{kind}` cannot be bound")),
                layer.span.note(format!(
                    "{} is the bottom of its chain and there is no \
                        inherited member below it",
                    layer,
                )),
                (*span).help(
                    "this usually means that the aspect providing the \
                        base member did not run first",
                ),
            ],

            EmissionFailure { layer, reason, .. } => layer
                .span
                .internal_error(format!("{reason}"))
                .with_help(
                    "this is a bug in the linker; \
                        marking the layer as non-inlineable may work around it",
                )
                .into(),

            CrossAccessorReference { decl, accessor, span, .. } => vec![
                (*span).error(format!(
                    "references accessor `{accessor}` from the `{}` chain",
                    decl.accessor
                )),
                (*span).help(
                    "paired accessors are linked independently; \
                        a reference may only target its own accessor",
                ),
            ],

            InheritanceCycle { span, .. } => {
                vec![(*span).error("type inherits from itself")]
            }
        }
    }
}

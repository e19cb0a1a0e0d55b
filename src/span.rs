// Source spans
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

//! Mapping to source input byte intervals.
//!
//! A [`Span`] is a mapping to a byte interval within some source,
//!   representing where a layer,
//!     call site,
//!     or member originated.
//! This underpins the [diagnostic system](crate::diagnose):
//!   every link error is reported against the span of the aspect layer
//!   that caused it so that the user is able to trace the problem back to
//!   its source.
//!
//! A span contains a [`Context`] naming the source
//!   (typically the path of the manifest or template that contributed
//!   the layer).
//!
//! ```
//! use weaver::span::{Span, Context};
//! use weaver::sym::GlobalSymbolIntern;
//!
//! let ctx: Context = "aspects/logging.xml".intern().into();
//! let span = Span::new(2, 6, ctx);
//!
//! assert_eq!(2, span.offset());
//! assert_eq!(6, span.len());
//! assert_eq!(ctx, span.context());
//!
//! // Freely copyable
//! let cp = span;
//! assert_eq!(cp, span);
//! ```
//!
//! A span is ordered first by [`Context`],
//!   then by offset,
//!   and finally by length.

use crate::sym::Name;
use std::fmt::{self, Display};

/// Byte offset of a span within its [`Context`].
pub type SpanOffsetSize = u32;

/// Byte length of a span.
pub type SpanLenSize = u16;

/// Description of a byte interval within a [`Context`].
///
/// See the [module-level documentation](self) for more information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    ctx: Context,
    offset: SpanOffsetSize,
    len: SpanLenSize,
}

impl Span {
    /// Create a new span from its constituent parts.
    pub fn new<C: Into<Context>>(
        offset: SpanOffsetSize,
        len: SpanLenSize,
        ctx: C,
    ) -> Self {
        Self {
            ctx: ctx.into(),
            offset,
            len,
        }
    }

    /// A zero-length span at the beginning of the given context.
    pub const fn st_ctx(ctx: Context) -> Self {
        Self {
            ctx,
            offset: 0,
            len: 0,
        }
    }

    /// Byte offset of the beginning of the span relative to its context.
    pub fn offset(&self) -> SpanOffsetSize {
        self.offset
    }

    /// Byte length of the span.
    pub fn len(&self) -> SpanLenSize {
        self.len
    }

    /// Context onto which the byte offsets are mapped.
    pub fn context(&self) -> Context {
        self.ctx
    }

    /// Create a new span offset by `value` bytes.
    ///
    /// If the offset would overflow,
    ///   [`None`] is returned.
    pub const fn offset_add(self, value: SpanOffsetSize) -> Option<Self> {
        match self.offset.checked_add(value) {
            Some(offset) => Some(Self {
                ctx: self.ctx,
                offset,
                len: self.len,
            }),
            None => None,
        }
    }
}

impl Display for Span {
    /// Display a span as `ctx offset:len`.
    ///
    /// Diagnostics render spans through a
    ///   [`Reporter`](crate::diagnose::Reporter);
    ///     this is for situations where a span must be displayed without
    ///     one.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} offset {}:{}", self.ctx, self.offset, self.len)
    }
}

/// A placeholder span indicating that a span is expected but is not
///   known.
///
/// This is used for objects synthesized by the linker itself,
///   such as trivial backing-field sources.
pub const UNKNOWN_SPAN: Span = Span::st_ctx(UNKNOWN_CONTEXT);

/// The source of a [`Span`],
///   represented by its name (usually a path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Context(Name);

impl Context {
    /// Produce a [`Span`] within the given context.
    pub const fn span(self, offset: SpanOffsetSize, len: SpanLenSize) -> Span {
        Span {
            ctx: self,
            offset,
            len,
        }
    }

    /// Produce a [`Span`] within the given context,
    ///   saturating any values that do not fit within the span's
    ///   representation.
    ///
    /// Input sources may be arbitrarily large;
    ///   a saturated span is still better than none at all for
    ///   diagnostics.
    pub fn span_or_zz(self, offset: usize, len: usize) -> Span {
        self.span(
            offset.try_into().unwrap_or(SpanOffsetSize::MAX),
            len.try_into().unwrap_or(SpanLenSize::MAX),
        )
    }

    /// Whether this is the [`UNKNOWN_CONTEXT`].
    pub fn is_unknown(&self) -> bool {
        *self == UNKNOWN_CONTEXT
    }
}

/// A placeholder context indicating that a context is expected but is not
///   known.
pub const UNKNOWN_CONTEXT: Context = Context(Name::st("<unknown>"));

impl<N: Into<Name>> From<N> for Context {
    fn from(name: N) -> Self {
        Self(name.into())
    }
}

impl Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Dummy spans for testing.
#[cfg(test)]
pub mod dummy {
    use super::*;

    /// A dummy context that can be used where a span is expected but is not
    ///   important.
    ///
    /// For contexts that are actually unknown,
    ///   use [`super::UNKNOWN_CONTEXT`].
    pub const DUMMY_CONTEXT: Context = Context(Name::st("#!DUMMY"));

    /// A dummy span that can be used in contexts where a span is expected
    ///   but is not important.
    ///
    /// Additional dummy spans can be derived from this one.
    pub const DUMMY_SPAN: Span = Span::st_ctx(DUMMY_CONTEXT);

    pub const S1: Span = DUMMY_CONTEXT.span(1, 0);
    pub const S2: Span = DUMMY_CONTEXT.span(2, 0);
    pub const S3: Span = DUMMY_CONTEXT.span(3, 0);
    pub const S4: Span = DUMMY_CONTEXT.span(4, 0);
    pub const S5: Span = DUMMY_CONTEXT.span(5, 0);
    pub const S6: Span = DUMMY_CONTEXT.span(6, 0);
    pub const S7: Span = DUMMY_CONTEXT.span(7, 0);
    pub const S8: Span = DUMMY_CONTEXT.span(8, 0);
    pub const S9: Span = DUMMY_CONTEXT.span(9, 0);
    pub const S10: Span = DUMMY_CONTEXT.span(10, 0);
}

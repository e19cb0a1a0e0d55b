// Weave manifest errors
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

//! Errors while reading `weave` manifests.

use crate::{
    decl::{Accessor, MemberKind},
    diagnose::{Annotate, AnnotatedSpan, Diagnostic},
    span::Span,
    sym::Name,
};
use std::{error::Error, fmt::Display};

/// Error during `weave` manifest reading.
///
/// Manifests are produced by a tool rather than written by hand,
///   so any of these errors indicates a bug in the producer;
///     reading does not attempt to recover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeaveError {
    /// The underlying XML is malformed.
    Xml(String, Span),

    /// The root element is not `weave`.
    UnexpectedRoot(String, Span),

    /// An element was found where it is not permitted.
    UnexpectedElement(String, Span),

    /// Non-whitespace text was found outside of a `code` element.
    UnexpectedText(Span),

    /// Input ended before the root element was closed.
    UnexpectedEof(Span),

    /// An element is missing a required attribute.
    MissingAttr {
        ele: &'static str,
        attr: &'static str,
        span: Span,
    },

    /// An element has an attribute that it does not recognize.
    UnknownAttr {
        ele: &'static str,
        attr: String,
        span: Span,
    },

    /// An attribute value could not be parsed.
    InvalidValue {
        attr: &'static str,
        value: String,
        span: Span,
    },

    /// A layer or source names an accessor that its member does not have.
    AccessorMismatch {
        member: Name,
        kind: MemberKind,
        accessor: Accessor,
        span: Span,
    },

    /// A member is inherited but its type declares no base.
    NoBaseType { ty: Name, member: Name, span: Span },

    /// A member was declared more than once on the same type.
    DuplicateMember {
        ty: Name,
        member: Name,
        first: Option<Span>,
        span: Span,
    },

    /// A member has more than one `source` for the same accessor.
    DuplicateSource {
        member: Name,
        accessor: Accessor,
        first: Span,
        span: Span,
    },
}

impl Display for WeaveError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        use WeaveError::*;

        match self {
            Xml(msg, _) => write!(fmt, "malformed manifest: {msg}"),

            UnexpectedRoot(name, _) => {
                write!(fmt, "expected `weave` root element, found `{name}`")
            }

            UnexpectedElement(name, _) => {
                write!(fmt, "unexpected element `{name}`")
            }

            UnexpectedText(_) => write!(fmt, "unexpected text"),

            UnexpectedEof(_) => write!(fmt, "unexpected end of manifest"),

            MissingAttr { ele, attr, .. } => {
                write!(fmt, "`{ele}` is missing required attribute `@{attr}`")
            }

            UnknownAttr { ele, attr, .. } => {
                write!(fmt, "unknown attribute `@{attr}` on `{ele}`")
            }

            InvalidValue { attr, value, .. } => {
                write!(fmt, "invalid value `{value}` for `@{attr}`")
            }

            AccessorMismatch {
                member,
                kind,
                accessor,
                ..
            } => write!(
                fmt,
                "{kind} `{member}` has no accessor `{accessor}`"
            ),

            NoBaseType { ty, member, .. } => write!(
                fmt,
                "member `{member}` is inherited, but type `{ty}` has no base"
            ),

            DuplicateMember { ty, member, .. } => {
                write!(fmt, "member `{member}` of `{ty}` is declared twice")
            }

            DuplicateSource {
                member, accessor, ..
            } => write!(
                fmt,
                "member `{member}` has two sources for accessor `{accessor}`"
            ),
        }
    }
}

impl Error for WeaveError {}

impl WeaveError {
    /// Location of the offending input.
    pub fn span(&self) -> Span {
        use WeaveError::*;

        match self {
            Xml(_, span)
            | UnexpectedRoot(_, span)
            | UnexpectedElement(_, span)
            | UnexpectedText(span)
            | UnexpectedEof(span)
            | MissingAttr { span, .. }
            | UnknownAttr { span, .. }
            | InvalidValue { span, .. }
            | AccessorMismatch { span, .. }
            | NoBaseType { span, .. }
            | DuplicateMember { span, .. }
            | DuplicateSource { span, .. } => *span,
        }
    }
}

impl Diagnostic for WeaveError {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        use WeaveError::*;

        let span = self.span();

        match self {
            Xml(..) | UnexpectedText(_) | UnknownAttr { .. } => {
                span.mark_error().into()
            }

            UnexpectedRoot(..) => span.error("this should be `weave`").into(),

            UnexpectedElement(..) => {
                span.error("element not permitted here").into()
            }

            UnexpectedEof(_) => {
                span.error("manifest ends before `weave` is closed").into()
            }

            MissingAttr { attr, .. } => {
                span.error(format!("missing `@{attr}`")).into()
            }

            InvalidValue { attr, .. } => {
                span.error(format!("cannot parse `@{attr}`")).into()
            }

            AccessorMismatch { kind, .. } => {
                let expected = kind
                    .accessors()
                    .iter()
                    .map(|a| format!("`{a}`"))
                    .collect::<Vec<_>>()
                    .join(" or ");

                span.error(format!("expected {expected}")).into()
            }

            NoBaseType { .. } => span
                .error("inherited member declared here")
                .with_help("declare `@base` on the enclosing `type`")
                .into(),

            DuplicateMember { first, .. } => {
                let mut desc = vec![span.error("declared again here")];
                desc.extend(first.map(|f| f.note("first declared here")));
                desc
            }

            DuplicateSource { first, .. } => vec![
                span.error("second source for this accessor"),
                first.note("first source here"),
            ],
        }
    }
}

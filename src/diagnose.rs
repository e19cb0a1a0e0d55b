// Diagnostic system
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

//! Diagnostics for link and manifest errors.
//!
//! Every error of the linker can [describe](Diagnostic::describe) itself
//!   as a list of [`AnnotatedSpan`]s:
//!     the manifest location at fault,
//!     followed by any related locations,
//!       such as the layer that first claimed a contested rank.
//! A [`Reporter`] renders that list for display.
//!
//! Link errors are local to a single declaration,
//!   and so a linker pass may produce many of them;
//!     each is rendered independently and bound to the aspect layer that
//!     caused it.

mod report;

pub use report::{Report, Reporter, VisualReporter};

use core::fmt;
use std::{borrow::Cow, error::Error, fmt::Display};

use crate::span::Span;

/// An error that can point into the manifest that caused it.
pub trait Diagnostic: Error + Sized {
    /// Locations involved in the error,
    ///   most relevant first.
    fn describe(&self) -> Vec<AnnotatedSpan>;
}

/// Severity of a report or of a single annotated location.
///
/// Lower levels are more severe;
///   a report takes the level of its most severe annotation.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
#[repr(u8)]
pub enum Level {
    /// The linker reached a state that valid input can never produce.
    InternalError = 1,

    /// The manifest or the layers it describes are at fault,
    ///   such as two layers sharing a rank.
    #[default]
    Error,

    /// A related location,
    ///   such as the other layer of a contested rank.
    Note,

    /// A suggested fix.
    Help,
}

impl Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::InternalError => write!(f, "internal error"),
            Level::Error => write!(f, "error"),
            Level::Note => write!(f, "note"),
            Level::Help => write!(f, "help"),
        }
    }
}

/// Text displayed alongside an [`AnnotatedSpan`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Label<'a>(Cow<'a, str>);

impl<'a> Display for Label<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<'a> From<String> for Label<'a> {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}

impl<'a> From<&'a str> for Label<'a> {
    fn from(s: &'a str) -> Self {
        Self(Cow::Borrowed(s))
    }
}

/// A manifest location with a severity and optional label.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AnnotatedSpan<'l>(Span, Level, Option<Label<'l>>);

impl<'l> AnnotatedSpan<'l> {
    pub fn span(&self) -> Span {
        self.0
    }

    /// Follow this annotation with a suggested fix at the same location.
    pub fn with_help<L: Into<Label<'l>>>(
        self,
        label: L,
    ) -> [AnnotatedSpan<'l>; 2] {
        let span = self.0;
        [self, span.help(label)]
    }
}

impl<'l> From<AnnotatedSpan<'l>> for Vec<AnnotatedSpan<'l>> {
    fn from(x: AnnotatedSpan<'l>) -> Self {
        vec![x]
    }
}

/// Annotation of manifest locations at each [`Level`].
pub trait Annotate: Into<Span> {
    /// A bug in the linker,
    ///   labelled with what went wrong.
    fn internal_error<'l, L: Into<Label<'l>>>(
        self,
        label: L,
    ) -> AnnotatedSpan<'l> {
        AnnotatedSpan(self.into(), Level::InternalError, Some(label.into()))
    }

    /// The location at fault,
    ///   labelled with what is wrong there.
    ///
    /// Use [`Annotate::mark_error`] when the label would only repeat the
    ///   error message.
    fn error<'l, L: Into<Label<'l>>>(self, label: L) -> AnnotatedSpan<'l> {
        AnnotatedSpan(self.into(), Level::Error, Some(label.into()))
    }

    /// The location at fault,
    ///   without a label.
    fn mark_error(self) -> AnnotatedSpan<'static> {
        AnnotatedSpan(self.into(), Level::Error, None)
    }

    fn note<'l, L: Into<Label<'l>>>(self, label: L) -> AnnotatedSpan<'l> {
        AnnotatedSpan(self.into(), Level::Note, Some(label.into()))
    }

    fn help<'l, L: Into<Label<'l>>>(self, label: L) -> AnnotatedSpan<'l> {
        AnnotatedSpan(self.into(), Level::Help, Some(label.into()))
    }
}

impl Annotate for Span {}

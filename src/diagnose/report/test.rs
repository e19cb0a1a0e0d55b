// Tests for diagnostic system rendering
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

// These tests assert,
//   byte-for-byte,
//   against the report output that will be rendered to the user.
// This makes the tests more fragile,
//   but the cost is intentional:
//     the slightest misrendering could cause significant confusion.

use super::*;
use crate::{
    diagnose::Annotate,
    span::{dummy::DUMMY_CONTEXT, UNKNOWN_SPAN},
};
use std::error::Error;

#[derive(Debug)]
struct StubError(String, Vec<AnnotatedSpan<'static>>);

impl Display for StubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for StubError {}

impl Diagnostic for StubError {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        self.1.clone()
    }
}

macro_rules! assert_report {
    ($msg:expr, $aspans:expr, $expected:expr) => {
        let mut sut = VisualReporter::new();

        assert_eq!(
            sut.render(&StubError($msg.into(), $aspans)).to_string(),
            $expected,
        );
    };
}

#[test]
fn no_spans() {
    assert_report!(
        "test with no spans",
        vec![],
        // No spans will result in the `Display` of the error only.
        "error: test with no spans\n"
    );
}

#[test]
fn span_error_no_label() {
    let span = Context::from("aspects/a.xml").span(53, 4);

    assert_report!(
        "single span no label",
        vec![span.mark_error()],
        "\
error: single span no label
  --> aspects/a.xml offset 53--57
"
    );
}

#[test]
fn span_error_with_label() {
    let span = Context::from("aspects/b.xml").span(30, 3);

    assert_report!(
        "single span with label",
        vec![span.error("span label here")],
        "\
error: single span with label
  --> aspects/b.xml offset 30--33
      error: span label here
"
    );
}

#[test]
fn adjacent_eq_span_labels_squashed() {
    let span = DUMMY_CONTEXT.span(5, 2);

    assert_report!(
        "squashed",
        vec![span.error("first"), span.help("second")],
        "\
error: squashed
  --> #!DUMMY offset 5--7
      error: first
      help: second
"
    );
}

#[test]
fn nonadjacent_eq_span_not_squashed() {
    let a = DUMMY_CONTEXT.span(1, 1);
    let b = DUMMY_CONTEXT.span(2, 1);

    assert_report!(
        "revisited",
        vec![a.error("a"), b.note("b"), a.help("a again")],
        "\
error: revisited
  --> #!DUMMY offset 1--2
      error: a
  --> #!DUMMY offset 2--3
      note: b
  --> #!DUMMY offset 1--2
      help: a again
"
    );
}

#[test]
fn unknown_context_omits_offsets() {
    assert_report!(
        "synthesized",
        vec![UNKNOWN_SPAN.note("generated by the linker")],
        "\
error: synthesized
  --> <unknown>
      note: generated by the linker
"
    );
}

#[test]
fn internal_error_raises_report_level() {
    assert_report!(
        "oops",
        vec![DUMMY_CONTEXT.span(0, 0).internal_error("this is a bug")],
        "\
internal error: oops
  --> #!DUMMY offset 0--0
      internal error: this is a bug
"
    );
}

#[test]
fn counts_errors() {
    let mut sut = VisualReporter::new();
    assert!(!sut.has_errors());

    let _ = sut.render(&StubError("one".into(), vec![]));
    let _ = sut.render(&StubError("two".into(), vec![]));

    assert!(sut.has_errors());
    assert_eq!(2, sut.error_count());
}

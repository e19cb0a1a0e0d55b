// Weave manifest files
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

//! `weave` manifest reading.
//!
//! A weave manifest describes every layer that every aspect contributes to
//!   a compilation unit,
//!     already ordered and already parsed.
//! It is XML because the front-end that produces it is not written in
//!   Rust;
//!     it is only an interchange format,
//!       and is read directly into a [`Registry`](crate::ld::Registry).
//!
//! For example:
//!
//! ```xml
//! <weave>
//!   <type name="Target" base="Parent">
//!     <member name="Foo" kind="event" existing="true" params="handler">
//!       <source accessor="add"><code>impl_add(handler);</code></source>
//!
//!       <layer name="Foo_Override0" aspect="Logging" order="0"
//!              accessor="add" inlineable="true">
//!         <code>log("add");</code>
//!         <call ref="base"/>
//!       </layer>
//!
//!       <layer name="Foo_Override2" aspect="Audit" order="2"
//!              accessor="add" discardable="true">
//!         <call ref="base"/>
//!       </layer>
//!     </member>
//!
//!     <member name="Bar" kind="method" inherited="true">
//!       <layer name="Bar_Intro" aspect="Audit" order="1"
//!              relation="introduction">
//!         <call ref="base" args="a, b"/>
//!       </layer>
//!     </member>
//!   </type>
//! </weave>
//! ```
//!
//! Each member expands into one declaration per accessor
//!   (see [`MemberKind::accessors`](crate::decl::MemberKind::accessors)).
//! A `call` without `args` forwards the caller's own parameters.
//! A member is `inherited` from the `base` of its type.

mod error;
mod reader;

pub use error::WeaveError;
pub use reader::WeaveReader;

/// Result of reading a weave manifest.
pub type WeaveResult<T> = Result<T, WeaveError>;

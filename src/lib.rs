// Aspect override-chain linker
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

//! Linker of aspect override chains.
//!
//! Aspects contribute _layers_ to declarations of a target type:
//!   code that runs in place of a method or accessor and that may call
//!   through to the implementation it wraps.
//! Weaver orders those layers into a chain for each declaration,
//!   binds every symbolic reference within each layer to a concrete link
//!   of that chain,
//!   decides which links may be discarded or inlined,
//!   and emits the members that survive.
//!
//! The entry point is the [`ld`] module;
//!   manifests describing the layers of a compilation unit are read by
//!   [`obj::weave`].

// We build docs for private items.
#![allow(rustdoc::private_intra_doc_links)]

pub mod global;

#[macro_use]
extern crate static_assertions;

pub mod body;
pub mod decl;
pub mod diagnose;
pub mod ld;
pub mod obj;
pub mod span;
pub mod sym;

// Global constants across the entirety of Weaver
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

//! System-wide static configuration.
//!
//! This module provides a system-wide configuration.
//! Subsystems should reference these values rather than defining their own
//!   and risk incompatibilities or maintenance issues as requirements
//!   change.
//!
//! By convention,
//!   import this entire module rather than individual members and reference
//!   them as `global::foo` to emphasize their nature and risk.

/// Rank of an aspect layer on a declaration.
///
/// Ranks are assigned upstream by the aspect ordering resolver and are
///   globally comparable across all aspects contributing to the same
///   declaration.
/// Lower ranks are closer to the original implementation.
pub type LayerRank = i32;

/// Maximum nesting of inlined bodies within a single emitted member.
///
/// Each inlined link may itself contain a call site that inlines another
///   link,
///     but only ever toward a link that is lower in the chain,
///     so the nesting depth is bounded by chain length.
/// A link that would nest deeper is emitted as a real member instead,
///   and the links it calls nest within it anew.
pub const MAX_INLINE_DEPTH: usize = 256;

/// Initial capacity of the registry's declaration tables.
///
/// This is only a hint;
///   the registry grows as needed.
pub const REGISTRY_INIT_CAPACITY: usize = 1024;

/// Suffix of the physical member name given to the source link of a
///   chain.
pub const SOURCE_LINK_SUFFIX: &str = "_Source";

/// Suffix of the backing field used by synthesized property and event
///   accessors.
pub const BACKING_FIELD_SUFFIX: &str = "_Backing";

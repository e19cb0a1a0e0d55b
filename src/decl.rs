// Overridable declarations
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

//! Declarations that aspects may override.
//!
//! A declaration is a method,
//!   property,
//!   or event of some type.
//! Properties and events are made up of a pair of accessors,
//!   and each accessor is linked completely independently of its pair;
//!     the unit of linking is therefore not the member itself,
//!     but a [`DeclId`] naming a single accessor of it.

use crate::sym::Name;
use arrayvec::ArrayVec;
use std::fmt::{self, Display};

/// Kind of an overridable member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Method,
    Property,
    Event,
}

impl MemberKind {
    /// Accessors that make up a member of this kind.
    ///
    /// Each accessor is its own [`DeclId`] with its own chain.
    pub fn accessors(self) -> ArrayVec<Accessor, 2> {
        let mut accessors = ArrayVec::new();

        match self {
            Self::Method => accessors.push(Accessor::Method),
            Self::Property => {
                accessors.push(Accessor::Get);
                accessors.push(Accessor::Set);
            }
            Self::Event => {
                accessors.push(Accessor::Add);
                accessors.push(Accessor::Remove);
            }
        }

        accessors
    }
}

impl Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method => write!(f, "method"),
            Self::Property => write!(f, "property"),
            Self::Event => write!(f, "event"),
        }
    }
}

/// A single linkable accessor of a member.
///
/// Methods have exactly one,
///   which is named [`Accessor::Method`] for uniformity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Accessor {
    Method,
    Get,
    Set,
    Add,
    Remove,
}

impl Accessor {
    /// The kind of member that this accessor belongs to.
    pub fn member_kind(self) -> MemberKind {
        match self {
            Self::Method => MemberKind::Method,
            Self::Get | Self::Set => MemberKind::Property,
            Self::Add | Self::Remove => MemberKind::Event,
        }
    }

    /// The other half of a paired accessor,
    ///   if any.
    pub fn pair(self) -> Option<Self> {
        match self {
            Self::Method => None,
            Self::Get => Some(Self::Set),
            Self::Set => Some(Self::Get),
            Self::Add => Some(Self::Remove),
            Self::Remove => Some(Self::Add),
        }
    }

    /// Parse an accessor from its keyword
    ///   (as produced by [`Display`]).
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "method" => Some(Self::Method),
            "get" => Some(Self::Get),
            "set" => Some(Self::Set),
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            _ => None,
        }
    }
}

impl Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method => write!(f, "method"),
            Self::Get => write!(f, "get"),
            Self::Set => write!(f, "set"),
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// Stable identifier of a linkable declaration:
///   a type,
///   one of its members,
///   and one accessor of that member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclId {
    pub ty: Name,
    pub member: Name,
    pub accessor: Accessor,
}

impl DeclId {
    pub fn new(ty: Name, member: Name, accessor: Accessor) -> Self {
        Self {
            ty,
            member,
            accessor,
        }
    }

    /// The same member and accessor as declared by another type.
    ///
    /// This is used to look up the chain of an inherited member on a base
    ///   type.
    pub fn on_type(self, ty: Name) -> Self {
        Self { ty, ..self }
    }

    /// The paired accessor of the same member,
    ///   if any.
    pub fn pair(self) -> Option<Self> {
        self.accessor.pair().map(|accessor| Self { accessor, ..self })
    }
}

impl Display for DeclId {
    /// Render as `Type::member` for methods,
    ///   or `Type::member.accessor` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.accessor {
            Accessor::Method => write!(f, "{}::{}", self.ty, self.member),
            acc => write!(f, "{}::{}.{}", self.ty, self.member, acc),
        }
    }
}

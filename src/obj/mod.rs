// Object files
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

//! Files consumed by the linker.
//!
//! The linker itself operates purely in memory on a
//!   [`Registry`](crate::ld::Registry);
//!     something must populate that registry.
//! The only format currently supported is the [`weave`] manifest,
//!   which is produced by the aspect front-end once every aspect has been
//!   discovered,
//!     every template parsed,
//!     and every layer assigned its rank.

pub mod weave;

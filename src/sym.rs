// Identifier names
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

//! Interned identifier names.
//!
//! Type names, member names, layer names and aspect names are compared
//!   and copied constantly throughout linking,
//!     so they are represented by a [`Name`]:
//!       a `Copy` handle to a string slice that lives for the remainder of
//!       the process.
//!
//! ```
//! use weaver::sym::{GlobalSymbolIntern, Name};
//!
//! let a = "Foo_Override0".intern();
//! let b = String::from("Foo_Override0").intern();
//!
//! assert_eq!(a, b);
//! assert_eq!("Foo_Override0", a.as_str());
//!
//! // Static names require no interning at all.
//! const FOO: Name = Name::st("Foo");
//! assert_eq!(FOO, "Foo".intern());
//! ```
//!
//! Global Interner
//! ===============
//! Strings are interned into a single process-wide pool that is never
//!   freed.
//! Unlike a thread-local pool,
//!   names can be freely sent between the worker threads of a linker
//!   pass (see [`crate::ld::pass`])
//!   and resolved to strings on any of them without a lookup.
//! Interning takes a lock;
//!   resolving a [`Name`] to a string does not.
//!
//! Since the pool is never freed,
//!   interning is intended for identifiers,
//!   not for arbitrary code fragments;
//!     those are owned by the [bodies](crate::body) that contain them.

use fxhash::FxHashSet;
use std::{
    cmp::Ordering,
    fmt::{self, Debug, Display},
    hash::{Hash, Hasher},
    sync::{Mutex, OnceLock},
};

/// An interned identifier.
///
/// Equality, ordering and hashing are all defined in terms of the
///   underlying string,
///     so a static name created with [`Name::st`] is equal to the same
///     string interned at runtime.
#[derive(Clone, Copy)]
pub struct Name(&'static str);

assert_eq_size!(Name, &'static str);
assert_impl_all!(Name: Send, Sync, Copy);

impl Name {
    /// A name backed by a static string slice.
    ///
    /// This does not touch the global pool and so is available in `const`
    ///   contexts.
    pub const fn st(s: &'static str) -> Self {
        Self(s)
    }

    /// The string this name represents.
    pub fn as_str(self) -> &'static str {
        self.0
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0) || self.0 == other.0
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(other.0)
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.0)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        s.intern()
    }
}

/// The process-wide pool of interned strings.
fn pool() -> &'static Mutex<FxHashSet<&'static str>> {
    static POOL: OnceLock<Mutex<FxHashSet<&'static str>>> = OnceLock::new();
    POOL.get_or_init(Default::default)
}

/// Intern a string using the global interner.
///
/// This provides a convenient API that creates the appearance that string
///   interning is a core Rust language feature
///   (e.g. `"foo".intern()`).
pub trait GlobalSymbolIntern {
    /// Intern a string using the global interner,
    ///   returning an existing [`Name`] if the string was already
    ///   interned.
    fn intern(self) -> Name;
}

impl GlobalSymbolIntern for &str {
    fn intern(self) -> Name {
        // A poisoned pool still holds only fully inserted strings.
        let mut pool = pool().lock().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = pool.get(self) {
            return Name(existing);
        }

        let leaked: &'static str = Box::leak(Box::<str>::from(self));
        pool.insert(leaked);

        Name(leaked)
    }
}

impl GlobalSymbolIntern for String {
    fn intern(self) -> Name {
        self.as_str().intern()
    }
}

impl GlobalSymbolIntern for &String {
    fn intern(self) -> Name {
        self.as_str().intern()
    }
}

// Tests for the symbolic reference resolver
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

use super::*;
use crate::{
    body::{Body, Node},
    decl::{Accessor, DeclId},
    ld::{chain, Layer, LinkErrorCode, Member, Registry},
    span::dummy::*,
    sym::{GlobalSymbolIntern, Name},
};

fn decl(member: &str, accessor: Accessor) -> DeclId {
    DeclId::new("Target".intern(), member.intern(), accessor)
}

/// A body referencing every one of the four targets in turn.
fn all_refs() -> Body {
    Body::new(vec![
        Node::Call(CallSite::forward(RefKind::Original, S1)),
        Node::Call(CallSite::forward(RefKind::Base, S2)),
        Node::Call(CallSite::forward(RefKind::Self_, S3)),
        Node::Call(CallSite::forward(RefKind::Final, S4)),
    ])
}

fn layer(name: &str, order: i32, body: Body) -> Layer {
    Layer::new(name.intern(), "Aspect".intern(), order, body)
}

fn resolve_decl(
    registry: &Registry,
    decl: DeclId,
) -> LinkResult<ResolvedChain> {
    resolve(chain::build(registry, decl, &())?)
}

#[test]
fn binds_each_kind_from_each_position() {
    let d = decl("Foo", Accessor::Method);
    let mut registry = Registry::new();

    registry.declare(d, Member::existing(Body::code("orig();")));
    for i in 0..4 {
        registry.register(d, layer(&format!("L{i}"), i, all_refs()));
    }

    let sut = resolve_decl(&registry, d).unwrap();
    let n = sut.chain().final_pos();

    assert_eq!(4, n);
    assert!(sut.bindings(0).is_empty());

    for i in 1..=n {
        assert_eq!(
            &[
                Binding::Link(0),
                Binding::Link(i - 1),
                Binding::Link(i),
                Binding::Link(n),
            ],
            sut.bindings(i),
            "from position {i}"
        );
    }
}

#[test]
fn original_and_final_are_position_invariant() {
    let d = decl("Foo", Accessor::Method);
    let mut registry = Registry::new();

    for i in 0..7 {
        registry.register(d, layer(&format!("L{i}"), i * 10, all_refs()));
    }

    let sut = resolve_decl(&registry, d).unwrap();
    let n = sut.chain().final_pos();

    let originals = (1..=n).map(|i| sut.bindings(i)[0]).collect::<Vec<_>>();
    let finals = (1..=n).map(|i| sut.bindings(i)[3]).collect::<Vec<_>>();

    assert!(originals.iter().all(|b| *b == Binding::Link(0)));
    assert!(finals.iter().all(|b| *b == Binding::Link(n)));
}

#[test]
fn base_from_bottom_binds_inherited_final() {
    let parent = decl("Foo", Accessor::Method).on_type("Parent".intern());
    let d = decl("Foo", Accessor::Method);
    let mut registry = Registry::new();

    registry.declare(d, Member::inherited("Parent".intern()));
    registry.register(d, layer("Intro", 0, all_refs()).introduction());

    let sut = resolve_decl(&registry, d).unwrap();
    let inherited = Binding::Inherited(BaseLink {
        decl: parent,
        final_link: "Foo".intern(),
    });

    assert_eq!(
        &[inherited, inherited, Binding::Link(0), Binding::Link(0)],
        sut.bindings(0)
    );
}

#[test]
fn synthesized_inherited_source_forwards_to_base() {
    let parent = decl("Foo", Accessor::Get).on_type("Parent".intern());
    let d = decl("Foo", Accessor::Get);
    let mut registry = Registry::new();

    registry.declare(d, Member::inherited("Parent".intern()));
    registry.register(d, layer("Over", 0, Body::forward(RefKind::Base, S1)));

    let sut = resolve_decl(&registry, d).unwrap();

    assert_eq!(
        &[Binding::Inherited(BaseLink {
            decl: parent,
            final_link: "Foo".intern(),
        })],
        sut.bindings(0)
    );
    assert_eq!(&[Binding::Link(0)], sut.bindings(1));
}

#[test]
fn base_from_bottom_without_inherited_member_dangles() {
    let d = decl("Foo", Accessor::Method);
    let mut registry = Registry::new();

    registry.register(
        d,
        layer("Intro", 0, Body::forward(RefKind::Base, S2))
            .introduction()
            .with_span(S1),
    );

    assert_eq!(
        Err(LinkError::DanglingBaseReference {
            decl: d,
            layer: layer("Intro", 0, Body::default())
                .with_span(S1)
                .link_ref(),
            kind: RefKind::Base,
            span: S2,
        }),
        resolve_decl(&registry, d)
    );
}

#[test]
fn original_from_bottom_without_inherited_member_dangles() {
    let d = decl("Foo", Accessor::Method);
    let mut registry = Registry::new();

    registry.register(
        d,
        layer("Intro", 0, Body::forward(RefKind::Original, S2)).introduction(),
    );

    assert_eq!(
        LinkErrorCode::DanglingBaseReference,
        resolve_decl(&registry, d).unwrap_err().code()
    );
}

#[test]
fn self_and_final_from_bottom_never_dangle() {
    let d = decl("Foo", Accessor::Method);
    let mut registry = Registry::new();

    registry.register(
        d,
        layer(
            "Intro",
            0,
            Body::new(vec![
                Node::Call(CallSite::forward(RefKind::Self_, S1)),
                Node::Call(CallSite::forward(RefKind::Final, S2)),
            ]),
        )
        .introduction(),
    );
    registry.register(d, layer("Over", 1, Body::code("x();")));

    let sut = resolve_decl(&registry, d).unwrap();

    assert_eq!(&[Binding::Link(0), Binding::Link(1)], sut.bindings(0));
}

#[test]
fn first_error_in_chain_order_is_reported() {
    let d = decl("Foo", Accessor::Add);
    let mut registry = Registry::new();

    let mut cross = CallSite::forward(RefKind::Base, S3);
    cross.accessor = Some(Accessor::Remove);

    registry.register(
        d,
        layer("Intro", 0, Body::forward(RefKind::Base, S1)).introduction(),
    );
    registry.register(d, layer("Over", 1, Body::new(vec![Node::Call(cross)])));

    assert_eq!(
        LinkErrorCode::DanglingBaseReference,
        resolve_decl(&registry, d).unwrap_err().code()
    );
}

#[test]
fn reference_to_paired_accessor_is_rejected() {
    let d = decl("Foo", Accessor::Add);
    let mut registry = Registry::new();

    let mut site = CallSite::forward(RefKind::Base, S2);
    site.accessor = Some(Accessor::Remove);

    registry.register(
        d,
        layer("Over", 0, Body::new(vec![Node::Call(site)])).with_span(S1),
    );

    assert_eq!(
        Err(LinkError::CrossAccessorReference {
            decl: d,
            layer: layer("Over", 0, Body::default()).with_span(S1).link_ref(),
            accessor: Accessor::Remove,
            span: S2,
        }),
        resolve_decl(&registry, d)
    );
}

#[test]
fn reference_naming_own_accessor_is_accepted() {
    let d = decl("Foo", Accessor::Remove);
    let mut registry = Registry::new();

    let mut site = CallSite::forward(RefKind::Base, S2);
    site.accessor = Some(Accessor::Remove);

    registry.register(d, layer("Over", 0, Body::new(vec![Node::Call(site)])));

    assert_eq!(
        &[Binding::Link(0)],
        resolve_decl(&registry, d).unwrap().bindings(1)
    );
}

/// Event `Foo` receives eight layers at ranks 0 through 7,
///   alternating between overrides of `Foo` itself and of an introduced
///   backing event `Bar`.
/// The two are distinct declarations with distinct chains,
///   so nothing in `Foo`'s chain may ever bind into `Bar`'s.
#[test]
fn interleaved_event_layers_stay_in_own_chain() {
    let mut registry = Registry::new();

    for accessor in [Accessor::Add, Accessor::Remove] {
        let foo = decl("Foo", accessor);
        let bar = decl("Bar", accessor);

        registry.declare(foo, Member::existing(Body::code("foo_impl();")));

        for rank in 0..8 {
            let (target, name) = match rank % 2 {
                0 => (foo, format!("Foo_Override{rank}")),
                _ => (bar, format!("Bar_Override{rank}")),
            };

            let mut l = layer(&name, rank, all_refs());
            if rank == 1 {
                l = layer(&name, rank, Body::forward(RefKind::Final, S5))
                    .introduction();
            }

            registry.register(target, l);
        }
    }

    let foo = resolve_decl(&registry, decl("Foo", Accessor::Add)).unwrap();
    let chain_names = foo
        .chain()
        .links()
        .iter()
        .map(|l| l.name)
        .collect::<Vec<Name>>();

    assert_eq!(
        vec![
            "Foo_Source".intern(),
            "Foo_Override0".intern(),
            "Foo_Override2".intern(),
            "Foo_Override4".intern(),
            "Foo_Override6".intern(),
        ],
        chain_names
    );

    let override0 = foo.bindings(1);
    let n = foo.chain().final_pos();

    // original, base, self, final
    assert_eq!(Binding::Link(0), override0[0]);
    assert_eq!(Binding::Link(0), override0[1]);
    assert_eq!(Binding::Link(1), override0[2]);
    assert_eq!(Binding::Link(n), override0[3]);
    assert_eq!("Foo_Override6".intern(), foo.chain().links()[n].name);

    let bar = resolve_decl(&registry, decl("Bar", Accessor::Add)).unwrap();
    assert_eq!("Bar_Override1".intern(), bar.chain().links()[0].name);
    assert_eq!(
        "Bar_Override7".intern(),
        bar.chain().links()[bar.chain().final_pos()].name
    );

    // The remove chain is built from its own layers only.
    let foo_remove =
        resolve_decl(&registry, decl("Foo", Accessor::Remove)).unwrap();
    assert_eq!(Accessor::Remove, foo_remove.chain().decl.accessor);
    assert_eq!(5, foo_remove.chain().len());
}

#[test]
fn re_resolve_is_identical() {
    let d = decl("Foo", Accessor::Set);
    let mut registry = Registry::new();

    registry.register(d, layer("A", 3, all_refs()));
    registry.register(d, layer("B", 1, all_refs()));

    assert_eq!(resolve_decl(&registry, d), resolve_decl(&registry, d));
}

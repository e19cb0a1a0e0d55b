// Tests for the weave manifest reader
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
use crate::ld::{Relation, Source};

type Sut<'a> = WeaveReader<&'a [u8]>;

fn read(src: &str) -> WeaveResult<Registry> {
    let mut registry = Registry::new();

    Sut::new(src.as_bytes(), "test.xml".into()).read_into(&mut registry)?;

    Ok(registry)
}

fn decl(ty: &str, member: &str, accessor: Accessor) -> DeclId {
    DeclId::new(ty.intern(), member.intern(), accessor)
}

#[test]
fn empty_manifest() {
    let registry = read("<?xml version=\"1.0\"?>\n<weave/>").unwrap();

    assert!(registry.is_empty());
}

#[test]
fn rejects_other_root() {
    assert!(matches!(
        read("<package/>"),
        Err(WeaveError::UnexpectedRoot(name, _)) if name == "package"
    ));
}

#[test]
fn method_layers_with_bodies() {
    let registry = read(
        r#"<weave>
             <!-- generated -->
             <type name="Target">
               <member name="Run" existing="true">
                 <source><code>work();</code></source>
                 <layer name="Run_Override0" aspect="Log" order="0"
                        inlineable="true">
                   <code>log(&quot;run&quot;);</code>
                   <call ref="base"/>
                 </layer>
                 <layer name="Run_Override1" aspect="Audit" order="1"
                        discardable="true">
                   <call ref="original" args="a, b"/>
                 </layer>
               </member>
             </type>
           </weave>"#,
    )
    .unwrap();

    let run = decl("Target", "Run", Accessor::Method);

    assert_eq!(
        Source::Existing(Body::code("work();")),
        registry.source_for(run)
    );

    let layers = registry.layers_for(run).unwrap();

    assert_eq!(2, layers.len());

    assert_eq!("Run_Override0".intern(), layers[0].name);
    assert_eq!("Log".intern(), layers[0].aspect);
    assert!(layers[0].inlineable);
    assert!(!layers[0].discardable);
    assert_eq!(
        &[
            Node::Code("log(\"run\");".into()),
            Node::Call(CallSite::forward(RefKind::Base, layers[0].span)),
        ],
        layers[0].body.nodes()
    );

    assert!(layers[1].discardable);
    assert_eq!(
        Some(&CallSite::with_args(
            RefKind::Original,
            "a, b".into(),
            layers[1].span
        )),
        layers[1].body.pure_forward()
    );
}

#[test]
fn property_expands_to_both_accessors() {
    let registry = read(
        r#"<weave>
             <type name="Target">
               <member name="Value" kind="property" params="v">
                 <layer name="Value_Get" aspect="A" order="0"
                        accessor="get">
                   <call ref="base"/>
                 </layer>
               </member>
             </type>
           </weave>"#,
    )
    .unwrap();

    let get = decl("Target", "Value", Accessor::Get);
    let set = decl("Target", "Value", Accessor::Set);

    // Only declarations with layers are linked.
    assert_eq!(vec![get], registry.decls().collect::<Vec<_>>());

    assert!(registry.has_layers(get));
    assert!(!registry.has_layers(set));

    assert_eq!(
        vec!["v".intern()],
        registry.member(set).map(|m| m.params.clone()).unwrap()
    );
    assert!(!registry.source_for(get).is_existing());
}

#[test]
fn existing_without_source_is_empty_body() {
    let registry = read(
        r#"<weave>
             <type name="T">
               <member name="E" kind="event" existing="true">
                 <source accessor="remove"><code>rm();</code></source>
               </member>
             </type>
           </weave>"#,
    )
    .unwrap();

    assert_eq!(
        Source::Existing(Body::default()),
        registry.source_for(decl("T", "E", Accessor::Add))
    );
    assert_eq!(
        Source::Existing(Body::code("rm();")),
        registry.source_for(decl("T", "E", Accessor::Remove))
    );
}

#[test]
fn inherited_member_uses_type_base() {
    let registry = read(
        r#"<weave>
             <type name="Derived" base="Base">
               <member name="Run" inherited="true">
                 <layer name="Intro" aspect="A" order="0"
                        relation="introduction"/>
               </member>
             </type>
           </weave>"#,
    )
    .unwrap();

    let run = decl("Derived", "Run", Accessor::Method);

    assert_eq!(
        Some(decl("Base", "Run", Accessor::Method)),
        registry.base_of(run)
    );
    assert_eq!(
        Relation::Introduction,
        registry.layers_for(run).unwrap()[0].relation
    );
}

#[test]
fn inherited_without_base_type() {
    let result = read(
        r#"<weave>
             <type name="Lone">
               <member name="Run" inherited="true"/>
             </type>
           </weave>"#,
    );

    assert!(matches!(
        result,
        Err(WeaveError::NoBaseType { ty, member, .. })
            if ty == "Lone".intern() && member == "Run".intern()
    ));
}

#[test]
fn layer_accessor_must_match_member_kind() {
    let result = read(
        r#"<weave>
             <type name="T">
               <member name="Run">
                 <layer name="L" aspect="A" order="0" accessor="get"/>
               </member>
             </type>
           </weave>"#,
    );

    assert!(matches!(
        result,
        Err(WeaveError::AccessorMismatch {
            kind: MemberKind::Method,
            accessor: Accessor::Get,
            ..
        })
    ));
}

#[test]
fn accessor_required_for_non_methods() {
    let result = read(
        r#"<weave>
             <type name="T">
               <member name="P" kind="property">
                 <layer name="L" aspect="A" order="0"/>
               </member>
             </type>
           </weave>"#,
    );

    assert!(matches!(
        result,
        Err(WeaveError::MissingAttr {
            ele: "layer",
            attr: "accessor",
            ..
        })
    ));
}

#[test]
fn invalid_values_rejected() {
    for (attrs, expected) in [
        (r#"order="high""#, "order"),
        (r#"order="0" relation="replace""#, "relation"),
        (r#"order="0" discardable="yes""#, "discardable"),
    ] {
        let src = format!(
            r#"<weave><type name="T"><member name="M">
                 <layer name="L" aspect="A" {attrs}/>
               </member></type></weave>"#
        );

        match read(&src) {
            Err(WeaveError::InvalidValue { attr, .. }) => {
                assert_eq!(expected, attr)
            }
            other => panic!("expected invalid `{expected}`, got {other:?}"),
        }
    }
}

#[test]
fn unknown_ref_keyword_rejected() {
    let result = read(
        r#"<weave><type name="T"><member name="M">
             <layer name="L" aspect="A" order="0"><call ref="super"/></layer>
           </member></type></weave>"#,
    );

    assert!(matches!(
        result,
        Err(WeaveError::InvalidValue { attr: "ref", value, .. })
            if value == "super"
    ));
}

#[test]
fn unknown_attribute_rejected() {
    let result = read(r#"<weave><type name="T" sealed="true"/></weave>"#);

    assert!(matches!(
        result,
        Err(WeaveError::UnknownAttr { ele: "type", attr, .. })
            if attr == "sealed"
    ));
}

#[test]
fn unexpected_element() {
    let result = read(r#"<weave><type name="T"><field/></type></weave>"#);

    assert!(matches!(
        result,
        Err(WeaveError::UnexpectedElement(name, _)) if name == "field"
    ));
}

#[test]
fn text_outside_code_rejected() {
    let result = read(r#"<weave><type name="T">stray</type></weave>"#);

    assert!(matches!(result, Err(WeaveError::UnexpectedText(_))));
}

#[test]
fn truncated_manifest() {
    let result = read(r#"<weave><type name="T">"#);

    assert!(matches!(result, Err(WeaveError::UnexpectedEof(_))));
}

#[test]
fn spans_point_into_manifest() {
    let src = r#"<weave><type name="T"><member name="M">
                   <layer name="L" aspect="A" order="0"/>
                 </member></type></weave>"#;
    let registry = read(src).unwrap();

    let layers = registry
        .layers_for(decl("T", "M", Accessor::Method))
        .unwrap();
    let span = layers[0].span;

    let offset = span.offset() as usize;

    assert_eq!(Context::from("test.xml"), span.context());
    assert!(offset > src.find("<member").unwrap());
    assert!(offset <= src.find("<layer").unwrap());
}

#[test]
fn repeated_source_accessor_rejected() {
    let src = r#"<weave><type name="T">
                   <member name="P" kind="property" existing="true">
                     <source accessor="get"><code>a();</code></source>
                     <source accessor="get"><code>b();</code></source>
                   </member>
                 </type></weave>"#;

    match read(src) {
        Err(WeaveError::DuplicateSource {
            member,
            accessor,
            first,
            span,
        }) => {
            assert_eq!("P".intern(), member);
            assert_eq!(Accessor::Get, accessor);

            // Both spans point at their own `source` element.
            let second = src.rfind("<source").unwrap();
            assert!((first.offset() as usize) < second);
            assert!((span.offset() as usize) > src.find("<source").unwrap());
            assert!(span.offset() as usize <= second);
        }
        other => panic!("expected duplicate source, got {other:?}"),
    }
}

#[test]
fn sources_for_distinct_accessors_accepted() {
    let registry = read(
        r#"<weave><type name="T">
             <member name="P" kind="property" existing="true">
               <source accessor="get"><code>a();</code></source>
               <source accessor="set"><code>b();</code></source>
             </member>
           </type></weave>"#,
    )
    .unwrap();

    assert_eq!(
        Source::Existing(Body::code("b();")),
        registry.source_for(decl("T", "P", Accessor::Set))
    );
}

#[test]
fn repeated_member_rejected() {
    let src = r#"<weave>
                   <type name="T"><member name="M" existing="true"/></type>
                   <type name="T"><member name="M"/></type>
                 </weave>"#;

    match read(src) {
        Err(WeaveError::DuplicateMember {
            ty,
            member,
            first,
            span,
        }) => {
            assert_eq!("T".intern(), ty);
            assert_eq!("M".intern(), member);
            assert!(first.is_some());
            assert!(span.offset() as usize > src.find("<member").unwrap());
        }
        other => panic!("expected duplicate member, got {other:?}"),
    }
}

#[test]
fn same_member_name_on_other_type_accepted() {
    let registry = read(
        r#"<weave>
             <type name="A"><member name="M" existing="true"/></type>
             <type name="B"><member name="M" existing="true"/></type>
           </weave>"#,
    )
    .unwrap();

    assert!(registry.member(decl("A", "M", Accessor::Method)).is_some());
    assert!(registry.member(decl("B", "M", Accessor::Method)).is_some());
}

// Weave manifest reader
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

//! Read a `weave` manifest into a [`Registry`].
//!
//! This uses [`quick_xml`] as the parser.
//! Events are first converted into owned [`Tok`]ens so that the reader's
//!   buffer can be reused immediately;
//!     manifests are small enough relative to the work of linking that
//!     this is of no concern.

use super::{WeaveError, WeaveResult};
use crate::{
    body::{Args, Body, CallSite, Node, RefKind},
    decl::{Accessor, DeclId, MemberKind},
    global,
    ld::{Layer, Member, Registry},
    span::{Context, Span},
    sym::{GlobalSymbolIntern, Name},
};
use fxhash::FxHashMap;
use quick_xml::events::{BytesStart, Event};
use std::io::BufRead;
use tracing::debug;

#[cfg(test)]
mod test;

/// An owned XML token.
#[derive(Debug, PartialEq, Eq)]
enum Tok {
    Open {
        name: String,
        attrs: Attrs,
        empty: bool,
        span: Span,
    },
    Close(String, Span),
    Text(String, Span),
    Eof(Span),
}

/// Attributes of an element,
///   in document order.
#[derive(Debug, Default, PartialEq, Eq)]
struct Attrs(Vec<(String, String)>);

impl Attrs {
    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn required(
        &self,
        ele: &'static str,
        attr: &'static str,
        span: Span,
    ) -> WeaveResult<&str> {
        self.get(attr)
            .ok_or(WeaveError::MissingAttr { ele, attr, span })
    }

    /// Reject any attribute not in `known`.
    fn only(
        &self,
        ele: &'static str,
        known: &[&str],
        span: Span,
    ) -> WeaveResult<()> {
        match self.0.iter().find(|(key, _)| !known.contains(&key.as_str())) {
            Some((key, _)) => Err(WeaveError::UnknownAttr {
                ele,
                attr: key.clone(),
                span,
            }),
            None => Ok(()),
        }
    }

    fn flag(&self, attr: &'static str, span: Span) -> WeaveResult<bool> {
        match self.get(attr) {
            None | Some("false") => Ok(false),
            Some("true") => Ok(true),
            Some(value) => Err(invalid(attr, value, span)),
        }
    }
}

fn invalid(attr: &'static str, value: &str, span: Span) -> WeaveError {
    WeaveError::InvalidValue {
        attr,
        value: value.into(),
        span,
    }
}

/// Reader of `weave` manifests.
pub struct WeaveReader<B: BufRead> {
    reader: quick_xml::Reader<B>,
    ctx: Context,

    /// Buffer for [`quick_xml::Reader`].
    readbuf: Vec<u8>,
}

impl<B: BufRead> WeaveReader<B> {
    pub fn new(reader: B, ctx: Context) -> Self {
        let mut reader = quick_xml::Reader::from_reader(reader);
        reader.trim_text(true);

        Self {
            reader,
            ctx,
            readbuf: Vec::new(),
        }
    }

    /// Read the entire manifest,
    ///   declaring and registering into `registry`.
    ///
    /// Reading stops at the first error.
    pub fn read_into(mut self, registry: &mut Registry) -> WeaveResult<()> {
        let (name, attrs, empty, span) = loop {
            match self.next_tok()? {
                Tok::Open {
                    name,
                    attrs,
                    empty,
                    span,
                } => break (name, attrs, empty, span),
                Tok::Text(_, span) => {
                    return Err(WeaveError::UnexpectedText(span))
                }
                Tok::Close(_, span) | Tok::Eof(span) => {
                    return Err(WeaveError::UnexpectedEof(span))
                }
            }
        };

        if name != "weave" {
            return Err(WeaveError::UnexpectedRoot(name, span));
        }

        attrs.only("weave", &[], span)?;

        let mut types = 0;

        if !empty {
            while let Some((child, attrs, empty, span)) =
                self.next_child("weave")?
            {
                match child.as_str() {
                    "type" => self.read_type(registry, attrs, empty, span)?,
                    _ => return Err(WeaveError::UnexpectedElement(child, span)),
                }

                types += 1;
            }
        }

        debug!(ctx = %self.ctx, types, decls = registry.len(), "read manifest");

        Ok(())
    }

    fn read_type(
        &mut self,
        registry: &mut Registry,
        attrs: Attrs,
        empty: bool,
        span: Span,
    ) -> WeaveResult<()> {
        attrs.only("type", &["name", "base"], span)?;

        let ty = attrs.required("type", "name", span)?.intern();
        let base = attrs.get("base").map(GlobalSymbolIntern::intern);

        if empty {
            return Ok(());
        }

        while let Some((child, attrs, empty, span)) = self.next_child("type")? {
            match child.as_str() {
                "member" => self.read_member(
                    registry,
                    ty,
                    base,
                    attrs,
                    empty,
                    span,
                )?,
                _ => return Err(WeaveError::UnexpectedElement(child, span)),
            }
        }

        Ok(())
    }

    fn read_member(
        &mut self,
        registry: &mut Registry,
        ty: Name,
        base: Option<Name>,
        attrs: Attrs,
        empty: bool,
        span: Span,
    ) -> WeaveResult<()> {
        attrs.only(
            "member",
            &["name", "kind", "existing", "inherited", "params"],
            span,
        )?;

        let name = attrs.required("member", "name", span)?.intern();
        let kind = match attrs.get("kind") {
            None | Some("method") => MemberKind::Method,
            Some("property") => MemberKind::Property,
            Some("event") => MemberKind::Event,
            Some(other) => return Err(invalid("kind", other, span)),
        };

        for accessor in kind.accessors() {
            let decl = DeclId::new(ty, name, accessor);

            if let Some(prev) = registry.member(decl) {
                return Err(WeaveError::DuplicateMember {
                    ty,
                    member: name,
                    first: prev.span,
                    span,
                });
            }
        }

        let existing = attrs.flag("existing", span)?;
        let inherited = match attrs.flag("inherited", span)? {
            false => None,
            true => Some(base.ok_or(WeaveError::NoBaseType {
                ty,
                member: name,
                span,
            })?),
        };

        let params = attrs
            .get("params")
            .map(|p| {
                p.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(GlobalSymbolIntern::intern)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let mut sources = FxHashMap::<Accessor, (Body, Span)>::default();
        let mut layers = Vec::<(Accessor, Layer)>::new();

        let accessor_of = |attrs: &Attrs, span: Span| -> WeaveResult<Accessor> {
            let accessor = match attrs.get("accessor") {
                None if kind == MemberKind::Method => Accessor::Method,
                None => {
                    return Err(WeaveError::MissingAttr {
                        ele: "layer",
                        attr: "accessor",
                        span,
                    })
                }
                Some(kw) => Accessor::from_keyword(kw)
                    .ok_or_else(|| invalid("accessor", kw, span))?,
            };

            match accessor.member_kind() == kind {
                true => Ok(accessor),
                false => Err(WeaveError::AccessorMismatch {
                    member: name,
                    kind,
                    accessor,
                    span,
                }),
            }
        };

        if !empty {
            while let Some((child, attrs, empty, span)) =
                self.next_child("member")?
            {
                match child.as_str() {
                    "source" => {
                        attrs.only("source", &["accessor"], span)?;
                        let accessor = accessor_of(&attrs, span)?;
                        if let Some((_, first)) = sources.get(&accessor) {
                            return Err(WeaveError::DuplicateSource {
                                member: name,
                                accessor,
                                first: *first,
                                span,
                            });
                        }

                        let body = self.read_body("source", empty)?;
                        sources.insert(accessor, (body, span));
                    }

                    "layer" => {
                        let accessor = accessor_of(&attrs, span)?;
                        let layer = self.read_layer(attrs, empty, span)?;

                        layers.push((accessor, layer));
                    }

                    _ => {
                        return Err(WeaveError::UnexpectedElement(child, span))
                    }
                }
            }
        }

        for accessor in kind.accessors() {
            let source = sources.remove(&accessor).map(|(body, _)| body);
            let existing = match (existing, source) {
                (_, Some(body)) => Some(body),
                (true, None) => Some(Body::default()),
                (false, None) => None,
            };

            registry.declare(
                DeclId::new(ty, name, accessor),
                Member {
                    existing,
                    base: inherited,
                    params: params.clone(),
                    span: Some(span),
                },
            );
        }

        for (accessor, layer) in layers {
            registry.register(DeclId::new(ty, name, accessor), layer);
        }

        Ok(())
    }

    fn read_layer(
        &mut self,
        attrs: Attrs,
        empty: bool,
        span: Span,
    ) -> WeaveResult<Layer> {
        attrs.only(
            "layer",
            &[
                "name",
                "aspect",
                "order",
                "accessor",
                "relation",
                "discardable",
                "inlineable",
            ],
            span,
        )?;

        let name = attrs.required("layer", "name", span)?.intern();
        let aspect = attrs.required("layer", "aspect", span)?.intern();
        let order_str = attrs.required("layer", "order", span)?;
        let order = order_str
            .parse::<global::LayerRank>()
            .map_err(|_| invalid("order", order_str, span))?;

        let introduction = match attrs.get("relation") {
            None | Some("override") => false,
            Some("introduction") => true,
            Some(other) => return Err(invalid("relation", other, span)),
        };

        let discardable = attrs.flag("discardable", span)?;
        let inlineable = attrs.flag("inlineable", span)?;
        let body = self.read_body("layer", empty)?;

        let layer = Layer::new(name, aspect, order, body)
            .with_discardable(discardable)
            .with_inlineable(inlineable)
            .with_span(span);

        Ok(match introduction {
            true => layer.introduction(),
            false => layer,
        })
    }

    /// Read `code` and `call` children until `parent` is closed.
    fn read_body(&mut self, parent: &str, empty: bool) -> WeaveResult<Body> {
        let mut body = Body::default();

        if empty {
            return Ok(body);
        }

        while let Some((child, attrs, empty, span)) = self.next_child(parent)? {
            match child.as_str() {
                "code" => {
                    attrs.only("code", &[], span)?;
                    body.push(Node::Code(self.read_text("code", empty)?));
                }

                "call" => {
                    body.push(Node::Call(Self::read_call(&attrs, span)?));

                    if !empty {
                        self.expect_close("call")?;
                    }
                }

                _ => return Err(WeaveError::UnexpectedElement(child, span)),
            }
        }

        Ok(body)
    }

    fn read_call(attrs: &Attrs, span: Span) -> WeaveResult<CallSite> {
        attrs.only("call", &["ref", "args", "accessor"], span)?;

        let kw = attrs.required("call", "ref", span)?;
        let kind =
            RefKind::from_keyword(kw).ok_or_else(|| invalid("ref", kw, span))?;

        let accessor = attrs
            .get("accessor")
            .map(|kw| {
                Accessor::from_keyword(kw)
                    .ok_or_else(|| invalid("accessor", kw, span))
            })
            .transpose()?;

        Ok(CallSite {
            kind,
            args: attrs
                .get("args")
                .map(|args| Args::Explicit(args.into()))
                .unwrap_or(Args::Forward),
            accessor,
            span,
        })
    }

    /// Read text content until `ele` is closed.
    fn read_text(&mut self, ele: &str, empty: bool) -> WeaveResult<String> {
        let mut text = String::new();

        if empty {
            return Ok(text);
        }

        loop {
            match self.next_tok()? {
                Tok::Text(s, _) => text.push_str(&s),
                Tok::Close(name, _) if name == ele => return Ok(text),
                Tok::Close(name, span) | Tok::Open { name, span, .. } => {
                    return Err(WeaveError::UnexpectedElement(name, span))
                }
                Tok::Eof(span) => return Err(WeaveError::UnexpectedEof(span)),
            }
        }
    }

    fn expect_close(&mut self, ele: &str) -> WeaveResult<()> {
        match self.read_text(ele, false)?.trim() {
            "" => Ok(()),
            _ => Err(WeaveError::UnexpectedText(self.here())),
        }
    }

    /// Next child element of `parent`,
    ///   or [`None`] once `parent` is closed.
    ///
    /// Whitespace between elements is trimmed by the reader;
    ///   any other text is an error.
    fn next_child(
        &mut self,
        parent: &str,
    ) -> WeaveResult<Option<(String, Attrs, bool, Span)>> {
        match self.next_tok()? {
            Tok::Open {
                name,
                attrs,
                empty,
                span,
            } => Ok(Some((name, attrs, empty, span))),
            Tok::Close(name, _) if name == parent => Ok(None),
            Tok::Close(name, span) => {
                Err(WeaveError::UnexpectedElement(name, span))
            }
            Tok::Text(_, span) => Err(WeaveError::UnexpectedText(span)),
            Tok::Eof(span) => Err(WeaveError::UnexpectedEof(span)),
        }
    }

    fn here(&self) -> Span {
        self.ctx.span_or_zz(self.reader.buffer_position(), 0)
    }

    /// Produce the next owned token,
    ///   skipping declarations,
    ///   comments,
    ///   and processing instructions.
    fn next_tok(&mut self) -> WeaveResult<Tok> {
        loop {
            self.readbuf.clear();

            let ctx = self.ctx;
            let pos = self.reader.buffer_position();
            let span = ctx.span_or_zz(pos, 0);

            let ev = self
                .reader
                .read_event(&mut self.readbuf)
                .map_err(|e| WeaveError::Xml(e.to_string(), span))?;

            return match ev {
                Event::Start(ele) => {
                    Self::open(&self.reader, &ele, false, span)
                }
                Event::Empty(ele) => Self::open(&self.reader, &ele, true, span),

                Event::End(ele) => Ok(Tok::Close(
                    String::from_utf8_lossy(ele.name()).into_owned(),
                    span,
                )),

                Event::Text(text) => text
                    .unescape_and_decode(&self.reader)
                    .map(|s| Tok::Text(s, span))
                    .map_err(|e| WeaveError::Xml(e.to_string(), span)),

                Event::CData(data) => Ok(Tok::Text(
                    String::from_utf8_lossy(&data).into_owned(),
                    span,
                )),

                Event::Eof => Ok(Tok::Eof(span)),

                Event::Decl(_)
                | Event::Comment(_)
                | Event::PI(_)
                | Event::DocType(_) => continue,
            };
        }
    }

    fn open(
        reader: &quick_xml::Reader<B>,
        ele: &BytesStart,
        empty: bool,
        span: Span,
    ) -> WeaveResult<Tok> {
        let attrs = ele
            .attributes()
            .map(|result| {
                let attr =
                    result.map_err(|e| WeaveError::Xml(e.to_string(), span))?;

                let value = attr
                    .unescape_and_decode_value(reader)
                    .map_err(|e| WeaveError::Xml(e.to_string(), span))?;

                Ok((String::from_utf8_lossy(attr.key).into_owned(), value))
            })
            .collect::<WeaveResult<Vec<_>>>()?;

        Ok(Tok::Open {
            name: String::from_utf8_lossy(ele.name()).into_owned(),
            attrs: Attrs(attrs),
            empty,
            span,
        })
    }
}

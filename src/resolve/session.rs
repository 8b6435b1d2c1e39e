use std::{collections::HashMap, rc::Rc};

use log::warn;

use crate::data::osm::{Element, ElementKind, Member, Node, OsmId, Relation, Tags, Way};
use crate::errors::{Error, Result};

use super::events::{ElementHeader, OsmEvent};
use super::ElementSource;

/// Top-level element still receiving tags and children.
enum PendingElement {
    Node(Node),
    Way { id: OsmId, tags: Tags, nodes: Vec<Rc<Node>> },
    Relation(Relation),
}

impl PendingElement {
    fn element_name(&self) -> &'static str {
        match self {
            PendingElement::Node(_) => "node",
            PendingElement::Way { .. } => "way",
            PendingElement::Relation(_) => "relation",
        }
    }

    fn tags_mut(&mut self) -> &mut Tags {
        match self {
            PendingElement::Node(node) => &mut node.tags,
            PendingElement::Way { tags, .. } => tags,
            PendingElement::Relation(relation) => &mut relation.tags,
        }
    }

    fn as_relation(&mut self, child: &str) -> Result<&mut Relation> {
        match self {
            PendingElement::Relation(relation) => Ok(relation),
            other => Err(wrong_parent(child, other.element_name())),
        }
    }

    fn as_way_nodes(&mut self, child: &str) -> Result<&mut Vec<Rc<Node>>> {
        match self {
            PendingElement::Way { nodes, .. } => Ok(nodes),
            other => Err(wrong_parent(child, other.element_name())),
        }
    }

    fn finish(self) -> Result<Element> {
        Ok(match self {
            PendingElement::Node(node) => Element::Node(Rc::new(node)),
            PendingElement::Way { id, tags, nodes } => {
                let mut way = Way::new(id, nodes)?;
                way.tags = tags;
                Element::Way(Rc::new(way))
            },
            PendingElement::Relation(relation) => Element::Relation(Rc::new(relation)),
        })
    }
}

fn wrong_parent(child: &str, parent: &str) -> Error {
    Error::unexpected(child, format!("Didn't expect to find <{child}> in a <{parent}>"))
}

/// Builds the element graph of one document from its events.
///
/// Every element is shared: two references to the same kind and id within a
/// session resolve to the same instance. References the document does not
/// define are resolved through an [`ElementSource`] and remembered.
#[derive(Default)]
pub struct Session {
    elements: Vec<Element>,
    current: Option<PendingElement>,
    known_nodes: HashMap<OsmId, Rc<Node>>,
    known_ways: HashMap<OsmId, Rc<Way>>,
    known_relations: HashMap<OsmId, Rc<Relation>>,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    pub fn from_events<I, S>(events: I, source: &mut S) -> Result<Session>
    where
        I: IntoIterator<Item = Result<OsmEvent>>,
        S: ElementSource + ?Sized,
    {
        let mut session = Session::new();
        for event in events {
            session.apply(event?, source)?;
        }
        if let Some(pending) = &session.current {
            let name = pending.element_name();
            return Err(Error::unexpected(name, format!("Document ended inside a <{name}>")));
        }
        Ok(session)
    }

    pub fn apply<S>(&mut self, event: OsmEvent, source: &mut S) -> Result<()>
    where
        S: ElementSource + ?Sized,
    {
        match event {
            OsmEvent::Begin(header) => {
                let name = header.element_name();
                if self.current.is_some() {
                    return Err(Error::unexpected(
                        name,
                        format!("Should never get a new <{name}> when still in a top-level element"),
                    ));
                }
                self.current = Some(match header {
                    ElementHeader::Node { id, lat, lon } => PendingElement::Node(Node::new(id, lat, lon)),
                    ElementHeader::Way { id } => PendingElement::Way {
                        id,
                        tags: Tags::new(),
                        nodes: Vec::new(),
                    },
                    ElementHeader::Relation { id } => PendingElement::Relation(Relation::new(id)),
                });
            },
            OsmEvent::End => {
                let element = self.take_current("end")?.finish()?;
                self.register(&element);
                self.elements.push(element);
            },
            OsmEvent::Tag { key, value } => {
                let pending = self.current.as_mut().ok_or_else(|| outside_element("tag"))?;
                pending.tags_mut().insert(key, value);
            },
            OsmEvent::Member { kind, id, role } => {
                let mut pending = self.take_current("member")?;
                let relation_id = pending.as_relation("member")?.id;
                let member_kind: ElementKind = kind.parse().map_err(|_| {
                    Error::unexpected("member", format!("Unknown member type '{kind}' in <relation>"))
                })?;

                if member_kind == ElementKind::Relation && id == relation_id {
                    warn!(relation_id = relation_id; "Ignoring relation listed as its own member");
                } else {
                    match self.known_or_fetch(member_kind, id, source)? {
                        Some(element) => pending.as_relation("member")?.members.push(Member { element, role }),
                        None => warn!(
                            relation_id = relation_id,
                            member_type = member_kind.as_str(),
                            member_id = id;
                            "Ignoring member that couldn't be found"
                        ),
                    }
                }
                self.current = Some(pending);
            },
            OsmEvent::NodeRef { id } => {
                let mut pending = self.take_current("nd")?;
                pending.as_way_nodes("nd")?;
                let node = match self.known_or_fetch(ElementKind::Node, id, source)? {
                    Some(Element::Node(node)) => node,
                    _ => return Err(Error::MissingReference { kind: ElementKind::Node, id }),
                };
                pending.as_way_nodes("nd")?.push(node);
                self.current = Some(pending);
            },
        }
        Ok(())
    }

    fn take_current(&mut self, name: &str) -> Result<PendingElement> {
        self.current.take().ok_or_else(|| outside_element(name))
    }

    fn register(&mut self, element: &Element) {
        match element {
            Element::Node(node) => {
                self.known_nodes.insert(node.id, node.clone());
            },
            Element::Way(way) => {
                if let Some(id) = way.id {
                    self.known_ways.insert(id, way.clone());
                }
            },
            Element::Relation(relation) => {
                self.known_relations.insert(relation.id, relation.clone());
            },
        }
    }

    /// Looks the element up in this session only.
    pub fn known(&self, kind: ElementKind, id: OsmId) -> Option<Element> {
        match kind {
            ElementKind::Node => self.known_nodes.get(&id).cloned().map(Element::Node),
            ElementKind::Way => self.known_ways.get(&id).cloned().map(Element::Way),
            ElementKind::Relation => self.known_relations.get(&id).cloned().map(Element::Relation),
        }
    }

    /// Looks the element up in this session, asking `source` on a miss and
    /// remembering what it returns.
    pub fn known_or_fetch<S>(&mut self, kind: ElementKind, id: OsmId, source: &mut S) -> Result<Option<Element>>
    where
        S: ElementSource + ?Sized,
    {
        if let Some(element) = self.known(kind, id) {
            return Ok(Some(element));
        }
        let fetched = source.resolve_or_fetch(kind, id)?;
        if let Some(element) = &fetched {
            if element.kind() != kind {
                return Err(Error::unexpected(
                    element.element_name(),
                    format!("Asked for {kind} {id} but got {element}"),
                ));
            }
            self.register(element);
        }
        Ok(fetched)
    }

    /// Top-level elements in document order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// An empty session means the document described nothing, which callers
    /// treat as "not found".
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

fn outside_element(name: &str) -> Error {
    Error::unexpected(name, format!("Should never get a new <{name}> when not in a top-level element"))
}

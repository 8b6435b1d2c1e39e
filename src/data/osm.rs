use std::{collections::HashMap, fmt, hash::{Hash, Hasher}, rc::Rc, str::FromStr};

use crate::errors::{Error, Result};

pub type OsmId = u64;
pub type Tags = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

impl FromStr for ElementKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "node" => Ok(ElementKind::Node),
            "way" => Ok(ElementKind::Way),
            "relation" => Ok(ElementKind::Relation),
            _ => Err(Error::unexpected(s, format!("unknown element type '{s}'"))),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point as returned by the Overpass API. Compared by id only.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: OsmId,
    pub lat: f64,
    pub lon: f64,
    pub tags: Tags,
}

impl Node {
    pub fn new(id: OsmId, lat: f64, lon: f64) -> Self {
        Node {
            id,
            lat,
            lon,
            tags: Tags::new(),
        }
    }

    pub fn lon_lat(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node({}) lat: {}, lon: {}", self.id, self.lat, self.lon)
    }
}

/// An ordered polyline over shared nodes. Never empty.
///
/// Ways produced by [`Way::join`] have no id: they are not source elements and
/// cannot be looked up.
#[derive(Debug, Clone)]
pub struct Way {
    pub id: Option<OsmId>,
    pub tags: Tags,
    nodes: Vec<Rc<Node>>,
}

impl Way {
    pub fn new(id: OsmId, nodes: Vec<Rc<Node>>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(Error::EmptyWay(id));
        }
        Ok(Way {
            id: Some(id),
            tags: Tags::new(),
            nodes,
        })
    }

    fn joined(nodes: Vec<Rc<Node>>) -> Self {
        debug_assert!(!nodes.is_empty());
        Way {
            id: None,
            tags: Tags::new(),
            nodes,
        }
    }

    pub fn nodes(&self) -> &[Rc<Node>] {
        &self.nodes
    }

    pub fn first(&self) -> &Rc<Node> {
        &self.nodes[0]
    }

    pub fn last(&self) -> &Rc<Node> {
        &self.nodes[self.nodes.len() - 1]
    }

    pub fn is_closed(&self) -> bool {
        self.first() == self.last()
    }

    /// Splices `other` onto whichever end of this way it shares, so that the
    /// shared node appears once. `other` is reversed when its orientation
    /// does not line up. The result has no id and no tags.
    pub fn join(&self, other: &Way) -> Result<Way> {
        if self.is_closed() {
            return Err(Error::AlreadyClosed(self.to_string()));
        }
        if other.is_closed() {
            return Err(Error::AlreadyClosed(other.to_string()));
        }

        let mut nodes = Vec::with_capacity(self.nodes.len() + other.nodes.len() - 1);
        if self.first() == other.first() {
            nodes.extend(other.nodes.iter().rev().take(other.nodes.len() - 1).cloned());
            nodes.extend(self.nodes.iter().cloned());
        } else if self.first() == other.last() {
            nodes.extend(other.nodes[..other.nodes.len() - 1].iter().cloned());
            nodes.extend(self.nodes.iter().cloned());
        } else if self.last() == other.first() {
            nodes.extend(self.nodes[..self.nodes.len() - 1].iter().cloned());
            nodes.extend(other.nodes.iter().cloned());
        } else if self.last() == other.last() {
            nodes.extend(self.nodes[..self.nodes.len() - 1].iter().cloned());
            nodes.extend(other.nodes.iter().rev().cloned());
        } else {
            return Err(Error::NoCommonEndpoint(self.to_string(), other.to_string()));
        }
        Ok(Way::joined(nodes))
    }
}

impl PartialEq for Way {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Way {}

impl Hash for Way {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Way {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "way({}) with {} nodes", id, self.nodes.len()),
            None => write!(f, "joined way with {} nodes", self.nodes.len()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Member {
    pub element: Element,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct Relation {
    pub id: OsmId,
    /// Members in document order.
    pub members: Vec<Member>,
    pub tags: Tags,
}

impl Relation {
    pub fn new(id: OsmId) -> Self {
        Relation {
            id,
            members: Vec::new(),
            tags: Tags::new(),
        }
    }
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Relation {}

impl Hash for Relation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "relation({}) with {} members", self.id, self.members.len())
    }
}

/// Any element of the graph. Cloning shares the underlying instance.
#[derive(Debug, Clone)]
pub enum Element {
    Node(Rc<Node>),
    Way(Rc<Way>),
    Relation(Rc<Relation>),
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Node(_) => ElementKind::Node,
            Element::Way(_) => ElementKind::Way,
            Element::Relation(_) => ElementKind::Relation,
        }
    }

    pub fn element_name(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn as_relation(&self) -> Option<&Rc<Relation>> {
        match self {
            Element::Relation(relation) => Some(relation),
            _ => None,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Node(node) => node.fmt(f),
            Element::Way(way) => way.fmt(f),
            Element::Relation(relation) => relation.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{node, way};

    fn ids(way: &Way) -> Vec<OsmId> {
        way.nodes().iter().map(|n| n.id).collect()
    }

    #[test]
    fn nodes_compare_by_id_only() {
        let a = Node::new(1, 51.5, -0.1);
        let b = Node::new(1, 0.0, 0.0);
        assert_eq!(a, b);
        assert_ne!(a, Node::new(2, 51.5, -0.1));
    }

    #[test]
    fn ways_compare_by_id_only() {
        let a = way(7, &[1, 2]);
        let b = way(7, &[3, 4, 5]);
        assert_eq!(*a, *b);
        assert_ne!(*a, *way(8, &[1, 2]));
    }

    #[test]
    fn empty_way_is_rejected() {
        assert!(matches!(Way::new(3, Vec::new()), Err(Error::EmptyWay(3))));
    }

    #[test]
    fn closed_when_first_is_last() {
        assert!(way(1, &[1, 2, 3, 1]).is_closed());
        assert!(!way(2, &[1, 2, 3]).is_closed());
        assert!(way(3, &[4]).is_closed());
    }

    #[test]
    fn join_first_to_first_reverses_other() {
        let a = way(1, &[1, 2, 3]);
        let b = way(2, &[1, 5, 6]);
        let joined = a.join(&b).unwrap();
        assert_eq!(ids(&joined), vec![6, 5, 1, 2, 3]);
        assert_eq!(joined.id, None);
    }

    #[test]
    fn join_first_to_last_prepends_other() {
        let a = way(1, &[1, 2, 3]);
        let b = way(2, &[6, 5, 1]);
        assert_eq!(ids(&a.join(&b).unwrap()), vec![6, 5, 1, 2, 3]);
    }

    #[test]
    fn join_last_to_first_appends_other() {
        let a = way(1, &[1, 2, 3]);
        let b = way(2, &[3, 4]);
        assert_eq!(ids(&a.join(&b).unwrap()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn join_last_to_last_appends_reversed_other() {
        let a = way(1, &[1, 2, 3]);
        let b = way(2, &[5, 4, 3]);
        let joined = a.join(&b).unwrap();
        assert_eq!(ids(&joined), vec![1, 2, 3, 4, 5]);
        assert_eq!(joined.first().id, 1);
        assert_eq!(joined.last().id, 5);
    }

    #[test]
    fn joining_two_halves_of_a_loop_closes_it() {
        let a = way(1, &[1, 2, 3]);
        let b = way(2, &[3, 4, 1]);
        let joined = a.join(&b).unwrap();
        assert!(joined.is_closed());
        // first == other.last is tried before last == other.first
        assert_eq!(ids(&joined), vec![3, 4, 1, 2, 3]);
    }

    #[test]
    fn joined_way_drops_tags() {
        let mut a = (*way(1, &[1, 2])).clone();
        a.tags.insert("boundary".into(), "administrative".into());
        let joined = a.join(&way(2, &[2, 3])).unwrap();
        assert!(joined.tags.is_empty());
    }

    #[test]
    fn join_without_shared_end_fails() {
        let a = way(1, &[1, 2]);
        let b = way(2, &[3, 4]);
        assert!(matches!(a.join(&b), Err(Error::NoCommonEndpoint(..))));
    }

    #[test]
    fn join_with_closed_way_fails() {
        let ring = way(1, &[1, 2, 3, 1]);
        let open = way(2, &[3, 4]);
        assert!(matches!(ring.join(&open), Err(Error::AlreadyClosed(_))));
        assert!(matches!(open.join(&ring), Err(Error::AlreadyClosed(_))));
    }

    #[test]
    fn element_names_discriminate_kinds() {
        assert_eq!(Element::Node(node(1)).element_name(), "node");
        assert_eq!(Element::Way(way(1, &[1, 2])).element_name(), "way");
        assert_eq!(Element::Relation(Rc::new(Relation::new(1))).element_name(), "relation");
        assert_eq!("way".parse::<ElementKind>().unwrap(), ElementKind::Way);
        assert!("area".parse::<ElementKind>().is_err());
    }
}

use std::rc::Rc;

use super::osm::{Element, Member, Node, OsmId, Relation, Way};

pub fn node(id: OsmId) -> Rc<Node> {
    Rc::new(Node::new(id, id as f64, -(id as f64)))
}

pub fn way(id: OsmId, node_ids: &[OsmId]) -> Rc<Way> {
    let nodes = node_ids.iter().map(|&n| node(n)).collect();
    Rc::new(Way::new(id, nodes).unwrap())
}

pub fn relation(id: OsmId, members: Vec<(Element, &str)>) -> Rc<Relation> {
    let mut relation = Relation::new(id);
    relation.members = members
        .into_iter()
        .map(|(element, role)| Member {
            element,
            role: role.to_string(),
        })
        .collect();
    Rc::new(relation)
}

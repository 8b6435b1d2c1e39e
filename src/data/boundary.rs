use std::{rc::Rc, slice};

use super::osm::{Element, Member, Relation, Way};

/// Which rings of a boundary relation to collect: the exterior or the holes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundarySide {
    Outer,
    Inner,
}

impl BoundarySide {
    /// Roles are matched exactly. An empty role counts as outer.
    pub fn accepts(&self, role: &str) -> bool {
        match self {
            BoundarySide::Outer => role.is_empty() || role == "outer",
            BoundarySide::Inner => role == "inner" || role == "enclave",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BoundarySide::Outer => "outer",
            BoundarySide::Inner => "inner",
        }
    }
}

/// Depth-first walk over the ways of one side of a relation, descending into
/// sub-relations whose role matches the same side.
pub struct BoundaryWays<'a> {
    side: BoundarySide,
    stack: Vec<slice::Iter<'a, Member>>,
}

impl<'a> Iterator for BoundaryWays<'a> {
    type Item = &'a Rc<Way>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(members) = self.stack.last_mut() {
            let Some(member) = members.next() else {
                self.stack.pop();
                continue;
            };
            if !self.side.accepts(&member.role) {
                continue;
            }
            match &member.element {
                Element::Way(way) => return Some(way),
                Element::Relation(relation) => self.stack.push(relation.members.iter()),
                Element::Node(_) => (),
            }
        }
        None
    }
}

impl Relation {
    pub fn boundary_ways(&self, side: BoundarySide) -> BoundaryWays<'_> {
        BoundaryWays {
            side,
            stack: vec![self.members.iter()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{node, relation, way};
    use crate::data::osm::OsmId;

    fn way_ids(relation: &Relation, side: BoundarySide) -> Vec<OsmId> {
        relation
            .boundary_ways(side)
            .filter_map(|way| way.id)
            .collect()
    }

    fn boundary() -> Rc<Relation> {
        let island = relation(
            100,
            vec![
                (Element::Way(way(20, &[1, 2])), "outer"),
                (Element::Way(way(21, &[3, 4])), "inner"),
            ],
        );
        relation(
            1,
            vec![
                (Element::Node(node(9)), "admin_centre"),
                (Element::Way(way(10, &[1, 2])), "outer"),
                (Element::Way(way(11, &[2, 3])), ""),
                (Element::Way(way(12, &[5, 6])), "inner"),
                (Element::Relation(island), ""),
                (Element::Way(way(13, &[7, 8])), "enclave"),
                (Element::Way(way(14, &[7, 8])), "subarea"),
                (Element::Node(node(10)), "label"),
            ],
        )
    }

    #[test]
    fn outer_side_takes_empty_and_outer_roles_depth_first() {
        assert_eq!(way_ids(&boundary(), BoundarySide::Outer), vec![10, 11, 20]);
    }

    #[test]
    fn inner_side_takes_inner_and_enclave_roles() {
        assert_eq!(way_ids(&boundary(), BoundarySide::Inner), vec![12, 13]);
    }

    #[test]
    fn sub_relation_role_must_match_side() {
        let nested = relation(
            2,
            vec![
                (Element::Way(way(30, &[1, 2])), "inner"),
                (Element::Way(way(31, &[1, 2])), "outer"),
            ],
        );
        let outer = relation(3, vec![(Element::Relation(nested), "inner")]);
        assert_eq!(way_ids(&outer, BoundarySide::Inner), vec![30]);
        assert!(way_ids(&outer, BoundarySide::Outer).is_empty());
    }

    #[test]
    fn roles_are_case_sensitive() {
        let r = relation(4, vec![(Element::Way(way(40, &[1, 2])), "Outer")]);
        assert!(way_ids(&r, BoundarySide::Outer).is_empty());
    }

    #[test]
    fn yields_shared_instances() {
        let w = way(50, &[1, 2]);
        let r = relation(5, vec![(Element::Way(w.clone()), "outer")]);
        let yielded = r.boundary_ways(BoundarySide::Outer).next().unwrap();
        assert!(Rc::ptr_eq(yielded, &w));
    }
}

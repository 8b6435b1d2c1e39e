use std::{collections::HashMap, rc::Rc};

use crate::data::osm::{Node, OsmId, Way};
use crate::errors::{Error, Result};

/// An endpoint left registered when joining ran out of ways.
#[derive(Debug, Clone, PartialEq)]
pub struct DanglingEndpoint {
    pub node: OsmId,
    pub lat: f64,
    pub lon: f64,
    pub way_first: OsmId,
    pub way_last: OsmId,
}

/// Maps each endpoint of an open way to that way, so the ways a new fragment
/// can be joined to are found without scanning.
#[derive(Debug, Default)]
pub struct EndpointIndex {
    endpoints: HashMap<Rc<Node>, Rc<Way>>,
}

impl EndpointIndex {
    pub fn add(&mut self, way: Rc<Way>) -> Result<()> {
        for end in [way.first(), way.last()] {
            if let Some(existing) = self.endpoints.get(end) {
                return Err(Error::ConflictingEndpoint {
                    node: end.id,
                    existing: existing.to_string(),
                });
            }
        }
        self.endpoints.insert(way.first().clone(), way.clone());
        self.endpoints.insert(way.last().clone(), way);
        Ok(())
    }

    /// Only valid for a way previously passed to [`EndpointIndex::add`].
    pub fn remove(&mut self, way: &Way) {
        self.endpoints.remove(way.first());
        self.endpoints.remove(way.last());
    }

    /// Registered ways sharing an end with `way`, the one at its first node
    /// before the one at its last. A way touching both ends is listed once.
    pub fn candidates(&self, way: &Way) -> Vec<Rc<Way>> {
        let mut found: Vec<Rc<Way>> = Vec::with_capacity(2);
        for end in [way.first(), way.last()] {
            if let Some(existing) = self.endpoints.get(end) {
                if !found.iter().any(|w| Rc::ptr_eq(w, existing)) {
                    found.push(existing.clone());
                }
            }
        }
        found
    }

    /// Number of endpoint registrations, not of ways.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn dangling(&self) -> Vec<DanglingEndpoint> {
        let mut dangling: Vec<DanglingEndpoint> = self.endpoints.iter()
            .map(|(node, way)| DanglingEndpoint {
                node: node.id,
                lat: node.lat,
                lon: node.lon,
                way_first: way.first().id,
                way_last: way.last().id,
            })
            .collect();
        dangling.sort_by_key(|endpoint| endpoint.node);
        dangling
    }
}

use crate::data::osm::OsmId;

/// Opening of a top-level element with the attributes needed to build it.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementHeader {
    Node { id: OsmId, lat: f64, lon: f64 },
    Way { id: OsmId },
    Relation { id: OsmId },
}

impl ElementHeader {
    pub fn element_name(&self) -> &'static str {
        match self {
            ElementHeader::Node { .. } => "node",
            ElementHeader::Way { .. } => "way",
            ElementHeader::Relation { .. } => "relation",
        }
    }
}

/// One step of an OSM document, in document order.
///
/// The member kind is left as written so that the session, not the reader,
/// decides what an unknown kind means.
#[derive(Debug, Clone, PartialEq)]
pub enum OsmEvent {
    Begin(ElementHeader),
    Tag { key: String, value: String },
    Member { kind: String, id: OsmId, role: String },
    NodeRef { id: OsmId },
    End,
}

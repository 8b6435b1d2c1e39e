use serde::{Deserialize, Serialize};

use super::osm::{OsmId, Way};

/// Closed ring of `[lon, lat]` pairs; the first pair is repeated at the end.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Ring {
    pub coordinates: Vec<[f64; 2]>,
}

impl From<&Way> for Ring {
    fn from(value: &Way) -> Self {
        Ring {
            coordinates: value.nodes().iter()
                .map(|node| node.lon_lat())
                .collect(),
        }
    }
}

/// Joined rings of one boundary relation, as written to disk.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BoundaryRings {
    pub relation_id: OsmId,
    pub name: Option<String>,
    pub outer: Vec<Ring>,
    pub inner: Vec<Ring>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::way;

    #[test]
    fn ring_keeps_node_order_as_lon_lat() {
        let ring = Ring::from(way(1, &[1, 2, 1]).as_ref());
        assert_eq!(ring.coordinates, vec![[-1.0, 1.0], [-2.0, 2.0], [-1.0, 1.0]]);
    }

    #[test]
    fn boundary_rings_serialise_as_plain_json() {
        let rings = BoundaryRings {
            relation_id: 7,
            name: Some("Guernsey".to_string()),
            outer: vec![Ring { coordinates: vec![[0.5, 1.5]] }],
            inner: Vec::new(),
        };
        let json = serde_json::to_value(&rings).unwrap();
        assert_eq!(json["relation_id"], 7);
        assert_eq!(json["name"], "Guernsey");
        assert_eq!(json["outer"][0]["coordinates"][0][1], 1.5);
    }
}

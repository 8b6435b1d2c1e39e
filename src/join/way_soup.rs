use std::rc::Rc;

use log::error;

use crate::data::osm::Way;
use crate::errors::{Error, Result};

use super::endpoint_index::EndpointIndex;

/// Joins an unordered collection of ways into closed rings.
///
/// Closed ways are passed through untouched. Each open way is fused with the
/// pending chains that share one of its ends; a chain that closes is emitted,
/// anything else goes back into the index. Chains still open once the input
/// runs out are logged and reported as [`Error::UnclosedBoundary`].
pub fn join_way_soup<I>(ways: I) -> Result<Vec<Rc<Way>>>
where
    I: IntoIterator<Item = Rc<Way>>,
{
    let mut closed_ways = Vec::new();
    let mut endpoints = EndpointIndex::default();

    for way in ways {
        if way.is_closed() {
            closed_ways.push(way);
            continue;
        }

        let to_join_to = endpoints.candidates(&way);
        if to_join_to.is_empty() {
            endpoints.add(way)?;
            continue;
        }

        let mut joined = way;
        for existing in to_join_to {
            joined = Rc::new(joined.join(&existing)?);
            endpoints.remove(&existing);
            if joined.is_closed() {
                break;
            }
        }
        if joined.is_closed() {
            closed_ways.push(joined);
        } else {
            endpoints.add(joined)?;
        }
    }

    if !endpoints.is_empty() {
        error!(endpoints = endpoints.len(); "Some ways could not be joined into closed rings");
        let dangling = endpoints.dangling();
        for endpoint in &dangling {
            error!(
                node_id = endpoint.node,
                lat = endpoint.lat,
                lon = endpoint.lon,
                way_first = endpoint.way_first,
                way_last = endpoint.way_last;
                "Unclosed endpoint left after joining"
            );
        }
        return Err(Error::UnclosedBoundary { dangling });
    }
    Ok(closed_ways)
}

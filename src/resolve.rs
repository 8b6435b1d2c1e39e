pub mod events;
pub mod overpass;
pub mod parse_xml;
pub mod session;

use crate::data::osm::{Element, ElementKind, OsmId};
use crate::errors::Result;

/// Where a session turns for elements it has not seen yet.
///
/// `Ok(None)` means the element does not exist upstream; errors are reserved
/// for failures to fetch or to make sense of what was fetched.
pub trait ElementSource {
    fn resolve_or_fetch(&mut self, kind: ElementKind, id: OsmId) -> Result<Option<Element>>;
}

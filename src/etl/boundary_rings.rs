use std::{fs::{self, File}, io::BufWriter, path::{Path, PathBuf}, rc::Rc};

use log::info;

use crate::data::boundary::BoundarySide;
use crate::data::osm::{Element, ElementKind, OsmId, Relation};
use crate::data::rings::{BoundaryRings, Ring};
use crate::errors::{Error, Result};
use crate::join::way_soup::join_way_soup;
use crate::resolve::ElementSource;

use super::Etl;

pub const ETL_NAME: &str = "boundary_rings";

/// Resolves one boundary relation, joins its outer and inner ways into rings
/// and writes them to `boundary-<id>.json`.
pub struct BoundaryRingsEtl<'a, S: ?Sized> {
    name: String,
    relation_id: OsmId,
    source: &'a mut S,
}

impl<'a, S: ElementSource + ?Sized> BoundaryRingsEtl<'a, S> {
    pub fn new(relation_id: OsmId, source: &'a mut S) -> Self {
        BoundaryRingsEtl {
            name: format!("{ETL_NAME}/{relation_id}"),
            relation_id,
            source,
        }
    }

    pub fn output_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("boundary-{}.json", self.relation_id))
    }
}

fn join_side(relation: &Relation, side: BoundarySide) -> Result<Vec<Ring>> {
    let fragments: Vec<_> = relation.boundary_ways(side).cloned().collect();
    let fragment_count = fragments.len();
    let rings = join_way_soup(fragments)?;
    info!(
        relation_id = relation.id,
        side = side.as_str(),
        fragments = fragment_count,
        rings = rings.len();
        "Joined boundary side"
    );
    Ok(rings.iter().map(|way| Ring::from(way.as_ref())).collect())
}

impl<S: ElementSource + ?Sized> Etl for BoundaryRingsEtl<'_, S> {
    type Input = Rc<Relation>;
    type Output = BoundaryRings;

    fn etl_name(&self) -> &str {
        &self.name
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        Ok(self.output_path(dir).try_exists()?)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        if self.is_cached(dir)? {
            fs::remove_file(self.output_path(dir))?;
        }
        Ok(())
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        self.source.resolve_or_fetch(ElementKind::Relation, self.relation_id)?
            .as_ref()
            .and_then(Element::as_relation)
            .cloned()
            .ok_or(Error::ElementNotFound {
                kind: ElementKind::Relation,
                id: self.relation_id,
            })
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let outer = join_side(&input, BoundarySide::Outer)?;
        let inner = join_side(&input, BoundarySide::Inner)?;
        Ok(BoundaryRings {
            relation_id: input.id,
            name: input.tags.get("name").cloned(),
            outer,
            inner,
        })
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        let output_file = File::create(self.output_path(dir))?;
        serde_json::to_writer_pretty(BufWriter::new(output_file), &output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::data::fixtures::{relation, way};
    use crate::resolve::overpass::{ElementCache, OverpassSource};
    use crate::resolve::overpass::tests::{scratch_dir, CannedDownloader, RELATION_1, RELATION_2};

    #[derive(Default)]
    struct MapSource {
        relations: HashMap<OsmId, Rc<Relation>>,
    }

    impl ElementSource for MapSource {
        fn resolve_or_fetch(&mut self, kind: ElementKind, id: OsmId) -> Result<Option<Element>> {
            Ok(match kind {
                ElementKind::Relation => self.relations.get(&id).cloned().map(Element::Relation),
                _ => None,
            })
        }
    }

    fn read_rings(path: &Path) -> BoundaryRings {
        serde_json::from_reader(File::open(path).unwrap()).unwrap()
    }

    #[test]
    fn process_writes_joined_rings_from_overpass() {
        let downloader = CannedDownloader::default()
            .with(ElementKind::Relation, 1, RELATION_1)
            .with(ElementKind::Relation, 2, RELATION_2);
        let mut source = OverpassSource::new(ElementCache::new(scratch_dir("etl-cache"), downloader).unwrap());
        let out = scratch_dir("etl-out");
        fs::create_dir_all(&out).unwrap();

        let mut etl = BoundaryRingsEtl::new(1, &mut source);
        etl.process(&out).unwrap();
        assert!(etl.is_cached(&out).unwrap());

        let rings = read_rings(&out.join("boundary-1.json"));
        assert_eq!(rings.relation_id, 1);
        assert_eq!(rings.name.as_deref(), Some("Square"));
        assert_eq!(rings.outer.len(), 1);
        assert!(rings.inner.is_empty());
        let coordinates = &rings.outer[0].coordinates;
        assert_eq!(coordinates.len(), 5);
        assert_eq!(coordinates.first(), coordinates.last());

        // second run is served from the output file
        etl.process(&out).unwrap();
        etl.clean(&out).unwrap();
        assert!(!etl.is_cached(&out).unwrap());
    }

    #[test]
    fn transform_separates_outer_and_inner_rings() {
        let boundary = relation(
            5,
            vec![
                (Element::Way(way(1, &[1, 2, 3])), "outer"),
                (Element::Way(way(2, &[3, 4, 1])), ""),
                (Element::Way(way(3, &[7, 8])), "inner"),
                (Element::Way(way(4, &[8, 9, 7])), "enclave"),
            ],
        );
        let mut source = MapSource::default();
        let mut etl = BoundaryRingsEtl::new(5, &mut source);
        let rings = etl.transform(boundary).unwrap();
        assert_eq!(rings.outer.len(), 1);
        assert_eq!(rings.inner.len(), 1);
        assert_eq!(rings.inner[0].coordinates.len(), 4);
        assert_eq!(rings.name, None);
    }

    #[test]
    fn unknown_relation_is_not_found() {
        let mut source = MapSource::default();
        let out = scratch_dir("etl-missing");
        fs::create_dir_all(&out).unwrap();
        let mut etl = BoundaryRingsEtl::new(404, &mut source);
        let err = etl.process(&out).unwrap_err();
        assert!(matches!(err, Error::ElementNotFound { kind: ElementKind::Relation, id: 404 }));
        assert!(!etl.is_cached(&out).unwrap());
    }

    #[test]
    fn unclosed_boundary_writes_nothing() {
        let mut source = MapSource::default();
        source.relations.insert(6, relation(6, vec![(Element::Way(way(1, &[1, 2, 3])), "outer")]));
        let out = scratch_dir("etl-unclosed");
        fs::create_dir_all(&out).unwrap();
        let mut etl = BoundaryRingsEtl::new(6, &mut source);
        assert!(matches!(etl.process(&out), Err(Error::UnclosedBoundary { .. })));
        assert!(!out.join("boundary-6.json").exists());
    }
}

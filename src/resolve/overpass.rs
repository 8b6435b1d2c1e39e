use std::{collections::{HashMap, HashSet}, fs, path::{Path, PathBuf}, time::Duration};

use log::{debug, error, info, warn};

use crate::data::osm::{Element, ElementKind, OsmId};
use crate::errors::Result;

use super::parse_xml::OsmXmlEvents;
use super::session::Session;
use super::ElementSource;

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Runs an Overpass QL query and returns the raw response body.
pub trait Downloader {
    fn download(&self, query: &str) -> Result<Vec<u8>>;
}

pub struct OverpassClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl OverpassClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(OverpassClient {
            client,
            url: url.to_string(),
        })
    }
}

impl Downloader for OverpassClient {
    fn download(&self, query: &str) -> Result<Vec<u8>> {
        let response = self.client.post(&self.url)
            .form(&[("data", query)])
            .send()?
            .error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

/// The element plus everything it references, recursing down to nodes.
pub fn element_query(kind: ElementKind, id: OsmId) -> String {
    format!("(\n  {kind}({id});\n  >;\n);\nout;\n")
}

/// Raw Overpass responses on disk, one file per element.
pub struct ElementCache<D> {
    directory: PathBuf,
    downloader: D,
}

impl<D: Downloader> ElementCache<D> {
    pub fn new(directory: impl Into<PathBuf>, downloader: D) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(ElementCache { directory, downloader })
    }

    pub fn path_for(&self, kind: ElementKind, id: OsmId) -> PathBuf {
        self.directory.join(format!("{kind}-{id}.xml"))
    }

    /// Path of the cached response for the element, downloading it first if
    /// it is not on disk yet. Existing files are never downloaded again.
    pub fn fetch(&self, kind: ElementKind, id: OsmId) -> Result<PathBuf> {
        let path = self.path_for(kind, id);
        if !path.try_exists()? {
            info!(element_type = kind.as_str(), element_id = id; "Downloading from Overpass");
            let body = self.downloader.download(&element_query(kind, id))?;
            let partial = path.with_extension("xml.part");
            fs::write(&partial, &body)?;
            fs::rename(&partial, &path)?;
        }
        Ok(path)
    }

    /// Moves a cached response aside so the next fetch downloads it again.
    pub fn invalidate(&self, path: &Path) -> Result<PathBuf> {
        let mut broken = path.as_os_str().to_owned();
        broken.push(".broken");
        let broken = PathBuf::from(broken);
        fs::rename(path, &broken)?;
        Ok(broken)
    }
}

/// Resolves elements by downloading and parsing their Overpass closure.
///
/// Each document is parsed into its own [`Session`], which may come back here
/// for references the document does not contain. Results, including "not
/// found", are kept for the lifetime of the source. An element whose load
/// had a reference cycle cut somewhere below it is missing a member, so it is
/// not kept and the next request parses it again from the cached file.
pub struct OverpassSource<D> {
    cache: ElementCache<D>,
    resolved: HashMap<(ElementKind, OsmId), Option<Element>>,
    loading: HashSet<(ElementKind, OsmId)>,
    cycles_cut: usize,
}

impl<D: Downloader> OverpassSource<D> {
    pub fn new(cache: ElementCache<D>) -> Self {
        OverpassSource {
            cache,
            resolved: HashMap::new(),
            loading: HashSet::new(),
            cycles_cut: 0,
        }
    }

    fn load(&mut self, kind: ElementKind, id: OsmId) -> Result<Option<Element>> {
        let path = self.cache.fetch(kind, id)?;
        let events = OsmXmlEvents::from_file(&path)?;
        let session = match Session::from_events(events, self) {
            Ok(session) => session,
            Err(err) if err.is_malformed_document() => {
                let moved = self.cache.invalidate(&path)?;
                error!(
                    element_type = kind.as_str(),
                    element_id = id,
                    path = moved.display().to_string().as_str(),
                    err = err.to_string().as_str();
                    "Moved malformed cache file aside"
                );
                return Err(err);
            },
            Err(err) => return Err(err),
        };

        // Overpass sometimes answers with an empty document
        if session.is_empty() {
            info!(element_type = kind.as_str(), element_id = id; "Overpass returned no elements");
            return Ok(None);
        }
        let element = session.known(kind, id);
        if element.is_none() {
            let sample: Vec<String> = session.elements().iter().take(3).map(ToString::to_string).collect();
            warn!(
                element_type = kind.as_str(),
                element_id = id,
                elements = session.len(),
                sample = sample.join("; ").as_str();
                "Document does not contain the requested element"
            );
        }
        Ok(element)
    }
}

impl<D: Downloader> ElementSource for OverpassSource<D> {
    fn resolve_or_fetch(&mut self, kind: ElementKind, id: OsmId) -> Result<Option<Element>> {
        if let Some(resolved) = self.resolved.get(&(kind, id)) {
            return Ok(resolved.clone());
        }
        if !self.loading.insert((kind, id)) {
            warn!(element_type = kind.as_str(), element_id = id; "Reference cycle while fetching, ignoring");
            self.cycles_cut += 1;
            return Ok(None);
        }
        let cut_before = self.cycles_cut;
        let loaded = self.load(kind, id);
        self.loading.remove(&(kind, id));

        let element = loaded?;
        if self.cycles_cut == cut_before {
            self.resolved.insert((kind, id), element.clone());
        } else {
            debug!(element_type = kind.as_str(), element_id = id; "Not keeping element truncated by a reference cycle");
        }
        Ok(element)
    }
}

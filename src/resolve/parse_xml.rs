use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::errors::{Error, Result};

use super::events::{ElementHeader, OsmEvent};

const IGNORED_ELEMENTS: [&[u8]; 4] = [b"osm", b"note", b"meta", b"bounds"];

enum Step {
    Skip,
    Emit(OsmEvent),
    /// A self-closing top-level element: its `Begin` followed by `End`.
    EmitClosed(OsmEvent),
}

/// Streams an Overpass XML document as [`OsmEvent`]s in document order.
/// Iteration stops after the first error.
pub struct OsmXmlEvents<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    queued: Option<OsmEvent>,
    finished: bool,
}

impl<R: BufRead> OsmXmlEvents<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);
        OsmXmlEvents {
            reader,
            buf: Vec::new(),
            queued: None,
            finished: false,
        }
    }

    fn read_step(&mut self) -> Result<Option<Step>> {
        // nothing borrowed from the previous event survives, so the buffer can be reused
        self.buf.clear();
        let step = match self.reader.read_event_into(&mut self.buf)? {
            Event::Eof => return Ok(None),
            Event::Start(e) => start_element(&e, false)?,
            Event::Empty(e) => start_element(&e, true)?,
            Event::End(e) => match e.name().as_ref() {
                b"node" | b"way" | b"relation" => Step::Emit(OsmEvent::End),
                _ => Step::Skip,
            },
            // declarations, text such as the <note> body, comments
            _ => Step::Skip,
        };
        Ok(Some(step))
    }
}

impl OsmXmlEvents<BufReader<fs::File>> {
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        Ok(OsmXmlEvents::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for OsmXmlEvents<R> {
    type Item = Result<OsmEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.queued.take() {
            return Some(Ok(event));
        }
        while !self.finished {
            match self.read_step() {
                Ok(None) => self.finished = true,
                Ok(Some(Step::Skip)) => (),
                Ok(Some(Step::Emit(event))) => return Some(Ok(event)),
                Ok(Some(Step::EmitClosed(event))) => {
                    self.queued = Some(OsmEvent::End);
                    return Some(Ok(event));
                },
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                },
            }
        }
        None
    }
}

fn start_element(el: &BytesStart, self_closing: bool) -> Result<Step> {
    let name = el.name();
    let header = match name.as_ref() {
        n if IGNORED_ELEMENTS.contains(&n) => return Ok(Step::Skip),
        b"node" => ElementHeader::Node {
            id: required(el, "node", "id")?.parse()?,
            lat: required(el, "node", "lat")?.parse()?,
            lon: required(el, "node", "lon")?.parse()?,
        },
        b"way" => ElementHeader::Way {
            id: required(el, "way", "id")?.parse()?,
        },
        b"relation" => ElementHeader::Relation {
            id: required(el, "relation", "id")?.parse()?,
        },
        b"tag" => {
            return Ok(Step::Emit(OsmEvent::Tag {
                key: required(el, "tag", "k")?,
                value: required(el, "tag", "v")?,
            }))
        },
        b"member" => {
            return Ok(Step::Emit(OsmEvent::Member {
                kind: required(el, "member", "type")?,
                id: required(el, "member", "ref")?.parse()?,
                role: attribute(el, "role")?.unwrap_or_default(),
            }))
        },
        b"nd" => {
            return Ok(Step::Emit(OsmEvent::NodeRef {
                id: required(el, "nd", "ref")?.parse()?,
            }))
        },
        other => {
            let other = String::from_utf8_lossy(other);
            return Err(Error::unexpected(&other, format!("Unhandled element <{other}>")));
        },
    };
    let begin = OsmEvent::Begin(header);
    Ok(if self_closing { Step::EmitClosed(begin) } else { Step::Emit(begin) })
}

fn attribute(el: &BytesStart, key: &str) -> Result<Option<String>> {
    match el.try_get_attribute(key)? {
        Some(attribute) => Ok(Some(attribute.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn required(el: &BytesStart, element: &str, key: &str) -> Result<String> {
    attribute(el, key)?.ok_or_else(|| Error::MissingAttribute {
        element: element.to_string(),
        attribute: key.to_string(),
    })
}

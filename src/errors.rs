use std::{io, num::{ParseFloatError, ParseIntError}, str::Utf8Error};

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

use crate::data::osm::{ElementKind, OsmId};
use crate::join::endpoint_index::DanglingEndpoint;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unexpected <{element}>: {message}")]
    UnexpectedElement { element: String, message: String },
    #[error("{kind} {id} was referenced but could not be found")]
    MissingReference { kind: ElementKind, id: OsmId },
    #[error("{kind} {id} could not be found upstream")]
    ElementNotFound { kind: ElementKind, id: OsmId },
    #[error("<{element}> is missing its '{attribute}' attribute")]
    MissingAttribute { element: String, attribute: String },
    #[error("way {0} has no nodes")]
    EmptyWay(OsmId),
    #[error("node {node} is already an endpoint of {existing}")]
    ConflictingEndpoint { node: OsmId, existing: String },
    #[error("trying to join {0} and {1}, which have no end point in common")]
    NoCommonEndpoint(String, String),
    #[error("trying to join closed {0}")]
    AlreadyClosed(String),
    #[error("{} unclosed endpoint(s) left after joining", dangling.len())]
    UnclosedBoundary { dangling: Vec<DanglingEndpoint> },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error(transparent)]
    Attr(#[from] AttrError),
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),
    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),
    #[error(transparent)]
    Utf8(#[from] Utf8Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Errors meaning the downloaded document itself is bad, so a cached copy
    /// should not be reused.
    pub fn is_malformed_document(&self) -> bool {
        matches!(
            self,
            Error::UnexpectedElement { .. }
                | Error::MissingAttribute { .. }
                | Error::EmptyWay(_)
                | Error::Xml(_)
                | Error::Attr(_)
                | Error::ParseInt(_)
                | Error::ParseFloat(_)
                | Error::Utf8(_)
        )
    }

    pub fn unexpected(element: &str, message: impl Into<String>) -> Self {
        Error::UnexpectedElement {
            element: element.to_string(),
            message: message.into(),
        }
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Message(value.to_string())
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Message(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use quick_xml::Error as XMLError;
use std::path::PathBuf;
use std::{str::Utf8Error, string::FromUtf8Error};

/// Wrapper around `std::Result`
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug)]
pub enum Error {
    /// [`std::io`] related error.
    Io(std::io::Error),
    /// Decoding related error.
    /// Maybe the XML declaration has an encoding value that it doesn't recognize,
    /// or it doesn't match its actual encoding,
    CannotDecode,
    /// Assorted errors while parsing XML.
    MalformedXML(String),
    /// The container element cannot have a parent.
    ContainerCannotMove,
    /// The element must be removed from its parent before it is given another one.
    HasAParent,
    /// Element was not found among the children of its supposed parent.
    NotFound,
    /// A removal specifier could not be parsed.
    InvalidSpecifier(String),
    /// A removal specifier resolved to the root element, which has no parent to remove it from.
    RootRemoval(String),
    /// The directory to scan does not exist or cannot be listed.
    DirectoryNotFound {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Cleaning a single file failed.
    File { path: PathBuf, source: Box<Error> },
    /// Configuration could not be read or parsed.
    Config(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO Error: {}", err),
            Error::CannotDecode => write!(f, "Cannot decode XML"),
            Error::MalformedXML(err) => write!(f, "Malformed XML: {}", err),
            Error::ContainerCannotMove => write!(f, "Container element cannot move"),
            Error::HasAParent => write!(f, "Element already has a parent"),
            Error::NotFound => write!(f, "Element not found among children"),
            Error::InvalidSpecifier(spec) => write!(f, "Invalid removal specifier: {}", spec),
            Error::RootRemoval(spec) => {
                write!(f, "Removal specifier '{}' matched the root element", spec)
            }
            Error::DirectoryNotFound { path, source } => {
                write!(f, "Cannot list directory {}: {}", path.display(), source)
            }
            Error::File { path, source } => write!(f, "{}: {}", path.display(), source),
            Error::Config(err) => write!(f, "Invalid configuration: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::DirectoryNotFound { source, .. } => Some(source),
            Error::File { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl Error {
    /// Attach the offending file to an error.
    pub fn in_file<P: Into<PathBuf>>(self, path: P) -> Error {
        Error::File {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

impl From<XMLError> for Error {
    fn from(err: XMLError) -> Error {
        match err {
            XMLError::EndEventMismatch { expected, found } => Error::MalformedXML(format!(
                "Closing tag mismatch. Expected {}, found {}",
                expected, found,
            )),
            XMLError::Io(err) => Error::Io(err),
            XMLError::Utf8(_) => Error::CannotDecode,
            err => Error::MalformedXML(err.to_string()),
        }
    }
}

impl From<FromUtf8Error> for Error {
    fn from(_: FromUtf8Error) -> Error {
        Error::CannotDecode
    }
}
impl From<Utf8Error> for Error {
    fn from(_: Utf8Error) -> Error {
        Error::CannotDecode
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

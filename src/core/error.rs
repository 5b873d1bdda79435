use std::error::Error as StdError;
use std::fmt;

use crate::core::catalog::AtomKind;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    Limit,
    Stock,
    UnknownMolecule,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    atom: Option<AtomKind>,
    requested: Option<u64>,
    available: Option<u64>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            atom: None,
            requested: None,
            available: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn atom(&self) -> Option<AtomKind> {
        self.atom
    }

    pub fn requested(&self) -> Option<u64> {
        self.requested
    }

    pub fn available(&self) -> Option<u64> {
        self.available
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_atom(mut self, atom: AtomKind) -> Self {
        self.atom = Some(atom);
        self
    }

    pub fn with_requested(mut self, requested: u64) -> Self {
        self.requested = Some(requested);
        self
    }

    pub fn with_available(mut self, available: u64) -> Self {
        self.available = Some(available);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(atom) = self.atom {
            write!(f, " (atom: {atom})")?;
        }
        if let Some(requested) = self.requested {
            write!(f, " (requested: {requested})")?;
        }
        if let Some(available) = self.available {
            write!(f, " (available: {available})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::Limit => 3,
        ErrorKind::Stock => 4,
        ErrorKind::UnknownMolecule => 5,
        ErrorKind::Io => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};
    use crate::core::catalog::AtomKind;

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::Limit, 3),
            (ErrorKind::Stock, 4),
            (ErrorKind::UnknownMolecule, 5),
            (ErrorKind::Io, 6),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_context() {
        let err = Error::new(ErrorKind::Limit)
            .with_message("addition would exceed the ceiling")
            .with_atom(AtomKind::Carbon)
            .with_requested(5)
            .with_available(2);
        let rendered = err.to_string();
        assert!(rendered.contains("Limit"));
        assert!(rendered.contains("carbon"));
        assert!(rendered.contains("requested: 5"));
        assert!(rendered.contains("available: 2"));
    }
}

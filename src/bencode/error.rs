use thiserror::Error;

/// Errors produced while decoding or encoding bencode.
#[derive(Debug, Error)]
pub enum BencodeError {
    /// The input violates the bencode grammar.
    ///
    /// `position` is the reader's cursor when the failure was detected.
    #[error("{message} at byte {position}")]
    Parse { message: String, position: usize },

    /// A byte was requested from a stream that has closed with no more data.
    #[error("stream closed")]
    StreamClosed,

    /// A value has no bencode representation.
    #[error("cannot write {kind}: {message}")]
    Write { message: String, kind: &'static str },

    /// Extra bytes follow a value decoded with [`decode`](super::decode).
    #[error("trailing data after value at byte {position}")]
    TrailingData { position: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BencodeError {
    pub(crate) fn parse(message: impl Into<String>, position: usize) -> Self {
        BencodeError::Parse {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn write(message: impl Into<String>, kind: &'static str) -> Self {
        BencodeError::Write {
            message: message.into(),
            kind,
        }
    }

    /// Prefixes a parse error's message with where in the enclosing
    /// structure it happened. Other variants are returned unchanged.
    pub fn context(self, context: &str) -> Self {
        match self {
            BencodeError::Parse { message, position } => BencodeError::Parse {
                message: format!("{}: {}", context, message),
                position,
            },
            other => other,
        }
    }

    /// Returns the byte position of a parse or trailing-data error.
    pub fn position(&self) -> Option<usize> {
        match self {
            BencodeError::Parse { position, .. } | BencodeError::TrailingData { position } => {
                Some(*position)
            }
            _ => None,
        }
    }

    /// Returns true if this is a grammar violation.
    pub fn is_parse(&self) -> bool {
        matches!(self, BencodeError::Parse { .. })
    }
}

//! Grammar bytes and default limits.
//!
//! Every byte the decoder dispatches on and every byte the encoder emits
//! outside of payload data is named here.

// ============================================================================
// Grammar
// ============================================================================

/// Starts an integer: `i<digits>e`
pub const INTEGER_START: u8 = b'i';

/// Starts a list: `l<values>e`
pub const LIST_START: u8 = b'l';

/// Starts a dictionary: `d<key><value>...e`
pub const DICT_START: u8 = b'd';

/// Ends an integer, list or dictionary
pub const TERMINATOR: u8 = b'e';

/// Separates a string length from its payload: `4:spam`
pub const LENGTH_SEPARATOR: u8 = b':';

/// Sign prefix accepted on integers
pub const MINUS: u8 = b'-';

/// Line feed, skipped between top-level values when requested
pub const LF: u8 = b'\n';

/// Carriage return, skipped between top-level values when requested
pub const CR: u8 = b'\r';

// ============================================================================
// Limits
// ============================================================================

/// Default maximum container nesting accepted by the decoder
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Upper bound on the up-front allocation for a string read from a stream.
/// Longer payloads still decode; the buffer grows as bytes arrive.
pub const STREAM_PREALLOC_LIMIT: usize = 64 * 1024;

/// Maximum distinct keys a decoder's interner retains. Keys beyond this still
/// become symbols but are not shared.
pub const MAX_INTERNED_KEYS: usize = 4096;

//! Text-level codecs: literals, legend keys and delimiter-aware splitting.

pub mod value;
pub mod ident;
pub mod split;

pub use value::{parse_literal, format_value};
pub use ident::{Alphabet, AlphabetError, IdError, DEFAULT_ALPHABET};
pub use split::{split_atoms, split_properties, SplitError};

//! Photo metadata: raw tag decoding, group parsing and the stream reader

pub mod convert;
pub mod parse;
pub mod rational;
pub mod reader;
pub mod tag;

pub use parse::{DimensionSource, MetadataGroup, parse};
pub use rational::Rational;
pub use reader::read_groups;
pub use tag::{RawTag, TagHint, TagValue};

// Corpus listing, MessagePack codec seam, checking, generation, and errors.
pub mod check;
pub mod codec;
pub mod corpus;
pub mod error;
pub mod generate;

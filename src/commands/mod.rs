pub mod parse;
pub mod query;
pub mod status;

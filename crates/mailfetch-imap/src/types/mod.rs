//! Response model.
//!
//! Parsed responses are trees of [`Token`]s held in [`ResponseList`]s. A
//! [`Response`] adds the tag and the continuation/completion flags.

mod list;
mod response;
mod token;

pub use list::ResponseList;
pub use response::Response;
pub use token::Token;

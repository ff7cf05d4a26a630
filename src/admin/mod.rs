pub mod client;
pub mod error;
pub mod response;

pub use client::{AdminClient, SchemaLoad};
pub use error::AdminError;
pub use response::{AdminResponse, SchemaReply};

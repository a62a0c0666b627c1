//! Relay-style identifiers and pagination for the Todo API.
//!
//! - [`node_id`]: opaque, type-prefixed node ids (`Todo:<id>`, `User:<id>`)
//! - [`pagination`]: validation of `first`/`after`/`last`/`before`
//! - [`cursor`]: the opaque cursor format used by every list
//! - [`connection`]: connection, edge and page-info response shapes

pub mod connection;
pub mod cursor;
pub mod error;
pub mod node_id;
pub mod pagination;

pub use connection::{Connection, Edge, Page, PageInfo};
pub use cursor::KeyCursor;
pub use error::{CursorError, NodeIdError, PaginationError};
pub use node_id::{decode, decode_as, encode, EntityType, NodeId, NODE_ID_SEPARATOR};
pub use pagination::{parse, ConnectionArgs, PaginationArgs, PaginationLimits};

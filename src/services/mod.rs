//! Services module
//!
//! Visitor session handling and the content graph client.

mod graph;
mod visitor;

pub use graph::{parse_item, GraphAuth, GraphClient};
pub use visitor::{is_valid_visitor_id, VisitorSession};

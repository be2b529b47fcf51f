//! XML parsing and output.
//!
//! The parser builds [`NodeRef`](crate::node::NodeRef) trees from XML text;
//! the printer serializes trees back deterministically (sorted attributes,
//! entity escaping) so two structurally equal trees always serialize to the
//! same bytes.

mod parser;
mod printer;

pub use parser::{parse_str, XmlParser};
pub use printer::{print_to_string, XmlPrinter};

/// Synthetic root element wrapping every parsed document, so documents with
/// multiple top-level nodes stay representable as a single tree.
pub(crate) const SYNTHETIC_ROOT: &str = "$ROOT$";

//! Pure data types for the management model: path addresses, dynamic model
//! values, schema versions, and operation requests.

/// Path addressing: segments, addresses, parsing and display.
pub mod address;
/// Typed management requests dispatched against the registry.
pub mod operation;
/// Dynamic model values: scalars, lists, and ordered objects.
pub mod value;
/// Schema version triples with a total order.
pub mod version;

pub use address::{AddressError, PathAddress, PathElement, PathValue, WILDCARD};
pub use operation::OperationRequest;
pub use value::ModelValue;
pub use version::{ModelVersion, VersionParseError};

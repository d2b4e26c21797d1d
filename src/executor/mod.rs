//! Command execution
//!
//! - [`result`]: the uniform [`ExecutionResult`]
//! - [`convert`]: BSON → JSON for document results
//! - [`mongo`]: Mongo dispatcher and the document-store seam
//! - [`router`]: the [`Interpreter`] routing raw commands to a dispatcher

pub mod convert;
pub mod mongo;
pub mod result;
pub mod router;

pub use mongo::{DocumentStore, FindSpec, MongoDispatcher, MongoStore, Target};
pub use result::ExecutionResult;
pub use router::{CommandKind, Interpreter, RawCommand};

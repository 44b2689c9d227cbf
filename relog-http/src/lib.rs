//! Tower middleware that gives an HTTP service structured access logs and
//! panic recovery, built on the relog-core logger and context types.

pub mod access;
pub mod middleware;
pub mod observe;

pub use access::AccessRecord;
pub use middleware::{RequestLog, RequestLogLayer};
pub use observe::ObservedBody;

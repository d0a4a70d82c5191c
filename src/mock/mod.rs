//! The mocking core: endpoint table, dispatcher and response delay.
//!
//! A request flows through the pieces like this:
//!
//! ```text
//!   Request ──► Dispatcher ──► EndpointTable::lookup(method, path)
//!                   │                 │
//!                   │        hit ◄────┴────► miss
//!                   │         │               │
//!                   │   resolve payload   404 {"error":"endpoint not found"}
//!                   │   interruptible_delay
//!                   │   synthesize_response
//!                   ▼
//!               Observer (received / matched / not found / sent)
//! ```

pub mod delay;
pub mod dispatcher;
pub mod endpoint;
pub mod observer;

pub use dispatcher::{DispatchError, Dispatcher};
pub use endpoint::{Endpoint, EndpointError, EndpointTable, Payload, PayloadError, TableError};
pub use observer::{Observer, TracingObserver};

//! POP3 connection management.

mod factory;
mod stream;
mod trust;

pub use factory::{SocketFactory, TlsSocketFactory};
pub use stream::{AsyncStream, BoxedStream, Pop3Stream};
pub use trust::TrustContext;

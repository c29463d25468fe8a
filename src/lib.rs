//! Portable stream sockets and readiness multiplexing over interchangeable
//! native networking stacks.

pub mod backend;
pub mod poll;
pub mod socket;
mod addr;
mod buffer;
mod error;

pub use self::error::{Errno, IoError, SocketError, errno};
pub use self::addr::{Family, SockAddr};
pub use self::buffer::IoBuffer;
pub use self::backend::{
	Backend, Capabilities, Console, Embedded, Native, NonBlockingStyle, Posix,
};
pub use self::poll::{Events, PollInfo};
pub use self::socket::{BufferConfig, ConnectStatus, ConnectorBuilder, ListenerBuilder, OwnedHandle,
					   ReuseConfig, Shutdown, Socket};

//! Channels, connectors, endpoints and the supervisor that ties them together.

mod channel;
mod connectors;
mod endpoint;
mod event;
mod ids;
mod info;
mod retry;
mod scope;
mod supervisor;

pub use channel::{Channel, ChannelTimeouts, OutgoingReceiver, OutgoingSender};
pub use connectors::Connector;
#[cfg(feature = "serial")]
pub use connectors::SerialPort;
pub use connectors::{TcpClient, TcpServer, TlogFile, UdpBroadcast, UdpClient, UdpServer};
pub use endpoint::Endpoint;
pub use event::{Event, EventBus, EventReceiver, EventSender};
pub use ids::{ChannelId, ConnectionId};
pub use info::{ChannelDetails, ChannelInfo, ConnectionDetails, ConnectionInfo};
pub use retry::Retry;
pub use scope::{BroadcastScope, OutgoingFrame};
pub use supervisor::{Supervisor, SupervisorHandle};

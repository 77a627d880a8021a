pub mod connectivity;

pub use connectivity::{ChannelConnectivity, NoopBackgroundWake};

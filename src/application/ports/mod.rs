pub mod connectivity;
pub mod local_store;
pub mod remote_gateway;

pub use connectivity::{BackgroundWake, ConnectivityMonitor, WakeTrigger};
pub use local_store::LocalStore;
pub use remote_gateway::{AssetDescriptor, BlobMetadata, RemoteError, RemoteGateway};

pub mod confirm;
pub mod kernel;
pub mod spawner;
pub mod store;
pub mod stream;

pub use confirm::{ActionConfirmer, ActionKind, AutoAcceptConfirmer};
pub use kernel::{Kernel, KernelBuilder};
pub use spawner::KernelSpawner;
pub use store::AgentStore;
pub use stream::{NullStreamSink, StreamSink};

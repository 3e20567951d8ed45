//! Run-wide cancellation channel. Every subscriber sees a single `()` when the
//! run should stop.
use tokio::sync::broadcast;

pub type ShutdownSender = broadcast::Sender<()>;
pub type ShutdownReceiver = broadcast::Receiver<()>;

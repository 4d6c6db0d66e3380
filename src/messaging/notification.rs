// Graph notifications - Communication render thread → control thread

use crate::audio::backend::NodeId;

/// Something the render thread observed and the control loop must reconcile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphNotification {
    /// A source finished playing (buffer exhausted, duration elapsed or stopped)
    SourceEnded(NodeId),
}

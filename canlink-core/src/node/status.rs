//! Node lifecycle status
//!
//! Start failures latch: once `start` fails, every steady-state operation
//! returns the same failure until the node is torn down. The guard runs
//! once at each public operation's entry, so no operation partially
//! executes against an unready node.

use super::NodeError;

/// Lifecycle status of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeStatus {
    /// Constructed, not yet started
    Ready,
    /// Started; steady-state operations allowed
    Started,
    /// Start failed; terminal
    Failed(NodeError),
}

impl NodeStatus {
    /// Gate for steady-state operations
    ///
    /// Ok only when started; otherwise the status that blocks the
    /// operation, with latched failures returned as-is.
    pub fn ready_guard(&self) -> Result<(), NodeError> {
        match *self {
            NodeStatus::Started => Ok(()),
            NodeStatus::Ready => Err(NodeError::NotStarted),
            NodeStatus::Failed(err) => Err(err),
        }
    }

    /// Check if this is a terminal failure state
    pub fn is_failed(&self) -> bool {
        matches!(self, NodeStatus::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_before_start() {
        assert_eq!(NodeStatus::Ready.ready_guard(), Err(NodeError::NotStarted));
    }

    #[test]
    fn test_guard_after_start() {
        assert_eq!(NodeStatus::Started.ready_guard(), Ok(()));
    }

    #[test]
    fn test_guard_returns_latched_failure() {
        let status = NodeStatus::Failed(NodeError::DuplicateId(0x100));
        assert_eq!(status.ready_guard(), Err(NodeError::DuplicateId(0x100)));
        assert!(status.is_failed());
    }
}

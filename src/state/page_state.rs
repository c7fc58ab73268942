/// Page state definitions for tracking crawl progress
///
/// A page moves `Pending -> Fetched -> Extracted -> Written`; `Failed` is
/// reachable from every non-terminal state.
use crate::DocsError;
use std::fmt;

/// Represents the current state of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Page was discovered and is waiting for its turn
    Pending,

    /// Page markup was loaded by the renderer
    Fetched,

    /// Main content was extracted and is ready to be written
    Extracted,

    // ===== Terminal States =====
    /// An artifact (PDF or HTML fallback) exists on disk
    Written,

    /// Page gave up after its retry budget; a failure record exists
    Failed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Written | Self::Failed)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Written)
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetched)
                | (Self::Fetched, Self::Extracted)
                | (Self::Extracted, Self::Written)
                | (Self::Pending | Self::Fetched | Self::Extracted, Self::Failed)
        )
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn transition(self, next: PageState) -> Result<PageState, DocsError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DocsError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetched => "fetched",
            Self::Extracted => "extracted",
            Self::Written => "written",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

use crate::flow::FlowEvent;

/// Outbound lifecycle events.
///
/// Implementations must not call back into the controller.
pub trait FlowEventPort: Send + Sync {
    fn emit(&self, event: FlowEvent);
}

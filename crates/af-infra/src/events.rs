use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use af_core::flow::FlowEvent;
use af_core::ports::FlowEventPort;

/// Forwards lifecycle events into an unbounded channel.
///
/// Sending never blocks, so the controller can emit from a synchronous
/// handler.
pub struct ChannelEventSink {
    tx: UnboundedSender<FlowEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: UnboundedSender<FlowEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, UnboundedReceiver<FlowEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl FlowEventPort for ChannelEventSink {
    fn emit(&self, event: FlowEvent) {
        if let Err(err) = self.tx.send(event) {
            debug!(event = err.0.name(), "event receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emitted_events_arrive_in_order() {
        let (sink, mut rx) = ChannelEventSink::channel();

        sink.emit(FlowEvent::Ready);
        sink.emit(FlowEvent::ShowView);

        assert!(matches!(rx.try_recv(), Ok(FlowEvent::Ready)));
        assert!(matches!(rx.try_recv(), Ok(FlowEvent::ShowView)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn emit_after_receiver_dropped_is_silent() {
        let (sink, rx) = ChannelEventSink::channel();
        drop(rx);

        sink.emit(FlowEvent::Ready);
    }
}

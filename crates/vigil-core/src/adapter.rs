//! Rendering adapter contract
//!
//! The chart core never draws. At the end of every cycle it hands the fully
//! derived [`RenderFrame`] to a [`RenderAdapter`], and the detail view
//! whenever it changes. Adapters may queue control events in response (for
//! example when a click lands on a mark).

use crate::detail::DetailView;
use crate::events::ControlQueue;
use crate::frame::RenderFrame;

/// Receives derived state and turns it into pixels
pub trait RenderAdapter {
    /// Draw a complete frame
    fn draw(&mut self, frame: &RenderFrame, queue: &mut ControlQueue);

    /// Redraw the linked detail area
    fn draw_detail(&mut self, _detail: &DetailView) {}

    /// A participant was picked; hosts use this to link other views
    fn participant_selected(&mut self, _participant: &str) {}
}

/// Keeps everything it is given; used by hosts that serialize output and by tests
#[derive(Debug, Clone, Default)]
pub struct RecordingAdapter {
    pub frames: Vec<RenderFrame>,
    pub details: Vec<DetailView>,
    pub selected_participants: Vec<String>,
}

impl RecordingAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&RenderFrame> {
        self.frames.last()
    }

    pub fn last_detail(&self) -> Option<&DetailView> {
        self.details.last()
    }
}

impl RenderAdapter for RecordingAdapter {
    fn draw(&mut self, frame: &RenderFrame, _queue: &mut ControlQueue) {
        self.frames.push(frame.clone());
    }

    fn draw_detail(&mut self, detail: &DetailView) {
        self.details.push(detail.clone());
    }

    fn participant_selected(&mut self, participant: &str) {
        self.selected_participants.push(participant.to_string());
    }
}

impl<A: RenderAdapter + ?Sized> RenderAdapter for Box<A> {
    fn draw(&mut self, frame: &RenderFrame, queue: &mut ControlQueue) {
        (**self).draw(frame, queue)
    }

    fn draw_detail(&mut self, detail: &DetailView) {
        (**self).draw_detail(detail)
    }

    fn participant_selected(&mut self, participant: &str) {
        (**self).participant_selected(participant)
    }
}

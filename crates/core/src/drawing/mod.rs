//! Polygon drawing interaction as an explicit state machine.
//!
//! ```text
//!   Idle --start--> Drawing --finish (>= 3 distinct pts)--> Closed
//!    ^                 |  ^                                   |
//!    |                 |  +--click / undo                     |
//!    +------clear------+--------------------------------------+
//! ```
//!
//! [`DrawingState::apply`] is pure: it consumes the current state and returns
//! the next one plus at most one [`BoundaryEvent`]. Only `finish` and `clear`
//! emit events. [`BoundaryDrawer`] owns a state and forwards events to a
//! [`BoundaryConsumer`].

use tracing::{debug, info};

use crate::boundary::{BoundaryDraft, CommittedBoundary, LatLng};
use crate::vector::FeatureCollection;

/// User actions fed to the drawing machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawAction {
    Start,
    Click(LatLng),
    Undo,
    Finish,
    Clear,
}

/// Notification emitted towards the boundary consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryEvent {
    /// A boundary was committed; carries the single-feature collection.
    Committed(FeatureCollection),
    /// The boundary was discarded.
    Cleared,
}

impl BoundaryEvent {
    /// The boundary as the consumer sees it (`None` when cleared).
    pub fn boundary(&self) -> Option<&FeatureCollection> {
        match self {
            Self::Committed(fc) => Some(fc),
            Self::Cleared => None,
        }
    }
}

/// Current phase of the interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DrawingState {
    #[default]
    Idle,
    Drawing(BoundaryDraft),
    Closed(CommittedBoundary),
}

impl DrawingState {
    /// Apply an action, returning the next state and any emitted event.
    pub fn apply(self, action: DrawAction) -> (DrawingState, Option<BoundaryEvent>) {
        match (self, action) {
            (_, DrawAction::Start) => (Self::Drawing(BoundaryDraft::new()), None),

            (_, DrawAction::Clear) => (Self::Idle, Some(BoundaryEvent::Cleared)),

            (Self::Drawing(mut draft), DrawAction::Click(p)) => {
                if p.is_valid() {
                    draft.push(p);
                } else {
                    debug!(lat = p.lat, lng = p.lng, "ignoring click outside lat/lng domain");
                }
                (Self::Drawing(draft), None)
            }

            (Self::Drawing(mut draft), DrawAction::Undo) => {
                draft.pop();
                (Self::Drawing(draft), None)
            }

            (Self::Drawing(draft), DrawAction::Finish) => match draft.commit() {
                Ok(boundary) => {
                    info!(vertices = boundary.vertices().len(), "boundary committed");
                    let fc = boundary.to_feature_collection();
                    (Self::Closed(boundary), Some(BoundaryEvent::Committed(fc)))
                }
                Err(e) => {
                    debug!("finish refused: {e}");
                    (Self::Drawing(draft), None)
                }
            },

            (state, action) => {
                debug!(state = state.name(), ?action, "action ignored");
                (state, None)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Drawing(_) => "drawing",
            Self::Closed(_) => "closed",
        }
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self, Self::Drawing(_))
    }

    /// Vertices to render for the current state.
    pub fn preview(&self) -> &[LatLng] {
        match self {
            Self::Idle => &[],
            Self::Drawing(draft) => draft.points(),
            Self::Closed(boundary) => boundary.vertices(),
        }
    }

    pub fn committed(&self) -> Option<&CommittedBoundary> {
        match self {
            Self::Closed(boundary) => Some(boundary),
            _ => None,
        }
    }
}

/// Receiver of boundary notifications (policy-simulation workflow).
pub trait BoundaryConsumer {
    /// Called with the committed boundary on finish, `None` on clear.
    fn boundary_changed(&mut self, boundary: Option<&FeatureCollection>);
}

impl<F> BoundaryConsumer for F
where
    F: FnMut(Option<&FeatureCollection>),
{
    fn boundary_changed(&mut self, boundary: Option<&FeatureCollection>) {
        self(boundary)
    }
}

/// Drawing state bound to a boundary consumer.
pub struct BoundaryDrawer<C> {
    state: DrawingState,
    consumer: C,
}

impl<C: BoundaryConsumer> BoundaryDrawer<C> {
    pub fn new(consumer: C) -> Self {
        Self {
            state: DrawingState::Idle,
            consumer,
        }
    }

    pub fn state(&self) -> &DrawingState {
        &self.state
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    pub fn into_consumer(self) -> C {
        self.consumer
    }

    /// Apply an action and deliver any emitted event. Returns the event.
    pub fn dispatch(&mut self, action: DrawAction) -> Option<BoundaryEvent> {
        let (next, event) = std::mem::take(&mut self.state).apply(action);
        self.state = next;
        if let Some(ref ev) = event {
            self.consumer.boundary_changed(ev.boundary());
        }
        event
    }

    pub fn start(&mut self) {
        self.dispatch(DrawAction::Start);
    }

    pub fn click(&mut self, lat: f64, lng: f64) {
        self.dispatch(DrawAction::Click(LatLng::new(lat, lng)));
    }

    pub fn undo(&mut self) {
        self.dispatch(DrawAction::Undo);
    }

    /// Returns `true` when a boundary was committed.
    pub fn finish(&mut self) -> bool {
        matches!(
            self.dispatch(DrawAction::Finish),
            Some(BoundaryEvent::Committed(_))
        )
    }

    pub fn clear(&mut self) {
        self.dispatch(DrawAction::Clear);
    }
}

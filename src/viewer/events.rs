use crate::rig::TraitCategory;
use crate::viewer::requests::LoadSlot;

/// Notifications for the surrounding UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    ModelLoading { subject: String },
    ModelReady { subject: String },
    AnimationStarted { id: String },
    TraitAttached { category: TraitCategory, uri: String },
    TraitDetached { category: TraitCategory },
    /// A load failed; the scene keeps showing its previous state.
    LoadFailed { slot: LoadSlot, message: String },
    /// A load finished after being superseded and was discarded.
    StaleLoadDiscarded { slot: LoadSlot },
}

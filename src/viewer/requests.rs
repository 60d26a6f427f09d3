//! Generation-counted load requests.
//!
//! Every load is issued against a slot. Issuing a new request for a slot
//! bumps its generation; a completion whose ticket does not carry the slot's
//! latest generation is stale and must be disposed instead of applied.

use std::fmt;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use rustc_hash::FxHashMap;

use crate::animation::AnimationClip;
use crate::errors::AssetError;
use crate::rig::TraitCategory;
use crate::scene::ModelScene;
use crate::viewer::state::ModelSelection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadSlot {
    Model,
    Animation,
    Trait(TraitCategory),
    /// Clip cache warm-up. Never superseded by other requests.
    Preload,
}

impl fmt::Display for LoadSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadSlot::Model => f.write_str("model"),
            LoadSlot::Animation => f.write_str("animation"),
            LoadSlot::Trait(c) => write!(f, "{c} trait"),
            LoadSlot::Preload => f.write_str("preload"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub slot: LoadSlot,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    generations: FxHashMap<LoadSlot, u64>,
}

impl RequestTracker {
    /// Starts a new request for `slot`, superseding every earlier one.
    pub fn issue(&mut self, slot: LoadSlot) -> Ticket {
        let generation = self.generations.entry(slot).or_insert(0);
        *generation += 1;
        Ticket {
            slot,
            generation: *generation,
        }
    }

    /// A ticket for the slot's current generation, without superseding
    /// requests already in flight.
    #[must_use]
    pub fn join(&self, slot: LoadSlot) -> Ticket {
        Ticket {
            slot,
            generation: self.generations.get(&slot).copied().unwrap_or(0),
        }
    }

    /// Makes every in-flight request for `slot` stale.
    pub fn invalidate(&mut self, slot: LoadSlot) {
        *self.generations.entry(slot).or_insert(0) += 1;
    }

    /// Makes every in-flight request stale.
    pub fn invalidate_all(&mut self) {
        for slot in [LoadSlot::Model, LoadSlot::Animation, LoadSlot::Preload] {
            self.invalidate(slot);
        }
        for category in TraitCategory::ALL {
            self.invalidate(LoadSlot::Trait(category));
        }
    }

    #[must_use]
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.generations.get(&ticket.slot).copied().unwrap_or(0) == ticket.generation
    }
}

pub(crate) enum LoadPayload {
    Model {
        selection: ModelSelection,
        uri: String,
        result: Result<ModelScene, AssetError>,
    },
    Animation {
        id: String,
        uri: String,
        play: bool,
        result: Result<Vec<AnimationClip>, AssetError>,
    },
    Trait {
        category: TraitCategory,
        uri: String,
        result: Result<ModelScene, AssetError>,
    },
}

pub(crate) struct Completion {
    pub ticket: Ticket,
    pub payload: LoadPayload,
}

pub(crate) type PendingLoads = FuturesUnordered<BoxFuture<'static, Completion>>;

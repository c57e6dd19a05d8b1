pub mod focus;
pub mod gallery;
pub mod router;
pub mod status;
pub mod transform;

pub use focus::{
    FocusTarget, Key, KeyInput, KeyOutcome, KeyRouter, ModalCommand, ModalFocusManager, ModalState,
};
pub use gallery::GalleryModel;
pub use router::{DashboardView, Dispatch, Highlight};
pub use status::{ExpiryTicket, StatusMessage, StatusMessageChannel, STATUS_TTL};
pub use transform::{Transform, TransformPatch, ViewState, MAX_SCALE, MIN_SCALE};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

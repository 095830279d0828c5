//! Avatar Reconciler
//!
//! Keeps noun avatar references consistent with the avatar image directory and
//! drives incremental avatar generation.

pub mod layout;
pub mod reconcile;
pub mod topup;

pub use layout::{creature_slug, AvatarFile, AvatarLayout};
pub use reconcile::{reconcile, DanglingRef, OrphanFile, ReconcileReport};
pub use topup::{ensure_avatar_count, top_up, AvatarPipeline, TopUpLine, TopUpReport};

//! Manager subsystems.
//!
//! Each manager exclusively owns its entity set and reacts to lifecycle
//! events: `*Created` appends the published handle, `*Destroyed` removes
//! the first matching id. Managers are cheaply cloneable (Arc inner) so the
//! driver keeps query handles while a worker owns the update loop.

mod bullet;
mod enemy;
mod level;
mod score;

pub use bullet::BulletManager;
pub use enemy::EnemyManager;
pub use level::LevelManager;
pub use score::ScoreManager;

use strafe_core::entity::{handle_id, EntityHandle, EntityId};

/// Remove the first handle with this id. Order-preserving; a miss is a no-op
/// so double-consumption of destruction events stays idempotent.
pub(crate) fn remove_first(list: &mut Vec<EntityHandle>, id: EntityId) {
    if let Some(idx) = list.iter().position(|h| handle_id(h) == id) {
        list.remove(idx);
    }
}

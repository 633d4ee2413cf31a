#[allow(clippy::module_inception)]
pub mod actor;
pub mod cursor;
pub mod messages;
pub mod spawn;

pub use actor::{Actor, ActorContext, ActorRef};
pub use cursor::CursorActor;
pub use spawn::spawn_actor;

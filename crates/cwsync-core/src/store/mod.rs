pub mod entity_cache;
pub mod session;

pub use entity_cache::EntityCache;
pub use session::Session;

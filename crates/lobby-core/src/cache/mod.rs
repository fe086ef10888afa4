//! Game list caching

mod list;
mod refresh;

pub use list::ListCache;
pub use refresh::spawn_refresh_task;

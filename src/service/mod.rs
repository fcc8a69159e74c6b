//! Store operations behind each endpoint, with store errors translated to HTTP errors.

mod crud;
mod entries;
pub use crud::CrudService;
pub use entries::EntryService;

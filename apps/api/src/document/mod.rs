// Document model services: legacy migration, completion score, the form
// controller that owns the live document, and its debounced persistence.

pub mod autosave;
pub mod completeness;
pub mod form;
pub mod handlers;
pub mod ids;
pub mod migration;

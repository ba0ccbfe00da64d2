// Meeting notes form: session state, tab rendering, note formatting and the saved summary.
// The formatter is the only part that leaves the process, and only through llm_client.

pub mod formatter;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod sessions;
pub mod summary;
pub mod tabs;

//! Profile fetching: the capability table, per-component HTTP clients and
//! the task executor that drives one (target, kind) fetch to a terminal state.

pub mod clients;
pub mod executor;
pub mod recipes;

pub use clients::{ComponentHttpClient, HttpClientBundle};
pub use executor::ProfileTaskExecutor;
pub use recipes::{resolve_recipe, FetchRecipe, HostPort};

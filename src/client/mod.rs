//! Status client: fetches `/health` on an interval and exposes a view model.
//!
//! - [`fetcher`]: the HTTP client and the [`HealthFetcher`] seam
//! - [`view`]: loading / error / success state and its rendering
//! - [`poller`]: the cancellable polling loop

pub mod fetcher;
pub mod poller;
pub mod view;

pub use fetcher::{HealthFetcher, StatusClient};
pub use poller::{PollHandle, Poller};
pub use view::{render, View, ViewState};

//! Remote state acquisition from Terraform Cloud / Enterprise

pub mod backoff;
pub mod cancel;
pub mod client;
pub mod poller;

pub use cancel::CancellationToken;
pub use client::TfeClient;
pub use poller::{StateVersionPoller, SystemClock};

//! Remote music source: trait contract, HTTP implementation and the retry
//! policy wrapping every call against the upstream service.

mod http_source;
mod retry;
mod trait_def;

pub use http_source::HttpMusicSource;
pub use retry::RetryPolicy;
pub use trait_def::RemoteMusicSource;

#[cfg(any(test, feature = "mock"))]
pub use trait_def::MockRemoteMusicSource;

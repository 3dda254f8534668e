//! `fetch-retry` fetches JSON over HTTP with a bounded retry loop.
//!
//! - [`fetch_with_retry`] is the one-call entry point over `reqwest`.
//! - [`RetryClient`] runs the same loop over any [`Transport`].
//! - [`MockFetch`] and [`MockApi`] are seedable randomized test doubles.

mod client;
mod error;
mod mock;
mod options;
mod transport;

pub use client::{fetch_with_retry, fetch_with_retry_using, RetryClient};
pub use error::{FetchError, MockApiError};
pub use mock::{
    mock_api_call, ApiCallData, ApiCallSuccess, MockApi, MockFetch, MockPayload, MockResponse,
    MOCK_FAILURE_STATUSES,
};
pub use options::RetryOptions;
pub use transport::{HttpResponse, ReqwestTransport, Response, Transport};

pub type Result<T> = std::result::Result<T, FetchError>;

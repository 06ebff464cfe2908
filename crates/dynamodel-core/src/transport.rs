//! The seam between the mapper and whatever executes requests.
//!
//! The core never talks to a store itself. A [`Transport`] receives a fully
//! compiled [`RequestDescriptor`] and returns the store's [`RawResponse`].
//! Retries, backoff, signing and cancellation all belong to the transport.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dynamodel_model::{RawResponse, RequestDescriptor};

/// Future returned by [`Transport::execute`].
pub type TransportFuture = Pin<Box<dyn Future<Output = Result<RawResponse, anyhow::Error>> + Send>>;

/// Executes compiled requests against a store.
///
/// The trait returns a boxed future so it can be used as
/// `Arc<dyn Transport>`.
pub trait Transport: Send + Sync + 'static {
    /// Execute one request.
    fn execute(&self, request: RequestDescriptor) -> TransportFuture;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: RequestDescriptor) -> TransportFuture {
        (**self).execute(request)
    }
}

/// A transport that rejects every request.
///
/// Useful for exercising compile-time failures, which must surface before
/// any request is sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnreachableTransport;

impl Transport for UnreachableTransport {
    fn execute(&self, request: RequestDescriptor) -> TransportFuture {
        let operation = request.operation;
        Box::pin(async move { Err(anyhow::anyhow!("no transport configured for {operation}")) })
    }
}

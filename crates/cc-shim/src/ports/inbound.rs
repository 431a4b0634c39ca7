//! # Inbound Ports (Driving Ports)
//!
//! What a chaincode exposes to the dispatcher.

use crate::domain::Response;
use crate::stub::ChaincodeStub;

/// Business logic executed once per invocation.
///
/// The stub is borrowed for the duration of the call and never outlives the
/// invocation, so no state survives across transactions unless written with
/// `put_state`.
#[async_trait::async_trait]
pub trait Chaincode: Send + Sync {
    /// Service name used for logging.
    fn name(&self) -> &'static str {
        "chaincode"
    }

    /// Called when the invocation function is `init`.
    async fn init(&self, stub: &ChaincodeStub) -> Response;

    /// Called for every other function.
    async fn invoke(&self, stub: &ChaincodeStub) -> Response;
}

use cc_gateway_registry::GatewayRegistry;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cc_shim::start(GatewayRegistry).await
}

use cc_supply_chain::SupplyChain;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cc_shim::start(SupplyChain).await
}

use cc_identity::IdentityVerification;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cc_shim::start(IdentityVerification).await
}

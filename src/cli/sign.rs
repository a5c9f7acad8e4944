use std::path::Path;

use crate::config::GlobalConfig;
use crate::daemon::signature::SignatureVerifier;

/// Print the signature header value for a payload
pub async fn sign_payload(config_path: &Path, file: Option<&Path>) -> anyhow::Result<()> {
    let config = GlobalConfig::resolve_from(config_path)?;
    let payload = super::read_payload(file).await?;

    let verifier = SignatureVerifier::new(config.webhook.secret);
    println!("{}", verifier.sign(&payload)?);
    Ok(())
}

//! Matching of signed challenge messages for balance checks and
//! authorizations

use alloy::primitives::{Address, Signature};
use request_verifier_api::types::status::Status;
use tracing::debug;

use crate::types::attachments::SignedMessage;

/// Compute the status of a signature-fulfilled request.
///
/// The request is pending until a signed message is attached. It succeeds iff
/// the signer is the requested wallet (when one was pinned) and the signature
/// over the challenge message recovers to the signer.
pub fn signature_status(
    message: &str,
    requested_wallet: Option<Address>,
    signed: Option<&SignedMessage>,
) -> Status {
    let Some(signed) = signed else {
        return Status::Pending;
    };

    let wallet_matches = requested_wallet.is_none_or(|wallet| wallet == signed.wallet_address);
    if wallet_matches && recovers_to(message, signed) { Status::Success } else { Status::Failed }
}

/// Whether the EIP-191 signature over the message recovers to the signer
fn recovers_to(message: &str, signed: &SignedMessage) -> bool {
    let recovered = Signature::from_raw(&signed.signature)
        .and_then(|signature| signature.recover_address_from_msg(message));

    match recovered {
        Ok(address) => address == signed.wallet_address,
        Err(e) => {
            debug!("Failed to recover signer of {}: {e}", signed.wallet_address);
            false
        },
    }
}

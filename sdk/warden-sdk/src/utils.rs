use warden_program::AuthorizationCore;
use warden_state::{Address, ValidationData, B256, SENTINEL};

use crate::error::Result;
use crate::types::ValidatorInfo;

/// Walks every page of the wallet's enabled validators, most recent first.
pub fn list_validators(core: &AuthorizationCore, wallet: &Address) -> Result<Vec<ValidatorInfo>> {
    let registry = core.validators();
    let page_size = core.config().max_page_size;
    let mut out = Vec::new();
    let mut cursor = SENTINEL;
    loop {
        let page = registry.list(wallet, cursor, page_size)?;
        out.extend(
            page.entries
                .iter()
                .map(|id| ValidatorInfo::new(id, registry.class_of(wallet, id))),
        );
        if page.next == SENTINEL {
            return Ok(out);
        }
        cursor = page.next;
    }
}

/// Unpacks a validation word returned by the core.
pub fn decode_validation(word: &B256) -> ValidationData {
    ValidationData::unpack(word)
}

/// `true` when `word` authorizes at `now`.
pub fn authorizes(word: &B256, now: u64) -> bool {
    let data = ValidationData::unpack(word);
    !data.is_failed() && data.window().is_active(now)
}

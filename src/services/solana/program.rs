//! Client-side bindings for the on-chain risk program
//!
//! The program is an Anchor program, so instruction data starts with the first
//! eight bytes of `sha256("global:<instruction>")` and account data with the
//! first eight bytes of `sha256("account:<Type>")`. Arguments and account
//! fields are Borsh encoded (little-endian fixed-width integers).

use ring::digest::{digest, SHA256};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

use crate::core::error::AppError;
use crate::core::result::AppResult;
use crate::core::types::{RiskPreferenceRecord, RiskSnapshotRecord};
use crate::core::validation::validate_threshold;

pub const RISK_PREFERENCE_SEED: &[u8] = b"risk_preference";
pub const RISK_SNAPSHOT_SEED: &[u8] = b"risk_snapshot";

const DISCRIMINATOR_LEN: usize = 8;
const OWNER_OFFSET: usize = DISCRIMINATOR_LEN;
const FIELDS_OFFSET: usize = OWNER_OFFSET + 32;

/// disc + owner + risk_score(u8) + timestamp(i64)
pub const RISK_SNAPSHOT_LEN: usize = FIELDS_OFFSET + 1 + 8;
/// disc + owner + threshold(u8) + created_at(i64) + updated_at(i64)
pub const RISK_PREFERENCE_LEN: usize = FIELDS_OFFSET + 1 + 8 + 8;

fn sighash(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let preimage = format!("{}:{}", namespace, name);
    let hash = digest(&SHA256, preimage.as_bytes());
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&hash.as_ref()[..DISCRIMINATOR_LEN]);
    out
}

/// Discriminator prefixed to instruction data
pub fn instruction_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    sighash("global", name)
}

/// Discriminator prefixed to account data
pub fn account_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    sighash("account", name)
}

/// Preference PDA of a wallet
pub fn preference_address(program_id: &Pubkey, user: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[RISK_PREFERENCE_SEED, user.as_ref()], program_id).0
}

/// Snapshot PDA of a wallet at a given unix timestamp
pub fn snapshot_address(program_id: &Pubkey, user: &Pubkey, timestamp: i64) -> Pubkey {
    Pubkey::find_program_address(
        &[RISK_SNAPSHOT_SEED, user.as_ref(), &timestamp.to_le_bytes()],
        program_id,
    )
    .0
}

fn instruction_data(name: &str, args: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(DISCRIMINATOR_LEN + args.len());
    data.extend_from_slice(&instruction_discriminator(name));
    data.extend_from_slice(args);
    data
}

/// `initialize_preferences(threshold)`
pub fn initialize_preferences_ix(
    program_id: &Pubkey,
    user: &Pubkey,
    threshold: u8,
) -> AppResult<Instruction> {
    validate_threshold(threshold)?;

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(preference_address(program_id, user), false),
            AccountMeta::new(*user, true),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: instruction_data("initialize_preferences", &[threshold]),
    })
}

/// `update_threshold(new_threshold)`
pub fn update_threshold_ix(
    program_id: &Pubkey,
    user: &Pubkey,
    new_threshold: u8,
) -> AppResult<Instruction> {
    validate_threshold(new_threshold)?;

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(preference_address(program_id, user), false),
            AccountMeta::new(*user, true),
        ],
        data: instruction_data("update_threshold", &[new_threshold]),
    })
}

/// `record_risk_score(risk_score, timestamp)`
///
/// The preference account is passed writable.
pub fn record_risk_score_ix(
    program_id: &Pubkey,
    user: &Pubkey,
    risk_score: u8,
    timestamp: i64,
) -> Instruction {
    let mut args = Vec::with_capacity(9);
    args.push(risk_score);
    args.extend_from_slice(&timestamp.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(preference_address(program_id, user), false),
            AccountMeta::new(snapshot_address(program_id, user, timestamp), false),
            AccountMeta::new(*user, true),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: instruction_data("record_risk_score", &args),
    }
}

/// `getProgramAccounts` filters selecting snapshots owned by `owner`
pub fn snapshot_filters(owner: &Pubkey) -> Vec<RpcFilterType> {
    vec![
        RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
            0,
            &account_discriminator("RiskSnapshot"),
        )),
        RpcFilterType::Memcmp(Memcmp::new_base58_encoded(OWNER_OFFSET, owner.as_ref())),
    ]
}

fn check_account(data: &[u8], name: &str, min_len: usize) -> AppResult<Pubkey> {
    if data.len() < min_len {
        return Err(AppError::solana(format!(
            "{} account too short: {} bytes, expected {}",
            name,
            data.len(),
            min_len
        )));
    }
    if data[..DISCRIMINATOR_LEN] != account_discriminator(name) {
        return Err(AppError::solana(format!("Account is not a {}", name)));
    }

    let mut owner = [0u8; 32];
    owner.copy_from_slice(&data[OWNER_OFFSET..FIELDS_OFFSET]);
    Ok(Pubkey::new_from_array(owner))
}

fn read_i64(data: &[u8], offset: usize) -> i64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    i64::from_le_bytes(bytes)
}

/// Decode a `RiskSnapshot` account
pub fn decode_snapshot(address: &Pubkey, data: &[u8]) -> AppResult<RiskSnapshotRecord> {
    check_account(data, "RiskSnapshot", RISK_SNAPSHOT_LEN)?;

    Ok(RiskSnapshotRecord {
        public_key: address.to_string(),
        risk_score: data[FIELDS_OFFSET],
        timestamp: read_i64(data, FIELDS_OFFSET + 1),
    })
}

/// Decode a `RiskPreference` account
pub fn decode_preference(data: &[u8]) -> AppResult<RiskPreferenceRecord> {
    let owner = check_account(data, "RiskPreference", RISK_PREFERENCE_LEN)?;

    Ok(RiskPreferenceRecord {
        owner: owner.to_string(),
        threshold: data[FIELDS_OFFSET],
        created_at: read_i64(data, FIELDS_OFFSET + 1),
        updated_at: read_i64(data, FIELDS_OFFSET + 9),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn snapshot_bytes(owner: &Pubkey, score: u8, ts: i64) -> Vec<u8> {
        let mut data = account_discriminator("RiskSnapshot").to_vec();
        data.extend_from_slice(owner.as_ref());
        data.push(score);
        data.extend_from_slice(&ts.to_le_bytes());
        data
    }

    #[test]
    fn test_discriminator_matches_anchor() {
        // sha256("global:initialize")[..8], the value Anchor emits for `initialize`
        assert_eq!(
            instruction_discriminator("initialize"),
            [175, 175, 109, 31, 13, 152, 155, 237]
        );
        assert_ne!(
            instruction_discriminator("update_threshold"),
            instruction_discriminator("record_risk_score")
        );
    }

    #[test]
    fn test_record_risk_score_layout() {
        let program_id = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        let ix = record_risk_score_ix(&program_id, &user, 42, 1_700_000_000);

        assert_eq!(ix.data.len(), 8 + 1 + 8);
        assert_eq!(ix.data[8], 42);
        assert_eq!(&ix.data[9..], &1_700_000_000i64.to_le_bytes());

        assert_eq!(ix.accounts.len(), 4);
        assert_eq!(ix.accounts[0].pubkey, preference_address(&program_id, &user));
        assert!(ix.accounts[0].is_writable);
        assert_eq!(
            ix.accounts[1].pubkey,
            snapshot_address(&program_id, &user, 1_700_000_000)
        );
        assert!(ix.accounts[2].is_signer);
        assert_eq!(ix.accounts[3].pubkey, system_program::id());
    }

    #[test]
    fn test_snapshot_address_depends_on_timestamp() {
        let program_id = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        assert_ne!(
            snapshot_address(&program_id, &user, 1),
            snapshot_address(&program_id, &user, 2)
        );
    }

    #[test]
    fn test_threshold_bounds() {
        let program_id = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        assert!(initialize_preferences_ix(&program_id, &user, 100).is_ok());
        assert_matches!(
            update_threshold_ix(&program_id, &user, 101),
            Err(AppError::Validation { .. })
        );

        let ix = update_threshold_ix(&program_id, &user, 60).unwrap();
        assert_eq!(ix.accounts.len(), 2);
        assert_eq!(ix.data[8..], [60]);
    }

    #[test]
    fn test_decode_snapshot() {
        let owner = Pubkey::new_unique();
        let address = Pubkey::new_unique();
        let record = decode_snapshot(&address, &snapshot_bytes(&owner, 37, 1_700_000_123)).unwrap();

        assert_eq!(record.public_key, address.to_string());
        assert_eq!(record.risk_score, 37);
        assert_eq!(record.timestamp, 1_700_000_123);
    }

    #[test]
    fn test_decode_rejects_wrong_account() {
        let owner = Pubkey::new_unique();
        let mut data = snapshot_bytes(&owner, 1, 1);
        data[0] ^= 0xff;
        assert_matches!(decode_snapshot(&owner, &data), Err(AppError::Solana { .. }));
        assert_matches!(decode_snapshot(&owner, &data[..20]), Err(AppError::Solana { .. }));
    }

    #[test]
    fn test_decode_preference() {
        let owner = Pubkey::new_unique();
        let mut data = account_discriminator("RiskPreference").to_vec();
        data.extend_from_slice(owner.as_ref());
        data.push(60);
        data.extend_from_slice(&100i64.to_le_bytes());
        data.extend_from_slice(&200i64.to_le_bytes());
        // Trailing bump byte is ignored
        data.push(254);

        let record = decode_preference(&data).unwrap();
        assert_eq!(record.owner, owner.to_string());
        assert_eq!(record.threshold, 60);
        assert_eq!(record.created_at, 100);
        assert_eq!(record.updated_at, 200);
    }

    #[test]
    fn test_snapshot_filters() {
        let filters = snapshot_filters(&Pubkey::new_unique());
        assert_eq!(filters.len(), 2);
    }
}

/// PDA seeds
pub const EXTRA_ACCOUNT_METAS_SEED: &[u8] = b"extra-account-metas";
pub const DELEGATE_SEED: &[u8] = b"delegate";
pub const AUTHORITY_SEED: &[u8] = b"authority";

/// Accounts Token-2022 always passes to Execute before the extra accounts:
/// source, mint, destination, owner, extra account meta list.
pub const BASE_ACCOUNT_COUNT: usize = 5;
pub const OWNER_INDEX: u8 = 3;

/// Absolute positions of the extra accounts in the Execute account list.
pub const WSOL_MINT_INDEX: u8 = 5;
pub const TOKEN_PROGRAM_INDEX: u8 = 6;
pub const ASSOCIATED_TOKEN_PROGRAM_INDEX: u8 = 7;
pub const DELEGATE_INDEX: u8 = 8;
pub const CUSTODY_INDEX: u8 = 9;
pub const SENDER_WSOL_INDEX: u8 = 10;

/// Number of extra accounts in the metadata record.
pub const EXTRA_ACCOUNT_COUNT: usize = 6;

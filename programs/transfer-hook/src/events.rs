use anchor_lang::prelude::*;

#[event]
pub struct ExtraAccountMetaListInitialized {
    pub mint: Pubkey,
    pub extra_account_meta_list: Pubkey,
    pub descriptor_count: u8,
    pub payer: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct AuthorityInitialized {
    pub authority_pda: Pubkey,
    pub authority: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct TransferApproved {
    pub mint: Pubkey,
    pub source: Pubkey,
    pub destination: Pubkey,
    pub amount: u64,
    pub custody: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct DelegateFundsWithdrawn {
    pub custody: Pubkey,
    pub recipient: Pubkey,
    pub amount: u64,
    pub custody_balance: u64,
    pub timestamp: i64,
}

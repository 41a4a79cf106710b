//! Program-derived addresses used by the hook.
//!
//! The delegate PDA has no private key; the program signs for it with
//! `DELEGATE_SEED` and the canonical bump, so every debit from custody has to
//! go through this program.

use anchor_lang::prelude::*;
use anchor_spl::associated_token::get_associated_token_address;
use anchor_spl::token::spl_token::native_mint;

use crate::constants::*;

pub fn delegate_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[DELEGATE_SEED], program_id)
}

pub fn authority_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[AUTHORITY_SEED], program_id)
}

pub fn extra_account_metas_address(mint: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[EXTRA_ACCOUNT_METAS_SEED, mint.as_ref()], program_id)
}

/// wSOL associated token account of `owner` under the legacy token program.
pub fn wsol_account(owner: &Pubkey) -> Pubkey {
    get_associated_token_address(owner, &native_mint::ID)
}

/// Custody account: the delegate PDA's wSOL associated token account.
pub fn custody_address(program_id: &Pubkey) -> Pubkey {
    wsol_account(&delegate_address(program_id).0)
}

//! Delegate custody and the withdrawal authority check.

use anchor_lang::prelude::*;
use anchor_spl::token::spl_token::native_mint;
use anchor_spl::{associated_token, token};

use crate::constants::DELEGATE_SEED;
use crate::error::HookError;
use crate::pda;
use crate::store::KnownAddresses;

/// Proof that the program may sign for the delegate PDA. Only obtainable by
/// deriving the address, so holding one means the seeds are canonical.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelegateAuthority {
    pub address: Pubkey,
    /// The delegate's wSOL associated token account
    pub custody: Pubkey,
    bump: [u8; 1],
}

impl DelegateAuthority {
    pub fn derive(program_id: &Pubkey) -> Self {
        let (address, bump) = pda::delegate_address(program_id);
        Self {
            address,
            custody: pda::wsol_account(&address),
            bump: [bump],
        }
    }

    pub fn signer_seeds(&self) -> [&[u8]; 2] {
        [DELEGATE_SEED, &self.bump]
    }

    /// The delegate and custody addresses, keyed the way the metadata record
    /// derives them.
    pub fn known_addresses(&self, program_id: &Pubkey) -> KnownAddresses {
        let mut known = KnownAddresses::default();
        known.insert(program_id, &[DELEGATE_SEED], self.address);
        known.insert(
            &associated_token::ID,
            &[
                self.address.as_ref(),
                token::ID.as_ref(),
                native_mint::ID.as_ref(),
            ],
            self.custody,
        );
        known
    }
}

pub fn check_authority(
    authority: &Pubkey,
    requested_by: &Pubkey,
) -> core::result::Result<(), HookError> {
    if requested_by != authority {
        return Err(HookError::Unauthorized);
    }
    Ok(())
}

/// Everything the withdrawal check looks at, read from the loaded accounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WithdrawalRequest {
    pub requested_by: Pubkey,
    pub amount: u64,
    pub delegate: Pubkey,
    pub custody: Pubkey,
    pub custody_owner: Pubkey,
    pub custody_mint: Pubkey,
    pub custody_balance: u64,
    pub payment_mint: Pubkey,
    pub recipient_account: Pubkey,
}

/// Checks, in order: the caller is the recorded authority, the delegate and
/// custody accounts are the program-derived ones, custody covers `amount`.
pub fn authorize_withdrawal(
    authority: &Pubkey,
    request: &WithdrawalRequest,
    program_id: &Pubkey,
) -> core::result::Result<DelegateAuthority, HookError> {
    check_authority(authority, &request.requested_by)?;

    let delegate = DelegateAuthority::derive(program_id);
    if request.delegate != delegate.address
        || request.custody_owner != delegate.address
        || request.custody != delegate.custody
        || request.custody_mint != native_mint::ID
        || request.payment_mint != native_mint::ID
        || request.recipient_account == request.custody
    {
        return Err(HookError::InvalidAccount);
    }

    if request.amount > request.custody_balance {
        return Err(HookError::InsufficientFunds);
    }

    Ok(delegate)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub custody_balance: u64,
    pub recipient_balance: u64,
}

/// Balances both accounts must hold after moving `amount` out of custody.
pub fn settle(
    custody_balance: u64,
    recipient_balance: u64,
    amount: u64,
) -> core::result::Result<Settlement, HookError> {
    Ok(Settlement {
        custody_balance: custody_balance
            .checked_sub(amount)
            .ok_or(HookError::InsufficientFunds)?,
        recipient_balance: recipient_balance
            .checked_add(amount)
            .ok_or(HookError::MathOverflow)?,
    })
}

pub fn verify_settlement(
    expected: &Settlement,
    custody_balance: u64,
    recipient_balance: u64,
) -> core::result::Result<(), HookError> {
    if expected.custody_balance != custody_balance
        || expected.recipient_balance != recipient_balance
    {
        return Err(HookError::BalanceMismatch);
    }
    Ok(())
}

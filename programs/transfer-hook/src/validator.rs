//! Transfer-hook validation.
//!
//! `validate` is a pure function of the transfer intent, the accounts
//! Token-2022 handed to Execute and the stored descriptor list. It keeps no
//! state between calls; the Execute handler re-reads the record every time.

use anchor_lang::prelude::*;

use crate::constants::BASE_ACCOUNT_COUNT;
use crate::custody::DelegateAuthority;
use crate::error::HookError;
use crate::store::AccountDescriptor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuppliedAccount {
    pub key: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl<'info> From<&AccountInfo<'info>> for SuppliedAccount {
    fn from(info: &AccountInfo<'info>) -> Self {
        Self {
            key: *info.key,
            is_signer: info.is_signer,
            is_writable: info.is_writable,
        }
    }
}

/// wSOL moved into custody alongside the token transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaymentIntent {
    pub destination: Pubkey,
    pub amount: u64,
    /// Delegate approved on the sender's wSOL account
    pub approved_delegate: Option<Pubkey>,
    pub delegated_amount: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferIntent {
    pub mint: Pubkey,
    pub source_mint: Pubkey,
    pub destination_mint: Pubkey,
    pub amount: u64,
    pub payment: Option<PaymentIntent>,
}

#[derive(Debug)]
pub enum Decision {
    Approved,
    Rejected(HookError),
}

impl Decision {
    pub fn is_approved(&self) -> bool {
        matches!(self, Decision::Approved)
    }
}

/// Decide a hooked transfer. `supplied` is the full Execute account list,
/// base accounts first.
pub fn validate(
    intent: &TransferIntent,
    supplied: &[SuppliedAccount],
    record: &[AccountDescriptor],
    program_id: &Pubkey,
) -> Decision {
    let delegate = DelegateAuthority::derive(program_id);
    validate_with_delegate(intent, supplied, record, program_id, &delegate)
}

/// `validate` for a caller that already derived the delegate.
pub fn validate_with_delegate(
    intent: &TransferIntent,
    supplied: &[SuppliedAccount],
    record: &[AccountDescriptor],
    program_id: &Pubkey,
    delegate: &DelegateAuthority,
) -> Decision {
    match check(intent, supplied, record, program_id, delegate) {
        Ok(()) => Decision::Approved,
        Err(reason) => Decision::Rejected(reason),
    }
}

fn check(
    intent: &TransferIntent,
    supplied: &[SuppliedAccount],
    record: &[AccountDescriptor],
    program_id: &Pubkey,
    delegate: &DelegateAuthority,
) -> core::result::Result<(), HookError> {
    check_accounts(supplied, record, program_id, delegate)?;

    if intent.source_mint != intent.mint || intent.destination_mint != intent.mint {
        return Err(HookError::MintMismatch);
    }

    check_payment(intent, delegate)
}

fn check_accounts(
    supplied: &[SuppliedAccount],
    record: &[AccountDescriptor],
    program_id: &Pubkey,
    delegate: &DelegateAuthority,
) -> core::result::Result<(), HookError> {
    let extras = supplied.get(BASE_ACCOUNT_COUNT..).unwrap_or_default();
    if extras.len() != record.len() {
        return Err(HookError::AccountMismatch);
    }

    let known = delegate.known_addresses(program_id);
    let keys: Vec<Pubkey> = supplied.iter().map(|account| account.key).collect();
    for (descriptor, account) in record.iter().zip(extras) {
        let expected = descriptor
            .resolve_with(&keys, program_id, &known)
            .ok_or(HookError::AccountMismatch)?;
        if expected != account.key
            || descriptor.is_signer != account.is_signer
            || descriptor.is_writable != account.is_writable
        {
            return Err(HookError::AccountMismatch);
        }
    }
    Ok(())
}

fn check_payment(
    intent: &TransferIntent,
    delegate: &DelegateAuthority,
) -> core::result::Result<(), HookError> {
    let payment = intent.payment.ok_or(HookError::PaymentMismatch)?;

    if payment.destination != delegate.custody
        || payment.amount != intent.amount
        || payment.approved_delegate != Some(delegate.address)
        || payment.delegated_amount < payment.amount
    {
        return Err(HookError::PaymentMismatch);
    }
    Ok(())
}

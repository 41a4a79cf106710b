use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::invoke_signed;
use anchor_spl::token::spl_token::native_mint;
use anchor_spl::token_interface::{Mint, TokenAccount};
use spl_token_2022::{
    extension::{transfer_hook::TransferHookAccount, BaseStateWithExtensions, StateWithExtensions},
    instruction as token_instruction,
    state::Account as SplAccount,
};

use crate::constants::*;
use crate::custody::DelegateAuthority;
use crate::error::HookError;
use crate::events::TransferApproved;
use crate::store;
use crate::validator::{self, Decision, PaymentIntent, SuppliedAccount, TransferIntent};

/// Base accounts of the transfer-hook `Execute` instruction. The extra
/// accounts described by the metadata record arrive as remaining accounts
/// so that a short or reordered list is reported as a mismatch rather than
/// failing account deserialization.
#[derive(Accounts)]
pub struct TransferHook<'info> {
    pub source_token: InterfaceAccount<'info, TokenAccount>,

    pub mint: InterfaceAccount<'info, Mint>,

    pub destination_token: InterfaceAccount<'info, TokenAccount>,

    /// CHECK: owner or delegate of the source token account
    pub owner: UncheckedAccount<'info>,

    /// CHECK: ExtraAccountMetaList PDA, decoded in the handler.
    /// Seeds: ["extra-account-metas", mint]
    #[account(
        seeds = [EXTRA_ACCOUNT_METAS_SEED, mint.key().as_ref()],
        bump,
    )]
    pub extra_account_meta_list: UncheckedAccount<'info>,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, TransferHook<'info>>,
    amount: u64,
) -> Result<()> {
    // ── 1. Only reachable from inside a Token-2022 transfer ────────────
    check_is_transferring(&ctx.accounts.source_token.to_account_info())?;

    // ── 2. Load the descriptor list for this mint ──────────────────────
    let record = {
        let data = ctx.accounts.extra_account_meta_list.try_borrow_data()?;
        store::read_record(&data)?
    };

    // ── 3. Decide ──────────────────────────────────────────────────────
    let base = [
        ctx.accounts.source_token.to_account_info(),
        ctx.accounts.mint.to_account_info(),
        ctx.accounts.destination_token.to_account_info(),
        ctx.accounts.owner.to_account_info(),
        ctx.accounts.extra_account_meta_list.to_account_info(),
    ];
    let supplied: Vec<SuppliedAccount> = base
        .iter()
        .chain(ctx.remaining_accounts.iter())
        .map(SuppliedAccount::from)
        .collect();

    let intent = TransferIntent {
        mint: ctx.accounts.mint.key(),
        source_mint: ctx.accounts.source_token.mint,
        destination_mint: ctx.accounts.destination_token.mint,
        amount,
        payment: read_payment(ctx.remaining_accounts, amount)?,
    };

    let delegate_authority = DelegateAuthority::derive(ctx.program_id);
    if let Decision::Rejected(reason) = validator::validate_with_delegate(
        &intent,
        &supplied,
        &record,
        ctx.program_id,
        &delegate_authority,
    ) {
        msg!("Transfer rejected: {:?}", reason);
        return Err(reason.into());
    }

    // ── 4. Move the payment into custody, delegate signs ───────────────
    let remaining = ctx.remaining_accounts;
    let wsol_mint = extra_account(remaining, WSOL_MINT_INDEX)?;
    let token_program = extra_account(remaining, TOKEN_PROGRAM_INDEX)?;
    let delegate = extra_account(remaining, DELEGATE_INDEX)?;
    let custody = extra_account(remaining, CUSTODY_INDEX)?;
    let sender_wsol = extra_account(remaining, SENDER_WSOL_INDEX)?;

    let signer_seeds = delegate_authority.signer_seeds();

    invoke_signed(
        &token_instruction::transfer_checked(
            token_program.key,
            sender_wsol.key,
            wsol_mint.key,
            custody.key,
            delegate.key,
            &[],
            amount,
            native_mint::DECIMALS,
        )?,
        &[
            sender_wsol.clone(),
            wsol_mint.clone(),
            custody.clone(),
            delegate.clone(),
            token_program.clone(),
        ],
        &[&signer_seeds[..]],
    )?;

    msg!("Transfer of {} approved, payment moved to custody {}", amount, custody.key);

    emit!(TransferApproved {
        mint: ctx.accounts.mint.key(),
        source: ctx.accounts.source_token.key(),
        destination: ctx.accounts.destination_token.key(),
        amount,
        custody: *custody.key,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}

fn check_is_transferring(source_token: &AccountInfo) -> Result<()> {
    let data = source_token.try_borrow_data()?;
    let account = StateWithExtensions::<SplAccount>::unpack(&data)?;
    let extension = account
        .get_extension::<TransferHookAccount>()
        .map_err(|_| HookError::NotTransferring)?;

    require!(
        bool::from(extension.transferring),
        HookError::NotTransferring
    );
    Ok(())
}

/// Reads the sender's wSOL account. `None` when it is missing or is not a
/// token account, which the validator reports as a payment mismatch.
fn read_payment(remaining: &[AccountInfo], amount: u64) -> Result<Option<PaymentIntent>> {
    let (Ok(custody), Ok(sender_wsol)) = (
        extra_account(remaining, CUSTODY_INDEX),
        extra_account(remaining, SENDER_WSOL_INDEX),
    ) else {
        return Ok(None);
    };

    if sender_wsol.owner != &anchor_spl::token::ID {
        return Ok(None);
    }

    let data = sender_wsol.try_borrow_data()?;
    let Ok(account) = StateWithExtensions::<SplAccount>::unpack(&data) else {
        return Ok(None);
    };
    if account.base.mint != native_mint::ID {
        return Ok(None);
    }

    Ok(Some(PaymentIntent {
        destination: *custody.key,
        amount,
        approved_delegate: Option::from(account.base.delegate),
        delegated_amount: account.base.delegated_amount,
    }))
}

/// Extra account at absolute Execute index `index`.
fn extra_account<'a, 'info>(
    remaining: &'a [AccountInfo<'info>],
    index: u8,
) -> Result<&'a AccountInfo<'info>> {
    usize::from(index)
        .checked_sub(BASE_ACCOUNT_COUNT)
        .and_then(|i| remaining.get(i))
        .ok_or_else(|| error!(HookError::AccountMismatch))
}

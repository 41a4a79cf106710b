use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::invoke_signed;
use anchor_spl::token_interface::TokenInterface;
use spl_token_2022::{
    extension::StateWithExtensions,
    instruction as token_instruction,
    state::{Account as SplAccount, Mint as MintState},
};

use crate::constants::*;
use crate::custody::{self, WithdrawalRequest};
use crate::error::HookError;
use crate::events::DelegateFundsWithdrawn;
use crate::state::AuthorityPda;

#[derive(Accounts)]
pub struct WithdrawDelegateFunds<'info> {
    pub recipient: Signer<'info>,

    #[account(
        seeds = [AUTHORITY_SEED],
        bump = authority_pda.bump,
    )]
    pub authority_pda: Account<'info, AuthorityPda>,

    /// CHECK: delegate PDA, compared against the derived address in the handler
    pub delegate: UncheckedAccount<'info>,

    /// CHECK: custody, the delegate's wSOL associated token account.
    /// Unpacked in the handler once the caller is known to be the authority.
    #[account(mut)]
    pub delegate_wsol_token_account: UncheckedAccount<'info>,

    /// CHECK: recipient wSOL token account, unpacked in the handler
    #[account(mut)]
    pub recipient_wsol_token_account: UncheckedAccount<'info>,

    /// CHECK: wSOL mint, unpacked in the handler
    pub wsol_mint: UncheckedAccount<'info>,

    pub token_program: Interface<'info, TokenInterface>,
}

pub fn handler(ctx: Context<WithdrawDelegateFunds>, amount: u64) -> Result<()> {
    // ── 1. Only the recorded authority gets past here ──────────────────
    custody::check_authority(
        &ctx.accounts.authority_pda.authority,
        &ctx.accounts.recipient.key(),
    )?;

    // ── 2. Derived accounts and balance ────────────────────────────────
    let token_program = ctx.accounts.token_program.key();
    let custody_account = &ctx.accounts.delegate_wsol_token_account;
    let recipient_account = &ctx.accounts.recipient_wsol_token_account;

    let custody_state = read_token_account(custody_account, &token_program)?;
    let recipient_state = read_token_account(recipient_account, &token_program)?;
    let decimals = read_mint_decimals(&ctx.accounts.wsol_mint, &token_program)?;

    let request = WithdrawalRequest {
        requested_by: ctx.accounts.recipient.key(),
        amount,
        delegate: ctx.accounts.delegate.key(),
        custody: custody_account.key(),
        custody_owner: custody_state.owner,
        custody_mint: custody_state.mint,
        custody_balance: custody_state.amount,
        payment_mint: ctx.accounts.wsol_mint.key(),
        recipient_account: recipient_account.key(),
    };

    let delegate = custody::authorize_withdrawal(
        &ctx.accounts.authority_pda.authority,
        &request,
        ctx.program_id,
    )?;
    let expected = custody::settle(custody_state.amount, recipient_state.amount, amount)?;

    // ── 3. Transfer out of custody, delegate PDA signs ─────────────────
    let signer_seeds = delegate.signer_seeds();
    invoke_signed(
        &token_instruction::transfer_checked(
            &token_program,
            custody_account.key,
            ctx.accounts.wsol_mint.key,
            recipient_account.key,
            &delegate.address,
            &[],
            amount,
            decimals,
        )?,
        &[
            custody_account.to_account_info(),
            ctx.accounts.wsol_mint.to_account_info(),
            recipient_account.to_account_info(),
            ctx.accounts.delegate.to_account_info(),
            ctx.accounts.token_program.to_account_info(),
        ],
        &[&signer_seeds[..]],
    )?;

    // ── 4. Funds are conserved ─────────────────────────────────────────
    let custody_after = read_token_account(custody_account, &token_program)?;
    let recipient_after = read_token_account(recipient_account, &token_program)?;
    custody::verify_settlement(&expected, custody_after.amount, recipient_after.amount)?;

    msg!("Withdrew {} from custody to {}", amount, recipient_account.key());

    emit!(DelegateFundsWithdrawn {
        custody: custody_account.key(),
        recipient: ctx.accounts.recipient.key(),
        amount,
        custody_balance: custody_after.amount,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}

fn read_token_account(info: &AccountInfo, token_program: &Pubkey) -> Result<SplAccount> {
    require_keys_eq!(*info.owner, *token_program, HookError::InvalidAccount);
    let data = info.try_borrow_data()?;
    let account = StateWithExtensions::<SplAccount>::unpack(&data)
        .map_err(|_| HookError::InvalidAccount)?;
    Ok(account.base)
}

fn read_mint_decimals(info: &AccountInfo, token_program: &Pubkey) -> Result<u8> {
    require_keys_eq!(*info.owner, *token_program, HookError::InvalidAccount);
    let data = info.try_borrow_data()?;
    let mint = StateWithExtensions::<MintState>::unpack(&data)
        .map_err(|_| HookError::InvalidAccount)?;
    Ok(mint.base.decimals)
}

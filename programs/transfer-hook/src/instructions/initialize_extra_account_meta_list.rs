use anchor_lang::prelude::*;
use anchor_lang::system_program::{create_account, CreateAccount};
use anchor_spl::token_interface::Mint;
use spl_token_2022::{
    extension::{transfer_hook::TransferHook, BaseStateWithExtensions, StateWithExtensions},
    state::Mint as MintState,
};

use crate::constants::*;
use crate::error::HookError;
use crate::events::{AuthorityInitialized, ExtraAccountMetaListInitialized};
use crate::state::AuthorityPda;
use crate::store;

#[derive(Accounts)]
pub struct InitializeExtraAccountMetaList<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,

    /// CHECK: ExtraAccountMetaList PDA, created and written in the handler.
    /// Seeds: ["extra-account-metas", mint]
    #[account(
        mut,
        seeds = [EXTRA_ACCOUNT_METAS_SEED, mint.key().as_ref()],
        bump,
    )]
    pub extra_account_meta_list: UncheckedAccount<'info>,

    /// Token-2022 mint whose transfer hook must point at this program
    pub mint: InterfaceAccount<'info, Mint>,

    /// The first payer to initialize any mint becomes the withdrawal authority
    #[account(
        init_if_needed,
        payer = payer,
        space = AuthorityPda::LEN,
        seeds = [AUTHORITY_SEED],
        bump,
    )]
    pub authority_pda: Account<'info, AuthorityPda>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitializeExtraAccountMetaList>) -> Result<()> {
    // ── 1. One record per mint ─────────────────────────────────────────
    require!(
        ctx.accounts.extra_account_meta_list.data_is_empty(),
        HookError::AlreadyInitialized
    );

    // ── 2. Mint must carry a hook pointing here ────────────────────────
    let hook_program = mint_hook_program(&ctx.accounts.mint.to_account_info())?;
    store::check_hook_program(hook_program, ctx.program_id)?;

    // ── 3. Create the record PDA ───────────────────────────────────────
    let descriptors = store::hook_descriptors();
    let account_size = store::record_size(descriptors.len())?;
    let lamports = Rent::get()?.minimum_balance(account_size);

    let mint_key = ctx.accounts.mint.key();
    let signer_seeds: &[&[&[u8]]] = &[&[
        EXTRA_ACCOUNT_METAS_SEED,
        mint_key.as_ref(),
        &[ctx.bumps.extra_account_meta_list],
    ]];

    create_account(
        CpiContext::new(
            ctx.accounts.system_program.to_account_info(),
            CreateAccount {
                from: ctx.accounts.payer.to_account_info(),
                to: ctx.accounts.extra_account_meta_list.to_account_info(),
            },
        )
        .with_signer(signer_seeds),
        lamports,
        account_size as u64,
        ctx.program_id,
    )?;

    // ── 4. Write the descriptor list ───────────────────────────────────
    store::initialize_record(
        &mut ctx.accounts.extra_account_meta_list.try_borrow_mut_data()?,
        &descriptors,
    )?;

    let timestamp = Clock::get()?.unix_timestamp;
    let payer = ctx.accounts.payer.key();

    // ── 5. Record the withdrawal authority once ────────────────────────
    let authority_pda = &mut ctx.accounts.authority_pda;
    if !authority_pda.is_set() {
        authority_pda.authority = payer;
        authority_pda.bump = ctx.bumps.authority_pda;

        emit!(AuthorityInitialized {
            authority_pda: authority_pda.key(),
            authority: payer,
            timestamp,
        });
    }

    msg!(
        "Initialized ExtraAccountMetaList for mint {} with {} extra account(s)",
        mint_key,
        descriptors.len()
    );

    emit!(ExtraAccountMetaListInitialized {
        mint: mint_key,
        extra_account_meta_list: ctx.accounts.extra_account_meta_list.key(),
        descriptor_count: descriptors.len() as u8,
        payer,
        timestamp,
    });

    Ok(())
}

fn mint_hook_program(mint: &AccountInfo) -> Result<Option<Pubkey>> {
    let mint_data = mint.try_borrow_data()?;
    let hook_program = StateWithExtensions::<MintState>::unpack(&mint_data)
        .ok()
        .and_then(|state| {
            let hook = state.get_extension::<TransferHook>().ok()?;
            Option::<Pubkey>::from(hook.program_id)
        });
    Ok(hook_program)
}

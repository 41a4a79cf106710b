use anchor_lang::prelude::*;
use spl_transfer_hook_interface::instruction::TransferHookInstruction;

pub mod constants;
pub mod custody;
pub mod error;
pub mod events;
pub mod instructions;
pub mod pda;
pub mod state;
pub mod store;
pub mod validator;


use instructions::*;

declare_id!("EwYeaN1qHzQBB7iQhbnEQGpFwun5fcju7nE49mXsQ38o");

#[program]
pub mod transfer_hook {
    use super::*;

    /// Create the ExtraAccountMetaList PDA for a mint and, on first use,
    /// record the payer as the withdrawal authority.
    pub fn initialize_extra_account_meta_list(
        ctx: Context<InitializeExtraAccountMetaList>,
    ) -> Result<()> {
        instructions::initialize_extra_account_meta_list::handler(ctx)
    }

    /// Validate a hooked transfer and move its payment into custody.
    pub fn transfer_hook<'info>(
        ctx: Context<'_, '_, 'info, 'info, TransferHook<'info>>,
        amount: u64,
    ) -> Result<()> {
        instructions::execute::handler(ctx, amount)
    }

    /// Authority-only transfer out of the delegate's custody account.
    pub fn withdraw_delegate_funds(
        ctx: Context<WithdrawDelegateFunds>,
        amount: u64,
    ) -> Result<()> {
        instructions::withdraw_delegate_funds::handler(ctx, amount)
    }

    /// Fallback instruction handler: catches the SPL Transfer Hook `Execute`
    /// instruction that Token-2022 CPIs on every transfer and routes it to
    /// `transfer_hook`.
    pub fn fallback<'info>(
        program_id: &Pubkey,
        accounts: &'info [AccountInfo<'info>],
        data: &[u8],
    ) -> Result<()> {
        match TransferHookInstruction::unpack(data)? {
            TransferHookInstruction::Execute { amount } => {
                let amount_bytes = amount.to_le_bytes();
                __private::__global::transfer_hook(program_id, accounts, &amount_bytes)
            }
            _ => Err(ProgramError::InvalidInstructionData.into()),
        }
    }
}

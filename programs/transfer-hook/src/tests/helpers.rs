use std::path::PathBuf;

use anchor_lang::{
    prelude::{msg, Pubkey},
    solana_program::{
        instruction::{AccountMeta, Instruction},
        program_option::COption,
        program_pack::Pack,
        system_instruction, system_program,
    },
    AccountDeserialize, InstructionData, ToAccountMetas,
};
use anchor_spl::token::spl_token::{self, native_mint};
use litesvm::LiteSVM;
use solana_sdk::{
    account::Account,
    message::Message,
    native_token::LAMPORTS_PER_SOL,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use spl_associated_token_account::get_associated_token_address_with_program_id;
use spl_token_2022::{
    extension::{transfer_hook, ExtensionType, StateWithExtensions},
    state::{Account as TokenAccountState, Mint as MintState},
};

use crate::pda;
use crate::state::AuthorityPda;

pub static PROGRAM_ID: Pubkey = crate::ID;

pub const DECIMALS: u8 = 9;
pub const ONE_TOKEN: u64 = 1_000_000_000;

// ===================== PDA Derivations =====================

pub fn get_extra_account_meta_list_pda(mint: &Pubkey) -> Pubkey {
    pda::extra_account_metas_address(mint, &PROGRAM_ID).0
}

pub fn get_delegate_pda() -> Pubkey {
    pda::delegate_address(&PROGRAM_ID).0
}

pub fn get_authority_pda() -> Pubkey {
    pda::authority_address(&PROGRAM_ID).0
}

pub fn get_custody() -> Pubkey {
    pda::custody_address(&PROGRAM_ID)
}

pub fn get_wsol_ata(owner: &Pubkey) -> Pubkey {
    pda::wsol_account(owner)
}

pub fn get_token_ata(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address_with_program_id(owner, mint, &spl_token_2022::ID)
}

// ===================== SVM Setup =====================

fn program_so_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/deploy/transfer_hook.so")
}

/// Fresh SVM with the program loaded and a funded admin. `None` until the
/// program has been built for SBF (`anchor build`).
pub fn setup() -> Option<(LiteSVM, Keypair)> {
    let Ok(program_data) = std::fs::read(program_so_path()) else {
        msg!("{} not built, skipping", program_so_path().display());
        return None;
    };

    let mut svm = LiteSVM::new();
    let _ = svm.add_program(PROGRAM_ID, &program_data);
    ensure_native_mint(&mut svm);

    let admin = Keypair::new();
    svm.airdrop(&admin.pubkey(), 100 * LAMPORTS_PER_SOL)
        .expect("Failed to airdrop");

    Some((svm, admin))
}

fn ensure_native_mint(svm: &mut LiteSVM) {
    if svm.get_account(&native_mint::ID).is_some() {
        return;
    }

    let mut data = vec![0u8; spl_token::state::Mint::LEN];
    spl_token::state::Mint {
        mint_authority: COption::None,
        supply: 0,
        decimals: native_mint::DECIMALS,
        is_initialized: true,
        freeze_authority: COption::None,
    }
    .pack_into_slice(&mut data);

    let lamports = svm.minimum_balance_for_rent_exemption(data.len());
    let _ = svm.set_account(
        native_mint::ID,
        Account {
            lamports,
            data,
            owner: spl_token::ID,
            executable: false,
            rent_epoch: 0,
        },
    );
}

pub fn funded_wallet(svm: &mut LiteSVM) -> Keypair {
    let wallet = Keypair::new();
    svm.airdrop(&wallet.pubkey(), 10 * LAMPORTS_PER_SOL)
        .expect("Failed to airdrop");
    wallet
}

/// Hook-enabled mint with an admin-owned source account holding 100 tokens
/// and an empty destination account.
pub struct HookedMint {
    pub mint: Pubkey,
    pub source: Pubkey,
    pub destination: Pubkey,
}

/// Mirrors the client flow: wSOL accounts for the sender and the delegate,
/// hook mint, token accounts, 100 tokens to the sender, metadata record.
pub fn full_setup(svm: &mut LiteSVM, admin: &Keypair) -> HookedMint {
    create_ata(svm, admin, &admin.pubkey(), &native_mint::ID, &spl_token::ID);
    create_ata(svm, admin, &get_delegate_pda(), &native_mint::ID, &spl_token::ID);

    let mint = Keypair::new();
    create_hook_mint(svm, admin, &mint, Some(PROGRAM_ID)).expect("Failed to create mint");
    let mint = mint.pubkey();

    let recipient = Pubkey::new_unique();
    let source = create_ata(svm, admin, &admin.pubkey(), &mint, &spl_token_2022::ID);
    let destination = create_ata(svm, admin, &recipient, &mint, &spl_token_2022::ID);
    mint_tokens(svm, admin, &mint, &source, 100 * ONE_TOKEN);

    do_init_extra_account_meta(svm, admin, &mint).expect("InitExtraAccountMeta failed");

    HookedMint {
        mint,
        source,
        destination,
    }
}

// ===================== Instruction Builders =====================

pub fn send(
    svm: &mut LiteSVM,
    instructions: &[Instruction],
    payer: &Keypair,
    signers: &[&Keypair],
) -> Result<(), String> {
    svm.expire_blockhash();
    let msg = Message::new(instructions, Some(&payer.pubkey()));
    let tx = Transaction::new(&signers.to_vec(), msg, svm.latest_blockhash());
    svm.send_transaction(tx)
        .map(|_| ())
        .map_err(|e| e.meta.logs.join("\n"))
}

/// Token-2022 mint with the TransferHook extension. `hook_program` of `None`
/// creates a plain mint without the extension.
pub fn create_hook_mint(
    svm: &mut LiteSVM,
    payer: &Keypair,
    mint: &Keypair,
    hook_program: Option<Pubkey>,
) -> Result<(), String> {
    let extensions: &[ExtensionType] = if hook_program.is_some() {
        &[ExtensionType::TransferHook]
    } else {
        &[]
    };
    let space = ExtensionType::try_calculate_account_len::<MintState>(extensions).unwrap();
    let lamports = svm.minimum_balance_for_rent_exemption(space);

    let mut instructions = vec![system_instruction::create_account(
        &payer.pubkey(),
        &mint.pubkey(),
        lamports,
        space as u64,
        &spl_token_2022::ID,
    )];
    if let Some(hook_program) = hook_program {
        instructions.push(
            transfer_hook::instruction::initialize(
                &spl_token_2022::ID,
                &mint.pubkey(),
                Some(payer.pubkey()),
                Some(hook_program),
            )
            .unwrap(),
        );
    }
    instructions.push(
        spl_token_2022::instruction::initialize_mint2(
            &spl_token_2022::ID,
            &mint.pubkey(),
            &payer.pubkey(),
            None,
            DECIMALS,
        )
        .unwrap(),
    );

    send(svm, &instructions, payer, &[payer, mint])
}

pub fn create_ata(
    svm: &mut LiteSVM,
    payer: &Keypair,
    owner: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Pubkey {
    let ix = spl_associated_token_account::instruction::create_associated_token_account(
        &payer.pubkey(),
        owner,
        mint,
        token_program,
    );
    send(svm, &[ix], payer, &[payer]).expect("Failed to create ATA");

    get_associated_token_address_with_program_id(owner, mint, token_program)
}

pub fn mint_tokens(
    svm: &mut LiteSVM,
    authority: &Keypair,
    mint: &Pubkey,
    destination: &Pubkey,
    amount: u64,
) {
    let ix = spl_token_2022::instruction::mint_to(
        &spl_token_2022::ID,
        mint,
        destination,
        &authority.pubkey(),
        &[],
        amount,
    )
    .unwrap();
    send(svm, &[ix], authority, &[authority]).expect("Failed to mint tokens");
}

pub fn do_init_extra_account_meta(
    svm: &mut LiteSVM,
    payer: &Keypair,
    mint: &Pubkey,
) -> Result<(), String> {
    let ix = Instruction {
        program_id: PROGRAM_ID,
        accounts: crate::accounts::InitializeExtraAccountMetaList {
            payer: payer.pubkey(),
            extra_account_meta_list: get_extra_account_meta_list_pda(mint),
            mint: *mint,
            authority_pda: get_authority_pda(),
            system_program: system_program::ID,
        }
        .to_account_metas(None),
        data: crate::instruction::InitializeExtraAccountMetaList {}.data(),
    };

    send(svm, &[ix], payer, &[payer])
}

/// The extra accounts a client resolves from the metadata record, followed
/// by the hook program and the record itself.
pub fn hook_accounts(owner: &Pubkey, mint: &Pubkey) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new_readonly(native_mint::ID, false),
        AccountMeta::new_readonly(spl_token::ID, false),
        AccountMeta::new_readonly(spl_associated_token_account::ID, false),
        AccountMeta::new_readonly(get_delegate_pda(), false),
        AccountMeta::new(get_custody(), false),
        AccountMeta::new(get_wsol_ata(owner), false),
        AccountMeta::new_readonly(PROGRAM_ID, false),
        AccountMeta::new_readonly(get_extra_account_meta_list_pda(mint), false),
    ]
}

pub fn build_transfer_checked_ix(
    source: &Pubkey,
    mint: &Pubkey,
    destination: &Pubkey,
    owner: &Pubkey,
    amount: u64,
) -> Instruction {
    let mut ix = spl_token_2022::instruction::transfer_checked(
        &spl_token_2022::ID,
        source,
        mint,
        destination,
        owner,
        &[],
        amount,
        DECIMALS,
    )
    .unwrap();
    ix.accounts.extend(hook_accounts(owner, mint));
    ix
}

/// Wrap `lamports` into the owner's wSOL account and approve the delegate
/// PDA for `allowance`.
pub fn build_payment_ixs(owner: &Pubkey, lamports: u64, allowance: u64) -> Vec<Instruction> {
    let wsol = get_wsol_ata(owner);
    vec![
        system_instruction::transfer(owner, &wsol, lamports),
        spl_token::instruction::sync_native(&spl_token::ID, &wsol).unwrap(),
        spl_token::instruction::approve(
            &spl_token::ID,
            &wsol,
            &get_delegate_pda(),
            owner,
            &[],
            allowance,
        )
        .unwrap(),
    ]
}

/// Hooked transfer co-submitted with its wSOL payment, as a client does.
pub fn do_transfer(
    svm: &mut LiteSVM,
    owner: &Keypair,
    hooked: &HookedMint,
    amount: u64,
) -> Result<(), String> {
    let mut instructions = build_payment_ixs(&owner.pubkey(), amount, amount);
    instructions.push(build_transfer_checked_ix(
        &hooked.source,
        &hooked.mint,
        &hooked.destination,
        &owner.pubkey(),
        amount,
    ));
    send(svm, &instructions, owner, &[owner])
}

pub fn build_withdraw_ix(
    recipient: &Pubkey,
    custody: &Pubkey,
    recipient_wsol: &Pubkey,
    amount: u64,
) -> Instruction {
    Instruction {
        program_id: PROGRAM_ID,
        accounts: crate::accounts::WithdrawDelegateFunds {
            recipient: *recipient,
            authority_pda: get_authority_pda(),
            delegate: get_delegate_pda(),
            delegate_wsol_token_account: *custody,
            recipient_wsol_token_account: *recipient_wsol,
            wsol_mint: native_mint::ID,
            token_program: spl_token::ID,
        }
        .to_account_metas(None),
        data: crate::instruction::WithdrawDelegateFunds { amount }.data(),
    }
}

pub fn do_withdraw(svm: &mut LiteSVM, recipient: &Keypair, amount: u64) -> Result<(), String> {
    let ix = build_withdraw_ix(
        &recipient.pubkey(),
        &get_custody(),
        &get_wsol_ata(&recipient.pubkey()),
        amount,
    );
    send(svm, &[ix], recipient, &[recipient])
}

// ===================== State =====================

pub fn get_token_balance(svm: &LiteSVM, account: &Pubkey) -> u64 {
    let acct = svm.get_account(account).expect("Token account not found");
    let state = StateWithExtensions::<TokenAccountState>::unpack(&acct.data)
        .expect("Failed to unpack token account");
    state.base.amount
}

pub fn get_authority(svm: &LiteSVM) -> AuthorityPda {
    let acct = svm.get_account(&get_authority_pda()).expect("Authority PDA not found");
    AuthorityPda::try_deserialize(&mut acct.data.as_ref()).unwrap()
}

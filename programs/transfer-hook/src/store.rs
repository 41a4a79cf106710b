//! Extra-account metadata record.
//!
//! The record is the standard `ExtraAccountMetaList` TLV entry keyed by the
//! Execute discriminator, so Token-2022 and off-chain clients resolve the same
//! accounts the validator expects. `AccountDescriptor` is the decoded form the
//! program works with.

use anchor_lang::prelude::*;
use anchor_spl::token::spl_token::native_mint;
use anchor_spl::{associated_token, token};
use spl_pod::primitives::PodBool;
use spl_tlv_account_resolution::{
    account::ExtraAccountMeta, seeds::Seed, state::ExtraAccountMetaList,
};
use spl_transfer_hook_interface::instruction::ExecuteInstruction;
use spl_type_length_value::state::TlvStateBorrowed;

use crate::constants::*;
use crate::error::HookError;

/// Discriminators >= this value mark a PDA of the program found at
/// `discriminator - EXTERNAL_PDA_FLAG` in the account list.
const EXTERNAL_PDA_FLAG: u8 = 1 << 7;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeedRule {
    Literal(Vec<u8>),
    /// Key of the account at this index of the Execute account list
    AccountKey(u8),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressRule {
    Fixed(Pubkey),
    /// PDA of this program
    ProgramPda(Vec<SeedRule>),
    /// PDA of the program whose key sits at `program_index`
    ExternalPda { program_index: u8, seeds: Vec<SeedRule> },
}

/// Addresses already derived during this invocation. Resolution looks here
/// before searching for a bump.
#[derive(Debug, Default)]
pub struct KnownAddresses(Vec<(Pubkey, Vec<Vec<u8>>, Pubkey)>);

impl KnownAddresses {
    pub fn insert(&mut self, program_id: &Pubkey, seeds: &[&[u8]], address: Pubkey) {
        let seeds = seeds.iter().map(|seed| seed.to_vec()).collect();
        self.0.push((*program_id, seeds, address));
    }

    fn find(&self, program_id: &Pubkey, seeds: &[&[u8]]) -> Option<Pubkey> {
        self.0
            .iter()
            .find(|(program, known, _)| {
                program == program_id
                    && known.len() == seeds.len()
                    && known.iter().zip(seeds).all(|(a, b)| a.as_slice() == *b)
            })
            .map(|(_, _, address)| *address)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountDescriptor {
    pub rule: AddressRule,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountDescriptor {
    pub fn fixed(address: Pubkey, is_signer: bool, is_writable: bool) -> Self {
        Self {
            rule: AddressRule::Fixed(address),
            is_signer,
            is_writable,
        }
    }

    /// Resolve the concrete address against the keys of an Execute account list.
    /// Returns `None` when a seed points past the end of `keys`.
    pub fn resolve(&self, keys: &[Pubkey], program_id: &Pubkey) -> Option<Pubkey> {
        self.resolve_with(keys, program_id, &KnownAddresses::default())
    }

    /// Like `resolve`, reusing any address in `known`.
    pub fn resolve_with(
        &self,
        keys: &[Pubkey],
        program_id: &Pubkey,
        known: &KnownAddresses,
    ) -> Option<Pubkey> {
        match &self.rule {
            AddressRule::Fixed(address) => Some(*address),
            AddressRule::ProgramPda(seeds) => derive(seeds, keys, program_id, known),
            AddressRule::ExternalPda {
                program_index,
                seeds,
            } => {
                let program = keys.get(*program_index as usize)?;
                derive(seeds, keys, program, known)
            }
        }
    }

    pub fn to_extra_account_meta(&self) -> Result<ExtraAccountMeta> {
        let meta = match &self.rule {
            AddressRule::Fixed(address) => {
                ExtraAccountMeta::new_with_pubkey(address, self.is_signer, self.is_writable)?
            }
            AddressRule::ProgramPda(seeds) => ExtraAccountMeta::new_with_seeds(
                &to_seeds(seeds),
                self.is_signer,
                self.is_writable,
            )?,
            AddressRule::ExternalPda {
                program_index,
                seeds,
            } => ExtraAccountMeta::new_external_pda_with_seeds(
                *program_index,
                &to_seeds(seeds),
                self.is_signer,
                self.is_writable,
            )?,
        };
        Ok(meta)
    }
}

impl TryFrom<&ExtraAccountMeta> for AccountDescriptor {
    type Error = HookError;

    fn try_from(meta: &ExtraAccountMeta) -> core::result::Result<Self, Self::Error> {
        let rule = match meta.discriminator {
            0 => AddressRule::Fixed(Pubkey::new_from_array(meta.address_config)),
            1 => AddressRule::ProgramPda(decode_seeds(&meta.address_config)?),
            discriminator if discriminator >= EXTERNAL_PDA_FLAG => AddressRule::ExternalPda {
                program_index: discriminator - EXTERNAL_PDA_FLAG,
                seeds: decode_seeds(&meta.address_config)?,
            },
            _ => return Err(HookError::NotFound),
        };

        Ok(Self {
            rule,
            is_signer: flag(meta.is_signer),
            is_writable: flag(meta.is_writable),
        })
    }
}

fn flag(value: PodBool) -> bool {
    value.into()
}

fn to_seeds(rules: &[SeedRule]) -> Vec<Seed> {
    rules
        .iter()
        .map(|rule| match rule {
            SeedRule::Literal(bytes) => Seed::Literal {
                bytes: bytes.clone(),
            },
            SeedRule::AccountKey(index) => Seed::AccountKey { index: *index },
        })
        .collect()
}

fn decode_seeds(address_config: &[u8; 32]) -> core::result::Result<Vec<SeedRule>, HookError> {
    let seeds = Seed::unpack_address_config(address_config).map_err(|_| HookError::NotFound)?;
    seeds
        .into_iter()
        .map(|seed| match seed {
            Seed::Literal { bytes } => Ok(SeedRule::Literal(bytes)),
            Seed::AccountKey { index } => Ok(SeedRule::AccountKey(index)),
            _ => Err(HookError::NotFound),
        })
        .collect()
}

fn derive(
    seeds: &[SeedRule],
    keys: &[Pubkey],
    program_id: &Pubkey,
    known: &KnownAddresses,
) -> Option<Pubkey> {
    let seeds = seeds
        .iter()
        .map(|seed| match seed {
            SeedRule::Literal(bytes) => Some(bytes.as_slice()),
            SeedRule::AccountKey(index) => keys
                .get(*index as usize)
                .map(|key: &Pubkey| -> &[u8] { key.as_ref() }),
        })
        .collect::<Option<Vec<&[u8]>>>()?;
    Some(
        known
            .find(program_id, &seeds)
            .unwrap_or_else(|| Pubkey::find_program_address(&seeds, program_id).0),
    )
}

/// wSOL associated token account of the account at `owner_index`.
fn wsol_ata(owner_index: u8) -> AccountDescriptor {
    AccountDescriptor {
        rule: AddressRule::ExternalPda {
            program_index: ASSOCIATED_TOKEN_PROGRAM_INDEX,
            seeds: vec![
                SeedRule::AccountKey(owner_index),
                SeedRule::AccountKey(TOKEN_PROGRAM_INDEX),
                SeedRule::AccountKey(WSOL_MINT_INDEX),
            ],
        },
        is_signer: false,
        is_writable: true,
    }
}

/// The extra accounts every hooked transfer must supply, starting at
/// `WSOL_MINT_INDEX`.
pub fn hook_descriptors() -> Vec<AccountDescriptor> {
    vec![
        AccountDescriptor::fixed(native_mint::ID, false, false),
        AccountDescriptor::fixed(token::ID, false, false),
        AccountDescriptor::fixed(associated_token::ID, false, false),
        AccountDescriptor {
            rule: AddressRule::ProgramPda(vec![SeedRule::Literal(DELEGATE_SEED.to_vec())]),
            is_signer: false,
            is_writable: false,
        },
        wsol_ata(DELEGATE_INDEX),
        wsol_ata(OWNER_INDEX),
    ]
}

pub fn record_size(descriptor_count: usize) -> Result<usize> {
    Ok(ExtraAccountMetaList::size_of(descriptor_count)?)
}

/// Read the descriptor list back from record data.
pub fn read_record(data: &[u8]) -> core::result::Result<Vec<AccountDescriptor>, HookError> {
    if data.is_empty() {
        return Err(HookError::NotFound);
    }
    let state = TlvStateBorrowed::unpack(data).map_err(|_| HookError::NotFound)?;
    let metas = ExtraAccountMetaList::unpack_with_tlv_state::<ExecuteInstruction>(&state)
        .map_err(|_| HookError::NotFound)?;
    metas.data().iter().map(AccountDescriptor::try_from).collect()
}

/// Write `descriptors` into freshly allocated record data. Never touches a
/// record that already decodes.
pub fn initialize_record(data: &mut [u8], descriptors: &[AccountDescriptor]) -> Result<()> {
    if read_record(data).is_ok() {
        return err!(HookError::AlreadyInitialized);
    }
    let metas = descriptors
        .iter()
        .map(AccountDescriptor::to_extra_account_meta)
        .collect::<Result<Vec<_>>>()?;
    ExtraAccountMetaList::init::<ExecuteInstruction>(data, &metas)?;
    Ok(())
}

/// The mint's transfer hook must name this program.
pub fn check_hook_program(
    hook_program: Option<Pubkey>,
    program_id: &Pubkey,
) -> core::result::Result<(), HookError> {
    match hook_program {
        Some(hook_program) if hook_program == *program_id => Ok(()),
        _ => Err(HookError::InvalidMint),
    }
}

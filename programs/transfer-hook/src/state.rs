use anchor_lang::prelude::*;

/// Withdrawal authority PDA, one per program deployment.
/// Seeds: [b"authority"]
#[account]
pub struct AuthorityPda {
    /// The only principal allowed to withdraw from custody
    pub authority: Pubkey,
    /// PDA bump
    pub bump: u8,
}

impl AuthorityPda {
    pub const LEN: usize = 8   // discriminator
        + 32                    // authority
        + 1;                    // bump

    pub fn is_set(&self) -> bool {
        self.authority != Pubkey::default()
    }
}

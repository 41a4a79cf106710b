use anchor_lang::prelude::*;

#[error_code]
pub enum HookError {
    #[msg("Supplied extra accounts do not match the metadata record")]
    AccountMismatch,

    #[msg("Token account does not belong to the mint under validation")]
    MintMismatch,

    #[msg("Accompanying payment does not match the custody requirements")]
    PaymentMismatch,

    #[msg("No extra account metadata record exists for this mint")]
    NotFound,

    #[msg("Extra account metadata record is already initialized")]
    AlreadyInitialized,

    #[msg("Mint has no transfer hook pointing at this program")]
    InvalidMint,

    #[msg("Unauthorized: caller is not the withdrawal authority")]
    Unauthorized,

    #[msg("Delegate or custody account is not the program-derived one")]
    InvalidAccount,

    #[msg("Withdrawal exceeds custody balance")]
    InsufficientFunds,

    #[msg("Transfer hook invoked outside of a token transfer")]
    NotTransferring,

    #[msg("Arithmetic overflow")]
    MathOverflow,

    #[msg("Balances after withdrawal do not conserve funds")]
    BalanceMismatch,
}

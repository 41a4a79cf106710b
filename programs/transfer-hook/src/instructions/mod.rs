pub mod execute;
pub mod initialize_extra_account_meta_list;
pub mod withdraw_delegate_funds;

pub use execute::*;
pub use initialize_extra_account_meta_list::*;
pub use withdraw_delegate_funds::*;

// Lottery Program - Utility Functions
use solana_program::{account_info::AccountInfo, program_error::ProgramError};

use crate::error::LotteryError;

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 1_000_000_000.0
}

/// Convert SOL to lamports
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * 1_000_000_000.0).round() as u64
}

/// Move lamports out of an account owned by this program
pub fn transfer_lamports(
    from: &AccountInfo,
    to: &AccountInfo,
    amount: u64,
) -> Result<(), ProgramError> {
    let from_balance = from
        .lamports()
        .checked_sub(amount)
        .ok_or(ProgramError::InsufficientFunds)?;
    let to_balance = to
        .lamports()
        .checked_add(amount)
        .ok_or(LotteryError::MathOverflow)?;
    **from.try_borrow_mut_lamports()? = from_balance;
    **to.try_borrow_mut_lamports()? = to_balance;
    Ok(())
}

use anchor_lang::prelude::*;

use crate::error::RaffleError;

// 8 discriminator, 32 pubkey, 1 bump
pub const TREASURY_ACCOUNT_SIZE: usize = 8 + 32 + 1;

/// Holds the native pot as lamports on top of its own rent. Payouts debit it
/// directly, which only works because it is a PDA owned by this program.
#[account]
pub struct Treasury {
    pub raffle: Pubkey,
    pub bump: u8,
}

pub fn pay_from_treasury<'info>(
    treasury: &AccountInfo<'info>,
    recipient: &AccountInfo<'info>,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    msg!("paying {} lamports to {}", amount, recipient.key);
    treasury
        .sub_lamports(amount)
        .map_err(|_| RaffleError::TransferFailed)?;
    recipient
        .add_lamports(amount)
        .map_err(|_| RaffleError::TransferFailed)?;
    Ok(())
}

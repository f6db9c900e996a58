use anchor_lang::prelude::*;
use anchor_lang::solana_program::{program::invoke, system_instruction};

use crate::error::RaffleError;
use crate::state::Entrants;

/// Credits `tickets` to `player` in the entrants ledger, appending a fresh
/// record for first-time players. The payer covers the rent top-up when the
/// account has to grow.
pub fn add_tickets<'info>(
    entrants: &mut Account<'info, Entrants>,
    payer: AccountInfo<'info>,
    system_program: AccountInfo<'info>,
    player: Pubkey,
    tickets: u64,
) -> Result<()> {
    let entrants_info = entrants.to_account_info();

    let existing = {
        let data = entrants_info.data.borrow();
        entrants.find(&data, &player)
    };

    match existing {
        Some(index) => {
            let mut data = entrants_info.data.borrow_mut();
            entrants.credit(&mut data, index, tickets)?;
        }
        None => {
            let required_size = Entrants::required_size(
                entrants.players.checked_add(1).ok_or(RaffleError::Overflow)?,
            );
            let required_lamports = Rent::get()?.minimum_balance(required_size);
            let current_lamports = entrants_info.lamports();

            if required_lamports > current_lamports {
                let lamports = required_lamports
                    .checked_sub(current_lamports)
                    .ok_or(RaffleError::Overflow)?;
                invoke(
                    &system_instruction::transfer(payer.key, entrants_info.key, lamports),
                    &[payer, entrants_info.clone(), system_program],
                )?;
            }

            if entrants_info.data_len() < required_size {
                entrants_info.realloc(required_size, false)?;
            }

            let mut data = entrants_info.data.borrow_mut();
            entrants.append(&mut data, player, tickets)?;
        }
    }

    Ok(())
}

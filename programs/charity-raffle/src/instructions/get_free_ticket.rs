use anchor_lang::prelude::*;

use crate::{
    error::RaffleError,
    state::{Entrants, Raffle},
    utils::add_tickets,
};

/// Event emitted when a free ticket is claimed
#[event]
pub struct FreeTicketClaimed {
    /// The pubkey of the raffle
    pub raffle: Pubkey,
    /// The first-time player who claimed the ticket
    pub player: Pubkey,
}

/// Grants exactly one ticket to a first-time caller. Anyone who already
/// holds a record in the entrants ledger, whether from a purchase, a
/// referral or an earlier claim, is turned away. The claimer pays the rent
/// for their own ledger record; the pot is untouched.
pub fn get_free_ticket(ctx: Context<GetFreeTicket>) -> Result<u64> {
    let now = Clock::get()?.unix_timestamp;
    let player = ctx.accounts.player.key();
    ctx.accounts.raffle.assert_open_for(&player, now)?;

    let entrants = &ctx.accounts.entrants;
    let already_playing = {
        let data = entrants.to_account_info();
        let data = data.data.borrow();
        entrants.find(&data, &player).is_some()
    };
    require!(!already_playing, RaffleError::AlreadyClaimed);

    add_tickets(
        &mut ctx.accounts.entrants,
        ctx.accounts.player.to_account_info(),
        ctx.accounts.system_program.to_account_info(),
        player,
        1,
    )?;

    let raffle = &mut ctx.accounts.raffle;
    raffle.total_tickets = raffle
        .total_tickets
        .checked_add(1)
        .ok_or(RaffleError::Overflow)?;

    emit!(FreeTicketClaimed {
        raffle: raffle.key(),
        player,
    });

    Ok(1)
}

#[derive(Accounts)]
pub struct GetFreeTicket<'info> {
    #[account(
        mut,
        seeds = [
            b"raffle",
            entrants.key().as_ref(),
        ],
        bump = raffle.bump,
        has_one = entrants,
    )]
    pub raffle: Account<'info, Raffle>,

    #[account(mut)]
    pub entrants: Account<'info, Entrants>,

    #[account(mut)]
    pub player: Signer<'info>,

    pub system_program: Program<'info, System>,
}

use anchor_lang::prelude::*;
use anchor_lang::solana_program::{program::invoke, system_instruction};

use crate::{
    error::RaffleError,
    state::{BundleTier, Entrants, PaymentKind, Raffle, Treasury},
    utils::add_tickets,
};

/// Event emitted when a raw contribution is classified into a bundle
#[event]
pub struct ContributionReceived {
    /// The pubkey of the raffle
    pub raffle: Pubkey,
    /// The contributor's address
    pub buyer: Pubkey,
    /// Lamports paid, excess over the matched tier included
    pub amount: u64,
    /// The tier the contribution was classified into
    pub tier: BundleTier,
    /// Number of tickets granted
    pub tickets: u64,
}

/// Accepts a raw lamport amount and classifies it into the largest bundle
/// tier whose price it meets or exceeds. The whole amount goes to the pot;
/// overpayment above the matched tier price is not refunded and buys no
/// extra tickets. Amounts below the small-tier price are rejected.
///
/// Native-currency raffles only.
pub fn contribute(ctx: Context<Contribute>, amount: u64) -> Result<u64> {
    let now = Clock::get()?.unix_timestamp;
    let buyer = ctx.accounts.buyer.key();
    ctx.accounts.raffle.assert_open_for(&buyer, now)?;

    require!(
        ctx.accounts.raffle.payment == PaymentKind::Native,
        RaffleError::NativePaymentOnly
    );

    let tier = ctx
        .accounts
        .raffle
        .classify_contribution(amount)
        .ok_or(RaffleError::InsufficientFunds)?;
    let tickets = ctx.accounts.raffle.bundle(tier).tickets;

    require!(
        ctx.accounts.buyer.lamports() >= amount,
        RaffleError::InsufficientFunds
    );
    invoke(
        &system_instruction::transfer(&buyer, &ctx.accounts.treasury.key(), amount),
        &[
            ctx.accounts.buyer.to_account_info(),
            ctx.accounts.treasury.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
        ],
    )?;

    add_tickets(
        &mut ctx.accounts.entrants,
        ctx.accounts.buyer.to_account_info(),
        ctx.accounts.system_program.to_account_info(),
        buyer,
        tickets,
    )?;

    let raffle = &mut ctx.accounts.raffle;
    raffle.pot = raffle.pot.checked_add(amount).ok_or(RaffleError::Overflow)?;
    raffle.total_tickets = raffle
        .total_tickets
        .checked_add(tickets)
        .ok_or(RaffleError::Overflow)?;

    emit!(ContributionReceived {
        raffle: raffle.key(),
        buyer,
        amount,
        tier,
        tickets,
    });

    Ok(tickets)
}

#[derive(Accounts)]
pub struct Contribute<'info> {
    #[account(
        mut,
        seeds = [
            b"raffle",
            entrants.key().as_ref(),
        ],
        bump = raffle.bump,
        has_one = entrants,
        has_one = treasury,
    )]
    pub raffle: Account<'info, Raffle>,

    #[account(mut)]
    pub entrants: Account<'info, Entrants>,

    #[account(
        mut,
        seeds = [
            b"treasury",
            raffle.key().as_ref(),
        ],
        bump = treasury.bump,
    )]
    pub treasury: Account<'info, Treasury>,

    #[account(mut)]
    pub buyer: Signer<'info>,

    pub system_program: Program<'info, System>,
}

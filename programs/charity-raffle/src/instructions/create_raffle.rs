use anchor_lang::prelude::*;
use anchor_spl::token::Mint;

use crate::{
    error::RaffleError,
    state::{derive_bundles, Entrants, PaymentKind, Raffle, Treasury, RAFFLE_ACCOUNT_SIZE, TREASURY_ACCOUNT_SIZE},
};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Event emitted when a raffle is created
#[event]
pub struct RaffleCreated {
    /// The pubkey of the created raffle
    pub raffle: Pubkey,
    /// The raffle authority (owner)
    pub authority: Pubkey,
    /// Base price of a single ticket
    pub ticket_price: u64,
    /// Payment mint, or None for a native-currency raffle
    pub payment_mint: Option<Pubkey>,
    /// Optional fixed prize target
    pub fixed_prize: Option<u64>,
    /// When the raffle closes for purchases
    pub end_time: i64,
    /// When the raffle was created
    pub creation_time: i64,
}

/// Instruction to create a new raffle
///
/// # Arguments
/// * `ctx` - The context object containing all required accounts
/// * `ticket_price` - Base price of a single ticket (must be > 0); the three
///   purchasable bundles are derived from it once, here, and never change
/// * `duration_days` - Raffle lifetime in whole days (must be >= 1), so the
///   deadline is always strictly in the future at creation time
/// * `fixed_prize` - Optional prize target; when set, settlement pays
///   `min(fixed_prize, pot)` instead of half the pot
///
/// # Security Considerations
/// 1. The creator becomes the immutable raffle authority
/// 2. The deadline is immutable once set
/// 3. The raffle PDA is seeded by the entrants account, the treasury PDA by
///    the raffle, so the three accounts are bound to each other
/// 4. Passing a `payment_mint` account fixes the raffle to that SPL token;
///    omitting it fixes the raffle to native currency
pub fn create_raffle(
    ctx: Context<CreateRaffle>,
    ticket_price: u64,
    duration_days: u8,
    fixed_prize: Option<u64>,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;

    require!(duration_days >= 1, RaffleError::InvalidTimestamp);
    require!(ticket_price > 0, RaffleError::InvalidPurchase);
    if let Some(prize) = fixed_prize {
        require!(prize > 0, RaffleError::InvalidPurchase);
    }

    let end_time = now
        .checked_add(duration_days as i64 * SECONDS_PER_DAY)
        .ok_or(RaffleError::Overflow)?;

    let payment = match &ctx.accounts.payment_mint {
        Some(mint) => PaymentKind::Token { mint: mint.key() },
        None => PaymentKind::Native,
    };

    let raffle = &mut ctx.accounts.raffle;
    raffle.authority = ctx.accounts.authority.key();
    raffle.entrants = ctx.accounts.entrants.key();
    raffle.treasury = ctx.accounts.treasury.key();
    raffle.payment = payment;
    raffle.bundles = derive_bundles(ticket_price)?;
    raffle.ticket_price = ticket_price;
    raffle.pot = 0;
    raffle.total_tickets = 0;
    raffle.creation_time = now;
    raffle.end_time = end_time;
    raffle.fixed_prize = fixed_prize;
    raffle.winner = None;
    raffle.bump = ctx.bumps.raffle;

    ctx.accounts.entrants.players = 0;
    ctx.accounts.treasury.raffle = raffle.key();
    ctx.accounts.treasury.bump = ctx.bumps.treasury;

    emit!(RaffleCreated {
        raffle: raffle.key(),
        authority: raffle.authority,
        ticket_price,
        payment_mint: ctx.accounts.payment_mint.as_ref().map(|mint| mint.key()),
        fixed_prize,
        end_time,
        creation_time: now,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct CreateRaffle<'info> {
    #[account(
        init,
        payer = authority,
        space = RAFFLE_ACCOUNT_SIZE,
        seeds = [
            b"raffle",
            entrants.key().as_ref(),
        ],
        bump,
    )]
    pub raffle: Account<'info, Raffle>,

    /// The player ledger; a fresh keypair account that grows by realloc as
    /// players join
    #[account(
        init,
        payer = authority,
        space = Entrants::BASE_SIZE,
    )]
    pub entrants: Account<'info, Entrants>,

    #[account(
        init,
        payer = authority,
        space = TREASURY_ACCOUNT_SIZE,
        seeds = [
            b"treasury",
            raffle.key().as_ref(),
        ],
        bump,
    )]
    pub treasury: Account<'info, Treasury>,

    #[account(mut)]
    pub authority: Signer<'info>,

    /// Present for token-denominated raffles, absent for native ones
    pub payment_mint: Option<Account<'info, Mint>>,

    pub system_program: Program<'info, System>,
}

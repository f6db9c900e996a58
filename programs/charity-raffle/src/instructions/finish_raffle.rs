use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::slot_hashes;
use anchor_spl::{
    associated_token::{get_associated_token_address, AssociatedToken},
    token::{transfer, Mint, Token, TokenAccount, Transfer},
};
use arrayref::array_ref;

use crate::{
    error::RaffleError,
    state::{pay_from_treasury, Entrants, PaymentKind, Raffle, Treasury},
    utils::{mix, unbiased_range, winning_index},
};

/// Event emitted when the winner is picked
#[event]
pub struct WinnerPicked {
    /// The pubkey of the raffle
    pub raffle: Pubkey,
    /// The winner's address
    pub winner: Pubkey,
    /// The winning ticket number in [0, total_tickets)
    pub winning_ticket: u64,
    /// The prize paid to the winner
    pub prize: u64,
}

/// Event emitted when the pot has been distributed
#[event]
pub struct RaffleSettled {
    /// The pubkey of the raffle
    pub raffle: Pubkey,
    /// The winner's address
    pub winner: Pubkey,
    /// The pot that was distributed
    pub pot: u64,
    /// The winner's share
    pub prize: u64,
    /// The donation share
    pub donation: u64,
    /// The address that received the donation share
    pub donation_address: Pubkey,
    /// The authority commission
    pub commission: u64,
}

/// One-shot settlement: picks the weighted-random winner and distributes the
/// whole pot, atomically, exactly once.
///
/// Execution requirements:
/// 1. The caller is the raffle authority
/// 2. The deadline has passed
/// 3. No winner has been picked yet
/// 4. The pot is non-empty and at least one ticket was sold
///
/// The winner is derived from SlotHashes and clock entropy, mixed and mapped
/// into [0, total_tickets) without bias, then resolved through a cumulative
/// scan of the entrants ledger in insertion order, so each player's chance
/// is exactly proportional to their ticket count. Block-derived entropy is
/// observable before it lands; settlement is therefore meant to be triggered
/// manually at an unpredictable moment, not by an automated schedule.
///
/// The winner is written into the raffle account before any value moves, so
/// a reentered or repeated call fails the `AlreadySettled` guard. The pot
/// then splits three ways per `Raffle::prize_distribution`: prize to the
/// winner, 75% of the remainder to the donation address, the rest to the
/// authority. Any failing transfer aborts the whole instruction and rolls
/// the winner write back with it.
///
/// The winner cannot be known before the entropy is sampled, so the caller
/// supplies every player's payout account (system accounts for native
/// raffles, associated token accounts for token raffles) as remaining
/// accounts; the computed winner is located among them.
///
/// Returns the winner's address.
pub fn finish_raffle<'info>(
    ctx: Context<'_, '_, 'info, 'info, FinishRaffle<'info>>,
) -> Result<Pubkey> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;
    ctx.accounts
        .raffle
        .assert_settlement_allowed(&ctx.accounts.authority.key(), now)?;
    require!(
        ctx.accounts.raffle.total_tickets > 0,
        RaffleError::NoParticipants
    );

    require!(
        slot_hashes::check_id(ctx.accounts.recent_slothashes.key),
        RaffleError::InvalidSlotHashesAccount
    );

    let data = ctx.accounts.recent_slothashes.data.borrow();
    let chunk1 = array_ref![data, 12, 8];
    let chunk2 = if data.len() >= 28 {
        array_ref![data, 20, 8]
    } else {
        chunk1
    };
    let hash_value1 = u64::from_le_bytes(*chunk1);
    let hash_value2 = u64::from_le_bytes(*chunk2);
    drop(data);

    let mut mixed = mix(hash_value1, now as u64);
    mixed = mix(mixed, hash_value2);
    mixed = mix(mixed, clock.slot);

    let winning_ticket = unbiased_range(mixed, ctx.accounts.raffle.total_tickets)?;

    let entrants = &ctx.accounts.entrants;
    let entrants_info = entrants.to_account_info();
    let winner = {
        let data = entrants_info.data.borrow();
        let counts = entrants.ticket_counts(&data);
        // unreachable while the ticket totals are conserved: the winning
        // ticket is strictly below the sum of the counts
        let index = winning_index(&counts, winning_ticket)
            .expect("ticket scan exhausted with tickets outstanding");
        Entrants::player_at(&data, index)
    };

    // record the winner before any value leaves the treasury
    let raffle = &mut ctx.accounts.raffle;
    raffle.winner = Some(winner);
    let split = raffle.prize_distribution()?;
    let pot = raffle.pot;
    raffle.pot = 0;

    match ctx.accounts.raffle.payment {
        PaymentKind::Native => {
            let treasury_info = ctx.accounts.treasury.to_account_info();
            let winner_info = payout_account(ctx.remaining_accounts, &winner)?;
            pay_from_treasury(&treasury_info, &winner_info, split.prize)?;
            pay_from_treasury(
                &treasury_info,
                &ctx.accounts.donation.to_account_info(),
                split.donation,
            )?;
            pay_from_treasury(
                &treasury_info,
                &ctx.accounts.authority.to_account_info(),
                split.commission,
            )?;
        }
        PaymentKind::Token { mint } => {
            let winner_token_address = get_associated_token_address(&winner, &mint);
            let winner_token = payout_account(ctx.remaining_accounts, &winner_token_address)?;
            let proceeds = ctx
                .accounts
                .proceeds
                .as_ref()
                .ok_or(RaffleError::TokenAccountMissing)?
                .to_account_info();
            let donation_token = ctx
                .accounts
                .donation_token
                .as_ref()
                .ok_or(RaffleError::TokenAccountMissing)?
                .to_account_info();
            let authority_token = ctx
                .accounts
                .authority_token
                .as_ref()
                .ok_or(RaffleError::TokenAccountMissing)?
                .to_account_info();

            let entrants_key = ctx.accounts.entrants.key();
            let bump = ctx.accounts.raffle.bump;
            let authority_seed = &[&b"raffle"[..], entrants_key.as_ref(), &[bump]];
            let raffle_info = ctx.accounts.raffle.to_account_info();
            let token_program = &ctx.accounts.token_program;

            pay_tokens(
                token_program,
                proceeds.clone(),
                winner_token,
                raffle_info.clone(),
                authority_seed,
                split.prize,
            )?;
            pay_tokens(
                token_program,
                proceeds.clone(),
                donation_token,
                raffle_info.clone(),
                authority_seed,
                split.donation,
            )?;
            pay_tokens(
                token_program,
                proceeds,
                authority_token,
                raffle_info,
                authority_seed,
                split.commission,
            )?;
        }
    }

    emit!(WinnerPicked {
        raffle: ctx.accounts.raffle.key(),
        winner,
        winning_ticket,
        prize: split.prize,
    });
    emit!(RaffleSettled {
        raffle: ctx.accounts.raffle.key(),
        winner,
        pot,
        prize: split.prize,
        donation: split.donation,
        donation_address: ctx.accounts.donation.key(),
        commission: split.commission,
    });

    Ok(winner)
}

/// Locates a payout account among the remaining accounts by pubkey.
fn payout_account<'info>(
    accounts: &[AccountInfo<'info>],
    key: &Pubkey,
) -> Result<AccountInfo<'info>> {
    accounts
        .iter()
        .find(|account| account.key == key)
        .cloned()
        .ok_or_else(|| error!(RaffleError::WinnerAccountMissing))
}

fn pay_tokens<'info>(
    token_program: &Program<'info, Token>,
    proceeds: AccountInfo<'info>,
    destination: AccountInfo<'info>,
    raffle: AccountInfo<'info>,
    authority_seed: &[&[u8]],
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    msg!("paying {} tokens to {}", amount, destination.key);
    transfer(
        CpiContext::new_with_signer(
            token_program.to_account_info(),
            Transfer {
                from: proceeds,
                to: destination,
                authority: raffle,
            },
            &[authority_seed],
        ),
        amount,
    )
    .map_err(|_| error!(RaffleError::TransferFailed))
}

#[derive(Accounts)]
pub struct FinishRaffle<'info> {
    #[account(
        mut,
        seeds = [
            b"raffle",
            entrants.key().as_ref(),
        ],
        bump = raffle.bump,
        has_one = entrants,
        has_one = treasury,
        has_one = authority @ RaffleError::NotOwner,
    )]
    pub raffle: Account<'info, Raffle>,

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
    pub authority: Signer<'info>,

    /// Receives the donation share; chosen by the authority at settlement
    #[account(mut)]
    pub donation: SystemAccount<'info>,

    /// The SlotHashes sysvar, the entropy source for the draw
    /// CHECK: validated against the sysvar id in the handler; Anchor cannot
    /// deserialize the SlotHashes sysvar directly
    pub recent_slothashes: UncheckedAccount<'info>,

    /// Required for token raffles, absent for native ones
    #[account(
        address = match raffle.payment {
            PaymentKind::Token { mint } => mint,
            PaymentKind::Native => return err!(RaffleError::TokenAccountMissing),
        } @ RaffleError::InvalidTokenMint
    )]
    pub payment_mint: Option<Account<'info, Mint>>,

    /// The raffle's token pot
    #[account(
        mut,
        associated_token::mint = payment_mint,
        associated_token::authority = raffle,
    )]
    pub proceeds: Option<Account<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = authority,
        associated_token::mint = payment_mint,
        associated_token::authority = donation,
    )]
    pub donation_token: Option<Account<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = authority,
        associated_token::mint = payment_mint,
        associated_token::authority = authority,
    )]
    pub authority_token: Option<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

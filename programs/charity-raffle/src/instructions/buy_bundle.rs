use anchor_lang::prelude::*;
use anchor_lang::solana_program::{program::invoke, system_instruction};
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{transfer, Mint, Token, TokenAccount, Transfer},
};

use crate::{
    error::RaffleError,
    state::{BundleTier, Entrants, PaymentKind, Raffle, Treasury},
    utils::add_tickets,
};

/// Event emitted when a ticket bundle is purchased
#[event]
pub struct TicketsPurchased {
    /// The pubkey of the raffle
    pub raffle: Pubkey,
    /// The buyer's address
    pub buyer: Pubkey,
    /// Which bundle tier was bought
    pub tier: BundleTier,
    /// Number of tickets granted
    pub tickets: u64,
    /// Amount paid into the pot
    pub amount_paid: u64,
}

/// Event emitted when a purchase names a referral and the bonus ticket is
/// granted
#[event]
pub struct TicketReferred {
    /// The pubkey of the raffle
    pub raffle: Pubkey,
    /// The buyer who named the referral
    pub referrer: Pubkey,
    /// The existing player who received the bonus ticket
    pub referred: Pubkey,
}

/// Shared handler behind the six `buy_*_ticket_bundle` entry points.
///
/// Validates that the raffle is open and the buyer is not the authority,
/// collects the tier price (a system transfer into the treasury PDA for
/// native raffles, an SPL transfer into the raffle's proceeds account for
/// token raffles), then credits the buyer in the entrants ledger and bumps
/// the pot and ticket totals. Payment moves before the ledger is touched.
///
/// When `referral` is set, one bonus ticket goes to the referred address in
/// the same transaction. The referral must already be a player and cannot be
/// the buyer; a failed referral aborts the whole purchase. The referrer
/// gains nothing from referring.
///
/// Returns the number of tickets granted by the purchase itself.
pub fn buy_bundle(
    ctx: Context<BuyBundle>,
    tier: BundleTier,
    referral: Option<Pubkey>,
) -> Result<u64> {
    let now = Clock::get()?.unix_timestamp;
    let buyer = ctx.accounts.buyer.key();
    ctx.accounts.raffle.assert_open_for(&buyer, now)?;

    let bundle = ctx.accounts.raffle.bundle(tier);
    require!(
        bundle.tickets > 0 && bundle.price > 0,
        RaffleError::InvalidPurchase
    );

    match ctx.accounts.raffle.payment {
        PaymentKind::Native => {
            require!(
                ctx.accounts.buyer.lamports() >= bundle.price,
                RaffleError::InsufficientFunds
            );
            invoke(
                &system_instruction::transfer(
                    &buyer,
                    &ctx.accounts.treasury.key(),
                    bundle.price,
                ),
                &[
                    ctx.accounts.buyer.to_account_info(),
                    ctx.accounts.treasury.to_account_info(),
                    ctx.accounts.system_program.to_account_info(),
                ],
            )?;
        }
        PaymentKind::Token { .. } => {
            let buyer_token = ctx
                .accounts
                .buyer_token
                .as_ref()
                .ok_or(RaffleError::TokenAccountMissing)?;
            require!(
                ctx.accounts.proceeds.is_some(),
                RaffleError::TokenAccountMissing
            );
            // the balance check stands in for the allowance check of
            // pull-based token models; the transfer itself is authorised by
            // the buyer's signature
            require!(
                buyer_token.amount >= bundle.price,
                RaffleError::InsufficientFunds
            );
            transfer(ctx.accounts.transfer_payment_ctx(), bundle.price)?;
        }
    }

    add_tickets(
        &mut ctx.accounts.entrants,
        ctx.accounts.buyer.to_account_info(),
        ctx.accounts.system_program.to_account_info(),
        buyer,
        bundle.tickets,
    )?;

    let raffle = &mut ctx.accounts.raffle;
    raffle.pot = raffle
        .pot
        .checked_add(bundle.price)
        .ok_or(RaffleError::Overflow)?;
    raffle.total_tickets = raffle
        .total_tickets
        .checked_add(bundle.tickets)
        .ok_or(RaffleError::Overflow)?;

    emit!(TicketsPurchased {
        raffle: raffle.key(),
        buyer,
        tier,
        tickets: bundle.tickets,
        amount_paid: bundle.price,
    });

    if let Some(referred) = referral {
        grant_referral_ticket(ctx, buyer, referred)?;
    }

    Ok(bundle.tickets)
}

/// Grants the single referral bonus ticket. Only existing players can be
/// referred, which keeps fresh throwaway addresses out of the reward loop.
fn grant_referral_ticket(ctx: Context<BuyBundle>, buyer: Pubkey, referred: Pubkey) -> Result<()> {
    require!(referred != buyer, RaffleError::SelfReferral);

    let entrants = &ctx.accounts.entrants;
    let entrants_info = entrants.to_account_info();

    let index = {
        let data = entrants_info.data.borrow();
        entrants.find(&data, &referred)
    }
    .ok_or(RaffleError::NotAPlayer)?;

    {
        let mut data = entrants_info.data.borrow_mut();
        entrants.credit(&mut data, index, 1)?;
    }

    let raffle = &mut ctx.accounts.raffle;
    raffle.total_tickets = raffle
        .total_tickets
        .checked_add(1)
        .ok_or(RaffleError::Overflow)?;

    emit!(TicketReferred {
        raffle: raffle.key(),
        referrer: buyer,
        referred,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct BuyBundle<'info> {
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

    /// Required for token raffles, absent for native ones
    #[account(
        address = match raffle.payment {
            PaymentKind::Token { mint } => mint,
            PaymentKind::Native => return err!(RaffleError::TokenAccountMissing),
        } @ RaffleError::InvalidTokenMint
    )]
    pub payment_mint: Option<Account<'info, Mint>>,

    #[account(
        mut,
        associated_token::mint = payment_mint,
        associated_token::authority = buyer,
    )]
    pub buyer_token: Option<Account<'info, TokenAccount>>,

    /// The raffle's token pot, created on first use
    #[account(
        init_if_needed,
        payer = buyer,
        associated_token::mint = payment_mint,
        associated_token::authority = raffle,
    )]
    pub proceeds: Option<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> BuyBundle<'info> {
    pub fn transfer_payment_ctx(&self) -> CpiContext<'_, '_, '_, 'info, Transfer<'info>> {
        let cpi_accounts = Transfer {
            from: self
                .buyer_token
                .as_ref()
                .expect("buyer_token account expected")
                .to_account_info(),
            to: self
                .proceeds
                .as_ref()
                .expect("proceeds account expected")
                .to_account_info(),
            authority: self.buyer.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        CpiContext::new(cpi_program, cpi_accounts)
    }
}

use anchor_lang::prelude::*;
use instructions::*;

pub mod error;
pub mod instructions;
pub mod state;
pub mod utils;

use state::BundleTier;

declare_id!("7ci3wScpdyqZ5JwEuJqZVMPzKtbCdDFoiVc13UcUygZf");

#[program]
pub mod charity_raffle {
    use super::*;

    pub fn create_raffle(
        ctx: Context<CreateRaffle>,
        ticket_price: u64,
        duration_days: u8,
        fixed_prize: Option<u64>,
    ) -> Result<()> {
        instructions::create_raffle::create_raffle(ctx, ticket_price, duration_days, fixed_prize)
    }

    pub fn buy_small_ticket_bundle(ctx: Context<BuyBundle>) -> Result<u64> {
        instructions::buy_bundle::buy_bundle(ctx, BundleTier::Small, None)
    }

    pub fn buy_medium_ticket_bundle(ctx: Context<BuyBundle>) -> Result<u64> {
        instructions::buy_bundle::buy_bundle(ctx, BundleTier::Medium, None)
    }

    pub fn buy_large_ticket_bundle(ctx: Context<BuyBundle>) -> Result<u64> {
        instructions::buy_bundle::buy_bundle(ctx, BundleTier::Large, None)
    }

    pub fn buy_small_ticket_bundle_with_referral(
        ctx: Context<BuyBundle>,
        referral: Pubkey,
    ) -> Result<u64> {
        instructions::buy_bundle::buy_bundle(ctx, BundleTier::Small, Some(referral))
    }

    pub fn buy_medium_ticket_bundle_with_referral(
        ctx: Context<BuyBundle>,
        referral: Pubkey,
    ) -> Result<u64> {
        instructions::buy_bundle::buy_bundle(ctx, BundleTier::Medium, Some(referral))
    }

    pub fn buy_large_ticket_bundle_with_referral(
        ctx: Context<BuyBundle>,
        referral: Pubkey,
    ) -> Result<u64> {
        instructions::buy_bundle::buy_bundle(ctx, BundleTier::Large, Some(referral))
    }

    pub fn contribute(ctx: Context<Contribute>, amount: u64) -> Result<u64> {
        instructions::contribute::contribute(ctx, amount)
    }

    pub fn get_free_ticket(ctx: Context<GetFreeTicket>) -> Result<u64> {
        instructions::get_free_ticket::get_free_ticket(ctx)
    }

    pub fn finish_raffle<'info>(
        ctx: Context<'_, '_, 'info, 'info, FinishRaffle<'info>>,
    ) -> Result<Pubkey> {
        instructions::finish_raffle::finish_raffle(ctx)
    }
}

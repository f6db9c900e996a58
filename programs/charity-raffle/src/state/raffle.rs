use anchor_lang::prelude::*;

use crate::error::RaffleError;

// Space calculation:
// 8 (discriminator) +
// 32 (authority) +
// 32 (entrants) +
// 32 (treasury) +
// 33 (payment: 1 tag + 32 mint) +
// 48 (bundles: 3 x 16) +
// 8 (ticket_price) +
// 8 (pot) +
// 8 (total_tickets) +
// 8 (creation_time) +
// 8 (end_time) +
// 9 (fixed_prize: Option<u64>) +
// 33 (winner: Option<Pubkey>) +
// 1 (bump) =
// 268 total bytes
pub const RAFFLE_ACCOUNT_SIZE: usize = 8 + 32 + 32 + 32 + 33 + 48 + 8 + 8 + 8 + 8 + 8 + 9 + 33 + 1;

/// Bundle shape shared by every raffle: ticket counts are fixed, prices are
/// derived from the per-raffle base ticket price. Larger bundles cost less
/// per ticket.
pub const SMALL_BUNDLE_TICKETS: u64 = 45;
pub const MEDIUM_BUNDLE_TICKETS: u64 = 200;
pub const LARGE_BUNDLE_TICKETS: u64 = 660;
const MEDIUM_PRICE_MULTIPLIER: u64 = 3;
const LARGE_PRICE_MULTIPLIER: u64 = 5;

/// Share of the post-prize remainder that goes to the donation address,
/// in basis points. The rest of the remainder is the authority commission.
pub const DONATION_SHARE_BPS: u128 = 7_500;

/// A purchasable (ticket count, price) pair.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Bundle {
    pub tickets: u64,
    pub price: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum BundleTier {
    Small = 0,
    Medium = 1,
    Large = 2,
}

impl BundleTier {
    pub const ALL: [BundleTier; 3] = [BundleTier::Small, BundleTier::Medium, BundleTier::Large];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum PaymentKind {
    Native,
    Token { mint: Pubkey },
}

/// Projected three-way split of the pot at settlement time.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PrizeDistribution {
    pub prize: u64,
    pub donation: u64,
    pub commission: u64,
}

#[account]
pub struct Raffle {
    pub authority: Pubkey,
    pub entrants: Pubkey,
    pub treasury: Pubkey,
    pub payment: PaymentKind,
    pub bundles: [Bundle; 3],
    pub ticket_price: u64,
    pub pot: u64,
    pub total_tickets: u64,
    pub creation_time: i64,
    pub end_time: i64,
    pub fixed_prize: Option<u64>,
    pub winner: Option<Pubkey>,
    pub bump: u8,
}

/// Derives the three fixed bundles from a base ticket price. Prices grow
/// sub-linearly with ticket count: the medium and large tiers cost 3x and 5x
/// the base price for far more than 3x and 5x the tickets.
pub fn derive_bundles(ticket_price: u64) -> Result<[Bundle; 3]> {
    Ok([
        Bundle {
            tickets: SMALL_BUNDLE_TICKETS,
            price: ticket_price,
        },
        Bundle {
            tickets: MEDIUM_BUNDLE_TICKETS,
            price: ticket_price
                .checked_mul(MEDIUM_PRICE_MULTIPLIER)
                .ok_or(RaffleError::Overflow)?,
        },
        Bundle {
            tickets: LARGE_BUNDLE_TICKETS,
            price: ticket_price
                .checked_mul(LARGE_PRICE_MULTIPLIER)
                .ok_or(RaffleError::Overflow)?,
        },
    ])
}

impl Raffle {
    pub fn bundle(&self, tier: BundleTier) -> Bundle {
        self.bundles[tier.index()]
    }

    /// Gate shared by every ticket-granting entry point: the raffle must
    /// still be open and the authority is excluded from its own raffle.
    pub fn assert_open_for(&self, participant: &Pubkey, now: i64) -> Result<()> {
        require!(now < self.end_time, RaffleError::RaffleClosed);
        require!(*participant != self.authority, RaffleError::OwnerExcluded);
        Ok(())
    }

    /// Settlement preconditions: authority only, at or after the deadline,
    /// never twice, and only with a non-empty pot.
    pub fn assert_settlement_allowed(&self, caller: &Pubkey, now: i64) -> Result<()> {
        require!(*caller == self.authority, RaffleError::NotOwner);
        require!(now >= self.end_time, RaffleError::RaffleNotYetFinished);
        require!(self.winner.is_none(), RaffleError::AlreadySettled);
        require!(self.pot > 0, RaffleError::EmptyPot);
        Ok(())
    }

    /// Splits the current pot into (prize, donation, commission). The prize
    /// is half the pot, or `min(fixed_prize, pot)` when a fixed prize was
    /// set. The donation takes 75% of what remains; integer-division
    /// remainders land in the commission so the three parts always sum to
    /// the pot exactly.
    pub fn prize_distribution(&self) -> Result<PrizeDistribution> {
        let prize = match self.fixed_prize {
            Some(target) => target.min(self.pot),
            None => self.pot / 2,
        };
        let remainder = self.pot.checked_sub(prize).ok_or(RaffleError::Overflow)?;
        let donation = u64::try_from(remainder as u128 * DONATION_SHARE_BPS / 10_000)
            .map_err(|_| RaffleError::Overflow)?;
        let commission = remainder
            .checked_sub(donation)
            .ok_or(RaffleError::Overflow)?;
        Ok(PrizeDistribution {
            prize,
            donation,
            commission,
        })
    }

    /// Classifies a raw contribution into the largest tier whose price the
    /// amount meets or exceeds. Amounts below the small-tier price match
    /// nothing. Overpayment is not refunded; the excess stays in the pot.
    pub fn classify_contribution(&self, amount: u64) -> Option<BundleTier> {
        BundleTier::ALL
            .iter()
            .rev()
            .find(|tier| amount >= self.bundle(**tier).price)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raffle() -> Raffle {
        Raffle {
            authority: Pubkey::new_unique(),
            entrants: Pubkey::new_unique(),
            treasury: Pubkey::new_unique(),
            payment: PaymentKind::Native,
            bundles: derive_bundles(100).unwrap(),
            ticket_price: 100,
            pot: 0,
            total_tickets: 0,
            creation_time: 0,
            end_time: 2 * 86_400,
            fixed_prize: None,
            winner: None,
            bump: 255,
        }
    }

    fn expect_err(result: Result<()>, name: &str) {
        match result {
            Err(anchor_lang::error::Error::AnchorError(e)) => assert_eq!(e.error_name, name),
            other => panic!("expected {}, got {:?}", name, other),
        }
    }

    #[test]
    fn bundles_follow_the_tier_shape() {
        let bundles = derive_bundles(5_000_000).unwrap();
        assert_eq!(bundles[0], Bundle { tickets: 45, price: 5_000_000 });
        assert_eq!(bundles[1], Bundle { tickets: 200, price: 15_000_000 });
        assert_eq!(bundles[2], Bundle { tickets: 660, price: 25_000_000 });
    }

    #[test]
    fn bundle_prices_rise_while_per_ticket_price_falls() {
        let bundles = derive_bundles(1_000).unwrap();
        for pair in bundles.windows(2) {
            assert!(pair[1].price > pair[0].price);
            // price_1 / tickets_1 > price_2 / tickets_2, cross-multiplied to
            // stay in integers
            assert!(pair[0].price * pair[1].tickets > pair[1].price * pair[0].tickets);
        }
    }

    #[test]
    fn bundle_derivation_rejects_overflowing_price() {
        assert!(derive_bundles(u64::MAX / 2).is_err());
    }

    #[test]
    fn half_pot_split_assigns_remainders_to_commission() {
        let mut raffle = sample_raffle();
        raffle.pot = 1_000;
        let split = raffle.prize_distribution().unwrap();
        assert_eq!(split, PrizeDistribution { prize: 500, donation: 375, commission: 125 });

        raffle.pot = 1_001;
        let split = raffle.prize_distribution().unwrap();
        assert_eq!(split.prize, 500);
        assert_eq!(split.donation, 375);
        assert_eq!(split.commission, 126);
        assert_eq!(split.prize + split.donation + split.commission, raffle.pot);
    }

    #[test]
    fn fixed_prize_is_capped_at_the_pot() {
        let mut raffle = sample_raffle();
        raffle.pot = 1_000;
        raffle.fixed_prize = Some(300);
        let split = raffle.prize_distribution().unwrap();
        assert_eq!(split, PrizeDistribution { prize: 300, donation: 525, commission: 175 });

        raffle.fixed_prize = Some(5_000);
        let split = raffle.prize_distribution().unwrap();
        assert_eq!(split, PrizeDistribution { prize: 1_000, donation: 0, commission: 0 });
    }

    #[test]
    fn split_conserves_the_pot_across_awkward_amounts() {
        let mut raffle = sample_raffle();
        for pot in [1u64, 2, 3, 7, 99, 101, 1_000_003, u64::MAX / 3] {
            raffle.pot = pot;
            let split = raffle.prize_distribution().unwrap();
            assert_eq!(split.prize + split.donation + split.commission, pot);
        }
    }

    #[test]
    fn contributions_classify_into_the_largest_affordable_tier() {
        let raffle = sample_raffle();
        assert_eq!(raffle.classify_contribution(99), None);
        assert_eq!(raffle.classify_contribution(100), Some(BundleTier::Small));
        assert_eq!(raffle.classify_contribution(299), Some(BundleTier::Small));
        assert_eq!(raffle.classify_contribution(300), Some(BundleTier::Medium));
        assert_eq!(raffle.classify_contribution(499), Some(BundleTier::Medium));
        assert_eq!(raffle.classify_contribution(500), Some(BundleTier::Large));
        assert_eq!(raffle.classify_contribution(10_000), Some(BundleTier::Large));
    }

    /// A 0.005-unit ticket price raffle: one medium-bundle purchase puts
    /// three ticket prices in the pot and grants 200 tickets, and the
    /// settlement split hands ~75% of the post-prize remainder to the
    /// donation address.
    #[test]
    fn medium_bundle_scenario_end_to_end_arithmetic() {
        let ticket_price = 5_000_000;
        let mut raffle = sample_raffle();
        raffle.ticket_price = ticket_price;
        raffle.bundles = derive_bundles(ticket_price).unwrap();

        let medium = raffle.bundle(BundleTier::Medium);
        assert_eq!(medium.tickets, 200);
        assert_eq!(medium.price, 3 * ticket_price);

        raffle.pot = medium.price;
        raffle.total_tickets = medium.tickets;

        let split = raffle.prize_distribution().unwrap();
        assert_eq!(split.prize, 7_500_000);
        assert_eq!(split.donation, 5_625_000);
        assert_eq!(split.commission, 1_875_000);
        assert_eq!(split.prize + split.donation + split.commission, medium.price);
    }

    #[test]
    fn purchases_close_exactly_at_the_deadline() {
        let raffle = sample_raffle();
        let player = Pubkey::new_unique();
        assert!(raffle.assert_open_for(&player, raffle.end_time - 1).is_ok());
        expect_err(raffle.assert_open_for(&player, raffle.end_time), "RaffleClosed");
        expect_err(raffle.assert_open_for(&player, raffle.end_time + 1), "RaffleClosed");
    }

    #[test]
    fn the_authority_is_excluded_from_participation() {
        let raffle = sample_raffle();
        let authority = raffle.authority;
        expect_err(raffle.assert_open_for(&authority, 0), "OwnerExcluded");
    }

    #[test]
    fn settlement_requires_the_deadline_to_have_passed() {
        let mut raffle = sample_raffle();
        raffle.pot = 1_000;
        let authority = raffle.authority;
        expect_err(
            raffle.assert_settlement_allowed(&authority, raffle.end_time - 1),
            "RaffleNotYetFinished",
        );
        // the boundary instant belongs to settlement, not purchases
        assert!(raffle.assert_settlement_allowed(&authority, raffle.end_time).is_ok());
    }

    #[test]
    fn settlement_is_owner_only_and_one_shot() {
        let mut raffle = sample_raffle();
        raffle.pot = 1_000;
        let authority = raffle.authority;
        let late = raffle.end_time + 1;

        expect_err(
            raffle.assert_settlement_allowed(&Pubkey::new_unique(), late),
            "NotOwner",
        );

        raffle.winner = Some(Pubkey::new_unique());
        expect_err(raffle.assert_settlement_allowed(&authority, late), "AlreadySettled");
    }

    #[test]
    fn settlement_rejects_an_empty_pot() {
        let raffle = sample_raffle();
        let authority = raffle.authority;
        expect_err(
            raffle.assert_settlement_allowed(&authority, raffle.end_time),
            "EmptyPot",
        );
    }
}

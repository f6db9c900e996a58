use anchor_lang::prelude::*;

use crate::error::RaffleError;

/// One ledger record: a player and their accumulated ticket count.
pub const RECORD_SIZE: usize = 32 + 8;

/// Insertion-ordered, duplicate-free player ledger. Only the player count
/// lives in the Anchor-visible header; the (pubkey, tickets) records are
/// written as raw fixed-width rows behind it and the account is realloc'd
/// as players join. Insertion order is what the cumulative-sum winner scan
/// iterates over, so records are never reordered or removed.
#[account]
pub struct Entrants {
    /// number of distinct players holding at least one ticket
    pub players: u32,
}

impl Entrants {
    pub const BASE_SIZE: usize = 8 + 4;

    pub fn required_size(players: u32) -> usize {
        Entrants::BASE_SIZE + RECORD_SIZE * players as usize
    }

    fn record_offset(index: usize) -> usize {
        Entrants::BASE_SIZE + RECORD_SIZE * index
    }

    pub fn player_at(data: &[u8], index: usize) -> Pubkey {
        let start = Entrants::record_offset(index);
        Pubkey::try_from(&data[start..start + 32]).unwrap()
    }

    pub fn tickets_at(data: &[u8], index: usize) -> u64 {
        let start = Entrants::record_offset(index) + 32;
        u64::from_le_bytes(data[start..start + 8].try_into().unwrap())
    }

    /// Linear scan in insertion order. The ledger is duplicate-free, so the
    /// first hit is the only hit.
    pub fn find(&self, data: &[u8], player: &Pubkey) -> Option<usize> {
        let key = player.to_bytes();
        (0..self.players as usize).find(|&index| {
            let start = Entrants::record_offset(index);
            data[start..start + 32] == key
        })
    }

    /// Appends a new player record. The caller is responsible for having
    /// grown the account to `required_size(self.players + 1)` first.
    pub fn append(&mut self, data: &mut [u8], player: Pubkey, tickets: u64) -> Result<()> {
        let start = Entrants::record_offset(self.players as usize);
        require!(data.len() >= start + RECORD_SIZE, RaffleError::Overflow);
        data[start..start + 32].copy_from_slice(&player.to_bytes());
        data[start + 32..start + RECORD_SIZE].copy_from_slice(&tickets.to_le_bytes());
        self.players = self.players.checked_add(1).ok_or(RaffleError::Overflow)?;
        Ok(())
    }

    /// Adds tickets to an existing record.
    pub fn credit(&self, data: &mut [u8], index: usize, tickets: u64) -> Result<()> {
        let start = Entrants::record_offset(index) + 32;
        let current = u64::from_le_bytes(data[start..start + 8].try_into().unwrap());
        let updated = current.checked_add(tickets).ok_or(RaffleError::Overflow)?;
        data[start..start + 8].copy_from_slice(&updated.to_le_bytes());
        Ok(())
    }

    /// Ticket counts in insertion order, the weights for the winner scan.
    pub fn ticket_counts(&self, data: &[u8]) -> Vec<u64> {
        (0..self.players as usize)
            .map(|index| Entrants::tickets_at(data, index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_for(players: usize) -> Vec<u8> {
        vec![0u8; Entrants::BASE_SIZE + RECORD_SIZE * players]
    }

    #[test]
    fn appended_records_read_back_in_insertion_order() {
        let mut entrants = Entrants { players: 0 };
        let mut data = buffer_for(3);
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();

        entrants.append(&mut data, a, 45).unwrap();
        entrants.append(&mut data, b, 200).unwrap();

        assert_eq!(entrants.players, 2);
        assert_eq!(Entrants::player_at(&data, 0), a);
        assert_eq!(Entrants::player_at(&data, 1), b);
        assert_eq!(Entrants::tickets_at(&data, 0), 45);
        assert_eq!(Entrants::tickets_at(&data, 1), 200);
    }

    #[test]
    fn append_fails_when_the_account_was_not_grown() {
        let mut entrants = Entrants { players: 1 };
        let mut data = buffer_for(1);
        assert!(entrants.append(&mut data, Pubkey::new_unique(), 1).is_err());
    }

    #[test]
    fn credit_accumulates_without_touching_neighbours() {
        let mut entrants = Entrants { players: 0 };
        let mut data = buffer_for(2);
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        entrants.append(&mut data, a, 45).unwrap();
        entrants.append(&mut data, b, 1).unwrap();

        entrants.credit(&mut data, 0, 200).unwrap();
        entrants.credit(&mut data, 1, 1).unwrap();

        assert_eq!(Entrants::tickets_at(&data, 0), 245);
        assert_eq!(Entrants::tickets_at(&data, 1), 2);
    }

    #[test]
    fn credit_rejects_ticket_count_overflow() {
        let mut entrants = Entrants { players: 0 };
        let mut data = buffer_for(1);
        entrants
            .append(&mut data, Pubkey::new_unique(), u64::MAX - 1)
            .unwrap();
        assert!(entrants.credit(&mut data, 0, 2).is_err());
    }

    #[test]
    fn find_locates_players_and_misses_strangers() {
        let mut entrants = Entrants { players: 0 };
        let mut data = buffer_for(2);
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        entrants.append(&mut data, a, 1).unwrap();
        entrants.append(&mut data, b, 1).unwrap();

        assert_eq!(entrants.find(&data, &a), Some(0));
        assert_eq!(entrants.find(&data, &b), Some(1));
        assert_eq!(entrants.find(&data, &Pubkey::new_unique()), None);
    }

    /// The referral flow at the ledger level: X claims a free ticket, then
    /// Y's small-bundle purchase names X, crediting X one bonus ticket.
    #[test]
    fn referral_credits_the_existing_player_one_ticket() {
        let mut entrants = Entrants { players: 0 };
        let mut data = buffer_for(2);
        let x = Pubkey::new_unique();
        let y = Pubkey::new_unique();

        entrants.append(&mut data, x, 1).unwrap();
        entrants.append(&mut data, y, 45).unwrap();

        let referred = entrants.find(&data, &x).unwrap();
        entrants.credit(&mut data, referred, 1).unwrap();

        assert_eq!(entrants.ticket_counts(&data), vec![2, 45]);
        // an address with no record cannot be referred
        assert_eq!(entrants.find(&data, &Pubkey::new_unique()), None);
    }

    #[test]
    fn ticket_counts_match_the_per_player_ledger() {
        let mut entrants = Entrants { players: 0 };
        let mut data = buffer_for(3);
        entrants.append(&mut data, Pubkey::new_unique(), 45).unwrap();
        entrants.append(&mut data, Pubkey::new_unique(), 200).unwrap();
        entrants.append(&mut data, Pubkey::new_unique(), 1).unwrap();
        entrants.credit(&mut data, 2, 1).unwrap();

        let counts = entrants.ticket_counts(&data);
        assert_eq!(counts, vec![45, 200, 2]);
        assert_eq!(counts.iter().sum::<u64>(), 247);
    }
}

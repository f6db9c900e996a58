use anchor_lang::error_code;

#[error_code]
pub enum RaffleError {
    Overflow,
    InsufficientFunds,
    #[msg("Raffle duration must be at least one day")]
    InvalidTimestamp,
    #[msg("Bundle amount and price must be non-zero")]
    InvalidPurchase,
    #[msg("The raffle deadline has passed")]
    RaffleClosed,
    #[msg("The raffle deadline has not passed yet")]
    RaffleNotYetFinished,
    #[msg("Only the raffle authority can perform this action")]
    NotOwner,
    #[msg("The raffle authority cannot hold tickets in its own raffle")]
    OwnerExcluded,
    #[msg("This address has already claimed or purchased a ticket")]
    AlreadyClaimed,
    #[msg("The winner has already been picked")]
    AlreadySettled,
    #[msg("Nothing has been collected for this raffle")]
    EmptyPot,
    #[msg("No tickets have been sold")]
    NoParticipants,
    #[msg("Players cannot refer themselves")]
    SelfReferral,
    #[msg("The referred address has never held a ticket")]
    NotAPlayer,
    #[msg("Payout transfer failed")]
    TransferFailed,
    #[msg("The winner's payout account was not supplied")]
    WinnerAccountMissing,
    #[msg("Invalid SlotHashes account provided")]
    InvalidSlotHashesAccount,
    #[msg("Invalid token mint provided for this raffle")]
    InvalidTokenMint,
    #[msg("Token accounts are required for token raffles")]
    TokenAccountMissing,
    #[msg("Direct contributions are only supported for native-currency raffles")]
    NativePaymentOnly,
}

// Lottery Program - Account State
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{program_error::ProgramError, program_pack::IsInitialized};

/// Status of the current round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundState {
    /// Accepting entries
    Open,
    /// Entries closed, waiting for the randomness callback
    Calculating,
}

impl Default for RoundState {
    fn default() -> Self {
        RoundState::Open
    }
}

/// Borsh-encoded state stored in a fixed-size, zero-padded account.
///
/// A freshly allocated (all zero) account decodes to an uninitialized value,
/// so `load` can be used to check for prior initialization.
pub trait AccountState: BorshSerialize + BorshDeserialize + IsInitialized + Sized {
    /// Space to allocate for the account
    const LEN: usize;

    fn load(data: &[u8]) -> Result<Self, ProgramError> {
        if data.len() < Self::LEN {
            return Err(ProgramError::AccountDataTooSmall);
        }
        Self::deserialize(&mut &data[..]).map_err(|_| ProgramError::InvalidAccountData)
    }

    fn load_initialized(data: &[u8]) -> Result<Self, ProgramError> {
        let value = Self::load(data)?;
        if !value.is_initialized() {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(value)
    }

    fn save(&self, data: &mut [u8]) -> Result<(), ProgramError> {
        if data.len() < Self::LEN {
            return Err(ProgramError::AccountDataTooSmall);
        }
        let mut writer = data;
        self.serialize(&mut writer)
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }
}

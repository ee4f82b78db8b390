use crate::{EngineError, MoneyCents, ResultEngine};

/// A deposit to or a withdrawal from the savings account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SavingsMovement {
    Add(MoneyCents),
    Remove(MoneyCents),
}

impl SavingsMovement {
    /// Reads a signed amount: positive adds, negative removes. Zero is
    /// rejected.
    pub fn parse(input: &str) -> ResultEngine<Self> {
        let amount: MoneyCents = input.parse()?;
        Self::from_signed(amount)
    }

    pub fn from_signed(amount: MoneyCents) -> ResultEngine<Self> {
        if amount.is_zero() {
            return Err(EngineError::InvalidAmount(
                "enter a non-zero amount (positive to add, negative to withdraw)".to_string(),
            ));
        }
        if amount.is_positive() {
            Ok(Self::Add(amount))
        } else {
            Ok(Self::Remove(amount.abs()))
        }
    }

    /// Magnitude sent to the server.
    pub fn amount(self) -> MoneyCents {
        match self {
            Self::Add(amount) | Self::Remove(amount) => amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_selects_the_direction() {
        assert_eq!(
            SavingsMovement::parse("150").unwrap(),
            SavingsMovement::Add(MoneyCents::new(15_000))
        );
        let withdrawal = SavingsMovement::parse("-20,5").unwrap();
        assert_eq!(withdrawal, SavingsMovement::Remove(MoneyCents::new(2_050)));
        assert_eq!(withdrawal.amount(), MoneyCents::new(2_050));
    }

    #[test]
    fn zero_and_garbage_are_rejected() {
        assert!(matches!(
            SavingsMovement::parse("0"),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            SavingsMovement::parse("-0.00"),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(SavingsMovement::parse("ten").is_err());
    }
}

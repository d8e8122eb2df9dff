use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loyalty_core::{DomainError, DomainResult};

/// A loyalty account document.
///
/// Lives in the owning client's `accounts` subcollection. `points` never
/// goes below zero, and always equals the signed sum of the account's
/// transactions since creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    pub account_name: String,
    pub points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoyaltyAccount {
    /// Validate and open a fresh account with a zero balance.
    pub fn open(account_name: impl Into<String>, now: DateTime<Utc>) -> DomainResult<Self> {
        let account_name = account_name.into();
        if account_name.trim().is_empty() {
            return Err(DomainError::validation("account_name cannot be empty"));
        }

        Ok(Self {
            account_name,
            points: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Add `amount` points. `amount` must already be validated positive.
    pub fn apply_credit(&mut self, amount: i64, now: DateTime<Utc>) -> DomainResult<()> {
        self.points = self
            .points
            .checked_add(amount)
            .ok_or_else(|| DomainError::validation("credit would overflow the balance"))?;
        self.updated_at = now;
        Ok(())
    }

    /// Remove `amount` points; rejects any debit that would go below zero.
    pub fn apply_debit(&mut self, amount: i64, now: DateTime<Utc>) -> DomainResult<()> {
        if self.points - amount < 0 {
            return Err(DomainError::InsufficientBalance {
                balance: self.points,
                requested: amount,
            });
        }
        self.points -= amount;
        self.updated_at = now;
        Ok(())
    }
}

/// Validate a credit/debit amount: a positive integer.
///
/// Checked before any store access; fractional amounts never reach this
/// point (they fail JSON deserialization into `i64`).
pub fn validate_amount(amount: i64) -> DomainResult<()> {
    if amount <= 0 {
        return Err(DomainError::validation("amount must be a positive integer"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn open_starts_at_zero() {
        let account = LoyaltyAccount::open("groceries", test_time()).unwrap();
        assert_eq!(account.points, 0);
    }

    #[test]
    fn open_rejects_blank_name() {
        let err = LoyaltyAccount::open("  ", test_time()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn debit_below_zero_is_rejected_and_leaves_balance_untouched() {
        let mut account = LoyaltyAccount::open("groceries", test_time()).unwrap();
        account.apply_credit(1000, test_time()).unwrap();

        let err = account.apply_debit(1500, test_time()).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientBalance {
                balance: 1000,
                requested: 1500
            }
        );
        assert_eq!(account.points, 1000);
    }

    #[test]
    fn debit_down_to_exactly_zero_is_allowed() {
        let mut account = LoyaltyAccount::open("groceries", test_time()).unwrap();
        account.apply_credit(300, test_time()).unwrap();
        account.apply_debit(300, test_time()).unwrap();
        assert_eq!(account.points, 0);
    }

    #[test]
    fn zero_and_negative_amounts_fail_validation() {
        assert!(matches!(
            validate_amount(0),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            validate_amount(-5),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(validate_amount(1), Ok(()));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any sequence of credits and debits, the balance
        /// equals initial + Σcredits − Σdebits over the *accepted*
        /// operations, and never dips below zero.
        #[test]
        fn balance_is_the_signed_sum_of_accepted_operations(
            ops in prop::collection::vec((any::<bool>(), 1i64..10_000i64), 0..50)
        ) {
            let mut account = LoyaltyAccount::open("prop", test_time()).unwrap();
            let mut expected: i64 = 0;

            for (is_credit, amount) in ops {
                if is_credit {
                    account.apply_credit(amount, test_time()).unwrap();
                    expected += amount;
                } else {
                    match account.apply_debit(amount, test_time()) {
                        Ok(()) => expected -= amount,
                        Err(DomainError::InsufficientBalance { .. }) => {}
                        Err(other) => {
                            return Err(TestCaseError::fail(format!("unexpected error: {other:?}")));
                        }
                    }
                }

                prop_assert!(account.points >= 0);
                prop_assert_eq!(account.points, expected);
            }
        }
    }
}

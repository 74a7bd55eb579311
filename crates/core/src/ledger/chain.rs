//! Replay of an account's movement chain.
//!
//! `balance == opening_balance + Σ amount` in sequence order, and every
//! movement's `balance_after == balance_before + amount` with
//! `balance_before` equal to the previous `balance_after`.

use serde::{Deserialize, Serialize};
use tillbook_shared::Amount;

use super::movement::Movement;

/// The parts of a movement the chain check looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainLink {
    /// Sequence number.
    pub sequence: i64,
    /// Signed delta.
    pub amount: Amount,
    /// Snapshot before.
    pub balance_before: Amount,
    /// Snapshot after.
    pub balance_after: Amount,
}

impl From<&Movement> for ChainLink {
    fn from(m: &Movement) -> Self {
        Self {
            sequence: m.sequence,
            amount: m.amount,
            balance_before: m.balance_before,
            balance_after: m.balance_after,
        }
    }
}

/// First inconsistency found while replaying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainBreak {
    /// Sequence numbers are not 1, 2, 3, ...
    SequenceGap {
        /// Expected sequence.
        expected: i64,
        /// Sequence found.
        found: i64,
    },
    /// `balance_before` differs from the running balance.
    BeforeMismatch {
        /// Offending sequence.
        sequence: i64,
        /// Running balance.
        expected: Amount,
        /// Stored snapshot.
        found: Amount,
    },
    /// `balance_after != balance_before + amount`.
    AfterMismatch {
        /// Offending sequence.
        sequence: i64,
        /// Computed snapshot.
        expected: Amount,
        /// Stored snapshot.
        found: Amount,
    },
    /// Final replayed balance differs from the account row.
    BalanceMismatch {
        /// Replayed balance.
        replayed: Amount,
        /// Stored balance.
        stored: Amount,
    },
    /// Movement count differs from the account version.
    VersionMismatch {
        /// Movements found.
        movements: i64,
        /// Stored version.
        version: i64,
    },
}

/// Outcome of a chain replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    /// Seed the replay started from.
    pub opening_balance: Amount,
    /// Balance obtained by replaying every movement.
    pub replayed_balance: Amount,
    /// Balance stored on the account.
    pub stored_balance: Amount,
    /// Number of movements replayed.
    pub movement_count: i64,
    /// First break, if any.
    pub first_break: Option<ChainBreak>,
}

impl ChainReport {
    /// True when the chain is intact.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.first_break.is_none()
    }
}

/// Replays `links` (sorted by sequence) from `opening_balance`.
#[must_use]
pub fn verify_chain(
    opening_balance: Amount,
    stored_balance: Amount,
    version: i64,
    links: impl IntoIterator<Item = ChainLink>,
) -> ChainReport {
    let mut running = opening_balance;
    let mut count = 0i64;
    let mut first_break = None;

    for link in links {
        count += 1;
        if first_break.is_some() {
            running += link.amount;
            continue;
        }
        if link.sequence != count {
            first_break = Some(ChainBreak::SequenceGap {
                expected: count,
                found: link.sequence,
            });
        } else if link.balance_before != running {
            first_break = Some(ChainBreak::BeforeMismatch {
                sequence: link.sequence,
                expected: running,
                found: link.balance_before,
            });
        } else if link.balance_after != link.balance_before + link.amount {
            first_break = Some(ChainBreak::AfterMismatch {
                sequence: link.sequence,
                expected: link.balance_before + link.amount,
                found: link.balance_after,
            });
        }
        running += link.amount;
    }

    if first_break.is_none() {
        if running != stored_balance {
            first_break = Some(ChainBreak::BalanceMismatch {
                replayed: running,
                stored: stored_balance,
            });
        } else if count != version {
            first_break = Some(ChainBreak::VersionMismatch {
                movements: count,
                version,
            });
        }
    }

    ChainReport {
        opening_balance,
        replayed_balance: running,
        stored_balance,
        movement_count: count,
        first_break,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Builds a well-formed chain the way the engine writes it.
    fn build_chain(opening: Amount, deltas: &[i64]) -> (Vec<ChainLink>, Amount) {
        let mut running = opening;
        let mut links = Vec::with_capacity(deltas.len());
        for (i, cents) in deltas.iter().enumerate() {
            let amount = Amount::from_minor_units(*cents);
            links.push(ChainLink {
                sequence: i64::try_from(i).unwrap() + 1,
                amount,
                balance_before: running,
                balance_after: running + amount,
            });
            running += amount;
        }
        (links, running)
    }

    #[test]
    fn test_empty_chain_is_consistent() {
        let report = verify_chain(Amount::from(1000), Amount::from(1000), 0, vec![]);
        assert!(report.is_consistent());
        assert_eq!(report.movement_count, 0);
    }

    #[test]
    fn test_detects_tampered_snapshot() {
        let (mut links, final_balance) = build_chain(Amount::ZERO, &[1000, -250, 500]);
        links[1].balance_after = Amount::from_minor_units(999);
        let report = verify_chain(Amount::ZERO, final_balance, 3, links);
        assert_eq!(
            report.first_break,
            Some(ChainBreak::AfterMismatch {
                sequence: 2,
                expected: Amount::from_minor_units(750),
                found: Amount::from_minor_units(999),
            })
        );
    }

    #[test]
    fn test_detects_sequence_gap() {
        let (mut links, final_balance) = build_chain(Amount::ZERO, &[100, 200]);
        links[1].sequence = 3;
        let report = verify_chain(Amount::ZERO, final_balance, 2, links);
        assert_eq!(
            report.first_break,
            Some(ChainBreak::SequenceGap { expected: 2, found: 3 })
        );
    }

    #[test]
    fn test_detects_stored_balance_drift() {
        let (links, _) = build_chain(Amount::ZERO, &[100, 200]);
        let report = verify_chain(Amount::ZERO, Amount::from_minor_units(301), 2, links);
        assert!(matches!(
            report.first_break,
            Some(ChainBreak::BalanceMismatch { .. })
        ));
    }

    #[test]
    fn test_detects_version_drift() {
        let (links, final_balance) = build_chain(Amount::ZERO, &[100]);
        let report = verify_chain(Amount::ZERO, final_balance, 2, links);
        assert_eq!(
            report.first_break,
            Some(ChainBreak::VersionMismatch { movements: 1, version: 2 })
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A chain written movement by movement always replays to the stored balance.
        #[test]
        fn prop_replay_reproduces_balance(
            opening in 0i64..1_000_000,
            deltas in prop::collection::vec(-100_000i64..100_000, 0..50),
        ) {
            let opening = Amount::from_minor_units(opening);
            let (links, final_balance) = build_chain(opening, &deltas);
            let version = i64::try_from(links.len()).unwrap();
            let report = verify_chain(opening, final_balance, version, links);
            prop_assert!(report.is_consistent());
            prop_assert_eq!(
                report.replayed_balance,
                opening + deltas.iter().map(|c| Amount::from_minor_units(*c)).sum::<Amount>()
            );
        }
    }
}

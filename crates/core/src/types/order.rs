//! Human-scannable order identifiers.

use core::fmt;

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters used for the random fragment (base36, uppercase).
const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of the random fragment.
const RANDOM_LEN: usize = 4;

/// An order identifier in the form `<PREFIX>-<YYMMDD>-<XXXX>`,
/// e.g. `TRB-240615-X7K2`.
///
/// The id is meant to be read over the phone and written on a shipping
/// label, not to be a database key. With four base36 characters the
/// collision risk is acceptable at manual-fulfilment order volumes; a
/// persisted order store would need a collision-checked scheme instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Generate a new order id for the given date.
    ///
    /// The caller supplies the RNG so tests can pass a seeded one.
    pub fn generate(prefix: &str, date: NaiveDate, rng: &mut impl Rng) -> Self {
        let date_part = date.format("%y%m%d");
        let random: String = (0..RANDOM_LEN)
            .map(|_| {
                let idx = rng.random_range(0..ALPHABET.len());
                char::from(*ALPHABET.get(idx).unwrap_or(&b'0'))
            })
            .collect();
        Self(format!("{prefix}-{date_part}-{random}"))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that a string has the documented `PREFIX-YYMMDD-XXXX` shape.
    #[must_use]
    pub fn is_well_formed(s: &str) -> bool {
        let mut parts = s.split('-');
        let (Some(prefix), Some(date), Some(random), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };

        !prefix.is_empty()
            && prefix.chars().all(|c| c.is_ascii_uppercase())
            && date.len() == 6
            && date.chars().all(|c| c.is_ascii_digit())
            && random.len() == RANDOM_LEN
            && random.bytes().all(|b| ALPHABET.contains(&b))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn june_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_generate_has_documented_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = OrderId::generate("TRB", june_15(), &mut rng);
        assert!(OrderId::is_well_formed(id.as_str()), "got {id}");
        assert!(id.as_str().starts_with("TRB-240615-"));
        assert_eq!(id.as_str().len(), "TRB-240615-XXXX".len());
    }

    #[test]
    fn test_generate_is_deterministic_for_seeded_rng() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(
            OrderId::generate("TRB", june_15(), &mut a),
            OrderId::generate("TRB", june_15(), &mut b)
        );
    }

    #[test]
    fn test_is_well_formed_accepts_example() {
        assert!(OrderId::is_well_formed("TRB-240615-X7K2"));
    }

    #[test]
    fn test_is_well_formed_rejects_bad_shapes() {
        assert!(!OrderId::is_well_formed(""));
        assert!(!OrderId::is_well_formed("TRB-240615"));
        assert!(!OrderId::is_well_formed("trb-240615-X7K2"));
        assert!(!OrderId::is_well_formed("TRB-2406-X7K2"));
        assert!(!OrderId::is_well_formed("TRB-240615-x7k2"));
        assert!(!OrderId::is_well_formed("TRB-240615-X7K2-EXTRA"));
    }
}

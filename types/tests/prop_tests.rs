use proptest::prelude::*;

use cleanchain_types::{Coordinates, Timestamp, TokenAmount, WalletId};

proptest! {
    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Wallet identifiers are case-insensitive.
    #[test]
    fn wallet_case_insensitive(raw in "0x[0-9a-fA-F]{4,40}") {
        let upper = WalletId::parse(raw.to_uppercase()).unwrap();
        let lower = WalletId::parse(raw.to_lowercase()).unwrap();
        prop_assert_eq!(upper, lower);
    }

    /// Ledger conversion scales linearly.
    #[test]
    fn ledger_units_scale(tokens in 0u64..1_000_000_000) {
        let units = TokenAmount::new(tokens).to_ledger_units(18).unwrap();
        prop_assert_eq!(units, tokens as u128 * 1_000_000_000_000_000_000);
    }

    /// Any in-range pair is accepted.
    #[test]
    fn in_range_coordinates_valid(lat in -90.0f64..=90.0, lng in -180.0f64..=180.0) {
        prop_assert!(Coordinates::new(lat, lng).is_ok());
    }
}

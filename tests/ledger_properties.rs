//! Property tests for ledger conservation.

use proptest::prelude::*;
use stocksim::domain::ledger::Ledger;

#[derive(Debug, Clone)]
enum Order {
    Buy { instrument: usize, price: f64, amount: u64 },
    Sell { instrument: usize, price: f64, amount: u64 },
}

const UNIVERSE: [&str; 3] = ["AAA", "BBB", "CCC"];

fn universe() -> Vec<String> {
    UNIVERSE.iter().map(|s| s.to_string()).collect()
}

fn order_strategy() -> impl Strategy<Value = Order> {
    (any::<bool>(), 0..UNIVERSE.len(), 0.5f64..200.0, 0u64..50).prop_map(
        |(is_buy, instrument, price, amount)| {
            if is_buy {
                Order::Buy { instrument, price, amount }
            } else {
                Order::Sell { instrument, price, amount }
            }
        },
    )
}

proptest! {
    #[test]
    fn cash_never_negative_and_rejections_leave_state_unchanged(
        initial in 1.0f64..10_000.0,
        orders in prop::collection::vec(order_strategy(), 0..60),
    ) {
        let mut ledger = Ledger::new(initial, &universe());

        for order in orders {
            let before = ledger.clone();
            let (filled, instrument, price, amount, is_buy) = match order {
                Order::Buy { instrument, price, amount } => {
                    (ledger.buy(UNIVERSE[instrument], price, amount), instrument, price, amount, true)
                }
                Order::Sell { instrument, price, amount } => {
                    (ledger.sell(UNIVERSE[instrument], price, amount), instrument, price, amount, false)
                }
            };

            prop_assert!(ledger.balance() >= 0.0);
            if !filled {
                prop_assert_eq!(&ledger, &before);
                continue;
            }

            let name = UNIVERSE[instrument];
            let value = price * amount as f64;
            if is_buy {
                prop_assert_eq!(ledger.shares(name), before.shares(name) + amount);
                prop_assert!((before.balance() - ledger.balance() - value).abs() < 1e-6);
            } else {
                prop_assert_eq!(ledger.shares(name) + amount, before.shares(name));
                prop_assert!((ledger.balance() - before.balance() - value).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn buying_more_than_cash_allows_is_rejected(
        initial in 1.0f64..1_000.0,
        price in 1.0f64..100.0,
    ) {
        let mut ledger = Ledger::new(initial, &universe());
        let too_many = (initial / price).floor() as u64 + 1;

        prop_assert!(!ledger.buy("AAA", price, too_many));
        prop_assert_eq!(ledger.balance(), initial);
        prop_assert_eq!(ledger.shares("AAA"), 0);
    }
}

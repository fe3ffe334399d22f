use clantimer_core::{
    account_availability, format_remaining, is_available, order_accounts, order_timers,
    reconcile_completions, remaining, Account, Snapshot, Timer,
};
use proptest::prelude::*;

const NOW: i64 = 1_760_000_000_000;

fn timer_strategy() -> impl Strategy<Value = Timer> {
    (
        "[A-Za-z][A-Za-z0-9 ]{0,8}",
        proptest::option::of(-86_400_000i64..86_400_000),
    )
        .prop_map(|(name, offset)| Timer {
            end_timestamp: offset.map(|offset| NOW + offset),
            ..Timer::new(name)
        })
}

fn account_strategy() -> impl Strategy<Value = Account> {
    (
        "[A-Za-z][A-Za-z0-9]{0,6}",
        proptest::collection::vec(timer_strategy(), 0..8),
    )
        .prop_map(|(name, timers)| Account::with_timers(name, timers))
}

fn snapshot_strategy() -> impl Strategy<Value = Snapshot> {
    proptest::collection::vec(account_strategy(), 0..6).prop_map(Snapshot::new)
}

proptest! {
    #[test]
    fn availability_matches_remaining(timer in timer_strategy(), now in (NOW - 100_000_000)..(NOW + 100_000_000)) {
        let left = remaining(&timer, now);
        prop_assert!(left >= 0);
        prop_assert_eq!(is_available(&timer, now), left == 0);
    }

    #[test]
    fn reconcile_is_idempotent(snapshot in snapshot_strategy()) {
        let once = reconcile_completions(&snapshot, NOW);
        let twice = reconcile_completions(&once, NOW);
        prop_assert_eq!(&once, &twice);
    }

    #[test]
    fn reconcile_preserves_availability_view(snapshot in snapshot_strategy()) {
        let reconciled = reconcile_completions(&snapshot, NOW);
        for (before, after) in snapshot.accounts.iter().zip(&reconciled.accounts) {
            prop_assert_eq!(account_availability(before, NOW), account_availability(after, NOW));
            prop_assert_eq!(before.id, after.id);
            prop_assert!(after
                .timers
                .iter()
                .all(|timer| timer.end_timestamp.map_or(true, |end| end > NOW)));
        }
    }

    #[test]
    fn account_order_is_deterministic_permutation(snapshot in snapshot_strategy()) {
        let first: Vec<_> = order_accounts(&snapshot.accounts, NOW).iter().map(|a| a.id).collect();
        let second: Vec<_> = order_accounts(&snapshot.accounts, NOW).iter().map(|a| a.id).collect();
        prop_assert_eq!(&first, &second);

        let mut sorted_ids = first.clone();
        sorted_ids.sort();
        let mut input_ids: Vec<_> = snapshot.accounts.iter().map(|a| a.id).collect();
        input_ids.sort();
        prop_assert_eq!(sorted_ids, input_ids);

        let ordered = order_accounts(&snapshot.accounts, NOW);
        for pair in ordered.windows(2) {
            let a = account_availability(pair[0], NOW).available;
            let b = account_availability(pair[1], NOW).available;
            prop_assert!(a >= b);
        }
    }

    #[test]
    fn timer_order_is_non_decreasing_remaining(account in account_strategy()) {
        let ordered = order_timers(&account, NOW);
        prop_assert_eq!(ordered.len(), account.timers.len());
        for pair in ordered.windows(2) {
            prop_assert!(remaining(pair[0], NOW) <= remaining(pair[1], NOW));
        }
    }

    #[test]
    fn formatted_minutes_stay_below_sixty(ms in 0i64..1_000_000_000) {
        let text = format_remaining(ms);
        let minutes: i64 = text
            .split_whitespace()
            .nth(1)
            .and_then(|part| part.strip_suffix('m'))
            .and_then(|value| value.parse().ok())
            .unwrap();
        prop_assert!(minutes < 60);
    }
}

#[test]
fn availability_tie_orders_sooner_account_first() {
    let minute = 60_000;
    let a = Account::with_timers(
        "A",
        vec![Timer::new("T1"), Timer::running("T2", NOW + 30 * minute)],
    );
    let b = Account::with_timers(
        "B",
        vec![Timer::running("T1", NOW + 5 * minute), Timer::new("T2")],
    );
    let accounts = vec![a, b];

    assert_eq!(account_availability(&accounts[0], NOW).to_string(), "1/2");
    assert_eq!(account_availability(&accounts[1], NOW).to_string(), "1/2");
    let ordered: Vec<&str> = order_accounts(&accounts, NOW)
        .iter()
        .map(|account| account.name.as_str())
        .collect();
    assert_eq!(ordered, ["B", "A"]);
}

#[test]
fn elapsed_timer_is_cleared_by_reconciliation() {
    let timer = Timer::running("Laboratory", NOW - 10_000);
    assert_eq!(remaining(&timer, NOW), 0);
    assert!(is_available(&timer, NOW));

    let snapshot = Snapshot::new(vec![Account::with_timers("Main", vec![timer])]);
    let reconciled = reconcile_completions(&snapshot, NOW);
    assert_eq!(reconciled.accounts[0].timers[0].end_timestamp, None);
}

//! Plain-text rendering of account and timer views.

use chrono::{Local, TimeZone};
use clantimer_core::{AccountSummary, CompletedTimer, TimerView};

pub fn account_list(summaries: &[AccountSummary]) -> String {
    if summaries.is_empty() {
        return "No accounts yet. Add one with `clantimer add-account <name>`.\n".to_string();
    }

    let width = name_width(summaries.iter().map(|summary| summary.name.as_str()));
    let mut out = String::new();
    for summary in summaries {
        let badge = summary.availability.to_string();
        match &summary.closest {
            Some(closest) => out.push_str(&format!(
                "{:<width$}  {:>5}  {}\n",
                summary.name,
                badge,
                closest.label()
            )),
            None => out.push_str(&format!("{:<width$}  {:>5}\n", summary.name, badge)),
        }
    }
    out
}

pub fn timer_list(account_name: &str, timers: &[TimerView]) -> String {
    let mut out = format!("{account_name}\n");
    if timers.is_empty() {
        out.push_str("  (no timers)\n");
        return out;
    }

    let width = name_width(timers.iter().map(|timer| timer.name.as_str()));
    for timer in timers {
        let ready_at = timer
            .end_timestamp
            .filter(|_| !timer.available)
            .and_then(local_clock_time);
        match ready_at {
            Some(ready_at) => out.push_str(&format!(
                "  {:<width$}  {}  (ready {ready_at})\n",
                timer.name,
                timer.status_label()
            )),
            None => out.push_str(&format!(
                "  {:<width$}  {}\n",
                timer.name,
                timer.status_label()
            )),
        }
    }
    out
}

pub fn completion(completed: &CompletedTimer) -> String {
    format!(
        "{} / {} is ready",
        completed.account_name, completed.timer_name
    )
}

fn local_clock_time(epoch_ms: i64) -> Option<String> {
    Local
        .timestamp_millis_opt(epoch_ms)
        .single()
        .map(|instant| instant.format("%a %H:%M").to_string())
}

fn name_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names.map(|name| name.chars().count()).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{account_list, timer_list};
    use clantimer_core::service::views;
    use clantimer_core::{Account, Snapshot, Timer};

    const NOW: i64 = 1_760_000_000_000;

    #[test]
    fn empty_account_list_has_hint() {
        assert!(account_list(&[]).contains("add-account"));
    }

    #[test]
    fn account_rows_show_badge_and_closest() {
        let snapshot = Snapshot::new(vec![
            Account::with_timers("Main", vec![Timer::running("Laboratory", NOW + 5_400_000)]),
            Account::with_timers("Alternate", vec![Timer::new("Builder 1")]),
        ]);
        let text = account_list(&views::account_summaries(&snapshot, NOW));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Alternate    1/1");
        assert_eq!(lines[1], "Main         0/1  Laboratory: 1h 30m");
    }

    #[test]
    fn available_timers_have_no_ready_time() {
        let account = Account::with_timers(
            "Main",
            vec![Timer::new("Builder 1"), Timer::running("Pet House", NOW + 60_000)],
        );
        let id = account.id;
        let snapshot = Snapshot::new(vec![account]);
        let views = views::timer_views(&snapshot, id, NOW).unwrap();

        let text = timer_list("Main", &views);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Main");
        assert_eq!(lines[1], "  Builder 1  Available");
        assert!(lines[2].starts_with("  Pet House  0h 1m  (ready "));
    }
}

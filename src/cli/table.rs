use console::style;
use crate::engine::RunnerSnapshot;

fn format_interval(secs: f64) -> String {
    let minutes = secs / 60.0;
    if minutes.fract() == 0.0 {
        format!("{}min", minutes as u64)
    } else {
        format!("{:.1}min", minutes)
    }
}

/// Plain rows, one per runner, sorted by agent name.
pub fn status_rows(snapshots: &[RunnerSnapshot]) -> Vec<[String; 6]> {
    let mut sorted: Vec<&RunnerSnapshot> = snapshots.iter().collect();
    sorted.sort_by(|a, b| a.agent_name.cmp(&b.agent_name));
    sorted
        .into_iter()
        .map(|s| {
            [
                s.agent_name.clone(),
                format_interval(s.interval_secs),
                s.cycles_completed.to_string(),
                s.last_activation
                    .map(|t| t.format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "Never".into()),
                s.error_count.to_string(),
                s.rate_limited_count.to_string(),
            ]
        })
        .collect()
}

pub fn print_status_table(snapshots: &[RunnerSnapshot]) {
    const HEADERS: [&str; 6] = [
        "Agent",
        "Cycle Interval",
        "Cycles",
        "Last Activation",
        "Errors",
        "Rate Limited",
    ];
    let rows = status_rows(snapshots);

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    println!("\n{}", style("Engine Status").bold());
    let header: Vec<String> = HEADERS
        .iter()
        .zip(widths.iter())
        .map(|(h, w)| format!("{:<w$}", h, w = *w))
        .collect();
    println!("{}", style(header.join("  ")).bold());

    for row in rows {
        println!(
            "{}  {}  {}  {}  {}  {}",
            style(format!("{:<w$}", row[0], w = widths[0])).cyan(),
            style(format!("{:<w$}", row[1], w = widths[1])).blue(),
            style(format!("{:<w$}", row[2], w = widths[2])).green(),
            style(format!("{:<w$}", row[3], w = widths[3])).yellow(),
            style(format!("{:<w$}", row[4], w = widths[4])).red(),
            style(format!("{:<w$}", row[5], w = widths[5])).magenta(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::config::AgentSpec;
    use crate::engine::RunnerState;

    #[test]
    fn test_rows_sorted_and_formatted() {
        let b = AgentSpec::new("b", "Beta", Duration::from_secs(90), "go");
        let a = AgentSpec::new("a", "Alpha", Duration::from_secs(900), "go");
        let snapshots = vec![
            RunnerSnapshot::new(&b, &RunnerState { error_count: 2, ..Default::default() }),
            RunnerSnapshot::new(&a, &RunnerState { cycles_completed: 7, ..Default::default() }),
        ];

        let rows = status_rows(&snapshots);
        assert_eq!(rows[0][0], "Alpha");
        assert_eq!(rows[0][1], "15min");
        assert_eq!(rows[0][2], "7");
        assert_eq!(rows[0][3], "Never");
        assert_eq!(rows[1][1], "1.5min");
        assert_eq!(rows[1][4], "2");
    }
}

//! Per-line execution order annotation of a source file.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::flowgraph::extract_file_info;
use super::location::basename;
use super::trace_log::TraceEvent;

/// line number -> execution orders (1-based) that reached it.
pub type ExecutionOrders = BTreeMap<u32, Vec<u64>>;

/// Collect execution orders for `source_name` (compared by basename) from
/// the raw, non-simplified log. Only transition targets count, and the
/// order counter advances only on matching targets.
pub fn execution_orders(events: &[TraceEvent], source_name: &str) -> ExecutionOrders {
    let wanted = basename(source_name);
    let mut orders = ExecutionOrders::new();
    let mut next = 1u64;

    for event in events {
        let (file, line) = extract_file_info(&event.to);
        if file != wanted {
            continue;
        }
        let Ok(line) = line.parse::<u32>() else {
            continue;
        };
        orders.entry(line).or_default().push(next);
        next += 1;
    }
    orders
}

/// Render the annotated listing. Every physical line of `source` is kept
/// verbatim, including its original line terminator.
pub fn render_annotated(source_label: &str, source: &str, orders: &ExecutionOrders) -> String {
    let mut out = String::with_capacity(source.len() * 2);
    let _ = writeln!(out, "ANNOTATED SOURCE: {source_label}");
    let _ = writeln!(out, "Line numbers show execution order");
    let _ = writeln!(out, "{}", "-".repeat(60));
    out.push('\n');

    for (idx, line) in source.split_inclusive('\n').enumerate() {
        let line_no = idx as u32 + 1;
        let column = orders
            .get(&line_no)
            .map(|o| o.iter().map(u64::to_string).collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        let _ = write!(out, "{line_no:4} [{column:<10}] {line}");
    }
    out
}

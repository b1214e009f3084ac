use crate::{SimulationError, SimulationSummary, SummaryMessage};
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::sync::mpsc::Receiver;

fn format_summaries(summaries: &BTreeMap<usize, SimulationSummary>) -> Vec<String> {
    const WIDTH: usize = 80;
    summaries
        .iter()
        .map(|(id, summary)| {
            let sim_num = format!("simulation #{}", id);
            let header = format!("{:-^WIDTH$}\n", sim_num);
            format!("{}{}\n{}\n", header, summary, "-".repeat(WIDTH))
        })
        .collect()
}

/// Receives summaries until every id in `ids` has reported that it is finished, merging the
/// summaries sent under the same id.
pub fn collect_summaries(
    receiver: Receiver<SummaryMessage>,
    mut ids: HashSet<usize>,
) -> Result<BTreeMap<usize, SimulationSummary>, SimulationError> {
    let mut summaries: BTreeMap<usize, SimulationSummary> = BTreeMap::new();
    while !ids.is_empty() {
        let (cur_summary, id) = receiver
            .recv()
            .map_err(|e| SimulationError::SendingError(e.to_string()))?;
        match cur_summary {
            Some(cur_summary) => {
                summaries
                    .entry(id)
                    .and_modify(|summary| summary.merge(&cur_summary))
                    .or_insert(cur_summary);
            }
            None => {
                ids.remove(&id);
            }
        }
    }
    Ok(summaries)
}

/// Collects every summary and writes them to `writer` as formatted tables, ordered by id.
pub fn write_summaries(
    receiver: Receiver<SummaryMessage>,
    ids: HashSet<usize>,
    mut writer: impl Write,
) -> Result<(), SimulationError> {
    let summaries = collect_summaries(receiver, ids)?;
    for formatted in format_summaries(&summaries) {
        writer.write_all(formatted.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Collects every summary and writes them to `writer` as a JSON array, ordered by id.
pub fn write_summaries_json(
    receiver: Receiver<SummaryMessage>,
    ids: HashSet<usize>,
    mut writer: impl Write,
) -> Result<(), SimulationError> {
    let summaries = collect_summaries(receiver, ids)?;
    let summaries: Vec<&SimulationSummary> = summaries.values().collect();
    serde_json::to_writer_pretty(&mut writer, &summaries)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack_lib::Statistics;
    use std::sync::mpsc;

    fn summary(label: &str, rounds: u32, early_endings: u32) -> SimulationSummary {
        SimulationSummary {
            label: label.to_string(),
            simulations: 1,
            early_endings,
            stats: Statistics {
                rounds,
                ..Statistics::default()
            },
        }
    }

    #[test]
    fn summaries_are_merged_per_id() {
        let (sender, receiver) = mpsc::channel();
        sender.send((Some(summary("a", 10, 0)), 1)).unwrap();
        sender.send((Some(summary("b", 3, 1)), 2)).unwrap();
        sender.send((Some(summary("a", 7, 1)), 1)).unwrap();
        sender.send((None, 1)).unwrap();
        sender.send((None, 2)).unwrap();

        let summaries = collect_summaries(receiver, [1, 2].into_iter().collect()).unwrap();
        assert_eq!(summaries[&1].simulations, 2);
        assert_eq!(summaries[&1].early_endings, 1);
        assert_eq!(summaries[&1].stats.rounds, 17);
        assert_eq!(summaries[&2].label, "b");
    }

    #[test]
    fn disconnected_senders_are_an_error() {
        let (sender, receiver) = mpsc::channel();
        sender.send((Some(summary("a", 1, 0)), 1)).unwrap();
        drop(sender);
        let result = collect_summaries(receiver, [1].into_iter().collect());
        assert!(matches!(result, Err(SimulationError::SendingError(_))));
    }

    #[test]
    fn written_in_id_order() {
        let (sender, receiver) = mpsc::channel();
        sender.send((Some(summary("second", 1, 0)), 2)).unwrap();
        sender.send((Some(summary("first", 1, 0)), 1)).unwrap();
        sender.send((None, 2)).unwrap();
        sender.send((None, 1)).unwrap();

        let mut out = Vec::new();
        write_summaries(receiver, [1, 2].into_iter().collect(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let first = text.find("strategy: first").unwrap();
        let second = text.find("strategy: second").unwrap();
        assert!(first < second);
        assert!(text.contains("simulation #1"));
    }

    #[test]
    fn json_output_parses() {
        let (sender, receiver) = mpsc::channel();
        sender.send((Some(summary("only", 4, 0)), 1)).unwrap();
        sender.send((None, 1)).unwrap();

        let mut out = Vec::new();
        write_summaries_json(receiver, [1].into_iter().collect(), &mut out).unwrap();
        let parsed: Vec<SimulationSummary> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, vec![summary("only", 4, 0)]);
    }
}

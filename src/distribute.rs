//! Even distribution of contact records across agents.

use crate::error::IngestError;
use crate::models::{ContactRecord, Distribution};

/// Splits `records` across `agent_ids` as evenly as possible.
///
/// With `n` records and `m` agents, the first `n % m` agents (in the given
/// order) receive `n / m + 1` records and the rest receive `n / m`. Records
/// are carved into contiguous slices in their original order, so
/// concatenating every distribution's items reconstructs the input. Every
/// agent gets exactly one [`Distribution`], possibly empty when `n < m`.
///
/// Pure function with no shared state: identical inputs always produce
/// identical output. The caller is responsible for supplying agents in a
/// deterministic order — fairness of the remainder depends on it.
///
/// Fails only when `agent_ids` is empty.
pub fn distribute(
    records: Vec<ContactRecord>,
    agent_ids: &[String],
) -> Result<Vec<Distribution>, IngestError> {
    if agent_ids.is_empty() {
        return Err(IngestError::NoActiveAgents);
    }

    let base = records.len() / agent_ids.len();
    let remainder = records.len() % agent_ids.len();

    let mut cursor = records.into_iter();
    let distributions = agent_ids
        .iter()
        .enumerate()
        .map(|(index, agent_id)| {
            let share = base + usize::from(index < remainder);
            let items: Vec<ContactRecord> = cursor.by_ref().take(share).collect();
            Distribution {
                agent_id: agent_id.clone(),
                assigned_count: items.len(),
                items,
            }
        })
        .collect();

    Ok(distributions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<ContactRecord> {
        (0..n)
            .map(|i| ContactRecord {
                name: format!("contact-{i}"),
                phone: format!("+1555{i:04}"),
                notes: String::new(),
            })
            .collect()
    }

    fn agents(m: usize) -> Vec<String> {
        (0..m).map(|i| format!("agent-{i}")).collect()
    }

    #[test]
    fn empty_agent_list_is_an_error() {
        assert!(matches!(
            distribute(records(5), &[]),
            Err(IngestError::NoActiveAgents)
        ));
    }

    #[test]
    fn counts_are_floor_or_floor_plus_one_and_sum_to_n() {
        for n in 0..=25 {
            for m in 1..=7 {
                let out = distribute(records(n), &agents(m)).unwrap();
                assert_eq!(out.len(), m, "one distribution per agent");

                let total: usize = out.iter().map(|d| d.assigned_count).sum();
                assert_eq!(total, n, "n={n} m={m}");

                let base = n / m;
                let larger = out.iter().filter(|d| d.assigned_count == base + 1).count();
                assert_eq!(larger, n % m, "n={n} m={m}");
                for d in &out {
                    assert!(d.assigned_count == base || d.assigned_count == base + 1);
                    assert_eq!(d.assigned_count, d.items.len());
                }

                // The agents with the larger share are the first n % m.
                for (i, d) in out.iter().enumerate() {
                    let expected = base + usize::from(i < n % m);
                    assert_eq!(d.assigned_count, expected, "n={n} m={m} i={i}");
                }
            }
        }
    }

    #[test]
    fn concatenation_preserves_original_order() {
        let input = records(10);
        let out = distribute(input.clone(), &agents(3)).unwrap();

        assert_eq!(out[0].assigned_count, 4);
        assert_eq!(out[1].assigned_count, 3);
        assert_eq!(out[2].assigned_count, 3);

        let rebuilt: Vec<ContactRecord> =
            out.into_iter().flat_map(|d| d.items).collect();
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn zero_records_yields_all_empty_distributions() {
        let out = distribute(records(0), &agents(4)).unwrap();
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|d| d.assigned_count == 0 && d.items.is_empty()));
    }

    #[test]
    fn single_agent_takes_everything() {
        let input = records(7);
        let out = distribute(input.clone(), &agents(1)).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].items, input);
    }

    #[test]
    fn fewer_records_than_agents() {
        let out = distribute(records(2), &agents(5)).unwrap();
        let counts: Vec<usize> = out.iter().map(|d| d.assigned_count).collect();
        assert_eq!(counts, vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn identical_inputs_produce_identical_output() {
        let a = distribute(records(13), &agents(4)).unwrap();
        let b = distribute(records(13), &agents(4)).unwrap();
        assert_eq!(a, b);
    }
}

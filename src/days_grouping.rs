use indicatif::ParallelProgressIterator;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use super::records::{FileRecord, LineName, ServiceCode};
use super::utils::progress_bar_for_count;

/// Label of a days group, unique within one run only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DaysGroupId(pub usize);

/// Records of one service line whose operating days are subset-linked and
/// so compete for the same dates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DaysGroup {
    pub id: DaysGroupId,
    pub service_code: ServiceCode,
    pub line_name: LineName,
    /// Indices into the record table, in table order.
    pub members: Vec<usize>,
}

/// All records sharing a service code and line name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    pub service_code: ServiceCode,
    pub line_name: LineName,
    pub members: Vec<usize>,
}

pub fn partition(records: &[FileRecord]) -> Vec<Partition> {
    let mut partitions: BTreeMap<(&ServiceCode, &LineName), Vec<usize>> = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        partitions
            .entry((&record.service_code, &record.line_name))
            .or_default()
            .push(index);
    }
    partitions
        .into_iter()
        .map(|((service_code, line_name), members)| Partition {
            service_code: service_code.clone(),
            line_name: line_name.clone(),
            members,
        })
        .collect()
}

/// Groups every service line of the table. Partitions are independent and
/// run in parallel; labels match a sequential pass because each partition
/// starts counting after the records of the partitions before it.
pub fn group(records: &[FileRecord]) -> Vec<DaysGroup> {
    let partitions = partition(records);
    let first_labels: Vec<usize> = partitions
        .iter()
        .scan(0, |seen, partition| {
            let first_label = *seen;
            *seen += partition.members.len();
            Some(first_label)
        })
        .collect();

    info!("Grouping {} service lines by operating days", partitions.len());
    let progress = progress_bar_for_count(partitions.len());
    let groups: Vec<DaysGroup> = partitions
        .par_iter()
        .zip(first_labels)
        .progress_with(progress)
        .map(|(partition, first_label)| group_partition(records, partition, first_label))
        .collect::<Vec<Vec<DaysGroup>>>()
        .into_iter()
        .flatten()
        .collect();
    info!("Days groups: {}", groups.len());
    groups
}

/// Links each record to the records ahead of it whose operating days contain
/// its own, propagating labels as it goes.
///
/// When the whole partition shares one revision every record is compared with
/// every other; otherwise only with records later in table order. On a link
/// two unlabelled records both take the current label, an unlabelled later
/// record inherits the earlier one's label, and in every other case the
/// earlier record takes the later one's label. The result depends on
/// traversal order: a chain such as `Monday ⊆ Monday-Tuesday ⊇ Tuesday` only
/// joins up when the subset record comes first.
pub fn group_partition(
    records: &[FileRecord],
    partition: &Partition,
    first_label: usize,
) -> Vec<DaysGroup> {
    let members = &partition.members;
    let days: Vec<_> = members.iter().map(|&i| &records[i].operating_days).collect();
    let single_revision = members
        .iter()
        .map(|&i| records[i].revision_number)
        .collect::<BTreeSet<_>>()
        .len()
        == 1;

    let mut labels: Vec<Option<usize>> = vec![None; members.len()];
    let mut counter = first_label;
    for current in 0..members.len() {
        counter += 1;
        let start = if single_revision { 0 } else { current + 1 };
        for next in start..members.len() {
            if !days[current].is_subset_of(days[next]) {
                continue;
            }
            match (labels[current], labels[next]) {
                (None, None) => {
                    labels[current] = Some(counter);
                    labels[next] = Some(counter);
                }
                (Some(label), None) => labels[next] = Some(label),
                (_, Some(label)) => labels[current] = Some(label),
            }
        }
        if labels[current].is_none() {
            labels[current] = Some(counter);
        }
    }

    let mut grouped: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (&member, label) in members.iter().zip(labels) {
        if let Some(label) = label {
            grouped.entry(label).or_default().push(member);
        }
    }
    debug!(
        service_code = %partition.service_code,
        line_name = %partition.line_name,
        groups = grouped.len(),
        "grouped service line"
    );
    grouped
        .into_iter()
        .map(|(label, members)| DaysGroup {
            id: DaysGroupId(label),
            service_code: partition.service_code.clone(),
            line_name: partition.line_name.clone(),
            members,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::record;

    fn whole_partition(records: &[FileRecord]) -> Partition {
        Partition {
            service_code: records[0].service_code.clone(),
            line_name: records[0].line_name.clone(),
            members: (0..records.len()).collect(),
        }
    }

    fn member_sets(groups: &[DaysGroup]) -> Vec<Vec<usize>> {
        groups.iter().map(|group| group.members.clone()).collect()
    }

    #[test]
    fn test_disjoint_day_patterns_stay_apart() {
        let records = vec![
            record("a.xml", "PB1:1", "1", "2024-01-01", "", 1, "Monday-Friday"),
            record("b.xml", "PB1:1", "1", "2024-01-01", "", 1, "Saturday"),
            record("c.xml", "PB1:1", "1", "2024-01-01", "", 2, "Monday-Friday"),
        ];
        let groups = group_partition(&records, &whole_partition(&records), 0);
        assert_eq!(member_sets(&groups), vec![vec![0, 2], vec![1]]);
        assert_eq!(groups[0].id, DaysGroupId(1));
        assert_eq!(groups[1].id, DaysGroupId(2));
    }

    #[test]
    fn test_unlabelled_record_inherits_later_label() {
        let records = vec![
            record("a.xml", "PB1:1", "1", "2024-01-01", "", 1, "Monday"),
            record("b.xml", "PB1:1", "1", "2024-01-01", "", 1, "Tuesday"),
            record("c.xml", "PB1:1", "1", "2024-01-01", "", 2, "Monday-Friday"),
        ];
        let groups = group_partition(&records, &whole_partition(&records), 0);
        assert_eq!(member_sets(&groups), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_later_label_wins_when_both_labelled() {
        let records = vec![
            record("p.xml", "PB1:1", "1", "2024-01-01", "", 1, "Saturday"),
            record("q.xml", "PB1:1", "1", "2024-01-01", "", 2, "Monday"),
            record("r.xml", "PB1:1", "1", "2024-01-01", "", 3, "Monday"),
            record("s.xml", "PB1:1", "1", "2024-01-01", "", 4, "Monday-Saturday"),
        ];
        let groups = group_partition(&records, &whole_partition(&records), 0);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, DaysGroupId(1));
        assert_eq!(groups[0].members, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_subset_link_only_looks_ahead() {
        let records = vec![
            record("a.xml", "PB1:1", "1", "2024-01-01", "", 1, "Monday"),
            record("b.xml", "PB1:1", "1", "2024-01-01", "", 2, "Monday-Tuesday"),
            record("c.xml", "PB1:1", "1", "2024-01-01", "", 3, "Tuesday"),
        ];
        let groups = group_partition(&records, &whole_partition(&records), 0);
        assert_eq!(member_sets(&groups), vec![vec![0, 1], vec![2]]);
        assert_eq!(groups[1].id, DaysGroupId(3));
    }

    #[test]
    fn test_single_revision_scans_whole_partition() {
        // Tuesday comes after Monday-Tuesday here, so only the full scan links them.
        let records = vec![
            record("a.xml", "PB1:1", "1", "2024-01-01", "", 2, "Monday-Tuesday"),
            record("b.xml", "PB1:1", "1", "2024-01-01", "", 2, "Tuesday"),
            record("c.xml", "PB1:1", "1", "2024-01-01", "", 2, "Sunday"),
        ];
        let groups = group_partition(&records, &whole_partition(&records), 0);
        assert_eq!(member_sets(&groups), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_labels_are_unique_across_partitions() {
        let records = vec![
            record("a.xml", "PB1:1", "1", "2024-01-01", "", 1, "Monday-Friday"),
            record("b.xml", "PB1:1", "1", "2024-01-01", "", 2, "Monday-Friday"),
            record("c.xml", "PB1:1", "2", "2024-01-01", "", 1, "Saturday"),
            record("d.xml", "PB2:7", "7", "2024-01-01", "", 1, "Sunday"),
        ];
        let groups = group(&records);
        let ids: Vec<_> = groups.iter().map(|group| group.id).collect();
        assert_eq!(ids, vec![DaysGroupId(1), DaysGroupId(3), DaysGroupId(4)]);
        assert_eq!(member_sets(&groups), vec![vec![0, 1], vec![2], vec![3]]);
        assert_eq!(groups[1].line_name, LineName("2".to_string()));
    }
}

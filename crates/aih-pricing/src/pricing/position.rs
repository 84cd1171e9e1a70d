use super::domain::{ProcedureCategory, ProcedureRecord};

/// A procedure line paired with the category it was assigned.
#[derive(Debug, Clone, Copy)]
pub struct Classified<'a> {
    pub record: &'a ProcedureRecord,
    pub category: ProcedureCategory,
}

/// 1-based rank of `classified[index]` among lines of its own category.
///
/// Ranks follow ascending `sequence`; equal sequences keep declaration order.
/// Anesthetist and Instrument 04 lines have no position.
pub fn resolve_position(index: usize, classified: &[Classified<'_>]) -> Option<u32> {
    let target = classified.get(index)?;
    if !target.category.is_positional() {
        return None;
    }

    let ahead = classified
        .iter()
        .enumerate()
        .filter(|(other_index, other)| {
            other.category == target.category
                && (other.record.sequence < target.record.sequence
                    || (other.record.sequence == target.record.sequence
                        && *other_index < index))
        })
        .count();

    Some(ahead as u32 + 1)
}

/// Positions for every line at once, in input order.
pub fn resolve_positions(classified: &[Classified<'_>]) -> Vec<Option<u32>> {
    let mut positions = vec![None; classified.len()];

    for category in ProcedureCategory::ordered() {
        if !category.is_positional() {
            continue;
        }

        let mut members: Vec<usize> = classified
            .iter()
            .enumerate()
            .filter(|(_, line)| line.category == category)
            .map(|(index, _)| index)
            .collect();
        // Stable sort keeps declaration order for tied sequences.
        members.sort_by_key(|&index| classified[index].record.sequence);

        for (rank, index) in members.into_iter().enumerate() {
            positions[index] = Some(rank as u32 + 1);
        }
    }

    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(spec: &[(u32, ProcedureCategory)]) -> Vec<ProcedureRecord> {
        spec.iter()
            .map(|(sequence, _)| ProcedureRecord::new("04.08.01.005-5", *sequence))
            .collect()
    }

    fn classify<'a>(
        records: &'a [ProcedureRecord],
        spec: &[(u32, ProcedureCategory)],
    ) -> Vec<Classified<'a>> {
        records
            .iter()
            .zip(spec)
            .map(|(record, (_, category))| Classified {
                record,
                category: *category,
            })
            .collect()
    }

    #[test]
    fn normal_positions_ignore_other_categories() {
        use ProcedureCategory::*;
        let spec = [
            (1, Instrument04),
            (2, Anesthetist),
            (3, Normal),
            (4, Normal),
        ];
        let records = lines(&spec);
        let classified = classify(&records, &spec);

        assert_eq!(
            resolve_positions(&classified),
            vec![None, None, Some(1), Some(2)]
        );
    }

    #[test]
    fn positions_follow_sequence_not_input_order() {
        use ProcedureCategory::*;
        let spec = [(5, SpecialRule), (2, SpecialRule), (9, SpecialRule)];
        let records = lines(&spec);
        let classified = classify(&records, &spec);

        assert_eq!(
            resolve_positions(&classified),
            vec![Some(2), Some(1), Some(3)]
        );
    }

    #[test]
    fn tied_sequences_break_by_declaration_order() {
        use ProcedureCategory::*;
        let spec = [(3, Normal), (1, Normal), (3, Normal)];
        let records = lines(&spec);
        let classified = classify(&records, &spec);

        let bulk = resolve_positions(&classified);
        assert_eq!(bulk, vec![Some(2), Some(1), Some(3)]);

        let single: Vec<Option<u32>> = (0..classified.len())
            .map(|index| resolve_position(index, &classified))
            .collect();
        assert_eq!(single, bulk);
    }

    #[test]
    fn out_of_range_index_has_no_position() {
        assert_eq!(resolve_position(0, &[]), None);
    }
}

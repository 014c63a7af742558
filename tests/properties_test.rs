mod common;

use std::io::Cursor;

use proptest::prelude::*;
use trajstore::{file_io::FileProcessor, LammpsParams, LammpsTrajectoryFile};

use common::synthetic_dump;

fn species_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(vec!["H", "O", "C", "N"]), 1..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn line_idxs_partition_the_block(species in species_strategy(), shuffled in any::<bool>()) {
        let text = synthetic_dump(&species, 2, shuffled);
        let params = LammpsParams::builder()
            .trajectory_is_sorted_by_ids(!shuffled)
            .build()
            .unwrap();
        let dump = LammpsTrajectoryFile::from_reader(Cursor::new(text.into_bytes()), params).unwrap();

        let mut rows: Vec<usize> = dump
            .layout()
            .species_index
            .iter()
            .flat_map(|(_, entry)| entry.line_idxs.iter().copied())
            .collect();
        rows.sort_unstable();
        prop_assert_eq!(rows, (0..species.len()).collect::<Vec<_>>());

        let total: usize = dump.metadata().species_list.iter().map(|s| s.n_particles).sum();
        prop_assert_eq!(total, species.len());
    }

    #[test]
    fn split_reads_concatenate(
        species in species_strategy(),
        n_configurations in 1usize..8,
        split in 0usize..8,
    ) {
        let split = split.min(n_configurations);
        let text = synthetic_dump(&species, n_configurations, false);
        let mut dump = LammpsTrajectoryFile::from_reader(
            Cursor::new(text.into_bytes()),
            LammpsParams::default(),
        )
        .unwrap();

        let head = dump.get_next_n_configurations(split).unwrap();
        let tail = dump.get_next_n_configurations(n_configurations - split).unwrap();
        let whole = dump.read_configurations(0, n_configurations).unwrap();
        prop_assert_eq!(head.concatenate(&tail).unwrap(), whole);
    }
}

use colnest::{buffer::Buffer, index::Index, nulls::NullTrack};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn random_track(rng: &mut impl Rng, size: usize) -> NullTrack {
    let mut nulls = NullTrack::new();
    for _ in 0..size {
        if rng.random_bool(0.3) {
            nulls.add_null();
        } else {
            nulls.add_not_null();
        }
    }
    nulls
}

#[test]
fn buffer_grows_geometrically() {
    let mut buffer = Buffer::new();
    let mut capacities = Vec::new();
    for i in 0..100usize {
        buffer.push(i);
        if capacities.last() != Some(&buffer.capacity()) {
            capacities.push(buffer.capacity());
        }
    }
    assert_eq!(buffer.len(), 100);
    assert_eq!(buffer.as_slice(), (0..100).collect::<Vec<_>>().as_slice());
    for pair in capacities.windows(2) {
        assert!(
            pair[1] >= pair[0] * 3 / 2,
            "capacity grew from {} to {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn buffer_get_past_size_fails() {
    let buffer: Buffer<u32> = vec![1, 2, 3].into();
    assert_eq!(buffer.get(2), Ok(&3));
    assert!(buffer.get(3).unwrap_err().is_index_out_of_range());
}

#[test]
fn buffer_increment_at() {
    let mut buffer: Buffer<usize> = vec![1, 2].into();
    buffer.increment_at(1, 5).unwrap();
    assert_eq!(buffer.as_slice(), &[1, 7]);
    assert!(buffer.increment_at(2, 1).is_err());
}

#[test]
fn null_track_not_null_positions_property() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let size = rng.random_range(0..64);
        let nulls = random_track(&mut rng, size);

        let positions: Vec<usize> = nulls.not_null_positions().collect();
        assert_eq!(positions.len(), nulls.size() - nulls.null_size());
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(positions.iter().all(|p| !nulls.null_indices().contains(p)));
        assert!(nulls.null_indices().windows(2).all(|w| w[0] < w[1]));
        assert!(nulls.null_indices().iter().all(|&p| p < nulls.size()));
    }
}

#[test]
fn null_track_align_fills_null_rows() {
    let mut nulls = NullTrack::new();
    nulls.add_not_null();
    nulls.add_null();
    nulls.add_not_null();
    nulls.add_null();

    assert_eq!(nulls.align(&[1, 2], 0).unwrap(), vec![1, 0, 2, 0]);
    assert!(nulls.is_null(3));
    assert!(!nulls.is_null(2));

    let err = nulls.align(&[1, 2, 3], 0).unwrap_err();
    assert!(err.is_misaligned_values());
}

#[test]
fn null_track_from_parts_validates_positions() {
    let nulls = NullTrack::from_parts(vec![0, 3], 4).unwrap();
    assert_eq!(nulls.not_null_size(), 2);
    assert!(NullTrack::from_parts(vec![2, 1], 4).is_err());
    assert!(NullTrack::from_parts(vec![4], 4).is_err());
}

#[test]
fn index_expand_is_run_length_repetition() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x1dea);
    for _ in 0..200 {
        let parents = rng.random_range(0..32);
        let lengths: Vec<usize> = (0..parents).map(|_| rng.random_range(0..5)).collect();
        let values: Vec<u32> = (0..parents).map(|_| rng.random()).collect();
        let index = Index::from_lengths(lengths.clone());

        let expanded = index.expand(&values).unwrap();
        assert_eq!(expanded.len(), lengths.iter().sum::<usize>());

        let mut offset = 0;
        for (value, length) in values.iter().zip(&lengths) {
            assert!(expanded[offset..offset + length].iter().all(|v| v == value));
            offset += length;
        }
    }
}

#[test]
fn index_expand_rejects_wrong_parent_count() {
    let index = Index::from_lengths(vec![1, 2]);
    assert!(index.expand(&[1]).unwrap_err().is_malformed_index());
}

#[test]
fn index_compose_nested_lists() {
    let outer = Index::from_lengths(vec![2]);
    let inner = Index::from_lengths(vec![2, 1]);
    assert_eq!(outer.compose(&inner).unwrap().lengths(), &[3]);

    let outer = Index::from_lengths(vec![1, 0, 2]);
    let inner = Index::from_lengths(vec![3, 0, 4]);
    assert_eq!(outer.compose(&inner).unwrap().lengths(), &[3, 0, 4]);
}

#[test]
fn index_compose_preserves_child_count() {
    let mut rng = ChaCha20Rng::seed_from_u64(0xc0ffee);
    for _ in 0..100 {
        let outer: Vec<usize> = (0..rng.random_range(0..16))
            .map(|_| rng.random_range(0..4))
            .collect();
        let outer = Index::from_lengths(outer);
        let inner: Vec<usize> = (0..outer.child_len())
            .map(|_| rng.random_range(0..4))
            .collect();
        let inner = Index::from_lengths(inner);

        let composed = outer.compose(&inner).unwrap();
        assert_eq!(composed.len(), outer.len());
        assert_eq!(composed.child_len(), inner.child_len());
    }
}

#[test]
fn index_compose_requires_matching_counts() {
    let outer = Index::from_lengths(vec![2]);
    let inner = Index::from_lengths(vec![1]);
    let err = outer.compose(&inner).unwrap_err();
    assert!(err.is_malformed_index());
}

#[test]
fn index_null_align_inserts_empty_lists() {
    let mut nulls = NullTrack::new();
    nulls.add_null();
    nulls.add_not_null();
    nulls.add_null();
    nulls.add_not_null();

    let index = Index::from_lengths(vec![2, 3]);
    let aligned = index.null_align(&nulls).unwrap();
    assert_eq!(aligned.lengths(), &[0, 2, 0, 3]);
    assert_eq!(aligned.child_len(), index.child_len());
}

#[test]
fn index_add_to_last_list() {
    let mut index = Index::new();
    assert!(index.add_to_last_list().is_err());
    index.add_list(0);
    index.add_to_last_list().unwrap();
    index.add_to_last_list().unwrap();
    assert_eq!(index.lengths(), &[2]);
}

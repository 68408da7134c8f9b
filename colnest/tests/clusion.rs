use std::collections::BTreeMap;

use colnest::clusion::{Clusion, ClusionSpec, ColumnFilter};

fn tree(explicit: bool, leaves: &[(&str, Clusion)]) -> Clusion {
    Clusion {
        explicit,
        leaves: leaves
            .iter()
            .map(|(name, leaf)| (name.to_string(), leaf.clone()))
            .collect(),
    }
}

fn parse(spec: impl Into<ClusionSpec>) -> Clusion {
    Clusion::parse(&spec.into()).unwrap()
}

fn map(entries: &[(&str, ClusionSpec)]) -> ClusionSpec {
    entries.iter().cloned().collect()
}

#[test]
fn single_path() {
    assert_eq!(parse("a"), tree(false, &[("a", Clusion::universal())]));
}

#[test]
fn sequence_of_paths() {
    assert_eq!(
        parse(vec!["a", "b"]),
        tree(
            false,
            &[("a", Clusion::universal()), ("b", Clusion::universal())]
        )
    );
}

#[test]
fn dotted_path_builds_chain() {
    let expected = tree(
        false,
        &[("a", tree(false, &[("b", tree(false, &[("c", Clusion::universal())]))]))],
    );
    assert_eq!(parse("a.b.c"), expected);
}

#[test]
fn merging_nested_maps() {
    let first = map(&[("a", map(&[("b", map(&[]))]))]);
    let second = map(&[("a", map(&[("b", map(&[("c", map(&[]))]))]))]);
    let expected = tree(
        false,
        &[("a", tree(false, &[("b", tree(true, &[("c", Clusion::universal())]))]))],
    );
    assert_eq!(parse(ClusionSpec::Seq(vec![first, second])), expected);
}

#[test]
fn merging_dotted_paths() {
    let expected = tree(
        false,
        &[(
            "a",
            tree(
                false,
                &[(
                    "b",
                    tree(
                        false,
                        &[("c", Clusion::universal()), ("d", Clusion::universal())],
                    ),
                )],
            ),
        )],
    );
    assert_eq!(parse(vec!["a.b.c", "a.b.d"]), expected);
}

#[test]
fn map_attaches_subspec() {
    let expected = tree(false, &[("a", tree(false, &[("b", Clusion::universal())]))]);
    assert_eq!(parse(map(&[("a", "b".into())])), expected);

    let expected = tree(
        false,
        &[("a", tree(false, &[("b", tree(false, &[("c", Clusion::universal())]))]))],
    );
    assert_eq!(parse(map(&[("a.b", "c".into())])), expected);
}

#[test]
fn empty_specs_select_everything() {
    assert_eq!(parse(map(&[])), Clusion::universal());
    assert_eq!(parse(Vec::<ClusionSpec>::new()), Clusion::universal());
    assert_eq!(Clusion::merge(Vec::new()), Clusion::universal());
}

#[test]
fn none_selects_nothing() {
    assert_eq!(parse(ClusionSpec::None), Clusion::neutral());
    assert_eq!(parse(None::<&str>), Clusion::neutral());
}

#[test]
fn empty_segments_fail() {
    for path in ["", "a.", ".a", "a..b"] {
        let err = Clusion::parse(&ClusionSpec::from(path)).unwrap_err();
        assert!(err.is_empty_field_name(), "`{path}` gave {err}");
    }
    let err = Clusion::parse(&map(&[("a..b", ClusionSpec::None)])).unwrap_err();
    assert!(err.is_empty_field_name());
}

#[test]
fn combine_records_both_flags() {
    let include = parse("a.b");
    let exclude = parse(vec!["a.b.c", "d"]);
    let filter = ColumnFilter::combine(&include, &exclude).unwrap();

    assert!(!filter.explicitly_include() && !filter.explicitly_exclude());
    let a = filter.field("a").unwrap();
    let b = a.field("b").unwrap();
    assert!(b.explicitly_include());
    assert!(b.field("c").unwrap().explicitly_exclude());
    assert!(filter.field("d").unwrap().explicitly_exclude());
    assert!(filter.field("e").is_none());

    let names: Vec<&str> = filter.fields().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["a", "d"]);
}

#[test]
fn combine_conflict_reports_path() {
    let include = parse("a.b");
    let exclude = parse("a.b");
    let err = ColumnFilter::combine(&include, &exclude).unwrap_err();
    assert!(err.is_conflicting_clusion());
    assert!(err.to_string().contains("a.b"), "{err}");
}

#[test]
fn has_includes_is_recursive() {
    let filter = ColumnFilter::from_specs(&"a.b".into(), &ClusionSpec::None).unwrap();
    assert!(filter.has_includes());
    assert!(!filter.explicitly_include());

    let filter = ColumnFilter::from_specs(&ClusionSpec::None, &"a.b".into()).unwrap();
    assert!(!filter.has_includes());
}

#[test]
fn inclusion_rule() {
    let neutral = ColumnFilter::new(false, false, BTreeMap::new()).unwrap();
    assert!(neutral.included(true));
    assert!(!neutral.included(false));

    let include = ColumnFilter::new(true, false, BTreeMap::new()).unwrap();
    assert!(include.included(false));

    let exclude = ColumnFilter::new(false, true, BTreeMap::new()).unwrap();
    assert!(!exclude.included(true));

    assert!(ColumnFilter::new(true, true, BTreeMap::new()).is_err());
}

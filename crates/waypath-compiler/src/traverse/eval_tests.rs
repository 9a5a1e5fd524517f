//! Runtime behavior of emitted fragments. Each accessor body below is the
//! exact fragment asserted immediately above it, so the string assertion
//! and the behavior assertion cover the same code.

use indoc::indoc;

use crate::test_utils::{Payload, expect_fixture, sample};

#[test]
fn required_member_reads_through_optional_parents() {
    let t = expect_fixture("primitives.required_flag");
    assert_eq!(
        t.code,
        indoc! {"
            let _fld_1 = _root.primitives.as_ref();
            let _fld_1 = _fld_1?;
            let _fld_2 = &_fld_1.required_flag;
        "}
    );
    fn run<'a>(_root: &'a Payload) -> Option<&'a bool> {
        let _fld_1 = _root.primitives.as_ref();
        let _fld_1 = _fld_1?;
        let _fld_2 = &_fld_1.required_flag;
        Some(_fld_2)
    }
    assert_eq!(run(&sample()), Some(&true));
    assert_eq!(run(&Payload::default()), None);
}

#[test]
fn length_of_a_flattened_flat_list() {
    let t = expect_fixture("length(lists.structs[])");
    assert_eq!(
        t.code,
        indoc! {"
            let _fld_1 = _root.lists.as_ref();
            let _fld_1 = _fld_1?;
            let _fld_2 = _fld_1.structs.as_ref();
            let _fld_2 = _fld_2?;
            let _len_3 = _fld_2.len();
        "}
    );
    fn run(_root: &Payload) -> Option<usize> {
        let _fld_1 = _root.lists.as_ref();
        let _fld_1 = _fld_1?;
        let _fld_2 = _fld_1.structs.as_ref();
        let _fld_2 = _fld_2?;
        let _len_3 = _fld_2.len();
        Some(_len_3)
    }
    assert_eq!(run(&sample()), Some(2));
}

#[test]
fn contains_finds_and_misses() {
    let t = expect_fixture("contains(lists.integers, primitives.integer)");
    assert_eq!(
        t.code,
        indoc! {"
            let _fld_1 = _root.lists.as_ref();
            let _fld_1 = _fld_1?;
            let _fld_2 = &_fld_1.integers;
            let _fld_3 = _root.primitives.as_ref();
            let _fld_3 = _fld_3?;
            let _fld_4 = _fld_3.integer.as_ref();
            let _fld_4 = _fld_4?;
            let _cnt_5 = _fld_2.iter().any(|_v| *_v as i64 == *_fld_4 as i64);
        "}
    );
    fn run(_root: &Payload) -> Option<bool> {
        let _fld_1 = _root.lists.as_ref();
        let _fld_1 = _fld_1?;
        let _fld_2 = &_fld_1.integers;
        let _fld_3 = _root.primitives.as_ref();
        let _fld_3 = _fld_3?;
        let _fld_4 = _fld_3.integer.as_ref();
        let _fld_4 = _fld_4?;
        let _cnt_5 = _fld_2.iter().any(|_v| *_v as i64 == *_fld_4 as i64);
        Some(_cnt_5)
    }
    // integers [3, 4], primitive 4
    assert_eq!(run(&sample()), Some(true));
    // integers [3], primitive 4
    let mut data = sample();
    data.lists.as_mut().unwrap().integers = vec![3];
    assert_eq!(run(&data), Some(false));
}

#[test]
fn filter_projection_selects_matching_elements() {
    let t = expect_fixture("lists.structs[?primitives.integer > `0`].primitives.integer");
    assert_eq!(
        t.code,
        indoc! {"
            let _fld_1 = _root.lists.as_ref();
            let _fld_1 = _fld_1?;
            let _fld_2 = _fld_1.structs.as_ref();
            let _fld_2 = _fld_2?;
            let _fpr_3 = _fld_2
                .iter()
                .flat_map({
                    fn keep<'a>(_v: &'a Item) -> Option<&'a Item> {
                        let _fld_4 = _v.primitives.as_ref();
                        let _fld_4 = _fld_4?;
                        let _fld_5 = _fld_4.integer.as_ref();
                        let _fld_5 = _fld_5?;
                        let _lit_6 = 0f64;
                        let _cmp_7 = *_fld_5 as f64 > _lit_6;
                        if _cmp_7 { Some(_v) } else { None }
                    }
                    keep
                })
                .collect::<Vec<&Item>>();
            let _prj_8 = _fpr_3
                .iter()
                .copied()
                .flat_map({
                    fn map<'a>(_v: &'a Item) -> Option<&'a i32> {
                        let _fld_9 = _v.primitives.as_ref();
                        let _fld_9 = _fld_9?;
                        let _fld_10 = _fld_9.integer.as_ref();
                        _fld_10
                    }
                    map
                })
                .collect::<Vec<&i32>>();
        "}
    );
    use crate::test_utils::Item;
    fn run<'a>(_root: &'a Payload) -> Option<Vec<&'a i32>> {
        let _fld_1 = _root.lists.as_ref();
        let _fld_1 = _fld_1?;
        let _fld_2 = _fld_1.structs.as_ref();
        let _fld_2 = _fld_2?;
        let _fpr_3 = _fld_2
            .iter()
            .flat_map({
                fn keep<'a>(_v: &'a Item) -> Option<&'a Item> {
                    let _fld_4 = _v.primitives.as_ref();
                    let _fld_4 = _fld_4?;
                    let _fld_5 = _fld_4.integer.as_ref();
                    let _fld_5 = _fld_5?;
                    let _lit_6 = 0f64;
                    let _cmp_7 = *_fld_5 as f64 > _lit_6;
                    if _cmp_7 { Some(_v) } else { None }
                }
                keep
            })
            .collect::<Vec<&Item>>();
        let _prj_8 = _fpr_3
            .iter()
            .copied()
            .flat_map({
                fn map<'a>(_v: &'a Item) -> Option<&'a i32> {
                    let _fld_9 = _v.primitives.as_ref();
                    let _fld_9 = _fld_9?;
                    let _fld_10 = _fld_9.integer.as_ref();
                    _fld_10
                }
                map
            })
            .collect::<Vec<&i32>>();
        Some(_prj_8)
    }
    // Only the first element has primitives.integer = 4 > 0.
    assert_eq!(run(&sample()), Some(vec![&4]));
}

#[test]
fn object_projection_collects_field_of_every_value() {
    let t = expect_fixture("maps.structs.*.integer");
    assert_eq!(
        t.code,
        indoc! {"
            let _fld_1 = _root.maps.as_ref();
            let _fld_1 = _fld_1?;
            let _fld_2 = _fld_1.structs.as_ref();
            let _fld_2 = _fld_2?;
            let _prj_3 = _fld_2
                .values()
                .flat_map({
                    fn map<'a>(_v: &'a Item) -> Option<&'a i32> {
                        let _fld_4 = _v.integer.as_ref();
                        _fld_4
                    }
                    map
                })
                .collect::<Vec<&i32>>();
        "}
    );
    use crate::test_utils::Item;
    fn run<'a>(_root: &'a Payload) -> Option<Vec<&'a i32>> {
        let _fld_1 = _root.maps.as_ref();
        let _fld_1 = _fld_1?;
        let _fld_2 = _fld_1.structs.as_ref();
        let _fld_2 = _fld_2?;
        let _prj_3 = _fld_2
            .values()
            .flat_map({
                fn map<'a>(_v: &'a Item) -> Option<&'a i32> {
                    let _fld_4 = _v.integer.as_ref();
                    _fld_4
                }
                map
            })
            .collect::<Vec<&i32>>();
        Some(_prj_3)
    }
    let data = sample();
    let mut values = run(&data).unwrap();
    values.sort();
    assert_eq!(values, vec![&5, &7]);
}

#[test]
fn flatten_rebind_preserves_runtime_identity() {
    let plain = expect_fixture("lists.integers");
    let flattened = expect_fixture("lists.integers[]");
    assert_eq!(plain.code, flattened.code);

    fn plain_run<'a>(_root: &'a Payload) -> Option<&'a Vec<i32>> {
        let _fld_1 = _root.lists.as_ref();
        let _fld_1 = _fld_1?;
        let _fld_2 = &_fld_1.integers;
        Some(_fld_2)
    }
    fn flattened_run<'a>(_root: &'a Payload) -> Option<&'a Vec<i32>> {
        let _fld_1 = _root.lists.as_ref();
        let _fld_1 = _fld_1?;
        let _fld_2 = &_fld_1.integers;
        Some(_fld_2)
    }
    let data = sample();
    assert!(std::ptr::eq(
        plain_run(&data).unwrap(),
        flattened_run(&data).unwrap()
    ));
}

#[test]
fn nested_flatten_merges_one_level() {
    let t = expect_fixture("lists.nested[]");
    assert_eq!(
        t.code,
        indoc! {"
            let _fld_1 = _root.lists.as_ref();
            let _fld_1 = _fld_1?;
            let _fld_2 = _fld_1.nested.as_ref();
            let _fld_2 = _fld_2?;
            let _flt_3 = _fld_2.iter().flatten().collect::<Vec<&i32>>();
        "}
    );
    fn run<'a>(_root: &'a Payload) -> Option<Vec<&'a i32>> {
        let _fld_1 = _root.lists.as_ref();
        let _fld_1 = _fld_1?;
        let _fld_2 = _fld_1.nested.as_ref();
        let _fld_2 = _fld_2?;
        let _flt_3 = _fld_2.iter().flatten().collect::<Vec<&i32>>();
        Some(_flt_3)
    }
    assert_eq!(run(&sample()), Some(vec![&1, &2, &3]));
}

#[test]
fn boolean_operators_evaluate() {
    let t = expect_fixture("primitives.required_flag && primitives.flag");
    assert_eq!(
        t.code,
        indoc! {"
            let _fld_1 = _root.primitives.as_ref();
            let _fld_1 = _fld_1?;
            let _fld_2 = &_fld_1.required_flag;
            let _fld_3 = _root.primitives.as_ref();
            let _fld_3 = _fld_3?;
            let _fld_4 = _fld_3.flag.as_ref();
            let _fld_4 = _fld_4?;
            let _and_5 = *_fld_2 && *_fld_4;
        "}
    );
    fn run(_root: &Payload) -> Option<bool> {
        let _fld_1 = _root.primitives.as_ref();
        let _fld_1 = _fld_1?;
        let _fld_2 = &_fld_1.required_flag;
        let _fld_3 = _root.primitives.as_ref();
        let _fld_3 = _fld_3?;
        let _fld_4 = _fld_3.flag.as_ref();
        let _fld_4 = _fld_4?;
        let _and_5 = *_fld_2 && *_fld_4;
        Some(_and_5)
    }
    assert_eq!(run(&sample()), Some(true));
    let mut data = sample();
    data.primitives.as_mut().unwrap().flag = Some(false);
    assert_eq!(run(&data), Some(false));
}

#[test]
fn enum_comparison_evaluates_as_string() {
    let t = expect_fixture("primitives.state == 'ready'");
    assert_eq!(
        t.code,
        indoc! {r#"
            let _fld_1 = _root.primitives.as_ref();
            let _fld_1 = _fld_1?;
            let _fld_2 = _fld_1.state.as_ref();
            let _fld_2 = _fld_2?;
            let _lit_3 = "ready";
            let _cmp_4 = _fld_2.as_str() == _lit_3;
        "#}
    );
    fn run(_root: &Payload) -> Option<bool> {
        let _fld_1 = _root.primitives.as_ref();
        let _fld_1 = _fld_1?;
        let _fld_2 = _fld_1.state.as_ref();
        let _fld_2 = _fld_2?;
        let _lit_3 = "ready";
        let _cmp_4 = _fld_2.as_str() == _lit_3;
        Some(_cmp_4)
    }
    assert_eq!(run(&sample()), Some(true));
    let mut data = sample();
    data.primitives.as_mut().unwrap().state = Some(crate::test_utils::State::Busy);
    assert_eq!(run(&data), Some(false));
}

#[test]
fn contains_over_map_keys_evaluates() {
    let t = expect_fixture("contains(keys(maps.integers), 'foo')");
    assert_eq!(
        t.code,
        indoc! {r#"
            let _fld_1 = _root.maps.as_ref();
            let _fld_1 = _fld_1?;
            let _fld_2 = _fld_1.integers.as_ref();
            let _fld_2 = _fld_2?;
            let _keys_3 = _fld_2.keys().collect::<Vec<&String>>();
            let _lit_4 = "foo";
            let _cnt_5 = _keys_3.iter().copied().any(|_v| _v.as_str() == _lit_4);
        "#}
    );
    fn run(_root: &Payload) -> Option<bool> {
        let _fld_1 = _root.maps.as_ref();
        let _fld_1 = _fld_1?;
        let _fld_2 = _fld_1.integers.as_ref();
        let _fld_2 = _fld_2?;
        let _keys_3 = _fld_2.keys().collect::<Vec<&String>>();
        let _lit_4 = "foo";
        let _cnt_5 = _keys_3.iter().copied().any(|_v| _v.as_str() == _lit_4);
        Some(_cnt_5)
    }
    assert_eq!(run(&sample()), Some(true));
}

#[test]
fn substring_contains_evaluates() {
    let t = expect_fixture("contains(primitives.name, 'lph')");
    assert_eq!(
        t.code,
        indoc! {r#"
            let _fld_1 = _root.primitives.as_ref();
            let _fld_1 = _fld_1?;
            let _fld_2 = _fld_1.name.as_ref();
            let _fld_2 = _fld_2?;
            let _lit_3 = "lph";
            let _cnt_4 = _fld_2.as_str().contains(_lit_3);
        "#}
    );
    fn run(_root: &Payload) -> Option<bool> {
        let _fld_1 = _root.primitives.as_ref();
        let _fld_1 = _fld_1?;
        let _fld_2 = _fld_1.name.as_ref();
        let _fld_2 = _fld_2?;
        let _lit_3 = "lph";
        let _cnt_4 = _fld_2.as_str().contains(_lit_3);
        Some(_cnt_4)
    }
    assert_eq!(run(&sample()), Some(true));
}

#[test]
fn length_compares_against_number_literals() {
    let t = expect_fixture("length(lists.integers) == `2`");
    assert_eq!(
        t.code,
        indoc! {"
            let _fld_1 = _root.lists.as_ref();
            let _fld_1 = _fld_1?;
            let _fld_2 = &_fld_1.integers;
            let _len_3 = _fld_2.len();
            let _lit_4 = 2f64;
            let _cmp_5 = _len_3 as f64 == _lit_4;
        "}
    );
    fn run(_root: &Payload) -> Option<bool> {
        let _fld_1 = _root.lists.as_ref();
        let _fld_1 = _fld_1?;
        let _fld_2 = &_fld_1.integers;
        let _len_3 = _fld_2.len();
        let _lit_4 = 2f64;
        let _cmp_5 = _len_3 as f64 == _lit_4;
        Some(_cmp_5)
    }
    assert_eq!(run(&sample()), Some(true));
}

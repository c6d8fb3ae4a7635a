use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use selectra::{layout_to_strides, DataType, TensorDescriptor, TensorLayout};

#[test]
fn packed_nchw_strides() {
    let t = TensorDescriptor::new(DataType::Float, vec![2, 3, 4, 5]);
    assert_eq!(t.strides(), &[60, 20, 5, 1]);
    assert!(t.is_packed());
    assert_eq!(t.element_count(), 120);
    assert_eq!(t.element_space(), 120);
    assert_eq!(t.num_bytes(), 480);
}

#[test]
fn vectorized_nchwc4_divides_channels() {
    let t = TensorDescriptor::with_layout(DataType::Int8x4, TensorLayout::NCHWc4, vec![1, 8, 4, 4]);
    // channel length 8 becomes 2 outer vectors of 4
    assert_eq!(t.lengths(), &[1, 2, 4, 4]);
    assert_eq!(t.strides(), &[128, 64, 16, 4]);
    assert_eq!(t.vector_length(), 4);
    assert_eq!(t.element_count(), 128);
    assert_eq!(t.element_space(), 128);
    assert!(t.is_packed());
    assert_eq!(t.num_bytes(), 128);
}

#[test]
fn vectorized_chwnc_divides_leading_axis() {
    // CHWN order: c=8, h=4, w=4, n=2
    let t = TensorDescriptor::with_layout(DataType::Half, TensorLayout::CHWNc4, vec![8, 4, 4, 2]);
    assert_eq!(t.lengths(), &[2, 4, 4, 2]);
    assert_eq!(t.strides(), &[128, 32, 8, 4]);
    assert_eq!(t.element_count(), 256);
    assert!(t.is_packed());
}

#[test]
fn chwnc8_uses_the_wider_vector() {
    let t = TensorDescriptor::with_layout(DataType::Int8, TensorLayout::CHWNc8, vec![16, 2, 2, 1]);
    assert_eq!(t.lengths(), &[2, 2, 2, 1]);
    assert_eq!(t.strides(), &[32, 16, 8, 8]);
    assert_eq!(t.vector_length(), 8);
}

#[test]
fn scalar_flat_index() {
    let t = TensorDescriptor::new(DataType::Float, vec![2, 3, 4, 5]);
    assert_eq!(t.flat_index(&[0, 0, 0, 0]), 0);
    assert_eq!(t.flat_index(&[1, 2, 3, 4]), 60 + 40 + 15 + 4);
}

#[test]
fn vectorized_flat_index_adds_sub_index() {
    let t = TensorDescriptor::with_layout(DataType::Int8x4, TensorLayout::NCHWc4, vec![1, 8, 4, 4]);
    // (v, n, c, h, w)
    assert_eq!(t.flat_index(&[2, 0, 1, 2, 3]), 64 + 32 + 12 + 2);
}

#[test]
fn chwnc_flat_index_permutes_coordinates() {
    let t = TensorDescriptor::with_layout(DataType::Half, TensorLayout::CHWNc4, vec![8, 4, 4, 2]);
    // coordinates still arrive as (v, n, c, h, w); storage is c, h, w, n
    let idx = t.flat_index(&[1, 1, 0, 2, 3]);
    // c contributes nothing at 0; h*32 + w*8 + n*4 + v
    assert_eq!(idx, 2 * 32 + 3 * 8 + 4 + 1);
}

#[test]
#[should_panic(expected = "coordinates")]
fn scalar_index_arity_is_enforced() {
    let t = TensorDescriptor::new(DataType::Float, vec![2, 3, 4, 5]);
    t.flat_index(&[0, 0, 0]);
}

#[test]
#[should_panic(expected = "sub-index")]
fn vectorized_index_needs_the_sub_index() {
    let t = TensorDescriptor::with_layout(DataType::Int8x4, TensorLayout::NCHWc4, vec![1, 8, 4, 4]);
    t.flat_index(&[0, 0, 0, 0]);
}

#[test]
#[should_panic(expected = "axes")]
fn chwnc_indexing_demands_four_dimensions() {
    let t = TensorDescriptor::with_layout(
        DataType::Half,
        TensorLayout::CHWNc4,
        vec![8, 4, 4, 2, 2],
    );
    t.flat_index(&[0, 0, 0, 0, 0, 0]);
}

#[test]
fn sparse_strides_are_not_packed() {
    let t = TensorDescriptor::with_strides(DataType::Float, vec![2, 2], vec![4, 1]).unwrap();
    assert!(!t.is_packed());
    assert_eq!(t.element_count(), 4);
    assert_eq!(t.element_space(), 6);
    assert_eq!(t.num_bytes(), 24);
}

#[test]
fn transposed_strides_stay_packed() {
    // NHWC-contiguous strides under NCHW-ordered lengths
    let strides = layout_to_strides(&[2, 3, 4, 5], "NCHW", "NHWC").unwrap();
    let t = TensorDescriptor::with_strides(DataType::Float, vec![2, 3, 4, 5], strides).unwrap();
    assert!(t.is_packed());
    assert!(t.is_possible_layout("NCHW", "NHWC").unwrap());
    assert!(!t.is_possible_layout("NCHW", "NCHW").unwrap());
}

#[test]
fn possible_layout_rejects_bad_labels() {
    let t = TensorDescriptor::new(DataType::Float, vec![2, 3, 4, 5]);
    assert!(t.is_possible_layout("NCHW", "NCHW").unwrap());
    assert!(t.is_possible_layout("NCHW", "NHQC").is_err());
    assert!(t.is_possible_layout("NCH", "NCHW").is_err());
}

#[test]
fn arity_mismatch_is_rejected() {
    let r = TensorDescriptor::with_strides(DataType::Float, vec![2, 3], vec![6, 2, 1]);
    assert!(r.is_err());
}

#[test]
fn raw_construction_rejects_negatives() {
    assert!(TensorDescriptor::from_raw(DataType::Float, TensorLayout::NCHW, &[2, -3], None).is_err());
    assert!(TensorDescriptor::from_raw(
        DataType::Float,
        TensorLayout::NCHW,
        &[2, 3],
        Some(&[3, -1])
    )
    .is_err());
    let t = TensorDescriptor::from_raw(DataType::Float, TensorLayout::NCHW, &[2, 3], None).unwrap();
    assert_eq!(t.strides(), &[3, 1]);
}

#[test]
fn zero_dimensional_descriptor_is_a_scalar() {
    let t = TensorDescriptor::new(DataType::Float, vec![]);
    assert_eq!(t.ndims(), 0);
    assert_eq!(t.element_count(), 1);
    assert_eq!(t.element_space(), 1);
    assert!(t.is_packed());
}

#[test]
fn zero_length_axis_empties_the_tensor() {
    let t = TensorDescriptor::new(DataType::Float, vec![2, 0, 3]);
    assert_eq!(t.element_count(), 0);
    // the trailing axes still span addressable elements
    assert_eq!(t.element_space(), 3);
    assert!(!t.is_packed());
}

#[test]
fn identity_ignores_layout_tag() {
    let a = TensorDescriptor::new(DataType::Float, vec![2, 3, 4, 5]);
    let strides = a.strides().to_vec();
    let b = TensorDescriptor::with_layout_strides(
        DataType::Float,
        TensorLayout::NHWC,
        vec![2, 3, 4, 5],
        strides,
    )
    .unwrap();
    assert_eq!(a, b);

    let mut ha = DefaultHasher::new();
    let mut hb = DefaultHasher::new();
    a.hash(&mut ha);
    b.hash(&mut hb);
    assert_eq!(ha.finish(), hb.finish());
}

#[test]
fn ordering_is_type_then_lengths_then_strides() {
    let small = TensorDescriptor::new(DataType::Float, vec![1, 2]);
    let big = TensorDescriptor::new(DataType::Float, vec![1, 3]);
    assert!(small < big);

    let float = TensorDescriptor::new(DataType::Float, vec![9, 9]);
    let double = TensorDescriptor::new(DataType::Double, vec![1, 1]);
    assert!(float < double);

    let a = TensorDescriptor::new(DataType::Half, vec![4, 4]);
    let b = TensorDescriptor::new(DataType::Half, vec![4, 4]);
    assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);
    assert_eq!(a, b);
}

#[test]
fn serde_round_trip() {
    let t = TensorDescriptor::with_layout(DataType::Int8x4, TensorLayout::NCHWc4, vec![2, 16, 7, 7]);
    let json = serde_json::to_string(&t).unwrap();
    let back: TensorDescriptor = serde_json::from_str(&json).unwrap();
    assert_eq!(t, back);
    assert_eq!(back.layout(), TensorLayout::NCHWc4);
    assert_eq!(back.vector_length(), 4);
    assert_eq!(back.is_packed(), t.is_packed());

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value.get("lengths").is_some());
    assert!(value.get("strides").is_some());
    assert!(value.get("packed").is_some());
    assert!(value.get("type").is_some());
}

#[test]
fn minimal_json_deserializes_with_defaults() {
    let json = r#"{"lengths":[2,3],"strides":[3,1],"packed":true,"type":"Float"}"#;
    let t: TensorDescriptor = serde_json::from_str(json).unwrap();
    assert_eq!(t.layout(), TensorLayout::NCHW);
    assert_eq!(t.vector_length(), 1);
    assert_eq!(t.lengths(), &[2, 3]);
}

#[test]
fn display_joins_lengths() {
    let t = TensorDescriptor::new(DataType::Float, vec![2, 3, 4, 5]);
    assert_eq!(t.to_string(), "2, 3, 4, 5");
}

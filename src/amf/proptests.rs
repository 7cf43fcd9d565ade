use super::*;

use proptest::prelude::*;

use crate::error::AmfError;

fn bytes_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    prop::collection::vec(any::<u8>(), 0..=24)
}

// Integral doubles never produce the 0x00 0x09 high bytes that a list
// body would mistake for the object-end marker.
fn number_strategy() -> impl Strategy<Value = f64> + Clone {
    any::<i32>().prop_map(f64::from)
}

fn leaf_strategy() -> impl Strategy<Value = Property<'static>> {
    prop_oneof![
        number_strategy().prop_map(Property::Number),
        any::<bool>().prop_map(Property::Boolean),
        bytes_strategy().prop_map(|b| Property::String(AmfStr::owned(b))),
        bytes_strategy().prop_map(|b| Property::LongString(AmfStr::owned(b))),
        bytes_strategy().prop_map(|b| Property::XmlDocument(AmfStr::owned(b))),
        number_strategy().prop_map(Property::Date),
        Just(Property::Null),
    ]
}

fn map_strategy(
    inner: impl Strategy<Value = Property<'static>>,
) -> impl Strategy<Value = Node<'static>> {
    prop::collection::vec((bytes_strategy(), inner), 0..=6).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(k, v)| (AmfStr::owned(k), v))
            .collect::<Node<'static>>()
    })
}

fn property_strategy() -> impl Strategy<Value = Property<'static>> {
    leaf_strategy().prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            map_strategy(inner.clone()).prop_map(Property::object),
            map_strategy(inner.clone()).prop_map(Property::ecma_array),
            prop::collection::vec(inner.clone(), 0..=6).prop_map(|items| {
                Property::strict_array(items.into_iter().collect::<Node<'static>>())
            }),
            (bytes_strategy(), map_strategy(inner)).prop_map(|(name, mut node)| {
                node.set_name(AmfStr::owned(name));
                Property::typed_object(node)
            }),
        ]
    })
}

fn tree_strategy() -> impl Strategy<Value = Node<'static>> {
    prop::collection::vec(property_strategy(), 0..=6)
        .prop_map(|items| items.into_iter().collect::<Node<'static>>())
}

fn encode_exact(node: &Node<'_>) -> Vec<u8> {
    let mut buf = vec![0u8; encoded_size(node)];
    let written = encode(node, &mut buf).unwrap();
    buf.truncate(written);
    buf
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_roundtrip(tree in tree_strategy()) {
        let size = encoded_size(&tree);
        let buf = encode_exact(&tree);
        prop_assert_eq!(buf.len(), size);

        let (decoded, consumed) = decode(&buf).unwrap();
        prop_assert_eq!(consumed, size);
        prop_assert_eq!(&decoded, &tree);
    }

    #[test]
    fn prop_size_idempotent(tree in tree_strategy()) {
        prop_assert_eq!(encoded_size(&tree), encoded_size(&tree));
    }

    #[test]
    fn prop_size_bounds_encoding(tree in tree_strategy(), extra in 0usize..4) {
        let size = encoded_size(&tree);
        let mut buf = vec![0u8; size + extra];
        let written = encode(&tree, &mut buf).unwrap();
        prop_assert!(written <= size);
        prop_assert_eq!(encode_to_bytes(&tree).unwrap().len(), written);
    }

    #[test]
    fn prop_short_output_overflows(tree in tree_strategy()) {
        let size = encoded_size(&tree);
        prop_assume!(size > 0);
        let mut buf = vec![0u8; size - 1];
        let err = encode(&tree, &mut buf).unwrap_err();
        prop_assert!(matches!(err, AmfError::Overflow { .. }), "{:?}", err);
    }

    #[test]
    fn prop_key_order(a in bytes_strategy(), b in bytes_strategy()) {
        let (ka, kb) = (AmfStr::owned(a.clone()), AmfStr::owned(b.clone()));
        if a.len() != b.len() {
            prop_assert_eq!(ka.cmp(&kb), a.len().cmp(&b.len()));
        } else {
            prop_assert_eq!(ka.cmp(&kb), a.cmp(&b));
        }
    }

    #[test]
    fn prop_truncated_object_underflows(node in map_strategy(property_strategy())) {
        let mut root = Node::list();
        root.push(Property::object(node));
        let buf = encode_exact(&root);

        for cut in 1..buf.len() {
            let err = decode(&buf[..cut]).unwrap_err();
            prop_assert!(err.is_underflow(), "cut {}: {:?}", cut, err);
        }
    }

    #[test]
    fn prop_detached_copy_matches(tree in tree_strategy()) {
        let buf = encode_exact(&tree);
        let (decoded, _) = decode(&buf).unwrap();
        let detached = decoded.to_static();
        drop(decoded);
        drop(buf);
        prop_assert_eq!(&detached, &tree);
    }

    #[test]
    fn prop_arbitrary_input_never_panics(data in prop::collection::vec(any::<u8>(), 0..=256)) {
        if let Ok((_, consumed)) = decode(&data) {
            prop_assert!(consumed <= data.len());
        }
    }
}

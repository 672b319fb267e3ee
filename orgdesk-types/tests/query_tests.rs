use orgdesk_types::{Error, FilterValue, QueryDescriptor, Scalar, SortDirection};
use pretty_assertions::assert_eq;

fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
    list.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ── Builders ─────────────────────────────────────────────────────

#[test]
fn new_descriptor_is_empty() {
    let q = QueryDescriptor::new();
    assert_eq!(q.page, None);
    assert_eq!(q.page_size, None);
    assert!(q.extra.is_empty());
    assert!(q.to_query_pairs().is_empty());
}

#[test]
fn builders_return_new_values() {
    let base = QueryDescriptor::new().with_page(2);
    let next = base.clone().with_page(3);
    assert_eq!(base.page, Some(2));
    assert_eq!(next.page, Some(3));
    assert_ne!(base, next);
}

#[test]
fn blank_search_clears_term() {
    let q = QueryDescriptor::new().with_search("alice").with_search("   ");
    assert_eq!(q.search, None);
}

#[test]
fn search_is_trimmed() {
    let q = QueryDescriptor::new().with_search("  bob ");
    assert_eq!(q.search.as_deref(), Some("bob"));
}

#[test]
fn without_sort_clears_both_fields() {
    let q = QueryDescriptor::new()
        .with_sort("title", SortDirection::Desc)
        .without_sort();
    assert_eq!(q.sort_field, None);
    assert_eq!(q.sort_direction, None);
}

#[test]
fn structural_equality_ignores_construction_order() {
    let a = QueryDescriptor::new()
        .with_filter("status", "open")
        .with_filter("priority", 2i64);
    let b = QueryDescriptor::new()
        .with_filter("priority", 2i64)
        .with_filter("status", "open");
    assert_eq!(a, b);
}

#[test]
fn sort_direction_reversed() {
    assert_eq!(SortDirection::Asc.reversed(), SortDirection::Desc);
    assert_eq!(SortDirection::Desc.reversed(), SortDirection::Asc);
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn validate_accepts_defaults() {
    assert!(QueryDescriptor::new().validate().is_ok());
}

#[test]
fn validate_rejects_page_zero() {
    let err = QueryDescriptor::new().with_page(0).validate().unwrap_err();
    assert!(matches!(err, Error::InvalidDescriptor(_)));
}

#[test]
fn validate_rejects_page_size_zero() {
    let err = QueryDescriptor::new().with_page_size(0).validate().unwrap_err();
    assert!(matches!(err, Error::InvalidDescriptor(_)));
}

#[test]
fn validate_rejects_reserved_filter_key() {
    let err = QueryDescriptor::new()
        .with_filter("organizationId", "org-1")
        .validate()
        .unwrap_err();
    match err {
        Error::ReservedKey(key) => assert_eq!(key, "organizationId"),
        other => panic!("Expected ReservedKey, got {other:?}"),
    }
}

#[test]
fn validate_rejects_direction_without_field() {
    let q = QueryDescriptor {
        sort_direction: Some(SortDirection::Asc),
        ..Default::default()
    };
    assert!(q.validate().is_err());
}

// ── Query pairs ──────────────────────────────────────────────────

#[test]
fn query_pairs_render_all_fields_in_order() {
    let q = QueryDescriptor::new()
        .with_page(2)
        .with_page_size(25)
        .with_sort("createdAt", SortDirection::Desc)
        .with_search("math")
        .with_filter("status", "active");

    assert_eq!(
        q.to_query_pairs(),
        pairs(&[
            ("page", "2"),
            ("pageSize", "25"),
            ("sortField", "createdAt"),
            ("sortDirection", "desc"),
            ("search", "math"),
            ("status", "active"),
        ])
    );
}

#[test]
fn sort_field_without_direction_defaults_to_asc() {
    let q = QueryDescriptor {
        sort_field: Some("name".into()),
        ..Default::default()
    };
    assert_eq!(
        q.to_query_pairs(),
        pairs(&[("sortField", "name"), ("sortDirection", "asc")])
    );
}

#[test]
fn multi_valued_filters_repeat_the_key() {
    let q = QueryDescriptor::new().with_filter(
        "tag",
        vec![Scalar::from("a"), Scalar::from("b")],
    );
    assert_eq!(q.to_query_pairs(), pairs(&[("tag", "a"), ("tag", "b")]));
}

#[test]
fn scalar_params_render_plainly() {
    assert_eq!(Scalar::Bool(true).to_param(), "true");
    assert_eq!(Scalar::Int(-4).to_param(), "-4");
    assert_eq!(Scalar::Float(1.5).to_param(), "1.5");
    assert_eq!(Scalar::from("x y").to_param(), "x y");
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn serializes_camel_case_with_flattened_filters() {
    let q = QueryDescriptor::new()
        .with_page_size(10)
        .with_filter("archived", false);
    let json = serde_json::to_value(&q).unwrap();
    assert_eq!(json, serde_json::json!({"pageSize": 10, "archived": false}));
}

#[test]
fn deserializes_extra_keys_as_filters() {
    let q: QueryDescriptor = serde_json::from_value(serde_json::json!({
        "page": 3,
        "sortField": "title",
        "sortDirection": "desc",
        "level": [1, 2]
    }))
    .unwrap();
    assert_eq!(q.page, Some(3));
    assert_eq!(q.sort_direction, Some(SortDirection::Desc));
    assert_eq!(
        q.extra.get("level"),
        Some(&FilterValue::Many(vec![Scalar::Int(1), Scalar::Int(2)]))
    );
}

use orgdesk_client::{error_message, normalize_list, ClientError, ListBody, ListEnvelope};
use orgdesk_types::PaginatedResult;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};

// ── Shape detection ──────────────────────────────────────────────

#[test]
fn bare_array_is_detected() {
    let body: ListBody<Value> = ListBody::from_value(json!([{"_id": "a"}])).unwrap();
    assert!(matches!(body, ListBody::BareArray(ref rows) if rows.len() == 1));
}

#[test]
fn envelope_is_detected() {
    let body: ListBody<Value> =
        ListBody::from_value(json!({"data": [], "totalCount": 0, "totalPages": 0})).unwrap();
    assert!(matches!(body, ListBody::Envelope(_)));
}

#[test]
fn object_without_data_array_is_a_shape_error() {
    let err = ListBody::<Value>::from_value(json!({"items": []})).unwrap_err();
    assert!(matches!(err, ClientError::Shape(_)));

    let err = ListBody::<Value>::from_value(json!({"data": {"_id": "x"}})).unwrap_err();
    assert!(matches!(err, ClientError::Shape(_)));
}

#[test]
fn scalar_bodies_are_shape_errors() {
    for body in [json!(null), json!("oops"), json!(42), json!(true)] {
        assert!(ListBody::<Value>::from_value(body).is_err());
    }
}

#[test]
fn rows_that_do_not_decode_are_shape_errors() {
    let err = ListBody::<u32>::from_value(json!(["not a number"])).unwrap_err();
    assert!(matches!(err, ClientError::Shape(_)));
}

#[test]
fn rows_accessor_covers_both_shapes() {
    let bare: ListBody<u8> = ListBody::BareArray(vec![1, 2]);
    let envelope: ListBody<u8> = ListBody::Envelope(ListEnvelope {
        data: vec![3],
        total_count: None,
        total_pages: None,
    });
    assert_eq!(bare.rows(), &[1, 2]);
    assert_eq!(envelope.rows(), &[3]);
}

// ── Totals ───────────────────────────────────────────────────────

#[test]
fn bare_array_ignores_page_size() {
    let page: PaginatedResult<u8> = normalize_list(json!([1, 2, 3]), Some(2)).unwrap();
    assert_eq!((page.total_count, page.total_pages), (3, 1));
}

#[test]
fn full_envelope_passes_through() {
    let page: PaginatedResult<u8> = normalize_list(
        json!({"data": [1, 2], "totalCount": 40, "totalPages": 20}),
        Some(10),
    )
    .unwrap();
    assert_eq!(page.data, vec![1, 2]);
    assert_eq!((page.total_count, page.total_pages), (40, 20));
}

#[test]
fn missing_total_pages_uses_known_page_size() {
    let page: PaginatedResult<u8> =
        normalize_list(json!({"data": [1], "totalCount": 21}), Some(10)).unwrap();
    assert_eq!(page.total_pages, 3);
}

#[test]
fn missing_total_pages_without_page_size_is_one() {
    let page: PaginatedResult<u8> =
        normalize_list(json!({"data": [1], "totalCount": 21}), None).unwrap();
    assert_eq!(page.total_pages, 1);
}

#[test]
fn missing_total_count_uses_row_count() {
    let page: PaginatedResult<u8> = normalize_list(json!({"data": [1, 2]}), Some(1)).unwrap();
    assert_eq!((page.total_count, page.total_pages), (2, 2));
}

#[test]
fn empty_envelope_has_zero_pages() {
    let page: PaginatedResult<u8> = normalize_list(json!({"data": []}), Some(10)).unwrap();
    assert_eq!((page.total_count, page.total_pages), (0, 0));
}

#[test]
fn zero_total_pages_with_rows_is_recomputed() {
    let page: PaginatedResult<u8> = normalize_list(
        json!({"data": [1], "totalCount": 15, "totalPages": 0}),
        Some(10),
    )
    .unwrap();
    assert_eq!(page.total_pages, 2);
}

#[test]
fn server_total_pages_is_trusted_over_page_size() {
    // Server paged with a different size than the one requested.
    let page: PaginatedResult<u8> = normalize_list(
        json!({"data": [1], "totalCount": 100, "totalPages": 4}),
        Some(10),
    )
    .unwrap();
    assert_eq!(page.total_pages, 4);
}

// ── Error messages ───────────────────────────────────────────────

#[test]
fn error_message_prefers_message_field() {
    let body = json!({"message": "Task not found", "error": "NotFound"});
    assert_eq!(error_message(&body).as_deref(), Some("Task not found"));
}

#[test]
fn error_message_falls_back_to_error_field() {
    assert_eq!(
        error_message(&json!({"error": "Forbidden"})).as_deref(),
        Some("Forbidden")
    );
}

#[test]
fn error_message_ignores_blank_and_non_string() {
    assert_eq!(error_message(&json!({"message": "  "})), None);
    assert_eq!(error_message(&json!({"message": 5})), None);
    assert_eq!(error_message(&json!(null)), None);
}

#[test]
fn error_message_uses_short_text_bodies() {
    assert_eq!(
        error_message(&json!("Bad Gateway")).as_deref(),
        Some("Bad Gateway")
    );
    let long = "x".repeat(500);
    assert_eq!(error_message(&Value::String(long)), None);
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn bare_array_totals_match_length(len in 0usize..200, size in proptest::option::of(1u32..100)) {
        let rows: Vec<u32> = (0..len as u32).collect();
        let page: PaginatedResult<u32> = normalize_list(json!(rows), size).unwrap();
        prop_assert_eq!(page.total_count, len as u64);
        prop_assert_eq!(page.total_pages, 1);
        prop_assert_eq!(page.data, rows);
    }

    #[test]
    fn envelope_pages_are_nonzero_when_rows_exist(count in 1u64..10_000, size in proptest::option::of(1u32..100)) {
        let page: PaginatedResult<u8> =
            normalize_list(json!({"data": [], "totalCount": count}), size).unwrap();
        prop_assert!(page.total_pages >= 1);
    }
}

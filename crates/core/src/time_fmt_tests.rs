// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn jst_to_utc_offsets_by_nine_hours() {
    let utc = to_index_ts("2026-07-28T12:00:00").unwrap();
    assert_eq!(utc, "2026-07-28T03:00:00");
}

#[test]
fn utc_to_jst_offsets_by_nine_hours() {
    let jst = from_index_ts("2026-07-28T03:00:00").unwrap();
    assert_eq!(jst, "2026-07-28T12:00:00");
}

#[test]
fn round_trip_is_inverse_at_second_precision() {
    let original = "2026-01-15T08:30:45";
    let utc = to_index_ts(original).unwrap();
    let back = {
        // Reinterpret the UTC string as JST wall-clock, then compare by
        // converting forward again — the round trip contract is
        // to_utc(to_jst(t)) == t for a `t` already in UTC.
        let re_utc = to_index_ts(&from_index_ts(&utc).unwrap()).unwrap();
        re_utc
    };
    assert_eq!(back, utc);
}

#[test]
fn parse_flexible_strips_z_suffix() {
    let naive = parse_flexible("2026-07-28T12:00:00Z").unwrap();
    assert_eq!(naive.format("%Y-%m-%dT%H:%M:%S").to_string(), "2026-07-28T12:00:00");
}

#[test]
fn rejects_garbage() {
    assert!(to_index_ts("not-a-date").is_err());
}

use chrono::NaiveDate;
use lawncare_tool::recurrence::{
    MONTHLY_STEP_DAYS, RecurrenceFrequency, RecurrenceRequest, expand, format_dates,
    format_dates_limited,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn req(anchor: NaiveDate, frequency: RecurrenceFrequency, count: i64) -> RecurrenceRequest {
    RecurrenceRequest::new(anchor, frequency, count)
}

#[test]
fn weekly_steps_seven_days() {
    let dates = expand(&req(d(2024, 1, 1), RecurrenceFrequency::Weekly, 3));
    assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 8), d(2024, 1, 15)]);
}

#[test]
fn fortnightly_steps_fourteen_days() {
    let dates = expand(&req(d(2024, 1, 1), RecurrenceFrequency::Fortnightly, 3));
    assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 15), d(2024, 1, 29)]);
}

#[test]
fn monthly_is_a_fixed_thirty_day_step() {
    let dates = expand(&req(d(2024, 1, 1), RecurrenceFrequency::Monthly, 3));
    // Leap-year February: 2024-01-31 + 30 days lands on March 1st.
    assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 31), d(2024, 3, 1)]);
    assert_eq!(MONTHLY_STEP_DAYS, 30);
}

#[test]
fn single_occurrence_is_just_the_anchor_for_every_frequency() {
    let anchor = d(2025, 6, 14);
    for frequency in RecurrenceFrequency::ALL {
        assert_eq!(expand(&req(anchor, frequency, 1)), vec![anchor], "{frequency}");
    }
}

#[test]
fn none_ignores_the_count() {
    let anchor = d(2025, 3, 3);
    for count in [1, 2, 5, 100] {
        assert_eq!(expand(&req(anchor, RecurrenceFrequency::None, count)), vec![anchor]);
    }
}

#[test]
fn zero_and_negative_counts_behave_like_one() {
    let anchor = d(2024, 1, 1);
    for frequency in RecurrenceFrequency::ALL {
        let one = expand(&req(anchor, frequency, 1));
        assert_eq!(expand(&req(anchor, frequency, 0)), one);
        assert_eq!(expand(&req(anchor, frequency, -4)), one);
        assert_eq!(expand(&req(anchor, frequency, i64::MIN)), one);
    }
    assert_eq!(req(anchor, RecurrenceFrequency::Weekly, -1).normalized_count(), 1);
}

#[test]
fn length_matches_count_and_dates_strictly_increase() {
    let anchors = [d(2023, 12, 25), d(2024, 2, 28), d(2024, 2, 29), d(2025, 12, 31)];
    let frequencies = [
        RecurrenceFrequency::Weekly,
        RecurrenceFrequency::Fortnightly,
        RecurrenceFrequency::Monthly,
    ];
    for anchor in anchors {
        for frequency in frequencies {
            for count in 1..=30 {
                let dates = expand(&req(anchor, frequency, count));
                assert_eq!(dates.len() as i64, count);
                assert_eq!(dates[0], anchor);
                for pair in dates.windows(2) {
                    assert!(pair[1] > pair[0]);
                    assert_eq!(
                        (pair[1] - pair[0]).num_days(),
                        frequency.step_days().unwrap()
                    );
                }
            }
        }
    }
}

#[test]
fn expanding_twice_gives_the_same_dates() {
    let request = req(d(2024, 5, 17), RecurrenceFrequency::Fortnightly, 12);
    assert_eq!(expand(&request), expand(&request));
    assert_eq!(request.expand(), expand(&request));
}

#[test]
fn stops_at_the_last_representable_date() {
    let anchor = NaiveDate::MAX - chrono::Duration::days(10);
    let dates = expand(&req(anchor, RecurrenceFrequency::Weekly, 5));
    assert_eq!(dates, vec![anchor, anchor + chrono::Duration::days(7)]);
}

#[test]
fn frequency_parsing_is_strict_or_lenient() {
    assert_eq!(RecurrenceFrequency::parse(" Weekly "), Some(RecurrenceFrequency::Weekly));
    assert_eq!(RecurrenceFrequency::parse("FORTNIGHTLY"), Some(RecurrenceFrequency::Fortnightly));
    assert_eq!(RecurrenceFrequency::parse("daily"), None);

    assert_eq!(RecurrenceFrequency::from_input("monthly"), RecurrenceFrequency::Monthly);
    assert_eq!(RecurrenceFrequency::from_input("daily"), RecurrenceFrequency::None);
    assert_eq!(RecurrenceFrequency::from_input(""), RecurrenceFrequency::None);
}

#[test]
fn frequency_serializes_by_name_and_reads_unknown_as_none() {
    let json = serde_json::to_string(&RecurrenceFrequency::Fortnightly).unwrap();
    assert_eq!(json, "\"fortnightly\"");
    let parsed: RecurrenceFrequency = serde_json::from_str("\"Monthly\"").unwrap();
    assert_eq!(parsed, RecurrenceFrequency::Monthly);
    let unknown: RecurrenceFrequency = serde_json::from_str("\"yearly\"").unwrap();
    assert_eq!(unknown, RecurrenceFrequency::None);
}

#[test]
fn format_dates_uses_iso_dates() {
    let dates = expand(&req(d(2024, 1, 1), RecurrenceFrequency::Weekly, 2));
    assert_eq!(format_dates(&dates), "2024-01-01, 2024-01-08");
}

#[test]
fn occurrences_are_produced_lazily() {
    let request = req(d(2024, 1, 1), RecurrenceFrequency::Fortnightly, i64::MAX);
    let first: Vec<NaiveDate> = request.occurrences().take(3).collect();
    assert_eq!(first, vec![d(2024, 1, 1), d(2024, 1, 15), d(2024, 1, 29)]);

    let one_off = req(d(2024, 1, 1), RecurrenceFrequency::None, i64::MAX);
    assert_eq!(one_off.occurrences().collect::<Vec<_>>(), vec![d(2024, 1, 1)]);
}

#[test]
fn last_occurrence_agrees_with_expand() {
    let anchors = [d(2024, 2, 29), NaiveDate::MAX - chrono::Duration::days(40)];
    for anchor in anchors {
        for frequency in RecurrenceFrequency::ALL {
            for count in [-1, 1, 2, 9] {
                let request = req(anchor, frequency, count);
                assert_eq!(
                    Some(request.last_occurrence()),
                    expand(&request).last().copied(),
                    "{anchor} {frequency} x{count}"
                );
            }
        }
    }
}

#[test]
fn limited_format_marks_truncation() {
    let request = req(d(2024, 1, 1), RecurrenceFrequency::Weekly, i64::MAX);
    assert_eq!(
        format_dates_limited(request.occurrences(), 2),
        "2024-01-01, 2024-01-08, ..."
    );
    let short = req(d(2024, 1, 1), RecurrenceFrequency::Weekly, 2);
    assert_eq!(format_dates_limited(short.occurrences(), 2), "2024-01-01, 2024-01-08");
}

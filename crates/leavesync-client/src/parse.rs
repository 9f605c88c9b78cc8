use serde::Deserialize;

use leavesync_core::types::{DateSlot, HalfDay};

/// Raw shape of one `apply_data.contents[*]` entry we care about. Upstream
/// sends many content widget types; we only look at the one carrying a
/// vacation block, and ignore the rest.
#[derive(Debug, Deserialize)]
pub struct ApplyContent {
    pub value: ContentValue,
}

#[derive(Debug, Deserialize)]
pub struct ContentValue {
    pub vacation: Option<Vacation>,
}

#[derive(Debug, Deserialize)]
pub struct Vacation {
    pub attendance: Attendance,
}

#[derive(Debug, Deserialize)]
pub struct Attendance {
    pub date_range: DateRange,
    #[serde(default)]
    pub slice_info: Option<SliceInfo>,
}

#[derive(Debug, Deserialize)]
pub struct DateRange {
    pub new_begin: RangeBound,
    pub new_end: RangeBound,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RangeBound {
    pub date: i64,
}

#[derive(Debug, Deserialize)]
pub struct SliceInfo {
    #[serde(default)]
    pub day_items: Vec<DayItem>,
}

#[derive(Debug, Deserialize)]
pub struct DayItem {
    pub date: i64,
    pub duration: i64,
}

/// Finds the first `apply_data.contents[*]` entry carrying a vacation block.
pub fn find_vacation(contents: &[ApplyContent]) -> Option<&Attendance> {
    contents
        .iter()
        .find_map(|c| c.value.vacation.as_ref().map(|v| &v.attendance))
}

/// Derives the ordered list of date slots an approval covers, per §4.3.
/// Returns an empty vec when `attendance` carries no usable date
/// information — callers treat that as "skip this approval".
pub fn derive_date_slots(attendance: &Attendance) -> Vec<DateSlot> {
    if let Some(slice) = &attendance.slice_info {
        if !slice.day_items.is_empty() {
            return slice
                .day_items
                .iter()
                .map(|item| {
                    let (y, m, d, hour) = leavesync_core::time::local_ymd_hour(item.date);
                    if item.duration == leavesync_core::constants::HALF_DAY_DURATION_SECS {
                        let half = if hour < 12 { HalfDay::Am } else { HalfDay::Pm };
                        DateSlot::half_day(y, m, d, half)
                    } else {
                        DateSlot::full_day(y, m, d)
                    }
                })
                .collect();
        }
    }

    let is_halfday = attendance
        .date_range
        .kind
        .as_deref()
        .map(|k| k == "halfday")
        .unwrap_or(false);

    let (begin_y, begin_m, begin_d, begin_hour) =
        leavesync_core::time::local_ymd_hour(attendance.date_range.new_begin.date);
    let (end_y, end_m, end_d, _) =
        leavesync_core::time::local_ymd_hour(attendance.date_range.new_end.date);

    let mut slots = Vec::new();
    let mut cursor = chrono::NaiveDate::from_ymd_opt(begin_y, begin_m, begin_d)
        .expect("upstream gave a valid begin date");
    let end = chrono::NaiveDate::from_ymd_opt(end_y, end_m, end_d)
        .expect("upstream gave a valid end date");

    while cursor <= end {
        use chrono::Datelike;
        let (y, m, d) = (cursor.year(), cursor.month(), cursor.day());
        if is_halfday {
            let half = if begin_hour < 12 { HalfDay::Am } else { HalfDay::Pm };
            slots.push(DateSlot::half_day(y, m, d, half));
        } else {
            slots.push(DateSlot::full_day(y, m, d));
        }
        cursor = cursor.succ_opt().expect("date range does not overflow NaiveDate");
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attendance_with_range(begin: i64, end: i64, kind: Option<&str>) -> Attendance {
        Attendance {
            date_range: DateRange {
                new_begin: RangeBound { date: begin },
                new_end: RangeBound { date: end },
                kind: kind.map(str::to_string),
            },
            slice_info: None,
        }
    }

    #[test]
    fn single_day_wholeday_range_yields_one_full_day_slot() {
        let ts = 1_771_027_200; // a fixed, arbitrary instant
        let attendance = attendance_with_range(ts, ts, Some("wholeday"));
        let slots = derive_date_slots(&attendance);
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn single_day_halfday_range_yields_one_half_day_slot() {
        let ts = 1_771_027_200;
        let attendance = attendance_with_range(ts, ts, Some("halfday"));
        let slots = derive_date_slots(&attendance);
        assert_eq!(slots.len(), 1);
        assert!(slots[0].as_str().contains('('));
    }

    #[test]
    fn day_items_with_half_day_duration_split_am_pm() {
        let attendance = Attendance {
            date_range: DateRange {
                new_begin: RangeBound { date: 1_771_027_200 },
                new_end: RangeBound { date: 1_771_027_200 },
                kind: Some("wholeday".into()),
            },
            slice_info: Some(SliceInfo {
                day_items: vec![DayItem {
                    date: 1_771_027_200,
                    duration: leavesync_core::constants::HALF_DAY_DURATION_SECS,
                }],
            }),
        };
        let slots = derive_date_slots(&attendance);
        assert_eq!(slots.len(), 1);
        assert!(slots[0].as_str().contains('('));
    }
}

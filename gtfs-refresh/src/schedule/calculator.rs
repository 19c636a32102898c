//! Next-departure search over a timetable.

use chrono::{DateTime, Days, Duration, FixedOffset, NaiveDate, TimeZone, Utc};

use crate::domain::StaticDeparture;

use super::error::ComputationError;
use super::timetable::{ServiceTime, Timetable};
use super::{DepartureCalculator, DepartureQuery};

/// Finds the earliest trip that calls at the origin and later at the
/// destination, departing no earlier than `now + offset`.
///
/// Every trip runs every service day. Yesterday's service day is searched
/// too, so its after-midnight times (`24:30:00`) are found. The next service
/// day is only searched when `include_tomorrow` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimetableCalculator;

/// A candidate departure during the search.
struct Candidate {
    trip_idx: usize,
    day: i64,
    departure: DateTime<Utc>,
    arrival: DateTime<Utc>,
}

impl DepartureCalculator<Timetable> for TimetableCalculator {
    fn compute(
        &self,
        timetable: &Timetable,
        query: &DepartureQuery,
    ) -> Result<StaticDeparture, ComputationError> {
        let tz = timetable.timezone()?;
        let search_from = Duration::try_minutes(query.offset_minutes)
            .and_then(|offset| query.now.checked_add_signed(offset))
            .ok_or_else(|| {
                ComputationError::Index(format!("offset out of range: {} minutes", query.offset_minutes))
            })?;
        let today = search_from.with_timezone(&tz).date_naive();

        let last_day = if query.include_tomorrow { 1 } else { 0 };

        let mut best: Option<Candidate> = None;

        for &(trip_idx, origin_idx) in timetable.visits(&query.origin) {
            let trip = &timetable.trips[trip_idx];

            let Some(dest_offset) = trip.stop_times[origin_idx + 1..]
                .iter()
                .position(|st| st.stop_id == query.destination)
            else {
                continue;
            };
            let dest_idx = origin_idx + 1 + dest_offset;

            let (Some(dep), Some(arr)) = (
                trip.stop_times[origin_idx].departure_or_arrival(),
                trip.stop_times[dest_idx].arrival_or_departure(),
            ) else {
                continue;
            };

            for day in -1..=last_day {
                let midnight = service_midnight(tz, today, day)?;
                let departure = at(midnight, dep);
                if departure < search_from {
                    continue;
                }
                if best.as_ref().is_none_or(|b| departure < b.departure) {
                    best = Some(Candidate {
                        trip_idx,
                        day,
                        departure,
                        arrival: at(midnight, arr),
                    });
                }
            }
        }

        let Some(best) = best else {
            return Err(ComputationError::NoDeparture {
                origin: query.origin.clone(),
                destination: query.destination.clone(),
            });
        };

        let trip = &timetable.trips[best.trip_idx];
        Ok(StaticDeparture {
            route_id: trip.route_id.clone(),
            trip_id: trip.trip_id.clone(),
            origin_stop_id: query.origin.clone(),
            origin_stop_name: timetable.stop_name(&query.origin).to_string(),
            destination_stop_id: query.destination.clone(),
            destination_stop_name: timetable.stop_name(&query.destination).to_string(),
            departure_time: best.departure,
            arrival_time: best.arrival,
            is_tomorrow: best.day > 0,
            computed_at: query.now,
            realtime: None,
        })
    }
}

/// UTC instant of midnight starting the service day `day` days after `today`.
fn service_midnight(
    tz: FixedOffset,
    today: NaiveDate,
    day: i64,
) -> Result<DateTime<Utc>, ComputationError> {
    let date = if day >= 0 {
        today.checked_add_days(Days::new(day as u64))
    } else {
        today.checked_sub_days(Days::new(day.unsigned_abs()))
    }
    .ok_or_else(|| ComputationError::Index(format!("date out of range: {today} {day:+}")))?;

    tz.from_local_datetime(&date.and_time(chrono::NaiveTime::MIN))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ComputationError::Index(format!("no midnight on {date}")))
}

fn at(midnight: DateTime<Utc>, time: ServiceTime) -> DateTime<Utc> {
    midnight + Duration::seconds(i64::from(time.seconds()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Service day midnight is 00:00 UTC+1, i.e. 23:00 UTC the day before.
    const TIMETABLE: &str = r#"{
        "utc_offset_minutes": 60,
        "stops": {"A": "Alpha", "B": "Beta", "C": "Gamma"},
        "trips": [
            {"trip_id": "early", "route_id": "10-x", "stop_times": [
                {"stop_id": "A", "departure": "08:00:00"},
                {"stop_id": "B", "arrival": "08:20:00"}
            ]},
            {"trip_id": "late", "route_id": "20", "stop_times": [
                {"stop_id": "A", "departure": "18:00:00"},
                {"stop_id": "C", "arrival": "18:10:00", "departure": "18:11:00"},
                {"stop_id": "B", "arrival": "18:30:00"}
            ]},
            {"trip_id": "owl", "route_id": "30", "stop_times": [
                {"stop_id": "A", "departure": "24:30:00"},
                {"stop_id": "B", "arrival": "24:50:00"}
            ]},
            {"trip_id": "reverse", "route_id": "10-x", "stop_times": [
                {"stop_id": "B", "departure": "09:00:00"},
                {"stop_id": "A", "arrival": "09:20:00"}
            ]}
        ]
    }"#;

    fn timetable() -> Timetable {
        Timetable::from_json(TIMETABLE).unwrap()
    }

    /// Local (UTC+1) wall-clock time on 2024-03-15 as a UTC instant.
    fn local(hour: u32, min: u32) -> DateTime<Utc> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 15, hour, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn query(origin: &str, destination: &str, now: DateTime<Utc>) -> DepartureQuery {
        DepartureQuery {
            origin: origin.to_string(),
            destination: destination.to_string(),
            offset_minutes: 0,
            include_tomorrow: false,
            now,
        }
    }

    #[test]
    fn earliest_departure_chosen() {
        let dep = TimetableCalculator
            .compute(&timetable(), &query("A", "B", local(7, 0)))
            .unwrap();

        assert_eq!(dep.trip_id, "early");
        assert_eq!(dep.route_id, "10-x");
        assert_eq!(dep.departure_time, local(8, 0));
        assert_eq!(dep.arrival_time, local(8, 20));
        assert_eq!(dep.origin_stop_name, "Alpha");
        assert_eq!(dep.destination_stop_name, "Beta");
        assert_eq!(dep.computed_at, local(7, 0));
        assert!(!dep.is_tomorrow);
        assert!(dep.realtime.is_none());
    }

    #[test]
    fn departed_trips_skipped() {
        let dep = TimetableCalculator
            .compute(&timetable(), &query("A", "B", local(8, 1)))
            .unwrap();
        assert_eq!(dep.trip_id, "late");
    }

    #[test]
    fn destination_must_follow_origin() {
        // "reverse" visits B then A, so it never serves A -> B
        let dep = TimetableCalculator
            .compute(&timetable(), &query("B", "A", local(7, 0)))
            .unwrap();
        assert_eq!(dep.trip_id, "reverse");

        let err = TimetableCalculator
            .compute(&timetable(), &query("C", "A", local(7, 0)))
            .unwrap_err();
        assert!(matches!(err, ComputationError::NoDeparture { .. }));
    }

    #[test]
    fn offset_shifts_search_start() {
        let mut q = query("A", "B", local(7, 0));
        q.offset_minutes = 90;

        let dep = TimetableCalculator.compute(&timetable(), &q).unwrap();
        assert_eq!(dep.trip_id, "late");
        assert_eq!(dep.computed_at, local(7, 0));
    }

    #[test]
    fn after_midnight_trip_from_today_found() {
        // 24:30 on the 15th's service day is 00:30 on the 16th
        let dep = TimetableCalculator
            .compute(&timetable(), &query("A", "B", local(19, 0)))
            .unwrap();
        assert_eq!(dep.trip_id, "owl");
        assert_eq!(dep.departure_time, local(23, 0) + Duration::minutes(90));
    }

    #[test]
    fn yesterdays_owl_found_just_after_midnight() {
        let dep = TimetableCalculator
            .compute(&timetable(), &query("A", "B", local(0, 10)))
            .unwrap();
        assert_eq!(dep.trip_id, "owl");
        assert_eq!(dep.departure_time, local(0, 30));
    }

    #[test]
    fn tomorrow_only_when_included() {
        let now = local(21, 0);
        let today_only = query("C", "B", now);
        assert!(TimetableCalculator.compute(&timetable(), &today_only).is_err());

        let mut with_tomorrow = today_only.clone();
        with_tomorrow.include_tomorrow = true;
        let dep = TimetableCalculator
            .compute(&timetable(), &with_tomorrow)
            .unwrap();
        assert_eq!(dep.trip_id, "late");
        assert!(dep.is_tomorrow);
        assert_eq!(dep.departure_time, local(18, 11) + Duration::days(1));
    }

    #[test]
    fn unknown_stop_has_no_departure() {
        let err = TimetableCalculator
            .compute(&timetable(), &query("Z", "B", local(7, 0)))
            .unwrap_err();
        assert!(matches!(err, ComputationError::NoDeparture { .. }));
    }

    #[test]
    fn utc_timestamps_are_independent_of_offset() {
        let dep = TimetableCalculator
            .compute(&timetable(), &query("A", "B", local(7, 0)))
            .unwrap();
        assert_eq!(
            dep.departure_time,
            Utc.with_ymd_and_hms(2024, 3, 15, 7, 0, 0).unwrap()
        );
    }
}

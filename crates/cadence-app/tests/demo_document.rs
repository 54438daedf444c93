use cadence_app::cli::Cli;
use cadence_app::document::SeriesDocument;
use cadence_core::config::OutputConfig;
use cadence_rfc::rfc::ical::build::serialize;
use cadence_service::caldav::filter::OutputFilter;
use cadence_service::caldav::fingerprint::canonical_text;
use cadence_service::caldav::limit::RecurrenceSetLimiter;
use clap::Parser;

const DEMO: &str = include_str!("../../../demos/chicago-standup.json");

#[test_log::test]
fn demo_document_limits_to_window() {
    let document: SeriesDocument = serde_json::from_str(DEMO).unwrap();
    let series = document.into_series().unwrap();
    let cli = Cli::try_parse_from([
        "cadence",
        "demos/chicago-standup.json",
        "--start",
        "20060104T010000Z",
        "--end",
        "20060106T010000Z",
    ])
    .unwrap();

    let set = RecurrenceSetLimiter::new(100)
        .limit(&series.master, &cli.window().unwrap())
        .unwrap();
    assert_eq!(set.len(), 2);

    assert_eq!(
        canonical_text(&series.master),
        "standup:1136073600000,standup-0104:1136160000000,standup-0106:1136246400000"
    );

    let calendar = OutputFilter::from_config(&OutputConfig::default())
        .with_timezones(series.timezones)
        .filter(&set);
    let text = serialize(&calendar);

    assert!(text.starts_with("BEGIN:VCALENDAR\r\n"));
    assert_eq!(text.matches("BEGIN:VTIMEZONE").count(), 1);
    assert_eq!(text.matches("BEGIN:VEVENT").count(), 2);
    assert!(text.contains("SUMMARY:Standup (moved)"));
    assert!(!text.contains("Standup (last)"));
    assert!(text.contains("DTSTART;TZID=America/Chicago:20060105T140000"));
}

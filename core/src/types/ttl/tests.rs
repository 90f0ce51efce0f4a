use super::*;

#[test]
fn parses_every_recognized_selection() {
    assert_eq!("1m".parse(), Ok(TtlChoice::OneMinute));
    assert_eq!("10m".parse(), Ok(TtlChoice::TenMinutes));
    assert_eq!("1h".parse(), Ok(TtlChoice::OneHour));
    assert_eq!("1d".parse(), Ok(TtlChoice::OneDay));
    assert_eq!("1w".parse(), Ok(TtlChoice::OneWeek));
    assert_eq!("-1".parse(), Ok(TtlChoice::InstantExpire));
}

#[test]
fn rejects_unknown_selections() {
    for bogus in ["bogus", "", "1M", "2h", " 1h", "60"] {
        assert_eq!(
            bogus.parse::<TtlChoice>(),
            Err(InvalidTtl(bogus.to_string())),
            "{bogus:?} should be rejected"
        );
    }
}

#[test]
fn durations_match_labels() {
    assert_eq!(TtlChoice::OneMinute.duration(), Duration::from_secs(60));
    assert_eq!(TtlChoice::TenMinutes.duration(), Duration::from_secs(600));
    assert_eq!(TtlChoice::OneHour.duration(), Duration::from_secs(3600));
    assert_eq!(TtlChoice::OneDay.duration(), Duration::from_secs(86_400));
    assert_eq!(TtlChoice::OneWeek.duration(), Duration::from_secs(604_800));
}

#[test]
fn instant_expire_uses_one_week_safety_net() {
    assert!(TtlChoice::InstantExpire.is_instant_expire());
    assert_eq!(
        TtlChoice::InstantExpire.duration(),
        TtlChoice::OneWeek.duration()
    );
    assert!(
        TtlChoice::ALL
            .iter()
            .filter(|c| c.is_instant_expire())
            .eq([&TtlChoice::InstantExpire])
    );
}

#[test]
fn display_round_trips_through_from_str() {
    for choice in TtlChoice::ALL {
        assert_eq!(choice.to_string().parse(), Ok(choice));
    }
}
